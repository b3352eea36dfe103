use std::collections::{BTreeMap, HashMap};

use derive_more::From;

use super::error::ModelError;
use super::uuid::ModelUuid;

/// Metaclasses known to the diagram items, in a single-inheritance hierarchy.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum ModelType {
    Element,
    NamedElement,
    Namespace,
    Package,
    Profile,
    Classifier,
    Class,
    Node,
    Device,
    Stereotype,
    Association,
    TypedElement,
    Property,
    Port,
    ProxyPort,
    InstanceSpecification,
    Slot,
    Connector,
    C4Container,
    C4Database,
    BasicEvent,
    ZeroEvent,
    HouseEvent,
    MajorityVoteGate,
}

impl ModelType {
    pub const ALL: &'static [ModelType] = &[
        ModelType::Element,
        ModelType::NamedElement,
        ModelType::Namespace,
        ModelType::Package,
        ModelType::Profile,
        ModelType::Classifier,
        ModelType::Class,
        ModelType::Node,
        ModelType::Device,
        ModelType::Stereotype,
        ModelType::Association,
        ModelType::TypedElement,
        ModelType::Property,
        ModelType::Port,
        ModelType::ProxyPort,
        ModelType::InstanceSpecification,
        ModelType::Slot,
        ModelType::Connector,
        ModelType::C4Container,
        ModelType::C4Database,
        ModelType::BasicEvent,
        ModelType::ZeroEvent,
        ModelType::HouseEvent,
        ModelType::MajorityVoteGate,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ModelType::Element => "Element",
            ModelType::NamedElement => "NamedElement",
            ModelType::Namespace => "Namespace",
            ModelType::Package => "Package",
            ModelType::Profile => "Profile",
            ModelType::Classifier => "Classifier",
            ModelType::Class => "Class",
            ModelType::Node => "Node",
            ModelType::Device => "Device",
            ModelType::Stereotype => "Stereotype",
            ModelType::Association => "Association",
            ModelType::TypedElement => "TypedElement",
            ModelType::Property => "Property",
            ModelType::Port => "Port",
            ModelType::ProxyPort => "ProxyPort",
            ModelType::InstanceSpecification => "InstanceSpecification",
            ModelType::Slot => "Slot",
            ModelType::Connector => "Connector",
            ModelType::C4Container => "C4Container",
            ModelType::C4Database => "C4Database",
            ModelType::BasicEvent => "BasicEvent",
            ModelType::ZeroEvent => "ZeroEvent",
            ModelType::HouseEvent => "HouseEvent",
            ModelType::MajorityVoteGate => "MajorityVoteGate",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.name() == name)
    }

    pub fn parent(self) -> Option<ModelType> {
        use ModelType as T;
        match self {
            T::Element => None,
            T::NamedElement | T::Slot => Some(T::Element),
            T::Namespace | T::TypedElement | T::InstanceSpecification | T::Connector => {
                Some(T::NamedElement)
            }
            T::Package | T::Classifier | T::C4Container => Some(T::Namespace),
            T::Profile => Some(T::Package),
            T::Class
            | T::Association
            | T::BasicEvent
            | T::ZeroEvent
            | T::HouseEvent
            | T::MajorityVoteGate => Some(T::Classifier),
            T::Node | T::Stereotype => Some(T::Class),
            T::Device => Some(T::Node),
            T::Property => Some(T::TypedElement),
            T::Port => Some(T::Property),
            T::ProxyPort => Some(T::Port),
            T::C4Database => Some(T::C4Container),
        }
    }

    /// Whether `self` is `other` or one of its specializations.
    pub fn is_a(self, other: ModelType) -> bool {
        let mut current = Some(self);
        while let Some(t) = current {
            if t == other {
                return true;
            }
            current = t.parent();
        }
        false
    }

    fn own_features(self) -> &'static [Feature] {
        use Attribute as A;
        use Relation as R;
        match self {
            ModelType::Element => &[Feature::Relation(R::AppliedStereotype)],
            ModelType::NamedElement => &[
                Feature::Attribute(A::Name),
                Feature::Attribute(A::Visibility),
                Feature::Relation(R::Namespace),
            ],
            ModelType::TypedElement => &[Feature::Relation(R::Type)],
            ModelType::Property => &[
                Feature::Attribute(A::IsDerived),
                Feature::Attribute(A::LowerValue),
                Feature::Attribute(A::UpperValue),
                Feature::Attribute(A::Navigability),
                Feature::Attribute(A::Aggregation),
                Feature::Relation(R::Association),
            ],
            ModelType::Class => &[Feature::Relation(R::OwnedAttribute)],
            ModelType::Node => &[Feature::Relation(R::OwnedConnector)],
            ModelType::Association => &[Feature::Relation(R::MemberEnd)],
            ModelType::InstanceSpecification => &[
                Feature::Relation(R::Classifier),
                Feature::Relation(R::Slot),
            ],
            ModelType::Slot => &[
                Feature::Attribute(A::Value),
                Feature::Relation(R::DefiningFeature),
            ],
            ModelType::C4Container => &[
                Feature::Attribute(A::Technology),
                Feature::Attribute(A::Description),
                Feature::Attribute(A::C4Type),
            ],
            _ => &[],
        }
    }

    /// Own and inherited features, most specific first.
    pub fn features(self) -> impl Iterator<Item = Feature> {
        std::iter::successors(Some(self), |t| t.parent())
            .flat_map(|t| t.own_features().iter().copied())
    }

    pub fn has_feature(self, feature: Feature) -> bool {
        self.features().any(|f| f == feature)
    }

    /// Resolves a feature name in the context of this type.
    pub fn lookup_feature(self, name: &str) -> Option<Feature> {
        self.features().find(|f| f.name() == name)
    }
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Attribute {
    Name,
    Visibility,
    IsDerived,
    LowerValue,
    UpperValue,
    Navigability,
    Aggregation,
    Value,
    Technology,
    Description,
    C4Type,
}

impl Attribute {
    pub fn name(self) -> &'static str {
        match self {
            Attribute::Name => "name",
            Attribute::Visibility => "visibility",
            Attribute::IsDerived => "isDerived",
            Attribute::LowerValue => "lowerValue",
            Attribute::UpperValue => "upperValue",
            Attribute::Navigability => "navigability",
            Attribute::Aggregation => "aggregation",
            Attribute::Value => "value",
            Attribute::Technology => "technology",
            Attribute::Description => "description",
            Attribute::C4Type => "type",
        }
    }
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Relation {
    AppliedStereotype,
    Namespace,
    Type,
    Association,
    OwnedAttribute,
    OwnedConnector,
    MemberEnd,
    Classifier,
    Slot,
    DefiningFeature,
}

impl Relation {
    pub fn name(self) -> &'static str {
        match self {
            Relation::AppliedStereotype => "appliedStereotype",
            Relation::Namespace => "namespace",
            Relation::Type => "type",
            Relation::Association => "association",
            Relation::OwnedAttribute => "ownedAttribute",
            Relation::OwnedConnector => "ownedConnector",
            Relation::MemberEnd => "memberEnd",
            Relation::Classifier => "classifier",
            Relation::Slot => "slot",
            Relation::DefiningFeature => "definingFeature",
        }
    }

    pub fn target_type(self) -> ModelType {
        match self {
            Relation::AppliedStereotype => ModelType::InstanceSpecification,
            Relation::Namespace => ModelType::Namespace,
            Relation::Type | Relation::Classifier => ModelType::Classifier,
            Relation::Association => ModelType::Association,
            Relation::OwnedAttribute | Relation::MemberEnd | Relation::DefiningFeature => {
                ModelType::Property
            }
            Relation::OwnedConnector => ModelType::Connector,
            Relation::Slot => ModelType::Slot,
        }
    }

    pub fn is_single(self) -> bool {
        matches!(
            self,
            Relation::Namespace | Relation::Type | Relation::Association | Relation::DefiningFeature
        )
    }
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, From)]
pub enum Feature {
    Attribute(Attribute),
    Relation(Relation),
}

impl Feature {
    pub fn name(self) -> &'static str {
        match self {
            Feature::Attribute(a) => a.name(),
            Feature::Relation(r) => r.name(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Visibility {
    #[default]
    Public,
    Package,
    Protected,
    Private,
}

impl Visibility {
    pub fn sign(self) -> char {
        match self {
            Visibility::Public => '+',
            Visibility::Package => '~',
            Visibility::Protected => '#',
            Visibility::Private => '-',
        }
    }

    pub fn from_sign(c: char) -> Option<Self> {
        [
            Visibility::Public,
            Visibility::Package,
            Visibility::Protected,
            Visibility::Private,
        ]
        .into_iter()
        .find(|v| v.sign() == c)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AggregationKind {
    #[default]
    None,
    Shared,
    Composite,
}

impl AggregationKind {
    pub fn name(self) -> &'static str {
        match self {
            AggregationKind::None => "none",
            AggregationKind::Shared => "shared",
            AggregationKind::Composite => "composite",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Text(String),
    Bool(bool),
    Visibility(Visibility),
    Aggregation(AggregationKind),
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_owned())
    }
}

#[derive(Clone, Debug)]
pub struct Element {
    pub uuid: ModelUuid,
    pub model_type: ModelType,
    attributes: BTreeMap<Attribute, Value>,
    relations: BTreeMap<Relation, Vec<ModelUuid>>,
}

/// A single feature of a single element changed.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct ModelEvent {
    pub element: ModelUuid,
    pub feature: Feature,
}

#[derive(Default)]
pub struct Model {
    elements: HashMap<ModelUuid, Element>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, model_type: ModelType) -> ModelUuid {
        let uuid = ModelUuid::now_v7();
        self.elements.insert(
            uuid,
            Element {
                uuid,
                model_type,
                attributes: BTreeMap::new(),
                relations: BTreeMap::new(),
            },
        );
        uuid
    }

    /// Creates a named element placed in `namespace`.
    pub fn create_named(
        &mut self,
        model_type: ModelType,
        name: &str,
        namespace: Option<ModelUuid>,
    ) -> Result<ModelUuid, ModelError> {
        let uuid = self.create(model_type);
        self.set_attribute(uuid, Attribute::Name, Value::from(name))?;
        if let Some(namespace) = namespace {
            self.set_relation(uuid, Relation::Namespace, Some(namespace))?;
        }
        Ok(uuid)
    }

    pub fn get(&self, uuid: ModelUuid) -> Option<&Element> {
        self.elements.get(&uuid)
    }

    pub fn contains(&self, uuid: ModelUuid) -> bool {
        self.elements.contains_key(&uuid)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn kind(&self, uuid: ModelUuid) -> Option<ModelType> {
        self.elements.get(&uuid).map(|e| e.model_type)
    }

    pub fn is_a(&self, uuid: ModelUuid, model_type: ModelType) -> bool {
        self.kind(uuid).is_some_and(|t| t.is_a(model_type))
    }

    pub fn attribute(&self, uuid: ModelUuid, attribute: Attribute) -> Option<&Value> {
        self.elements.get(&uuid)?.attributes.get(&attribute)
    }

    pub fn text(&self, uuid: ModelUuid, attribute: Attribute) -> Option<&str> {
        match self.attribute(uuid, attribute)? {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn flag(&self, uuid: ModelUuid, attribute: Attribute) -> Option<bool> {
        match self.attribute(uuid, attribute)? {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Name of the element, empty when absent.
    pub fn name(&self, uuid: ModelUuid) -> &str {
        self.text(uuid, Attribute::Name).unwrap_or("")
    }

    pub fn related(&self, uuid: ModelUuid, relation: Relation) -> &[ModelUuid] {
        self.elements
            .get(&uuid)
            .and_then(|e| e.relations.get(&relation))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn first_related(&self, uuid: ModelUuid, relation: Relation) -> Option<ModelUuid> {
        self.related(uuid, relation).first().copied()
    }

    pub fn elements_of_type(&self, model_type: ModelType) -> impl Iterator<Item = &Element> {
        self.elements
            .values()
            .filter(move |e| e.model_type.is_a(model_type))
    }

    /// The other end of the association `property` belongs to.
    pub fn opposite(&self, property: ModelUuid) -> Option<ModelUuid> {
        let association = self.first_related(property, Relation::Association)?;
        self.related(association, Relation::MemberEnd)
            .iter()
            .copied()
            .find(|e| *e != property)
    }

    fn element_mut(
        &mut self,
        uuid: ModelUuid,
        feature: Feature,
    ) -> Result<&mut Element, ModelError> {
        let element = self
            .elements
            .get_mut(&uuid)
            .ok_or(ModelError::UnknownElement(uuid))?;
        if !element.model_type.has_feature(feature) {
            return Err(ModelError::UnknownFeature {
                model_type: element.model_type,
                feature,
            });
        }
        Ok(element)
    }

    pub fn set_attribute(
        &mut self,
        uuid: ModelUuid,
        attribute: Attribute,
        value: Value,
    ) -> Result<ModelEvent, ModelError> {
        let element = self.element_mut(uuid, attribute.into())?;
        element.attributes.insert(attribute, value);
        Ok(ModelEvent {
            element: uuid,
            feature: attribute.into(),
        })
    }

    pub fn unset_attribute(
        &mut self,
        uuid: ModelUuid,
        attribute: Attribute,
    ) -> Result<ModelEvent, ModelError> {
        let element = self.element_mut(uuid, attribute.into())?;
        element.attributes.remove(&attribute);
        Ok(ModelEvent {
            element: uuid,
            feature: attribute.into(),
        })
    }

    pub fn add_relation(
        &mut self,
        uuid: ModelUuid,
        relation: Relation,
        target: ModelUuid,
    ) -> Result<ModelEvent, ModelError> {
        if !self.elements.contains_key(&target) {
            return Err(ModelError::UnknownElement(target));
        }
        let element = self.element_mut(uuid, relation.into())?;
        let targets = element.relations.entry(relation).or_default();
        if relation.is_single() {
            targets.clear();
        }
        if !targets.contains(&target) {
            targets.push(target);
        }
        Ok(ModelEvent {
            element: uuid,
            feature: relation.into(),
        })
    }

    pub fn remove_relation(
        &mut self,
        uuid: ModelUuid,
        relation: Relation,
        target: ModelUuid,
    ) -> Result<ModelEvent, ModelError> {
        let element = self.element_mut(uuid, relation.into())?;
        if let Some(targets) = element.relations.get_mut(&relation) {
            targets.retain(|t| *t != target);
        }
        Ok(ModelEvent {
            element: uuid,
            feature: relation.into(),
        })
    }

    /// Replaces a relation with at most one target.
    pub fn set_relation(
        &mut self,
        uuid: ModelUuid,
        relation: Relation,
        target: Option<ModelUuid>,
    ) -> Result<ModelEvent, ModelError> {
        match target {
            Some(target) => {
                self.element_mut(uuid, relation.into())?
                    .relations
                    .remove(&relation);
                self.add_relation(uuid, relation, target)
            }
            None => {
                self.element_mut(uuid, relation.into())?
                    .relations
                    .remove(&relation);
                Ok(ModelEvent {
                    element: uuid,
                    feature: relation.into(),
                })
            }
        }
    }

    /// Removes an element and every reference to it.
    pub fn remove(&mut self, uuid: ModelUuid) -> Result<Vec<ModelEvent>, ModelError> {
        if self.elements.remove(&uuid).is_none() {
            return Err(ModelError::UnknownElement(uuid));
        }
        let mut events = Vec::new();
        for element in self.elements.values_mut() {
            for (relation, targets) in element.relations.iter_mut() {
                let before = targets.len();
                targets.retain(|t| *t != uuid);
                if targets.len() != before {
                    events.push(ModelEvent {
                        element: element.uuid,
                        feature: (*relation).into(),
                    });
                }
            }
        }
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hierarchy_is_transitive() {
        assert!(ModelType::Device.is_a(ModelType::Node));
        assert!(ModelType::Device.is_a(ModelType::NamedElement));
        assert!(ModelType::ProxyPort.is_a(ModelType::TypedElement));
        assert!(!ModelType::Package.is_a(ModelType::Classifier));
        assert!(ModelType::C4Database.is_a(ModelType::C4Container));
    }

    #[test]
    fn type_name_is_resolved_by_context() {
        assert_eq!(
            ModelType::C4Container.lookup_feature("type"),
            Some(Feature::Attribute(Attribute::C4Type))
        );
        assert_eq!(
            ModelType::ProxyPort.lookup_feature("type"),
            Some(Feature::Relation(Relation::Type))
        );
        assert_eq!(ModelType::Package.lookup_feature("type"), None);
    }

    #[test]
    fn every_type_round_trips_by_name() {
        for t in ModelType::ALL {
            assert_eq!(ModelType::from_name(t.name()), Some(*t));
        }
    }

    #[test]
    fn set_attribute_rejects_undeclared_feature() {
        let mut model = Model::new();
        let package = model.create(ModelType::Package);
        let err = model
            .set_attribute(package, Attribute::Technology, Value::from("Rust"))
            .unwrap_err();
        assert_eq!(
            err,
            ModelError::UnknownFeature {
                model_type: ModelType::Package,
                feature: Feature::Attribute(Attribute::Technology),
            }
        );
    }

    #[test]
    fn single_relation_is_replaced() {
        let mut model = Model::new();
        let a = model.create(ModelType::Package);
        let b = model.create(ModelType::Package);
        let class = model.create(ModelType::Class);
        model.add_relation(class, Relation::Namespace, a).unwrap();
        model.add_relation(class, Relation::Namespace, b).unwrap();
        assert_eq!(model.related(class, Relation::Namespace), &[b]);
    }

    #[test]
    fn opposite_end_is_found_through_association() {
        let mut model = Model::new();
        let association = model.create(ModelType::Association);
        let head = model.create(ModelType::Property);
        let tail = model.create(ModelType::Property);
        for end in [head, tail] {
            model.add_relation(association, Relation::MemberEnd, end).unwrap();
            model.set_relation(end, Relation::Association, Some(association)).unwrap();
        }
        assert_eq!(model.opposite(head), Some(tail));
        assert_eq!(model.opposite(tail), Some(head));
    }

    #[test]
    fn remove_drops_references() {
        let mut model = Model::new();
        let package = model.create_named(ModelType::Package, "p", None).unwrap();
        let class = model
            .create_named(ModelType::Class, "c", Some(package))
            .unwrap();
        let events = model.remove(package).unwrap();
        assert_eq!(
            events,
            vec![ModelEvent {
                element: class,
                feature: Relation::Namespace.into(),
            }]
        );
        assert!(model.first_related(class, Relation::Namespace).is_none());
        assert_eq!(model.remove(package), Err(ModelError::UnknownElement(package)));
    }
}
