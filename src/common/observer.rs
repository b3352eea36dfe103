use std::collections::BTreeMap;
use std::str::FromStr;

use derive_more::From;
use log::debug;

use super::error::PathError;
use super::model::{Feature, Model, ModelEvent, ModelType};
use super::uuid::{ModelUuid, ViewUuid};

/// Presentation-level state an item can watch, as opposed to model state.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum ItemFeature {
    Children,
    ShowStereotypes,
    ShowType,
    ConnectedSide,
    ShowDirection,
    Inverted,
}

impl ItemFeature {
    const ALL: [ItemFeature; 6] = [
        ItemFeature::Children,
        ItemFeature::ShowStereotypes,
        ItemFeature::ShowType,
        ItemFeature::ConnectedSide,
        ItemFeature::ShowDirection,
        ItemFeature::Inverted,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ItemFeature::Children => "children",
            ItemFeature::ShowStereotypes => "show_stereotypes",
            ItemFeature::ShowType => "show_type",
            ItemFeature::ConnectedSide => "connected_side",
            ItemFeature::ShowDirection => "show_direction",
            ItemFeature::Inverted => "inverted",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ItemEvent {
    pub view: ViewUuid,
    pub feature: ItemFeature,
}

/// Anything a watch can be triggered by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, From)]
pub enum Change {
    Model(ModelEvent),
    Item(ItemEvent),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WatchStep {
    pub feature: Feature,
    pub qualifier: Option<ModelType>,
}

/// A typed path from an item to the state it depends on.
///
/// Textual form: `subject[NamedElement].namespace.name`, `children`, ...
/// A `[Type]` qualifier restricts the elements reached so far to that type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WatchPath {
    Subject {
        qualifier: Option<ModelType>,
        steps: Vec<WatchStep>,
    },
    Item(ItemFeature),
}

impl WatchPath {
    pub fn subject() -> Self {
        WatchPath::Subject {
            qualifier: None,
            steps: Vec::new(),
        }
    }

    pub fn subject_as(model_type: ModelType) -> Self {
        WatchPath::Subject {
            qualifier: Some(model_type),
            steps: Vec::new(),
        }
    }

    pub fn item(feature: ItemFeature) -> Self {
        WatchPath::Item(feature)
    }

    pub fn then(self, feature: impl Into<Feature>) -> Self {
        self.push(feature.into(), None)
    }

    pub fn then_as(self, feature: impl Into<Feature>, qualifier: ModelType) -> Self {
        self.push(feature.into(), Some(qualifier))
    }

    fn push(self, feature: Feature, qualifier: Option<ModelType>) -> Self {
        match self {
            WatchPath::Subject {
                qualifier: root,
                mut steps,
            } => {
                steps.push(WatchStep { feature, qualifier });
                WatchPath::Subject {
                    qualifier: root,
                    steps,
                }
            }
            // item features have no further structure
            item @ WatchPath::Item(_) => item,
        }
    }

    /// Checks every step against the schema.
    pub fn validate(&self) -> Result<(), PathError> {
        let WatchPath::Subject { qualifier, steps } = self else {
            return Ok(());
        };
        let mut context = Some(qualifier.unwrap_or(ModelType::Element));
        for step in steps {
            let Some(current) = context else {
                return Err(PathError::TraversesAttribute(step.feature.name().to_owned()));
            };
            if !current.has_feature(step.feature) {
                return Err(PathError::UnknownFeature {
                    name: step.feature.name().to_owned(),
                    context: current,
                });
            }
            context = match step.feature {
                Feature::Relation(r) => Some(step.qualifier.unwrap_or(r.target_type())),
                Feature::Attribute(_) => None,
            };
        }
        Ok(())
    }

    /// Whether `change` affects an item owning `owner` and showing `subject`.
    fn matches(
        &self,
        model: &Model,
        owner: ViewUuid,
        subject: Option<ModelUuid>,
        change: &Change,
    ) -> bool {
        match (self, change) {
            (WatchPath::Item(feature), Change::Item(event)) => {
                event.view == owner && event.feature == *feature
            }
            (WatchPath::Subject { qualifier, steps }, Change::Model(event)) => {
                let Some(subject) = subject else {
                    return false;
                };
                let mut level: Vec<ModelUuid> = vec![subject];
                if let Some(q) = qualifier {
                    level.retain(|e| model.is_a(*e, *q));
                }
                for step in steps {
                    if step.feature == event.feature && level.contains(&event.element) {
                        return true;
                    }
                    let Feature::Relation(relation) = step.feature else {
                        break;
                    };
                    level = level
                        .iter()
                        .flat_map(|e| model.related(*e, relation).iter().copied())
                        .filter(|e| step.qualifier.is_none_or(|q| model.is_a(*e, q)))
                        .collect();
                    if level.is_empty() {
                        break;
                    }
                }
                false
            }
            _ => false,
        }
    }
}

fn split_qualifier(segment: &str) -> Result<(&str, Option<ModelType>), PathError> {
    match segment.split_once('[') {
        None => Ok((segment, None)),
        Some((name, rest)) => {
            let type_name = rest
                .strip_suffix(']')
                .ok_or_else(|| PathError::Malformed(segment.to_owned()))?;
            let model_type = ModelType::from_name(type_name)
                .ok_or_else(|| PathError::UnknownType(type_name.to_owned()))?;
            Ok((name, Some(model_type)))
        }
    }
}

impl FromStr for WatchPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PathError::Empty);
        }
        let mut segments = s.split('.');
        let root = segments.next().unwrap_or_default();

        if let Some(feature) = ItemFeature::from_name(root) {
            if segments.next().is_some() {
                return Err(PathError::Malformed(s.to_owned()));
            }
            return Ok(WatchPath::Item(feature));
        }

        let (root_name, root_qualifier) = split_qualifier(root)?;
        if root_name != "subject" {
            return Err(PathError::UnknownRoot(root_name.to_owned()));
        }

        let mut path = WatchPath::Subject {
            qualifier: root_qualifier,
            steps: Vec::new(),
        };
        let mut context = Some(root_qualifier.unwrap_or(ModelType::Element));
        for segment in segments {
            let (name, qualifier) = split_qualifier(segment)?;
            if name.is_empty() {
                return Err(PathError::Malformed(segment.to_owned()));
            }
            let Some(current) = context else {
                return Err(PathError::TraversesAttribute(name.to_owned()));
            };
            let feature =
                current
                    .lookup_feature(name)
                    .ok_or_else(|| PathError::UnknownFeature {
                        name: name.to_owned(),
                        context: current,
                    })?;
            context = match feature {
                Feature::Relation(r) => Some(qualifier.unwrap_or(r.target_type())),
                Feature::Attribute(_) => None,
            };
            path = path.push(feature, qualifier);
        }
        Ok(path)
    }
}

/// What happens to the owner when a watched path changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum WatchAction {
    /// Lazy text is re-resolved on the next paint.
    Repaint,
    /// The shape tree is constructed again.
    Rebuild,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Watch {
    pub path: WatchPath,
    pub action: WatchAction,
}

impl Watch {
    pub fn repaint(path: WatchPath) -> Self {
        Self {
            path,
            action: WatchAction::Repaint,
        }
    }

    pub fn rebuild(path: WatchPath) -> Self {
        Self {
            path,
            action: WatchAction::Rebuild,
        }
    }
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct WatchId(u64);

struct Registration {
    id: WatchId,
    owner: ViewUuid,
    subject: Option<ModelUuid>,
    watch: Watch,
}

/// Keeps the watches of a set of owners and tells which owners a change concerns.
#[derive(Default)]
pub struct WatchRegistry {
    next_id: u64,
    registrations: Vec<Registration>,
}

impl WatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn watch(&mut self, owner: ViewUuid, subject: Option<ModelUuid>, watch: Watch) -> WatchId {
        let id = WatchId(self.next_id);
        self.next_id += 1;
        debug!(owner:% = owner, path:? = watch.path; "Registering watch");
        self.registrations.push(Registration {
            id,
            owner,
            subject,
            watch,
        });
        id
    }

    pub fn unwatch(&mut self, id: WatchId) -> bool {
        let before = self.registrations.len();
        self.registrations.retain(|r| r.id != id);
        before != self.registrations.len()
    }

    /// Releases every watch of `owner`, returning how many were released.
    pub fn unsubscribe_all(&mut self, owner: ViewUuid) -> usize {
        let before = self.registrations.len();
        self.registrations.retain(|r| r.owner != owner);
        let released = before - self.registrations.len();
        debug!(owner:% = owner, released = released; "Released watches");
        released
    }

    /// Points the watches of `owner` at a new subject.
    pub fn rebind_subject(&mut self, owner: ViewUuid, subject: Option<ModelUuid>) {
        for r in self.registrations.iter_mut().filter(|r| r.owner == owner) {
            r.subject = subject;
        }
    }

    pub fn watch_count(&self, owner: ViewUuid) -> usize {
        self.registrations.iter().filter(|r| r.owner == owner).count()
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Watches triggered by `change`, in registration order.
    pub fn matching(&self, model: &Model, change: &Change) -> Vec<WatchId> {
        self.registrations
            .iter()
            .filter(|r| r.watch.path.matches(model, r.owner, r.subject, change))
            .map(|r| r.id)
            .collect()
    }

    /// Owners concerned by `change`, each with the strongest action requested.
    pub fn dispatch(&self, model: &Model, change: &Change) -> Vec<(ViewUuid, WatchAction)> {
        let mut affected = BTreeMap::<ViewUuid, WatchAction>::new();
        for r in &self.registrations {
            if r.watch.path.matches(model, r.owner, r.subject, change) {
                let action = affected.entry(r.owner).or_insert(r.watch.action);
                *action = (*action).max(r.watch.action);
            }
        }
        debug!(change:? = change, affected = affected.len(); "Dispatched change");
        affected.into_iter().collect()
    }
}
