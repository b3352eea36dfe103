//! Model queries and edits shared by the diagram items and property pages.

use super::error::ModelError;
use super::fluent::Localizer;
use super::model::{Attribute, Model, ModelEvent, ModelType, Relation, Value, Visibility};
use super::uuid::ModelUuid;

/// Names of the stereotypes applied to `element`, in application order.
pub fn stereotype_names(model: &Model, element: ModelUuid) -> Vec<String> {
    model
        .related(element, Relation::AppliedStereotype)
        .iter()
        .flat_map(|instance| model.related(*instance, Relation::Classifier))
        .map(|stereotype| model.name(*stereotype))
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
        .collect()
}

/// `«extra, applied»`, or the empty string when there is nothing to show.
pub fn stereotypes_str(model: &Model, element: Option<ModelUuid>, extra: &[String]) -> String {
    let mut names: Vec<String> = extra.iter().filter(|e| !e.is_empty()).cloned().collect();
    if let Some(element) = element {
        names.extend(stereotype_names(model, element));
    }
    if names.is_empty() {
        String::new()
    } else {
        format!("«{}»", names.join(", "))
    }
}

/// "(from Namespace)" for elements shown outside of their namespace.
///
/// Nothing is shown when the namespace is the diagram owner, or when the
/// item sits inside a parent whose subject lives in another namespace.
pub fn from_package_str(
    model: &Model,
    localizer: &Localizer,
    subject: Option<ModelUuid>,
    parent_subject: Option<ModelUuid>,
    diagram_owner: Option<ModelUuid>,
) -> String {
    let Some(subject) = subject else {
        return String::new();
    };
    let Some(namespace) = model.first_related(subject, Relation::Namespace) else {
        return String::new();
    };
    if let Some(parent) = parent_subject {
        if model.first_related(parent, Relation::Namespace) != Some(namespace) {
            return String::new();
        }
    }
    if diagram_owner == Some(namespace) {
        return String::new();
    }
    localizer.gettext_args("from-package", &[("namespace", model.name(namespace))])
}

/// Textual multiplicity: `[u]` or `[l..u]`.
pub fn format_multiplicity(model: &Model, property: ModelUuid) -> String {
    let lower = model.text(property, Attribute::LowerValue).filter(|s| !s.is_empty());
    let upper = model.text(property, Attribute::UpperValue).filter(|s| !s.is_empty());
    match (lower, upper) {
        (None, None) => String::new(),
        (Some(l), Some(u)) if l != u => format!("[{}..{}]", l, u),
        (_, Some(u)) => format!("[{}]", u),
        (Some(l), None) => format!("[{}]", l),
    }
}

/// Association end text: `+ /name [0..*]`.
pub fn format_property(model: &Model, property: ModelUuid) -> String {
    let mut s = String::new();
    if let Some(Value::Visibility(v)) = model.attribute(property, Attribute::Visibility) {
        s.push(v.sign());
        s.push(' ');
    }
    if model.flag(property, Attribute::IsDerived) == Some(true) {
        s.push('/');
    }
    s.push_str(model.name(property));
    let multiplicity = format_multiplicity(model, property);
    if !multiplicity.is_empty() {
        if !s.is_empty() {
            s.push(' ');
        }
        s.push_str(&multiplicity);
    }
    s
}

#[derive(Debug, PartialEq, Eq)]
pub struct ParsedProperty<'a> {
    pub visibility: Option<Visibility>,
    pub derived: bool,
    pub name: &'a str,
    pub lower: Option<&'a str>,
    pub upper: Option<&'a str>,
}

fn is_bound(s: &str) -> bool {
    s == "*" || (!s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric()))
}

/// Parses `[vis] [/] name [\[lower..upper\]]`; None when `text` does not fit.
pub fn parse_property_text(text: &str) -> Option<ParsedProperty<'_>> {
    let mut rest = text.trim();

    let visibility = rest.chars().next().and_then(Visibility::from_sign);
    if visibility.is_some() {
        rest = rest[1..].trim_start();
    }
    let derived = rest.starts_with('/');
    if derived {
        rest = rest[1..].trim_start();
    }

    let (name, multiplicity) = match rest.find('[') {
        Some(i) => (rest[..i].trim_end(), Some(&rest[i..])),
        None => (rest, None),
    };
    if name.contains(|c: char| matches!(c, ']' | '/' | '+' | '#' | '~')) {
        return None;
    }

    let (lower, upper) = match multiplicity {
        None => (None, None),
        Some(m) => {
            let inner = m.strip_prefix('[')?.strip_suffix(']')?.trim();
            match inner.split_once("..") {
                Some((l, u)) => {
                    let (l, u) = (l.trim(), u.trim());
                    if !is_bound(l) || !is_bound(u) {
                        return None;
                    }
                    (Some(l), Some(u))
                }
                None => {
                    if !is_bound(inner) {
                        return None;
                    }
                    (None, Some(inner))
                }
            }
        }
    };

    Some(ParsedProperty {
        visibility,
        derived,
        name,
        lower,
        upper,
    })
}

/// Applies association end text to `property`.
///
/// Text that does not parse becomes the name verbatim.
pub fn parse_property(
    model: &mut Model,
    property: ModelUuid,
    text: &str,
) -> Result<Vec<ModelEvent>, ModelError> {
    let Some(parsed) = parse_property_text(text) else {
        return Ok(vec![model.set_attribute(property, Attribute::Name, Value::from(text))?]);
    };
    let mut events = Vec::new();
    if let Some(v) = parsed.visibility {
        events.push(model.set_attribute(property, Attribute::Visibility, Value::Visibility(v))?);
    }
    events.push(model.set_attribute(property, Attribute::IsDerived, Value::Bool(parsed.derived))?);
    events.push(model.set_attribute(property, Attribute::Name, Value::from(parsed.name))?);
    for (attribute, bound) in [
        (Attribute::LowerValue, parsed.lower),
        (Attribute::UpperValue, parsed.upper),
    ] {
        events.push(match bound {
            Some(b) => model.set_attribute(property, attribute, Value::from(b))?,
            None => model.unset_attribute(property, attribute)?,
        });
    }
    Ok(events)
}

/// Which end of an association.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum End {
    Head,
    Tail,
}

impl End {
    pub fn message_id(self) -> &'static str {
        match self {
            End::Head => "association-end-head",
            End::Tail => "association-end-tail",
        }
    }
}

/// The member end shown at `end`; the first member end is the head unless inverted.
pub fn association_end(
    model: &Model,
    association: ModelUuid,
    end: End,
    inverted: bool,
) -> Option<ModelUuid> {
    let ends = model.related(association, Relation::MemberEnd);
    let index = match (end, inverted) {
        (End::Head, false) | (End::Tail, true) => 0,
        (End::Head, true) | (End::Tail, false) => 1,
    };
    ends.get(index).copied()
}

pub fn navigability(model: &Model, property: ModelUuid) -> Option<bool> {
    model.flag(property, Attribute::Navigability)
}

/// Sets navigability of `end`, owning it by the opposite class when navigable.
pub fn set_navigability(
    model: &mut Model,
    end: ModelUuid,
    navigable: Option<bool>,
) -> Result<Vec<ModelEvent>, ModelError> {
    let mut events = vec![match navigable {
        Some(n) => model.set_attribute(end, Attribute::Navigability, Value::Bool(n))?,
        None => model.unset_attribute(end, Attribute::Navigability)?,
    }];
    let owner = model
        .opposite(end)
        .and_then(|o| model.first_related(o, Relation::Type))
        .filter(|t| model.is_a(*t, ModelType::Class))
        .filter(|_| navigable == Some(true));

    // an end has at most one owning class
    let previous: Vec<ModelUuid> = model
        .elements_of_type(ModelType::Class)
        .map(|e| e.uuid)
        .filter(|c| Some(*c) != owner && model.related(*c, Relation::OwnedAttribute).contains(&end))
        .collect();
    for class in previous {
        events.push(model.remove_relation(class, Relation::OwnedAttribute, end)?);
    }
    if let Some(owner) = owner {
        if !model.related(owner, Relation::OwnedAttribute).contains(&end) {
            events.push(model.add_relation(owner, Relation::OwnedAttribute, end)?);
        }
    }
    Ok(events)
}

/// Stereotypes that can be applied to `element`, in creation order.
pub fn get_stereotypes(model: &Model, element: ModelUuid) -> Vec<ModelUuid> {
    if !model.contains(element) {
        return Vec::new();
    }
    let mut stereotypes: Vec<ModelUuid> = model
        .elements_of_type(ModelType::Stereotype)
        .map(|e| e.uuid)
        .collect();
    stereotypes.sort();
    stereotypes
}

/// The instance applying `stereotype` to `element`, if any.
pub fn applied_instance(model: &Model, element: ModelUuid, stereotype: ModelUuid) -> Option<ModelUuid> {
    model
        .related(element, Relation::AppliedStereotype)
        .iter()
        .copied()
        .find(|i| model.related(*i, Relation::Classifier).contains(&stereotype))
}

pub fn apply_stereotype(
    model: &mut Model,
    element: ModelUuid,
    stereotype: ModelUuid,
) -> Result<(ModelUuid, Vec<ModelEvent>), ModelError> {
    if let Some(instance) = applied_instance(model, element, stereotype) {
        return Ok((instance, Vec::new()));
    }
    let instance = model.create(ModelType::InstanceSpecification);
    let events = vec![
        model.add_relation(instance, Relation::Classifier, stereotype)?,
        model.add_relation(element, Relation::AppliedStereotype, instance)?,
    ];
    Ok((instance, events))
}

pub fn remove_stereotype(
    model: &mut Model,
    element: ModelUuid,
    stereotype: ModelUuid,
) -> Result<Vec<ModelEvent>, ModelError> {
    let Some(instance) = applied_instance(model, element, stereotype) else {
        return Ok(Vec::new());
    };
    let slots = model.related(instance, Relation::Slot).to_vec();
    let mut events = model.remove(instance)?;
    for slot in slots {
        events.extend(model.remove(slot)?);
    }
    Ok(events)
}

pub fn slot_for(model: &Model, instance: ModelUuid, attribute: ModelUuid) -> Option<ModelUuid> {
    model
        .related(instance, Relation::Slot)
        .iter()
        .copied()
        .find(|s| model.first_related(*s, Relation::DefiningFeature) == Some(attribute))
}

/// Sets the value of the slot for `attribute`, creating the slot when missing.
pub fn set_slot_value(
    model: &mut Model,
    instance: ModelUuid,
    attribute: ModelUuid,
    value: &str,
) -> Result<Vec<ModelEvent>, ModelError> {
    let mut events = Vec::new();
    let slot = match slot_for(model, instance, attribute) {
        Some(slot) => slot,
        None => {
            let slot = model.create(ModelType::Slot);
            events.push(model.set_relation(slot, Relation::DefiningFeature, Some(attribute))?);
            events.push(model.add_relation(instance, Relation::Slot, slot)?);
            slot
        }
    };
    events.push(model.set_attribute(slot, Attribute::Value, Value::from(value))?);
    Ok(events)
}

/// `name = value` line of a slot.
pub fn slot_str(model: &Model, slot: ModelUuid) -> String {
    let name = model
        .first_related(slot, Relation::DefiningFeature)
        .map(|f| model.name(f))
        .unwrap_or("");
    let value = model.text(slot, Attribute::Value).unwrap_or("");
    format!("{} = {}", name, value)
}
