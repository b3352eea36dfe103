use eframe::egui;

use crate::common::controller::{ItemContext, PresentationItem};
use crate::common::model::{Attribute, Model, ModelType, Relation};
use crate::common::observer::{ItemFeature, Watch, WatchPath};
use crate::common::recipes::End;
use crate::common::shapes::{
    BoxShape, FontSize, JustifyContent, Padding, Shape, Style, TextAlign, TextShape, TextSource,
    TOP_SEPARATOR,
};
use crate::common::uuid::ModelUuid;

use super::uml_glyphs::{ASSOCIATION_LINE, NODE, PACKAGE};

fn container_justify(has_children: bool) -> JustifyContent {
    if has_children {
        JustifyContent::Start
    } else {
        JustifyContent::Center
    }
}

fn named_element_watches() -> Vec<Watch> {
    vec![
        Watch::repaint(WatchPath::subject_as(ModelType::NamedElement).then(Attribute::Name)),
        Watch::repaint(
            WatchPath::subject()
                .then(Relation::AppliedStereotype)
                .then(Relation::Classifier)
                .then(Attribute::Name),
        ),
    ]
}

/// One compartment per applied stereotype that has slot values.
pub fn stereotype_compartments(model: &Model, subject: Option<ModelUuid>) -> Vec<Shape> {
    let Some(subject) = subject else {
        return Vec::new();
    };
    model
        .related(subject, Relation::AppliedStereotype)
        .iter()
        .filter_map(|instance| {
            let slots: Vec<ModelUuid> = model
                .related(*instance, Relation::Slot)
                .iter()
                .copied()
                .filter(|s| model.text(*s, Attribute::Value).is_some_and(|v| !v.is_empty()))
                .collect();
            if slots.is_empty() {
                return None;
            }
            let mut children: Vec<Shape> = vec![TextShape::new(TextSource::StereotypeName(*instance))
                .style(Style::new().padding(Padding::new(0.0, 0.0, 4.0, 0.0)))
                .into()];
            children.extend(slots.into_iter().map(|slot| {
                Shape::from(
                    TextShape::new(TextSource::SlotText(slot))
                        .style(Style::new().text_align(TextAlign::Left)),
                )
            }));
            Some(
                BoxShape::new(children)
                    .style(Style::new().padding(Padding::uniform(4.0)))
                    .draw(TOP_SEPARATOR)
                    .into(),
            )
        })
        .collect()
}

pub struct PackageItem;

impl PresentationItem for PackageItem {
    fn kind_name(&self) -> &'static str {
        "PackageItem"
    }

    fn default_size(&self) -> egui::Vec2 {
        egui::Vec2::new(70.0, 70.0)
    }

    fn watches(&self) -> Vec<Watch> {
        let mut watches = named_element_watches();
        watches.extend([
            Watch::rebuild(WatchPath::item(ItemFeature::Children)),
            Watch::repaint(
                WatchPath::subject_as(ModelType::NamedElement)
                    .then(Relation::Namespace)
                    .then(Attribute::Name),
            ),
            Watch::repaint(WatchPath::subject().then(Relation::AppliedStereotype)),
        ]);
        watches
    }

    fn build_shapes(&self, context: &ItemContext) -> Shape {
        let is_profile = context
            .subject
            .is_some_and(|s| context.model.is_a(s, ModelType::Profile));
        let extra: &[&'static str] = if is_profile {
            &["stereotype-profile"]
        } else {
            &[]
        };
        BoxShape::new(vec![
            TextShape::new(TextSource::stereotypes(extra)).into(),
            TextShape::new(TextSource::SubjectName)
                .style(Style::new().bold())
                .into(),
            TextShape::new(TextSource::FromPackage)
                .style(Style::new().font_size(FontSize::XSmall))
                .into(),
        ])
        .style(
            Style::new()
                .padding(Padding::new(24.0, 12.0, 4.0, 12.0))
                .justify(container_justify(context.has_children)),
        )
        .draw(PACKAGE)
        .into()
    }
}

pub struct NodeItem;

impl PresentationItem for NodeItem {
    fn kind_name(&self) -> &'static str {
        "NodeItem"
    }

    fn default_size(&self) -> egui::Vec2 {
        egui::Vec2::new(100.0, 50.0)
    }

    fn watches(&self) -> Vec<Watch> {
        let stereotype = || WatchPath::subject().then(Relation::AppliedStereotype);
        vec![
            Watch::rebuild(WatchPath::item(ItemFeature::Children)),
            Watch::rebuild(WatchPath::item(ItemFeature::ShowStereotypes)),
            Watch::repaint(WatchPath::subject_as(ModelType::NamedElement).then(Attribute::Name)),
            Watch::rebuild(stereotype()),
            Watch::repaint(stereotype().then(Relation::Classifier).then(Attribute::Name)),
            Watch::rebuild(stereotype().then(Relation::Slot)),
            Watch::repaint(
                stereotype()
                    .then(Relation::Slot)
                    .then(Relation::DefiningFeature)
                    .then(Attribute::Name),
            ),
            Watch::rebuild(stereotype().then(Relation::Slot).then(Attribute::Value)),
            Watch::rebuild(WatchPath::subject_as(ModelType::Node).then(Relation::OwnedConnector)),
        ]
    }

    fn build_shapes(&self, context: &ItemContext) -> Shape {
        let is_device = context
            .subject
            .is_some_and(|s| context.model.is_a(s, ModelType::Device));
        let extra: &[&'static str] = if is_device {
            &["stereotype-device"]
        } else {
            &[]
        };
        let mut children: Vec<Shape> = vec![BoxShape::new(vec![
            TextShape::new(TextSource::stereotypes(extra)).into(),
            TextShape::new(TextSource::SubjectName)
                .style(Style::new().bold())
                .into(),
        ])
        .style(
            Style::new()
                .padding(Padding::uniform(4.0))
                .justify(JustifyContent::Start),
        )
        .into()];
        if context.properties.show_stereotypes {
            children.extend(stereotype_compartments(context.model, context.subject));
        }
        BoxShape::new(children)
            .style(Style::new().justify(container_justify(context.has_children)))
            .draw(NODE)
            .into()
    }
}

/// Association shown as its name over a line, with the end texts below.
pub struct AssociationItem;

impl PresentationItem for AssociationItem {
    fn kind_name(&self) -> &'static str {
        "AssociationItem"
    }

    fn default_size(&self) -> egui::Vec2 {
        egui::Vec2::new(160.0, 40.0)
    }

    fn watches(&self) -> Vec<Watch> {
        let member_end = || {
            WatchPath::subject_as(ModelType::Association)
                .then_as(Relation::MemberEnd, ModelType::Property)
        };
        let mut watches = named_element_watches();
        watches.extend([
            Watch::rebuild(WatchPath::item(ItemFeature::ShowDirection)),
            Watch::rebuild(WatchPath::item(ItemFeature::Inverted)),
            Watch::repaint(member_end()),
        ]);
        watches.extend(
            [
                Attribute::Name,
                Attribute::Visibility,
                Attribute::IsDerived,
                Attribute::LowerValue,
                Attribute::UpperValue,
            ]
            .into_iter()
            .map(|a| Watch::repaint(member_end().then(a))),
        );
        watches
    }

    fn build_shapes(&self, context: &ItemContext) -> Shape {
        let mut name_row: Vec<Shape> = vec![TextShape::new(TextSource::SubjectName)
            .style(Style::new().bold())
            .into()];
        if context.properties.show_direction {
            let arrow = if context.properties.inverted { "◀" } else { "▶" };
            name_row.push(TextShape::new(TextSource::literal(arrow)).into());
        }
        let end_style = |align| Style::new().font_size(FontSize::Small).text_align(align);

        let mut children: Vec<Shape> = vec![TextShape::new(TextSource::stereotypes(&[])).into()];
        children.extend(name_row);
        children.push(
            TextShape::new(TextSource::AssociationEnd(End::Head))
                .style(end_style(TextAlign::Left))
                .into(),
        );
        children.push(
            TextShape::new(TextSource::AssociationEnd(End::Tail))
                .style(end_style(TextAlign::Right))
                .into(),
        );
        BoxShape::new(children)
            .style(Style::new().padding(Padding::new(0.0, 4.0, 2.0, 4.0)))
            .draw(ASSOCIATION_LINE)
            .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::controller::ItemProperties;
    use crate::common::model::Value;
    use crate::common::recipes::{apply_stereotype, set_slot_value};

    fn context<'a>(
        model: &'a Model,
        subject: Option<ModelUuid>,
        properties: &'a ItemProperties,
        has_children: bool,
    ) -> ItemContext<'a> {
        ItemContext {
            model,
            subject,
            properties,
            has_children,
        }
    }

    fn top_justify(shape: &Shape) -> Option<JustifyContent> {
        match shape {
            Shape::Box(b) => b.style.justify_content,
            _ => None,
        }
    }

    #[test]
    fn watches_are_valid_paths() {
        let items: [&dyn PresentationItem; 3] = [&PackageItem, &NodeItem, &AssociationItem];
        for item in items {
            for watch in item.watches() {
                assert_eq!(watch.path.validate(), Ok(()), "{}", item.kind_name());
            }
        }
    }

    #[test]
    fn package_rebuild_is_idempotent() {
        let mut model = Model::new();
        let package = model.create_named(ModelType::Profile, "P", None).unwrap();
        let properties = ItemProperties::default();
        let ctx = context(&model, Some(package), &properties, false);
        let first = PackageItem.build_shapes(&ctx);
        assert_eq!(first, PackageItem.build_shapes(&ctx));
        assert_eq!(
            first.text_sources()[0],
            &TextSource::stereotypes(&["stereotype-profile"])
        );
    }

    #[test]
    fn children_switch_justification() {
        let mut model = Model::new();
        let package = model.create_named(ModelType::Package, "P", None).unwrap();
        let properties = ItemProperties::default();
        let alone = PackageItem.build_shapes(&context(&model, Some(package), &properties, false));
        let parent = PackageItem.build_shapes(&context(&model, Some(package), &properties, true));
        assert_eq!(top_justify(&alone), Some(JustifyContent::Center));
        assert_eq!(top_justify(&parent), Some(JustifyContent::Start));
        assert_ne!(alone, parent);
    }

    #[test]
    fn node_compartments_follow_show_stereotypes() {
        let mut model = Model::new();
        let device = model.create_named(ModelType::Device, "gpu", None).unwrap();
        let stereotype = model.create_named(ModelType::Stereotype, "hw", None).unwrap();
        let cores = model.create_named(ModelType::Property, "cores", None).unwrap();
        model.add_relation(stereotype, Relation::OwnedAttribute, cores).unwrap();
        let (instance, _) = apply_stereotype(&mut model, device, stereotype).unwrap();

        let mut properties = ItemProperties {
            show_stereotypes: true,
            ..ItemProperties::default()
        };
        // no slot values yet, so no compartment
        let shape = NodeItem.build_shapes(&context(&model, Some(device), &properties, false));
        let Shape::Box(root) = &shape else {
            panic!("node must be a box");
        };
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.draw, Some(NODE));

        set_slot_value(&mut model, instance, cores, "8").unwrap();
        let shape = NodeItem.build_shapes(&context(&model, Some(device), &properties, false));
        let Shape::Box(root) = &shape else {
            panic!("node must be a box");
        };
        assert_eq!(root.children.len(), 2);
        assert!(shape
            .find_text(&TextSource::StereotypeName(instance))
            .is_some());
        assert!(shape
            .text_sources()
            .contains(&&TextSource::stereotypes(&["stereotype-device"])));

        properties.show_stereotypes = false;
        let shape = NodeItem.build_shapes(&context(&model, Some(device), &properties, false));
        assert!(shape.find_text(&TextSource::StereotypeName(instance)).is_none());
    }

    #[test]
    fn node_rebuild_is_idempotent() {
        let mut model = Model::new();
        let device = model.create_named(ModelType::Device, "gpu", None).unwrap();
        let stereotype = model.create_named(ModelType::Stereotype, "hw", None).unwrap();
        let cores = model.create_named(ModelType::Property, "cores", None).unwrap();
        model.add_relation(stereotype, Relation::OwnedAttribute, cores).unwrap();
        let (instance, _) = apply_stereotype(&mut model, device, stereotype).unwrap();
        set_slot_value(&mut model, instance, cores, "8").unwrap();

        for show_stereotypes in [false, true] {
            let properties = ItemProperties {
                show_stereotypes,
                ..ItemProperties::default()
            };
            for has_children in [false, true] {
                let ctx = context(&model, Some(device), &properties, has_children);
                assert_eq!(NodeItem.build_shapes(&ctx), NodeItem.build_shapes(&ctx));
            }
        }
    }

    #[test]
    fn association_rebuild_is_idempotent() {
        let mut model = Model::new();
        let association = model.create_named(ModelType::Association, "owns", None).unwrap();
        for (show_direction, inverted) in [(false, false), (true, false), (true, true)] {
            let properties = ItemProperties {
                show_direction,
                inverted,
                ..ItemProperties::default()
            };
            let ctx = context(&model, Some(association), &properties, false);
            assert_eq!(AssociationItem.build_shapes(&ctx), AssociationItem.build_shapes(&ctx));
        }
    }

    #[test]
    fn empty_slot_values_are_hidden() {
        let mut model = Model::new();
        let node = model.create_named(ModelType::Node, "n", None).unwrap();
        let stereotype = model.create_named(ModelType::Stereotype, "s", None).unwrap();
        let attr = model.create_named(ModelType::Property, "a", None).unwrap();
        let (instance, _) = apply_stereotype(&mut model, node, stereotype).unwrap();
        set_slot_value(&mut model, instance, attr, "").unwrap();
        assert!(stereotype_compartments(&model, Some(node)).is_empty());
        let slot = model.related(instance, Relation::Slot)[0];
        model.set_attribute(slot, Attribute::Value, Value::from("x")).unwrap();
        assert_eq!(stereotype_compartments(&model, Some(node)).len(), 1);
        assert!(stereotype_compartments(&model, None).is_empty());
    }

    #[test]
    fn association_direction_marker() {
        let mut model = Model::new();
        let association = model.create_named(ModelType::Association, "owns", None).unwrap();
        let mut properties = ItemProperties::default();
        let plain = AssociationItem.build_shapes(&context(&model, Some(association), &properties, false));
        assert!(plain.find_text(&TextSource::literal("▶")).is_none());
        properties.show_direction = true;
        let directed = AssociationItem.build_shapes(&context(&model, Some(association), &properties, false));
        assert!(directed.find_text(&TextSource::literal("▶")).is_some());
        properties.inverted = true;
        let inverted = AssociationItem.build_shapes(&context(&model, Some(association), &properties, false));
        assert!(inverted.find_text(&TextSource::literal("◀")).is_some());
    }
}
