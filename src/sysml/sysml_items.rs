use eframe::egui;

use crate::common::controller::{ItemContext, PresentationItem, Side};
use crate::common::model::{Attribute, ModelType, Relation};
use crate::common::observer::{ItemFeature, Watch, WatchPath};
use crate::common::shapes::{
    BoxShape, IconBoxShape, Shape, Style, TextAlign, TextShape, TextSource, VerticalAlign, BORDER,
};

/// Where the port labels go for a port attached to `side` of its parent.
pub fn text_position(side: Side) -> (TextAlign, VerticalAlign) {
    let align = if side == Side::Left {
        TextAlign::Left
    } else {
        TextAlign::Right
    };
    let vertical = if side == Side::Bottom {
        VerticalAlign::Bottom
    } else {
        VerticalAlign::Top
    };
    (align, vertical)
}

/// Small square on the border of a block, labelled outside of it.
pub struct ProxyPortItem;

impl PresentationItem for ProxyPortItem {
    fn kind_name(&self) -> &'static str {
        "ProxyPortItem"
    }

    fn default_size(&self) -> egui::Vec2 {
        egui::Vec2::new(16.0, 16.0)
    }

    fn watches(&self) -> Vec<Watch> {
        vec![
            Watch::repaint(WatchPath::subject_as(ModelType::NamedElement).then(Attribute::Name)),
            Watch::repaint(
                WatchPath::subject_as(ModelType::TypedElement)
                    .then(Relation::Type)
                    .then(Attribute::Name),
            ),
            Watch::repaint(
                WatchPath::subject()
                    .then(Relation::AppliedStereotype)
                    .then(Relation::Classifier)
                    .then(Attribute::Name),
            ),
            Watch::repaint(WatchPath::item(ItemFeature::ShowType)),
            Watch::rebuild(WatchPath::item(ItemFeature::ConnectedSide)),
        ]
    }

    fn build_shapes(&self, context: &ItemContext) -> Shape {
        let (text_align, vertical_align) = text_position(context.properties.connected_side);
        IconBoxShape::new(
            BoxShape::new(Vec::new()).draw(BORDER),
            vec![
                TextShape::new(TextSource::stereotypes(&["stereotype-proxy"])).into(),
                TextShape::new(TextSource::PortName).into(),
            ],
        )
        .style(
            Style::new()
                .text_align(text_align)
                .vertical_align(vertical_align),
        )
        .into()
    }

    fn is_attached(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::canvas::Highlight;
    use crate::common::config::{FontSettings, Palette};
    use crate::common::controller::ItemProperties;
    use crate::common::fluent::Localizer;
    use crate::common::model::Model;
    use crate::common::render::testing::RecordingCanvas;
    use crate::common::render::{draw_shape, RenderContext, TextContext};
    use crate::common::uuid::ModelUuid;

    #[test]
    fn labels_follow_connected_side() {
        assert_eq!(text_position(Side::Left), (TextAlign::Left, VerticalAlign::Top));
        assert_eq!(text_position(Side::Right), (TextAlign::Right, VerticalAlign::Top));
        assert_eq!(text_position(Side::Top), (TextAlign::Right, VerticalAlign::Top));
        assert_eq!(text_position(Side::Bottom), (TextAlign::Right, VerticalAlign::Bottom));
    }

    #[test]
    fn side_change_rebuilds_and_type_toggle_repaints() {
        let watches = ProxyPortItem.watches();
        for watch in &watches {
            assert_eq!(watch.path.validate(), Ok(()));
        }
        assert!(watches.contains(&Watch::rebuild(WatchPath::item(ItemFeature::ConnectedSide))));
        assert!(watches.contains(&Watch::repaint(WatchPath::item(ItemFeature::ShowType))));
        assert!(ProxyPortItem.is_attached());
    }

    #[test]
    fn rebuild_is_idempotent_for_every_side() {
        let mut model = Model::new();
        let block = model.create_named(ModelType::Class, "Engine", None).unwrap();
        let port = model.create_named(ModelType::ProxyPort, "p1", None).unwrap();
        model.set_relation(port, Relation::Type, Some(block)).unwrap();
        for connected_side in Side::ALL {
            let properties = ItemProperties {
                show_type: true,
                connected_side,
                ..ItemProperties::default()
            };
            let ctx = ItemContext {
                model: &model,
                subject: Some(port),
                properties: &properties,
                has_children: false,
            };
            assert_eq!(ProxyPortItem.build_shapes(&ctx), ProxyPortItem.build_shapes(&ctx));
        }
    }

    fn render(model: &Model, port: ModelUuid, properties: &ItemProperties, bounds: egui::Rect) -> RecordingCanvas {
        let localizer = Localizer::default();
        let fonts = FontSettings::default();
        let shape = ProxyPortItem.build_shapes(&ItemContext {
            model,
            subject: Some(port),
            properties,
            has_children: false,
        });
        let ctx = RenderContext {
            text: TextContext {
                model,
                localizer: &localizer,
                diagram_owner: None,
                subject: Some(port),
                parent_subject: None,
                properties,
                item_width: bounds.width(),
            },
            fonts: &fonts,
            palette: Palette::default(),
            highlight: Highlight::NONE,
        };
        let mut canvas = RecordingCanvas::default();
        draw_shape(&shape, &mut canvas, &ctx, bounds);
        canvas
    }

    #[test]
    fn labels_are_drawn_outside_the_port() {
        let mut model = Model::new();
        let block = model.create_named(ModelType::Class, "Engine", None).unwrap();
        let port = model.create_named(ModelType::ProxyPort, "p1", None).unwrap();
        model.set_relation(port, Relation::Type, Some(block)).unwrap();
        let bounds = egui::Rect::from_min_size(egui::Pos2::new(100.0, 100.0), egui::Vec2::splat(16.0));

        let mut properties = ItemProperties {
            show_type: true,
            connected_side: Side::Left,
            ..ItemProperties::default()
        };
        let canvas = render(&model, port, &properties, bounds);
        let proxy = canvas.text("«proxy»").unwrap();
        let name = canvas.text("p1: Engine").unwrap();
        // above the port, right edge flush with its left side
        assert!(proxy.position.y < 100.0);
        assert!(name.position.y < 100.0);
        assert!(proxy.position.y < name.position.y);
        assert!(name.position.x < 100.0);

        properties.show_type = false;
        properties.connected_side = Side::Bottom;
        let canvas = render(&model, port, &properties, bounds);
        let name = canvas.text("p1").unwrap();
        assert!(name.position.y >= 116.0);
        assert!(name.position.x >= 116.0);
    }
}
