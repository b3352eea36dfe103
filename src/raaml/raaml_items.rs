use eframe::egui;

use crate::common::controller::{ItemContext, PresentationItem};
use crate::common::model::{Attribute, ModelType, Relation};
use crate::common::observer::{Watch, WatchPath};
use crate::common::shapes::{
    BoxShape, DrawingRoutine, FontSize, IconBoxShape, Shape, Style, TextShape, TextSource,
};

use super::raaml_glyphs::{
    BASIC_EVENT, DEFAULT_FTA_MAJOR, DEFAULT_FTA_MINOR, HOUSE_EVENT, MAJORITY_VOTE_DEFAULT_WIDTH,
    MAJORITY_VOTE_GATE, ZERO_EVENT,
};

fn fta_watches() -> Vec<Watch> {
    let named = || WatchPath::subject_as(ModelType::NamedElement);
    vec![
        Watch::repaint(named().then(Attribute::Name)),
        Watch::repaint(named().then(Relation::Namespace).then(Attribute::Name)),
        Watch::repaint(
            WatchPath::subject()
                .then(Relation::AppliedStereotype)
                .then(Relation::Classifier)
                .then(Attribute::Name),
        ),
    ]
}

/// Glyph with the kind, name and owning package stacked below it.
fn fta_shapes(routine: DrawingRoutine, label: &'static str) -> Shape {
    IconBoxShape::new(
        BoxShape::new(Vec::new()).draw(routine),
        vec![
            TextShape::new(TextSource::stereotypes(&[label])).into(),
            TextShape::new(TextSource::SubjectName)
                .style(Style::new().bold())
                .width_inset(4.0)
                .into(),
            TextShape::new(TextSource::FromPackage)
                .style(Style::new().font_size(FontSize::XSmall))
                .into(),
        ],
    )
    .into()
}

macro_rules! fta_item {
    ($name:ident, $label:literal, $routine:expr, $width:expr, $height:expr) => {
        pub struct $name;

        impl PresentationItem for $name {
            fn kind_name(&self) -> &'static str {
                stringify!($name)
            }

            fn default_size(&self) -> egui::Vec2 {
                egui::Vec2::new($width, $height)
            }

            fn watches(&self) -> Vec<Watch> {
                fta_watches()
            }

            fn build_shapes(&self, _context: &ItemContext) -> Shape {
                fta_shapes($routine, $label)
            }
        }
    };
}

fta_item!(BasicEventItem, "basic-event", BASIC_EVENT, DEFAULT_FTA_MAJOR, DEFAULT_FTA_MAJOR);
fta_item!(HouseEventItem, "house-event", HOUSE_EVENT, DEFAULT_FTA_MINOR, DEFAULT_FTA_MAJOR);
fta_item!(ZeroEventItem, "zero-event", ZERO_EVENT, DEFAULT_FTA_MINOR, DEFAULT_FTA_MAJOR);
fta_item!(
    MajorityVoteItem,
    "majority-vote-gate",
    MAJORITY_VOTE_GATE,
    MAJORITY_VOTE_DEFAULT_WIDTH,
    DEFAULT_FTA_MAJOR
);

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

    #[test]
    fn default_sizes() {
        assert_eq!(BasicEventItem.default_size(), egui::Vec2::new(50.0, 50.0));
        assert_eq!(HouseEventItem.default_size(), egui::Vec2::new(30.0, 50.0));
        assert_eq!(ZeroEventItem.default_size(), egui::Vec2::new(30.0, 50.0));
        assert_eq!(MajorityVoteItem.default_size(), egui::Vec2::new(40.0, 50.0));
    }

    #[test]
    fn watches_only_repaint() {
        let items: [&dyn PresentationItem; 4] =
            [&BasicEventItem, &HouseEventItem, &ZeroEventItem, &MajorityVoteItem];
        for item in items {
            for watch in item.watches() {
                assert_eq!(watch.path.validate(), Ok(()));
                assert_eq!(watch.action, crate::common::observer::WatchAction::Repaint);
            }
        }
    }

    #[test]
    fn rebuild_is_idempotent() {
        let mut model = Model::new();
        let package = model.create_named(ModelType::Package, "Hazards", None).unwrap();
        let properties = ItemProperties::default();
        let items: [(&dyn PresentationItem, ModelType); 4] = [
            (&BasicEventItem, ModelType::BasicEvent),
            (&HouseEventItem, ModelType::HouseEvent),
            (&ZeroEventItem, ModelType::ZeroEvent),
            (&MajorityVoteItem, ModelType::MajorityVoteGate),
        ];
        for (item, model_type) in items {
            let subject = model.create_named(model_type, "e", Some(package)).unwrap();
            let ctx = ItemContext {
                model: &model,
                subject: Some(subject),
                properties: &properties,
                has_children: false,
            };
            assert_eq!(item.build_shapes(&ctx), item.build_shapes(&ctx), "{}", item.kind_name());
        }
    }

    #[test]
    fn labels_stack_below_the_glyph() {
        let mut model = Model::new();
        let package = model.create_named(ModelType::Package, "Hazards", None).unwrap();
        let event = model
            .create_named(ModelType::BasicEvent, "Pump fails", Some(package))
            .unwrap();
        let properties = ItemProperties::default();
        let shape = BasicEventItem.build_shapes(&ItemContext {
            model: &model,
            subject: Some(event),
            properties: &properties,
            has_children: false,
        });

        let localizer = Localizer::default();
        let fonts = FontSettings::default();
        let ctx = RenderContext {
            text: TextContext {
                model: &model,
                localizer: &localizer,
                diagram_owner: None,
                subject: Some(event),
                parent_subject: None,
                properties: &properties,
                item_width: 50.0,
            },
            fonts: &fonts,
            palette: Palette::default(),
            highlight: Highlight::NONE,
        };
        let mut canvas = RecordingCanvas::default();
        draw_shape(
            &shape,
            &mut canvas,
            &ctx,
            egui::Rect::from_min_size(egui::Pos2::ZERO, egui::Vec2::splat(50.0)),
        );

        assert_eq!(canvas.paths.len(), 1);
        let kind = canvas.text("«Basic Event»").unwrap();
        let from = canvas.text("(from Hazards)").unwrap();
        assert!(kind.position.y >= 50.0);
        assert!(from.position.y > kind.position.y);
        // the name wraps at the item width minus the inset
        assert!(canvas.text("Pump fails").is_none());
        let pump = canvas.text("Pump").unwrap();
        let fails = canvas.text("fails").unwrap();
        assert!(pump.position.y > kind.position.y);
        assert!(fails.position.y > pump.position.y);
        assert!(from.position.y > fails.position.y);
        assert_eq!(kind.position.x, 25.0);
    }

    #[test]
    fn each_item_draws_its_own_glyph() {
        let model = Model::new();
        let properties = ItemProperties::default();
        let ctx = ItemContext {
            model: &model,
            subject: None,
            properties: &properties,
            has_children: false,
        };
        let expected = [BASIC_EVENT, HOUSE_EVENT, ZERO_EVENT, MAJORITY_VOTE_GATE];
        let items: [&dyn PresentationItem; 4] =
            [&BasicEventItem, &HouseEventItem, &ZeroEventItem, &MajorityVoteItem];
        for (item, routine) in items.into_iter().zip(expected) {
            let Shape::IconBox(icon_box) = item.build_shapes(&ctx) else {
                panic!("{} must be an icon box", item.kind_name());
            };
            let Shape::Box(icon) = icon_box.icon.as_ref() else {
                panic!("icon must be a box");
            };
            assert_eq!(icon.draw, Some(routine));
        }
    }
}
