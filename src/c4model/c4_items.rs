use eframe::egui;

use crate::common::controller::{ItemContext, PresentationItem};
use crate::common::model::{Attribute, ModelType};
use crate::common::observer::{ItemFeature, Watch, WatchPath};
use crate::common::shapes::{
    BoxShape, FontSize, JustifyContent, Padding, Shape, Style, TextAlign, TextShape, TextSource,
    BORDER,
};

/// Container or database box of a C4 container diagram.
///
/// Once other items are placed inside, the texts move to the top left and
/// the description is left out to make room for them.
pub struct C4ContainerItem;

impl PresentationItem for C4ContainerItem {
    fn kind_name(&self) -> &'static str {
        "C4ContainerItem"
    }

    fn default_size(&self) -> egui::Vec2 {
        egui::Vec2::new(100.0, 50.0)
    }

    fn watches(&self) -> Vec<Watch> {
        let container = || WatchPath::subject_as(ModelType::C4Container);
        vec![
            Watch::repaint(WatchPath::subject_as(ModelType::NamedElement).then(Attribute::Name)),
            Watch::repaint(container().then(Attribute::Technology)),
            Watch::repaint(container().then(Attribute::Description)),
            Watch::repaint(container().then(Attribute::C4Type)),
            Watch::rebuild(WatchPath::item(ItemFeature::Children)),
        ]
    }

    fn build_shapes(&self, context: &ItemContext) -> Shape {
        let (text_align, justify) = if context.has_children {
            (TextAlign::Left, JustifyContent::Start)
        } else {
            (TextAlign::Center, JustifyContent::Center)
        };

        let mut children: Vec<Shape> = vec![
            TextShape::new(TextSource::SubjectName)
                .style(Style::new().bold().text_align(text_align))
                .into(),
            TextShape::new(TextSource::C4Technology)
                .style(Style::new().font_size(FontSize::XSmall).text_align(text_align))
                .into(),
        ];
        if !context.has_children {
            children.push(
                TextShape::new(TextSource::SubjectDescription)
                    .style(
                        Style::new()
                            .padding(Padding::new(4.0, 0.0, 0.0, 0.0))
                            .text_align(text_align),
                    )
                    .width_inset(8.0)
                    .into(),
            );
        }

        BoxShape::new(children)
            .style(Style::new().padding(Padding::uniform(4.0)).justify(justify))
            .draw(BORDER)
            .into()
    }
}
