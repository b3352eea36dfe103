//! Layout and painting of shape trees.

use eframe::egui;

use super::canvas::{Highlight, NHCanvas, TextFont};
use super::config::{FontSettings, Palette};
use super::controller::ItemProperties;
use super::fluent::Localizer;
use super::model::{Attribute, Model, ModelType, Relation};
use super::recipes;
use super::shapes::{
    BoxShape, FontSize, IconBoxShape, JustifyContent, Shape, Style, TextAlign, TextShape,
    TextSource, VerticalAlign,
};
use super::uuid::ModelUuid;

/// What lazy text is resolved against.
pub struct TextContext<'a> {
    pub model: &'a Model,
    pub localizer: &'a Localizer,
    pub diagram_owner: Option<ModelUuid>,
    pub subject: Option<ModelUuid>,
    pub parent_subject: Option<ModelUuid>,
    pub properties: &'a ItemProperties,
    pub item_width: f32,
}

fn c4_type_str(model: &Model, localizer: &Localizer, subject: ModelUuid) -> String {
    let default_type = if model.is_a(subject, ModelType::C4Database) {
        "Database"
    } else {
        "Container"
    };
    let c4_type = model
        .text(subject, Attribute::C4Type)
        .filter(|t| !t.is_empty())
        .unwrap_or(default_type);
    localizer.gettext_or(&format!("c4-type-{}", c4_type.to_lowercase()), c4_type)
}

impl TextSource {
    /// Current text; the empty string when the subject or attribute is absent.
    pub fn resolve(&self, ctx: &TextContext) -> String {
        let model = ctx.model;
        match self {
            TextSource::Literal(s) => s.clone(),
            TextSource::SubjectName => ctx
                .subject
                .map(|s| model.name(s).to_owned())
                .unwrap_or_default(),
            TextSource::Stereotypes { extra } => {
                let extra: Vec<String> = extra.iter().map(|id| ctx.localizer.gettext(id)).collect();
                recipes::stereotypes_str(model, ctx.subject, &extra)
            }
            TextSource::FromPackage => recipes::from_package_str(
                model,
                ctx.localizer,
                ctx.subject,
                ctx.parent_subject,
                ctx.diagram_owner,
            ),
            TextSource::C4Technology => {
                let Some(subject) = ctx.subject else {
                    return String::new();
                };
                let c4_type = c4_type_str(model, ctx.localizer, subject);
                match model.text(subject, Attribute::Technology).filter(|t| !t.is_empty()) {
                    Some(technology) => format!("[{}: {}]", c4_type, technology),
                    None => format!("[{}]", c4_type),
                }
            }
            TextSource::SubjectDescription => ctx
                .subject
                .and_then(|s| model.text(s, Attribute::Description))
                .unwrap_or("")
                .to_owned(),
            TextSource::PortName => {
                let Some(subject) = ctx.subject else {
                    return String::new();
                };
                let name = model.name(subject);
                match model.first_related(subject, Relation::Type) {
                    Some(ty) if ctx.properties.show_type => format!("{}: {}", name, model.name(ty)),
                    _ => name.to_owned(),
                }
            }
            TextSource::StereotypeName(instance) => {
                let names: Vec<&str> = model
                    .related(*instance, Relation::Classifier)
                    .iter()
                    .map(|c| model.name(*c))
                    .filter(|n| !n.is_empty())
                    .collect();
                if names.is_empty() {
                    String::new()
                } else {
                    format!("«{}»", names.join(", "))
                }
            }
            TextSource::SlotText(slot) => {
                if model.contains(*slot) {
                    recipes::slot_str(model, *slot)
                } else {
                    String::new()
                }
            }
            TextSource::AssociationEnd(end) => ctx
                .subject
                .and_then(|a| recipes::association_end(model, a, *end, ctx.properties.inverted))
                .map(|p| recipes::format_property(model, p))
                .unwrap_or_default(),
        }
    }
}

pub struct RenderContext<'a> {
    pub text: TextContext<'a>,
    pub fonts: &'a FontSettings,
    pub palette: Palette,
    pub highlight: Highlight,
}

fn font_of(style: &Style, fonts: &FontSettings) -> TextFont {
    TextFont {
        size: fonts.size_of(style.font_size.unwrap_or(FontSize::Medium)),
        weight: style.font_weight.unwrap_or_default(),
        style: style.font_style.unwrap_or_default(),
    }
}

/// Splits `text` into lines, wrapping words at `max_width` when given.
pub fn wrap_lines(
    canvas: &mut dyn NHCanvas,
    text: &str,
    font_size: f32,
    max_width: Option<f32>,
) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let Some(max_width) = max_width else {
            lines.push(paragraph.to_owned());
            continue;
        };
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_owned()
            } else {
                format!("{} {}", current, word)
            };
            let width = canvas
                .measure_text(egui::Pos2::ZERO, egui::Align2::LEFT_TOP, &candidate, font_size)
                .width();
            if width > max_width && !current.is_empty() {
                lines.push(std::mem::replace(&mut current, word.to_owned()));
            } else {
                current = candidate;
            }
        }
        lines.push(current);
    }
    lines
}

fn text_lines(
    shape: &TextShape,
    canvas: &mut dyn NHCanvas,
    ctx: &RenderContext,
) -> (Vec<String>, TextFont) {
    let font = font_of(&shape.style, ctx.fonts);
    let text = shape.source.resolve(&ctx.text);
    if text.is_empty() {
        return (Vec::new(), font);
    }
    let max_width = shape
        .width_inset
        .map(|inset| (ctx.text.item_width - inset).max(1.0));
    (wrap_lines(canvas, &text, font.size, max_width), font)
}

/// Natural size of a shape; empty text takes no space.
pub fn measure(shape: &Shape, canvas: &mut dyn NHCanvas, ctx: &RenderContext) -> egui::Vec2 {
    match shape {
        Shape::Box(b) => {
            let padding = b.style.padding_or_zero();
            let mut size = egui::Vec2::ZERO;
            for child in &b.children {
                let child_size = measure(child, canvas, ctx);
                size.x = size.x.max(child_size.x);
                size.y += child_size.y;
            }
            size + egui::Vec2::new(padding.horizontal(), padding.vertical())
        }
        Shape::Text(t) => {
            let (lines, font) = text_lines(t, canvas, ctx);
            if lines.is_empty() {
                return egui::Vec2::ZERO;
            }
            let padding = t.style.padding_or_zero();
            let width = lines
                .iter()
                .map(|l| {
                    canvas
                        .measure_text(egui::Pos2::ZERO, egui::Align2::LEFT_TOP, l, font.size)
                        .width()
                })
                .fold(0.0, f32::max);
            egui::Vec2::new(
                width + padding.horizontal(),
                lines.len() as f32 * font.size * ctx.fonts.line_height + padding.vertical(),
            )
        }
        // labels sit outside of the icon, which takes whatever it is given
        Shape::IconBox(i) => measure(&i.icon, canvas, ctx),
        Shape::Glyph(_) => egui::Vec2::ZERO,
    }
}

fn draw_box(b: &BoxShape, canvas: &mut dyn NHCanvas, ctx: &RenderContext, bounds: egui::Rect) {
    if let Some(routine) = &b.draw {
        canvas.draw_drawing(&routine.draw(bounds.size()), bounds.min, &ctx.palette, ctx.highlight);
    }
    let content = b.style.padding_or_zero().shrink(bounds);
    let heights: Vec<f32> = b
        .children
        .iter()
        .map(|c| measure(c, canvas, ctx).y)
        .collect();
    let total: f32 = heights.iter().sum();
    let mut y = match b.style.justify_content.unwrap_or_default() {
        JustifyContent::Start => content.top(),
        JustifyContent::Center => content.center().y - total / 2.0,
        JustifyContent::End => content.bottom() - total,
    };
    for (child, height) in b.children.iter().zip(heights) {
        let rect = egui::Rect::from_min_size(
            egui::Pos2::new(content.left(), y),
            egui::Vec2::new(content.width(), height),
        );
        draw_shape(child, canvas, ctx, rect);
        y += height;
    }
}

fn draw_text(t: &TextShape, canvas: &mut dyn NHCanvas, ctx: &RenderContext, bounds: egui::Rect) {
    let (lines, font) = text_lines(t, canvas, ctx);
    let content = t.style.padding_or_zero().shrink(bounds);
    let line_height = font.size * ctx.fonts.line_height;
    let (x, anchor) = match t.style.text_align.unwrap_or_default() {
        TextAlign::Left => (content.left(), egui::Align2::LEFT_TOP),
        TextAlign::Center => (content.center().x, egui::Align2::CENTER_TOP),
        TextAlign::Right => (content.right(), egui::Align2::RIGHT_TOP),
    };
    for (idx, line) in lines.iter().enumerate() {
        let position = egui::Pos2::new(x, content.top() + idx as f32 * line_height);
        canvas.draw_styled_text(position, anchor, line, font, ctx.palette.text);
    }
}

fn draw_icon_box(i: &IconBoxShape, canvas: &mut dyn NHCanvas, ctx: &RenderContext, bounds: egui::Rect) {
    draw_shape(&i.icon, canvas, ctx, bounds);

    let sizes: Vec<egui::Vec2> = i.labels.iter().map(|l| measure(l, canvas, ctx)).collect();
    let total: f32 = sizes.iter().map(|s| s.y).sum();
    let mut y = match i.style.vertical_align.unwrap_or(VerticalAlign::Bottom) {
        VerticalAlign::Top => bounds.top() - total,
        VerticalAlign::Middle => bounds.center().y - total / 2.0,
        VerticalAlign::Bottom => bounds.bottom(),
    };
    for (label, size) in i.labels.iter().zip(sizes) {
        let x = match i.style.text_align.unwrap_or_default() {
            TextAlign::Left => bounds.left() - size.x,
            TextAlign::Center => bounds.center().x - size.x / 2.0,
            TextAlign::Right => bounds.right(),
        };
        draw_shape(label, canvas, ctx, egui::Rect::from_min_size(egui::Pos2::new(x, y), size));
        y += size.y;
    }
}

/// Paints `shape` into `bounds`, invoking drawing routines with the allotted size.
pub fn draw_shape(shape: &Shape, canvas: &mut dyn NHCanvas, ctx: &RenderContext, bounds: egui::Rect) {
    match shape {
        Shape::Box(b) => draw_box(b, canvas, ctx, bounds),
        Shape::Text(t) => draw_text(t, canvas, ctx, bounds),
        Shape::IconBox(i) => draw_icon_box(i, canvas, ctx, bounds),
        Shape::Glyph(routine) => canvas.draw_drawing(
            &routine.draw(bounds.size()),
            bounds.min,
            &ctx.palette,
            ctx.highlight,
        ),
    }
}
