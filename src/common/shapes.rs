use derive_more::From;
use eframe::egui;

use super::drawing::{Drawing, Path};
use super::recipes::End;
use super::uuid::ModelUuid;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Padding {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Padding {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(top: f32, right: f32, bottom: f32, left: f32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    pub const fn uniform(v: f32) -> Self {
        Self::new(v, v, v, v)
    }

    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f32 {
        self.top + self.bottom
    }

    pub fn shrink(&self, rect: egui::Rect) -> egui::Rect {
        egui::Rect::from_min_max(
            rect.min + egui::Vec2::new(self.left, self.top),
            rect.max - egui::Vec2::new(self.right, self.bottom),
        )
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JustifyContent {
    Start,
    #[default]
    Center,
    End,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VerticalAlign {
    Top,
    #[default]
    Middle,
    Bottom,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum FontSize {
    XSmall,
    Small,
    #[default]
    Medium,
    Large,
    Points(f32),
}

/// Presentation properties of a shape; unset entries take the defaults.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Style {
    pub padding: Option<Padding>,
    pub justify_content: Option<JustifyContent>,
    pub text_align: Option<TextAlign>,
    pub vertical_align: Option<VerticalAlign>,
    pub font_weight: Option<FontWeight>,
    pub font_style: Option<FontStyle>,
    pub font_size: Option<FontSize>,
}

impl Style {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn padding(self, padding: Padding) -> Self {
        Self {
            padding: Some(padding),
            ..self
        }
    }

    pub fn justify(self, justify_content: JustifyContent) -> Self {
        Self {
            justify_content: Some(justify_content),
            ..self
        }
    }

    pub fn text_align(self, text_align: TextAlign) -> Self {
        Self {
            text_align: Some(text_align),
            ..self
        }
    }

    pub fn vertical_align(self, vertical_align: VerticalAlign) -> Self {
        Self {
            vertical_align: Some(vertical_align),
            ..self
        }
    }

    pub fn bold(self) -> Self {
        Self {
            font_weight: Some(FontWeight::Bold),
            ..self
        }
    }

    pub fn italic(self) -> Self {
        Self {
            font_style: Some(FontStyle::Italic),
            ..self
        }
    }

    pub fn font_size(self, font_size: FontSize) -> Self {
        Self {
            font_size: Some(font_size),
            ..self
        }
    }

    pub fn padding_or_zero(&self) -> Padding {
        self.padding.unwrap_or(Padding::ZERO)
    }
}

/// Where the text of a `Text` shape comes from.
///
/// Sources other than `Literal` are resolved against the model whenever the
/// shape is painted, so they follow changes without a rebuild.
#[derive(Clone, Debug, PartialEq)]
pub enum TextSource {
    Literal(String),
    SubjectName,
    /// Applied stereotype names, preceded by the given message ids.
    Stereotypes { extra: Vec<&'static str> },
    /// "(from Package)" when the namespace differs from the context.
    FromPackage,
    /// "[Type: technology]" line of a C4 element.
    C4Technology,
    SubjectDescription,
    /// Port name, with its type when `show_type` is set.
    PortName,
    /// «name» of the stereotypes an instance specification applies.
    StereotypeName(ModelUuid),
    /// `feature = value` of a slot.
    SlotText(ModelUuid),
    AssociationEnd(End),
}

impl TextSource {
    pub fn literal(s: impl Into<String>) -> Self {
        TextSource::Literal(s.into())
    }

    pub fn stereotypes(extra: &[&'static str]) -> Self {
        TextSource::Stereotypes {
            extra: extra.to_vec(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TextShape {
    pub source: TextSource,
    pub style: Style,
    /// Wrap at the item width minus this inset.
    pub width_inset: Option<f32>,
}

impl TextShape {
    pub fn new(source: TextSource) -> Self {
        Self {
            source,
            style: Style::default(),
            width_inset: None,
        }
    }

    pub fn style(self, style: Style) -> Self {
        Self { style, ..self }
    }

    pub fn width_inset(self, inset: f32) -> Self {
        Self {
            width_inset: Some(inset),
            ..self
        }
    }
}

/// Named custom drawing routine: a pure function of the allotted size.
#[derive(Clone, Copy)]
pub struct DrawingRoutine {
    pub name: &'static str,
    draw: fn(egui::Vec2) -> Drawing,
}

impl DrawingRoutine {
    pub const fn new(name: &'static str, draw: fn(egui::Vec2) -> Drawing) -> Self {
        Self { name, draw }
    }

    pub fn draw(&self, size: egui::Vec2) -> Drawing {
        (self.draw)(size)
    }
}

impl PartialEq for DrawingRoutine {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl std::fmt::Debug for DrawingRoutine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DrawingRoutine({})", self.name)
    }
}

pub fn draw_border(size: egui::Vec2) -> Drawing {
    Drawing::filled(vec![Path::new()
        .move_to(0.0, 0.0)
        .line_to(size.x, 0.0)
        .line_to(size.x, size.y)
        .line_to(0.0, size.y)
        .close()])
}

pub fn draw_top_separator(size: egui::Vec2) -> Drawing {
    Drawing::stroked(vec![Path::new().move_to(0.0, 0.0).line_to(size.x, 0.0)])
}

pub const BORDER: DrawingRoutine = DrawingRoutine::new("border", draw_border);
pub const TOP_SEPARATOR: DrawingRoutine = DrawingRoutine::new("top-separator", draw_top_separator);

#[derive(Clone, Debug, PartialEq)]
pub struct BoxShape {
    pub children: Vec<Shape>,
    pub style: Style,
    pub draw: Option<DrawingRoutine>,
}

impl BoxShape {
    pub fn new(children: Vec<Shape>) -> Self {
        Self {
            children,
            style: Style::default(),
            draw: None,
        }
    }

    pub fn style(self, style: Style) -> Self {
        Self { style, ..self }
    }

    pub fn draw(self, routine: DrawingRoutine) -> Self {
        Self {
            draw: Some(routine),
            ..self
        }
    }
}

/// An icon filling the item bounds with labels placed outside of it.
#[derive(Clone, Debug, PartialEq)]
pub struct IconBoxShape {
    pub icon: Box<Shape>,
    pub labels: Vec<Shape>,
    pub style: Style,
}

impl IconBoxShape {
    pub fn new(icon: impl Into<Shape>, labels: Vec<Shape>) -> Self {
        Self {
            icon: Box::new(icon.into()),
            labels,
            style: Style::default(),
        }
    }

    pub fn style(self, style: Style) -> Self {
        Self { style, ..self }
    }
}

/// Node of the immutable shape tree of an item.
#[derive(Clone, Debug, PartialEq, From)]
pub enum Shape {
    Box(BoxShape),
    Text(TextShape),
    IconBox(IconBoxShape),
    Glyph(DrawingRoutine),
}

impl Shape {
    /// Every text source in the tree, depth first.
    pub fn text_sources(&self) -> Vec<&TextSource> {
        let mut sources = Vec::new();
        self.collect_text_sources(&mut sources);
        sources
    }

    fn collect_text_sources<'a>(&'a self, sources: &mut Vec<&'a TextSource>) {
        match self {
            Shape::Box(b) => b.children.iter().for_each(|c| c.collect_text_sources(sources)),
            Shape::Text(t) => sources.push(&t.source),
            Shape::IconBox(i) => {
                i.icon.collect_text_sources(sources);
                i.labels.iter().for_each(|c| c.collect_text_sources(sources));
            }
            Shape::Glyph(_) => {}
        }
    }

    pub fn find_text(&self, source: &TextSource) -> Option<&TextShape> {
        match self {
            Shape::Box(b) => b.children.iter().find_map(|c| c.find_text(source)),
            Shape::Text(t) => Some(t).filter(|t| t.source == *source),
            Shape::IconBox(i) => i
                .icon
                .find_text(source)
                .or_else(|| i.labels.iter().find_map(|c| c.find_text(source))),
            Shape::Glyph(_) => None,
        }
    }
}
