use std::io::Write;

use eframe::egui;

use super::config::Palette;
use super::drawing::{Drawing, Path};
use super::shapes::{FontStyle, FontWeight};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LineType {
    Solid,
    Dashed,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stroke {
    pub width: f32,
    pub color: egui::Color32,
    pub line_type: LineType,
}

impl Stroke {
    pub const NONE: Self = Self {
        width: 0.0,
        color: egui::Color32::TRANSPARENT,
        line_type: LineType::Solid,
    };

    pub fn new_solid(width: f32, color: egui::Color32) -> Self {
        Self {
            width,
            color,
            line_type: LineType::Solid,
        }
    }

    pub fn new_dashed(width: f32, color: egui::Color32) -> Self {
        Self {
            width,
            color,
            line_type: LineType::Dashed,
        }
    }
}

impl From<Stroke> for egui::Stroke {
    fn from(value: Stroke) -> egui::Stroke {
        egui::Stroke {
            width: value.width,
            color: value.color,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Highlight {
    pub selected: bool,
}

impl Highlight {
    pub const NONE: Self = Self { selected: false };
    pub const SELECTED: Self = Self { selected: true };
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextFont {
    pub size: f32,
    pub weight: FontWeight,
    pub style: FontStyle,
}

impl TextFont {
    pub fn plain(size: f32) -> Self {
        Self {
            size,
            weight: FontWeight::Normal,
            style: FontStyle::Normal,
        }
    }
}

/// Rough text extent for canvases without access to font metrics.
pub fn approximate_text_rect(
    position: egui::Pos2,
    anchor: egui::Align2,
    text: &str,
    font_size: f32,
) -> egui::Rect {
    let lines: Vec<&str> = text.split('\n').collect();
    let longest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let size = egui::Vec2::new(
        font_size * longest as f32 / 2.0,
        font_size * lines.len() as f32,
    );
    anchor.anchor_size(position, size)
}

pub trait NHCanvas {
    /// None if not interactive
    fn ui_scale(&self) -> Option<f32>;

    fn draw_line(&mut self, points: [egui::Pos2; 2], stroke: Stroke, highlight: Highlight);
    fn draw_rectangle(
        &mut self,
        rect: egui::Rect,
        color: egui::Color32,
        stroke: Stroke,
        highlight: Highlight,
    );
    /// Closed subpaths are filled with `fill`, every subpath is stroked.
    fn draw_path(&mut self, path: &Path, fill: egui::Color32, stroke: Stroke, highlight: Highlight);

    fn measure_text(
        &mut self,
        position: egui::Pos2,
        anchor: egui::Align2,
        text: &str,
        font_size: f32,
    ) -> egui::Rect;
    fn draw_text(
        &mut self,
        position: egui::Pos2,
        anchor: egui::Align2,
        text: &str,
        font_size: f32,
        text_color: egui::Color32,
    );

    fn draw_styled_text(
        &mut self,
        position: egui::Pos2,
        anchor: egui::Align2,
        text: &str,
        font: TextFont,
        text_color: egui::Color32,
    ) {
        self.draw_text(position, anchor, text, font.size, text_color);
    }

    /// Draws the output of a drawing routine placed at `origin`.
    fn draw_drawing(
        &mut self,
        drawing: &Drawing,
        origin: egui::Pos2,
        palette: &Palette,
        highlight: Highlight,
    ) {
        let fill = if drawing.fill {
            palette.fill
        } else {
            egui::Color32::TRANSPARENT
        };
        let stroke = Stroke::new_solid(1.0, palette.stroke);
        let no_outline = Stroke::new_solid(0.0, egui::Color32::TRANSPARENT);
        for region in &drawing.fills {
            self.draw_path(
                &region.translated(origin.to_vec2()),
                palette.fill,
                no_outline,
                Highlight::NONE,
            );
        }
        for path in &drawing.paths {
            self.draw_path(&path.translated(origin.to_vec2()), fill, stroke, highlight);
        }
        if let Some(text) = &drawing.text {
            self.draw_text(
                origin + text.center.to_vec2(),
                egui::Align2::CENTER_CENTER,
                &text.text,
                text.font_size,
                palette.text,
            );
        }
    }
}

pub struct UiCanvas {
    is_interactive: bool,
    highlight_color: egui::Color32,
    painter: egui::Painter,
    canvas: egui::Rect,
    camera_offset: egui::Pos2,
    camera_scale: f32,
}

impl UiCanvas {
    pub fn new(
        is_interactive: bool,
        painter: egui::Painter,
        canvas: egui::Rect,
        camera_offset: egui::Pos2,
        camera_scale: f32,
    ) -> Self {
        Self {
            is_interactive,
            highlight_color: egui::Color32::BLUE,
            painter,
            canvas,
            camera_offset,
            camera_scale,
        }
    }

    pub fn clear(&self, color: egui::Color32) {
        self.painter.rect(
            self.canvas,
            egui::CornerRadius::ZERO,
            color,
            egui::Stroke::NONE,
            egui::StrokeKind::Middle,
        );
    }

    pub fn draw_gridlines(
        &self,
        vertical: Option<(f32, egui::Color32)>,
        horizontal: Option<(f32, egui::Color32)>,
    ) {
        let canvas_size_scaled = (self.canvas.max - self.canvas.min) / self.camera_scale;

        if let Some((distance_x, color)) = vertical {
            for x in
                (0..((canvas_size_scaled.x / distance_x) as u32 + 2)).map(|e| distance_x * e as f32)
            {
                self.painter.vline(
                    self.canvas.min.x
                        + self.camera_offset.x % (distance_x * self.camera_scale)
                        + x * self.camera_scale,
                    egui::Rangef::new(self.canvas.min.y, self.canvas.max.y),
                    egui::Stroke::new(1.0, color),
                );
            }
        }
        if let Some((distance_y, color)) = horizontal {
            for y in
                (0..((canvas_size_scaled.y / distance_y) as u32 + 2)).map(|e| distance_y * e as f32)
            {
                self.painter.hline(
                    egui::Rangef::new(self.canvas.min.x, self.canvas.max.x),
                    self.canvas.min.y
                        + self.camera_offset.y % (distance_y * self.camera_scale)
                        + y * self.camera_scale,
                    egui::Stroke::new(1.0, color),
                );
            }
        }
    }

    /// Screen position of a diagram position.
    pub fn sc_tr(&self, pos: egui::Pos2) -> egui::Pos2 {
        (pos * self.camera_scale) + self.canvas.min.to_vec2() + self.camera_offset.to_vec2()
    }

    /// Diagram position of a screen position.
    pub fn diagram_pos(&self, screen: egui::Pos2) -> egui::Pos2 {
        ((screen - self.canvas.min.to_vec2() - self.camera_offset.to_vec2()).to_vec2()
            / self.camera_scale)
            .to_pos2()
    }

    fn scaled_stroke(&self, stroke: Stroke) -> egui::Stroke {
        egui::Stroke::new(stroke.width * self.camera_scale.max(0.5), stroke.color)
    }
}

impl NHCanvas for UiCanvas {
    fn ui_scale(&self) -> Option<f32> {
        Some(self.camera_scale).filter(|_| self.is_interactive)
    }

    fn draw_line(&mut self, points: [egui::Pos2; 2], stroke: Stroke, highlight: Highlight) {
        let (p1, p2) = (self.sc_tr(points[0]), self.sc_tr(points[1]));

        if highlight.selected {
            self.painter.line_segment(
                [p1, p2],
                egui::Stroke::new(stroke.width + 1.0, self.highlight_color),
            );
        }

        match stroke.line_type {
            LineType::Solid => {
                self.painter.line_segment([p1, p2], self.scaled_stroke(stroke));
            }
            LineType::Dashed => {
                self.painter.add(eframe::epaint::Shape::dashed_line(
                    &[p1, p2],
                    self.scaled_stroke(stroke),
                    10.0,
                    10.0,
                ));
            }
        }
    }

    fn draw_rectangle(
        &mut self,
        rect: egui::Rect,
        color: egui::Color32,
        stroke: Stroke,
        highlight: Highlight,
    ) {
        let screen_rect = egui::Rect::from_min_max(self.sc_tr(rect.min), self.sc_tr(rect.max));
        self.painter.rect(
            screen_rect,
            egui::CornerRadius::ZERO,
            color,
            self.scaled_stroke(stroke),
            egui::StrokeKind::Middle,
        );
        if highlight.selected {
            self.painter.rect_stroke(
                screen_rect.expand(2.0),
                egui::CornerRadius::ZERO,
                egui::Stroke::new(1.0, self.highlight_color),
                egui::StrokeKind::Outside,
            );
        }
    }

    fn draw_path(&mut self, path: &Path, fill: egui::Color32, stroke: Stroke, highlight: Highlight) {
        let stroke = if highlight.selected {
            egui::Stroke::new(stroke.width + 1.0, self.highlight_color)
        } else {
            self.scaled_stroke(stroke)
        };
        for (points, closed) in path.flatten() {
            let points: Vec<egui::Pos2> = points.into_iter().map(|p| self.sc_tr(p)).collect();
            if closed {
                if fill != egui::Color32::TRANSPARENT {
                    // fan tessellation; glyph outlines are star-shaped around their first vertex
                    self.painter.add(egui::Shape::convex_polygon(
                        points.clone(),
                        fill,
                        egui::Stroke::NONE,
                    ));
                }
                self.painter.add(egui::Shape::closed_line(points, stroke));
            } else {
                self.painter.add(egui::Shape::line(points, stroke));
            }
        }
    }

    fn measure_text(
        &mut self,
        position: egui::Pos2,
        anchor: egui::Align2,
        text: &str,
        font_size: f32,
    ) -> egui::Rect {
        let galley = self.painter.layout_no_wrap(
            text.to_owned(),
            egui::FontId::proportional(font_size),
            egui::Color32::TRANSPARENT,
        );
        anchor.anchor_size(position, galley.size())
    }

    fn draw_text(
        &mut self,
        position: egui::Pos2,
        anchor: egui::Align2,
        text: &str,
        font_size: f32,
        text_color: egui::Color32,
    ) {
        if font_size * self.camera_scale >= 4.0 {
            self.painter.text(
                self.sc_tr(position),
                anchor,
                text,
                egui::FontId::proportional(font_size * self.camera_scale),
                text_color,
            );
        } else {
            // unreadable at this zoom, so draw a placeholder bar instead
            let rect = approximate_text_rect(position, anchor, text, font_size);
            self.draw_rectangle(
                rect,
                text_color.gamma_multiply(0.25),
                Stroke::NONE,
                Highlight::NONE,
            );
        }
    }
}

/// Collects the bounds of everything drawn into it.
pub struct MeasuringCanvas {
    bounds: egui::Rect,
}

impl MeasuringCanvas {
    pub fn new() -> Self {
        Self {
            bounds: egui::Rect::NOTHING,
        }
    }

    pub fn bounds(&self) -> egui::Rect {
        self.bounds
    }
}

impl Default for MeasuringCanvas {
    fn default() -> Self {
        Self::new()
    }
}

impl NHCanvas for MeasuringCanvas {
    fn ui_scale(&self) -> Option<f32> {
        None
    }

    fn draw_line(&mut self, points: [egui::Pos2; 2], _stroke: Stroke, _highlight: Highlight) {
        self.bounds.extend_with(points[0]);
        self.bounds.extend_with(points[1]);
    }

    fn draw_rectangle(
        &mut self,
        rect: egui::Rect,
        _color: egui::Color32,
        _stroke: Stroke,
        _highlight: Highlight,
    ) {
        self.bounds = self.bounds.union(rect);
    }

    fn draw_path(&mut self, path: &Path, _fill: egui::Color32, _stroke: Stroke, _highlight: Highlight) {
        self.bounds = self.bounds.union(path.bounds());
    }

    fn measure_text(
        &mut self,
        position: egui::Pos2,
        anchor: egui::Align2,
        text: &str,
        font_size: f32,
    ) -> egui::Rect {
        approximate_text_rect(position, anchor, text, font_size)
    }

    fn draw_text(
        &mut self,
        position: egui::Pos2,
        anchor: egui::Align2,
        text: &str,
        font_size: f32,
        _text_color: egui::Color32,
    ) {
        let rect = self.measure_text(position, anchor, text, font_size);
        self.bounds = self.bounds.union(rect);
    }
}

fn svg_color(color: egui::Color32) -> String {
    if color == egui::Color32::TRANSPARENT {
        "none".to_owned()
    } else {
        color.to_hex()
    }
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('\'', "&apos;")
        .replace('"', "&quot;")
}

/// Renders into an SVG document, shifting everything by `camera_offset`.
pub struct SVGCanvas {
    camera_offset: egui::Pos2,
    export_size: egui::Vec2,
    element_buffer: Vec<String>,
}

impl SVGCanvas {
    pub fn new(offset: egui::Pos2, size: egui::Vec2) -> Self {
        Self {
            camera_offset: offset,
            export_size: size,
            element_buffer: Vec::new(),
        }
    }

    pub fn to_svg_string(&self) -> String {
        let mut document = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<svg width="{}" height="{}" xmlns="http://www.w3.org/2000/svg">
"#,
            self.export_size.x, self.export_size.y
        );
        for line in &self.element_buffer {
            document.push_str(line);
        }
        document.push_str("</svg>\n");
        document
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(path)?;
        file.write_all(self.to_svg_string().as_bytes())
    }
}

impl NHCanvas for SVGCanvas {
    fn ui_scale(&self) -> Option<f32> {
        None
    }

    fn draw_line(&mut self, points: [egui::Pos2; 2], stroke: Stroke, _highlight: Highlight) {
        let stroke_dasharray = match stroke.line_type {
            LineType::Solid => "none",
            LineType::Dashed => "10,5",
        };

        self.element_buffer.push(format!(
            r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-dasharray="{}"/>
"#,
            points[0].x + self.camera_offset.x,
            points[0].y + self.camera_offset.y,
            points[1].x + self.camera_offset.x,
            points[1].y + self.camera_offset.y,
            svg_color(stroke.color),
            stroke_dasharray
        ));
    }

    fn draw_rectangle(
        &mut self,
        rect: egui::Rect,
        color: egui::Color32,
        stroke: Stroke,
        _highlight: Highlight,
    ) {
        let top_left = rect.left_top();
        self.element_buffer.push(format!(
            r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{}" stroke="{}"/>
"#,
            top_left.x + self.camera_offset.x,
            top_left.y + self.camera_offset.y,
            rect.width(),
            rect.height(),
            svg_color(color),
            svg_color(stroke.color)
        ));
    }

    fn draw_path(&mut self, path: &Path, fill: egui::Color32, stroke: Stroke, _highlight: Highlight) {
        // SVG would fill open subpaths too
        let fill = if path.is_closed() {
            fill
        } else {
            egui::Color32::TRANSPARENT
        };
        self.element_buffer.push(format!(
            r#"<path d="{}" fill="{}" stroke="{}" stroke-width="{}"/>
"#,
            path.svg_data(self.camera_offset.to_vec2()),
            svg_color(fill),
            svg_color(stroke.color),
            stroke.width
        ));
    }

    fn measure_text(
        &mut self,
        position: egui::Pos2,
        anchor: egui::Align2,
        text: &str,
        font_size: f32,
    ) -> egui::Rect {
        approximate_text_rect(position, anchor, text, font_size)
    }

    fn draw_text(
        &mut self,
        position: egui::Pos2,
        anchor: egui::Align2,
        text: &str,
        font_size: f32,
        text_color: egui::Color32,
    ) {
        self.draw_styled_text(position, anchor, text, TextFont::plain(font_size), text_color);
    }

    fn draw_styled_text(
        &mut self,
        position: egui::Pos2,
        anchor: egui::Align2,
        text: &str,
        font: TextFont,
        text_color: egui::Color32,
    ) {
        let rect = approximate_text_rect(position, anchor, text, font.size);
        let font_weight = match font.weight {
            FontWeight::Normal => "normal",
            FontWeight::Bold => "bold",
        };
        let font_style = match font.style {
            FontStyle::Normal => "normal",
            FontStyle::Italic => "italic",
        };

        let lines: Vec<String> = text.split('\n').map(escape_xml).collect();
        let initial_dy = (1.0 - lines.len() as f32) / 2.0;
        let mut tspans = String::new();
        for (idx, line) in lines.iter().enumerate() {
            tspans += &format!(
                r#"<tspan x="{}" dy="{}em">{}</tspan>"#,
                rect.center().x + self.camera_offset.x,
                if idx == 0 { initial_dy } else { 1.0 },
                line
            );
        }
        self.element_buffer.push(format!(
            r#"<text x="{}" y="{}" font-size="{}" font-weight="{}" font-style="{}" fill="{}" text-anchor="middle" dominant-baseline="middle">{}</text>
"#,
            rect.center().x + self.camera_offset.x,
            rect.center().y + self.camera_offset.y,
            font.size,
            font_weight,
            font_style,
            svg_color(text_color),
            tspans
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::drawing::GlyphText;

    fn triangle() -> Path {
        Path::new()
            .move_to(0.0, 10.0)
            .line_to(5.0, 0.0)
            .line_to(10.0, 10.0)
            .close()
    }

    #[test]
    fn measuring_canvas_unions_everything() {
        let mut canvas = MeasuringCanvas::new();
        canvas.draw_path(&triangle(), egui::Color32::WHITE, Stroke::NONE, Highlight::NONE);
        canvas.draw_line(
            [egui::Pos2::new(-5.0, 0.0), egui::Pos2::new(0.0, 0.0)],
            Stroke::NONE,
            Highlight::NONE,
        );
        let b = canvas.bounds();
        assert_eq!(b.min, egui::Pos2::new(-5.0, 0.0));
        assert_eq!(b.max, egui::Pos2::new(10.0, 10.0));
    }

    #[test]
    fn approximate_text_anchors() {
        let r = approximate_text_rect(egui::Pos2::new(10.0, 10.0), egui::Align2::LEFT_TOP, "abcd", 10.0);
        assert_eq!(r.min, egui::Pos2::new(10.0, 10.0));
        assert_eq!(r.size(), egui::Vec2::new(20.0, 10.0));
        let c = approximate_text_rect(egui::Pos2::new(10.0, 10.0), egui::Align2::CENTER_CENTER, "ab\nc", 10.0);
        assert_eq!(c.center(), egui::Pos2::new(10.0, 10.0));
        assert_eq!(c.height(), 20.0);
    }

    #[test]
    fn svg_paths_are_offset_and_filled_only_when_closed() {
        let mut canvas = SVGCanvas::new(egui::Pos2::new(5.0, 5.0), egui::Vec2::new(100.0, 100.0));
        let drawing = Drawing {
            paths: vec![
                triangle(),
                Path::new().move_to(0.0, 0.0).line_to(10.0, 0.0),
            ],
            fill: true,
            fills: Vec::new(),
            text: Some(GlyphText {
                text: "a<b".to_owned(),
                center: egui::Pos2::new(5.0, 5.0),
                font_size: 12.0,
            }),
        };
        canvas.draw_drawing(&drawing, egui::Pos2::ZERO, &Palette::default(), Highlight::NONE);
        let svg = canvas.to_svg_string();

        assert!(svg.starts_with("<?xml"));
        assert!(svg.contains(r#"<svg width="100" height="100""#));
        assert!(svg.contains(&format!(
            r#"<path d="M 5 15 L 10 5 L 15 15 Z" fill="{}""#,
            egui::Color32::WHITE.to_hex()
        )));
        assert!(svg.contains(r#"<path d="M 5 5 L 15 5" fill="none""#));
        assert!(svg.contains("a&lt;b"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn fill_regions_are_drawn_first_without_outline() {
        let mut canvas = SVGCanvas::new(egui::Pos2::ZERO, egui::Vec2::new(100.0, 100.0));
        let drawing = Drawing::stroked(vec![Path::new().move_to(0.0, 0.0).line_to(10.0, 0.0)])
            .with_fills(vec![triangle()]);
        canvas.draw_drawing(&drawing, egui::Pos2::ZERO, &Palette::default(), Highlight::NONE);
        let svg = canvas.to_svg_string();

        let region = svg
            .find(&format!(
                r#"<path d="M 0 10 L 5 0 L 10 10 Z" fill="{}" stroke="none""#,
                egui::Color32::WHITE.to_hex()
            ))
            .unwrap();
        let line = svg.find(r#"<path d="M 0 0 L 10 0" fill="none""#).unwrap();
        assert!(region < line);
    }

    #[test]
    fn svg_styled_text() {
        let mut canvas = SVGCanvas::new(egui::Pos2::ZERO, egui::Vec2::new(10.0, 10.0));
        canvas.draw_styled_text(
            egui::Pos2::ZERO,
            egui::Align2::LEFT_TOP,
            "Name",
            TextFont {
                size: 14.0,
                weight: FontWeight::Bold,
                style: FontStyle::Normal,
            },
            egui::Color32::BLACK,
        );
        assert!(canvas.to_svg_string().contains(r#"font-weight="bold""#));
    }
}
