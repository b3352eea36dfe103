use eframe::egui;

/// Full turns are flattened into this many segments.
const ARC_SEGMENTS_PER_TURN: f32 = 48.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PathSegment {
    MoveTo(egui::Pos2),
    LineTo(egui::Pos2),
    /// Elliptical arc with increasing angle from `start_angle` to `end_angle`.
    /// In y-down coordinates increasing angles run clockwise.
    Arc {
        center: egui::Pos2,
        radius: egui::Vec2,
        start_angle: f32,
        end_angle: f32,
    },
    Close,
}

pub fn arc_point(center: egui::Pos2, radius: egui::Vec2, angle: f32) -> egui::Pos2 {
    center + egui::Vec2::new(radius.x * angle.cos(), radius.y * angle.sin())
}

/// A vector path in the local coordinates of a glyph.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Path {
    segments: Vec<PathSegment>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn move_to(mut self, x: f32, y: f32) -> Self {
        self.segments.push(PathSegment::MoveTo(egui::Pos2::new(x, y)));
        self
    }

    pub fn line_to(mut self, x: f32, y: f32) -> Self {
        self.segments.push(PathSegment::LineTo(egui::Pos2::new(x, y)));
        self
    }

    pub fn arc(mut self, center: egui::Pos2, radius: egui::Vec2, start_angle: f32, end_angle: f32) -> Self {
        self.segments.push(PathSegment::Arc {
            center,
            radius,
            start_angle,
            end_angle,
        });
        self
    }

    pub fn close(mut self) -> Self {
        self.segments.push(PathSegment::Close);
        self
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Points placed by `move_to` and `line_to`, in order.
    pub fn vertices(&self) -> Vec<egui::Pos2> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                PathSegment::MoveTo(p) | PathSegment::LineTo(p) => Some(*p),
                _ => None,
            })
            .collect()
    }

    /// Number of separate subpaths (each `move_to` starts one).
    pub fn subpath_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, PathSegment::MoveTo(_)))
            .count()
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.segments.last(), Some(PathSegment::Close))
    }

    pub fn transformed(&self, f: impl Fn(egui::Pos2) -> egui::Pos2, scale: f32) -> Self {
        let segments = self
            .segments
            .iter()
            .map(|s| match *s {
                PathSegment::MoveTo(p) => PathSegment::MoveTo(f(p)),
                PathSegment::LineTo(p) => PathSegment::LineTo(f(p)),
                PathSegment::Arc {
                    center,
                    radius,
                    start_angle,
                    end_angle,
                } => PathSegment::Arc {
                    center: f(center),
                    radius: radius * scale,
                    start_angle,
                    end_angle,
                },
                PathSegment::Close => PathSegment::Close,
            })
            .collect();
        Self { segments }
    }

    pub fn scaled(&self, factor: f32) -> Self {
        self.transformed(|p| (p.to_vec2() * factor).to_pos2(), factor)
    }

    pub fn translated(&self, delta: egui::Vec2) -> Self {
        self.transformed(|p| p + delta, 1.0)
    }

    /// Polylines approximating the path, each with its closed flag.
    pub fn flatten(&self) -> Vec<(Vec<egui::Pos2>, bool)> {
        let mut polylines = Vec::new();
        let mut current: Vec<egui::Pos2> = Vec::new();

        fn finish(polylines: &mut Vec<(Vec<egui::Pos2>, bool)>, current: &mut Vec<egui::Pos2>, closed: bool) {
            if current.len() >= 2 {
                polylines.push((std::mem::take(current), closed));
            } else {
                current.clear();
            }
        }

        for segment in &self.segments {
            match *segment {
                PathSegment::MoveTo(p) => {
                    finish(&mut polylines, &mut current, false);
                    current.push(p);
                }
                PathSegment::LineTo(p) => current.push(p),
                PathSegment::Arc {
                    center,
                    radius,
                    start_angle,
                    end_angle,
                } => {
                    let sweep = end_angle - start_angle;
                    let steps = ((sweep.abs() / std::f32::consts::TAU) * ARC_SEGMENTS_PER_TURN)
                        .ceil()
                        .max(1.0) as usize;
                    for i in 0..=steps {
                        let angle = start_angle + sweep * i as f32 / steps as f32;
                        let p = arc_point(center, radius, angle);
                        if current.last() != Some(&p) {
                            current.push(p);
                        }
                    }
                }
                PathSegment::Close => {
                    let start = current.first().copied();
                    finish(&mut polylines, &mut current, true);
                    // drawing continues from the start of the closed subpath
                    current.extend(start);
                }
            }
        }
        finish(&mut polylines, &mut current, false);
        polylines
    }

    pub fn bounds(&self) -> egui::Rect {
        let mut rect = egui::Rect::NOTHING;
        for (points, _) in self.flatten() {
            for p in points {
                rect.extend_with(p);
            }
        }
        rect
    }

    /// SVG path data, with every point shifted by `offset`.
    pub fn svg_data(&self, offset: egui::Vec2) -> String {
        let mut data = Vec::new();
        let mut current: Option<egui::Pos2> = None;
        let mut subpath_start: Option<egui::Pos2> = None;

        for segment in &self.segments {
            match *segment {
                PathSegment::MoveTo(p) => {
                    let q = p + offset;
                    data.push(format!("M {} {}", q.x, q.y));
                    current = Some(p);
                    subpath_start = Some(p);
                }
                PathSegment::LineTo(p) => {
                    let q = p + offset;
                    data.push(format!("L {} {}", q.x, q.y));
                    current = Some(p);
                }
                PathSegment::Arc {
                    center,
                    radius,
                    start_angle,
                    end_angle,
                } => {
                    let start = arc_point(center, radius, start_angle);
                    let q = start + offset;
                    match current {
                        None => {
                            data.push(format!("M {} {}", q.x, q.y));
                            subpath_start = Some(start);
                        }
                        Some(c) if c.distance(start) > 1e-3 => {
                            data.push(format!("L {} {}", q.x, q.y))
                        }
                        Some(_) => {}
                    }
                    // SVG arcs cannot describe a full turn, so split into half turns at most
                    let sweep = end_angle - start_angle;
                    let pieces = (sweep.abs() / std::f32::consts::PI).ceil().max(1.0) as usize;
                    let sweep_flag = if sweep > 0.0 { 1 } else { 0 };
                    for i in 1..=pieces {
                        let angle = start_angle + sweep * i as f32 / pieces as f32;
                        let q = arc_point(center, radius, angle) + offset;
                        data.push(format!(
                            "A {} {} 0 0 {} {} {}",
                            radius.x, radius.y, sweep_flag, q.x, q.y
                        ));
                    }
                    current = Some(arc_point(center, radius, end_angle));
                }
                PathSegment::Close => {
                    data.push("Z".to_owned());
                    current = subpath_start;
                }
            }
        }
        data.join(" ")
    }
}

/// Text that is part of a glyph itself, centred on `center`.
#[derive(Clone, Debug, PartialEq)]
pub struct GlyphText {
    pub text: String,
    pub center: egui::Pos2,
    pub font_size: f32,
}

/// The output of a drawing routine.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Drawing {
    pub paths: Vec<Path>,
    /// Closed paths are filled.
    pub fill: bool,
    /// Regions filled beneath `paths` without an outline of their own.
    pub fills: Vec<Path>,
    pub text: Option<GlyphText>,
}

impl Drawing {
    pub fn stroked(paths: Vec<Path>) -> Self {
        Self {
            paths,
            ..Self::default()
        }
    }

    pub fn filled(paths: Vec<Path>) -> Self {
        Self {
            paths,
            fill: true,
            ..Self::default()
        }
    }

    pub fn with_fills(mut self, fills: Vec<Path>) -> Self {
        self.fills = fills;
        self
    }

    pub fn scaled(&self, factor: f32) -> Self {
        Self {
            paths: self.paths.iter().map(|p| p.scaled(factor)).collect(),
            fill: self.fill,
            fills: self.fills.iter().map(|p| p.scaled(factor)).collect(),
            text: self.text.as_ref().map(|t| GlyphText {
                text: t.text.clone(),
                center: (t.center.to_vec2() * factor).to_pos2(),
                font_size: t.font_size * factor,
            }),
        }
    }

    pub fn translated(&self, delta: egui::Vec2) -> Self {
        Self {
            paths: self.paths.iter().map(|p| p.translated(delta)).collect(),
            fill: self.fill,
            fills: self.fills.iter().map(|p| p.translated(delta)).collect(),
            text: self.text.as_ref().map(|t| GlyphText {
                text: t.text.clone(),
                center: t.center + delta,
                font_size: t.font_size,
            }),
        }
    }
}

/// Segment-wise comparison with a tolerance relative to the coordinates.
#[cfg(test)]
pub(crate) fn drawings_approx_eq(a: &Drawing, b: &Drawing) -> bool {
    use float_cmp::approx_eq;

    fn close(x: f32, y: f32) -> bool {
        approx_eq!(f32, x, y, epsilon = 1e-3 * x.abs().max(y.abs()).max(1.0))
    }
    fn points_close(p: egui::Pos2, q: egui::Pos2) -> bool {
        close(p.x, q.x) && close(p.y, q.y)
    }

    fn paths_close(a: &[Path], b: &[Path]) -> bool {
        a.len() == b.len()
            && a.iter().zip(b).all(|(p, q)| {
                p.segments().len() == q.segments().len()
                    && p.segments().iter().zip(q.segments()).all(|(s, t)| match (s, t) {
                        (PathSegment::MoveTo(p), PathSegment::MoveTo(q))
                        | (PathSegment::LineTo(p), PathSegment::LineTo(q)) => points_close(*p, *q),
                        (
                            PathSegment::Arc {
                                center: c1,
                                radius: r1,
                                start_angle: s1,
                                end_angle: e1,
                            },
                            PathSegment::Arc {
                                center: c2,
                                radius: r2,
                                start_angle: s2,
                                end_angle: e2,
                            },
                        ) => {
                            points_close(*c1, *c2)
                                && points_close(r1.to_pos2(), r2.to_pos2())
                                && close(*s1, *s2)
                                && close(*e1, *e2)
                        }
                        (PathSegment::Close, PathSegment::Close) => true,
                        _ => false,
                    })
            })
    }

    let text_matches = match (&a.text, &b.text) {
        (None, None) => true,
        (Some(t), Some(u)) => {
            t.text == u.text && points_close(t.center, u.center) && close(t.font_size, u.font_size)
        }
        _ => false,
    };
    paths_close(&a.paths, &b.paths)
        && paths_close(&a.fills, &b.fills)
        && text_matches
        && a.fill == b.fill
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;
    use std::f32::consts::PI;

    fn square() -> Path {
        Path::new()
            .move_to(0.0, 0.0)
            .line_to(10.0, 0.0)
            .line_to(10.0, 10.0)
            .line_to(0.0, 10.0)
            .close()
    }

    #[test]
    fn vertices_and_closing() {
        let p = square();
        assert_eq!(p.vertices().len(), 4);
        assert!(p.is_closed());
        assert_eq!(p.subpath_count(), 1);
        assert!(!Path::new().move_to(0.0, 0.0).line_to(1.0, 1.0).is_closed());
    }

    #[test]
    fn flatten_splits_subpaths() {
        let p = Path::new()
            .move_to(0.0, 0.0)
            .line_to(1.0, 0.0)
            .move_to(5.0, 5.0)
            .line_to(6.0, 6.0)
            .line_to(7.0, 5.0);
        let polylines = p.flatten();
        assert_eq!(polylines.len(), 2);
        assert_eq!(polylines[0].0.len(), 2);
        assert_eq!(polylines[1].0.len(), 3);
        assert!(polylines.iter().all(|(_, closed)| !closed));
    }

    #[test]
    fn half_arc_ends_opposite() {
        let p = Path::new().arc(egui::Pos2::new(10.0, 10.0), egui::Vec2::new(10.0, 5.0), PI, 2.0 * PI);
        let (points, closed) = &p.flatten()[0];
        assert!(!closed);
        let first = points.first().unwrap();
        let last = points.last().unwrap();
        assert_approx_eq!(f32, first.x, 0.0, epsilon = 1e-4);
        assert_approx_eq!(f32, last.x, 20.0, epsilon = 1e-4);
        // the arc bulges upwards in y-down coordinates
        let top = points.iter().map(|p| p.y).fold(f32::INFINITY, f32::min);
        assert_approx_eq!(f32, top, 5.0, epsilon = 1e-3);
    }

    #[test]
    fn bounds_cover_arc() {
        let p = Path::new()
            .arc(egui::Pos2::new(5.0, 5.0), egui::Vec2::new(5.0, 5.0), 0.0, 2.0 * PI)
            .close();
        let b = p.bounds();
        assert_approx_eq!(f32, b.min.x, 0.0, epsilon = 1e-3);
        assert_approx_eq!(f32, b.max.y, 10.0, epsilon = 1e-3);
    }

    #[test]
    fn svg_data_for_lines() {
        assert_eq!(
            square().svg_data(egui::Vec2::new(1.0, 2.0)),
            "M 1 2 L 11 2 L 11 12 L 1 12 Z"
        );
    }

    #[test]
    fn svg_full_ellipse_is_split() {
        let p = Path::new()
            .arc(egui::Pos2::new(5.0, 5.0), egui::Vec2::new(5.0, 3.0), 0.0, 2.0 * PI)
            .close();
        let data = p.svg_data(egui::Vec2::ZERO);
        assert!(data.starts_with("M 10 5"));
        assert_eq!(data.matches(" A ").count() + data.starts_with("A ") as usize, 2);
        assert!(data.ends_with('Z'));
    }

    #[test]
    fn translate_and_scale() {
        let d = Drawing::filled(vec![square()]);
        let moved = d.translated(egui::Vec2::new(5.0, 5.0));
        assert_eq!(moved.paths[0].vertices()[0], egui::Pos2::new(5.0, 5.0));
        let big = d.scaled(2.0);
        assert_eq!(big.paths[0].vertices()[2], egui::Pos2::new(20.0, 20.0));
        assert!(big.fill);
    }
}
