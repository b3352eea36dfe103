use eframe::egui;

use crate::common::drawing::{Drawing, Path};
use crate::common::shapes::DrawingRoutine;

pub const PACKAGE_TAB_WIDTH: f32 = 50.0;
pub const PACKAGE_TAB_HEIGHT: f32 = 20.0;
pub const NODE_DEPTH: f32 = 10.0;

/// Folder outline: the tab on the top left and the body below it.
pub fn draw_package(size: egui::Vec2) -> Drawing {
    let (w, h) = (size.x, size.y);
    let (x, y) = (PACKAGE_TAB_WIDTH, PACKAGE_TAB_HEIGHT);
    Drawing::filled(vec![Path::new()
        .move_to(x, y)
        .line_to(x, 0.0)
        .line_to(0.0, 0.0)
        .line_to(0.0, h)
        .line_to(w, h)
        .line_to(w, y)
        .line_to(0.0, y)
        .close()])
}

/// Front face and the receding top and side edges, as two polylines over
/// a filled silhouette.
pub fn draw_node(size: egui::Vec2) -> Drawing {
    let (w, h, d) = (size.x, size.y, NODE_DEPTH);
    let front = Path::new()
        .move_to(w + d, -d)
        .line_to(w, 0.0)
        .line_to(0.0, 0.0)
        .line_to(0.0, h)
        .line_to(w, h)
        .line_to(w, 0.0);
    let depth = Path::new()
        .move_to(0.0, 0.0)
        .line_to(d, -d)
        .line_to(w + d, -d)
        .line_to(w + d, h - d)
        .line_to(w, h);
    let silhouette = Path::new()
        .move_to(0.0, 0.0)
        .line_to(d, -d)
        .line_to(w + d, -d)
        .line_to(w + d, h - d)
        .line_to(w, h)
        .line_to(0.0, h)
        .close();
    Drawing::stroked(vec![front, depth]).with_fills(vec![silhouette])
}

/// Association line along the bottom edge.
pub fn draw_association_line(size: egui::Vec2) -> Drawing {
    Drawing::stroked(vec![Path::new().move_to(0.0, size.y).line_to(size.x, size.y)])
}

pub const PACKAGE: DrawingRoutine = DrawingRoutine::new("package", draw_package);
pub const NODE: DrawingRoutine = DrawingRoutine::new("node", draw_node);
pub const ASSOCIATION_LINE: DrawingRoutine =
    DrawingRoutine::new("association-line", draw_association_line);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn package_outline_vertices() {
        let drawing = draw_package(egui::Vec2::new(70.0, 70.0));
        assert!(drawing.fill);
        assert_eq!(drawing.paths.len(), 1);
        let path = &drawing.paths[0];
        assert!(path.is_closed());
        assert_eq!(
            path.vertices(),
            vec![
                egui::Pos2::new(50.0, 20.0),
                egui::Pos2::new(50.0, 0.0),
                egui::Pos2::new(0.0, 0.0),
                egui::Pos2::new(0.0, 70.0),
                egui::Pos2::new(70.0, 70.0),
                egui::Pos2::new(70.0, 20.0),
                egui::Pos2::new(0.0, 20.0),
            ]
        );
    }

    #[test]
    fn node_is_two_open_polylines() {
        let drawing = draw_node(egui::Vec2::new(100.0, 50.0));
        assert_eq!(drawing.paths.len(), 2);
        for path in &drawing.paths {
            assert!(!path.is_closed());
            assert_eq!(path.subpath_count(), 1);
        }
        assert_eq!(drawing.paths[0].vertices().len(), 6);
        assert_eq!(drawing.paths[1].vertices().len(), 5);
        // the depth edges end where the front face is
        assert_eq!(
            drawing.paths[1].vertices().last(),
            Some(&egui::Pos2::new(100.0, 50.0))
        );
        assert_eq!(drawing.paths.iter().map(|p| p.flatten().len()).sum::<usize>(), 2);
    }

    #[test]
    fn node_faces_are_filled() {
        let drawing = draw_node(egui::Vec2::new(100.0, 50.0));
        assert!(!drawing.fill);
        assert_eq!(drawing.fills.len(), 1);
        let silhouette = &drawing.fills[0];
        assert!(silhouette.is_closed());
        let bounds = silhouette.bounds();
        assert_eq!(bounds.min, egui::Pos2::new(0.0, -NODE_DEPTH));
        assert_eq!(bounds.max, egui::Pos2::new(100.0 + NODE_DEPTH, 50.0));
        // the front face lies inside the filled region
        assert!(silhouette.vertices().contains(&egui::Pos2::new(0.0, 50.0)));
    }

    #[test]
    fn node_depth_is_fixed() {
        let small = draw_node(egui::Vec2::new(20.0, 20.0)).paths[1].bounds();
        let large = draw_node(egui::Vec2::new(200.0, 200.0)).paths[1].bounds();
        assert_eq!(small.min.y, -NODE_DEPTH);
        assert_eq!(large.min.y, -NODE_DEPTH);
    }
}
