use std::f32::consts::PI;

use eframe::egui;

use crate::common::drawing::{Drawing, GlyphText, Path};
use crate::common::shapes::DrawingRoutine;

pub const DEFAULT_FTA_MAJOR: f32 = 50.0;
pub const DEFAULT_FTA_MINOR: f32 = 30.0;
pub const MAJORITY_VOTE_DEFAULT_WIDTH: f32 = 40.0;

pub fn draw_basic_event(size: egui::Vec2) -> Drawing {
    let radius = size / 2.0;
    Drawing::filled(vec![Path::new()
        .arc(radius.to_pos2(), radius, 0.0, 2.0 * PI)
        .close()])
}

fn house_outline(size: egui::Vec2) -> Path {
    let (w, h) = (size.x, size.y);
    let wall_top = h / 3.0;
    Path::new()
        .move_to(0.0, h)
        .line_to(0.0, wall_top)
        .line_to(w / 2.0, 0.0)
        .line_to(w, wall_top)
        .line_to(w, h)
        .close()
}

pub fn draw_house_event(size: egui::Vec2) -> Drawing {
    Drawing::filled(vec![house_outline(size)])
}

/// House with a diagonal from the top of the left wall to the bottom right.
pub fn draw_zero_event(size: egui::Vec2) -> Drawing {
    let diagonal = Path::new().move_to(0.0, size.y / 3.0).line_to(size.x, size.y);
    Drawing::filled(vec![house_outline(size), diagonal])
}

/// Font size of the "m" inside a majority vote gate of `size`.
pub fn majority_vote_font_size(size: egui::Vec2) -> f32 {
    let (w, h) = (size.x, size.y);
    if h > 3.0 * w {
        32.0 * w / MAJORITY_VOTE_DEFAULT_WIDTH
    } else if w > 3.0 * h {
        40.0 * h / DEFAULT_FTA_MAJOR
    } else {
        17.0 * (w + h) / (DEFAULT_FTA_MINOR + DEFAULT_FTA_MAJOR)
    }
}

pub fn draw_majority_vote_gate(size: egui::Vec2) -> Drawing {
    let (w, h) = (size.x, size.y);
    let wall_top = h / 3.0;

    let left_wall = Path::new().move_to(0.0, h).line_to(0.0, wall_top);
    let right_wall = Path::new().move_to(w, h).line_to(w, wall_top);
    let top_arc = Path::new().arc(
        egui::Pos2::new(w / 2.0, wall_top),
        egui::Vec2::new(w / 2.0, h / 3.0),
        PI,
        2.0 * PI,
    );
    let bottom_arc = Path::new().arc(
        egui::Pos2::new(w / 2.0, h),
        egui::Vec2::new(w / 2.0, h / 8.0),
        PI,
        2.0 * PI,
    );
    // the arcs close over their chords when filled
    let fills = vec![top_arc.clone().close(), bottom_arc.clone().close()];

    Drawing {
        paths: vec![left_wall, right_wall, top_arc, bottom_arc],
        fill: false,
        fills,
        text: Some(GlyphText {
            text: "m".to_owned(),
            center: egui::Pos2::new(w / 2.0, h / 2.0),
            font_size: majority_vote_font_size(size),
        }),
    }
}

pub const BASIC_EVENT: DrawingRoutine = DrawingRoutine::new("basic-event", draw_basic_event);
pub const HOUSE_EVENT: DrawingRoutine = DrawingRoutine::new("house-event", draw_house_event);
pub const ZERO_EVENT: DrawingRoutine = DrawingRoutine::new("zero-event", draw_zero_event);
pub const MAJORITY_VOTE_GATE: DrawingRoutine =
    DrawingRoutine::new("majority-vote-gate", draw_majority_vote_gate);


#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;
    use crate::common::drawing::drawings_approx_eq;

    fn size_strategy() -> impl Strategy<Value = egui::Vec2> {
        (1.0f32..500.0, 1.0f32..500.0).prop_map(|(w, h)| egui::Vec2::new(w, h))
    }

    fn check_homogeneous(routine: DrawingRoutine, size: egui::Vec2, k: f32) -> Result<(), TestCaseError> {
        let scaled = routine.draw(size * k);
        let expected = routine.draw(size).scaled(k);
        prop_assert!(
            drawings_approx_eq(&scaled, &expected),
            "{:?} at {:?} scaled by {}",
            routine,
            size,
            k
        );
        Ok(())
    }

    proptest! {
        #[test]
        fn fta_glyphs_scale_homogeneously(size in size_strategy(), k in 0.1f32..10.0) {
            for routine in [BASIC_EVENT, HOUSE_EVENT, ZERO_EVENT, MAJORITY_VOTE_GATE] {
                check_homogeneous(routine, size, k)?;
            }
        }
    }
}
