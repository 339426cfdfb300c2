//! Action emission: one pen-up move, then pen-down drags.

use crate::types::{Action, Point, RawAction};

/// Points closer than this to the pen in both axes are skipped.
pub const DUPLICATE_EPSILON: f64 = 1e-4;

/// Convert a sampled curve into actions in source coordinates.
///
/// The first point becomes [`Action::Move`]; every later point that
/// differs from the current pen position by more than
/// [`DUPLICATE_EPSILON`] in either axis becomes [`Action::Drag`].
/// Fewer than two points produce no actions.
#[must_use = "returns the emitted actions"]
pub fn emit(points: &[Point]) -> Vec<RawAction> {
    let [first, rest @ ..] = points else {
        return Vec::new();
    };
    if rest.is_empty() {
        return Vec::new();
    }

    let mut actions = Vec::with_capacity(points.len());
    actions.push(Action::Move(*first));
    let mut pen = *first;
    for &p in rest {
        if (p.x - pen.x).abs() > DUPLICATE_EPSILON || (p.y - pen.y).abs() > DUPLICATE_EPSILON {
            actions.push(Action::Drag(p));
            pen = p;
        }
    }
    actions
}
