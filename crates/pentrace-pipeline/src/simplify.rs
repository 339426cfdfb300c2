//! Outline simplification using the Ramer-Douglas-Peucker algorithm.
//!
//! Traced outlines follow the pixel grid, so straight edges arrive as
//! long runs of collinear points and diagonals as staircases. RDP
//! removes vertices within a tolerance of the line between their
//! neighbors before the vectorizer decides corners and curves.

use crate::types::Point;

/// Simplify an open polyline.
///
/// Points within `tolerance` pixels of the line between the retained
/// endpoints are removed. A tolerance of 0.0 only removes exactly
/// collinear points. Polylines with fewer than 3 points are returned
/// unchanged.
#[must_use = "returns the simplified points"]
pub fn simplify(points: &[Point], tolerance: f64) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let mut kept = vec![false; points.len()];
    kept[0] = true;
    kept[points.len() - 1] = true;

    rdp_recurse(points, 0, points.len() - 1, tolerance, &mut kept);

    points
        .iter()
        .zip(&kept)
        .filter(|&(_, k)| *k)
        .map(|(&p, _)| p)
        .collect()
}

/// Simplify a closed outline given without a repeated closing point.
///
/// The ring is split at its first point and at the point farthest from
/// it; each half is simplified as an open polyline so both anchors
/// survive. Rings with fewer than 4 points are returned unchanged.
#[must_use = "returns the simplified ring"]
pub fn simplify_closed(ring: &[Point], tolerance: f64) -> Vec<Point> {
    if ring.len() < 4 {
        return ring.to_vec();
    }

    let anchor = ring[0];
    let (far, _) = ring
        .iter()
        .enumerate()
        .skip(1)
        .fold((1, 0.0), |(best, best_d), (i, p)| {
            let d = p.distance_squared(anchor);
            if d > best_d { (i, d) } else { (best, best_d) }
        });

    let first_half = simplify(&ring[..=far], tolerance);
    let mut second: Vec<Point> = ring[far..].to_vec();
    second.push(anchor);
    let second_half = simplify(&second, tolerance);

    // Drop the duplicated `far` joint and the closing anchor.
    let mut out = first_half;
    out.extend_from_slice(&second_half[1..second_half.len() - 1]);
    out
}

/// Recursive step of the Ramer-Douglas-Peucker algorithm.
///
/// Finds the point between `start` and `end` that is farthest from the
/// line segment between them. If that distance exceeds `tolerance`, the
/// point is kept and both sub-segments are processed recursively.
fn rdp_recurse(points: &[Point], start: usize, end: usize, tolerance: f64, kept: &mut [bool]) {
    if end <= start + 1 {
        return;
    }

    let mut max_dist = 0.0;
    let mut max_idx = start;

    for i in (start + 1)..end {
        let d = perpendicular_distance(points[i], points[start], points[end]);
        if d > max_dist {
            max_dist = d;
            max_idx = i;
        }
    }

    if max_dist > tolerance {
        kept[max_idx] = true;
        rdp_recurse(points, start, max_idx, tolerance, kept);
        rdp_recurse(points, max_idx, end, tolerance, kept);
    }
}

/// Perpendicular distance from point `p` to the line defined by `a` and `b`.
///
/// Uses the formula: |cross(b-a, p-a)| / |b-a|.
/// When `a` and `b` coincide, returns the distance from `p` to `a`.
fn perpendicular_distance(p: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let length_sq = dx.mul_add(dx, dy * dy);

    if length_sq == 0.0 {
        return p.distance(a);
    }

    let cross = dx.mul_add(a.y - p.y, -(dy * (a.x - p.x)));
    cross.abs() / length_sq.sqrt()
}
