//! Curve sampling: flatten a [`Curve`] into an ordered point sequence.
//!
//! Two interchangeable strategies share a single dispatch point,
//! [`sample`]:
//!
//! - [`Tessellation::Adaptive`] flattens with `kurbo`'s path flattening
//!   to within [`ADAPTIVE_FLATNESS`] pixels, so tight bends get more
//!   points than gentle ones.
//! - [`Tessellation::Regular`] evaluates each curved segment at a fixed
//!   number of evenly spaced parameters.
//!
//! Straight segments contribute only their end point under both.

use std::fmt;

use kurbo::{ParamCurve, PathEl, PathSeg};
use serde::{Deserialize, Serialize};

use crate::trace::Curve;
use crate::types::Point;

/// Maximum distance in pixels between a curved segment and its
/// flattened polyline under adaptive sampling.
pub const ADAPTIVE_FLATNESS: f64 = 0.1;

/// Configuration-level choice of tessellation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TessellateMethod {
    /// Curvature-driven subdivision.
    #[default]
    Adaptive,
    /// Fixed number of points per curved segment.
    Regular,
}

impl fmt::Display for TessellateMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Adaptive => f.write_str("adaptive"),
            Self::Regular => f.write_str("regular"),
        }
    }
}

/// A fully specified tessellation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tessellation {
    /// Curvature-driven subdivision; needs no resolution.
    Adaptive,
    /// `resolution` evenly spaced points per curved segment.
    Regular {
        /// Points emitted per curved segment.
        resolution: u32,
    },
}

/// Flatten `curve` into points using `tessellation`.
///
/// The output starts with the curve's start point and then follows the
/// segments in order, so a closed curve ends where it began. A curve
/// without segments yields an empty vector.
#[must_use = "returns the sampled points"]
pub fn sample(curve: &Curve, tessellation: Tessellation) -> Vec<Point> {
    if curve.is_empty() {
        return Vec::new();
    }
    match tessellation {
        Tessellation::Adaptive => flatten_adaptive(curve),
        Tessellation::Regular { resolution } => flatten_regular(curve, resolution),
    }
}

impl Curve {
    /// Flatten this curve into points. See [`sample`].
    #[must_use = "returns the sampled points"]
    pub fn tessellate(&self, tessellation: Tessellation) -> Vec<Point> {
        sample(self, tessellation)
    }
}

fn flatten_adaptive(curve: &Curve) -> Vec<Point> {
    let mut points: Vec<Point> = Vec::new();
    let mut subpath_start: Option<Point> = None;
    curve.path().flatten(ADAPTIVE_FLATNESS, |el| match el {
        PathEl::MoveTo(p) => {
            subpath_start = Some(p.into());
            points.push(p.into());
        }
        PathEl::LineTo(p) => points.push(p.into()),
        PathEl::ClosePath => {
            if let Some(start) = subpath_start
                && points.last() != Some(&start)
            {
                points.push(start);
            }
        }
        // Flattening only emits lines.
        PathEl::QuadTo(_, p) | PathEl::CurveTo(_, _, p) => points.push(p.into()),
    });
    points
}

/// Each curved segment contributes `resolution` evenly parameterized
/// points after its start; the last one is exactly the segment's end.
fn flatten_regular(curve: &Curve, resolution: u32) -> Vec<Point> {
    let steps = resolution.max(1);
    let mut points = Vec::new();
    for (index, segment) in curve.segments().enumerate() {
        if index == 0 {
            points.push(segment.start().into());
        }
        if !matches!(segment, PathSeg::Line(_)) {
            for i in 1..steps {
                points.push(segment.eval(f64::from(i) / f64::from(steps)).into());
            }
        }
        points.push(segment.end().into());
    }
    points
}

#[cfg(test)]
mod tests {
    use kurbo::BezPath;

    use super::*;

    fn square() -> Curve {
        Curve::polygon(&[
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ])
    }

    /// Symmetric bulge from (0,0) to (10,0), closed by a straight line.
    fn arch() -> Curve {
        let mut path = BezPath::new();
        path.move_to((0.0, 0.0));
        path.curve_to((0.0, 8.0), (10.0, 8.0), (10.0, 0.0));
        path.line_to((0.0, 0.0));
        Curve::new(path)
    }

    #[test]
    fn empty_curve_samples_to_nothing() {
        let mut lone_move = BezPath::new();
        lone_move.move_to((1.0, 1.0));
        for curve in [Curve::default(), Curve::new(lone_move)] {
            assert!(sample(&curve, Tessellation::Adaptive).is_empty());
            assert!(sample(&curve, Tessellation::Regular { resolution: 5 }).is_empty());
        }
    }

    #[test]
    fn polygon_samples_to_its_vertices_under_both_strategies() {
        let expected = vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
            Point::new(0.0, 0.0),
        ];
        assert_eq!(sample(&square(), Tessellation::Adaptive), expected);
        assert_eq!(
            sample(&square(), Tessellation::Regular { resolution: 15 }),
            expected
        );
    }

    #[test]
    fn close_path_returns_to_the_start() {
        let mut path = BezPath::new();
        path.move_to((0.0, 0.0));
        path.line_to((5.0, 0.0));
        path.line_to((5.0, 5.0));
        path.close_path();
        let curve = Curve::new(path);
        for tessellation in [Tessellation::Adaptive, Tessellation::Regular { resolution: 3 }] {
            let points = sample(&curve, tessellation);
            assert_eq!(points.len(), 4, "{tessellation:?}");
            assert_eq!(points.last(), Some(&Point::new(0.0, 0.0)));
        }
    }

    #[test]
    fn regular_emits_resolution_points_per_bezier() {
        let points = sample(&arch(), Tessellation::Regular { resolution: 8 });
        // start + 8 for the Bezier + 1 for the closing line.
        assert_eq!(points.len(), 10);
        assert_eq!(points[8], Point::new(10.0, 0.0));
        assert_eq!(points[9], Point::new(0.0, 0.0));
    }

    #[test]
    fn higher_regular_resolution_means_more_points() {
        let coarse = sample(&arch(), Tessellation::Regular { resolution: 4 });
        let fine = sample(&arch(), Tessellation::Regular { resolution: 32 });
        assert!(fine.len() > coarse.len());
    }

    #[test]
    fn regular_points_lie_on_the_curve() {
        let points = sample(&arch(), Tessellation::Regular { resolution: 2 });
        // Midpoint of this symmetric cubic: y = 0.75 * 8.
        assert!((points[1].x - 5.0).abs() < 1e-12);
        assert!((points[1].y - 6.0).abs() < 1e-12);
    }

    #[test]
    fn adaptive_refines_bends_and_stays_on_the_curve() {
        let points = sample(&arch(), Tessellation::Adaptive);
        assert!(points.len() > 4, "expected subdivision, got {points:?}");
        assert_eq!(points.first(), Some(&Point::new(0.0, 0.0)));
        assert_eq!(points.last(), Some(&Point::new(0.0, 0.0)));
        for p in &points {
            assert!(p.y >= -1e-9 && p.y <= 6.0 + 1e-9, "off-curve point {p:?}");
        }
    }

    #[test]
    fn adaptive_leaves_straight_beziers_on_their_line() {
        let mut path = BezPath::new();
        path.move_to((0.0, 0.0));
        path.curve_to((3.0, 0.0), (6.0, 0.0), (9.0, 0.0));
        let points = sample(&Curve::new(path), Tessellation::Adaptive);
        assert_eq!(points.first(), Some(&Point::new(0.0, 0.0)));
        assert_eq!(points.last(), Some(&Point::new(9.0, 0.0)));
        assert!(points.iter().all(|p| p.y.abs() < 1e-12));
    }

    #[test]
    fn tighter_bends_get_more_adaptive_points() {
        let gentle = {
            let mut path = BezPath::new();
            path.move_to((0.0, 0.0));
            path.curve_to((30.0, 2.0), (60.0, 2.0), (90.0, 0.0));
            Curve::new(path)
        };
        let tight = {
            let mut path = BezPath::new();
            path.move_to((0.0, 0.0));
            path.curve_to((0.0, 60.0), (90.0, 60.0), (90.0, 0.0));
            Curve::new(path)
        };
        assert!(
            sample(&tight, Tessellation::Adaptive).len()
                > sample(&gentle, Tessellation::Adaptive).len()
        );
    }

    #[test]
    fn tessellate_method_delegates_to_sample() {
        let curve = arch();
        assert_eq!(
            curve.tessellate(Tessellation::Adaptive),
            sample(&curve, Tessellation::Adaptive)
        );
    }

    #[test]
    fn method_displays_lowercase() {
        assert_eq!(TessellateMethod::Regular.to_string(), "regular");
        assert_eq!(TessellateMethod::default(), TessellateMethod::Adaptive);
    }
}
