//! Vectorization: turn a binary bitmap into closed vector curves.
//!
//! The pipeline only talks to the [`Vectorizer`] trait, so tests can
//! plug in a fake that returns fixed synthetic curves. The default
//! implementation, [`ContourVectorizer`], chains:
//!
//! 1. Suzuki-Abe border following (`imageproc::contours::find_contours`)
//!    on the bitmap padded with one background pixel, so shapes touching
//!    the image edge still get an outer border
//! 2. speckle suppression by enclosed area
//! 3. Ramer-Douglas-Peucker simplification of each closed outline
//! 4. corner detection with a potrace-style alpha per vertex
//! 5. cubic Bezier smoothing of the remaining vertices
//!
//! Curves follow the potrace model: the outline runs from edge midpoint
//! to edge midpoint, either through a sharp vertex (two lines) or along
//! a Bezier bending towards it.

use image::GrayImage;
use imageproc::contours::find_contours;
use kurbo::{BezPath, PathEl, PathSeg, Vec2};
use serde::{Deserialize, Serialize};

use crate::simplify::simplify_closed;
use crate::types::Point;

/// A closed outline produced by a [`Vectorizer`].
///
/// Wraps a single-subpath [`BezPath`] of line, quadratic and cubic
/// segments. The outline ends where it starts, either through an
/// explicit final segment or a `ClosePath`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Curve {
    path: BezPath,
}

impl Curve {
    /// Wrap a path. It should hold one subpath starting with a `MoveTo`.
    #[must_use]
    pub const fn new(path: BezPath) -> Self {
        Self { path }
    }

    /// Closed polygon through `vertices` made of straight lines.
    ///
    /// Returns a curve with no segments when `vertices` is empty.
    #[must_use]
    pub fn polygon(vertices: &[Point]) -> Self {
        let mut path = BezPath::new();
        if let Some((&first, rest)) = vertices.split_first() {
            path.move_to(first);
            for &p in rest {
                path.line_to(p);
            }
            path.line_to(first);
        }
        Self::new(path)
    }

    /// Where the outline starts (and ends), or `None` for an empty path.
    #[must_use]
    pub fn start_point(&self) -> Option<Point> {
        match self.path.elements().first() {
            Some(PathEl::MoveTo(p)) => Some((*p).into()),
            _ => None,
        }
    }

    /// The drawable segments in order, including the implicit closing
    /// line of a `ClosePath`.
    pub fn segments(&self) -> impl Iterator<Item = PathSeg> + '_ {
        self.path.segments()
    }

    /// The underlying path.
    #[must_use]
    pub const fn path(&self) -> &BezPath {
        &self.path
    }

    /// Returns `true` if the curve has no segments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments().next().is_none()
    }
}

impl From<BezPath> for Curve {
    fn from(path: BezPath) -> Self {
        Self::new(path)
    }
}

/// Tuning knobs handed to a [`Vectorizer`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TraceParams {
    /// Outlines enclosing less than this area (square pixels) are dropped.
    pub speckle_size: u32,
    /// Simplification tolerance in pixels.
    pub opt_tolerance: f64,
    /// Vertices with alpha at or above this value become corners.
    pub corner_alpha: f64,
}

/// Failure reported by a [`Vectorizer`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VectorizeError {
    /// The bitmap has a zero dimension.
    #[error("cannot trace a {width}x{height} bitmap")]
    EmptyBitmap {
        /// Bitmap width in pixels.
        width: u32,
        /// Bitmap height in pixels.
        height: u32,
    },
    /// An external tracing engine failed.
    #[error("{0}")]
    Backend(String),
}

/// Trait for outline extraction engines.
///
/// Input: a binary bitmap (255 = foreground to trace, 0 = background).
/// Output: zero or more closed curves in bitmap pixel coordinates.
pub trait Vectorizer {
    /// Trace the outlines of the foreground regions in `bitmap`.
    ///
    /// # Errors
    ///
    /// Returns [`VectorizeError`] when the engine cannot process the
    /// bitmap. Finding nothing is not an error: return an empty vector.
    fn trace(
        &self,
        bitmap: &GrayImage,
        params: &TraceParams,
    ) -> Result<Vec<Curve>, VectorizeError>;
}

/// Default [`Vectorizer`] built on `imageproc` border following.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContourVectorizer;

impl Vectorizer for ContourVectorizer {
    fn trace(
        &self,
        bitmap: &GrayImage,
        params: &TraceParams,
    ) -> Result<Vec<Curve>, VectorizeError> {
        let (width, height) = bitmap.dimensions();
        if width == 0 || height == 0 {
            return Err(VectorizeError::EmptyBitmap { width, height });
        }

        let curves = find_contours::<i32>(&pad(bitmap))
            .into_iter()
            .filter(|c| c.points.len() >= 3)
            .map(|c| {
                c.points
                    .into_iter()
                    .map(|p| Point::new(f64::from(p.x - 1), f64::from(p.y - 1)))
                    .collect::<Vec<_>>()
            })
            .filter(|ring| polygon_area(ring).abs() >= f64::from(params.speckle_size))
            .map(|ring| simplify_closed(&ring, params.opt_tolerance))
            .map(|vertices| fit_curve(&vertices, params.corner_alpha))
            .filter(|curve| !curve.is_empty())
            .collect();
        Ok(curves)
    }
}

/// Copy `bitmap` into a frame one background pixel wider on every side.
///
/// Border following only reports the outer border of a region that is
/// surrounded by background.
fn pad(bitmap: &GrayImage) -> GrayImage {
    let mut padded = GrayImage::new(bitmap.width() + 2, bitmap.height() + 2);
    image::imageops::replace(&mut padded, bitmap, 1, 1);
    padded
}

/// Build a smooth closed curve through a polygon's vertices.
///
/// Each vertex yields one piece from the midpoint of its incoming edge
/// to the midpoint of its outgoing edge. Vertices whose alpha reaches
/// `corner_alpha` stay sharp; the rest become Beziers. Polygons that
/// collapsed below three vertices are kept as straight back-and-forth
/// strokes.
fn fit_curve(vertices: &[Point], corner_alpha: f64) -> Curve {
    let m = vertices.len();
    if m < 3 {
        return Curve::polygon(vertices);
    }

    let v: Vec<kurbo::Point> = vertices.iter().map(|&p| p.into()).collect();
    let mut path = BezPath::new();
    path.move_to(v[m - 1].midpoint(v[0]));
    for j in 0..m {
        let prev = v[(j + m - 1) % m];
        let vertex = v[j];
        let next = v[(j + 1) % m];
        let m0 = prev.midpoint(vertex);
        let m1 = vertex.midpoint(next);
        let alpha = compute_alpha(m0, vertex, m1);
        if alpha >= corner_alpha {
            path.line_to(vertex);
            path.line_to(m1);
        } else {
            let t = 0.5f64.mul_add(alpha.clamp(0.55, 1.0), 0.5);
            path.curve_to(m0.lerp(vertex, t), m1.lerp(vertex, t), m1);
        }
    }
    Curve::new(path)
}

/// Smoothness of the turn at `p1` between edge midpoints `p0` and `p2`.
///
/// Measures how far `p1` sits from the chord `p0 -> p2`, normalized by
/// the axis-snapped perpendicular direction of the chord. Ranges from
/// `0.0` (nearly straight) towards `4/3` (sharp); degenerate chords
/// count as maximally sharp.
fn compute_alpha(p0: kurbo::Point, p1: kurbo::Point, p2: kurbo::Point) -> f64 {
    let chord = p2 - p0;
    // Twice the signed area of triangle p0 p1 p2.
    let dpara = (p1 - p0).cross(chord);
    let snapped = Vec2::new(-sign(chord.y), sign(chord.x));
    let ddenom = chord.cross(snapped);

    if ddenom.abs() < 1e-10 {
        return 4.0 / 3.0;
    }

    let dd = (dpara / ddenom).abs();
    let alpha = if dd > 1.0 { 1.0 - 1.0 / dd } else { 0.0 };
    alpha / 0.75
}

fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Signed area via the shoelace formula.
fn polygon_area(ring: &[Point]) -> f64 {
    let n = ring.len();
    if n < 3 {
        return 0.0;
    }
    (0..n)
        .map(|i| {
            let a = ring[i];
            let b = ring[(i + 1) % n];
            a.x.mul_add(b.y, -(b.x * a.y))
        })
        .sum::<f64>()
        / 2.0
}
