//! Image-border artifact detection.
//!
//! Binarization near the image edges often leaves the vectorizer with
//! one outline tracing the image's own rectangular frame. A curve is
//! treated as that artifact only when it spans nearly the whole image in
//! both axes *and* touches all four edges within a pixel tolerance, so
//! large legitimate shapes that stop short of any edge survive.

use crate::types::{BoundingBox, Dimensions, Point};

/// Returns `true` if `points` look like the image frame.
///
/// `pixel_tolerance` is the maximum distance from each edge;
/// `dimension_ratio` is the minimum fraction of the image width and
/// height the points must span. An empty point set is never a border.
#[must_use]
pub fn is_border(
    points: &[Point],
    image: Dimensions,
    pixel_tolerance: f64,
    dimension_ratio: f64,
) -> bool {
    let Some(bbox) = BoundingBox::from_points(points.iter().copied()) else {
        return false;
    };
    let width = f64::from(image.width);
    let height = f64::from(image.height);

    let spans_width = bbox.width() >= width * dimension_ratio;
    let spans_height = bbox.height() >= height * dimension_ratio;
    let near_left = bbox.min_x <= pixel_tolerance;
    let near_right = bbox.max_x >= width - pixel_tolerance;
    let near_top = bbox.min_y <= pixel_tolerance;
    let near_bottom = bbox.max_y >= height - pixel_tolerance;

    spans_width && spans_height && near_left && near_right && near_top && near_bottom
}
