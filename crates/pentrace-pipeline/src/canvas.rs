//! Bounding-box normalization and canvas mapping.
//!
//! All raw actions share one bounding box and one scale, so the relative
//! placement of separate curves in the source image carries over to the
//! canvas. The drawing is scaled about its top-left corner and then
//! centered on the canvas.

use crate::types::{
    BoundingBox, CanvasAction, Dimensions, PipelineError, PixelPoint, Point, RawAction,
};

/// Bounding boxes this narrow or short cannot be scaled.
pub const DEGENERATE_EPSILON: f64 = 1e-3;

/// Something that knows the size of the surface actions are drawn on.
pub trait Canvas {
    /// Width and height of the drawing surface in pixels.
    fn size(&self) -> Dimensions;
}

impl Canvas for Dimensions {
    fn size(&self) -> Dimensions {
        *self
    }
}

/// Map source-space actions onto an integer canvas.
///
/// Each point is translated so the combined bounding box starts at the
/// origin, multiplied by `scale_factor`, shifted by the centering offset
/// and rounded half-to-even. Offsets are not clamped: a drawing larger
/// than the canvas yields negative or out-of-range coordinates.
///
/// # Errors
///
/// Returns [`PipelineError::NoDrawablePoints`] for empty input,
/// [`PipelineError::DegenerateBoundingBox`] when the combined box is at
/// most [`DEGENERATE_EPSILON`] wide or tall, and
/// [`PipelineError::CoordinateOutOfRange`] when a scaled point does not
/// fit in an `i32`.
pub fn map_all(
    raw: &[RawAction],
    scale_factor: f64,
    canvas: Dimensions,
) -> Result<Vec<CanvasAction>, PipelineError> {
    let bbox = BoundingBox::from_points(raw.iter().map(|a| *a.point()))
        .ok_or(PipelineError::NoDrawablePoints)?;
    let (width, height) = (bbox.width(), bbox.height());
    if width <= DEGENERATE_EPSILON || height <= DEGENERATE_EPSILON {
        return Err(PipelineError::DegenerateBoundingBox { width, height });
    }

    let offset = Point::new(
        (f64::from(canvas.width) - width * scale_factor) / 2.0,
        (f64::from(canvas.height) - height * scale_factor) / 2.0,
    );
    let origin = bbox.min();

    raw.iter()
        .map(|&action| {
            let pixel = to_pixel(*action.point(), origin, scale_factor, offset)?;
            Ok(action.map(|_| pixel))
        })
        .collect()
}

#[allow(clippy::cast_possible_truncation)]
fn to_pixel(
    p: Point,
    origin: Point,
    scale_factor: f64,
    offset: Point,
) -> Result<PixelPoint, PipelineError> {
    let x = (p.x - origin.x).mul_add(scale_factor, offset.x);
    let y = (p.y - origin.y).mul_add(scale_factor, offset.y);
    let (rx, ry) = (x.round_ties_even(), y.round_ties_even());
    if !fits_i32(rx) || !fits_i32(ry) {
        return Err(PipelineError::CoordinateOutOfRange { x, y });
    }
    Ok(PixelPoint::new(rx as i32, ry as i32))
}

fn fits_i32(v: f64) -> bool {
    (f64::from(i32::MIN)..=f64::from(i32::MAX)).contains(&v)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::Action;

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<RawAction> {
        vec![
            Action::Move(Point::new(x0, y0)),
            Action::Drag(Point::new(x1, y0)),
            Action::Drag(Point::new(x1, y1)),
            Action::Drag(Point::new(x0, y1)),
            Action::Drag(Point::new(x0, y0)),
        ]
    }

    fn corners(actions: &[CanvasAction]) -> (PixelPoint, PixelPoint) {
        let min_x = actions.iter().map(|a| a.point().x).min().unwrap();
        let min_y = actions.iter().map(|a| a.point().y).min().unwrap();
        let max_x = actions.iter().map(|a| a.point().x).max().unwrap();
        let max_y = actions.iter().map(|a| a.point().y).max().unwrap();
        (PixelPoint::new(min_x, min_y), PixelPoint::new(max_x, max_y))
    }

    #[test]
    fn dimensions_are_a_canvas() {
        assert_eq!(Dimensions::new(3, 4).size(), Dimensions::new(3, 4));
    }

    #[test]
    fn empty_input_has_no_drawable_points() {
        assert!(matches!(
            map_all(&[], 1.0, Dimensions::new(10, 10)),
            Err(PipelineError::NoDrawablePoints)
        ));
    }

    #[test]
    fn flat_drawing_is_degenerate() {
        let line = vec![
            Action::Move(Point::new(0.0, 5.0)),
            Action::Drag(Point::new(40.0, 5.0)),
        ];
        let err = map_all(&line, 1.0, Dimensions::new(100, 100)).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::DegenerateBoundingBox { width, height }
                if (width - 40.0).abs() < f64::EPSILON && height.abs() < f64::EPSILON
        ));
    }

    #[test]
    fn preserves_count_and_tags() {
        let raw = square(3.5, 7.25, 18.0, 40.0);
        let mapped = map_all(&raw, 1.7, Dimensions::new(640, 480)).unwrap();
        assert_eq!(mapped.len(), raw.len());
        for (r, m) in raw.iter().zip(&mapped) {
            assert_eq!(r.is_move(), m.is_move());
        }
    }

    #[test]
    fn centered_square_at_unit_scale() {
        let mapped =
            map_all(&square(25.0, 25.0, 75.0, 75.0), 1.0, Dimensions::new(200, 200)).unwrap();
        assert_eq!(
            corners(&mapped),
            (PixelPoint::new(75, 75), PixelPoint::new(125, 125))
        );
        assert_eq!(mapped[0], Action::Move(PixelPoint::new(75, 75)));
    }

    #[test]
    fn doubled_square_stays_centered() {
        let mapped =
            map_all(&square(25.0, 25.0, 75.0, 75.0), 2.0, Dimensions::new(200, 200)).unwrap();
        assert_eq!(
            corners(&mapped),
            (PixelPoint::new(50, 50), PixelPoint::new(150, 150))
        );
    }

    #[test]
    fn remapping_is_stable_within_a_pixel() {
        let canvas = Dimensions::new(333, 251);
        let raw = square(1.3, 2.9, 47.6, 31.1);
        let first = map_all(&raw, 1.0, canvas).unwrap();
        let as_raw: Vec<RawAction> = first.iter().map(|a| a.map(Point::from)).collect();
        let second = map_all(&as_raw, 1.0, canvas).unwrap();

        let (a_min, a_max) = corners(&first);
        let (b_min, b_max) = corners(&second);
        for (a, b) in [(a_min, b_min), (a_max, b_max)] {
            assert!((a.x - b.x).abs() <= 1, "{a:?} vs {b:?}");
            assert!((a.y - b.y).abs() <= 1, "{a:?} vs {b:?}");
        }
    }

    #[test]
    fn oversized_drawing_gets_negative_offsets() {
        let mapped =
            map_all(&square(0.0, 0.0, 100.0, 100.0), 3.0, Dimensions::new(100, 100)).unwrap();
        assert_eq!(
            corners(&mapped),
            (PixelPoint::new(-100, -100), PixelPoint::new(200, 200))
        );
    }

    #[test]
    fn huge_scale_is_rejected_instead_of_saturating() {
        let err = map_all(&square(25.0, 25.0, 75.0, 75.0), 1e9, Dimensions::new(200, 200))
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::CoordinateOutOfRange { x, .. } if x < f64::from(i32::MIN)
        ));
    }

    #[test]
    fn coordinates_at_the_i32_limit_still_map() {
        // Width 1 scaled to i32::MAX on a zero canvas: offsets are
        // -MAX/2, so the points land at about +-MAX/2.
        let raw = square(0.0, 0.0, 1.0, 1.0);
        let scale = f64::from(i32::MAX);
        let mapped = map_all(&raw, scale, Dimensions::new(0, 0)).unwrap();
        let (min, max) = corners(&mapped);
        assert!(min.x < 0 && max.x > 0);
    }

    #[test]
    fn ties_round_to_even() {
        // Offset is (11 - 2) / 2 = 4.5, which rounds to 4.
        let mapped =
            map_all(&square(0.0, 0.0, 2.0, 2.0), 1.0, Dimensions::new(11, 11)).unwrap();
        assert_eq!(mapped[0], Action::Move(PixelPoint::new(4, 4)));
        // 6.5 rounds to 6.
        assert_eq!(mapped[2], Action::Drag(PixelPoint::new(6, 6)));
    }

    #[test]
    fn curves_share_one_frame() {
        let mut raw = square(0.0, 0.0, 10.0, 10.0);
        raw.extend(square(90.0, 0.0, 100.0, 10.0));
        let mapped = map_all(&raw, 1.0, Dimensions::new(100, 10)).unwrap();
        assert_eq!(mapped[0], Action::Move(PixelPoint::new(0, 0)));
        assert_eq!(mapped[5], Action::Move(PixelPoint::new(90, 0)));
    }
}
