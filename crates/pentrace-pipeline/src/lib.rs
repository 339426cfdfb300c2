//! pentrace-pipeline: turn a raster image into pen-up/pen-down actions.
//!
//! Converts an image into an ordered list of [`Action`]s through:
//! decode -> grayscale -> binarize -> vectorize -> per curve
//! {sample -> border check -> emit} -> bounding-box normalize ->
//! scale and center onto the target canvas.
//!
//! The crate is sans-IO apart from [`ImageSource::Path`], which reads a
//! single file. Replaying the actions on a pointer device lives in
//! `pentrace-playback`; serializing them lives in `pentrace-export`.

pub mod binarize;
pub mod border;
pub mod canvas;
pub mod diagnostics;
pub mod emit;
pub mod grayscale;
pub mod pipeline;
pub mod sample;
pub mod simplify;
pub mod trace;
pub mod types;

use std::panic::{AssertUnwindSafe, catch_unwind};

pub use canvas::Canvas;
/// Curve geometry types used by [`Curve`] and custom [`Vectorizer`]s.
pub use kurbo;
pub use pipeline::Pipeline;
pub use sample::{TessellateMethod, Tessellation};
pub use trace::{ContourVectorizer, Curve, TraceParams, VectorizeError, Vectorizer};
pub use types::{
    Action, BoundingBox, CanvasAction, CurveTally, Dimensions, DrawResult, GrayImage, ImageSource,
    PipelineConfig, PipelineError, PixelPoint, Point, RawAction,
};

/// Run the full pipeline on in-memory image bytes.
///
/// Takes raw image bytes (PNG, JPEG, BMP, WebP), a configuration, the
/// target canvas and the vectorizer to trace with, and produces a
/// [`DrawResult`] holding the canvas-space actions plus per-curve
/// bookkeeping.
///
/// # Pipeline steps
///
/// 1. Decode image and convert to grayscale
/// 2. Threshold to a binary bitmap
/// 3. Trace closed curves (pluggable [`Vectorizer`])
/// 4. Per curve: sample, skip unusable or border curves, emit actions
/// 5. Normalize to the combined bounding box, scale, center on canvas
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] for out-of-range settings,
/// [`PipelineError::EmptyInput`] or [`PipelineError::UnreadableImageFormat`]
/// when decoding fails, [`PipelineError::NoCurvesTraced`] when the
/// vectorizer finds nothing, [`PipelineError::NoDrawablePoints`] when
/// every curve is skipped, and [`PipelineError::DegenerateBoundingBox`]
/// when the drawing has no area to scale.
pub fn process(
    image_bytes: &[u8],
    config: &PipelineConfig,
    canvas: &impl Canvas,
    vectorizer: &impl Vectorizer,
) -> Result<DrawResult, PipelineError> {
    config.validate()?;
    Ok(Pipeline::new(image_bytes.to_vec(), config.clone())
        .decode()?
        .binarize()
        .trace(vectorizer)?
        .emit()?
        .map(canvas)?
        .into_result())
}

/// Convert an image into canvas actions, never failing.
///
/// Uses the default [`ContourVectorizer`]. Any error, including a panic
/// inside a collaborator, is logged at warn level and collapses to an
/// empty vector.
#[must_use]
pub fn run(
    source: &ImageSource,
    config: &PipelineConfig,
    canvas: &impl Canvas,
) -> Vec<CanvasAction> {
    run_with(source, config, canvas, &ContourVectorizer)
}

/// [`run`] with an explicit vectorizer.
#[must_use]
pub fn run_with(
    source: &ImageSource,
    config: &PipelineConfig,
    canvas: &impl Canvas,
    vectorizer: &impl Vectorizer,
) -> Vec<CanvasAction> {
    match try_run(source, config, canvas, vectorizer) {
        Ok(result) => {
            log::debug!(
                "{} actions from {} of {} curves",
                result.actions.len(),
                result.curves.kept,
                result.curves.traced
            );
            result.actions
        }
        Err(e) => {
            log::warn!("no actions generated: {e}");
            Vec::new()
        }
    }
}

/// Read, process and catch panics at the library boundary.
fn try_run(
    source: &ImageSource,
    config: &PipelineConfig,
    canvas: &impl Canvas,
    vectorizer: &impl Vectorizer,
) -> Result<DrawResult, PipelineError> {
    catch_unwind(AssertUnwindSafe(|| {
        let bytes = source.read()?;
        process(&bytes, config, canvas, vectorizer)
    }))
    .unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        Err(PipelineError::Panicked(message))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::grayscale::tests::encode_png;
    use crate::pipeline::tests::{FixedVectorizer, blank_png, rect};

    /// White image with a filled black rectangle.
    fn square_png(size: u32, lo: u32, hi: u32) -> Vec<u8> {
        encode_png(&image::RgbaImage::from_fn(size, size, |x, y| {
            if (lo..hi).contains(&x) && (lo..hi).contains(&y) {
                image::Rgba([0, 0, 0, 255])
            } else {
                image::Rgba([255, 255, 255, 255])
            }
        }))
    }

    struct PanickingVectorizer;

    impl Vectorizer for PanickingVectorizer {
        fn trace(
            &self,
            _bitmap: &image::GrayImage,
            _params: &TraceParams,
        ) -> Result<Vec<Curve>, VectorizeError> {
            panic!("tracer blew up");
        }
    }

    fn canvas() -> Dimensions {
        Dimensions::new(200, 200)
    }

    #[test]
    fn process_empty_input() {
        let result = process(&[], &PipelineConfig::default(), &canvas(), &ContourVectorizer);
        assert!(matches!(result, Err(PipelineError::EmptyInput)));
    }

    #[test]
    fn process_corrupt_input() {
        let result = process(
            &[0xFF, 0x00],
            &PipelineConfig::default(),
            &canvas(),
            &ContourVectorizer,
        );
        assert!(matches!(
            result,
            Err(PipelineError::UnreadableImageFormat(_))
        ));
    }

    #[test]
    fn process_validates_config_first() {
        let config = PipelineConfig {
            corner_alpha: -1.0,
            ..PipelineConfig::default()
        };
        let result = process(&[], &config, &canvas(), &ContourVectorizer);
        assert!(matches!(result, Err(PipelineError::InvalidConfig(_))));
    }

    #[test]
    fn process_blank_image_traces_nothing() {
        let result = process(
            &blank_png(20, 20),
            &PipelineConfig::default(),
            &canvas(),
            &ContourVectorizer,
        );
        assert!(matches!(result, Err(PipelineError::NoCurvesTraced)));
    }

    #[test]
    fn process_traces_a_real_square() {
        let result = process(
            &square_png(100, 30, 70),
            &PipelineConfig::default(),
            &canvas(),
            &ContourVectorizer,
        )
        .unwrap();
        assert_eq!(result.curves.kept, 1);
        assert!(result.actions.len() >= 4);
        assert!(result.actions[0].is_move());
        assert!(result.actions[1..].iter().all(|a| !a.is_move()));
        for a in &result.actions {
            let p = a.point();
            assert!((0..200).contains(&p.x) && (0..200).contains(&p.y), "{p:?}");
        }
    }

    #[test]
    fn process_drops_the_image_frame() {
        // A fully black image traces to one outline around the frame.
        let black = encode_png(&image::RgbaImage::from_pixel(
            100,
            100,
            image::Rgba([0, 0, 0, 255]),
        ));
        let result = process(&black, &PipelineConfig::default(), &canvas(), &ContourVectorizer);
        assert!(matches!(result, Err(PipelineError::NoDrawablePoints)));

        let keep = PipelineConfig {
            skip_border: false,
            ..PipelineConfig::default()
        };
        let framed = process(&black, &keep, &canvas(), &ContourVectorizer).unwrap();
        assert_eq!(framed.curves.traced, 1);
        assert_eq!(framed.curves.kept, 1);
    }

    #[test]
    fn process_keeps_a_band_spanning_the_width() {
        let band = encode_png(&image::RgbaImage::from_fn(100, 100, |_, y| {
            if (30..70).contains(&y) {
                image::Rgba([0, 0, 0, 255])
            } else {
                image::Rgba([255, 255, 255, 255])
            }
        }));
        let result = process(&band, &PipelineConfig::default(), &canvas(), &ContourVectorizer)
            .unwrap();
        assert_eq!(result.curves.traced, 1);
        assert_eq!(result.curves.kept, 1);
        assert!(result.actions[0].is_move());
    }

    #[test]
    fn run_returns_actions_for_bytes() {
        let source = ImageSource::Bytes(square_png(100, 30, 70));
        let actions = run(&source, &PipelineConfig::default(), &canvas());
        assert!(!actions.is_empty());
    }

    #[test]
    fn run_zero_curves_is_empty() {
        let source = ImageSource::Bytes(blank_png(50, 50));
        let actions = run_with(
            &source,
            &PipelineConfig::default(),
            &canvas(),
            &FixedVectorizer(Vec::new()),
        );
        assert!(actions.is_empty());
    }

    #[test]
    fn run_all_border_is_empty() {
        let source = ImageSource::Bytes(blank_png(100, 100));
        let frames = vec![rect(0.0, 0.0, 100.0, 100.0), rect(1.0, 1.0, 99.0, 99.0)];
        let actions = run_with(
            &source,
            &PipelineConfig::default(),
            &canvas(),
            &FixedVectorizer(frames),
        );
        assert!(actions.is_empty());
    }

    #[test]
    fn run_missing_file_is_empty() {
        let source = ImageSource::Path(PathBuf::from("/nonexistent/pentrace/input.png"));
        assert!(run(&source, &PipelineConfig::default(), &canvas()).is_empty());
    }

    #[test]
    fn run_degenerate_drawing_is_empty() {
        // Two points on one horizontal line: zero height.
        let line = Curve::polygon(&[Point::new(10.0, 40.0), Point::new(60.0, 40.0)]);
        let actions = run_with(
            &ImageSource::Bytes(blank_png(100, 100)),
            &PipelineConfig::default(),
            &canvas(),
            &FixedVectorizer(vec![line]),
        );
        assert!(actions.is_empty());
    }

    #[test]
    fn run_catches_collaborator_panics() {
        let source = ImageSource::Bytes(blank_png(10, 10));
        let result = try_run(
            &source,
            &PipelineConfig::default(),
            &canvas(),
            &PanickingVectorizer,
        );
        assert!(matches!(
            result,
            Err(PipelineError::Panicked(ref m)) if m == "tracer blew up"
        ));
        assert!(
            run_with(
                &source,
                &PipelineConfig::default(),
                &canvas(),
                &PanickingVectorizer
            )
            .is_empty()
        );
    }
}
