//! Incremental pipeline: advance stage-by-stage, inspecting each
//! intermediate result before continuing.
//!
//! [`crate::process`] runs every stage in one call; [`Pipeline`] lets
//! the caller drive execution one step at a time:
//!
//! ```rust
//! # use pentrace_pipeline::{ContourVectorizer, Dimensions, Pipeline};
//! # use pentrace_pipeline::{PipelineConfig, PipelineError};
//! # fn run(png: Vec<u8>) -> Result<(), PipelineError> {
//! let canvas = Dimensions::new(1920, 1080);
//! let result = Pipeline::new(png, PipelineConfig::default())
//!     .decode()?
//!     .binarize()
//!     .trace(&ContourVectorizer)?
//!     .emit()?
//!     .map(&canvas)?
//!     .into_result();
//! # Ok(())
//! # }
//! ```
//!
//! Each stage method consumes `self` and returns the next pipeline state
//! (or `Result` for fallible stages), so stages cannot be skipped or run
//! out of order. Per-curve problems (empty tessellation, too few points,
//! image-frame artifacts) never fail a stage; they are tallied in
//! [`CurveTally`] and logged at debug level.

use kurbo::PathSeg;
use log::{debug, info};

use crate::border::is_border;
use crate::canvas::{Canvas, map_all};
use crate::diagnostics::StageMetrics;
use crate::emit::emit;
use crate::sample::sample;
use crate::trace::{Curve, Vectorizer};
use crate::types::{
    BoundingBox, CanvasAction, CurveTally, Dimensions, DrawResult, GrayImage, PipelineConfig,
    PipelineError, RawAction,
};

// ───────────────────────── Stage 0: Pending ──────────────────────────

/// Pipeline state before any processing has occurred.
///
/// The source image bytes and config are stored but not yet touched.
/// Call [`decode`](Self::decode) to advance to the next stage.
#[must_use = "pipeline stages are consumed by advancing; call .decode() to continue"]
pub struct Pending {
    config: PipelineConfig,
    source: Vec<u8>,
}

impl Pending {
    /// The raw source image bytes.
    #[must_use]
    pub fn source(&self) -> &[u8] {
        &self.source
    }

    /// Decode the source image to grayscale and advance to [`Decoded`].
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::EmptyInput`] if the source bytes are
    /// empty and [`PipelineError::UnreadableImageFormat`] if the format
    /// is unrecognized or the data is corrupt.
    pub fn decode(self) -> Result<Decoded, PipelineError> {
        let gray = crate::grayscale::decode_and_grayscale(&self.source)?;
        let dimensions = Dimensions::new(gray.width(), gray.height());
        Ok(Decoded {
            config: self.config,
            gray,
            dimensions,
            source_len: self.source.len(),
        })
    }
}

// ───────────────────────── Stage 1: Decoded ──────────────────────────

/// Pipeline state after decoding the source image to grayscale.
///
/// Call [`binarize`](Self::binarize) to advance to the next stage.
#[must_use = "pipeline stages are consumed by advancing; call .binarize() to continue"]
pub struct Decoded {
    config: PipelineConfig,
    gray: GrayImage,
    dimensions: Dimensions,
    source_len: usize,
}

impl Decoded {
    /// The decoded grayscale image.
    #[must_use]
    pub const fn grayscale(&self) -> &GrayImage {
        &self.gray
    }

    /// Source image dimensions.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Threshold the grayscale image and advance to [`Binarized`].
    pub fn binarize(self) -> Binarized {
        let bitmap = crate::binarize::binarize(&self.gray, self.config.threshold);
        Binarized {
            config: self.config,
            bitmap,
            dimensions: self.dimensions,
        }
    }
}

// ──────────────────────── Stage 2: Binarized ─────────────────────────

/// Pipeline state after thresholding to a two-level bitmap.
///
/// Call [`trace`](Self::trace) with a [`Vectorizer`] to advance.
#[must_use = "pipeline stages are consumed by advancing; call .trace() to continue"]
pub struct Binarized {
    config: PipelineConfig,
    bitmap: GrayImage,
    dimensions: Dimensions,
}

impl Binarized {
    /// The binary bitmap (255 = foreground, 0 = background).
    #[must_use]
    pub const fn bitmap(&self) -> &GrayImage {
        &self.bitmap
    }

    /// Trace the bitmap into closed curves and advance to [`Traced`].
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Vectorize`] if the vectorizer fails and
    /// [`PipelineError::NoCurvesTraced`] if it finds nothing.
    pub fn trace(self, vectorizer: &impl Vectorizer) -> Result<Traced, PipelineError> {
        let curves = vectorizer.trace(&self.bitmap, &self.config.trace_params())?;
        if curves.is_empty() {
            return Err(PipelineError::NoCurvesTraced);
        }
        Ok(Traced {
            config: self.config,
            curves,
            dimensions: self.dimensions,
        })
    }
}

// ───────────────────────── Stage 3: Traced ───────────────────────────

/// Pipeline state holding the vectorizer's curves.
///
/// Call [`emit`](Self::emit) to sample, filter and emit every curve.
#[must_use = "pipeline stages are consumed by advancing; call .emit() to continue"]
pub struct Traced {
    config: PipelineConfig,
    curves: Vec<Curve>,
    dimensions: Dimensions,
}

impl Traced {
    /// The traced curves in source-image coordinates.
    #[must_use]
    pub fn curves(&self) -> &[Curve] {
        &self.curves
    }

    /// Sample each curve, drop unusable ones and emit actions for the
    /// rest, advancing to [`Emitted`].
    ///
    /// Curves are handled independently: a skipped curve never affects
    /// the others.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::NoDrawablePoints`] if every curve was
    /// skipped.
    pub fn emit(self) -> Result<Emitted, PipelineError> {
        let tessellation = self.config.tessellation();
        let mut tally = CurveTally {
            traced: self.curves.len(),
            ..CurveTally::default()
        };
        let mut raw = Vec::new();

        for (index, curve) in self.curves.iter().enumerate() {
            let points = sample(curve, tessellation);
            if points.is_empty() {
                debug!("curve {index}: tessellation produced no points, skipped");
                tally.empty += 1;
                continue;
            }
            if points.len() < 2 {
                debug!("curve {index}: single point, skipped");
                tally.too_few_points += 1;
                continue;
            }
            if self.config.skip_border
                && is_border(
                    &points,
                    self.dimensions,
                    self.config.border_pixel_tolerance,
                    self.config.border_dimension_ratio,
                )
            {
                info!("curve {index}: traces the image frame, skipped");
                tally.border += 1;
                continue;
            }

            let actions = emit(&points);
            if actions.len() < 2 {
                debug!(
                    "curve {index}: {} points collapsed to one position, skipped",
                    points.len()
                );
                tally.too_few_points += 1;
                continue;
            }
            tally.kept += 1;
            raw.extend(actions);
        }

        if raw.is_empty() {
            return Err(PipelineError::NoDrawablePoints);
        }
        debug!(
            "{} of {} curves kept, {} raw actions",
            tally.kept,
            tally.traced,
            raw.len()
        );
        Ok(Emitted {
            config: self.config,
            raw,
            curves: tally,
            dimensions: self.dimensions,
        })
    }
}

// ───────────────────────── Stage 4: Emitted ──────────────────────────

/// Pipeline state holding every kept curve's actions in source-image
/// coordinates.
///
/// Call [`map`](Self::map) with the target [`Canvas`] to advance.
#[must_use = "pipeline stages are consumed by advancing; call .map() to continue"]
pub struct Emitted {
    config: PipelineConfig,
    raw: Vec<RawAction>,
    curves: CurveTally,
    dimensions: Dimensions,
}

impl Emitted {
    /// Aggregated actions before canvas mapping.
    #[must_use]
    pub fn raw_actions(&self) -> &[RawAction] {
        &self.raw
    }

    /// What happened to each traced curve.
    #[must_use]
    pub const fn curves(&self) -> CurveTally {
        self.curves
    }

    /// Normalize, scale and center the actions onto `canvas`, advancing
    /// to [`Mapped`].
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::DegenerateBoundingBox`] if the combined
    /// drawing has near-zero width or height.
    pub fn map(self, canvas: &impl Canvas) -> Result<Mapped, PipelineError> {
        let canvas = canvas.size();
        let actions = map_all(&self.raw, self.config.scale_factor, canvas)?;
        let source_box = BoundingBox::from_points(self.raw.iter().map(|a| *a.point()))
            .ok_or(PipelineError::NoDrawablePoints)?;
        Ok(Mapped {
            scale_factor: self.config.scale_factor,
            actions,
            source_box,
            curves: self.curves,
            image: self.dimensions,
            canvas,
        })
    }
}

// ───────────────────────── Stage 5: Mapped ───────────────────────────

/// Pipeline state after canvas mapping, the final stage.
///
/// Call [`into_result`](Self::into_result) to extract the [`DrawResult`].
#[must_use = "call .into_result() to extract the DrawResult"]
pub struct Mapped {
    scale_factor: f64,
    actions: Vec<CanvasAction>,
    source_box: BoundingBox,
    curves: CurveTally,
    image: Dimensions,
    canvas: Dimensions,
}

impl Mapped {
    /// Final actions in canvas pixel coordinates.
    #[must_use]
    pub fn actions(&self) -> &[CanvasAction] {
        &self.actions
    }

    /// Bounding box of the drawing in source-image coordinates.
    #[must_use]
    pub const fn source_box(&self) -> BoundingBox {
        self.source_box
    }

    /// Number of actions that landed outside the canvas.
    #[must_use]
    pub fn out_of_canvas(&self) -> usize {
        let (w, h) = (
            i64::from(self.canvas.width),
            i64::from(self.canvas.height),
        );
        self.actions
            .iter()
            .filter(|a| {
                let p = a.point();
                let (x, y) = (i64::from(p.x), i64::from(p.y));
                x < 0 || y < 0 || x >= w || y >= h
            })
            .count()
    }

    /// Consume the pipeline and return the [`DrawResult`].
    #[must_use]
    pub fn into_result(self) -> DrawResult {
        DrawResult {
            actions: self.actions,
            image: self.image,
            canvas: self.canvas,
            curves: self.curves,
        }
    }
}

// ─────────────────────── PipelineStage trait ─────────────────────────

/// Implemented by every stage that has done work, so diagnostics can
/// time and describe stages uniformly.
pub trait PipelineStage {
    /// Human-readable name of this stage (e.g. `"decode"`).
    const NAME: &str;

    /// One-based index of this stage ([`Pending`] is stage 0).
    const INDEX: usize;

    /// Metrics describing the work done to reach this state.
    fn metrics(&self) -> StageMetrics;
}

impl PipelineStage for Decoded {
    const NAME: &str = "decode";
    const INDEX: usize = 1;

    fn metrics(&self) -> StageMetrics {
        StageMetrics::Decode {
            input_bytes: self.source_len,
            width: self.dimensions.width,
            height: self.dimensions.height,
            pixel_count: u64::from(self.dimensions.width) * u64::from(self.dimensions.height),
        }
    }
}

impl PipelineStage for Binarized {
    const NAME: &str = "binarize";
    const INDEX: usize = 2;

    fn metrics(&self) -> StageMetrics {
        StageMetrics::Binarize {
            threshold: self.config.threshold,
            foreground_pixels: crate::binarize::count_foreground(&self.bitmap),
            total_pixels: u64::from(self.dimensions.width) * u64::from(self.dimensions.height),
        }
    }
}

impl PipelineStage for Traced {
    const NAME: &str = "trace";
    const INDEX: usize = 3;

    fn metrics(&self) -> StageMetrics {
        let segments = self.curves.iter().flat_map(Curve::segments);
        let (mut line_count, mut bezier_count) = (0, 0);
        for segment in segments {
            match segment {
                PathSeg::Line(_) => line_count += 1,
                PathSeg::Quad(_) | PathSeg::Cubic(_) => bezier_count += 1,
            }
        }
        StageMetrics::Trace {
            curve_count: self.curves.len(),
            line_count,
            bezier_count,
        }
    }
}

impl PipelineStage for Emitted {
    const NAME: &str = "emit";
    const INDEX: usize = 4;

    fn metrics(&self) -> StageMetrics {
        StageMetrics::Emit {
            curves: self.curves,
            action_count: self.raw.len(),
            move_count: self.raw.iter().filter(|a| a.is_move()).count(),
        }
    }
}

impl PipelineStage for Mapped {
    const NAME: &str = "map";
    const INDEX: usize = 5;

    fn metrics(&self) -> StageMetrics {
        StageMetrics::Map {
            scale_factor: self.scale_factor,
            source_width: self.source_box.width(),
            source_height: self.source_box.height(),
            canvas: self.canvas,
            out_of_canvas: self.out_of_canvas(),
        }
    }
}

// ───────────────────── Pipeline entry point ──────────────────────────

/// Incremental image-to-actions pipeline.
///
/// Created via [`Pipeline::new`], which stores the source image and
/// config without doing any processing. See the
/// [module documentation](self) for the full chain.
pub struct Pipeline;

impl Pipeline {
    /// Create a new pipeline from source image bytes and config.
    ///
    /// No processing is performed; the bytes and config are simply
    /// stored. Call [`.decode()`](Pending::decode) to begin.
    #[allow(clippy::new_ret_no_self)]
    pub const fn new(image_bytes: Vec<u8>, config: PipelineConfig) -> Pending {
        Pending {
            config,
            source: image_bytes,
        }
    }
}
