//! Shared types for the pentrace pipeline.

use std::borrow::Cow;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::sample::{TessellateMethod, Tessellation};
use crate::trace::{TraceParams, VectorizeError};

/// Re-export `GrayImage` so downstream crates can reference
/// intermediate raster data without depending on `image` directly.
pub use image::GrayImage;

/// A 2D point in source-image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (pixels from left edge).
    pub x: f64,
    /// Vertical position (pixels from top edge).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    ///
    /// Avoids the square root for comparison purposes.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }
}

/// An integer point in target-canvas pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelPoint {
    /// Horizontal position (pixels from the canvas's left edge).
    pub x: i32,
    /// Vertical position (pixels from the canvas's top edge).
    pub y: i32,
}

impl PixelPoint {
    /// Create a new pixel point.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<kurbo::Point> for Point {
    fn from(p: kurbo::Point) -> Self {
        Self::new(p.x, p.y)
    }
}

impl From<Point> for kurbo::Point {
    fn from(p: Point) -> Self {
        Self::new(p.x, p.y)
    }
}

impl From<PixelPoint> for Point {
    fn from(p: PixelPoint) -> Self {
        Self::new(f64::from(p.x), f64::from(p.y))
    }
}

/// One discrete pointer command.
///
/// `Move` lifts the pen and travels to the point; `Drag` keeps the pen
/// down while travelling. Every curve contributes exactly one `Move`
/// followed by zero or more `Drag`s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action<P> {
    /// Pen-up move to an absolute position.
    Move(P),
    /// Pen-down drag to an absolute position.
    Drag(P),
}

impl<P> Action<P> {
    /// The target position of this action.
    #[must_use]
    pub const fn point(&self) -> &P {
        match self {
            Self::Move(p) | Self::Drag(p) => p,
        }
    }

    /// Returns `true` for a pen-up [`Action::Move`].
    #[must_use]
    pub const fn is_move(&self) -> bool {
        matches!(self, Self::Move(_))
    }

    /// Transform the carried point, keeping the tag.
    #[must_use]
    pub fn map<Q>(self, f: impl FnOnce(P) -> Q) -> Action<Q> {
        match self {
            Self::Move(p) => Action::Move(f(p)),
            Self::Drag(p) => Action::Drag(f(p)),
        }
    }
}

/// An action in source-image coordinates, before canvas mapping.
pub type RawAction = Action<Point>;

/// An action in final canvas pixel coordinates.
pub type CanvasAction = Action<PixelPoint>;

/// Minimal axis-aligned rectangle containing a point set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Smallest x coordinate.
    pub min_x: f64,
    /// Smallest y coordinate.
    pub min_y: f64,
    /// Largest x coordinate.
    pub max_x: f64,
    /// Largest y coordinate.
    pub max_y: f64,
}

impl BoundingBox {
    /// Compute the bounding box of `points`, or `None` when empty.
    #[must_use]
    pub fn from_points(points: impl IntoIterator<Item = Point>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let init = Self {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        Some(iter.fold(init, |b, p| Self {
            min_x: b.min_x.min(p.x),
            min_y: b.min_y.min(p.y),
            max_x: b.max_x.max(p.x),
            max_y: b.max_y.max(p.y),
        }))
    }

    /// Horizontal extent.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Vertical extent.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Top-left corner.
    #[must_use]
    pub const fn min(&self) -> Point {
        Point::new(self.min_x, self.min_y)
    }
}

/// Image or canvas dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Create new dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Where the pipeline reads its image from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// An image file on disk.
    Path(PathBuf),
    /// Encoded image bytes already in memory (PNG, JPEG, BMP, WebP).
    Bytes(Vec<u8>),
}

impl ImageSource {
    /// Read the encoded image bytes.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::ImageNotFound`] if the path does not exist
    /// and [`PipelineError::Io`] for any other read failure.
    pub fn read(&self) -> Result<Cow<'_, [u8]>, PipelineError> {
        match self {
            Self::Bytes(bytes) => Ok(Cow::Borrowed(bytes)),
            Self::Path(path) => match std::fs::read(path) {
                Ok(bytes) => Ok(Cow::Owned(bytes)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    Err(PipelineError::ImageNotFound(path.clone()))
                }
                Err(e) => Err(PipelineError::Io(e)),
            },
        }
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<Vec<u8>> for ImageSource {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

/// Configuration for the image-to-actions pipeline.
///
/// Every field has a default (see the `DEFAULT_*` associated constants)
/// and nothing mutates during a run. Call [`validate`](Self::validate)
/// to check ranges; [`crate::process`] does so before touching the image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Binarization cutoff. Pixels with luma strictly below this value
    /// are foreground and get traced.
    pub threshold: u8,

    /// Outlines enclosing fewer than this many square pixels are
    /// discarded as speckles.
    pub speckle_size: u32,

    /// Simplification tolerance in pixels applied to traced outlines.
    /// Higher values remove more vertices.
    pub opt_tolerance: f64,

    /// Corner threshold from `0.0` (every vertex is a corner, pure
    /// polygons) to `4/3` (no corners, fully smooth).
    pub corner_alpha: f64,

    /// Which tessellation strategy turns curves into points.
    pub tessellate_method: TessellateMethod,

    /// Points per curved segment; only used with
    /// [`TessellateMethod::Regular`].
    pub tessellate_resolution: u32,

    /// Output scale relative to the source drawing size.
    pub scale_factor: f64,

    /// Whether to drop outlines that trace the image frame.
    pub skip_border: bool,

    /// Maximum distance in pixels from an image edge for a curve to
    /// count as touching it.
    pub border_pixel_tolerance: f64,

    /// Minimum fraction of the image width/height a curve must span to
    /// be a border candidate.
    pub border_dimension_ratio: f64,
}

impl PipelineConfig {
    /// Default binarization threshold.
    pub const DEFAULT_THRESHOLD: u8 = 128;
    /// Default speckle suppression area in pixels.
    pub const DEFAULT_SPECKLE_SIZE: u32 = 2;
    /// Default outline simplification tolerance.
    pub const DEFAULT_OPT_TOLERANCE: f64 = 0.3;
    /// Default corner threshold.
    pub const DEFAULT_CORNER_ALPHA: f64 = 1.0;
    /// Largest meaningful corner threshold (no corners at all).
    pub const MAX_CORNER_ALPHA: f64 = 4.0 / 3.0;
    /// Default tessellation strategy.
    pub const DEFAULT_TESSELLATE_METHOD: TessellateMethod = TessellateMethod::Adaptive;
    /// Default points per segment for regular tessellation.
    pub const DEFAULT_TESSELLATE_RESOLUTION: u32 = 15;
    /// Default output scale.
    pub const DEFAULT_SCALE_FACTOR: f64 = 1.1;
    /// Default edge-proximity tolerance for border detection.
    pub const DEFAULT_BORDER_PIXEL_TOLERANCE: f64 = 5.0;
    /// Default span ratio for border detection.
    pub const DEFAULT_BORDER_DIMENSION_RATIO: f64 = 0.95;

    /// The tessellation strategy selected by this config.
    #[must_use]
    pub const fn tessellation(&self) -> Tessellation {
        match self.tessellate_method {
            TessellateMethod::Adaptive => Tessellation::Adaptive,
            TessellateMethod::Regular => Tessellation::Regular {
                resolution: self.tessellate_resolution,
            },
        }
    }

    /// Vectorizer parameters selected by this config.
    #[must_use]
    pub const fn trace_params(&self) -> TraceParams {
        TraceParams {
            speckle_size: self.speckle_size,
            opt_tolerance: self.opt_tolerance,
            corner_alpha: self.corner_alpha,
        }
    }

    /// Check that every field is within its meaningful range.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] naming the first
    /// offending field.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !self.scale_factor.is_finite() || self.scale_factor <= 0.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "scale_factor must be finite and positive, got {}",
                self.scale_factor
            )));
        }
        if !self.opt_tolerance.is_finite() || self.opt_tolerance < 0.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "opt_tolerance must be finite and non-negative, got {}",
                self.opt_tolerance
            )));
        }
        if !(0.0..=Self::MAX_CORNER_ALPHA).contains(&self.corner_alpha) {
            return Err(PipelineError::InvalidConfig(format!(
                "corner_alpha must be within 0.0..=4/3, got {}",
                self.corner_alpha
            )));
        }
        if self.tessellate_method == TessellateMethod::Regular && self.tessellate_resolution == 0 {
            return Err(PipelineError::InvalidConfig(
                "tessellate_resolution must be at least 1 for regular tessellation".to_string(),
            ));
        }
        if !self.border_pixel_tolerance.is_finite() || self.border_pixel_tolerance < 0.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "border_pixel_tolerance must be finite and non-negative, got {}",
                self.border_pixel_tolerance
            )));
        }
        if !(self.border_dimension_ratio > 0.0 && self.border_dimension_ratio <= 1.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "border_dimension_ratio must be within (0.0, 1.0], got {}",
                self.border_dimension_ratio
            )));
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            threshold: Self::DEFAULT_THRESHOLD,
            speckle_size: Self::DEFAULT_SPECKLE_SIZE,
            opt_tolerance: Self::DEFAULT_OPT_TOLERANCE,
            corner_alpha: Self::DEFAULT_CORNER_ALPHA,
            tessellate_method: Self::DEFAULT_TESSELLATE_METHOD,
            tessellate_resolution: Self::DEFAULT_TESSELLATE_RESOLUTION,
            scale_factor: Self::DEFAULT_SCALE_FACTOR,
            skip_border: true,
            border_pixel_tolerance: Self::DEFAULT_BORDER_PIXEL_TOLERANCE,
            border_dimension_ratio: Self::DEFAULT_BORDER_DIMENSION_RATIO,
        }
    }
}

/// Per-curve bookkeeping for one pipeline run.
///
/// Skipped curves are expected and common; they are counted here rather
/// than reported as failures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurveTally {
    /// Curves returned by the vectorizer.
    pub traced: usize,
    /// Curves that contributed actions.
    pub kept: usize,
    /// Curves whose tessellation produced no points.
    pub empty: usize,
    /// Curves with a single point, or whose points collapsed into one.
    pub too_few_points: usize,
    /// Curves classified as an image-frame artifact.
    pub border: usize,
}

/// Result of running the full pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawResult {
    /// Final actions in canvas pixel coordinates.
    pub actions: Vec<CanvasAction>,
    /// Dimensions of the source image in pixels.
    pub image: Dimensions,
    /// Dimensions of the target canvas in pixels.
    pub canvas: Dimensions,
    /// What happened to each traced curve.
    pub curves: CurveTally,
}

/// Errors that can occur during pipeline processing.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The image file does not exist.
    #[error("image file not found: {}", .0.display())]
    ImageNotFound(PathBuf),

    /// The image file exists but could not be read.
    #[error("failed to read image: {0}")]
    Io(#[from] std::io::Error),

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// The image format is unrecognized or the data is corrupt.
    #[error("unreadable image format: {0}")]
    UnreadableImageFormat(#[from] image::ImageError),

    /// Pipeline configuration is invalid.
    #[error("invalid pipeline configuration: {0}")]
    InvalidConfig(String),

    /// The vectorizer reported a failure.
    #[error("vectorization failed: {0}")]
    Vectorize(#[from] VectorizeError),

    /// The vectorizer produced no curves.
    #[error("no curves traced in the image")]
    NoCurvesTraced,

    /// Every curve was empty, too small, or classified as border.
    #[error("no drawable points survived filtering")]
    NoDrawablePoints,

    /// The combined drawing has near-zero width or height.
    #[error("drawing bounding box is degenerate ({width}x{height})")]
    DegenerateBoundingBox {
        /// Bounding box width in source pixels.
        width: f64,
        /// Bounding box height in source pixels.
        height: f64,
    },

    /// Scaling pushed a coordinate outside the integer canvas range.
    #[error("mapped coordinate ({x}, {y}) does not fit the canvas coordinate range")]
    CoordinateOutOfRange {
        /// Unrounded canvas x.
        x: f64,
        /// Unrounded canvas y.
        y: f64,
    },

    /// A collaborator panicked inside the pipeline.
    #[error("pipeline panicked: {0}")]
    Panicked(String),
}
