//! Pipeline diagnostics: timing, counts, and other metrics for each stage.
//!
//! [`process_with_diagnostics`] runs the same stages as
//! [`crate::process`] while timing each one with a caller-supplied
//! [`Clock`]. The library never reads the system time itself, so tests
//! can drive it with a fake clock.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::canvas::Canvas;
use crate::pipeline::{Pipeline, PipelineStage};
use crate::trace::Vectorizer;
use crate::types::{CurveTally, Dimensions, DrawResult, PipelineConfig, PipelineError};

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Source of timestamps for stage timing.
pub trait Clock {
    /// Opaque point in time.
    type Instant;

    /// The current instant.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Diagnostics collected from a single pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    /// Stage 1: image decoding and grayscale conversion.
    pub decode: StageDiagnostics,
    /// Stage 2: thresholding.
    pub binarize: StageDiagnostics,
    /// Stage 3: vectorization.
    pub trace: StageDiagnostics,
    /// Stage 4: sampling, filtering and action emission.
    pub emit: StageDiagnostics,
    /// Stage 5: canvas mapping.
    pub map: StageDiagnostics,
    /// Total wall-clock duration of the entire pipeline (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts across all stages.
    pub summary: PipelineSummary,
}

/// Diagnostics for a single pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics (counts, sizes, etc.).
    pub metrics: StageMetrics,
}

/// Stage-specific metrics that vary by pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Image decoding metrics.
    Decode {
        /// Size of the input image bytes.
        input_bytes: usize,
        /// Decoded image width in pixels.
        width: u32,
        /// Decoded image height in pixels.
        height: u32,
        /// Total pixel count (`width * height`).
        pixel_count: u64,
    },
    /// Thresholding metrics.
    Binarize {
        /// Luma cutoff used.
        threshold: u8,
        /// Pixels classified as foreground.
        foreground_pixels: u64,
        /// Total pixel count for computing coverage.
        total_pixels: u64,
    },
    /// Vectorization metrics.
    Trace {
        /// Number of curves returned by the vectorizer.
        curve_count: usize,
        /// Straight segments across all curves.
        line_count: usize,
        /// Bezier segments across all curves.
        bezier_count: usize,
    },
    /// Action emission metrics.
    Emit {
        /// Per-curve outcomes.
        curves: CurveTally,
        /// Raw actions emitted.
        action_count: usize,
        /// Pen-up moves among them.
        move_count: usize,
    },
    /// Canvas mapping metrics.
    Map {
        /// Scale applied to the drawing.
        scale_factor: f64,
        /// Drawing width in source pixels.
        source_width: f64,
        /// Drawing height in source pixels.
        source_height: f64,
        /// Target canvas size.
        canvas: Dimensions,
        /// Actions that landed outside the canvas.
        out_of_canvas: usize,
    },
}

/// High-level summary counts for the entire pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Source image width in pixels.
    pub image_width: u32,
    /// Source image height in pixels.
    pub image_height: u32,
    /// Total pixel count.
    pub pixel_count: u64,
    /// Per-curve outcomes.
    pub curves: CurveTally,
    /// Actions in the final output.
    pub final_action_count: usize,
}

impl PipelineDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Pipeline Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Image: {}x{} ({} pixels)",
            self.summary.image_width, self.summary.image_height, self.summary.pixel_count,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<24} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);
        let stages = [
            ("Decode", &self.decode),
            ("Binarize", &self.binarize),
            ("Trace", &self.trace),
            ("Emit", &self.emit),
            ("Map", &self.map),
        ];
        for (name, diag) in stages {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<24} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        let curves = &self.summary.curves;
        lines.push(String::new());
        lines.push(format!(
            "Curves: {} traced, {} kept  |  Final actions: {}",
            curves.traced, curves.kept, self.summary.final_action_count,
        ));

        lines.join("\n")
    }
}

/// Run the full pipeline, timing each stage with `clock`.
///
/// Produces the same [`DrawResult`] as [`crate::process`].
///
/// # Errors
///
/// Returns the same errors as [`crate::process`].
pub fn process_with_diagnostics<C: Clock>(
    image_bytes: &[u8],
    config: &PipelineConfig,
    canvas: &impl Canvas,
    vectorizer: &impl Vectorizer,
    clock: &C,
) -> Result<(DrawResult, PipelineDiagnostics), PipelineError> {
    config.validate()?;
    let run_start = clock.now();

    let (decoded, decode) = timed(clock, || {
        Pipeline::new(image_bytes.to_vec(), config.clone()).decode()
    })?;
    let (binarized, binarize) = timed(clock, || Ok(decoded.binarize()))?;
    let (traced, trace) = timed(clock, || binarized.trace(vectorizer))?;
    let (emitted, emit) = timed(clock, || traced.emit())?;
    let (mapped, map) = timed(clock, || emitted.map(canvas))?;

    let result = mapped.into_result();
    let total_duration = clock.elapsed(&run_start);
    let summary = PipelineSummary {
        image_width: result.image.width,
        image_height: result.image.height,
        pixel_count: u64::from(result.image.width) * u64::from(result.image.height),
        curves: result.curves,
        final_action_count: result.actions.len(),
    };

    Ok((
        result,
        PipelineDiagnostics {
            decode,
            binarize,
            trace,
            emit,
            map,
            total_duration,
            summary,
        },
    ))
}

/// Run one stage transition and capture its duration and metrics.
fn timed<C: Clock, S: PipelineStage>(
    clock: &C,
    advance: impl FnOnce() -> Result<S, PipelineError>,
) -> Result<(S, StageDiagnostics), PipelineError> {
    let start = clock.now();
    let stage = advance()?;
    let duration = clock.elapsed(&start);
    log::debug!(
        "stage {} ({}) finished in {:.3}ms",
        S::INDEX,
        S::NAME,
        duration_ms(duration)
    );
    let metrics = stage.metrics();
    Ok((stage, StageDiagnostics { duration, metrics }))
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Decode {
            input_bytes,
            width,
            height,
            ..
        } => {
            format!("{input_bytes} bytes -> {width}x{height}")
        }
        StageMetrics::Binarize {
            threshold,
            foreground_pixels,
            total_pixels,
        } => {
            #[allow(clippy::cast_precision_loss)]
            let coverage = if *total_pixels > 0 {
                *foreground_pixels as f64 / *total_pixels as f64 * 100.0
            } else {
                0.0
            };
            format!("threshold={threshold} foreground={foreground_pixels} ({coverage:.1}%)")
        }
        StageMetrics::Trace {
            curve_count,
            line_count,
            bezier_count,
        } => {
            format!("{curve_count} curves, {line_count} lines, {bezier_count} beziers")
        }
        StageMetrics::Emit {
            curves,
            action_count,
            move_count,
        } => {
            format!(
                "kept {}/{} (empty={} few={} border={}) {action_count} actions, {move_count} moves",
                curves.kept, curves.traced, curves.empty, curves.too_few_points, curves.border,
            )
        }
        StageMetrics::Map {
            scale_factor,
            source_width,
            source_height,
            canvas,
            out_of_canvas,
        } => {
            format!(
                "{source_width:.1}x{source_height:.1} x{scale_factor:.2} -> {}x{} canvas, {out_of_canvas} outside",
                canvas.width, canvas.height,
            )
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::pipeline::tests::{FixedVectorizer, blank_png, rect};

    /// Clock that advances one millisecond every time it is read.
    struct TickClock(Cell<u64>);

    impl Clock for TickClock {
        type Instant = u64;

        fn now(&self) -> u64 {
            let t = self.0.get();
            self.0.set(t + 1);
            t
        }

        fn elapsed(&self, since: &u64) -> Duration {
            Duration::from_millis(self.now() - since)
        }
    }

    fn run() -> (DrawResult, PipelineDiagnostics) {
        let config = PipelineConfig {
            scale_factor: 1.0,
            ..PipelineConfig::default()
        };
        process_with_diagnostics(
            &blank_png(100, 100),
            &config,
            &Dimensions::new(200, 200),
            &FixedVectorizer(vec![rect(25.0, 25.0, 75.0, 75.0)]),
            &TickClock(Cell::new(0)),
        )
        .unwrap()
    }

    #[test]
    fn duration_ms_converts_correctly() {
        let d = Duration::from_millis(1234);
        let ms = duration_ms(d);
        assert!((ms - 1234.0).abs() < 0.01);
    }

    #[test]
    fn diagnostics_match_result() {
        let (result, diag) = run();
        assert_eq!(diag.summary.final_action_count, result.actions.len());
        assert_eq!(diag.summary.curves, result.curves);
        assert_eq!(diag.summary.pixel_count, 10_000);
        assert!(matches!(
            diag.decode.metrics,
            StageMetrics::Decode {
                width: 100,
                height: 100,
                ..
            }
        ));
        assert!(matches!(
            diag.map.metrics,
            StageMetrics::Map {
                out_of_canvas: 0,
                ..
            }
        ));
    }

    #[test]
    fn each_stage_is_timed_with_the_clock() {
        let (_, diag) = run();
        for stage in [&diag.decode, &diag.binarize, &diag.trace, &diag.emit, &diag.map] {
            assert_eq!(stage.duration, Duration::from_millis(1));
        }
        // run_start, five stages with two reads each, and the final read.
        assert_eq!(diag.total_duration, Duration::from_millis(11));
    }

    #[test]
    fn invalid_config_fails_before_timing() {
        let config = PipelineConfig {
            scale_factor: 0.0,
            ..PipelineConfig::default()
        };
        let result = process_with_diagnostics(
            &blank_png(10, 10),
            &config,
            &Dimensions::new(10, 10),
            &FixedVectorizer(Vec::new()),
            &TickClock(Cell::new(0)),
        );
        assert!(matches!(result, Err(PipelineError::InvalidConfig(_))));
    }

    #[test]
    fn report_lists_every_stage() {
        let (_, diag) = run();
        let report = diag.report();
        assert!(report.contains("Pipeline Diagnostics Report"));
        for name in ["Decode", "Binarize", "Trace", "Emit", "Map"] {
            assert!(report.contains(name), "missing {name} in:\n{report}");
        }
        assert!(report.contains("Curves: 1 traced, 1 kept"));
    }

    #[test]
    fn diagnostics_serialize_durations_as_seconds() {
        let (_, diag) = run();
        let json = serde_json::to_value(&diag).unwrap();
        assert!((json["total_duration"].as_f64().unwrap() - 0.011).abs() < 1e-9);
        let back: PipelineDiagnostics = serde_json::from_value(json).unwrap();
        assert_eq!(back.emit.metrics, diag.emit.metrics);
    }
}
