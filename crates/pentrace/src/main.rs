//! pentrace: trace an image into pen actions and emit, export, or replay them.
//!
//! Loads an image, traces its dark shapes into curves, and converts them
//! into `move`/`drag` actions centered on a canvas. The actions can be
//! printed, written as a script or SVG, timed stage by stage, or replayed
//! against a dry-run pointer device.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin pentrace -- [OPTIONS] <IMAGE_PATH>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{ArgAction, Parser, ValueEnum};
use log::{LevelFilter, Log, Metadata, Record};
use pentrace_pipeline::diagnostics::{Clock, process_with_diagnostics};
use pentrace_pipeline::{
    CanvasAction, ContourVectorizer, Dimensions, ImageSource, PipelineConfig, PixelPoint,
    TessellateMethod,
};
use pentrace_playback::{DeviceError, PlaybackConfig, PlaybackReport, PointerDevice};

/// Convert an image into pen-up/pen-down pointer actions.
///
/// Traces the dark regions of the image, scales the drawing onto the
/// canvas, and prints one action per line. Repeat `-v` for more logging.
#[derive(Parser)]
#[command(name = "pentrace", version)]
struct Cli {
    /// Path to the input image (PNG, JPEG, BMP, WebP). Prompted for on
    /// stdin when omitted.
    image_path: Option<PathBuf>,

    /// Binarization cutoff; pixels darker than this are traced.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_THRESHOLD)]
    threshold: u8,

    /// Discard outlines enclosing fewer square pixels than this.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_SPECKLE_SIZE)]
    speckle_size: u32,

    /// Outline simplification tolerance in pixels.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_OPT_TOLERANCE)]
    opt_tolerance: f64,

    /// Corner threshold (0.0 = all corners, 1.333 = fully smooth).
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_CORNER_ALPHA)]
    corner_alpha: f64,

    /// How curves are turned into points.
    #[arg(long, value_enum, default_value_t = CLI_DEFAULT_METHOD)]
    tessellate_method: Method,

    /// Points per curved segment for regular tessellation.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_TESSELLATE_RESOLUTION, value_parser = clap::builder::RangedU64ValueParser::<u32>::new().range(1..))]
    tessellate_resolution: u32,

    /// Output scale relative to the traced drawing size.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_SCALE_FACTOR)]
    scale_factor: f64,

    /// Keep outlines that trace the image frame.
    #[arg(long)]
    keep_border: bool,

    /// Distance in pixels from an image edge that counts as touching it.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_BORDER_PIXEL_TOLERANCE)]
    border_pixel_tolerance: f64,

    /// Fraction of the image size a curve must span to count as a border.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_BORDER_DIMENSION_RATIO)]
    border_dimension_ratio: f64,

    /// Full pipeline config as a JSON string.
    ///
    /// When provided, all other pipeline parameter flags are ignored.
    /// The JSON must be a valid `PipelineConfig` serialization; missing
    /// fields take their defaults.
    #[arg(long)]
    config_json: Option<String>,

    /// Canvas width in pixels.
    #[arg(long, default_value_t = 1920, value_parser = clap::builder::RangedU64ValueParser::<u32>::new().range(1..))]
    canvas_width: u32,

    /// Canvas height in pixels.
    #[arg(long, default_value_t = 1080, value_parser = clap::builder::RangedU64ValueParser::<u32>::new().range(1..))]
    canvas_height: u32,

    /// Print actions as JSON instead of the line script.
    #[arg(long)]
    json: bool,

    /// Write the action script to file.
    #[arg(long)]
    script: Option<PathBuf>,

    /// Write an SVG preview to file.
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Print per-stage timing and counts to stderr.
    #[arg(long)]
    diagnostics: bool,

    /// Replay the actions against a dry-run pointer after a countdown.
    #[arg(long)]
    play: bool,

    /// Seconds to wait before playback starts.
    #[arg(long, default_value_t = PlaybackConfig::DEFAULT_START_DELAY.as_secs_f64())]
    start_delay: f64,

    /// Milliseconds to pause after each replayed action.
    #[arg(long, default_value_t = millis(PlaybackConfig::DEFAULT_ACTION_PAUSE))]
    action_pause: u64,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

/// Tessellation strategy selection.
#[derive(Clone, Copy, ValueEnum)]
enum Method {
    /// Subdivide until flat; more points on tight bends.
    Adaptive,
    /// A fixed number of points per curved segment.
    Regular,
}

const fn method_from_pipeline(m: TessellateMethod) -> Method {
    match m {
        TessellateMethod::Adaptive => Method::Adaptive,
        TessellateMethod::Regular => Method::Regular,
    }
}

/// Derived from [`PipelineConfig::DEFAULT_TESSELLATE_METHOD`] so the two
/// cannot silently diverge.
const CLI_DEFAULT_METHOD: Method =
    method_from_pipeline(PipelineConfig::DEFAULT_TESSELLATE_METHOD);

#[allow(clippy::cast_possible_truncation)]
const fn millis(d: Duration) -> u64 {
    d.as_millis() as u64
}

/// Build a [`PipelineConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored.
fn config_from_cli(cli: &Cli) -> Result<PipelineConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    Ok(PipelineConfig {
        threshold: cli.threshold,
        speckle_size: cli.speckle_size,
        opt_tolerance: cli.opt_tolerance,
        corner_alpha: cli.corner_alpha,
        tessellate_method: match cli.tessellate_method {
            Method::Adaptive => TessellateMethod::Adaptive,
            Method::Regular => TessellateMethod::Regular,
        },
        tessellate_resolution: cli.tessellate_resolution,
        scale_factor: cli.scale_factor,
        skip_border: !cli.keep_border,
        border_pixel_tolerance: cli.border_pixel_tolerance,
        border_dimension_ratio: cli.border_dimension_ratio,
    })
}

fn playback_from_cli(cli: &Cli) -> Result<PlaybackConfig, String> {
    let start_delay = Duration::try_from_secs_f64(cli.start_delay)
        .map_err(|e| format!("Invalid --start-delay {}: {e}", cli.start_delay))?;
    Ok(PlaybackConfig {
        action_pause: Duration::from_millis(cli.action_pause),
        start_delay,
    })
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };
    let playback = match playback_from_cli(&cli) {
        Ok(p) => p,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let image_path = match cli.image_path.clone() {
        Some(path) => path,
        None => match prompt_image_path(&mut io::stdin().lock()) {
            Ok(path) => path,
            Err(msg) => {
                eprintln!("{msg}");
                return ExitCode::FAILURE;
            }
        },
    };
    if let Err(msg) = check_image_path(&image_path) {
        eprintln!("{msg}");
        return ExitCode::FAILURE;
    }

    let canvas = Dimensions::new(cli.canvas_width, cli.canvas_height);
    let actions = if cli.diagnostics {
        match traced_with_diagnostics(&image_path, &config, canvas) {
            Ok(actions) => actions,
            Err(msg) => {
                eprintln!("{msg}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        pentrace_pipeline::run(
            &ImageSource::Path(image_path.clone()),
            &config,
            &canvas,
        )
    };

    if actions.is_empty() {
        eprintln!(
            "No actions generated from {}; run with -v for details",
            image_path.display()
        );
        return ExitCode::FAILURE;
    }
    eprintln!(
        "{} actions for a {}x{} canvas",
        actions.len(),
        canvas.width,
        canvas.height
    );

    if cli.json {
        match serde_json::to_string_pretty(&actions) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing actions: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        print!("{}", script_for(&image_path, &config, &actions));
    }

    let mut writes_ok = true;
    if let Some(ref path) = cli.script {
        writes_ok &= write_output("Script", path, &script_for(&image_path, &config, &actions));
    }

    if let Some(ref path) = cli.svg {
        let desc = format!("{config:#?}");
        let metadata = pentrace_export::SvgMetadata {
            title: Some(image_stem(&image_path)),
            description: Some(&desc),
        };
        writes_ok &= write_output(
            "SVG",
            path,
            &pentrace_export::to_svg(&actions, canvas, &metadata),
        );
    }
    if !writes_ok {
        return ExitCode::FAILURE;
    }

    if cli.play {
        return play(&actions, &playback);
    }

    ExitCode::SUCCESS
}

/// Ask for the image path on stderr and read one line from `input`.
fn prompt_image_path(input: &mut impl BufRead) -> Result<PathBuf, String> {
    eprint!("Enter the path to your image file: ");
    io::stderr().flush().ok();
    let mut line = String::new();
    input
        .read_line(&mut line)
        .map_err(|e| format!("Error reading image path: {e}"))?;
    let path = line.trim();
    if path.is_empty() {
        return Err("No image path given".to_string());
    }
    Ok(PathBuf::from(path))
}

/// Fail early with a readable message when the image path is unusable.
fn check_image_path(path: &Path) -> Result<(), String> {
    if !path.exists() {
        return Err(format!("Image not found: {}", path.display()));
    }
    if !path.is_file() {
        return Err(format!("Not a file: {}", path.display()));
    }
    Ok(())
}

/// Run the pipeline with stage timing and print the report to stderr.
fn traced_with_diagnostics(
    path: &Path,
    config: &PipelineConfig,
    canvas: Dimensions,
) -> Result<Vec<CanvasAction>, String> {
    let bytes = std::fs::read(path).map_err(|e| format!("Error reading {}: {e}", path.display()))?;
    eprintln!("Image: {} ({} bytes)", path.display(), bytes.len());
    eprintln!("Config: {config:#?}");
    eprintln!();

    let (result, diagnostics) =
        process_with_diagnostics(&bytes, config, &canvas, &ContourVectorizer, &StdClock)
            .map_err(|e| format!("Pipeline error: {e}"))?;
    eprintln!("{}", diagnostics.report());
    Ok(result.actions)
}

fn image_stem(path: &Path) -> &str {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("pentrace")
}

fn script_for(image_path: &Path, config: &PipelineConfig, actions: &[CanvasAction]) -> String {
    let config_json = serde_json::to_string(config).ok();
    let source = image_path.file_name().and_then(|s| s.to_str());
    let metadata = pentrace_export::ScriptMetadata {
        source,
        description: None,
        config_json: config_json.as_deref(),
    };
    pentrace_export::to_script(actions, &metadata)
}

/// Write `contents` to `path`, reporting the outcome on stderr.
///
/// Returns `false` if the write failed.
fn write_output(kind: &str, path: &Path, contents: &str) -> bool {
    match std::fs::write(path, contents) {
        Ok(()) => {
            eprintln!(
                "{kind} written to {} ({} bytes)",
                path.display(),
                contents.len(),
            );
            true
        }
        Err(e) => {
            eprintln!("Error writing {kind} to {}: {e}", path.display());
            false
        }
    }
}

/// Count down, then replay `actions` on a [`DryRunDevice`].
fn play(actions: &[CanvasAction], playback: &PlaybackConfig) -> ExitCode {
    eprintln!("Dry-run playback of {} actions", actions.len());
    pentrace_playback::countdown(playback.start_delay, |remaining| {
        eprintln!("  {}...", remaining.as_secs_f64().ceil());
    });

    let started = Instant::now();
    let mut device = DryRunDevice::default();
    let report = pentrace_playback::replay(&mut device, actions, playback);
    let elapsed = started.elapsed();

    match report {
        PlaybackReport::Completed { executed } => {
            eprintln!("Playback finished: {executed} actions in {elapsed:.2?}");
            ExitCode::SUCCESS
        }
        PlaybackReport::Cancelled { executed } => {
            eprintln!("Playback cancelled after {executed} actions");
            ExitCode::SUCCESS
        }
        PlaybackReport::Failed { executed, error } => {
            eprintln!("Playback failed after {executed} actions: {error}");
            ExitCode::FAILURE
        }
    }
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}

/// Pointer that logs commands and honors the pause without moving
/// anything.
#[derive(Default)]
struct DryRunDevice {
    pause: Duration,
    position: Option<PixelPoint>,
}

impl DryRunDevice {
    fn step(&mut self, verb: &str, to: PixelPoint) {
        log::trace!("{verb} {} {} (from {:?})", to.x, to.y, self.position);
        self.position = Some(to);
        std::thread::sleep(self.pause);
    }
}

impl PointerDevice for DryRunDevice {
    fn pause(&self) -> Duration {
        self.pause
    }

    fn set_pause(&mut self, pause: Duration) {
        self.pause = pause;
    }

    fn move_to(&mut self, to: PixelPoint) -> Result<(), DeviceError> {
        self.step("move", to);
        Ok(())
    }

    fn drag_to(&mut self, to: PixelPoint) -> Result<(), DeviceError> {
        self.step("drag", to);
        Ok(())
    }
}

/// Minimal [`Log`] implementation writing `LEVEL target: message` to
/// stderr.
struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if self.enabled(record.metadata()) {
            eprintln!("{:<5} {}: {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
    log::debug!("log level {level}");
}
