//! Integration test: run a synthesized drawing through the full pipeline
//! and export it to both output formats.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use pentrace_export::{ScriptMetadata, SvgMetadata, strokes, to_script, to_svg};
use pentrace_pipeline::{ContourVectorizer, Dimensions, PipelineConfig, process};

/// Two separate black squares on white.
fn two_squares_png() -> Vec<u8> {
    let img = image::RgbaImage::from_fn(120, 80, |x, y| {
        let left = (10..40).contains(&x) && (20..50).contains(&y);
        let right = (70..110).contains(&x) && (30..70).contains(&y);
        if left || right {
            image::Rgba([0, 0, 0, 255])
        } else {
            image::Rgba([255, 255, 255, 255])
        }
    });
    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png)
        .expect("PNG encoding should succeed");
    buf.into_inner()
}

#[test]
fn two_squares_pipeline_to_script_and_svg() {
    let config = PipelineConfig::default();
    let canvas = Dimensions::new(640, 480);
    let result = process(&two_squares_png(), &config, &canvas, &ContourVectorizer)
        .expect("pipeline should succeed");

    eprintln!(
        "Pipeline produced {} actions from {} curves",
        result.actions.len(),
        result.curves.kept,
    );
    assert_eq!(result.curves.kept, 2);
    assert_eq!(strokes(&result.actions).len(), 2);

    // Script: header plus one line per action.
    let config_json = serde_json::to_string(&config).unwrap();
    let script = to_script(
        &result.actions,
        &ScriptMetadata {
            source: Some("two-squares.png"),
            config_json: Some(&config_json),
            ..ScriptMetadata::default()
        },
    );
    let body: Vec<&str> = script.lines().filter(|l| !l.starts_with('#')).collect();
    assert_eq!(body.len(), result.actions.len());
    assert_eq!(body.iter().filter(|l| l.starts_with("move ")).count(), 2);
    assert!(script.starts_with("# pentrace\n# Source: two-squares.png\n"));

    // SVG: one path per stroke, viewBox is the canvas.
    let svg = to_svg(
        &result.actions,
        canvas,
        &SvgMetadata {
            title: Some("two-squares"),
            ..SvgMetadata::default()
        },
    );
    assert!(svg.contains(r#"viewBox="0 0 640 480""#));
    assert_eq!(svg.matches("<path").count(), 2);
}
