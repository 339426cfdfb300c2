//! SVG export serializer.
//!
//! Renders canvas-space actions as an SVG preview using the [`svg`]
//! crate for document construction, XML escaping, and path data
//! formatting.
//!
//! Every stroke (a `Move` and the `Drag`s that follow it) becomes a
//! separate `<path>` element using `M` (move to) and `L` (line to)
//! commands. The `viewBox` is the canvas, so the preview shows exactly
//! where the pointer would travel, including any out-of-canvas overhang.
//!
//! Optional [`SvgMetadata`] embeds `<title>` and `<desc>` elements.
//!
//! This is a pure function with no I/O -- it returns a `String`.

use svg::Document;
use svg::node::element::path::Data;
use svg::node::element::{Description, Path, Title};
use svg::node::{Text, Value};

use pentrace_pipeline::{CanvasAction, Dimensions};

/// Metadata to embed in the SVG document.
///
/// Both fields are optional. When present, a `<title>` and/or `<desc>`
/// element is emitted immediately after the opening `<svg>` tag.
///
/// Text values are XML-escaped automatically by the `svg` crate.
#[derive(Debug, Clone, Default)]
pub struct SvgMetadata<'a> {
    /// Document title: emitted as `<title>`.
    ///
    /// Typically the source image filename (without extension).
    pub title: Option<&'a str>,

    /// Document description: emitted as `<desc>`.
    pub description: Option<&'a str>,
}

/// Split an action list into strokes, each starting at a `Move`.
///
/// Leading `Drag`s with no preceding `Move` form their own stroke.
#[must_use]
pub fn strokes(actions: &[CanvasAction]) -> Vec<&[CanvasAction]> {
    let mut out = Vec::new();
    let mut start = 0;
    for (i, action) in actions.iter().enumerate().skip(1) {
        if action.is_move() {
            out.push(&actions[start..i]);
            start = i;
        }
    }
    if start < actions.len() {
        out.push(&actions[start..]);
    }
    out
}

/// Build SVG path data for one stroke.
///
/// Returns an empty string for strokes with fewer than 2 actions.
#[must_use]
pub fn build_path_data(stroke: &[CanvasAction]) -> String {
    let [first, rest @ ..] = stroke else {
        return String::new();
    };
    if rest.is_empty() {
        return String::new();
    }

    let p = first.point();
    let mut data = Data::new().move_to((p.x, p.y));
    for action in rest {
        let p = action.point();
        data = data.line_to((p.x, p.y));
    }
    String::from(Value::from(data))
}

/// Serialize actions into an SVG string.
///
/// The document is `canvas.width` x `canvas.height` with a matching
/// `viewBox`. Strokes with a single action are skipped (a lone pen-up
/// move draws nothing).
///
/// # Examples
///
/// ```
/// use pentrace_pipeline::{Action, Dimensions, PixelPoint};
/// use pentrace_export::{SvgMetadata, to_svg};
///
/// let actions = [
///     Action::Move(PixelPoint::new(10, 15)),
///     Action::Drag(PixelPoint::new(12, 18)),
/// ];
/// let metadata = SvgMetadata {
///     title: Some("cat"),
///     description: Some("Exported by pentrace"),
/// };
/// let svg = to_svg(&actions, Dimensions::new(800, 600), &metadata);
/// assert!(svg.contains("<title>cat</title>"));
/// assert!(svg.contains("M10,15 L12,18"));
/// ```
#[must_use]
pub fn to_svg(
    actions: &[CanvasAction],
    canvas: Dimensions,
    metadata: &SvgMetadata<'_>,
) -> String {
    let (w, h) = (canvas.width, canvas.height);
    let mut doc = Document::new()
        .set("width", w)
        .set("height", h)
        .set("viewBox", (0, 0, w, h));

    if let Some(title) = metadata.title {
        doc = doc.add(Title::new(title));
    }
    if let Some(description) = metadata.description {
        doc = doc.add(Description::new().add(Text::new(description)));
    }

    for stroke in strokes(actions) {
        let d = build_path_data(stroke);
        if d.is_empty() {
            continue;
        }
        let path = Path::new()
            .set("d", d)
            .set("fill", "none")
            .set("stroke", "black")
            .set("stroke-width", 1);
        doc = doc.add(path);
    }

    // The svg crate omits the XML declaration, so we prepend it.
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{doc}\n")
}
