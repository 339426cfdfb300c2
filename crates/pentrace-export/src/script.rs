//! Action script serializer.
//!
//! Writes one action per line so a recorded drawing can be inspected,
//! diffed, or replayed by a tool other than `pentrace`:
//!
//! ```text
//! # pentrace
//! # Source: cat.png
//! # Config: {"threshold":128,...}
//! move 75 75
//! drag 125 75
//! ```
//!
//! Lines beginning with `#` are metadata comments. Coordinates are
//! integer canvas pixels; negative values are legal.
//!
//! This is a pure function with no I/O; it returns a `String`.

use std::fmt::Write;

use pentrace_pipeline::{Action, CanvasAction};

/// Metadata to embed as `#`-prefixed comment lines at the top of the
/// script.
///
/// All fields are optional. Multi-line values produce one comment line
/// per input line.
#[derive(Debug, Clone, Default)]
pub struct ScriptMetadata<'a> {
    /// Source image filename: emitted as `# Source: <filename>`.
    pub source: Option<&'a str>,

    /// Free-form description: emitted as a plain `#` comment.
    pub description: Option<&'a str>,

    /// Full `PipelineConfig` JSON: emitted as `# Config: <json>`.
    ///
    /// Allows re-running with the exact settings that produced the file.
    pub config_json: Option<&'a str>,
}

/// Serialize actions into the line-oriented script format.
///
/// # Examples
///
/// ```
/// use pentrace_pipeline::{Action, PixelPoint};
/// use pentrace_export::{ScriptMetadata, to_script};
///
/// let actions = [
///     Action::Move(PixelPoint::new(10, 15)),
///     Action::Drag(PixelPoint::new(-2, 18)),
/// ];
/// let script = to_script(&actions, &ScriptMetadata::default());
/// assert_eq!(script, "# pentrace\nmove 10 15\ndrag -2 18\n");
/// ```
#[must_use]
pub fn to_script(actions: &[CanvasAction], metadata: &ScriptMetadata<'_>) -> String {
    let mut out = String::new();

    // --- Metadata header ---
    let _ = writeln!(out, "# pentrace");
    if let Some(source) = metadata.source {
        for line in source.lines() {
            let _ = writeln!(out, "# Source: {line}");
        }
    }
    if let Some(description) = metadata.description {
        for line in description.lines() {
            let _ = writeln!(out, "# {line}");
        }
    }
    if let Some(config_json) = metadata.config_json {
        for line in config_json.lines() {
            let _ = writeln!(out, "# Config: {line}");
        }
    }

    // --- Actions ---
    for action in actions {
        let (verb, p) = match action {
            Action::Move(p) => ("move", p),
            Action::Drag(p) => ("drag", p),
        };
        let _ = writeln!(out, "{verb} {} {}", p.x, p.y);
    }

    out
}

#[cfg(test)]
mod tests {
    use pentrace_pipeline::PixelPoint;

    use super::*;

    #[test]
    fn empty_actions_produce_header_only() {
        assert_eq!(to_script(&[], &ScriptMetadata::default()), "# pentrace\n");
    }

    #[test]
    fn every_action_is_one_line() {
        let actions = [
            Action::Move(PixelPoint::new(1, 2)),
            Action::Drag(PixelPoint::new(3, 4)),
            Action::Drag(PixelPoint::new(5, 6)),
            Action::Move(PixelPoint::new(0, 0)),
        ];
        let script = to_script(&actions, &ScriptMetadata::default());
        let body: Vec<&str> = script.lines().filter(|l| !l.starts_with('#')).collect();
        assert_eq!(body, ["move 1 2", "drag 3 4", "drag 5 6", "move 0 0"]);
    }

    #[test]
    fn metadata_lines_precede_actions() {
        let metadata = ScriptMetadata {
            source: Some("cat.png"),
            description: Some("scale 1.1\nthreshold 128"),
            config_json: Some(r#"{"threshold":128}"#),
        };
        let script = to_script(&[Action::Move(PixelPoint::new(7, 8))], &metadata);
        let lines: Vec<&str> = script.lines().collect();
        assert_eq!(
            lines,
            [
                "# pentrace",
                "# Source: cat.png",
                "# scale 1.1",
                "# threshold 128",
                r#"# Config: {"threshold":128}"#,
                "move 7 8",
            ]
        );
    }

    #[test]
    fn negative_coordinates_are_written_verbatim() {
        let script = to_script(
            &[Action::Drag(PixelPoint::new(-40, -1))],
            &ScriptMetadata::default(),
        );
        assert!(script.ends_with("drag -40 -1\n"));
    }
}
