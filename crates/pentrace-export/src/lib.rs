//! pentrace-export: Pure serializers for action lists (sans-IO)
//!
//! Converts canvas-space actions into output formats: a line-oriented
//! action script and an SVG preview. Every function returns a `String`;
//! writing files is the caller's concern.

pub mod script;
pub mod svg;

pub use script::{ScriptMetadata, to_script};
pub use svg::{SvgMetadata, strokes, to_svg};
