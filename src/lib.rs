//! whiten - Force SVG fills to white
//!
//! whiten rewrites the fill color of shape elements, inline styles and
//! `<style>` blocks so icon sets can be shown on dark backgrounds.

mod ast;
mod batch;
mod encoding;
mod error;
mod parse;
mod recolor;
mod serialize;

pub use ast::*;
pub use batch::*;
pub use encoding::*;
pub use error::*;
pub use parse::*;
pub use recolor::*;
pub use serialize::*;

/// Fill written by default.
pub const DEFAULT_COLOR: &str = "#ffffff";

/// File name suffix for recolored copies by default.
pub const DEFAULT_SUFFIX: &str = "_white";

/// Recoloring options.
#[derive(Debug, Clone)]
pub struct Options {
    /// Overwrite input files instead of writing suffixed copies
    pub overwrite: bool,
    /// Fill value to write (default: `#ffffff`)
    pub color: String,
    /// Suffix appended to the file stem of copies (default: `_white`)
    pub suffix: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            overwrite: false,
            color: DEFAULT_COLOR.to_string(),
            suffix: DEFAULT_SUFFIX.to_string(),
        }
    }
}
