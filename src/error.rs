use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WhitenError {
    #[error("XML parsing error: {0}")]
    XmlParse(#[from] quick_xml::Error),

    #[error("Invalid SVG: {0}")]
    InvalidSvg(String),

    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("Path not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Directory walk error: {0}")]
    Walk(#[from] ignore::Error),
}

impl WhitenError {
    /// True for errors that mean the input is not a well-formed document.
    /// These skip the file; everything else aborts the run.
    pub fn is_parse_failure(&self) -> bool {
        matches!(
            self,
            WhitenError::XmlParse(_) | WhitenError::InvalidSvg(_) | WhitenError::Utf8(_)
        )
    }
}
