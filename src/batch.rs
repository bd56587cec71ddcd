//! Batch processing of SVG files.

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use tracing::info;

use crate::Options;
use crate::error::WhitenError;
use crate::recolor::recolor_file;

/// Result of a batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    /// Files that were recolored and written
    pub changed: usize,
    /// Files considered, including ones skipped as invalid
    pub total: usize,
}

/// Find the SVG files to process under `input`.
///
/// A file is returned as is. A directory yields its `*.svg` files, descending
/// into subdirectories only when `recursive` is set. Results are sorted by path.
pub fn discover(input: &Path, recursive: bool) -> Result<Vec<PathBuf>, WhitenError> {
    if !input.exists() {
        return Err(WhitenError::InputNotFound(input.to_path_buf()));
    }
    if !input.is_dir() {
        return Ok(vec![input.to_path_buf()]);
    }

    let mut builder = WalkBuilder::new(input);
    builder.standard_filters(false);
    if !recursive {
        builder.max_depth(Some(1));
    }

    let mut files = Vec::new();
    for entry in builder.build() {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && is_svg(path) {
            files.push(path.to_path_buf());
        }
    }
    files.sort();

    Ok(files)
}

/// Recolor every file in order, counting how many were changed.
pub fn run(files: &[PathBuf], options: &Options) -> Result<Summary, WhitenError> {
    let mut summary = Summary::default();

    for file in files {
        summary.total += 1;
        if recolor_file(file, options)? {
            info!("Recolored {}", file.display());
            summary.changed += 1;
        }
    }

    Ok(summary)
}

fn is_svg(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(".svg"))
}
