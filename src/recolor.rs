//! Fill recoloring passes.
//!
//! A document goes through three passes:
//!
//! 1. shape elements get a `fill` attribute set to the target color, unless
//!    they explicitly say `fill="none"`;
//! 2. `fill` declarations inside `style` attributes are rewritten;
//! 3. `fill` declarations inside SVG `<style>` blocks are rewritten.
//!
//! Style strings are patched textually, not parsed as CSS. Comments,
//! `url(...)` values and `!important` get no special treatment.

use std::borrow::Cow;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::Options;
use crate::ast::*;
use crate::encoding::decode_svg;
use crate::error::WhitenError;
use crate::parse::parse_svg;
use crate::serialize::serialize;

/// Local names of elements whose `fill` attribute gets overridden.
pub const SHAPE_TAGS: [&str; 6] = ["path", "rect", "circle", "polygon", "ellipse", "g"];

static RE_STYLE_FILL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(fill\s*:\s*)([^;}]*)").expect("valid fill regex"));

/// Recolor the SVG file at `path`.
///
/// Returns `Ok(true)` if the document changed and was written out.
/// Files that fail to parse are logged and reported as unchanged. I/O errors
/// propagate.
pub fn recolor_file(path: &Path, options: &Options) -> Result<bool, WhitenError> {
    let bytes = fs::read(path)?;

    let output = match decode_svg(&bytes).and_then(|svg| recolor_str(&svg, options)) {
        Ok(output) => output,
        Err(e) if e.is_parse_failure() => {
            warn!("Skipped (invalid SVG?): {}: {}", path.display(), e);
            return Ok(false);
        }
        Err(e) => return Err(e),
    };

    let Some(output) = output else {
        debug!("No fills to change in {}", path.display());
        return Ok(false);
    };

    let out_path = output_path(path, options);
    fs::write(&out_path, output)?;
    debug!("Wrote {}", out_path.display());
    Ok(true)
}

/// Recolor an SVG string. Returns `None` if nothing needed to change.
pub fn recolor_str(svg: &str, options: &Options) -> Result<Option<String>, WhitenError> {
    let mut doc = parse_svg(svg)?;
    if recolor_document(&mut doc, options) {
        Ok(Some(serialize(&doc)))
    } else {
        Ok(None)
    }
}

/// Run all recoloring passes over the document. Returns true if anything changed.
pub fn recolor_document(doc: &mut Document, options: &Options) -> bool {
    let color = options.color.as_str();
    let mut changed = false;

    changed |= recolor_shape_fills(doc, color);
    changed |= recolor_inline_styles(doc, color);
    changed |= recolor_style_blocks(doc, color);

    changed
}

/// Set `fill` on every shape element that isn't explicitly `fill="none"`.
fn recolor_shape_fills(doc: &mut Document, color: &str) -> bool {
    let mut changed = false;
    doc.for_each_element_mut(|elem| {
        if !SHAPE_TAGS.contains(&elem.name.local.as_str()) {
            return;
        }
        let keep = elem
            .get_attr("fill")
            .is_some_and(|fill| is_none(fill) || fill == color);
        if !keep {
            elem.set_attr("fill", color);
            changed = true;
        }
    });
    changed
}

fn recolor_inline_styles(doc: &mut Document, color: &str) -> bool {
    let mut changed = false;
    doc.for_each_element_mut(|elem| {
        let Some(style) = elem.get_attr("style") else {
            return;
        };
        let new_style = match rewrite_style_fills(style, color) {
            Cow::Owned(s) => s,
            Cow::Borrowed(_) => return,
        };
        elem.set_attr("style", new_style);
        changed = true;
    });
    changed
}

fn recolor_style_blocks(doc: &mut Document, color: &str) -> bool {
    let mut changed = false;
    doc.for_each_element_ns_mut(|elem, ns| {
        if !elem.is("style") || ns != Some(SVG_NS) {
            return;
        }
        for child in &mut elem.children {
            let css = match child {
                Node::Text(t) => t,
                Node::CData(t) => t,
                _ => continue,
            };
            let new_css = match rewrite_style_fills(css, color) {
                Cow::Owned(s) => s,
                Cow::Borrowed(_) => continue,
            };
            *css = new_css;
            changed = true;
        }
    });
    changed
}

/// Replace the value of every `fill:` declaration in a style string.
///
/// Returns `Cow::Owned` only when the text actually differs.
pub fn rewrite_style_fills<'a>(style: &'a str, color: &str) -> Cow<'a, str> {
    let replaced = RE_STYLE_FILL.replace_all(style, |caps: &regex::Captures| {
        format!("{}{}", &caps[1], color)
    });
    match replaced {
        Cow::Owned(s) if s == style => Cow::Borrowed(style),
        other => other,
    }
}

/// Where the recolored copy of `path` is written.
///
/// With `overwrite` this is `path` itself, otherwise a sibling named
/// `<stem><suffix><ext>`, e.g. `icon.svg` -> `icon_white.svg`.
pub fn output_path(path: &Path, options: &Options) -> PathBuf {
    if options.overwrite {
        return path.to_path_buf();
    }

    let mut name = OsString::new();
    if let Some(stem) = path.file_stem() {
        name.push(stem);
    }
    name.push(&options.suffix);
    if let Some(ext) = path.extension() {
        name.push(".");
        name.push(ext);
    }
    path.with_file_name(name)
}

fn is_none(fill: &str) -> bool {
    fill.trim().eq_ignore_ascii_case("none")
}
