//! # Content Normalizer
//!
//! Turns raw chat markdown into the text the dispatcher matches commands
//! against.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.0.0: Fixed-font conversion, prefix collapse, first-line join, whitespace collapse

use regex::Regex;
use std::sync::OnceLock;

use super::fixed_font::{fixed_font_to_normal, is_fixed_font};

/// A first token on a line of its own, e.g. `">>echo\nhello"`
static FIRST_LINE_BREAK: OnceLock<Regex> = OnceLock::new();

fn first_line_break() -> &'static Regex {
    FIRST_LINE_BREAK.get_or_init(|| {
        Regex::new(r"\A([^ \r\n]+)\r?\n").expect("first-line pattern is valid")
    })
}

/// Result of [`normalize`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedContent {
    /// Text used for prefix and command detection
    pub text: String,
    /// Text before whitespace collapse; custom argument parsers read this
    pub pre_collapse: String,
    pub is_fixed_font: bool,
}

/// `prefix` followed by whitespace at the very start becomes just `prefix`
fn collapse_prefix(content: &str, prefix: &str) -> String {
    if prefix.is_empty() {
        return content.to_string();
    }
    let pattern = format!(r"\A{}\s+", regex::escape(prefix));
    match Regex::new(&pattern) {
        Ok(re) => re.replacen(content, 1, regex::NoExpand(prefix)).into_owned(),
        Err(_) => content.to_string(),
    }
}

/// Replace the line break after a space-free first line with one space
fn join_first_line(content: &str) -> String {
    first_line_break().replacen(content, 1, "$1 ").into_owned()
}

/// Collapse every whitespace run to a single space and trim
pub fn collapse_whitespace(content: &str) -> String {
    content.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize raw message content for command detection
///
/// Fixed-font content keeps its whitespace: only the fence/indent is removed,
/// the prefix collapsed, and the first line joined.
pub fn normalize(raw: &str, prefix: &str) -> NormalizedContent {
    let is_fixed_font = is_fixed_font(raw);
    let content = if is_fixed_font {
        fixed_font_to_normal(raw)
    } else {
        raw.to_string()
    };

    let content = collapse_prefix(&content, prefix);
    let pre_collapse = join_first_line(&content);

    let text = if is_fixed_font {
        pre_collapse.clone()
    } else {
        collapse_whitespace(&pre_collapse)
    };

    NormalizedContent {
        text,
        pre_collapse,
        is_fixed_font,
    }
}
