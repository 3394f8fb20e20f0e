//! Fixed-font (verbatim) message detection
//!
//! The chat renders a message in fixed font when every line is indented by
//! four spaces or a tab, or when the whole message is one code fence.

const FENCE: &str = "```";

/// Split into lines, dropping the `\r` of `\r\n` endings
fn lines(content: &str) -> impl Iterator<Item = &str> {
    content
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
}

fn strip_indent(line: &str) -> Option<&str> {
    line.strip_prefix("    ").or_else(|| line.strip_prefix('\t'))
}

fn is_indented_block(content: &str) -> bool {
    let mut has_text = false;
    for line in lines(content) {
        match strip_indent(line) {
            Some(rest) => has_text |= !rest.trim().is_empty(),
            None => return false,
        }
    }
    has_text
}

fn is_fenced_block(content: &str) -> bool {
    let all: Vec<&str> = lines(content).collect();
    all.len() >= 3
        && all[0].trim_end().starts_with(FENCE)
        && all[all.len() - 1].trim() == FENCE
}

/// Whether the whole message renders as one verbatim block
pub fn is_fixed_font(content: &str) -> bool {
    is_indented_block(content) || is_fenced_block(content)
}

/// Plain-text equivalent of a fixed-font message
///
/// Removes exactly one indent unit per line (or the fence lines). Everything
/// else, including inner whitespace and blank lines, is kept as written.
/// Content that is not fixed font is returned unchanged.
pub fn fixed_font_to_normal(content: &str) -> String {
    if is_indented_block(content) {
        lines(content)
            .map(|line| strip_indent(line).unwrap_or(line))
            .collect::<Vec<_>>()
            .join("\n")
    } else if is_fenced_block(content) {
        let all: Vec<&str> = lines(content).collect();
        all[1..all.len() - 1].join("\n")
    } else {
        content.to_string()
    }
}
