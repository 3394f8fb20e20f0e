//! Reply formatting and the chat single-line length limit
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.0.0: Reply references and over-limit splitting

use crate::transport::MessageId;

/// Longest single-line message the chat accepts, in characters
pub const SINGLE_LINE_LIMIT: usize = 500;

/// Sent ahead of a truncated single-line result
pub const TRUNCATION_NOTICE: &str = "Output would be longer than 500 characters (the limit for single-line messages), so only the first 500 characters are posted now.";

/// One message the pipeline wants posted in reply to a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingReply {
    pub text: String,
    /// Prefix the text with a `:<id> ` reference to the originating message
    pub reference: bool,
}

impl OutgoingReply {
    fn referenced(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            reference: true,
        }
    }
}

/// `:<id> `, the chat's reply marker
pub fn reply_prefix(id: MessageId) -> String {
    format!(":{id} ")
}

/// Text as it will appear in the room
pub fn render_reply(id: MessageId, text: &str, reference: bool) -> String {
    if reference {
        format!("{}{}", reply_prefix(id), text)
    } else {
        text.to_string()
    }
}

/// Turn a command result into the replies to post
///
/// Multi-line results are exempt from the single-line limit and go out
/// unreferenced. Over-limit single-line results become a notice followed by
/// as much of the result as fits next to the reference.
pub fn format_reply(id: MessageId, output: &str) -> Vec<OutgoingReply> {
    let prefix_len = reply_prefix(id).chars().count();
    let multi_line = output.contains('\n');

    if multi_line {
        return vec![OutgoingReply {
            text: output.to_string(),
            reference: false,
        }];
    }

    if prefix_len + output.chars().count() > SINGLE_LINE_LIMIT {
        let keep = SINGLE_LINE_LIMIT.saturating_sub(prefix_len);
        return vec![
            OutgoingReply::referenced(TRUNCATION_NOTICE),
            OutgoingReply::referenced(truncate_chars(output, keep)),
        ];
    }

    vec![OutgoingReply::referenced(output)]
}

/// First `max_chars` characters of `text` (UTF-8 safe)
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_reply_is_referenced() {
        let replies = format_reply(MessageId(12), "hello world");
        assert_eq!(replies, vec![OutgoingReply::referenced("hello world")]);
        assert_eq!(
            render_reply(MessageId(12), &replies[0].text, replies[0].reference),
            ":12 hello world"
        );
    }

    #[test]
    fn test_long_single_line_is_split() {
        let output = "a".repeat(600);
        let replies = format_reply(MessageId(5), &output);

        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0].text, TRUNCATION_NOTICE);
        let continuation = render_reply(MessageId(5), &replies[1].text, replies[1].reference);
        assert_eq!(continuation.chars().count(), SINGLE_LINE_LIMIT);
        assert_eq!(replies[1].text.len(), 497);
    }

    #[test]
    fn test_exactly_at_limit() {
        // ":5 " + 497 chars is exactly 500
        let output = "b".repeat(497);
        let replies = format_reply(MessageId(5), &output);
        assert_eq!(replies.len(), 1);
        assert!(replies[0].reference);
    }

    #[test]
    fn test_multi_line_is_exempt() {
        let output = format!("{}\n{}", "x".repeat(400), "y".repeat(400));
        let replies = format_reply(MessageId(5), &output);
        assert_eq!(replies.len(), 1);
        assert!(!replies[0].reference);
        assert_eq!(replies[0].text, output);
    }

    #[test]
    fn test_utf8_safety() {
        let output = "世界".repeat(300);
        let replies = format_reply(MessageId(5), &output);
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[1].text.chars().count(), 497);
    }

    #[test]
    fn test_truncate_chars_short_text() {
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abc", 2), "ab");
    }
}
