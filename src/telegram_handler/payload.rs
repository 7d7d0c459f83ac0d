//! `sendMessage` request body.

use serde::Serialize;

/// JSON body posted to the Bot API.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct SendMessage<'a> {
    pub chat_id: &'a str,
    pub text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<&'static str>,
}

impl<'a> SendMessage<'a> {
    /// Build a body whose text is cut to at most `max_chars` characters.
    pub fn new(
        chat_id: &'a str,
        text: &'a str,
        max_chars: usize,
        parse_mode: Option<&'static str>,
    ) -> Self {
        Self {
            chat_id,
            text: truncate_chars(text, max_chars),
            parse_mode,
        }
    }
}

/// Return the first `max_chars` characters of `text`.
///
/// Counts Unicode scalar values, so the cut never splits a code point. No
/// marker is appended.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
