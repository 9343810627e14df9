//! Inline markup tokenizer. Splits AI feedback text into typed segments.
//!
//! Supported syntax: `**bold**`, `~~strike~~`, `*italic*` / `_italic_`, `` `code` `` and line breaks.
//! There is no nesting and no escaping: delimited content is kept literally, and any delimiter
//! that has no partner degrades to a one-character plain text segment.
//!
//! At each scan position the patterns are tried in a fixed order and the first match wins:
//! newline, bold, strikethrough, italic, inline code, plain-text run, single-character fallback.

use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Classification of a single segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    #[serde(rename = "text")]
    PlainText,
    Bold,
    Italic,
    Strikethrough,
    #[serde(rename = "code")]
    InlineCode,
    #[serde(rename = "linebreak")]
    LineBreak,
    /// Any kind name this build does not know. Never produced by `tokenize`; only reachable
    /// when segments are deserialized from a client. Rendered as plain text.
    #[serde(other)]
    Unknown,
}

/// One classified piece of the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    #[serde(rename = "type")]
    pub kind: SegmentKind,
    /// Inner payload. Delimiters are stripped; a line break carries `"\n"`.
    pub content: String,
    /// Byte range of the whole match (delimiters included) in the tokenized input.
    pub span: Range<usize>,
}

impl Segment {
    fn new(kind: SegmentKind, content: &str, span: Range<usize>) -> Self {
        Self {
            kind,
            content: content.to_string(),
            span,
        }
    }
}

/// Tokenizes `text` left to right. Total over all strings; empty input yields no segments.
pub fn tokenize(text: &str) -> Vec<Segment> {
    let bytes = text.as_bytes();
    let mut segments = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let segment = match_at(text, pos);
        pos = segment.span.end;
        segments.push(segment);
    }

    segments
}

fn match_at(text: &str, pos: usize) -> Segment {
    let bytes = text.as_bytes();

    if bytes[pos] == b'\n' {
        return Segment::new(SegmentKind::LineBreak, "\n", pos..pos + 1);
    }

    // All delimiters are ASCII, so every offset computed below sits on a char boundary.
    if let Some(end) = delimited(bytes, pos, b"**") {
        return Segment::new(SegmentKind::Bold, &text[pos + 2..end - 2], pos..end);
    }
    if let Some(end) = delimited(bytes, pos, b"~~") {
        return Segment::new(SegmentKind::Strikethrough, &text[pos + 2..end - 2], pos..end);
    }
    if let Some(end) = delimited(bytes, pos, b"*").or_else(|| delimited(bytes, pos, b"_")) {
        return Segment::new(SegmentKind::Italic, &text[pos + 1..end - 1], pos..end);
    }
    if let Some(end) = delimited(bytes, pos, b"`") {
        return Segment::new(SegmentKind::InlineCode, &text[pos + 1..end - 1], pos..end);
    }

    let run_end = plain_run_end(bytes, pos);
    if run_end > pos {
        return Segment::new(SegmentKind::PlainText, &text[pos..run_end], pos..run_end);
    }

    let char_end = pos + text[pos..].chars().next().map_or(1, char::len_utf8);
    Segment::new(SegmentKind::PlainText, &text[pos..char_end], pos..char_end)
}

/// Matches `delim content delim` starting at `pos`, where `content` is non-empty and free of the
/// delimiter's character. Returns the exclusive end offset of the closing delimiter.
fn delimited(bytes: &[u8], pos: usize, delim: &[u8]) -> Option<usize> {
    if !bytes[pos..].starts_with(delim) {
        return None;
    }
    let marker = delim[0];
    let content_start = pos + delim.len();
    let close = content_start + bytes[content_start..].iter().position(|&b| b == marker)?;
    if close == content_start {
        return None;
    }
    // The content cannot contain the marker, so the closer must begin at the first marker found.
    if bytes[close..].starts_with(delim) {
        Some(close + delim.len())
    } else {
        None
    }
}

/// End of the longest run free of `*`, `~`, backtick and newline.
fn plain_run_end(bytes: &[u8], pos: usize) -> usize {
    bytes[pos..]
        .iter()
        .position(|b| matches!(b, b'*' | b'~' | b'`' | b'\n'))
        .map_or(bytes.len(), |offset| pos + offset)
}
