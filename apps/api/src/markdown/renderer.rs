//! Maps tokenizer segments onto display nodes and serializes them as safe HTML.

use serde::{Deserialize, Serialize};

use crate::markdown::tokenizer::{Segment, SegmentKind};

/// CSS classes applied to inline code spans in the HTML output.
const CODE_CLASS: &str = "bg-gray-100 px-2 py-1 rounded text-sm font-mono";

/// Presentation primitive for a single segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "node", content = "text", rename_all = "snake_case")]
pub enum Inline {
    Text(String),
    Strong(String),
    Emphasis(String),
    Strikethrough(String),
    Code(String),
    LineBreak,
}

/// A display node keyed by its position in the segment list, for list reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderNode {
    pub key: usize,
    pub inline: Inline,
}

/// One node per segment, same order. Unknown kinds fall back to plain text.
pub fn render(segments: &[Segment]) -> Vec<RenderNode> {
    segments
        .iter()
        .enumerate()
        .map(|(key, segment)| RenderNode {
            key,
            inline: to_inline(segment),
        })
        .collect()
}

fn to_inline(segment: &Segment) -> Inline {
    let content = segment.content.clone();
    match segment.kind {
        SegmentKind::Bold => Inline::Strong(content),
        SegmentKind::Italic => Inline::Emphasis(content),
        SegmentKind::Strikethrough => Inline::Strikethrough(content),
        SegmentKind::InlineCode => Inline::Code(content),
        SegmentKind::LineBreak => Inline::LineBreak,
        SegmentKind::PlainText | SegmentKind::Unknown => Inline::Text(content),
    }
}

/// Serializes nodes to an HTML fragment. All text is escaped.
pub fn to_html(nodes: &[RenderNode]) -> String {
    let mut html = String::new();
    for node in nodes {
        match &node.inline {
            Inline::Text(t) => html.push_str(&format!("<span>{}</span>", html_escape(t))),
            Inline::Strong(t) => html.push_str(&format!("<strong>{}</strong>", html_escape(t))),
            Inline::Emphasis(t) => html.push_str(&format!("<em>{}</em>", html_escape(t))),
            Inline::Strikethrough(t) => html.push_str(&format!("<s>{}</s>", html_escape(t))),
            Inline::Code(t) => html.push_str(&format!(
                "<code class=\"{CODE_CLASS}\">{}</code>",
                html_escape(t)
            )),
            Inline::LineBreak => html.push_str("<br />"),
        }
    }
    html
}

fn html_escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
