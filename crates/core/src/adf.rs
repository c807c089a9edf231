//! Atlassian Document Format (ADF) helpers.
//!
//! Jira stores rich-text fields as an ADF node tree. We only need two things:
//! build a description document out of a clarification (heading + bullet
//! list per section), and flatten an existing description back to text.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::ticket::ClarifiedOutput;

/// A single ADF node. Only the node types we emit are modelled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Node {
    Heading { attrs: HeadingAttrs, content: Vec<Node> },
    BulletList { content: Vec<Node> },
    ListItem { content: Vec<Node> },
    Paragraph { content: Vec<Node> },
    Text { text: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingAttrs {
    pub level: u8,
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text { text: text.into() }
    }

    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        Node::Heading {
            attrs: HeadingAttrs { level },
            content: vec![Node::text(text)],
        }
    }

    /// One list item (holding a single paragraph) per entry.
    pub fn bullet_list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Node::BulletList {
            content: items
                .into_iter()
                .map(|item| Node::ListItem {
                    content: vec![Node::Paragraph {
                        content: vec![Node::text(item)],
                    }],
                })
                .collect(),
        }
    }
}

/// Root `doc` node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "doc")]
pub struct Document {
    pub version: u32,
    pub content: Vec<Node>,
}

impl Document {
    pub const VERSION: u32 = 1;

    pub fn new(content: Vec<Node>) -> Self {
        Self {
            version: Self::VERSION,
            content,
        }
    }

    /// Level-2 heading followed by a bullet list, for all four sections.
    ///
    /// Sections are always emitted (an empty list stays an empty bullet list)
    /// so the ticket layout is stable across clarifications.
    pub fn from_clarified(output: &ClarifiedOutput) -> Self {
        let content = output
            .sections()
            .into_iter()
            .flat_map(|(section, items)| {
                [
                    Node::heading(2, section.heading()),
                    Node::bullet_list(items.iter().cloned()),
                ]
            })
            .collect();
        Self::new(content)
    }

    pub fn to_json(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or(JsonValue::Null)
    }
}

/// Depth-first concatenation of every `text` node, space separated.
///
/// Works on arbitrary ADF (not just the subset modelled above), since Jira
/// descriptions may contain any node type.
pub fn extract_text(node: &JsonValue) -> String {
    fn walk(node: &JsonValue, out: &mut String) {
        if node.get("type").and_then(JsonValue::as_str) == Some("text") {
            if let Some(text) = node.get("text").and_then(JsonValue::as_str) {
                out.push_str(text);
                out.push(' ');
            }
        }
        if let Some(children) = node.get("content").and_then(JsonValue::as_array) {
            for child in children {
                walk(child, out);
            }
        }
    }

    let mut out = String::new();
    walk(node, &mut out);
    out.trim().to_string()
}
