//! Markdown attachment for generated implementations.

use chrono::{DateTime, Utc};

use crate::ticket::CodeGenOutput;

/// Attachment file name for an implementation generated at `at`.
pub fn implementation_filename(at: DateTime<Utc>) -> String {
    format!("gobot-implementation-{}.md", at.format("%Y-%m-%d"))
}

/// Render the markdown file attached to the Jira issue.
pub fn render_implementation_markdown(output: &CodeGenOutput, at: DateTime<Utc>) -> String {
    let mut doc = String::from("# 🤖 GoBot Implementation\n\n");

    let summary = output.summary.trim();
    if !summary.is_empty() {
        doc.push_str("> ");
        doc.push_str(summary);
        doc.push_str("\n\n");
    }

    doc.push_str("---\n\n");
    doc.push_str(output.implementation.trim_end());
    doc.push_str("\n\n---\n\n");
    doc.push_str(&format!(
        "*Generated by GoBot on {}*\n",
        at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    doc
}
