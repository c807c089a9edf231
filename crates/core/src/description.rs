//! Plain-text rendering of a clarification.
//!
//! This is the text handed to code generation as the ticket description once
//! the user has accepted a clarification.

use crate::ticket::ClarifiedOutput;

const BULLET: &str = "• ";

/// Render `output` as plain text, optionally preceded by the original description.
///
/// Empty sections are omitted. The result carries no leading/trailing whitespace.
pub fn format_clarified_description(output: &ClarifiedOutput, original: Option<&str>) -> String {
    let mut text = String::new();

    if let Some(original) = original.filter(|o| !o.is_empty()) {
        text.push_str(original);
        text.push_str("\n\n");
    }

    for (section, items) in output.sections() {
        if items.is_empty() {
            continue;
        }
        text.push_str(section.heading());
        text.push('\n');
        for item in items {
            text.push_str(BULLET);
            text.push_str(item);
            text.push('\n');
        }
        text.push('\n');
    }

    text.trim().to_string()
}
