//! Lightweight Markdown ⇄ Notion block conversion.
//!
//! Only the handful of constructs the daily-report template and typical
//! notes use: headings 2/3, bulleted and numbered lists, paragraphs.

use serde_json::{Value, json};

/// One-element rich-text array for a plain string.
pub(crate) fn rich_text(text: &str) -> Value {
    json!([{"type": "text", "text": {"content": text}}])
}

/// Join the `plain_text` of a rich-text array.
pub(crate) fn plain_text(rich_text_array: &Value) -> String {
    rich_text_array
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("plain_text").and_then(Value::as_str))
                .collect::<String>()
        })
        .unwrap_or_default()
}

/// Convert lightweight Markdown into block objects, one block per line.
pub(crate) fn markdown_to_blocks(content: &str) -> Vec<Value> {
    content.split('\n').map(block_for_line).collect()
}

fn block_for_line(line: &str) -> Value {
    let stripped = line.trim();

    if stripped.is_empty() {
        // Blank lines become empty paragraphs so spacing survives.
        json!({"object": "block", "type": "paragraph", "paragraph": {"rich_text": []}})
    } else if let Some(rest) = stripped.strip_prefix("### ") {
        json!({"object": "block", "type": "heading_3", "heading_3": {"rich_text": rich_text(rest)}})
    } else if let Some(rest) = stripped.strip_prefix("## ") {
        json!({"object": "block", "type": "heading_2", "heading_2": {"rich_text": rich_text(rest)}})
    } else if let Some(rest) = stripped.strip_prefix("- ") {
        json!({
            "object": "block",
            "type": "bulleted_list_item",
            "bulleted_list_item": {"rich_text": rich_text(rest)}
        })
    } else if let Some(rest) = numbered_item(stripped) {
        json!({
            "object": "block",
            "type": "numbered_list_item",
            "numbered_list_item": {"rich_text": rich_text(rest)}
        })
    } else {
        json!({"object": "block", "type": "paragraph", "paragraph": {"rich_text": rich_text(stripped)}})
    }
}

/// Recognize "1. foo"-style lines: a leading ASCII digit with ". " within
/// the first five characters.
fn numbered_item(stripped: &str) -> Option<&str> {
    if stripped.chars().count() <= 2 || !stripped.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }

    let head: String = stripped.chars().take(5).collect();
    if !head.contains(". ") {
        return None;
    }

    stripped.split_once(". ").map(|(_, rest)| rest)
}

/// Render fetched block objects back to plain text, one line per block.
/// Blocks without recognizable text are skipped.
pub(crate) fn blocks_to_text(blocks: &[Value]) -> String {
    let mut parts: Vec<String> = Vec::new();

    for block in blocks {
        let block_type = block.get("type").and_then(Value::as_str).unwrap_or_default();
        let content = block.get(block_type);
        let text = content
            .and_then(|c| c.get("rich_text"))
            .map(plain_text)
            .unwrap_or_default();

        match block_type {
            "heading_1" | "heading_2" | "heading_3" => {
                let level = block_type
                    .chars()
                    .last()
                    .and_then(|c| c.to_digit(10))
                    .unwrap_or(1) as usize;
                parts.push(format!("{} {}", "#".repeat(level), text));
            }
            "bulleted_list_item" => parts.push(format!("- {text}")),
            "numbered_list_item" => parts.push(format!("* {text}")),
            "to_do" => {
                let checked = content
                    .and_then(|c| c.get("checked"))
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                let marker = if checked { "[x]" } else { "[ ]" };
                parts.push(format!("- {marker} {text}"));
            }
            _ if !text.is_empty() => parts.push(text),
            _ => {}
        }
    }

    parts.join("\n")
}
