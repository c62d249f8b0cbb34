//! Compact output rendering helpers for CLI surfaces.
//!
//! Keeps report output bounded and readable while preserving signal.

use colored::Colorize;

/// Collapse newlines/extra whitespace and bound length for terminal display.
pub fn compact_line(input: &str, max_chars: usize) -> String {
    let collapsed = input.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut chars = collapsed.chars();
    let preview: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", preview)
    } else {
        preview
    }
}

/// Render up to `max_items` messages with compact formatting.
pub fn preview_messages(messages: &[String], max_items: usize, max_chars: usize) -> String {
    if messages.is_empty() {
        return String::new();
    }
    let shown = messages
        .iter()
        .take(max_items)
        .map(|m| compact_line(m, max_chars))
        .collect::<Vec<_>>()
        .join(" | ");
    if messages.len() > max_items {
        format!("{} (+{} more)", shown, messages.len() - max_items)
    } else {
        shown
    }
}

/// Status tag printed in front of per-item report lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Ok,
    Changed,
    Fail,
    Warn,
}

impl Tag {
    pub fn render(self) -> String {
        match self {
            Tag::Ok => "ok".green().to_string(),
            Tag::Changed => "updated".cyan().to_string(),
            Tag::Fail => "FAIL".red().bold().to_string(),
            Tag::Warn => "WARN".yellow().to_string(),
        }
    }
}

/// Print one `<surface>: <tag> <message>` line.
pub fn line(surface: &str, tag: Tag, message: &str) {
    println!("{}: {} {}", surface, tag.render(), message);
}
