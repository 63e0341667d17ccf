//! Source slices kept for extracted functions.

/// Trim `text` and cap it at `max_lines` lines.
///
/// A truncated slice ends with a marker comment on its own line, so the
/// result never exceeds `max_lines + 1` lines. Empty results are `None`.
pub fn clip_source(text: &str, max_lines: usize) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let lines: Vec<&str> = trimmed.lines().collect();
    if lines.len() <= max_lines {
        return Some(trimmed.to_string());
    }

    let kept = lines[..max_lines].join("\n");
    if kept.trim().is_empty() {
        return None;
    }
    Some(format!(
        "{}\n// ... truncated ({} more lines)",
        kept.trim_end(),
        lines.len() - max_lines
    ))
}
