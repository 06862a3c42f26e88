use super::paint;
use super::persist::cell;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, ContentArrangement, Table};
use multisplunk_core::Record;
use owo_colors::Style;

/// Longest cell shown in the console preview.
pub const MAX_CELL_CHARS: usize = 50;

/// Get the terminal width, defaulting to 120 if detection fails
fn get_terminal_width() -> u16 {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0)
        .unwrap_or(120)
}

/// Truncate on character boundaries, adding "..." if truncated
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else if max_chars > 3 {
        let head: String = text.chars().take(max_chars - 3).collect();
        format!("{}...", head)
    } else {
        text.chars().take(max_chars).collect()
    }
}

/// Titled preview of the first `limit` rows followed by a row-count footer.
pub fn render_preview(endpoint: &str, rows: &[Record], limit: usize) -> String {
    let title = paint(format!("Results from {}", endpoint), Style::new().bold().cyan());
    let Some(first) = rows.first() else {
        return format!("{}\n{}", title, paint("No results to display.", Style::new().yellow()));
    };

    let columns: Vec<&String> = first.keys().collect();
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(get_terminal_width())
        .set_header(columns.iter().map(|c| truncate_text(c, MAX_CELL_CHARS)));

    for row in rows.iter().take(limit) {
        table.add_row(
            columns
                .iter()
                .map(|c| truncate_text(&cell(row.get(c.as_str())), MAX_CELL_CHARS)),
        );
    }

    let footer = if rows.len() > limit {
        format!("Showing {} of {} results", limit, rows.len())
    } else {
        format!("Total: {} results", rows.len())
    };
    format!("{}\n{}\n{}", title, table, paint(footer, Style::new().dimmed()))
}
