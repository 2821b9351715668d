//! Box-drawn rendering of query results for the result screen.
//!
//! Widths are measured in decoded characters rather than bytes, so Cyrillic
//! titles line up with ASCII ones.

use crate::db::QueryResult;

/// Message shown for statements that return no rows.
pub const COMMAND_OK: &str = "Operation completed successfully.";

/// Number of terminal columns `text` occupies; one per character.
pub fn display_width(text: &str) -> usize {
    text.chars().count()
}

/// Render a result set, header first. An empty result still gets a header.
pub fn render_table(result: &QueryResult) -> Vec<String> {
    if result.columns.is_empty() {
        return vec![COMMAND_OK.to_string()];
    }

    let widths: Vec<usize> = result
        .columns
        .iter()
        .enumerate()
        .map(|(index, name)| {
            result
                .rows
                .iter()
                .filter_map(|row| row.get(index))
                .map(|cell| display_width(cell))
                .fold(display_width(name), usize::max)
        })
        .collect();

    let mut lines = Vec::with_capacity(result.rows.len() + 4);
    lines.push(divider(&widths, '┌', '┬', '┐'));
    lines.push(row_line(&result.columns, &widths));
    lines.push(divider(&widths, '├', '┼', '┤'));
    for row in &result.rows {
        lines.push(row_line(row, &widths));
    }
    lines.push(divider(&widths, '└', '┴', '┘'));
    lines
}

fn divider(widths: &[usize], left: char, middle: char, right: char) -> String {
    let mut line = String::new();
    line.push(left);
    for (index, width) in widths.iter().enumerate() {
        if index > 0 {
            line.push(middle);
        }
        line.extend(std::iter::repeat('─').take(width + 2));
    }
    line.push(right);
    line
}

fn row_line(cells: &[String], widths: &[usize]) -> String {
    let mut line = String::from("│");
    for (index, width) in widths.iter().enumerate() {
        let cell = cells.get(index).map(String::as_str).unwrap_or("");
        let padding = width.saturating_sub(display_width(cell));
        line.push(' ');
        line.push_str(cell);
        line.push_str(&" ".repeat(padding + 1));
        line.push('│');
    }
    line
}
