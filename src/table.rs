//! Plain-text rendering of a sniffed schema for the `sniff` command.

use std::fmt::Write as _;

use crate::{mangle::quote_identifier, sniff::SchemaMap};

const HEADERS: [&str; 5] = ["#", "source", "column", "width", "sql type"];

pub fn schema_rows(schema: &SchemaMap) -> Vec<[String; 5]> {
    schema
        .columns
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            [
                (idx + 1).to_string(),
                printable(&column.source_name),
                quote_identifier(&column.name),
                column.sql_type.width().to_string(),
                column.sql_type.ddl(),
            ]
        })
        .collect()
}

/// Left-aligned columns separated by two spaces, with a dashed rule under
/// the header. Trailing padding is trimmed.
pub fn render_schema_table(schema: &SchemaMap) -> String {
    let rows = schema_rows(schema);
    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut output = String::new();
    let header = HEADERS.map(str::to_string);
    let rule = widths.map(|w| "-".repeat(w.max(3)));
    for line in [&header, &rule].into_iter().chain(rows.iter()) {
        let _ = writeln!(output, "{}", format_line(line, &widths));
    }
    output
}

fn format_line(cells: &[String; 5], widths: &[usize; 5]) -> String {
    let mut line = String::new();
    for (idx, (cell, width)) in cells.iter().zip(widths).enumerate() {
        if idx > 0 {
            line.push_str("  ");
        }
        line.push_str(cell);
        let pad = width.saturating_sub(cell.chars().count());
        line.extend(std::iter::repeat_n(' ', pad));
    }
    line.trim_end().to_string()
}

fn printable(value: &str) -> String {
    value
        .chars()
        .map(|ch| if ch.is_control() { ' ' } else { ch })
        .collect()
}
