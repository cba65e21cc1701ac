//! Purpose: Render a row set as a boxed text table for terminal output.
//! Exports: `render_table`.
//! Role: Human-facing formatting layered on the row engine; never persisted.
//! Invariants: Column order is the first row's order, then first appearance.
//! Invariants: Missing columns render as empty cells, explicit nulls as `null`.

use tabulite::core::row::Row;

pub(crate) fn render_table(rows: &[Row]) -> String {
    let mut columns: Vec<&str> = Vec::new();
    for row in rows {
        for name in row.column_names() {
            if !columns.contains(&name) {
                columns.push(name);
            }
        }
    }

    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|name| row.get(name).map(|cell| cell.to_string()).unwrap_or_default())
                .collect()
        })
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(index, name)| {
            cells
                .iter()
                .map(|row| row[index].len())
                .chain(std::iter::once(name.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let divider = divider_line(&widths);
    let mut out = String::new();
    out.push_str(&divider);
    out.push('\n');
    out.push_str(&format_line(
        &columns.iter().map(|name| name.to_string()).collect::<Vec<_>>(),
        &widths,
    ));
    out.push('\n');
    out.push_str(&divider);
    out.push('\n');
    for row in &cells {
        out.push_str(&format_line(row, &widths));
        out.push('\n');
    }
    out.push_str(&divider);
    out.push('\n');
    out
}

fn format_line(values: &[String], widths: &[usize]) -> String {
    let padded: Vec<String> = values
        .iter()
        .zip(widths)
        .map(|(value, width)| format!("{value:<width$}"))
        .collect();
    format!("| {} |", padded.join(" | "))
}

fn divider_line(widths: &[usize]) -> String {
    let total: usize = widths.iter().sum::<usize>() + 3 * widths.len() + 1;
    "-".repeat(total)
}
