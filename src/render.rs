//! Fixed-width terminal tables for KPIs, recommendations, profiles and
//! table previews.

use std::{borrow::Cow, collections::BTreeMap, fmt::Write as _};

use crate::{
    kpi::{Benchmarks, KpiRecord},
    recommend::Recommendation,
    report::kpi_label,
    roles::Role,
    stats::{STATS_HEADERS, numeric_column_stats},
    summary::DataSummary,
    table::Table,
};

pub fn render_table<H: AsRef<str>>(headers: &[H], rows: &[Vec<String>]) -> String {
    let headers: Vec<&str> = headers.iter().map(AsRef::as_ref).collect();
    let mut widths: Vec<usize> = headers.iter().map(|h| display_width(h)).collect();
    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(widths.len()) {
            widths[idx] = widths[idx].max(display_width(cell));
        }
    }
    for width in &mut widths {
        *width = (*width).max(3);
    }
    // Columns whose every non-empty cell is a number are right-aligned.
    let right_align: Vec<bool> = (0..widths.len())
        .map(|idx| {
            let mut cells = rows
                .iter()
                .filter_map(|row| row.get(idx))
                .filter(|cell| !cell.is_empty())
                .peekable();
            cells.peek().is_some() && cells.all(|cell| cell.parse::<f64>().is_ok())
        })
        .collect();

    let mut output = String::new();
    let header_cells: Vec<Cow<'_, str>> = headers.iter().map(|h| Cow::Borrowed(*h)).collect();
    let _ = writeln!(output, "{}", format_row(&header_cells, &widths, &right_align));
    let separator: Vec<Cow<'_, str>> = widths.iter().map(|w| Cow::Owned("-".repeat(*w))).collect();
    let _ = writeln!(output, "{}", format_row(&separator, &widths, &right_align));
    for row in rows {
        let cells: Vec<Cow<'_, str>> = row.iter().map(|cell| sanitize_cell(cell)).collect();
        let _ = writeln!(output, "{}", format_row(&cells, &widths, &right_align));
    }
    output
}

fn format_row(values: &[Cow<'_, str>], widths: &[usize], right_align: &[bool]) -> String {
    let cells: Vec<String> = values
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(idx, (value, width))| {
            let padding = width.saturating_sub(display_width(value));
            if right_align.get(idx).copied().unwrap_or(false) {
                format!("{}{value}", " ".repeat(padding))
            } else {
                format!("{value}{}", " ".repeat(padding))
            }
        })
        .collect();
    cells.join("  ").trim_end().to_string()
}

fn display_width(value: &str) -> usize {
    let mut width = 0usize;
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch == '\u{1b}' {
            for next in chars.by_ref() {
                if next == 'm' {
                    break;
                }
            }
        } else {
            width += 1;
        }
    }
    width
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}

pub fn render_kpis(kpis: &KpiRecord, benchmarks: &Benchmarks) -> String {
    let rows: Vec<Vec<String>> = kpis
        .iter()
        .map(|(kpi, value)| {
            vec![
                kpi_label(kpi.as_str()),
                format!("{value:.2}"),
                format!("{:.2}", kpis.trend(kpi).unwrap_or_default()),
                benchmarks.status(kpi, value).to_string(),
            ]
        })
        .collect();
    render_table(&["kpi", "value", "trend", "status"], &rows)
}

pub fn render_recommendations(recommendations: &[Recommendation]) -> String {
    let rows: Vec<Vec<String>> = recommendations
        .iter()
        .enumerate()
        .map(|(idx, rec)| {
            vec![
                (idx + 1).to_string(),
                rec.priority.to_string(),
                rec.category.clone(),
                rec.title.clone(),
            ]
        })
        .collect();
    render_table(&["#", "priority", "category", "title"], &rows)
}

/// First `limit` rows, with each header annotated by its column type.
pub fn render_preview(table: &Table, limit: usize) -> String {
    let headers: Vec<String> = table
        .columns()
        .iter()
        .map(|column| format!("{} ({})", column.name, column.kind))
        .collect();
    let rows: Vec<Vec<String>> = (0..table.row_count().min(limit))
        .map(|idx| {
            table
                .row(idx)
                .into_iter()
                .map(|cell| cell.map(|value| value.as_display()).unwrap_or_default())
                .collect()
        })
        .collect();
    render_table(&headers, &rows)
}

pub fn render_roles(roles: &BTreeMap<Role, Vec<String>>) -> String {
    let rows: Vec<Vec<String>> = roles
        .iter()
        .map(|(role, columns)| vec![role.to_string(), columns.join(", ")])
        .collect();
    render_table(&["role", "columns"], &rows)
}

pub fn render_summary(summary: &DataSummary, table: &Table) -> String {
    let rows: Vec<Vec<String>> = summary
        .entries()
        .into_iter()
        .map(|(label, value)| vec![label.to_string(), value.to_string()])
        .collect();
    let mut output = render_table(&["metric", "value"], &rows);
    let stats: Vec<Vec<String>> = numeric_column_stats(table)
        .iter()
        .map(|stats| stats.render_row())
        .collect();
    if !stats.is_empty() {
        output.push('\n');
        output.push_str(&render_table(&STATS_HEADERS, &stats));
    }
    output
}
