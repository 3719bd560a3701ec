//! Schema normalizer: cleans a raw table and infers date and numeric columns.
//!
//! The steps run in a fixed order and each is a no-op on already normalized
//! input, which is what makes [`normalize`] idempotent:
//!
//! 1. drop rows and columns that are entirely missing
//! 2. canonicalise column names (trim, lower-case, spaces to `_`), suffixing
//!    collisions with `_2`, `_3`, ...
//! 3. detect date columns by name keyword or by sampling textual values
//! 4. coerce mostly-numeric textual columns to numbers
//! 5. drop rows and columns emptied by the conversions above; a row whose
//!    every cell failed conversion is gone after this step and is logged
//! 6. fill sparse gaps in textual columns with `"Unknown"`

use std::collections::HashSet;

use log::{Level, debug, log, warn};

use crate::{
    data::{ColumnType, Value, looks_like_date, parse_date_value, parse_loose_number},
    table::{Column, RawTable, Table},
};

pub const DATE_NAME_KEYWORDS: &[&str] = &[
    "date", "time", "created", "updated", "delivery", "order", "ship",
];
/// Upper bound on values inspected when sniffing an unnamed date column.
pub const DATE_SAMPLE_SIZE: usize = 5;
pub const DATE_SAMPLE_RATIO: f64 = 0.6;
pub const DATE_NAME_MIN_RATIO: f64 = 0.5;
pub const NUMERIC_MIN_RATIO: f64 = 0.5;
pub const FILL_MAX_MISSING_RATIO: f64 = 0.05;
pub const MISSING_PLACEHOLDER: &str = "Unknown";

pub fn normalize(raw: RawTable) -> Table {
    let RawTable { headers, rows } = raw;
    let mut columns: Vec<Column> = headers
        .into_iter()
        .enumerate()
        .map(|(idx, name)| {
            let cells = rows
                .iter()
                .map(|row| row.get(idx).cloned().flatten())
                .collect();
            Column::new(name, cells)
        })
        .collect();

    drop_empty(&mut columns, Level::Debug);
    rename_columns(&mut columns);
    for column in &mut columns {
        detect_dates(column);
        coerce_numeric(column);
    }
    drop_empty(&mut columns, Level::Warn);
    for column in &mut columns {
        fill_missing(column);
    }

    match Table::from_columns(columns) {
        Ok(table) => table,
        Err(err) => {
            // Lengths and names are both guaranteed above; keep the contract of never failing.
            warn!("Normalized table rejected ({err}); returning an empty table");
            Table::empty()
        }
    }
}

pub fn normalize_column_name(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

/// Rows emptied by type conversion had content in the input, so the second
/// pass reports them at `Level::Warn`.
fn drop_empty(columns: &mut Vec<Column>, level: Level) {
    let before = columns.len();
    columns.retain(|column| !column.is_blank());
    if columns.len() != before {
        log!(level, "Dropped {} empty column(s)", before - columns.len());
    }

    let row_count = columns.first().map(Column::len).unwrap_or(0);
    let keep: Vec<bool> = (0..row_count)
        .map(|row| columns.iter().any(|c| c.cells[row].is_some()))
        .collect();
    if keep.iter().all(|k| *k) {
        return;
    }
    let dropped: Vec<usize> = keep
        .iter()
        .enumerate()
        .filter(|(_, k)| !**k)
        .map(|(idx, _)| idx + 1)
        .collect();
    log!(
        level,
        "Dropped {} empty row(s) at data row(s) {:?}",
        dropped.len(),
        dropped
    );
    for column in columns.iter_mut() {
        let mut flags = keep.iter();
        column.cells.retain(|_| *flags.next().unwrap_or(&true));
    }
}

fn rename_columns(columns: &mut [Column]) {
    let mut taken: HashSet<String> = HashSet::new();
    for (idx, column) in columns.iter_mut().enumerate() {
        let mut base = normalize_column_name(&column.name);
        if base.is_empty() {
            base = format!("field_{}", idx + 1);
        }
        let mut candidate = base.clone();
        let mut suffix = 2;
        while taken.contains(&candidate) {
            candidate = format!("{base}_{suffix}");
            suffix += 1;
        }
        if candidate != base {
            warn!(
                "Column '{}' collides with an earlier column; renamed to '{candidate}'",
                column.name
            );
        }
        taken.insert(candidate.clone());
        column.name = candidate;
    }
}

fn cell_as_date(value: &Value) -> Option<Value> {
    match value {
        Value::Date(d) => Some(Value::Date(*d)),
        Value::Text(s) => parse_date_value(s).map(Value::Date),
        Value::Number(_) => None,
    }
}

fn detect_dates(column: &mut Column) {
    if column.kind == ColumnType::Date {
        return;
    }
    let lowered = column.name.to_lowercase();
    if DATE_NAME_KEYWORDS.iter().any(|k| lowered.contains(k)) {
        let converted: Vec<Option<Value>> = column
            .cells
            .iter()
            .map(|cell| cell.as_ref().and_then(cell_as_date))
            .collect();
        let present = column.present().count();
        let parsed = converted.iter().flatten().count();
        if present > 0 && parsed as f64 >= present as f64 * DATE_NAME_MIN_RATIO {
            debug!(
                "Column '{}' converted to dates by name ({parsed}/{present} parsed)",
                column.name
            );
            column.cells = converted;
            column.kind = ColumnType::Date;
        }
        return;
    }
    if !column.kind.is_textual() {
        return;
    }
    let sample: Vec<&Value> = column.present().take(DATE_SAMPLE_SIZE).collect();
    if sample.is_empty() {
        return;
    }
    let date_like = sample
        .iter()
        .filter(|value| match value {
            Value::Date(_) => true,
            Value::Text(s) => looks_like_date(s),
            Value::Number(_) => false,
        })
        .count();
    if date_like as f64 >= sample.len() as f64 * DATE_SAMPLE_RATIO {
        debug!(
            "Column '{}' converted to dates by sampling ({date_like}/{} date-like)",
            column.name,
            sample.len()
        );
        column.cells = column
            .cells
            .iter()
            .map(|cell| cell.as_ref().and_then(cell_as_date))
            .collect();
        column.kind = ColumnType::Date;
    }
}

fn cell_as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => Some(*n),
        Value::Text(s) => parse_loose_number(s),
        Value::Date(_) => None,
    }
}

fn coerce_numeric(column: &mut Column) {
    if !column.kind.is_textual() {
        return;
    }
    let converted: Vec<Option<Value>> = column
        .cells
        .iter()
        .map(|cell| cell.as_ref().and_then(cell_as_number).map(Value::Number))
        .collect();
    let present = column.present().count();
    let parsed = converted.iter().flatten().count();
    if present > 0 && parsed as f64 / present as f64 > NUMERIC_MIN_RATIO {
        debug!(
            "Column '{}' coerced to numeric ({parsed}/{present} parsed)",
            column.name
        );
        column.cells = converted;
        column.kind = ColumnType::Numeric;
    }
}

fn fill_missing(column: &mut Column) {
    if !column.kind.is_textual() || column.cells.is_empty() {
        return;
    }
    let missing = column.missing_count();
    if missing == 0 {
        return;
    }
    if (missing as f64 / column.len() as f64) < FILL_MAX_MISSING_RATIO {
        for cell in column.cells.iter_mut().filter(|cell| cell.is_none()) {
            *cell = Some(Value::Text(MISSING_PLACEHOLDER.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::parse_cell;

    fn raw(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable::new(
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|row| row.iter().map(|cell| parse_cell(cell)).collect())
                .collect(),
        )
    }

    #[test]
    fn normalize_column_name_trims_lowercases_and_underscores() {
        assert_eq!(normalize_column_name("  Order Date "), "order_date");
        assert_eq!(normalize_column_name("Lead  Time"), "lead__time");
        assert_eq!(normalize_column_name("QTY"), "qty");
    }

    #[test]
    fn collisions_receive_numeric_suffixes() {
        let table = normalize(raw(
            &["Qty", "qty ", "QTY_2", "qty"],
            &[&["1", "2", "3", "4"]],
        ));
        let names: Vec<&str> = table.column_names().collect();
        assert_eq!(names, vec!["qty", "qty_2", "qty_2_2", "qty_3"]);
    }

    #[test]
    fn blank_headers_receive_positional_names() {
        let table = normalize(raw(&["", "Status"], &[&["a", "b"]]));
        let names: Vec<&str> = table.column_names().collect();
        assert_eq!(names, vec!["field_1", "status"]);
    }

    #[test]
    fn empty_rows_and_columns_are_dropped() {
        let table = normalize(raw(
            &["a", "b"],
            &[&["x", ""], &["", ""], &["y", " "]],
        ));
        assert_eq!(table.column_count(), 1);
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn date_keyword_columns_are_parsed_with_missing_for_failures() {
        let table = normalize(raw(
            &["Delivery Date", "Supplier"],
            &[
                &["2024-01-05", "Acme"],
                &["2024-01-09", "Globex"],
                &["not a date", "Initech"],
            ],
        ));
        let column = table.column("delivery_date").unwrap();
        assert_eq!(column.kind, ColumnType::Date);
        assert_eq!(column.dates().count(), 2);
        assert_eq!(column.cells[2], None);
        assert_eq!(table.row_count(), 3);
        assert_eq!(
            table.column("supplier").unwrap().cells[2],
            Some(Value::Text("Initech".to_string()))
        );
    }

    #[test]
    fn rows_whose_every_cell_fails_conversion_are_dropped() {
        let table = normalize(raw(
            &["Order Date", "Qty"],
            &[&["2024-01-02", "10"], &["TBD", "pending"], &["2024-01-05", "20"]],
        ));
        assert_eq!(table.row_count(), 2);
        let qty = table.column("qty").unwrap();
        assert_eq!(qty.kind, ColumnType::Numeric);
        assert_eq!(qty.numbers().collect::<Vec<_>>(), vec![10.0, 20.0]);
        assert_eq!(table.column("order_date").unwrap().missing_count(), 0);
    }

    #[test]
    fn keyword_columns_that_are_not_dates_stay_numeric() {
        let table = normalize(raw(&["order_quantity"], &[&["10"], &["20"]]));
        assert_eq!(table.column("order_quantity").unwrap().kind, ColumnType::Numeric);
    }

    #[test]
    fn unnamed_date_columns_are_found_by_sampling() {
        let table = normalize(raw(
            &["eta", "sku"],
            &[
                &["01/05/2024", "A"],
                &["01/06/2024", "B"],
                &["01/07/2024", "C"],
                &["soon", "D"],
            ],
        ));
        let column = table.column("eta").unwrap();
        assert_eq!(column.kind, ColumnType::Date);
        assert_eq!(column.missing_count(), 1);
        assert_eq!(table.row_count(), 4);
    }

    #[test]
    fn sampling_below_threshold_keeps_text() {
        let table = normalize(raw(
            &["note"],
            &[&["2024-01-05"], &["late"], &["early"], &["ok"], &["fine"]],
        ));
        assert_eq!(table.column("note").unwrap().kind, ColumnType::Text);
    }

    #[test]
    fn numeric_coercion_requires_majority() {
        let table = normalize(raw(
            &["cost", "code"],
            &[&["$1,200.50", "A1"], &["$300", "B"], &["n/a", "C"], &["oops", "D"]],
        ));
        let cost = table.column("cost").unwrap();
        assert_eq!(cost.kind, ColumnType::Numeric);
        assert_eq!(cost.numbers().collect::<Vec<_>>(), vec![1200.5, 300.0]);
        assert_eq!(table.column("code").unwrap().kind, ColumnType::Text);
    }

    #[test]
    fn sparse_text_gaps_are_filled_but_dense_gaps_are_not() {
        let mut rows: Vec<Vec<&str>> = (0..25).map(|_| vec!["Acme", "x"]).collect();
        rows[3][0] = "";
        rows[4][1] = "";
        rows[5][1] = "";
        let refs: Vec<&[&str]> = rows.iter().map(|r| r.as_slice()).collect();
        let table = normalize(raw(&["supplier", "flag"], &refs));
        let supplier = table.column("supplier").unwrap();
        assert_eq!(supplier.missing_count(), 0);
        assert_eq!(
            supplier.cells[3],
            Some(Value::Text(MISSING_PLACEHOLDER.to_string()))
        );
        assert_eq!(table.column("flag").unwrap().missing_count(), 2);
    }

    #[test]
    fn normalize_is_idempotent_on_mixed_input() {
        let first = normalize(raw(
            &["Order Date", "Qty", "Status", "Qty"],
            &[
                &["2024-01-01", "10", "done", "1"],
                &["bad", "x", "", "2"],
                &["2024-02-01", "30", "open", "3"],
            ],
        ));
        let second = normalize(first.to_raw());
        assert_eq!(first, second);
    }
}
