use std::collections::HashSet;

use serde::Serialize;

use crate::{data::ColumnType, table::Table};

/// Shape and quality profile of a normalized table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DataSummary {
    pub total_rows: usize,
    pub total_columns: usize,
    pub numeric_columns: usize,
    pub categorical_columns: usize,
    pub date_columns: usize,
    pub missing_values: usize,
    pub duplicate_rows: usize,
}

impl DataSummary {
    pub fn from_table(table: &Table) -> Self {
        let count_kind = |pred: fn(ColumnType) -> bool| {
            table
                .columns()
                .iter()
                .filter(|column| pred(column.kind))
                .count()
        };
        Self {
            total_rows: table.row_count(),
            total_columns: table.column_count(),
            numeric_columns: count_kind(|kind| kind == ColumnType::Numeric),
            categorical_columns: count_kind(|kind| kind.is_textual()),
            date_columns: count_kind(|kind| kind == ColumnType::Date),
            missing_values: table.missing_cells(),
            duplicate_rows: duplicate_rows(table),
        }
    }

    /// Label/value pairs in display order.
    pub fn entries(&self) -> Vec<(&'static str, usize)> {
        vec![
            ("Total rows", self.total_rows),
            ("Total columns", self.total_columns),
            ("Numeric columns", self.numeric_columns),
            ("Categorical columns", self.categorical_columns),
            ("Date columns", self.date_columns),
            ("Missing values", self.missing_values),
            ("Duplicate rows", self.duplicate_rows),
        ]
    }
}

/// Rows equal to an earlier row in every cell.
fn duplicate_rows(table: &Table) -> usize {
    let mut seen: HashSet<Vec<Option<String>>> = HashSet::new();
    (0..table.row_count())
        .filter(|idx| {
            let key = table
                .row(*idx)
                .into_iter()
                .map(|cell| cell.map(|value| format!("{}:{}", value.kind(), value.as_display())))
                .collect();
            !seen.insert(key)
        })
        .count()
}
