//! In-memory table model shared by every pipeline stage.
//!
//! [`RawTable`] is what ingestion produces: a header row plus row-major cells,
//! names untouched. [`Table`] is the normalized, column-major form whose
//! columns each carry one [`ColumnType`]. Views built with
//! [`Table::select_rows`] are fresh tables; the source is never modified.

use std::collections::HashSet;

use anyhow::{Result, ensure};
use chrono::NaiveDateTime;

use crate::data::{ColumnType, Value};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<Value>>>,
}

impl RawTable {
    /// Pads or truncates ragged rows to the widest of header and data rows.
    pub fn new(mut headers: Vec<String>, mut rows: Vec<Vec<Option<Value>>>) -> Self {
        let width = rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(headers.len()))
            .max()
            .unwrap_or(0);
        headers.resize(width, String::new());
        for row in &mut rows {
            row.resize(width, None);
        }
        Self { headers, rows }
    }

    pub fn width(&self) -> usize {
        self.headers.len()
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnType,
    pub cells: Vec<Option<Value>>,
}

impl Column {
    pub fn new(name: impl Into<String>, cells: Vec<Option<Value>>) -> Self {
        let kind = ColumnType::infer(&cells);
        Self {
            name: name.into(),
            kind,
            cells,
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True when every cell is missing.
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(Option::is_none)
    }

    pub fn is_numeric(&self) -> bool {
        self.kind == ColumnType::Numeric
    }

    pub fn is_date(&self) -> bool {
        self.kind == ColumnType::Date
    }

    pub fn missing_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_none()).count()
    }

    pub fn present(&self) -> impl Iterator<Item = &Value> {
        self.cells.iter().flatten()
    }

    /// Non-missing numeric cells; other cell kinds are skipped.
    pub fn numbers(&self) -> impl Iterator<Item = f64> + '_ {
        self.present().filter_map(Value::as_number)
    }

    pub fn number_at(&self, row: usize) -> Option<f64> {
        self.cells.get(row)?.as_ref()?.as_number()
    }

    pub fn date_at(&self, row: usize) -> Option<NaiveDateTime> {
        self.cells.get(row)?.as_ref()?.as_date()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDateTime> + '_ {
        self.present().filter_map(Value::as_date)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    row_count: usize,
}

impl Table {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_columns(columns: Vec<Column>) -> Result<Self> {
        let row_count = columns.first().map(Column::len).unwrap_or(0);
        let mut seen = HashSet::new();
        for column in &columns {
            ensure!(
                column.len() == row_count,
                "Column '{}' has {} cell(s) but the table has {} row(s)",
                column.name,
                column.len(),
                row_count
            );
            ensure!(
                seen.insert(column.name.as_str()),
                "Duplicate column name '{}'",
                column.name
            );
        }
        Ok(Self { columns, row_count })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0 || self.columns.is_empty()
    }

    pub fn row(&self, index: usize) -> Vec<Option<&Value>> {
        self.columns
            .iter()
            .map(|c| c.cells.get(index).and_then(Option::as_ref))
            .collect()
    }

    pub fn total_cells(&self) -> usize {
        self.row_count * self.columns.len()
    }

    pub fn missing_cells(&self) -> usize {
        self.columns.iter().map(Column::missing_count).sum()
    }

    pub fn date_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.is_date())
    }

    /// Builds a view holding only the rows accepted by `keep`.
    pub fn select_rows<F>(&self, mut keep: F) -> Table
    where
        F: FnMut(usize) -> bool,
    {
        let selected: Vec<usize> = (0..self.row_count).filter(|idx| keep(*idx)).collect();
        let columns = self
            .columns
            .iter()
            .map(|column| Column {
                name: column.name.clone(),
                kind: column.kind,
                cells: selected.iter().map(|idx| column.cells[*idx].clone()).collect(),
            })
            .collect();
        Table {
            columns,
            row_count: selected.len(),
        }
    }

    pub fn to_raw(&self) -> RawTable {
        let headers = self.columns.iter().map(|c| c.name.clone()).collect();
        let rows = (0..self.row_count)
            .map(|idx| {
                self.columns
                    .iter()
                    .map(|c| c.cells[idx].clone())
                    .collect()
            })
            .collect();
        RawTable { headers, rows }
    }
}
