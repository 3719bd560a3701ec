//! Table and result export.
//!
//! Tables are written as delimited text with missing cells left empty, or as
//! an `.xlsx` workbook when the output path asks for one. Either output can
//! be fed straight back through ingestion and normalization.

use std::{io::Write, path::Path};

use anyhow::{Context, Result};
use chrono::NaiveTime;
use log::debug;
use rust_xlsxwriter::{Format, Workbook};
use serde::Serialize;

use crate::{
    data::Value,
    io_utils,
    kpi::KpiRecord,
    recommend::{Recommendation, RecommendationSummary},
    table::Table,
};

pub const EXPORT_WORKSHEET: &str = "Data";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Delimited,
    Workbook,
}

impl ExportFormat {
    /// `.xlsx` paths get a workbook; stdout and every other path get text.
    pub fn for_path(path: Option<&Path>) -> Self {
        match path.and_then(Path::extension).and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("xlsx") => ExportFormat::Workbook,
            _ => ExportFormat::Delimited,
        }
    }
}

pub fn write_table(table: &Table, path: Option<&Path>, delimiter: u8) -> Result<()> {
    match (ExportFormat::for_path(path), path) {
        (ExportFormat::Workbook, Some(path)) => write_workbook(table, path),
        _ => {
            let mut writer = io_utils::open_csv_writer(path, delimiter)?;
            write_csv(table, &mut writer)
        }
    }
}

pub fn write_csv<W: Write>(table: &Table, writer: &mut csv::Writer<W>) -> Result<()> {
    writer
        .write_record(table.column_names())
        .context("Writing header row")?;
    for idx in 0..table.row_count() {
        let record: Vec<String> = table
            .row(idx)
            .into_iter()
            .map(|cell| cell.map(|value| value.as_display()).unwrap_or_default())
            .collect();
        writer
            .write_record(&record)
            .with_context(|| format!("Writing row {}", idx + 2))?;
    }
    writer.flush().context("Flushing table output")?;
    Ok(())
}

/// Numbers are written as numbers and dates as Excel dates; missing cells
/// are left blank.
pub fn write_workbook(table: &Table, path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet
        .set_name(EXPORT_WORKSHEET)
        .context("Naming the export worksheet")?;

    let header_format = Format::new().set_bold();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    let datetime_format = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");

    for (col_idx, column) in table.columns().iter().enumerate() {
        let col = u16::try_from(col_idx)
            .with_context(|| format!("Column '{}' is beyond the worksheet limit", column.name))?;
        sheet
            .write_string_with_format(0, col, &column.name, &header_format)
            .with_context(|| format!("Writing header '{}'", column.name))?;
        for (row_idx, cell) in column.cells.iter().enumerate() {
            let Some(value) = cell else {
                continue;
            };
            let row = u32::try_from(row_idx + 1)
                .with_context(|| format!("Row {} is beyond the worksheet limit", row_idx + 2))?;
            let written = match value {
                Value::Text(text) => sheet.write_string(row, col, text),
                Value::Number(number) => sheet.write_number(row, col, *number),
                Value::Date(date) => {
                    let format = if date.time() == NaiveTime::MIN {
                        &date_format
                    } else {
                        &datetime_format
                    };
                    sheet.write_datetime_with_format(row, col, date, format)
                }
            };
            written.with_context(|| {
                format!("Writing row {} of column '{}'", row_idx + 2, column.name)
            })?;
        }
    }

    workbook
        .save(path)
        .with_context(|| format!("Saving workbook {path:?}"))?;
    debug!(
        "Wrote {} row(s) to worksheet '{EXPORT_WORKSHEET}' in {path:?}",
        table.row_count()
    );
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct AnalysisExport<'a> {
    pub kpis: &'a KpiRecord,
    pub recommendations: &'a [Recommendation],
    pub summary: RecommendationSummary,
}

impl<'a> AnalysisExport<'a> {
    pub fn new(kpis: &'a KpiRecord, recommendations: &'a [Recommendation]) -> Self {
        Self {
            kpis,
            recommendations,
            summary: RecommendationSummary::from_recommendations(recommendations),
        }
    }
}

pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("Serializing JSON output")
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut json = to_json(value)?;
    json.push('\n');
    io_utils::write_text(path, &json)
}
