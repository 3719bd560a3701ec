//! File ingestion: delimited text through `csv`, workbooks through `calamine`.
//!
//! The input format is chosen from the file extension. Workbooks contribute
//! their first worksheet only. Anything unrecognised fails with a
//! [`FormatError`] before any parsing takes place.

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use calamine::{DataType, Reader, open_workbook_auto};
use encoding_rs::Encoding;
use log::{debug, info};

use crate::{
    data::{Value, is_missing_token, parse_cell},
    error::FormatError,
    io_utils,
    table::RawTable,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Delimited,
    Workbook,
}

impl SourceFormat {
    pub fn detect(path: &Path) -> Result<Self, FormatError> {
        if io_utils::is_dash(path) {
            return Ok(SourceFormat::Delimited);
        }
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| FormatError::MissingExtension {
                path: path.to_path_buf(),
            })?
            .to_ascii_lowercase();
        match extension.as_str() {
            "csv" | "tsv" | "txt" => Ok(SourceFormat::Delimited),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(SourceFormat::Workbook),
            _ => Err(FormatError::UnsupportedExtension {
                path: path.to_path_buf(),
                extension,
            }),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ReadOptions {
    pub delimiter: Option<u8>,
    pub encoding: &'static Encoding,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            encoding: encoding_rs::UTF_8,
        }
    }
}

pub fn read_table(path: &Path, options: &ReadOptions) -> Result<RawTable> {
    let format = SourceFormat::detect(path)?;
    let raw = match format {
        SourceFormat::Delimited => read_delimited(path, options)?,
        SourceFormat::Workbook => read_workbook(path)?,
    };
    info!(
        "Loaded {} row(s) x {} column(s) from {:?}",
        raw.height(),
        raw.width(),
        path
    );
    Ok(raw)
}

fn read_delimited(path: &Path, options: &ReadOptions) -> Result<RawTable> {
    let delimiter = io_utils::resolve_input_delimiter(path, options.delimiter);
    debug!(
        "Reading delimited text {:?} with delimiter '{}' and encoding {}",
        path,
        crate::printable_delimiter(delimiter),
        options.encoding.name()
    );
    let mut reader = io_utils::open_csv_reader_from_path(path, delimiter)?;
    let headers = io_utils::reader_headers(&mut reader, options.encoding)
        .with_context(|| format!("Reading header row from {path:?}"))?;
    let mut rows = Vec::new();
    for (row_idx, record) in reader.byte_records().enumerate() {
        let record = record.with_context(|| format!("Reading row {}", row_idx + 2))?;
        let decoded = io_utils::decode_record(&record, options.encoding)
            .with_context(|| format!("Decoding row {}", row_idx + 2))?;
        rows.push(decoded.iter().map(|field| parse_cell(field)).collect());
    }
    Ok(RawTable::new(headers, rows))
}

fn read_workbook(path: &Path) -> Result<RawTable> {
    let mut workbook =
        open_workbook_auto(path).with_context(|| format!("Opening workbook {path:?}"))?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| FormatError::NoWorksheets {
            path: path.to_path_buf(),
        })?;
    debug!("Using worksheet '{sheet_name}' from {path:?}");
    let range = workbook
        .worksheet_range(&sheet_name)
        .ok_or_else(|| anyhow!("Unable to read the worksheet named '{sheet_name}'"))?
        .with_context(|| format!("Reading worksheet '{sheet_name}' from {path:?}"))?;

    let mut rows_iter = range.rows();
    let header_row = rows_iter.next().ok_or_else(|| FormatError::EmptyWorksheet {
        path: path.to_path_buf(),
        sheet: sheet_name.clone(),
    })?;
    let headers = header_row.iter().map(header_text).collect();
    let rows = rows_iter
        .map(|row| row.iter().map(cell_value).collect())
        .collect();
    Ok(RawTable::new(headers, rows))
}

fn header_text(cell: &DataType) -> String {
    match cell {
        DataType::Empty => String::new(),
        _ => cell.to_string().trim().to_string(),
    }
}

fn cell_value(cell: &DataType) -> Option<Value> {
    match cell {
        DataType::Empty | DataType::Error(_) => None,
        DataType::Int(i) => Some(Value::Number(*i as f64)),
        DataType::Float(f) if f.is_finite() => Some(Value::Number(*f)),
        DataType::Float(_) => None,
        DataType::DateTime(serial) => cell
            .as_datetime()
            .map(Value::Date)
            .or(Some(Value::Number(*serial))),
        DataType::String(s) if is_missing_token(s) => None,
        DataType::String(s) => Some(Value::Text(s.trim().to_string())),
        other => parse_cell(&other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn detect_accepts_known_extensions_case_insensitively() {
        assert_eq!(
            SourceFormat::detect(Path::new("orders.CSV")).unwrap(),
            SourceFormat::Delimited
        );
        assert_eq!(
            SourceFormat::detect(Path::new("stock.xlsx")).unwrap(),
            SourceFormat::Workbook
        );
        assert_eq!(
            SourceFormat::detect(Path::new("-")).unwrap(),
            SourceFormat::Delimited
        );
    }

    #[test]
    fn detect_rejects_unknown_and_missing_extensions() {
        assert_eq!(
            SourceFormat::detect(Path::new("report.pdf")),
            Err(FormatError::UnsupportedExtension {
                path: PathBuf::from("report.pdf"),
                extension: "pdf".to_string(),
            })
        );
        assert!(matches!(
            SourceFormat::detect(Path::new("README")),
            Err(FormatError::MissingExtension { .. })
        ));
    }

    #[test]
    fn workbook_cells_keep_their_types() {
        assert_eq!(cell_value(&DataType::Int(4)), Some(Value::Number(4.0)));
        assert_eq!(cell_value(&DataType::Empty), None);
        assert_eq!(cell_value(&DataType::String(" N/A ".into())), None);
        assert_eq!(
            cell_value(&DataType::String(" Acme ".into())),
            Some(Value::Text("Acme".into()))
        );
        assert_eq!(
            cell_value(&DataType::Bool(true)),
            Some(Value::Text("true".into()))
        );
    }
}
