//! Typed errors for ingestion and KPI derivation.
//!
//! Only [`FormatError`] ever reaches the caller of the pipeline. [`KpiError`]
//! is produced by individual KPI computations and always recovered by the
//! deriver through the KPI's documented default.

use std::path::PathBuf;

use thiserror::Error;

/// The input could not be recognised as a supported tabular file.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error(
        "unsupported file format '.{extension}' for {path:?} (expected csv, tsv, txt, xlsx, xlsm, xlsb, xls or ods)"
    )]
    UnsupportedExtension { path: PathBuf, extension: String },

    #[error("cannot determine the file format of {path:?} without an extension")]
    MissingExtension { path: PathBuf },

    #[error("workbook {path:?} does not contain any worksheets")]
    NoWorksheets { path: PathBuf },

    #[error("worksheet '{sheet}' in {path:?} is empty")]
    EmptyWorksheet { path: PathBuf, sheet: String },
}

/// Reason a single KPI could not be computed from the table at hand.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KpiError {
    #[error("no column matches any of {0:?}")]
    MissingColumn(&'static [&'static str]),

    #[error("column '{0}' is not numeric")]
    NotNumeric(String),

    #[error("column '{0}' does not hold dates")]
    NotDate(String),

    #[error("table has no rows")]
    NoRows,

    #[error("{0} is undefined for the available values")]
    Undefined(&'static str),
}

pub type KpiResult<T> = Result<T, KpiError>;
