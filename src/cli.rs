use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use crate::{ingest::ReadOptions, io_utils};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Derive supply chain KPIs and recommendations from tabular exports",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the full pipeline: normalize, derive KPIs and recommend actions
    Analyze(AnalyzeArgs),
    /// Write the normalized table as CSV or preview it with column types
    Normalize(NormalizeArgs),
    /// Print the KPI record for a file
    Kpis(KpisArgs),
    /// Print the prioritized recommendations for a file
    Recommend(RecommendArgs),
    /// Show which columns were matched to each semantic role
    Roles(RolesArgs),
    /// Profile the normalized table and its numeric columns
    Summary(SummaryArgs),
}

#[derive(Debug, Clone, Args)]
pub struct InputArgs {
    /// Input file (csv, tsv, txt, xlsx, xlsm, xlsb, xls, ods; `-` reads CSV from stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Delimiter for text input (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of text input (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

impl InputArgs {
    pub fn read_options(&self) -> Result<ReadOptions> {
        Ok(ReadOptions {
            delimiter: self.delimiter,
            encoding: io_utils::resolve_encoding(self.input_encoding.as_deref())?,
        })
    }
}

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Row-level filters such as `qty>=100` or `status = shipped`
    #[arg(long = "filter", action = clap::ArgAction::Append)]
    pub filters: Vec<String>,
    /// Earlier export used to compute KPI trends
    #[arg(long)]
    pub baseline: Option<PathBuf>,
    /// YAML file overriding rule thresholds and KPI benchmarks
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,
    /// Write the plain-text report to this path (`-` for stdout)
    #[arg(long)]
    pub report: Option<PathBuf>,
    /// Write KPIs and recommendations as JSON to this path (`-` for stdout)
    #[arg(long)]
    pub json: Option<PathBuf>,
    /// Write the normalized (and filtered) table to this path (`.xlsx` writes a workbook, anything else CSV)
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct NormalizeArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Output file, CSV unless it ends in `.xlsx` (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Delimiter to use for output (defaults to ',')
    #[arg(long = "output-delimiter", value_parser = parse_delimiter)]
    pub output_delimiter: Option<u8>,
    /// Print the first N rows as a table with column types instead of CSV
    #[arg(long)]
    pub preview: Option<usize>,
}

#[derive(Debug, Args)]
pub struct KpisArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Row-level filters such as `qty>=100` or `status = shipped`
    #[arg(long = "filter", action = clap::ArgAction::Append)]
    pub filters: Vec<String>,
    /// Earlier export used to compute KPI trends
    #[arg(long)]
    pub baseline: Option<PathBuf>,
    /// YAML file overriding KPI benchmarks
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,
    /// Emit JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct RecommendArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Row-level filters such as `qty>=100` or `status = shipped`
    #[arg(long = "filter", action = clap::ArgAction::Append)]
    pub filters: Vec<String>,
    /// YAML file overriding rule thresholds
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,
    /// Emit JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct RolesArgs {
    #[command(flatten)]
    pub input: InputArgs,
}

#[derive(Debug, Args)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Row-level filters such as `qty>=100` or `status = shipped`
    #[arg(long = "filter", action = clap::ArgAction::Append)]
    pub filters: Vec<String>,
    /// Emit JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
