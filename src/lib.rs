pub mod analyze;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod export;
pub mod filter;
pub mod ingest;
pub mod io_utils;
pub mod kpi;
pub mod normalize;
pub mod recommend;
pub mod render;
pub mod report;
pub mod roles;
pub mod session;
pub mod stats;
pub mod summary;
pub mod table;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info};

use crate::{
    cli::{Cli, Commands},
    config::Settings,
    ingest::read_table,
    normalize::normalize,
    summary::DataSummary,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("supply_chain_insights", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Analyze(args) => analyze::execute(&args),
        Commands::Normalize(args) => handle_normalize(&args),
        Commands::Kpis(args) => handle_kpis(&args),
        Commands::Recommend(args) => handle_recommend(&args),
        Commands::Roles(args) => handle_roles(&args),
        Commands::Summary(args) => handle_summary(&args),
    }
}

fn load_table(input: &cli::InputArgs) -> Result<table::Table> {
    info!(
        "Reading '{}' with delimiter '{}'",
        input.input.display(),
        printable_delimiter(io_utils::resolve_input_delimiter(
            &input.input,
            input.delimiter
        ))
    );
    let options = input.read_options()?;
    let raw = read_table(&input.input, &options)
        .with_context(|| format!("Reading {:?}", input.input))?;
    Ok(normalize(raw))
}

fn handle_normalize(args: &cli::NormalizeArgs) -> Result<()> {
    let table = load_table(&args.input)?;
    if let Some(limit) = args.preview {
        print!("{}", render::render_preview(&table, limit));
        return Ok(());
    }
    let delimiter = args
        .output_delimiter
        .unwrap_or(io_utils::DEFAULT_CSV_DELIMITER);
    export::write_table(&table, args.output.as_deref(), delimiter)?;
    if let Some(path) = &args.output {
        info!(
            "Normalized table with {} row(s) x {} column(s) written to {:?}",
            table.row_count(),
            table.column_count(),
            path
        );
    }
    Ok(())
}

fn handle_kpis(args: &cli::KpisArgs) -> Result<()> {
    let settings = Settings::load_or_default(args.config.as_deref())?;
    let mut analysis = analyze::load_view(&args.input, &args.filters, settings.clone())?;
    if let Some(baseline) = &args.baseline {
        analysis = analysis.with_baseline(&analyze::load_baseline(
            baseline,
            &args.input,
            &settings,
        )?);
    }
    if args.json {
        println!("{}", export::to_json(&analysis.kpis)?);
    } else {
        print!("{}", render::render_kpis(&analysis.kpis, &settings.benchmarks));
    }
    Ok(())
}

fn handle_recommend(args: &cli::RecommendArgs) -> Result<()> {
    let settings = Settings::load_or_default(args.config.as_deref())?;
    let analysis = analyze::load_view(&args.input, &args.filters, settings)?;
    if args.json {
        println!("{}", export::to_json(&analysis.recommendations)?);
    } else {
        print!("{}", render::render_recommendations(&analysis.recommendations));
    }
    Ok(())
}

fn handle_roles(args: &cli::RolesArgs) -> Result<()> {
    let table = load_table(&args.input)?;
    print!("{}", render::render_roles(&roles::detect_roles(&table)));
    Ok(())
}

fn handle_summary(args: &cli::SummaryArgs) -> Result<()> {
    let table = load_table(&args.input)?;
    let conditions = filter::parse_filters(&args.filters)?;
    let table = filter::apply_filters(&table, &conditions)?;
    let summary = DataSummary::from_table(&table);
    if args.json {
        println!("{}", export::to_json(&summary)?);
    } else {
        print!("{}", render::render_summary(&summary, &table));
    }
    Ok(())
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}
