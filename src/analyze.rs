use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use log::info;

use crate::{
    cli::{AnalyzeArgs, InputArgs},
    config::Settings,
    export::{self, AnalysisExport},
    filter::parse_filters,
    io_utils,
    kpi::KpiRecord,
    render, report,
    session::{Analysis, Session},
};

pub fn execute(args: &AnalyzeArgs) -> Result<()> {
    let settings = Settings::load_or_default(args.config.as_deref())?;
    let mut analysis = load_view(&args.input, &args.filters, settings.clone())?;
    if let Some(baseline) = &args.baseline {
        analysis = analysis.with_baseline(&load_baseline(baseline, &args.input, &settings)?);
    }

    print!("{}", render::render_kpis(&analysis.kpis, &settings.benchmarks));
    println!();
    print!("{}", render::render_recommendations(&analysis.recommendations));

    if let Some(path) = &args.report {
        report::write_report(
            path,
            &analysis.kpis,
            &analysis.recommendations,
            Local::now().naive_local(),
        )
        .with_context(|| format!("Writing report to {path:?}"))?;
        info!("Report written to {path:?}");
    }
    if let Some(path) = &args.json {
        export::write_json(
            path,
            &AnalysisExport::new(&analysis.kpis, &analysis.recommendations),
        )
        .with_context(|| format!("Writing JSON to {path:?}"))?;
        info!("JSON written to {path:?}");
    }
    if let Some(path) = &args.export {
        export::write_table(&analysis.table, Some(path), io_utils::DEFAULT_CSV_DELIMITER)
            .with_context(|| format!("Exporting table to {path:?}"))?;
        info!(
            "Exported {} row(s) to {path:?}",
            analysis.table.row_count()
        );
    }
    Ok(())
}

/// Loads `input` into a fresh session and returns the filtered view.
pub fn load_view(input: &InputArgs, filters: &[String], settings: Settings) -> Result<Analysis> {
    let conditions = parse_filters(filters)?;
    let options = input.read_options()?;
    let mut session = Session::new(settings);
    session
        .load(&input.input, &options)
        .with_context(|| format!("Analyzing {:?}", input.input))?;
    let analysis = session.view(&conditions)?;
    info!(
        "Derived {} KPI(s) and {} recommendation(s) from {} row(s)",
        analysis.kpis.len(),
        analysis.recommendations.len(),
        analysis.table.row_count()
    );
    Ok(analysis)
}

/// The baseline is read with the same delimiter and encoding as the input.
pub fn load_baseline(
    path: &Path,
    input: &InputArgs,
    settings: &Settings,
) -> Result<KpiRecord> {
    let options = input.read_options()?;
    let baseline = Analysis::load(path, &options, settings)
        .with_context(|| format!("Analyzing baseline {path:?}"))?;
    Ok(baseline.kpis)
}
