//! Plain-text analysis report.

use std::{fmt::Write as _, path::Path};

use anyhow::Result;
use chrono::NaiveDateTime;
use heck::ToTitleCase;

use crate::{io_utils, kpi::KpiRecord, recommend::Recommendation};

pub const REPORT_TITLE: &str = "SUPPLY CHAIN ANALYSIS REPORT";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// `otif_rate` becomes `Otif Rate`.
pub fn kpi_label(name: &str) -> String {
    name.to_title_case()
}

pub fn render_report(
    kpis: &KpiRecord,
    recommendations: &[Recommendation],
    generated_at: NaiveDateTime,
) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(out);
    let _ = writeln!(out, "{REPORT_TITLE}");
    let _ = writeln!(out, "Generated on: {}", generated_at.format(TIMESTAMP_FORMAT));
    let _ = writeln!(out);
    let _ = writeln!(out, "=== KEY PERFORMANCE INDICATORS ===");
    for (kpi, value) in kpis.iter() {
        let _ = writeln!(out, "{}: {value:.2}", kpi_label(kpi.as_str()));
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "=== BUSINESS RECOMMENDATIONS ===");
    if recommendations.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "No recommendations generated.");
    }
    for (idx, rec) in recommendations.iter().enumerate() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}. {} (Priority: {})", idx + 1, rec.title, rec.priority);
        let _ = writeln!(out, "   Description: {}", rec.description);
        let _ = writeln!(out, "   Impact: {}", rec.impact);
        let _ = writeln!(out, "   Effort: {}", rec.effort);
    }
    out
}

pub fn write_report(
    path: &Path,
    kpis: &KpiRecord,
    recommendations: &[Recommendation],
    generated_at: NaiveDateTime,
) -> Result<()> {
    io_utils::write_text(path, &render_report(kpis, recommendations, generated_at))
}
