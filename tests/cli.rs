mod common;

use std::fs;

use assert_cmd::Command;
use common::{TestWorkspace, fixture_path};
use predicates::prelude::*;
use predicates::str::contains;

fn bin() -> Command {
    Command::cargo_bin("supply-chain-insights").expect("binary exists")
}

#[test]
fn analyze_prints_kpis_and_recommendations() {
    let input = fixture_path("shipments.csv");
    bin()
        .args(["analyze", "-i", input.to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("Service Level"))
        .stdout(contains("Otif Rate"))
        .stdout(contains("62.50"))
        .stdout(contains("Enhance OTIF Delivery Performance"));
}

#[test]
fn analyze_writes_report_json_and_export() {
    let workspace = TestWorkspace::new();
    let input = fixture_path("shipments.csv");
    let report = workspace.path().join("report.txt");
    let json = workspace.path().join("analysis.json");
    let export = workspace.path().join("normalized.csv");
    bin()
        .args([
            "analyze",
            "-i",
            input.to_str().unwrap(),
            "--report",
            report.to_str().unwrap(),
            "--json",
            json.to_str().unwrap(),
            "--export",
            export.to_str().unwrap(),
        ])
        .assert()
        .success();

    let report = fs::read_to_string(&report).expect("read report");
    assert!(report.contains("SUPPLY CHAIN ANALYSIS REPORT"));
    assert!(report.contains("=== KEY PERFORMANCE INDICATORS ==="));
    assert!(report.contains("Avg Lead Time: 8.25"));
    assert!(report.contains("1. Enhance OTIF Delivery Performance (Priority: High)"));
    assert!(report.contains("   Impact: High - Critical for customer satisfaction"));

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&json).expect("read json")).expect("parse json");
    assert_eq!(json["kpis"]["otif_rate"], 62.5);
    assert_eq!(json["kpis"]["otif_rate_trend"], 0.0);
    assert_eq!(json["recommendations"][0]["priority"], "High");
    assert_eq!(json["summary"]["total"], 11);

    let exported = fs::read_to_string(&export).expect("read export");
    assert!(exported.starts_with("po_number,product_sku,supplier,quantity,delivery_date"));
    assert!(exported.contains("2024-01-08"));
}

#[test]
fn filters_restrict_the_analysis() {
    let input = fixture_path("shipments.csv");
    bin()
        .args([
            "kpis",
            "-i",
            input.to_str().unwrap(),
            "--filter",
            "supplier = Globex",
            "--json",
        ])
        .assert()
        .success()
        .stdout(contains("\"service_level\": 95.45"))
        .stdout(contains("\"otif_rate\": 50.0"));
}

#[test]
fn baseline_fills_trends() {
    let workspace = TestWorkspace::new();
    let current = workspace.write("current.csv", "quantity,delivered\n100,90\n100,90\n");
    let baseline = workspace.write("baseline.csv", "quantity,delivered\n100,80\n100,80\n");
    bin()
        .args([
            "kpis",
            "-i",
            current.to_str().unwrap(),
            "--baseline",
            baseline.to_str().unwrap(),
            "--json",
        ])
        .assert()
        .success()
        .stdout(contains("\"service_level_trend\": 12.5"));
}

#[test]
fn config_overrides_rule_thresholds() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("lead.csv", "lead_time\n8\n9\n");
    let config = workspace.write("rules.yml", "rules:\n  max_avg_lead_time: 5\n");
    bin()
        .args(["recommend", "-i", input.to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("Reduce Average Lead Times").not());
    bin()
        .args([
            "recommend",
            "-i",
            input.to_str().unwrap(),
            "--config",
            config.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(contains("Reduce Average Lead Times"));
}

#[test]
fn unsupported_format_fails_with_format_error() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("orders.pdf", "not a table");
    bin()
        .args(["analyze", "-i", input.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(contains("unsupported file format '.pdf'"));
}

#[test]
fn normalize_reads_stdin_and_writes_csv() {
    bin()
        .args(["normalize", "-i", "-"])
        .write_stdin("Order Date, Qty ,Notes\n2024-01-02,\"1,200\",\n2024-01-03,15,\n")
        .assert()
        .success()
        .stdout(contains("order_date,qty\n2024-01-02,1200\n2024-01-03,15\n"));
}

#[test]
fn normalize_preview_shows_column_types() {
    let input = fixture_path("shipments.csv");
    bin()
        .args(["normalize", "-i", input.to_str().unwrap(), "--preview", "2"])
        .assert()
        .success()
        .stdout(contains("delivery_date (date)"))
        .stdout(contains("supplier (text)"))
        .stdout(contains("SKU-A"))
        .stdout(contains("Initech").not());
}

#[test]
fn roles_and_summary_commands_report_columns() {
    let input = fixture_path("shipments.csv");
    bin()
        .args(["roles", "-i", input.to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("supplier"))
        .stdout(contains("product_sku"));
    bin()
        .args(["summary", "-i", input.to_str().unwrap(), "--json"])
        .assert()
        .success()
        .stdout(contains("\"total_rows\": 8"))
        .stdout(contains("\"date_columns\": 3"))
        .stdout(contains("\"duplicate_rows\": 0"));
}

#[test]
fn analyze_exports_a_workbook_for_xlsx_paths() {
    let workspace = TestWorkspace::new();
    let input = fixture_path("shipments.csv");
    let export = workspace.path().join("filtered.xlsx");
    bin()
        .args([
            "analyze",
            "-i",
            input.to_str().unwrap(),
            "--filter",
            "supplier = Acme Corp",
            "--export",
            export.to_str().unwrap(),
        ])
        .assert()
        .success();

    let raw = supply_chain_insights::ingest::read_table(
        &export,
        &supply_chain_insights::ingest::ReadOptions::default(),
    )
    .expect("read exported workbook");
    assert_eq!(raw.height(), 3);
    assert_eq!(raw.headers[2], "supplier");
}
