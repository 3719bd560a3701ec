//! KPI derivation over a normalized table.
//!
//! Each KPI is computed by its own function returning [`KpiResult`]; a
//! failure (missing column, wrong column type, no rows, undefined statistic)
//! is logged and replaced by the KPI's default, so one KPI can never prevent
//! the others from being computed. Cost and fulfillment metrics have no
//! default: they are simply absent from the record when not computable.

use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize, Serializer, ser::SerializeMap};

use crate::{
    error::{KpiError, KpiResult},
    roles::Signal,
    stats::ColumnStats,
    table::{Column, Table},
};

pub const DEFAULT_SERVICE_LEVEL: f64 = 85.0;
pub const DEFAULT_STOCK_TURNOVER: f64 = 6.0;
pub const DEFAULT_OTIF_RATE: f64 = 80.0;
pub const DEFAULT_AVG_LEAD_TIME: f64 = 10.0;
pub const DEFAULT_LEAD_TIME_VARIANCE: f64 = 3.0;

const TURNOVER_ANNUALISATION: f64 = 12.0;
const MIN_ESTIMATED_TURNOVER: f64 = 0.1;
const PERFECT_ORDER_FACTOR: f64 = 0.9;
const FULFILLED_STATUS_KEYWORDS: &[&str] = &["complete", "fulfilled", "delivered", "closed", "done"];
const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kpi {
    ServiceLevel,
    StockTurnover,
    OtifRate,
    AvgLeadTime,
    LeadTimeVariance,
    TotalCost,
    CostPerUnit,
    CostVariance,
    FulfillmentRate,
    PerfectOrderRate,
}

impl Kpi {
    pub const CANONICAL: [Kpi; 8] = [
        Kpi::ServiceLevel,
        Kpi::OtifRate,
        Kpi::AvgLeadTime,
        Kpi::StockTurnover,
        Kpi::TotalCost,
        Kpi::CostPerUnit,
        Kpi::FulfillmentRate,
        Kpi::PerfectOrderRate,
    ];

    pub const ALL: [Kpi; 10] = [
        Kpi::ServiceLevel,
        Kpi::StockTurnover,
        Kpi::OtifRate,
        Kpi::AvgLeadTime,
        Kpi::LeadTimeVariance,
        Kpi::TotalCost,
        Kpi::CostPerUnit,
        Kpi::CostVariance,
        Kpi::FulfillmentRate,
        Kpi::PerfectOrderRate,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Kpi::ServiceLevel => "service_level",
            Kpi::StockTurnover => "stock_turnover",
            Kpi::OtifRate => "otif_rate",
            Kpi::AvgLeadTime => "avg_lead_time",
            Kpi::LeadTimeVariance => "lead_time_variance",
            Kpi::TotalCost => "total_cost",
            Kpi::CostPerUnit => "cost_per_unit",
            Kpi::CostVariance => "cost_variance",
            Kpi::FulfillmentRate => "fulfillment_rate",
            Kpi::PerfectOrderRate => "perfect_order_rate",
        }
    }

    pub fn from_name(name: &str) -> Option<Kpi> {
        Kpi::ALL.into_iter().find(|kpi| kpi.as_str() == name)
    }

    /// Value reported when the KPI cannot be computed.
    pub fn fallback(self) -> f64 {
        match self {
            Kpi::ServiceLevel => DEFAULT_SERVICE_LEVEL,
            Kpi::StockTurnover => DEFAULT_STOCK_TURNOVER,
            Kpi::OtifRate => DEFAULT_OTIF_RATE,
            Kpi::AvgLeadTime => DEFAULT_AVG_LEAD_TIME,
            Kpi::LeadTimeVariance => DEFAULT_LEAD_TIME_VARIANCE,
            Kpi::PerfectOrderRate => {
                DEFAULT_OTIF_RATE.min(DEFAULT_SERVICE_LEVEL) * PERFECT_ORDER_FACTOR
            }
            Kpi::TotalCost | Kpi::CostPerUnit | Kpi::CostVariance | Kpi::FulfillmentRate => 0.0,
        }
    }

    pub fn trend_key(self) -> String {
        format!("{}_trend", self.as_str())
    }
}

impl fmt::Display for Kpi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Entry {
    kpi: Kpi,
    value: f64,
    trend: f64,
}

/// Ordered KPI values with their paired trend figures.
///
/// Trends are `0.0` placeholders unless [`KpiRecord::apply_baseline`] was
/// called with an earlier snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KpiRecord {
    entries: Vec<Entry>,
}

impl KpiRecord {
    pub fn insert(&mut self, kpi: Kpi, value: f64) {
        match self.entries.iter_mut().find(|entry| entry.kpi == kpi) {
            Some(entry) => entry.value = value,
            None => self.entries.push(Entry {
                kpi,
                value,
                trend: 0.0,
            }),
        }
    }

    pub fn get(&self, kpi: Kpi) -> Option<f64> {
        self.entry(kpi).map(|entry| entry.value)
    }

    /// Stored value, or the KPI's fallback when it was not computed.
    pub fn value(&self, kpi: Kpi) -> f64 {
        self.get(kpi).unwrap_or_else(|| kpi.fallback())
    }

    pub fn contains(&self, kpi: Kpi) -> bool {
        self.entry(kpi).is_some()
    }

    pub fn trend(&self, kpi: Kpi) -> Option<f64> {
        self.entry(kpi).map(|entry| entry.trend)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Kpi, f64)> + '_ {
        self.entries.iter().map(|entry| (entry.kpi, entry.value))
    }

    /// Looks up either a KPI name or its `<name>_trend` companion.
    pub fn get_by_name(&self, name: &str) -> Option<f64> {
        if let Some(kpi) = Kpi::from_name(name) {
            return self.get(kpi);
        }
        let base = name.strip_suffix("_trend")?;
        self.trend(Kpi::from_name(base)?)
    }

    /// Flat `name -> value` pairs, each KPI followed by its trend.
    pub fn flatten(&self) -> Vec<(String, f64)> {
        self.entries
            .iter()
            .flat_map(|entry| {
                [
                    (entry.kpi.as_str().to_string(), entry.value),
                    (entry.kpi.trend_key(), entry.trend),
                ]
            })
            .collect()
    }

    /// Replaces placeholder trends with the relative change, in percent,
    /// against an earlier snapshot. KPIs missing from the baseline keep `0.0`.
    pub fn apply_baseline(&mut self, baseline: &KpiRecord) {
        for entry in &mut self.entries {
            entry.trend = match baseline.get(entry.kpi) {
                Some(previous) if previous != 0.0 => {
                    (entry.value - previous) / previous.abs() * 100.0
                }
                _ => 0.0,
            };
        }
    }

    fn entry(&self, kpi: Kpi) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.kpi == kpi)
    }
}

impl Serialize for KpiRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let flat = self.flatten();
        let mut map = serializer.serialize_map(Some(flat.len()))?;
        for (name, value) in &flat {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

pub fn derive_kpis(table: &Table) -> KpiRecord {
    let mut record = KpiRecord::default();

    record.insert(
        Kpi::ServiceLevel,
        guarded(Kpi::ServiceLevel, service_level(table)),
    );
    record.insert(
        Kpi::StockTurnover,
        guarded(Kpi::StockTurnover, stock_turnover(table)),
    );
    record.insert(Kpi::OtifRate, guarded(Kpi::OtifRate, otif_rate(table)));

    let lead_times = lead_time_samples(table).map(ColumnStats::from_values);
    let avg_lead_time = lead_times.clone().and_then(|stats| {
        stats
            .mean()
            .ok_or(KpiError::Undefined("average lead time"))
    });
    let lead_time_variance = lead_times.and_then(|stats| {
        stats
            .std_dev()
            .ok_or(KpiError::Undefined("lead time variance"))
    });
    record.insert(Kpi::AvgLeadTime, guarded(Kpi::AvgLeadTime, avg_lead_time));
    record.insert(
        Kpi::LeadTimeVariance,
        guarded(Kpi::LeadTimeVariance, lead_time_variance),
    );

    match cost_metrics(table) {
        Ok(cost) => {
            record.insert(Kpi::TotalCost, cost.total);
            if let Some(per_unit) = cost.per_unit {
                record.insert(Kpi::CostPerUnit, per_unit);
            }
            if let Some(variance) = cost.variance {
                record.insert(Kpi::CostVariance, variance);
            }
        }
        Err(err) => debug!("Cost metrics skipped: {err}"),
    }

    match fulfillment_rate(table) {
        Ok(rate) => record.insert(Kpi::FulfillmentRate, rate),
        Err(err) => debug!("{} skipped: {err}", Kpi::FulfillmentRate),
    }

    let perfect_order = record
        .value(Kpi::OtifRate)
        .min(record.value(Kpi::ServiceLevel))
        * PERFECT_ORDER_FACTOR;
    record.insert(Kpi::PerfectOrderRate, perfect_order);

    record
}

fn guarded(kpi: Kpi, result: KpiResult<f64>) -> f64 {
    match result {
        Ok(value) if value.is_finite() => value,
        Ok(value) => {
            debug!("{kpi} evaluated to {value}; using default {}", kpi.fallback());
            kpi.fallback()
        }
        Err(err) => {
            debug!("{kpi} falls back to default {}: {err}", kpi.fallback());
            kpi.fallback()
        }
    }
}

fn numeric_column(table: &Table, signal: Signal) -> KpiResult<&Column> {
    let column = signal
        .resolve(table)
        .ok_or(KpiError::MissingColumn(signal.keywords()))?;
    if column.is_numeric() {
        Ok(column)
    } else {
        Err(KpiError::NotNumeric(column.name.clone()))
    }
}

fn date_column(table: &Table, signal: Signal) -> KpiResult<&Column> {
    let column = signal
        .resolve(table)
        .ok_or(KpiError::MissingColumn(signal.keywords()))?;
    if column.is_date() {
        Ok(column)
    } else {
        Err(KpiError::NotDate(column.name.clone()))
    }
}

fn share_of_rows(flags: impl Iterator<Item = bool>, rows: usize) -> f64 {
    flags.filter(|flag| *flag).count() as f64 / rows as f64 * 100.0
}

/// Delivered over demanded units, capped at 100. Without any demand column
/// the share of rows with stock on hand is used instead.
fn service_level(table: &Table) -> KpiResult<f64> {
    let has_demand = Signal::Demand.present_in(table);
    if has_demand && Signal::Delivered.present_in(table) {
        let demand: f64 = numeric_column(table, Signal::Demand)?.numbers().sum();
        let delivered: f64 = numeric_column(table, Signal::Delivered)?.numbers().sum();
        if demand <= 0.0 {
            return Err(KpiError::Undefined("service level without positive demand"));
        }
        return Ok((delivered / demand * 100.0).min(100.0));
    }
    if !has_demand && Signal::StockLevel.present_in(table) {
        let stock = numeric_column(table, Signal::StockLevel)?;
        let rows = table.row_count();
        if rows == 0 {
            return Err(KpiError::NoRows);
        }
        let in_stock = (0..rows).map(|row| stock.number_at(row).is_some_and(|v| v > 0.0));
        return Ok(share_of_rows(in_stock, rows));
    }
    Err(KpiError::MissingColumn(Signal::Delivered.keywords()))
}

/// Sales over average stock; without sales data, an annualised dispersion
/// proxy of ordered quantities.
fn stock_turnover(table: &Table) -> KpiResult<f64> {
    if Signal::Sales.present_in(table) && Signal::StockBalance.present_in(table) {
        let sales: f64 = numeric_column(table, Signal::Sales)?.numbers().sum();
        let average_stock = ColumnStats::from_values(
            numeric_column(table, Signal::StockBalance)?.numbers(),
        )
        .mean()
        .ok_or(KpiError::Undefined("average stock"))?;
        if average_stock <= 0.0 {
            return Err(KpiError::Undefined("turnover without positive stock"));
        }
        return Ok(sales / average_stock);
    }
    if Signal::OrderedUnits.present_in(table) {
        if table.row_count() < 2 {
            return Err(KpiError::Undefined("turnover estimate from a single row"));
        }
        let stats = ColumnStats::from_values(numeric_column(table, Signal::OrderedUnits)?.numbers());
        let (Some(mean), Some(std_dev)) = (stats.mean(), stats.std_dev()) else {
            return Err(KpiError::Undefined("quantity dispersion"));
        };
        if mean <= 0.0 {
            return Err(KpiError::Undefined("turnover without positive quantities"));
        }
        return Ok((std_dev / mean * TURNOVER_ANNUALISATION).max(MIN_ESTIMATED_TURNOVER));
    }
    Err(KpiError::MissingColumn(Signal::Sales.keywords()))
}

/// Per-row on-time flags; rows missing either date count as late.
fn on_time_flags(table: &Table) -> KpiResult<Vec<bool>> {
    let delivered = date_column(table, Signal::DeliveryDate)?;
    let requested = date_column(table, Signal::RequestedDate)?;
    Ok((0..table.row_count())
        .map(|row| match (delivered.date_at(row), requested.date_at(row)) {
            (Some(actual), Some(due)) => actual <= due,
            _ => false,
        })
        .collect())
}

/// Per-row in-full flags; rows missing either quantity count as short.
fn in_full_flags(table: &Table) -> KpiResult<Vec<bool>> {
    let ordered = numeric_column(table, Signal::OrderedUnits)?;
    let shipped = numeric_column(table, Signal::ShippedUnits)?;
    Ok((0..table.row_count())
        .map(|row| match (shipped.number_at(row), ordered.number_at(row)) {
            (Some(shipped), Some(ordered)) => shipped >= ordered,
            _ => false,
        })
        .collect())
}

fn otif_rate(table: &Table) -> KpiResult<f64> {
    let rows = table.row_count();
    if rows == 0 {
        return Err(KpiError::NoRows);
    }
    let on_time = on_time_flags(table);
    let in_full = in_full_flags(table);
    match (on_time, in_full) {
        (Ok(on_time), Ok(in_full)) => Ok(share_of_rows(
            on_time.iter().zip(&in_full).map(|(t, f)| *t && *f),
            rows,
        )),
        (Ok(on_time), Err(err)) => {
            debug!("{} uses on-time share only: {err}", Kpi::OtifRate);
            Ok(share_of_rows(on_time.into_iter(), rows))
        }
        (Err(err), Ok(in_full)) => {
            debug!("{} uses in-full share only: {err}", Kpi::OtifRate);
            Ok(share_of_rows(in_full.into_iter(), rows))
        }
        (Err(err), Err(_)) => Err(err),
    }
}

/// Lead times in days: an explicit lead-time column when present, otherwise
/// whole days between order and delivery dates.
fn lead_time_samples(table: &Table) -> KpiResult<Vec<f64>> {
    if Signal::LeadTime.present_in(table) {
        return Ok(numeric_column(table, Signal::LeadTime)?.numbers().collect());
    }
    let ordered = date_column(table, Signal::OrderDate)?;
    let delivered = date_column(table, Signal::DeliveryEvent)?;
    Ok((0..table.row_count())
        .filter_map(|row| {
            let elapsed = delivered.date_at(row)? - ordered.date_at(row)?;
            Some(elapsed.num_seconds().div_euclid(SECONDS_PER_DAY) as f64)
        })
        .collect())
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct CostMetrics {
    total: f64,
    per_unit: Option<f64>,
    variance: Option<f64>,
}

fn cost_metrics(table: &Table) -> KpiResult<CostMetrics> {
    let stats = ColumnStats::from_values(numeric_column(table, Signal::Cost)?.numbers());
    let total = stats.sum();
    let per_unit = numeric_column(table, Signal::OrderedUnits)
        .ok()
        .map(|column| column.numbers().sum::<f64>())
        .filter(|units| *units > 0.0)
        .map(|units| total / units);
    Ok(CostMetrics {
        total,
        per_unit,
        variance: stats.std_dev(),
    })
}

fn fulfillment_rate(table: &Table) -> KpiResult<f64> {
    let status = Signal::Status
        .resolve(table)
        .ok_or(KpiError::MissingColumn(Signal::Status.keywords()))?;
    let rows = table.row_count();
    if rows == 0 {
        return Err(KpiError::NoRows);
    }
    let fulfilled = status.cells.iter().map(|cell| {
        cell.as_ref().is_some_and(|value| {
            let text = value.as_display().to_lowercase();
            FULFILLED_STATUS_KEYWORDS
                .iter()
                .any(|keyword| text.contains(keyword))
        })
    });
    Ok(share_of_rows(fulfilled, rows))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum KpiStatus {
    Good,
    Average,
    Poor,
    Monitor,
}

impl KpiStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            KpiStatus::Good => "Good",
            KpiStatus::Average => "Average",
            KpiStatus::Poor => "Poor",
            KpiStatus::Monitor => "Monitor",
        }
    }
}

impl fmt::Display for KpiStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Benchmark {
    pub good: f64,
    pub average: f64,
    #[serde(default)]
    pub lower_is_better: bool,
}

impl Benchmark {
    pub const fn higher(good: f64, average: f64) -> Self {
        Self {
            good,
            average,
            lower_is_better: false,
        }
    }

    pub const fn lower(good: f64, average: f64) -> Self {
        Self {
            good,
            average,
            lower_is_better: true,
        }
    }

    pub fn classify(&self, value: f64) -> KpiStatus {
        let (good, average) = if self.lower_is_better {
            (value <= self.good, value <= self.average)
        } else {
            (value >= self.good, value >= self.average)
        };
        if good {
            KpiStatus::Good
        } else if average {
            KpiStatus::Average
        } else {
            KpiStatus::Poor
        }
    }
}

/// Industry reference points used to label KPI values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Benchmarks {
    pub service_level: Benchmark,
    pub otif_rate: Benchmark,
    pub stock_turnover: Benchmark,
    pub avg_lead_time: Benchmark,
    pub fulfillment_rate: Benchmark,
}

impl Default for Benchmarks {
    fn default() -> Self {
        Self {
            service_level: Benchmark::higher(95.0, 85.0),
            otif_rate: Benchmark::higher(90.0, 75.0),
            stock_turnover: Benchmark::higher(8.0, 4.0),
            avg_lead_time: Benchmark::lower(7.0, 14.0),
            fulfillment_rate: Benchmark::higher(95.0, 85.0),
        }
    }
}

impl Benchmarks {
    pub fn status(&self, kpi: Kpi, value: f64) -> KpiStatus {
        let benchmark = match kpi {
            Kpi::ServiceLevel => &self.service_level,
            Kpi::OtifRate => &self.otif_rate,
            Kpi::StockTurnover => &self.stock_turnover,
            Kpi::AvgLeadTime => &self.avg_lead_time,
            Kpi::FulfillmentRate => &self.fulfillment_rate,
            _ => return KpiStatus::Monitor,
        };
        benchmark.classify(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Value;
    use chrono::NaiveDate;

    fn numbers(name: &str, values: &[f64]) -> Column {
        Column::new(name, values.iter().map(|v| Some(Value::Number(*v))).collect())
    }

    fn dates(name: &str, values: &[(i32, u32, u32)]) -> Column {
        Column::new(
            name,
            values
                .iter()
                .map(|(y, m, d)| {
                    Some(Value::Date(
                        NaiveDate::from_ymd_opt(*y, *m, *d)
                            .unwrap()
                            .and_hms_opt(0, 0, 0)
                            .unwrap(),
                    ))
                })
                .collect(),
        )
    }

    fn texts(name: &str, values: &[&str]) -> Column {
        Column::new(
            name,
            values.iter().map(|v| Some(Value::Text(v.to_string()))).collect(),
        )
    }

    fn table(columns: Vec<Column>) -> Table {
        Table::from_columns(columns).unwrap()
    }

    #[test]
    fn service_level_falls_back_to_stock_presence() {
        let t = table(vec![numbers("stock_on_hand", &[5.0, 0.0, 3.0, 0.0])]);
        assert_eq!(service_level(&t), Ok(50.0));
    }

    #[test]
    fn service_level_rejects_text_columns() {
        let t = table(vec![
            texts("quantity", &["a", "b"]),
            numbers("delivered", &[1.0, 2.0]),
        ]);
        assert_eq!(
            service_level(&t),
            Err(KpiError::NotNumeric("quantity".to_string()))
        );
        assert_eq!(derive_kpis(&t).get(Kpi::ServiceLevel), Some(DEFAULT_SERVICE_LEVEL));
    }

    #[test]
    fn stock_turnover_uses_sales_over_average_stock() {
        let t = table(vec![
            numbers("units_sold", &[30.0, 50.0]),
            numbers("inventory", &[10.0, 30.0]),
        ]);
        assert_eq!(stock_turnover(&t), Ok(4.0));
    }

    #[test]
    fn stock_turnover_estimate_is_floored() {
        let t = table(vec![numbers("qty", &[10.0, 10.0, 10.0])]);
        assert_eq!(stock_turnover(&t), Ok(MIN_ESTIMATED_TURNOVER));
    }

    #[test]
    fn otif_combines_on_time_and_in_full() {
        let t = table(vec![
            dates("delivery_date", &[(2024, 1, 5), (2024, 1, 9), (2024, 1, 3), (2024, 1, 2)]),
            dates("promised_date", &[(2024, 1, 6), (2024, 1, 8), (2024, 1, 3), (2024, 1, 2)]),
            numbers("qty", &[10.0, 10.0, 10.0, 10.0]),
            numbers("shipped", &[10.0, 10.0, 8.0, 12.0]),
        ]);
        // rows 0 and 3 are both on time and in full
        assert_eq!(otif_rate(&t), Ok(50.0));
    }

    #[test]
    fn otif_falls_back_to_in_full_share() {
        let t = table(vec![
            numbers("qty", &[10.0, 10.0]),
            numbers("shipped", &[10.0, 5.0]),
        ]);
        assert_eq!(otif_rate(&t), Ok(50.0));
    }

    #[test]
    fn lead_time_from_date_difference_uses_whole_days() {
        let t = table(vec![
            dates("order_date", &[(2024, 1, 1), (2024, 1, 1)]),
            dates("delivery_date", &[(2024, 1, 4), (2024, 1, 8)]),
        ]);
        assert_eq!(lead_time_samples(&t), Ok(vec![3.0, 7.0]));
        let kpis = derive_kpis(&t);
        assert_eq!(kpis.get(Kpi::AvgLeadTime), Some(5.0));
    }

    #[test]
    fn cost_metrics_are_absent_without_cost_column() {
        let kpis = derive_kpis(&table(vec![numbers("qty", &[1.0, 2.0])]));
        assert!(!kpis.contains(Kpi::TotalCost));
        assert!(!kpis.contains(Kpi::CostPerUnit));
        assert!(!kpis.contains(Kpi::CostVariance));
        assert_eq!(kpis.value(Kpi::TotalCost), 0.0);
    }

    #[test]
    fn cost_metrics_divide_by_total_quantity() {
        let kpis = derive_kpis(&table(vec![
            numbers("unit_cost", &[100.0, 300.0]),
            numbers("qty", &[10.0, 10.0]),
        ]));
        assert_eq!(kpis.get(Kpi::TotalCost), Some(400.0));
        assert_eq!(kpis.get(Kpi::CostPerUnit), Some(20.0));
        assert!(kpis.get(Kpi::CostVariance).unwrap() > 141.0);
    }

    #[test]
    fn fulfillment_counts_each_row_once() {
        let t = table(vec![texts(
            "order_status",
            &["Delivered - Complete", "open", "CLOSED", "pending"],
        )]);
        assert_eq!(fulfillment_rate(&t), Ok(50.0));
    }

    #[test]
    fn baseline_trends_are_relative_changes() {
        let mut current = KpiRecord::default();
        current.insert(Kpi::ServiceLevel, 90.0);
        current.insert(Kpi::OtifRate, 80.0);
        let mut baseline = KpiRecord::default();
        baseline.insert(Kpi::ServiceLevel, 80.0);
        current.apply_baseline(&baseline);
        assert_eq!(current.trend(Kpi::ServiceLevel), Some(12.5));
        assert_eq!(current.trend(Kpi::OtifRate), Some(0.0));
        assert_eq!(current.get_by_name("service_level_trend"), Some(12.5));
    }

    #[test]
    fn record_serializes_in_insertion_order_with_trends() {
        let mut record = KpiRecord::default();
        record.insert(Kpi::OtifRate, 80.0);
        record.insert(Kpi::ServiceLevel, 85.0);
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"otif_rate":80.0,"otif_rate_trend":0.0,"service_level":85.0,"service_level_trend":0.0}"#
        );
    }

    #[test]
    fn benchmarks_classify_in_both_directions() {
        let benchmarks = Benchmarks::default();
        assert_eq!(benchmarks.status(Kpi::ServiceLevel, 96.0), KpiStatus::Good);
        assert_eq!(benchmarks.status(Kpi::ServiceLevel, 86.0), KpiStatus::Average);
        assert_eq!(benchmarks.status(Kpi::AvgLeadTime, 20.0), KpiStatus::Poor);
        assert_eq!(benchmarks.status(Kpi::AvgLeadTime, 5.0), KpiStatus::Good);
        assert_eq!(benchmarks.status(Kpi::TotalCost, 5.0), KpiStatus::Monitor);
    }
}
