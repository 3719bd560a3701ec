//! Rule-based recommendation engine.
//!
//! Rules run in a fixed order and append to one list; the list is then
//! stable-sorted by priority so rule order survives inside each tier.
//! Rules never fail: they only read KPI values (through the fallback
//! accessor) and column names and types.

use std::{collections::BTreeMap, fmt};

use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    kpi::{Kpi, KpiRecord},
    roles::{Signal, name_matches},
    table::Table,
};

const SUPPLIER_KEYWORDS: &[&str] = &["supplier", "vendor"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn rank(self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub title: String,
    pub description: String,
    pub impact: String,
    pub effort: String,
    pub priority: Priority,
    pub category: String,
}

impl Recommendation {
    fn new(
        title: &str,
        description: impl Into<String>,
        impact: &str,
        effort: &str,
        priority: Priority,
        category: &str,
    ) -> Self {
        Self {
            title: title.to_string(),
            description: description.into(),
            impact: impact.to_string(),
            effort: effort.to_string(),
            priority,
            category: category.to_string(),
        }
    }
}

/// Thresholds the rules compare KPI values against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleThresholds {
    pub service_level_target: f64,
    pub service_level_critical: f64,
    pub service_level_ceiling: f64,
    pub otif_target: f64,
    pub otif_critical: f64,
    pub max_avg_lead_time: f64,
    pub lead_time_variance_ratio: f64,
    pub min_stock_turnover: f64,
    pub max_stock_turnover: f64,
    pub cost_variance_ratio: f64,
    pub max_missing_percent: f64,
    pub min_history_days: i64,
    pub risk_framework_after: usize,
}

impl Default for RuleThresholds {
    fn default() -> Self {
        Self {
            service_level_target: 90.0,
            service_level_critical: 80.0,
            service_level_ceiling: 98.0,
            otif_target: 85.0,
            otif_critical: 75.0,
            max_avg_lead_time: 14.0,
            lead_time_variance_ratio: 0.3,
            min_stock_turnover: 4.0,
            max_stock_turnover: 12.0,
            cost_variance_ratio: 0.1,
            max_missing_percent: 10.0,
            min_history_days: 90,
            risk_framework_after: 3,
        }
    }
}

pub fn recommend(table: &Table, kpis: &KpiRecord) -> Vec<Recommendation> {
    recommend_with(table, kpis, &RuleThresholds::default())
}

pub fn recommend_with(
    table: &Table,
    kpis: &KpiRecord,
    thresholds: &RuleThresholds,
) -> Vec<Recommendation> {
    let rules = Rules {
        table,
        kpis,
        limits: thresholds,
    };
    let mut out = Vec::new();
    rules.service_level(&mut out);
    rules.otif(&mut out);
    rules.lead_time(&mut out);
    rules.stock_turnover(&mut out);
    rules.cost(&mut out);
    rules.data_quality(&mut out);
    rules.strategic(&mut out);

    // `sort_by_key` is stable, so rule order is kept within a tier.
    out.sort_by_key(|rec| rec.priority.rank());
    debug!("Generated {} recommendation(s)", out.len());
    out
}

struct Rules<'a> {
    table: &'a Table,
    kpis: &'a KpiRecord,
    limits: &'a RuleThresholds,
}

impl Rules<'_> {
    fn has_column(&self, keywords: &[&str]) -> bool {
        self.table
            .column_names()
            .any(|name| name_matches(name, keywords))
    }

    fn has_supplier(&self) -> bool {
        self.has_column(SUPPLIER_KEYWORDS)
    }

    fn service_level(&self, out: &mut Vec<Recommendation>) {
        let service_level = self.kpis.value(Kpi::ServiceLevel);
        if service_level < self.limits.service_level_target {
            let priority = if service_level < self.limits.service_level_critical {
                Priority::High
            } else {
                Priority::Medium
            };
            out.push(Recommendation::new(
                "Improve Service Level Performance",
                format!(
                    "Current service level of {service_level:.1}% is below industry benchmark of {:.0}%. Consider implementing demand forecasting improvements, safety stock optimization, and supplier performance management programs.",
                    self.limits.service_level_target
                ),
                "High - Direct impact on customer satisfaction and retention",
                "Medium - Requires process improvements and supplier collaboration",
                priority,
                "Service Excellence",
            ));
            if self.has_supplier() {
                out.push(Recommendation::new(
                    "Implement Supplier Scorecards",
                    "Establish supplier performance scorecards to track delivery reliability, quality, and responsiveness. Focus improvement efforts on underperforming suppliers.",
                    "Medium - Improved supplier accountability and performance",
                    "Low - Can be implemented with existing data",
                    Priority::Medium,
                    "Supplier Management",
                ));
            }
        } else if service_level > self.limits.service_level_ceiling {
            out.push(Recommendation::new(
                "Optimize Service Level Costs",
                format!(
                    "Service level of {service_level:.1}% is exceptionally high. Evaluate if this level of service is cost-effective or if resources can be optimized without significantly impacting customer satisfaction."
                ),
                "Medium - Potential cost savings",
                "Low - Analysis and minor adjustments",
                Priority::Low,
                "Cost Optimization",
            ));
        }
    }

    fn otif(&self, out: &mut Vec<Recommendation>) {
        let otif_rate = self.kpis.value(Kpi::OtifRate);
        if otif_rate >= self.limits.otif_target {
            return;
        }
        let priority = if otif_rate < self.limits.otif_critical {
            Priority::High
        } else {
            Priority::Medium
        };
        out.push(Recommendation::new(
            "Enhance OTIF Delivery Performance",
            format!(
                "OTIF rate of {otif_rate:.1}% needs improvement. Focus on production planning accuracy, transportation reliability, and inventory positioning. Implement exception management processes for critical orders."
            ),
            "High - Critical for customer satisfaction and competitive advantage",
            "High - Requires cross-functional coordination",
            priority,
            "Delivery Excellence",
        ));
        if self.table.date_columns().next().is_some() {
            out.push(Recommendation::new(
                "Implement Real-time Order Tracking",
                "Deploy real-time order tracking and early warning systems to identify potential delays before they impact customer deliveries.",
                "Medium - Proactive issue resolution",
                "Medium - Technology implementation required",
                Priority::Medium,
                "Technology Enhancement",
            ));
        }
    }

    fn lead_time(&self, out: &mut Vec<Recommendation>) {
        let avg_lead_time = self.kpis.value(Kpi::AvgLeadTime);
        let variance = self.kpis.value(Kpi::LeadTimeVariance);
        if avg_lead_time > self.limits.max_avg_lead_time {
            out.push(Recommendation::new(
                "Reduce Average Lead Times",
                format!(
                    "Current average lead time of {avg_lead_time:.1} days is above optimal range. Investigate bottlenecks in the supply chain, streamline processes, and consider supplier consolidation or relocation."
                ),
                "High - Reduced working capital and improved customer responsiveness",
                "High - Requires supply chain redesign",
                Priority::High,
                "Process Optimization",
            ));
        }
        if variance > 0.0 && variance > avg_lead_time * self.limits.lead_time_variance_ratio {
            out.push(Recommendation::new(
                "Improve Lead Time Consistency",
                format!(
                    "High lead time variance ({variance:.1} days) indicates unpredictable delivery performance. Focus on process standardization and supplier performance management."
                ),
                "Medium - More predictable planning and customer expectations",
                "Medium - Process improvements and supplier training",
                Priority::Medium,
                "Process Standardization",
            ));
        }
    }

    fn stock_turnover(&self, out: &mut Vec<Recommendation>) {
        let turnover = self.kpis.value(Kpi::StockTurnover);
        if turnover < self.limits.min_stock_turnover {
            out.push(Recommendation::new(
                "Improve Inventory Turnover",
                format!(
                    "Stock turnover of {turnover:.1}x is below optimal range. Consider implementing ABC analysis, reducing slow-moving inventory, and improving demand forecasting accuracy."
                ),
                "High - Reduced carrying costs and improved cash flow",
                "Medium - Inventory management process improvements",
                Priority::High,
                "Inventory Optimization",
            ));
            if self.has_column(Signal::Product.keywords()) {
                out.push(Recommendation::new(
                    "Implement SKU Rationalization",
                    "Conduct SKU-level analysis to identify slow-moving products. Consider discontinuing low-turnover items or implementing different inventory strategies for different product categories.",
                    "Medium - Simplified operations and reduced costs",
                    "Medium - Analysis and stakeholder alignment required",
                    Priority::Medium,
                    "Product Portfolio",
                ));
            }
        } else if turnover > self.limits.max_stock_turnover {
            out.push(Recommendation::new(
                "Evaluate Stock-out Risks",
                format!(
                    "Very high stock turnover ({turnover:.1}x) may indicate potential stock-out risks. Ensure adequate safety stock levels while maintaining efficiency."
                ),
                "Medium - Balance between efficiency and service level",
                "Low - Safety stock analysis and adjustment",
                Priority::Low,
                "Risk Management",
            ));
        }
    }

    fn cost(&self, out: &mut Vec<Recommendation>) {
        if let (Some(total), Some(variance)) =
            (self.kpis.get(Kpi::TotalCost), self.kpis.get(Kpi::CostVariance))
            && variance > total * self.limits.cost_variance_ratio
        {
            out.push(Recommendation::new(
                "Standardize Cost Management",
                "High cost variance detected. Implement standardized pricing agreements, volume discounts, and cost monitoring processes to reduce cost volatility.",
                "Medium - More predictable cost structure",
                "Medium - Contract renegotiation and process implementation",
                Priority::Medium,
                "Cost Management",
            ));
        }
        if self.has_supplier() {
            out.push(Recommendation::new(
                "Explore Supplier Consolidation",
                "Analyze supplier base for consolidation opportunities. Reducing supplier count can lead to better pricing, simplified management, and improved relationships.",
                "Medium - Cost savings and operational efficiency",
                "High - Requires supplier evaluation and migration",
                Priority::Low,
                "Strategic Sourcing",
            ));
        }
    }

    fn data_quality(&self, out: &mut Vec<Recommendation>) {
        let total_cells = self.table.total_cells();
        if total_cells > 0 {
            let missing_percent = self.table.missing_cells() as f64 / total_cells as f64 * 100.0;
            if missing_percent > self.limits.max_missing_percent {
                out.push(Recommendation::new(
                    "Improve Data Quality",
                    format!(
                        "Data completeness is {:.1}%. Implement data governance processes, mandatory field validation, and regular data quality audits to improve analytics accuracy.",
                        100.0 - missing_percent
                    ),
                    "High - Better decision-making and accurate analytics",
                    "Medium - Process and system improvements",
                    Priority::Medium,
                    "Data Management",
                ));
            }
        }

        let Some(first_dates) = self.table.date_columns().next() else {
            return;
        };
        let (Some(earliest), Some(latest)) = (first_dates.dates().min(), first_dates.dates().max())
        else {
            return;
        };
        if (latest - earliest).num_days() < self.limits.min_history_days {
            out.push(Recommendation::new(
                "Expand Historical Data Collection",
                "Limited historical data range may impact trend analysis and forecasting accuracy. Consider extending data collection period for better insights.",
                "Medium - Improved forecasting and trend analysis",
                "Low - Data collection process adjustment",
                Priority::Low,
                "Analytics Enhancement",
            ));
        }
    }

    fn strategic(&self, out: &mut Vec<Recommendation>) {
        out.push(Recommendation::new(
            "Implement Supply Chain Digitalization",
            "Consider implementing advanced analytics, AI-powered forecasting, and IoT solutions for real-time supply chain visibility and predictive capabilities.",
            "High - Competitive advantage and operational excellence",
            "High - Significant technology investment required",
            Priority::Low,
            "Digital Transformation",
        ));
        out.push(Recommendation::new(
            "Develop Sustainability Metrics",
            "Incorporate environmental and sustainability KPIs into supply chain performance measurement. Track carbon footprint, sustainable sourcing, and circular economy initiatives.",
            "Medium - Brand value and regulatory compliance",
            "Medium - New metrics and reporting processes",
            Priority::Low,
            "Sustainability",
        ));
        if out.len() > self.limits.risk_framework_after {
            out.push(Recommendation::new(
                "Implement Risk Management Framework",
                "Given the identified performance gaps, establish a comprehensive supply chain risk management framework including supplier risk assessment, scenario planning, and contingency procedures.",
                "High - Business continuity and resilience",
                "High - Cross-functional initiative required",
                Priority::Medium,
                "Risk Management",
            ));
        }
    }
}

/// Counts of recommendations by priority and by category.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecommendationSummary {
    pub total: usize,
    pub by_priority: BTreeMap<Priority, usize>,
    pub by_category: BTreeMap<String, usize>,
}

impl RecommendationSummary {
    pub fn from_recommendations(recommendations: &[Recommendation]) -> Self {
        Self {
            total: recommendations.len(),
            by_priority: recommendations
                .iter()
                .map(|rec| rec.priority)
                .counts()
                .into_iter()
                .collect(),
            by_category: recommendations
                .iter()
                .map(|rec| rec.category.clone())
                .counts()
                .into_iter()
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{data::Value, table::Column};

    fn kpis(values: &[(Kpi, f64)]) -> KpiRecord {
        let mut record = KpiRecord::default();
        for (kpi, value) in values {
            record.insert(*kpi, *value);
        }
        record
    }

    fn text_table(names: &[&str]) -> Table {
        Table::from_columns(
            names
                .iter()
                .map(|name| Column::new(*name, vec![Some(Value::Text("x".into()))]))
                .collect(),
        )
        .unwrap()
    }

    fn titles(recs: &[Recommendation]) -> Vec<&str> {
        recs.iter().map(|rec| rec.title.as_str()).collect()
    }

    #[test]
    fn fallback_values_trigger_medium_rules_and_risk_framework() {
        let recs = recommend(&Table::empty(), &KpiRecord::default());
        assert_eq!(
            titles(&recs),
            vec![
                "Improve Service Level Performance",
                "Enhance OTIF Delivery Performance",
                "Implement Risk Management Framework",
                "Implement Supply Chain Digitalization",
                "Develop Sustainability Metrics",
            ]
        );
        assert_eq!(recs[0].priority, Priority::Medium);
    }

    #[test]
    fn risk_framework_needs_more_than_three_entries() {
        let healthy = kpis(&[(Kpi::ServiceLevel, 95.0), (Kpi::OtifRate, 95.0)]);
        let recs = recommend(&Table::empty(), &healthy);
        assert_eq!(
            titles(&recs),
            vec!["Implement Supply Chain Digitalization", "Develop Sustainability Metrics"]
        );
    }

    #[test]
    fn low_service_level_adds_supplier_scorecards() {
        let recs = recommend(
            &text_table(&["vendor_name"]),
            &kpis(&[(Kpi::ServiceLevel, 70.0), (Kpi::OtifRate, 90.0)]),
        );
        assert_eq!(recs[0].title, "Improve Service Level Performance");
        assert_eq!(recs[0].priority, Priority::High);
        assert!(recs[0].description.starts_with("Current service level of 70.0%"));
        assert!(titles(&recs).contains(&"Implement Supplier Scorecards"));
        assert!(titles(&recs).contains(&"Explore Supplier Consolidation"));
    }

    #[test]
    fn very_high_service_level_is_flagged_for_cost() {
        let recs = recommend(
            &Table::empty(),
            &kpis(&[(Kpi::ServiceLevel, 99.5), (Kpi::OtifRate, 90.0)]),
        );
        assert!(titles(&recs).contains(&"Optimize Service Level Costs"));
    }

    #[test]
    fn very_high_turnover_warns_about_stock_outs() {
        let healthy = [(Kpi::ServiceLevel, 95.0), (Kpi::OtifRate, 95.0)];
        let recs = recommend(
            &Table::empty(),
            &kpis(&[healthy[0], healthy[1], (Kpi::StockTurnover, 15.0)]),
        );
        let stock_out = recs
            .iter()
            .find(|rec| rec.title == "Evaluate Stock-out Risks")
            .expect("stock-out entry");
        assert_eq!(stock_out.priority, Priority::Low);
        assert_eq!(stock_out.category, "Risk Management");
        assert!(stock_out.description.starts_with("Very high stock turnover (15.0x)"));

        let at_ceiling = recommend(
            &Table::empty(),
            &kpis(&[healthy[0], healthy[1], (Kpi::StockTurnover, 12.0)]),
        );
        assert!(!titles(&at_ceiling).contains(&"Evaluate Stock-out Risks"));
    }

    #[test]
    fn sparse_tables_get_a_data_quality_entry() {
        let healthy = kpis(&[(Kpi::ServiceLevel, 95.0), (Kpi::OtifRate, 95.0)]);
        let qty = |v: f64| Some(Value::Number(v));
        let sparse = Table::from_columns(vec![
            Column::new("qty", vec![qty(1.0), None, qty(3.0), None]),
            Column::new("region", vec![Some(Value::Text("north".into())); 4]),
        ])
        .unwrap();
        let recs = recommend(&sparse, &healthy);
        let quality = recs
            .iter()
            .find(|rec| rec.title == "Improve Data Quality")
            .expect("data quality entry");
        assert_eq!(quality.priority, Priority::Medium);
        assert!(quality.description.starts_with("Data completeness is 75.0%"));

        let dense = recommend(&text_table(&["region", "status"]), &healthy);
        assert!(!titles(&dense).contains(&"Improve Data Quality"));
    }

    #[test]
    fn cost_rule_needs_both_cost_metrics() {
        let without_variance = recommend(&Table::empty(), &kpis(&[(Kpi::TotalCost, 100.0)]));
        assert!(!titles(&without_variance).contains(&"Standardize Cost Management"));
        let with_variance = recommend(
            &Table::empty(),
            &kpis(&[(Kpi::TotalCost, 100.0), (Kpi::CostVariance, 20.0)]),
        );
        assert!(titles(&with_variance).contains(&"Standardize Cost Management"));
    }

    #[test]
    fn short_history_is_reported() {
        let day = |d: u32| {
            Some(Value::Date(
                chrono::NaiveDate::from_ymd_opt(2024, 1, d)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap(),
            ))
        };
        let table = Table::from_columns(vec![Column::new("order_date", vec![day(1), day(20)])])
            .unwrap();
        let recs = recommend(&table, &kpis(&[(Kpi::OtifRate, 90.0)]));
        assert!(titles(&recs).contains(&"Expand Historical Data Collection"));
    }

    #[test]
    fn thresholds_are_configurable() {
        let strict = RuleThresholds {
            max_avg_lead_time: 5.0,
            ..RuleThresholds::default()
        };
        let recs = recommend_with(
            &Table::empty(),
            &kpis(&[(Kpi::AvgLeadTime, 8.0), (Kpi::LeadTimeVariance, 1.0)]),
            &strict,
        );
        assert_eq!(recs[0].title, "Reduce Average Lead Times");
    }

    #[test]
    fn summary_counts_by_priority_and_category() {
        let recs = recommend(&Table::empty(), &KpiRecord::default());
        let summary = RecommendationSummary::from_recommendations(&recs);
        assert_eq!(summary.total, 5);
        assert_eq!(summary.by_priority.get(&Priority::Medium), Some(&3));
        assert_eq!(summary.by_priority.get(&Priority::Low), Some(&2));
        assert_eq!(summary.by_category.get("Sustainability"), Some(&1));
    }
}
