//! Session context: the table, its KPIs and its recommendations travel
//! together and are replaced as one unit.

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use log::info;

use crate::{
    config::Settings,
    filter::{FilterCondition, apply_filters},
    ingest::{ReadOptions, read_table},
    kpi::{KpiRecord, derive_kpis},
    normalize::normalize,
    recommend::{Recommendation, recommend_with},
    table::Table,
};

/// One complete pipeline run over a single table.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub table: Table,
    pub kpis: KpiRecord,
    pub recommendations: Vec<Recommendation>,
}

impl Analysis {
    pub fn from_table(table: Table, settings: &Settings) -> Self {
        let kpis = derive_kpis(&table);
        let recommendations = recommend_with(&table, &kpis, &settings.rules);
        Self {
            table,
            kpis,
            recommendations,
        }
    }

    pub fn load(path: &Path, options: &ReadOptions, settings: &Settings) -> Result<Self> {
        let raw = read_table(path, options)?;
        let table = normalize(raw);
        info!(
            "Normalized {:?} to {} row(s) x {} column(s)",
            path,
            table.row_count(),
            table.column_count()
        );
        Ok(Self::from_table(table, settings))
    }

    /// Recomputes KPIs and recommendations for the filtered view of this
    /// analysis' table; `self` is left as it is.
    pub fn view(&self, conditions: &[FilterCondition], settings: &Settings) -> Result<Self> {
        let table = apply_filters(&self.table, conditions).context("Applying filters")?;
        Ok(Self::from_table(table, settings))
    }

    /// Fills trends from a baseline analysis of an earlier export.
    pub fn with_baseline(mut self, baseline: &KpiRecord) -> Self {
        self.kpis.apply_baseline(baseline);
        self
    }
}

/// Holds the current analysis for one user. Each session owns its data;
/// nothing is shared between sessions.
#[derive(Debug, Default)]
pub struct Session {
    settings: Settings,
    current: Option<Analysis>,
}

impl Session {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            current: None,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn current(&self) -> Option<&Analysis> {
        self.current.as_ref()
    }

    /// Runs the whole pipeline on `path` and swaps the result in. When any
    /// step fails the previous analysis stays in place.
    pub fn load(&mut self, path: &Path, options: &ReadOptions) -> Result<&Analysis> {
        let analysis = Analysis::load(path, options, &self.settings)?;
        Ok(self.replace(analysis))
    }

    /// The current analysis restricted to the rows matching `conditions`.
    pub fn view(&self, conditions: &[FilterCondition]) -> Result<Analysis> {
        let current = self
            .current
            .as_ref()
            .ok_or_else(|| anyhow!("No data has been loaded into the session"))?;
        if conditions.is_empty() {
            return Ok(current.clone());
        }
        current.view(conditions, &self.settings)
    }

    pub fn replace(&mut self, analysis: Analysis) -> &Analysis {
        self.current.insert(analysis)
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        data::Value,
        filter::parse_filters,
        kpi::Kpi,
        table::Column,
    };

    fn shipments() -> Table {
        Table::from_columns(vec![
            Column::new(
                "quantity",
                vec![Some(Value::Number(100.0)), Some(Value::Number(100.0))],
            ),
            Column::new(
                "delivered",
                vec![Some(Value::Number(90.0)), Some(Value::Number(50.0))],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn view_recomputes_without_touching_source() {
        let settings = Settings::default();
        let analysis = Analysis::from_table(shipments(), &settings);
        assert_eq!(analysis.kpis.get(Kpi::ServiceLevel), Some(70.0));
        let view = analysis
            .view(&parse_filters(&["delivered > 60".to_string()]).unwrap(), &settings)
            .unwrap();
        assert_eq!(view.kpis.get(Kpi::ServiceLevel), Some(90.0));
        assert_eq!(analysis.table.row_count(), 2);
    }

    #[test]
    fn failed_load_keeps_previous_analysis() {
        let mut session = Session::default();
        session.replace(Analysis::from_table(shipments(), session.settings()));
        let err = session
            .load(Path::new("orders.pdf"), &ReadOptions::default())
            .unwrap_err();
        assert!(err.to_string().contains("unsupported file format"));
        assert_eq!(session.current().map(|a| a.table.row_count()), Some(2));
    }

    #[test]
    fn replace_swaps_all_artifacts_together() {
        let mut session = Session::default();
        let first = Analysis::from_table(shipments(), session.settings());
        session.replace(first);
        let second = Analysis::from_table(Table::empty(), session.settings());
        let current = session.replace(second.clone());
        assert_eq!(current, &second);
        session.clear();
        assert!(session.current().is_none());
        assert!(session.view(&[]).is_err());
    }
}
