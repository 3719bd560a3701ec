//! Optional YAML settings: recommendation thresholds and KPI benchmarks.
//!
//! Every field has a default, so a config file only needs the keys it wants
//! to change:
//!
//! ```yaml
//! rules:
//!   max_avg_lead_time: 10
//! benchmarks:
//!   service_level: { good: 97, average: 90 }
//! ```

use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

use crate::{kpi::Benchmarks, recommend::RuleThresholds};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub rules: RuleThresholds,
    pub benchmarks: Benchmarks,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening config file {path:?}"))?;
        let reader = BufReader::new(file);
        let settings: Settings =
            serde_yaml::from_reader(reader).with_context(|| format!("Parsing config {path:?}"))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<()> {
        let rules = &self.rules;
        ensure!(
            rules.service_level_critical <= rules.service_level_target,
            "rules.service_level_critical ({}) must not exceed rules.service_level_target ({})",
            rules.service_level_critical,
            rules.service_level_target
        );
        ensure!(
            rules.otif_critical <= rules.otif_target,
            "rules.otif_critical ({}) must not exceed rules.otif_target ({})",
            rules.otif_critical,
            rules.otif_target
        );
        ensure!(
            rules.min_stock_turnover <= rules.max_stock_turnover,
            "rules.min_stock_turnover ({}) must not exceed rules.max_stock_turnover ({})",
            rules.min_stock_turnover,
            rules.max_stock_turnover
        );
        Ok(())
    }
}
