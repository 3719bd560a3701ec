use crate::{data::format_number, table::Table};

/// Running summary of a numeric series. Missing cells never reach it, so they
/// are excluded from every aggregate rather than counted as zero.
#[derive(Debug, Clone, Default)]
pub struct ColumnStats {
    pub name: String,
    values: Vec<f64>,
    sum: f64,
    count: usize,
    min: Option<f64>,
    max: Option<f64>,
}

impl ColumnStats {
    pub fn with_column(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let mut stats = Self::default();
        for value in values {
            stats.add_value(value);
        }
        stats
    }

    pub fn add_value(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.min = Some(self.min.map_or(value, |current| current.min(value)));
        self.max = Some(self.max.map_or(value, |current| current.max(value)));
        self.values.push(value);
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    pub fn min(&self) -> Option<f64> {
        self.min
    }

    pub fn max(&self) -> Option<f64> {
        self.max
    }

    pub fn mean(&self) -> Option<f64> {
        if self.count > 0 {
            Some(self.sum / self.count as f64)
        } else {
            None
        }
    }

    pub fn median(&self) -> Option<f64> {
        if self.values.is_empty() {
            return None;
        }
        let mut sorted = self.values.clone();
        sorted.sort_by(f64::total_cmp);
        let mid = sorted.len() / 2;
        if sorted.len().is_multiple_of(2) {
            Some((sorted[mid - 1] + sorted[mid]) / 2.0)
        } else {
            Some(sorted[mid])
        }
    }

    /// Sample standard deviation (n - 1 denominator); undefined below two values.
    pub fn std_dev(&self) -> Option<f64> {
        if self.count < 2 {
            return None;
        }
        let mean = self.mean()?;
        let squared: f64 = self.values.iter().map(|v| (v - mean) * (v - mean)).sum();
        Some((squared / (self.count as f64 - 1.0)).max(0.0).sqrt())
    }

    pub fn render_row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.count.to_string(),
            format_metric(self.min),
            format_metric(self.max),
            format_metric(self.mean()),
            format_metric(self.median()),
            format_metric(self.std_dev()),
        ]
    }
}

fn format_metric(metric: Option<f64>) -> String {
    metric
        .map(|value| {
            if value.fract() == 0.0 {
                format_number(value)
            } else {
                format!("{value:.4}")
            }
        })
        .unwrap_or_default()
}

/// Statistics for every numeric column of the table, in column order.
pub fn numeric_column_stats(table: &Table) -> Vec<ColumnStats> {
    table
        .columns()
        .iter()
        .filter(|column| column.is_numeric())
        .map(|column| {
            let mut stats = ColumnStats::with_column(column.name.clone());
            for value in column.numbers() {
                stats.add_value(value);
            }
            stats
        })
        .collect()
}

pub const STATS_HEADERS: [&str; 7] = ["column", "count", "min", "max", "mean", "median", "std_dev"];
