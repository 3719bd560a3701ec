use std::cmp::Ordering;

use anyhow::{Result, anyhow};
use log::debug;

use crate::{
    data::{ColumnType, Value, parse_date_value, parse_loose_number},
    normalize::normalize_column_name,
    table::Table,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOperator {
    Eq,
    NotEq,
    Gt,
    Ge,
    Lt,
    Le,
    Contains,
    StartsWith,
    EndsWith,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterCondition {
    pub column: String,
    pub operator: ComparisonOperator,
    pub raw_value: String,
}

pub fn parse_filters(filters: &[String]) -> Result<Vec<FilterCondition>> {
    filters.iter().map(|f| parse_filter(f)).collect()
}

fn parse_filter(filter: &str) -> Result<FilterCondition> {
    let trimmed = filter.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("Empty filter expression"));
    }

    let lowered = trimmed.to_ascii_lowercase();
    for (needle, op) in [
        (" contains ", ComparisonOperator::Contains),
        (" startswith ", ComparisonOperator::StartsWith),
        (" endswith ", ComparisonOperator::EndsWith),
    ] {
        if let Some(idx) = lowered.find(needle) {
            let (left, right_with_space) = trimmed.split_at(idx);
            let right = right_with_space[needle.len()..].trim();
            return Ok(FilterCondition {
                column: left.trim().to_string(),
                operator: op,
                raw_value: unquote(right).to_string(),
            });
        }
    }

    for (needle, op) in [
        ("!=", ComparisonOperator::NotEq),
        (">=", ComparisonOperator::Ge),
        ("<=", ComparisonOperator::Le),
        ("=", ComparisonOperator::Eq),
        (">", ComparisonOperator::Gt),
        ("<", ComparisonOperator::Lt),
    ] {
        if let Some(idx) = trimmed.find(needle) {
            let left = trimmed[..idx].trim();
            let right = trimmed[idx + needle.len()..].trim();
            if left.is_empty() {
                return Err(anyhow!("Filter '{trimmed}' is missing a column name"));
            }
            return Ok(FilterCondition {
                column: left.to_string(),
                operator: op,
                raw_value: unquote(right).to_string(),
            });
        }
    }

    Err(anyhow!("Failed to parse filter expression '{trimmed}'"))
}

fn unquote(value: &str) -> &str {
    if value.len() >= 2 {
        let bytes = value.as_bytes();
        if (bytes[0] == b'"' && bytes[value.len() - 1] == b'"')
            || (bytes[0] == b'\'' && bytes[value.len() - 1] == b'\'')
        {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Builds the view of `table` whose rows satisfy every condition.
///
/// Column references go through the same renaming as the normalizer, so
/// `"Order Date"` finds `order_date`. The source table is never modified.
pub fn apply_filters(table: &Table, conditions: &[FilterCondition]) -> Result<Table> {
    let mut resolved = Vec::with_capacity(conditions.len());
    for condition in conditions {
        let name = normalize_column_name(&condition.column);
        let column = table
            .column(&name)
            .ok_or_else(|| anyhow!("Column '{}' not found for filter", condition.column))?;
        let rhs = parse_operand(&condition.raw_value, column.kind).ok_or_else(|| {
            anyhow!(
                "Filter value '{}' is not a valid {} for column '{}'",
                condition.raw_value,
                column.kind,
                column.name
            )
        })?;
        resolved.push((condition, column, rhs));
    }

    let view = table.select_rows(|row| {
        resolved.iter().all(|(condition, column, rhs)| {
            evaluate_condition(condition, column.cells[row].as_ref(), rhs)
        })
    });
    debug!(
        "Filters kept {} of {} row(s)",
        view.row_count(),
        table.row_count()
    );
    Ok(view)
}

fn parse_operand(raw: &str, kind: ColumnType) -> Option<Value> {
    match kind {
        ColumnType::Numeric => parse_loose_number(raw).map(Value::Number),
        ColumnType::Date => parse_date_value(raw).map(Value::Date),
        ColumnType::Text | ColumnType::Mixed => Some(Value::Text(raw.to_string())),
    }
}

fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
        (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
        _ => Some(left.as_display().cmp(&right.as_display())),
    }
}

fn evaluate_condition(condition: &FilterCondition, cell: Option<&Value>, rhs: &Value) -> bool {
    use ComparisonOperator::*;
    match condition.operator {
        Contains | StartsWith | EndsWith => {
            let Some(value) = cell else {
                return false;
            };
            let text = value.as_display();
            let needle = condition.raw_value.as_str();
            match condition.operator {
                Contains => text.contains(needle),
                StartsWith => text.starts_with(needle),
                _ => text.ends_with(needle),
            }
        }
        Eq | NotEq | Gt | Ge | Lt | Le => {
            let Some(value) = cell else {
                return matches!(condition.operator, NotEq);
            };
            let Some(ordering) = compare_values(value, rhs) else {
                return false;
            };
            match condition.operator {
                Eq => ordering == Ordering::Equal,
                NotEq => ordering != Ordering::Equal,
                Gt => ordering == Ordering::Greater,
                Ge => ordering != Ordering::Less,
                Lt => ordering == Ordering::Less,
                _ => ordering != Ordering::Greater,
            }
        }
    }
}
