//! Keyword tables and the first-match column resolver.
//!
//! Column roles are assigned purely from column names: a column plays a role
//! when its lower-cased name contains any keyword of that role. When several
//! columns qualify, the first one in table order wins.

use std::{collections::BTreeMap, fmt};

use serde::Serialize;

use crate::table::{Column, Table};

/// Semantic roles reported to users when profiling a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Product,
    Quantity,
    Cost,
    Supplier,
    Location,
    Time,
    Date,
}

impl Role {
    pub const ALL: [Role; 7] = [
        Role::Product,
        Role::Quantity,
        Role::Cost,
        Role::Supplier,
        Role::Location,
        Role::Time,
        Role::Date,
    ];

    /// Name keywords; [`Role::Date`] is assigned from the column type instead.
    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            Role::Product => &["product", "item", "sku", "part", "material", "goods"],
            Role::Quantity => &[
                "quantity", "qty", "amount", "volume", "stock", "inventory", "units",
            ],
            Role::Cost => &["cost", "price", "value", "amount", "revenue", "sales"],
            Role::Supplier => &["supplier", "vendor", "provider", "source"],
            Role::Location => &["location", "warehouse", "site", "region", "zone", "depot"],
            Role::Time => &[
                "lead_time",
                "delivery_time",
                "delay",
                "duration",
                "cycle_time",
            ],
            Role::Date => &[],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Product => "product",
            Role::Quantity => "quantity",
            Role::Cost => "cost",
            Role::Supplier => "supplier",
            Role::Location => "location",
            Role::Time => "time",
            Role::Date => "date",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Column lookups used by the KPI deriver and the recommendation rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Demand,
    Delivered,
    StockLevel,
    Sales,
    StockBalance,
    OrderedUnits,
    DeliveryDate,
    RequestedDate,
    ShippedUnits,
    LeadTime,
    OrderDate,
    DeliveryEvent,
    Cost,
    Status,
    Supplier,
    Product,
}

impl Signal {
    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            Signal::Demand => &["quantity", "qty", "demand", "ordered"],
            Signal::Delivered => &["delivered", "shipped", "fulfilled"],
            Signal::StockLevel => &["stock", "inventory", "available"],
            Signal::Sales => &["sales", "revenue", "sold", "consumed"],
            Signal::StockBalance => &["stock", "inventory", "balance"],
            Signal::OrderedUnits => &["quantity", "qty"],
            Signal::DeliveryDate => &["delivery", "delivered", "actual"],
            Signal::RequestedDate => &["requested", "promised", "due", "expected"],
            Signal::ShippedUnits => &["delivered", "shipped"],
            Signal::LeadTime => &["lead_time", "leadtime", "cycle_time"],
            Signal::OrderDate => &["order", "created", "requested"],
            Signal::DeliveryEvent => &["delivery", "delivered", "shipped"],
            Signal::Cost => &["cost", "price", "value"],
            Signal::Status => &["status", "state", "condition"],
            Signal::Supplier => &["supplier", "vendor"],
            Signal::Product => &["product", "item", "sku"],
        }
    }

    pub fn resolve(self, table: &Table) -> Option<&Column> {
        first_match(table, self.keywords())
    }

    pub fn present_in(self, table: &Table) -> bool {
        self.resolve(table).is_some()
    }
}

pub fn name_matches(name: &str, keywords: &[&str]) -> bool {
    let lowered = name.to_lowercase();
    keywords
        .iter()
        .any(|keyword| lowered.contains(&keyword.to_lowercase()))
}

/// Index of the first name containing any keyword.
pub fn first_match_index<'a, I>(names: I, keywords: &[&str]) -> Option<usize>
where
    I: IntoIterator<Item = &'a str>,
{
    names
        .into_iter()
        .position(|name| name_matches(name, keywords))
}

pub fn first_match<'t>(table: &'t Table, keywords: &[&str]) -> Option<&'t Column> {
    first_match_index(table.column_names(), keywords).map(|idx| &table.columns()[idx])
}

/// Every role with the names of the columns playing it, in table order.
pub fn detect_roles(table: &Table) -> BTreeMap<Role, Vec<String>> {
    let mut mapping: BTreeMap<Role, Vec<String>> =
        Role::ALL.iter().map(|role| (*role, Vec::new())).collect();
    for column in table.columns() {
        if column.is_date() {
            mapping
                .entry(Role::Date)
                .or_default()
                .push(column.name.clone());
        }
        for role in Role::ALL {
            if name_matches(&column.name, role.keywords()) {
                mapping.entry(role).or_default().push(column.name.clone());
            }
        }
    }
    mapping
}
