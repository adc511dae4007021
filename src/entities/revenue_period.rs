//! Revenue period entity - one month of calculated plan revenue.
//!
//! Produced by the revenue calculator; the per-plan breakdown is kept as a JSON
//! column so the catalog can change without a schema change.

use crate::config::plans::PlanTier;
use sea_orm::FromJsonQueryResult;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Revenue period database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "revenue_data")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Timestamp-based identifier
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// User id that owns this row
    #[serde(default)]
    pub owner_id: String,
    /// Month name as selected in the calculator (e.g. "Janeiro")
    pub month: String,
    /// Calendar year
    pub year: i32,
    /// Quantity and revenue per plan
    #[sea_orm(column_type = "Json")]
    pub lines: PlanLines,
    /// Sum of the Basic tier lines
    pub basic_total: f64,
    /// Sum of the Premium tier lines
    pub premium_total: f64,
    /// Sum of the Enterprise tier lines
    pub enterprise_total: f64,
    /// Sum of every line
    pub total_revenue: f64,
    /// Expenses deducted for the period
    pub expenses: f64,
    /// `total_revenue - expenses`
    pub net_revenue: f64,
    /// Revenue growth against the previous period, in percent
    pub growth: f64,
}

impl Model {
    /// `"{month}-{year}"`, the key the comparison panel selects periods by.
    #[must_use]
    pub fn period_key(&self) -> String {
        format!("{}-{}", self.month, self.year)
    }

    /// Total subscribers across every plan line.
    #[must_use]
    pub fn total_clients(&self) -> u64 {
        self.lines.0.iter().map(|line| u64::from(line.quantity)).sum()
    }

    /// Line for the plan with the given code, if it was part of the calculation.
    #[must_use]
    pub fn line(&self, code: &str) -> Option<&PlanLine> {
        self.lines.0.iter().find(|line| line.code == code)
    }
}

/// One plan's contribution to a period.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanLine {
    /// Catalog code (e.g. `plan6Mbps`)
    pub code: String,
    /// Display name
    pub name: String,
    /// Tier the plan belongs to
    pub tier: PlanTier,
    /// Number of subscribers
    pub quantity: u32,
    /// Monthly price
    pub unit_price: f64,
    /// `quantity * unit_price`
    pub total: f64,
}

/// Plan lines stored as a JSON array column.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(transparent)]
pub struct PlanLines(pub Vec<PlanLine>);

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
