//! Expense entity - an operating cost deducted by the revenue calculator.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Expense database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "expenses")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Timestamp-based identifier
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// User id that owns this row
    #[serde(default)]
    pub owner_id: String,
    /// Short name (e.g. "Energia")
    pub name: String,
    /// Monthly amount in kwanza
    pub amount: f64,
    /// Fixed or variable cost
    pub kind: ExpenseKind,
    /// Free-text description
    #[serde(default)]
    pub description: String,
    /// Date as entered, may be empty
    #[serde(default)]
    pub date: String,
}

/// Expense kind
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum ExpenseKind {
    /// Same every month
    #[sea_orm(string_value = "fixed")]
    Fixed,
    /// Changes month to month
    #[sea_orm(string_value = "variable")]
    Variable,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
