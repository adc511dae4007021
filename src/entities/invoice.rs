//! Invoice entity - a bill issued to a client.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Invoice database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "invoices")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Timestamp-based identifier generated by the console
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// User id that owns this row
    #[serde(default)]
    pub owner_id: String,
    /// Billed client
    pub client_id: String,
    /// Client name at creation time
    pub client_name: String,
    /// Amount in kwanza
    pub amount: f64,
    /// Payment status
    pub status: InvoiceStatus,
    /// Due date as entered (`YYYY-MM-DD`)
    pub due_date: String,
    /// Issue date as entered (`YYYY-MM-DD`)
    pub issue_date: String,
    /// Free-text description
    pub description: String,
}

/// Invoice payment status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum InvoiceStatus {
    /// Settled
    #[sea_orm(string_value = "Paid")]
    Paid,
    /// Issued, not yet due
    #[sea_orm(string_value = "Pending")]
    Pending,
    /// Past due date and unpaid
    #[sea_orm(string_value = "Overdue")]
    Overdue,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
