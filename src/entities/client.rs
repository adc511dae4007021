//! Client entity - an ISP customer.
//!
//! Clients are owned by the user that registered them; `national_id` holds the
//! Angolan BI number (`123456789LA041`).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Client database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "clients")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Timestamp-based identifier generated by the console
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// User id that owns this row
    #[serde(default)]
    pub owner_id: String,
    /// Full name
    pub name: String,
    /// Contact e-mail
    pub email: String,
    /// National identity document number (BI)
    pub national_id: String,
    /// Whether the client is currently served
    pub status: ClientStatus,
}

/// Client lifecycle status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum ClientStatus {
    /// Currently served
    #[sea_orm(string_value = "Active")]
    Active,
    /// No longer served
    #[sea_orm(string_value = "Inactive")]
    Inactive,
}

/// Clients have no enforced relationships; subscriptions and invoices copy the name
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
