//! Subscription entity - a client's internet plan.
//!
//! `client_name` and `price` are copied from the client and the plan catalog when
//! the subscription is created and are not kept in sync afterwards.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Subscription database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "subscriptions")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Timestamp-based identifier generated by the console
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// User id that owns this row
    #[serde(default)]
    pub owner_id: String,
    /// Subscribed client
    pub client_id: String,
    /// Client name at creation time
    pub client_name: String,
    /// Plan name from the catalog (e.g. "Premium 6Mbps")
    pub plan: String,
    /// Monthly price in kwanza
    pub price: f64,
    /// Current status
    pub status: SubscriptionStatus,
    /// Start date as entered (`YYYY-MM-DD`)
    pub start_date: String,
    /// End date as entered (`YYYY-MM-DD`)
    pub end_date: String,
}

/// Subscription status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum SubscriptionStatus {
    /// Service running
    #[sea_orm(string_value = "Active")]
    Active,
    /// Terminated by either party
    #[sea_orm(string_value = "Cancelled")]
    Cancelled,
    /// Temporarily halted, usually for non-payment
    #[sea_orm(string_value = "Suspended")]
    Suspended,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
