//! Shared test utilities for the admin console.
//!
//! This module provides helpers for setting up test stores and building records
//! with sensible defaults.

use crate::{
    core::workbench::{Workbench, WorkbenchSettings},
    entities::{
        ClientModel, ClientStatus, InvoiceModel, InvoiceStatus, PermissionSet, SubscriptionModel,
        SubscriptionStatus, UserModel, UserRole, UserStatus, user::USERS_SCOPE,
    },
    errors::Result,
    store::{DemoBackend, LocalStorage, Store},
};
use chrono::Utc;
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for remote-backend tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// A demo store over in-memory local storage, without latency.
#[must_use]
pub fn demo_store() -> Store {
    Store::Demo(DemoBackend::new(LocalStorage::in_memory()))
}

/// Loads `owner_id`'s workbench with default settings. On a fresh demo store
/// this seeds the two sample clients (ids `"1"` and `"2"`).
pub async fn demo_workbench(store: &Store, owner_id: &str) -> Result<Workbench> {
    Workbench::load(store.clone(), owner_id, WorkbenchSettings::default()).await
}

/// Creates an active client.
///
/// # Defaults
/// * `email`: `cliente{id}@email.com`
/// * `national_id`: `123456789LA041`
#[must_use]
pub fn sample_client(id: &str, name: &str) -> ClientModel {
    ClientModel {
        id: id.to_string(),
        owner_id: String::new(),
        name: name.to_string(),
        email: format!("cliente{id}@email.com"),
        national_id: "123456789LA041".to_string(),
        status: ClientStatus::Active,
    }
}

/// Creates an active subscription for `client_id` on `plan`.
///
/// # Defaults
/// * `client_name`: `"Amanda Souza"`
/// * `price`: 15 650.00
#[must_use]
pub fn sample_subscription(id: &str, client_id: &str, plan: &str) -> SubscriptionModel {
    SubscriptionModel {
        id: id.to_string(),
        owner_id: String::new(),
        client_id: client_id.to_string(),
        client_name: "Amanda Souza".to_string(),
        plan: plan.to_string(),
        price: 15_650.0,
        status: SubscriptionStatus::Active,
        start_date: "2024-01-01".to_string(),
        end_date: "2024-12-31".to_string(),
    }
}

/// Creates an invoice with the given status and amount.
#[must_use]
pub fn sample_invoice(id: &str, client_id: &str, status: InvoiceStatus, amount: f64) -> InvoiceModel {
    InvoiceModel {
        id: id.to_string(),
        owner_id: String::new(),
        client_id: client_id.to_string(),
        client_name: "Amanda Souza".to_string(),
        amount,
        status,
        due_date: "2024-06-30".to_string(),
        issue_date: "2024-06-01".to_string(),
        description: "Mensalidade".to_string(),
    }
}

/// Creates an active user. Admins get every permission, users the view-only
/// default set. The password hash is a placeholder and never verifies.
#[must_use]
pub fn sample_user(id: &str, email: &str, role: UserRole) -> UserModel {
    UserModel {
        id: id.to_string(),
        owner_id: USERS_SCOPE.to_string(),
        name: format!("Utilizador {id}"),
        email: email.to_string(),
        password_hash: "not-a-hash".to_string(),
        role,
        status: UserStatus::Active,
        permissions: match role {
            UserRole::Admin => PermissionSet::all(),
            UserRole::User => PermissionSet::default_user(),
        },
        created_at: Utc::now(),
    }
}
