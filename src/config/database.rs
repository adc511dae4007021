//! Database configuration module for the relational backend.
//!
//! This module handles the database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust
//! structs without hand-written SQL.

use crate::entities::{Client, Expense, Invoice, RevenuePeriod, Subscription, User};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use tracing::{debug, info};

/// Default `SQLite` location when remote mode is selected without a URL.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/lumanet.sqlite?mode=rwc";

/// Establishes a connection to `database_url`.
///
/// This function handles connection errors and provides a clean interface for
/// database access throughout the application.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    debug!("Connecting to database");
    Database::connect(database_url).await.map_err(Into::into)
}

/// Creates every table the console uses, skipping tables that already exist.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    create_table(db, Client).await?;
    create_table(db, Subscription).await?;
    create_table(db, Invoice).await?;
    create_table(db, User).await?;
    create_table(db, RevenuePeriod).await?;
    create_table(db, Expense).await?;
    info!("Database tables ready");
    Ok(())
}

async fn create_table<E: EntityTrait>(db: &DatabaseConnection, entity: E) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}
