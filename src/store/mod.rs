//! Persistence layer - one record contract, two backends.
//!
//! The console only ever needs three calls per table: save a record, list an
//! owner's records and delete one. [`Backend`] captures that shape;
//! [`SqlBackend`] fulfils it against a relational database with row-level
//! ownership, [`DemoBackend`] against a local key/value file that mimics browser
//! storage. [`Store`] is what the application holds and picks one at startup.

pub mod demo;
pub mod local;
pub mod sql;

pub use demo::DemoBackend;
pub use local::LocalStorage;
pub use sql::SqlBackend;

use crate::errors::Result;
use sea_orm::DatabaseConnection;
use serde::{Serialize, de::DeserializeOwned};
use std::fmt;
use std::future::Future;

/// Tables known to the console.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Table {
    /// ISP customers
    Clients,
    /// Plan subscriptions
    Subscriptions,
    /// Invoices
    Invoices,
    /// Back-office operators
    Users,
    /// Calculated revenue months
    RevenuePeriods,
    /// Operating costs
    Expenses,
}

impl Table {
    /// Table name, shared by the SQL schema and the demo storage keys.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Clients => "clients",
            Self::Subscriptions => "subscriptions",
            Self::Invoices => "invoices",
            Self::Users => "users",
            Self::RevenuePeriods => "revenue_data",
            Self::Expenses => "expenses",
        }
    }

    /// Singular name used in error messages.
    #[must_use]
    pub const fn entity_name(self) -> &'static str {
        match self {
            Self::Clients => "client",
            Self::Subscriptions => "subscription",
            Self::Invoices => "invoice",
            Self::Users => "user",
            Self::RevenuePeriods => "revenue period",
            Self::Expenses => "expense",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A flat record bound to one table and owned by one user.
///
/// Implemented for every entity model in [`crate::entities`]. The `*_row` functions
/// are the relational half of the contract; the demo backend only needs serde.
pub trait Record: Clone + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Table the record lives in
    const TABLE: Table;

    /// Record identifier
    fn id(&self) -> &str;

    /// Owning user id
    fn owner_id(&self) -> &str;

    /// Reassigns the owner; backends stamp the caller's scope on save.
    fn set_owner_id(&mut self, owner_id: &str);

    /// Inserts the row or overwrites the row with the same id and owner.
    fn upsert_row<'a>(
        db: &'a DatabaseConnection,
        record: Self,
    ) -> impl Future<Output = Result<()>> + Send + 'a;

    /// All rows owned by `owner_id`, ordered by id.
    fn list_rows<'a>(
        db: &'a DatabaseConnection,
        owner_id: &'a str,
    ) -> impl Future<Output = Result<Vec<Self>>> + Send + 'a;

    /// Deletes the row, returning how many rows went away.
    fn delete_row<'a>(
        db: &'a DatabaseConnection,
        owner_id: &'a str,
        id: &'a str,
    ) -> impl Future<Output = Result<u64>> + Send + 'a;
}

/// The persistence contract the console depends on.
pub trait Backend: Send + Sync {
    /// Saves `record` under `owner_id`, replacing any record with the same id.
    fn upsert<R: Record>(
        &self,
        owner_id: &str,
        record: &R,
    ) -> impl Future<Output = Result<R>> + Send;

    /// Every record of `R`'s table owned by `owner_id`.
    fn list<R: Record>(&self, owner_id: &str) -> impl Future<Output = Result<Vec<R>>> + Send;

    /// Removes the record; a missing record is not an error.
    fn delete<R: Record>(
        &self,
        owner_id: &str,
        id: &str,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// The backend selected at startup.
#[derive(Clone, Debug)]
pub enum Store {
    /// Relational database
    Remote(SqlBackend),
    /// Local key/value file
    Demo(DemoBackend),
}

impl Store {
    /// Whether data is simulated locally.
    #[must_use]
    pub const fn is_demo(&self) -> bool {
        matches!(self, Self::Demo(_))
    }
}

impl Backend for Store {
    async fn upsert<R: Record>(&self, owner_id: &str, record: &R) -> Result<R> {
        match self {
            Self::Remote(backend) => backend.upsert(owner_id, record).await,
            Self::Demo(backend) => backend.upsert(owner_id, record).await,
        }
    }

    async fn list<R: Record>(&self, owner_id: &str) -> Result<Vec<R>> {
        match self {
            Self::Remote(backend) => backend.list(owner_id).await,
            Self::Demo(backend) => backend.list(owner_id).await,
        }
    }

    async fn delete<R: Record>(&self, owner_id: &str, id: &str) -> Result<()> {
        match self {
            Self::Remote(backend) => backend.delete::<R>(owner_id, id).await,
            Self::Demo(backend) => backend.delete::<R>(owner_id, id).await,
        }
    }
}
