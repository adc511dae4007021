//! Relational backend over a `SeaORM` connection.
//!
//! Every row carries an `owner_id` column and every query filters on it, which is
//! the row-level ownership the hosted database used to enforce.

use super::{Backend, Record};
use crate::errors::Result;
use sea_orm::DatabaseConnection;
use tracing::{debug, instrument};

/// Backend used when a `DATABASE_URL` is configured.
#[derive(Clone, Debug)]
pub struct SqlBackend {
    db: DatabaseConnection,
}

impl SqlBackend {
    /// Wraps an open connection. Tables must already exist
    /// (see [`create_tables`](crate::config::database::create_tables)).
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// The wrapped connection.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl Backend for SqlBackend {
    #[instrument(skip(self, record), fields(table = %R::TABLE, id = record.id()))]
    async fn upsert<R: Record>(&self, owner_id: &str, record: &R) -> Result<R> {
        let mut stored = record.clone();
        stored.set_owner_id(owner_id);
        R::upsert_row(&self.db, stored.clone()).await?;
        debug!("Upserted row");
        Ok(stored)
    }

    #[instrument(skip(self), fields(table = %R::TABLE))]
    async fn list<R: Record>(&self, owner_id: &str) -> Result<Vec<R>> {
        R::list_rows(&self.db, owner_id).await
    }

    #[instrument(skip(self), fields(table = %R::TABLE))]
    async fn delete<R: Record>(&self, owner_id: &str, id: &str) -> Result<()> {
        let removed = R::delete_row(&self.db, owner_id, id).await?;
        debug!("Deleted {removed} rows");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::entities::{
        ClientModel, ClientStatus, InvoiceModel, InvoiceStatus, UserModel, user::USERS_SCOPE,
    };
    use crate::errors::Error;
    use crate::test_utils::{sample_client, sample_invoice, sample_user, setup_test_db};

    async fn backend() -> Result<SqlBackend> {
        Ok(SqlBackend::new(setup_test_db().await?))
    }

    #[tokio::test]
    async fn test_upsert_inserts_then_updates() -> Result<()> {
        let backend = backend().await?;
        let mut client = sample_client("1", "Amanda Souza");
        backend.upsert("owner-a", &client).await?;

        client.name = "Amanda S. Souza".to_string();
        client.status = ClientStatus::Inactive;
        backend.upsert("owner-a", &client).await?;

        let listed: Vec<ClientModel> = backend.list("owner-a").await?;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "Amanda S. Souza");
        assert_eq!(listed[0].status, ClientStatus::Inactive);
        assert_eq!(listed[0].owner_id, "owner-a");
        Ok(())
    }

    #[tokio::test]
    async fn test_rows_are_filtered_by_owner() -> Result<()> {
        let backend = backend().await?;
        backend
            .upsert("owner-a", &sample_invoice("10", "1", InvoiceStatus::Paid, 100.0))
            .await?;
        backend
            .upsert("owner-b", &sample_invoice("11", "1", InvoiceStatus::Pending, 50.0))
            .await?;

        let a: Vec<InvoiceModel> = backend.list("owner-a").await?;
        let b: Vec<InvoiceModel> = backend.list("owner-b").await?;
        assert_eq!(a.len(), 1);
        assert_eq!(a[0].id, "10");
        assert_eq!(b.len(), 1);
        assert_eq!(b[0].id, "11");
        Ok(())
    }

    #[tokio::test]
    async fn test_cannot_overwrite_another_owners_row() -> Result<()> {
        let backend = backend().await?;
        backend
            .upsert("owner-a", &sample_client("1", "Amanda Souza"))
            .await?;

        let result = backend
            .upsert("owner-b", &sample_client("1", "Intruso"))
            .await;
        assert!(matches!(result, Err(Error::NotFound { .. })));

        let listed: Vec<ClientModel> = backend.list("owner-a").await?;
        assert_eq!(listed[0].name, "Amanda Souza");
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_is_scoped_and_idempotent() -> Result<()> {
        let backend = backend().await?;
        backend
            .upsert("owner-a", &sample_client("1", "Amanda Souza"))
            .await?;

        backend.delete::<ClientModel>("owner-b", "1").await?;
        assert_eq!(backend.list::<ClientModel>("owner-a").await?.len(), 1);

        backend.delete::<ClientModel>("owner-a", "1").await?;
        backend.delete::<ClientModel>("owner-a", "1").await?;
        assert!(backend.list::<ClientModel>("owner-a").await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_json_columns_round_trip() -> Result<()> {
        let backend = backend().await?;
        let user = sample_user("7", "ana@lumanet.ao", crate::entities::UserRole::User);
        backend.upsert(USERS_SCOPE, &user).await?;

        let users: Vec<UserModel> = backend.list(USERS_SCOPE).await?;
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].permissions, user.permissions);
        Ok(())
    }
}
