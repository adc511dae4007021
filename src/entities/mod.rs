//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities are also the domain records the console edits: each one is bound
//! to a [`Table`](crate::store::Table) through the [`Record`](crate::store::Record) trait
//! so either backend can persist it.

pub mod client;
pub mod expense;
pub mod invoice;
pub mod revenue_period;
pub mod subscription;
pub mod user;

// Re-export specific types to avoid conflicts
pub use client::{ClientStatus, Entity as Client, Model as ClientModel};
pub use expense::{Entity as Expense, ExpenseKind, Model as ExpenseModel};
pub use invoice::{Entity as Invoice, InvoiceStatus, Model as InvoiceModel};
pub use revenue_period::{Entity as RevenuePeriod, Model as RevenuePeriodModel, PlanLine};
pub use subscription::{Entity as Subscription, Model as SubscriptionModel, SubscriptionStatus};
pub use user::{Entity as User, Model as UserModel, Permission, PermissionSet, UserRole, UserStatus};

use sea_orm::{IntoActiveModel, Iterable, QueryOrder};
use sea_orm::entity::prelude::*;
use std::future::Future;

/// Binds an entity module to a table and implements the owner-scoped row operations
/// the relational backend needs.
macro_rules! impl_record {
    ($module:ident, $table:ident) => {
        impl crate::store::Record for $module::Model {
            const TABLE: crate::store::Table = crate::store::Table::$table;

            fn id(&self) -> &str {
                &self.id
            }

            fn owner_id(&self) -> &str {
                &self.owner_id
            }

            fn set_owner_id(&mut self, owner_id: &str) {
                owner_id.clone_into(&mut self.owner_id);
            }

            fn upsert_row<'a>(
                db: &'a DatabaseConnection,
                record: Self,
            ) -> impl Future<Output = crate::errors::Result<()>> + Send + 'a {
                async move {
                    let id = record.id.clone();
                    let owner_id = record.owner_id.clone();
                    let existing = $module::Entity::find_by_id(id.clone()).one(db).await?;

                    // Unchanged -> Set so every column is written on update
                    let mut active: $module::ActiveModel = record.into_active_model();
                    for column in <$module::Column as Iterable>::iter() {
                        active.reset(column);
                    }

                    match existing {
                        Some(row) if row.owner_id != owner_id => Err(crate::errors::Error::not_found(
                            crate::store::Table::$table.entity_name(),
                            id,
                        )),
                        Some(_) => {
                            $module::Entity::update(active).exec(db).await?;
                            Ok(())
                        }
                        None => {
                            $module::Entity::insert(active)
                                .exec_without_returning(db)
                                .await?;
                            Ok(())
                        }
                    }
                }
            }

            fn list_rows<'a>(
                db: &'a DatabaseConnection,
                owner_id: &'a str,
            ) -> impl Future<Output = crate::errors::Result<Vec<Self>>> + Send + 'a {
                async move {
                    $module::Entity::find()
                        .filter($module::Column::OwnerId.eq(owner_id))
                        .order_by_asc($module::Column::Id)
                        .all(db)
                        .await
                        .map_err(Into::into)
                }
            }

            fn delete_row<'a>(
                db: &'a DatabaseConnection,
                owner_id: &'a str,
                id: &'a str,
            ) -> impl Future<Output = crate::errors::Result<u64>> + Send + 'a {
                async move {
                    let result = $module::Entity::delete_many()
                        .filter($module::Column::Id.eq(id))
                        .filter($module::Column::OwnerId.eq(owner_id))
                        .exec(db)
                        .await?;
                    Ok(result.rows_affected)
                }
            }
        }
    };
}

impl_record!(client, Clients);
impl_record!(subscription, Subscriptions);
impl_record!(invoice, Invoices);
impl_record!(user, Users);
impl_record!(revenue_period, RevenuePeriods);
impl_record!(expense, Expenses);
