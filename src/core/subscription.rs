//! Subscription business logic.
//!
//! Changes are made in the workbench only and reach the store through autosave.
//! The client name and the plan price are copied in whenever a subscription is
//! saved from the form.

use super::autosave::Workspace;
use super::filter::filter_records;
use super::ids::next_id;
use super::permissions::{Action, Feature, require};
use super::workbench::Workbench;
use crate::config::plans::PlanCatalog;
use crate::entities::{ClientModel, SubscriptionModel, SubscriptionStatus, UserModel};
use crate::errors::{Error, Result};
use serde::Deserialize;

/// Subscription form input
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionInput {
    /// Subscribed client
    pub client_id: String,
    /// Plan name from the catalog
    pub plan: String,
    /// Status, `Active` when omitted
    #[serde(default)]
    pub status: Option<SubscriptionStatus>,
    /// Start date
    #[serde(default)]
    pub start_date: String,
    /// End date
    #[serde(default)]
    pub end_date: String,
}

fn build(
    workspace: &Workspace,
    catalog: &PlanCatalog,
    id: String,
    owner_id: &str,
    input: SubscriptionInput,
    fallback: SubscriptionStatus,
) -> Result<SubscriptionModel> {
    let client = workspace
        .find::<ClientModel>(&input.client_id)
        .ok_or_else(|| Error::validation("Selecione um cliente existente."))?;
    let plan = catalog
        .find_by_name(&input.plan)
        .ok_or_else(|| Error::validation(format!("Plano desconhecido: {}", input.plan)))?;

    Ok(SubscriptionModel {
        id,
        owner_id: owner_id.to_string(),
        client_id: client.id.clone(),
        client_name: client.name.clone(),
        plan: plan.name.clone(),
        price: plan.price,
        status: input.status.unwrap_or(fallback),
        start_date: input.start_date,
        end_date: input.end_date,
    })
}

/// Subscriptions matching `search` (client name or plan).
pub async fn list_subscriptions(
    actor: &UserModel,
    workbench: &Workbench,
    search: Option<&str>,
) -> Result<Vec<SubscriptionModel>> {
    require(actor, Feature::Subscriptions, Action::View)?;
    Ok(workbench
        .read(|ws| filter_records(&ws.subscriptions, search))
        .await)
}

/// Adds a subscription to the workbench.
pub async fn create_subscription(
    actor: &UserModel,
    workbench: &Workbench,
    catalog: &PlanCatalog,
    input: SubscriptionInput,
) -> Result<SubscriptionModel> {
    require(actor, Feature::Subscriptions, Action::Add)?;
    let owner_id = workbench.owner_id().to_string();
    workbench
        .edit(|ws| {
            let subscription = build(ws, catalog, next_id(), &owner_id, input, SubscriptionStatus::Active)?;
            ws.put(subscription.clone());
            Ok(subscription)
        })
        .await
}

/// Replaces a subscription in the workbench.
pub async fn update_subscription(
    actor: &UserModel,
    workbench: &Workbench,
    catalog: &PlanCatalog,
    id: &str,
    input: SubscriptionInput,
) -> Result<SubscriptionModel> {
    require(actor, Feature::Subscriptions, Action::Edit)?;
    let owner_id = workbench.owner_id().to_string();
    workbench
        .edit(|ws| {
            let current = ws
                .find::<SubscriptionModel>(id)
                .ok_or_else(|| Error::not_found("subscription", id))?;
            let status = current.status;
            let subscription = build(ws, catalog, id.to_string(), &owner_id, input, status)?;
            ws.put(subscription.clone());
            Ok(subscription)
        })
        .await
}

/// Removes a subscription from the workbench.
pub async fn delete_subscription(actor: &UserModel, workbench: &Workbench, id: &str) -> Result<()> {
    require(actor, Feature::Subscriptions, Action::Delete)?;
    workbench
        .edit(|ws| {
            if ws.remove::<SubscriptionModel>(id) {
                Ok(())
            } else {
                Err(Error::not_found("subscription", id))
            }
        })
        .await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::entities::{Permission, UserRole};
    use crate::store::Backend;
    use crate::test_utils::{demo_store, demo_workbench, sample_user};

    fn input(client_id: &str, plan: &str) -> SubscriptionInput {
        SubscriptionInput {
            client_id: client_id.to_string(),
            plan: plan.to_string(),
            status: None,
            start_date: "2024-01-01".to_string(),
            end_date: "2024-12-31".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_copies_client_name_and_plan_price() -> Result<()> {
        let store = demo_store();
        let workbench = demo_workbench(&store, "u1").await?;
        let admin = sample_user("1", "admin@lumanet.ao", UserRole::Admin);
        let catalog = PlanCatalog::default();

        let subscription = create_subscription(&admin, &workbench, &catalog, input("2", "Premium 6Mbps")).await?;
        assert_eq!(subscription.client_name, "João Pereira");
        assert_eq!(subscription.price, 39_907.05);
        assert_eq!(subscription.status, SubscriptionStatus::Active);

        // Only in memory until autosave runs
        let stored: Vec<SubscriptionModel> = store.list("u1").await?;
        assert!(stored.is_empty());
        assert_eq!(workbench.status().await?.pending_changes, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_client_or_plan_is_rejected() -> Result<()> {
        let store = demo_store();
        let workbench = demo_workbench(&store, "u1").await?;
        let admin = sample_user("1", "admin@lumanet.ao", UserRole::Admin);
        let catalog = PlanCatalog::default();

        assert!(matches!(
            create_subscription(&admin, &workbench, &catalog, input("404", "Básico 2Mbps")).await,
            Err(Error::Validation { .. })
        ));
        assert!(matches!(
            create_subscription(&admin, &workbench, &catalog, input("1", "Ultra 1Gbps")).await,
            Err(Error::Validation { .. })
        ));
        assert!(!workbench.status().await?.has_unsaved_changes);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_and_delete() -> Result<()> {
        let store = demo_store();
        let workbench = demo_workbench(&store, "u1").await?;
        let admin = sample_user("1", "admin@lumanet.ao", UserRole::Admin);
        let catalog = PlanCatalog::default();
        let created = create_subscription(&admin, &workbench, &catalog, input("1", "Básico 2Mbps")).await?;

        let mut change = input("1", "Enterprise 10Mbps");
        change.status = Some(SubscriptionStatus::Suspended);
        let updated = update_subscription(&admin, &workbench, &catalog, &created.id, change).await?;
        assert_eq!(updated.price, 66_512.05);
        assert_eq!(updated.status, SubscriptionStatus::Suspended);

        delete_subscription(&admin, &workbench, &created.id).await?;
        assert!(list_subscriptions(&admin, &workbench, None).await?.is_empty());
        assert!(matches!(
            delete_subscription(&admin, &workbench, &created.id).await,
            Err(Error::NotFound { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_view_permission_cannot_mutate() -> Result<()> {
        let store = demo_store();
        let workbench = demo_workbench(&store, "u1").await?;
        let mut viewer = sample_user("2", "op@lumanet.ao", UserRole::User);
        viewer.permissions = [Permission::ViewSubscriptions].into_iter().collect();

        assert!(list_subscriptions(&viewer, &workbench, None).await.is_ok());
        assert!(matches!(
            create_subscription(&viewer, &workbench, &PlanCatalog::default(), input("1", "Básico 2Mbps")).await,
            Err(Error::PermissionDenied { .. })
        ));
        assert!(matches!(
            delete_subscription(&viewer, &workbench, "x").await,
            Err(Error::PermissionDenied { .. })
        ));
        Ok(())
    }
}
