//! Client business logic.
//!
//! Unlike subscriptions and invoices, client changes are written to the store
//! immediately and then mirrored into the workbench as already saved.

use super::filter::filter_records;
use super::ids::next_id;
use super::permissions::{Action, Feature, require};
use super::workbench::Workbench;
use crate::entities::{ClientModel, ClientStatus, UserModel};
use crate::errors::{Error, Result};
use crate::store::{Backend, Store};
use serde::Deserialize;
use tracing::info;

/// Longest national id: nine digits, two letters, three digits.
pub const NATIONAL_ID_MAX_LEN: usize = 14;

/// Client form input
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInput {
    /// Full name
    pub name: String,
    /// Contact e-mail
    pub email: String,
    /// BI number, normalized on save
    pub national_id: String,
    /// Status, `Active` when omitted
    #[serde(default)]
    pub status: Option<ClientStatus>,
}

/// Strips everything but letters and digits, uppercases, and truncates to
/// [`NATIONAL_ID_MAX_LEN`] characters.
#[must_use]
pub fn normalize_national_id(raw: &str) -> String {
    raw.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .take(NATIONAL_ID_MAX_LEN)
        .collect()
}

fn validate(input: &ClientInput) -> Result<()> {
    if input.name.trim().is_empty() {
        return Err(Error::validation("O nome do cliente é obrigatório."));
    }
    if !input.email.contains('@') {
        return Err(Error::validation("E-mail inválido."));
    }
    Ok(())
}

fn build(id: String, owner_id: &str, input: ClientInput, fallback: ClientStatus) -> ClientModel {
    ClientModel {
        id,
        owner_id: owner_id.to_string(),
        name: input.name.trim().to_string(),
        email: input.email.trim().to_string(),
        national_id: normalize_national_id(&input.national_id),
        status: input.status.unwrap_or(fallback),
    }
}

/// Clients matching `search`.
pub async fn list_clients(
    actor: &UserModel,
    workbench: &Workbench,
    search: Option<&str>,
) -> Result<Vec<ClientModel>> {
    require(actor, Feature::Clients, Action::View)?;
    Ok(workbench
        .read(|ws| filter_records(&ws.clients, search))
        .await)
}

/// Registers a client.
pub async fn create_client(
    store: &Store,
    actor: &UserModel,
    workbench: &Workbench,
    input: ClientInput,
) -> Result<ClientModel> {
    require(actor, Feature::Clients, Action::Add)?;
    validate(&input)?;

    let owner_id = workbench.owner_id();
    let client = build(next_id(), owner_id, input, ClientStatus::Active);
    let saved = store.upsert(owner_id, &client).await?;
    workbench.apply_persisted(|ws| ws.put(saved.clone())).await;
    info!("Client {} added", saved.id);
    Ok(saved)
}

/// Replaces a client's details.
pub async fn update_client(
    store: &Store,
    actor: &UserModel,
    workbench: &Workbench,
    id: &str,
    input: ClientInput,
) -> Result<ClientModel> {
    require(actor, Feature::Clients, Action::Edit)?;
    validate(&input)?;

    let current = workbench
        .read(|ws| ws.find::<ClientModel>(id).cloned())
        .await
        .ok_or_else(|| Error::not_found("client", id))?;

    let owner_id = workbench.owner_id();
    let client = build(current.id, owner_id, input, current.status);
    let saved = store.upsert(owner_id, &client).await?;
    workbench.apply_persisted(|ws| ws.put(saved.clone())).await;
    info!("Client {} updated", saved.id);
    Ok(saved)
}

/// Deletes a client. Subscriptions and invoices referencing it are kept.
pub async fn delete_client(
    store: &Store,
    actor: &UserModel,
    workbench: &Workbench,
    id: &str,
) -> Result<()> {
    require(actor, Feature::Clients, Action::Delete)?;
    let exists = workbench
        .read(|ws| ws.find::<ClientModel>(id).is_some())
        .await;
    if !exists {
        return Err(Error::not_found("client", id));
    }

    store
        .delete::<ClientModel>(workbench.owner_id(), id)
        .await?;
    workbench
        .apply_persisted(|ws| {
            ws.remove::<ClientModel>(id);
        })
        .await;
    info!("Client {id} deleted");
    Ok(())
}
