//! Invoice business logic. Edits stay in the workbench until autosave runs.

use super::autosave::Workspace;
use super::filter::filter_records;
use super::ids::next_id;
use super::permissions::{Action, Feature, require};
use super::workbench::Workbench;
use crate::entities::{ClientModel, InvoiceModel, InvoiceStatus, UserModel};
use crate::errors::{Error, Result};
use serde::Deserialize;

/// Invoice form input
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceInput {
    /// Billed client
    pub client_id: String,
    /// Amount in kwanza
    pub amount: f64,
    /// Status, `Pending` when omitted
    #[serde(default)]
    pub status: Option<InvoiceStatus>,
    /// Issue date
    #[serde(default)]
    pub issue_date: String,
    /// Due date
    #[serde(default)]
    pub due_date: String,
    /// Free-text description
    #[serde(default)]
    pub description: String,
}

fn build(
    workspace: &Workspace,
    id: String,
    owner_id: &str,
    input: InvoiceInput,
    fallback: InvoiceStatus,
) -> Result<InvoiceModel> {
    if !input.amount.is_finite() || input.amount < 0.0 {
        return Err(Error::InvalidAmount {
            amount: input.amount,
        });
    }
    let client = workspace
        .find::<ClientModel>(&input.client_id)
        .ok_or_else(|| Error::validation("Selecione um cliente existente."))?;

    Ok(InvoiceModel {
        id,
        owner_id: owner_id.to_string(),
        client_id: client.id.clone(),
        client_name: client.name.clone(),
        amount: input.amount,
        status: input.status.unwrap_or(fallback),
        due_date: input.due_date,
        issue_date: input.issue_date,
        description: input.description.trim().to_string(),
    })
}

/// Invoices matching `search` (client name or description).
pub async fn list_invoices(
    actor: &UserModel,
    workbench: &Workbench,
    search: Option<&str>,
) -> Result<Vec<InvoiceModel>> {
    require(actor, Feature::Invoices, Action::View)?;
    Ok(workbench
        .read(|ws| filter_records(&ws.invoices, search))
        .await)
}

/// Adds an invoice to the workbench.
pub async fn create_invoice(
    actor: &UserModel,
    workbench: &Workbench,
    input: InvoiceInput,
) -> Result<InvoiceModel> {
    require(actor, Feature::Invoices, Action::Add)?;
    let owner_id = workbench.owner_id().to_string();
    workbench
        .edit(|ws| {
            let invoice = build(ws, next_id(), &owner_id, input, InvoiceStatus::Pending)?;
            ws.put(invoice.clone());
            Ok(invoice)
        })
        .await
}

/// Replaces an invoice in the workbench.
pub async fn update_invoice(
    actor: &UserModel,
    workbench: &Workbench,
    id: &str,
    input: InvoiceInput,
) -> Result<InvoiceModel> {
    require(actor, Feature::Invoices, Action::Edit)?;
    let owner_id = workbench.owner_id().to_string();
    workbench
        .edit(|ws| {
            let status = ws
                .find::<InvoiceModel>(id)
                .ok_or_else(|| Error::not_found("invoice", id))?
                .status;
            let invoice = build(ws, id.to_string(), &owner_id, input, status)?;
            ws.put(invoice.clone());
            Ok(invoice)
        })
        .await
}

/// Removes an invoice from the workbench.
pub async fn delete_invoice(actor: &UserModel, workbench: &Workbench, id: &str) -> Result<()> {
    require(actor, Feature::Invoices, Action::Delete)?;
    workbench
        .edit(|ws| {
            if ws.remove::<InvoiceModel>(id) {
                Ok(())
            } else {
                Err(Error::not_found("invoice", id))
            }
        })
        .await
}
