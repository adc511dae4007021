//! Invoice routes.

use super::error::{ApiResult, OrFailure};
use super::{AppState, SearchQuery, WithBadge};
use crate::core::invoice::{self, InvoiceInput};
use crate::core::labels::format_kwanza;
use crate::entities::InvoiceModel;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use serde::Serialize;
use std::sync::Arc;

/// An invoice with its badge and formatted amount
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceView {
    #[serde(flatten)]
    invoice: WithBadge<InvoiceModel>,
    amount_label: String,
}

fn view(invoice: InvoiceModel) -> InvoiceView {
    let status = invoice.status;
    InvoiceView {
        amount_label: format_kwanza(invoice.amount),
        invoice: WithBadge::new(invoice, &status),
    }
}

/// `GET /invoices`
pub async fn list(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<InvoiceView>>> {
    let caller = state.caller(&headers).await?;
    let workbench = state.workbench(&caller).await?;
    let invoices = invoice::list_invoices(&caller.user, &workbench, query.search.as_deref())
        .await
        .or_failure("Erro ao carregar faturas. Tente novamente.")?;
    Ok(Json(invoices.into_iter().map(view).collect()))
}

/// `POST /invoices`
pub async fn create(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(input): Json<InvoiceInput>,
) -> ApiResult<(StatusCode, Json<InvoiceView>)> {
    let caller = state.caller(&headers).await?;
    let workbench = state.workbench(&caller).await?;
    let created = invoice::create_invoice(&caller.user, &workbench, input)
        .await
        .or_failure("Erro ao adicionar fatura. Tente novamente.")?;
    Ok((StatusCode::CREATED, Json(view(created))))
}

/// `PUT /invoices/:id`
pub async fn update(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(input): Json<InvoiceInput>,
) -> ApiResult<Json<InvoiceView>> {
    let caller = state.caller(&headers).await?;
    let workbench = state.workbench(&caller).await?;
    let updated = invoice::update_invoice(&caller.user, &workbench, &id, input)
        .await
        .or_failure("Erro ao atualizar fatura. Tente novamente.")?;
    Ok(Json(view(updated)))
}

/// `DELETE /invoices/:id`
pub async fn remove(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let caller = state.caller(&headers).await?;
    let workbench = state.workbench(&caller).await?;
    invoice::delete_invoice(&caller.user, &workbench, &id)
        .await
        .or_failure("Erro ao excluir fatura. Tente novamente.")?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use crate::api::tests::{ADMIN_EMAIL, ADMIN_PASSWORD, login, send, test_app};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_invoice_views_and_amount_validation() {
        let app = test_app().await;
        let token = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

        let (status, created) = send(
            &app,
            "POST",
            "/invoices",
            Some(&token),
            Some(json!({ "clientId": "2", "amount": 15650.0, "description": "Junho" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["statusBadge"]["label"], "Pendente");
        assert_eq!(created["amountLabel"], "Kz 15.650,00");
        assert_eq!(created["clientName"], "João Pereira");

        let (status, body) = send(
            &app,
            "POST",
            "/invoices",
            Some(&token),
            Some(json!({ "clientId": "2", "amount": -5.0 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation");

        let (_, found) = send(&app, "GET", "/invoices?search=junho", Some(&token), None).await;
        assert_eq!(found.as_array().unwrap().len(), 1);
    }
}
