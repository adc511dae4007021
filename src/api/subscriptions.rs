//! Subscription routes.

use super::error::{ApiResult, OrFailure};
use super::{AppState, SearchQuery, WithBadge};
use crate::core::subscription::{self, SubscriptionInput};
use crate::entities::SubscriptionModel;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use std::sync::Arc;

fn view(subscription: SubscriptionModel) -> WithBadge<SubscriptionModel> {
    let status = subscription.status;
    WithBadge::new(subscription, &status)
}

/// `GET /subscriptions`
pub async fn list(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<WithBadge<SubscriptionModel>>>> {
    let caller = state.caller(&headers).await?;
    let workbench = state.workbench(&caller).await?;
    let subscriptions = subscription::list_subscriptions(&caller.user, &workbench, query.search.as_deref())
        .await
        .or_failure("Erro ao carregar assinaturas. Tente novamente.")?;
    Ok(Json(subscriptions.into_iter().map(view).collect()))
}

/// `POST /subscriptions`
pub async fn create(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(input): Json<SubscriptionInput>,
) -> ApiResult<(StatusCode, Json<WithBadge<SubscriptionModel>>)> {
    let caller = state.caller(&headers).await?;
    let workbench = state.workbench(&caller).await?;
    let created = subscription::create_subscription(&caller.user, &workbench, &state.catalog, input)
        .await
        .or_failure("Erro ao adicionar assinatura. Tente novamente.")?;
    Ok((StatusCode::CREATED, Json(view(created))))
}

/// `PUT /subscriptions/:id`
pub async fn update(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(input): Json<SubscriptionInput>,
) -> ApiResult<Json<WithBadge<SubscriptionModel>>> {
    let caller = state.caller(&headers).await?;
    let workbench = state.workbench(&caller).await?;
    let updated = subscription::update_subscription(&caller.user, &workbench, &state.catalog, &id, input)
        .await
        .or_failure("Erro ao atualizar assinatura. Tente novamente.")?;
    Ok(Json(view(updated)))
}

/// `DELETE /subscriptions/:id`
pub async fn remove(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let caller = state.caller(&headers).await?;
    let workbench = state.workbench(&caller).await?;
    subscription::delete_subscription(&caller.user, &workbench, &id)
        .await
        .or_failure("Erro ao excluir assinatura. Tente novamente.")?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use crate::api::tests::{ADMIN_EMAIL, ADMIN_PASSWORD, login, send, test_app};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_subscription_is_pending_until_saved() {
        let app = test_app().await;
        let token = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

        let (status, created) = send(
            &app,
            "POST",
            "/subscriptions",
            Some(&token),
            Some(json!({ "clientId": "1", "plan": "Premium 8Mbps", "status": "Suspended" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["price"], 53_210.0);
        assert_eq!(created["statusBadge"]["label"], "Suspensa");

        let (_, save) = send(&app, "GET", "/save/status", Some(&token), None).await;
        assert_eq!(save["hasUnsavedChanges"], true);
        assert_eq!(save["pendingChanges"], 1);

        let (status, body) = send(
            &app,
            "POST",
            "/subscriptions",
            Some(&token),
            Some(json!({ "clientId": "1", "plan": "Fibra 1Gbps" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Plano desconhecido: Fibra 1Gbps");
    }
}
