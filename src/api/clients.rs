//! Client routes.

use super::error::{ApiResult, OrFailure};
use super::{AppState, SearchQuery, WithBadge};
use crate::core::client::{self, ClientInput};
use crate::entities::ClientModel;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use std::sync::Arc;

fn view(client: ClientModel) -> WithBadge<ClientModel> {
    let status = client.status;
    WithBadge::new(client, &status)
}

/// `GET /clients`
pub async fn list(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<WithBadge<ClientModel>>>> {
    let caller = state.caller(&headers).await?;
    let workbench = state.workbench(&caller).await?;
    let clients = client::list_clients(&caller.user, &workbench, query.search.as_deref())
        .await
        .or_failure("Erro ao carregar clientes. Tente novamente.")?;
    Ok(Json(clients.into_iter().map(view).collect()))
}

/// `POST /clients`
pub async fn create(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(input): Json<ClientInput>,
) -> ApiResult<(StatusCode, Json<WithBadge<ClientModel>>)> {
    let caller = state.caller(&headers).await?;
    let workbench = state.workbench(&caller).await?;
    let client = client::create_client(state.console.store(), &caller.user, &workbench, input)
        .await
        .or_failure("Erro ao adicionar cliente. Tente novamente.")?;
    Ok((StatusCode::CREATED, Json(view(client))))
}

/// `PUT /clients/:id`
pub async fn update(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(input): Json<ClientInput>,
) -> ApiResult<Json<WithBadge<ClientModel>>> {
    let caller = state.caller(&headers).await?;
    let workbench = state.workbench(&caller).await?;
    let client = client::update_client(state.console.store(), &caller.user, &workbench, &id, input)
        .await
        .or_failure("Erro ao atualizar cliente. Tente novamente.")?;
    Ok(Json(view(client)))
}

/// `DELETE /clients/:id`
pub async fn remove(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let caller = state.caller(&headers).await?;
    let workbench = state.workbench(&caller).await?;
    client::delete_client(state.console.store(), &caller.user, &workbench, &id)
        .await
        .or_failure("Erro ao excluir cliente. Tente novamente.")?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use crate::api::tests::{ADMIN_EMAIL, ADMIN_PASSWORD, login, send, test_app};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_client_crud_with_badges() {
        let app = test_app().await;
        let token = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

        // Demo workbenches start with two sample clients
        let (status, body) = send(&app, "GET", "/clients", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);
        assert_eq!(body[1]["statusBadge"]["label"], "Inativo");

        let (status, created) = send(
            &app,
            "POST",
            "/clients",
            Some(&token),
            Some(json!({
                "name": "Carla Neto",
                "email": "carla@email.com",
                "nationalId": "111222333lb044"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["nationalId"], "111222333LB044");
        assert_eq!(created["statusBadge"]["label"], "Ativo");

        let (_, found) = send(&app, "GET", "/clients?search=CARLA", Some(&token), None).await;
        assert_eq!(found.as_array().unwrap().len(), 1);

        let uri = format!("/clients/{}", created["id"].as_str().unwrap());
        let (status, _) = send(&app, "DELETE", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, body) = send(&app, "DELETE", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");
    }

    #[tokio::test]
    async fn test_invalid_client_is_bad_request() {
        let app = test_app().await;
        let token = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
        let (status, body) = send(
            &app,
            "POST",
            "/clients",
            Some(&token),
            Some(json!({ "name": "", "email": "x@y.ao", "nationalId": "" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "O nome do cliente é obrigatório.");
    }
}
