//! User administration routes.

use super::error::{ApiResult, OrFailure};
use super::{AppState, SearchQuery};
use crate::core::users::{self, NewUser, UserStats, UserUpdate, UserView};
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use std::sync::Arc;

/// `GET /users`
pub async fn list(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<UserView>>> {
    let caller = state.caller(&headers).await?;
    let found = users::list_users(state.console.store(), &caller.user, query.search.as_deref())
        .await
        .or_failure("Erro ao carregar usuários. Tente novamente.")?;
    Ok(Json(found.iter().map(UserView::from).collect()))
}

/// `GET /users/stats`
pub async fn stats(State(state): State<Arc<AppState>>, headers: HeaderMap) -> ApiResult<Json<UserStats>> {
    let caller = state.caller(&headers).await?;
    let stats = users::user_stats(state.console.store(), &caller.user)
        .await
        .or_failure("Erro ao carregar usuários. Tente novamente.")?;
    Ok(Json(stats))
}

/// `POST /users`
pub async fn create(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(input): Json<NewUser>,
) -> ApiResult<(StatusCode, Json<UserView>)> {
    let caller = state.caller(&headers).await?;
    let user = users::create_user(state.console.store(), &caller.user, input)
        .await
        .or_failure("Erro ao criar usuário. Tente novamente.")?;
    Ok((StatusCode::CREATED, Json(UserView::from(&user))))
}

/// `PUT /users/:id`
pub async fn update(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(update): Json<UserUpdate>,
) -> ApiResult<Json<UserView>> {
    let caller = state.caller(&headers).await?;
    let user = users::update_user(state.console.store(), &caller.user, &state.admin_email, &id, update)
        .await
        .or_failure("Erro ao atualizar usuário. Tente novamente.")?;
    Ok(Json(UserView::from(&user)))
}

/// `DELETE /users/:id`
pub async fn remove(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let caller = state.caller(&headers).await?;
    users::delete_user(state.console.store(), &caller.user, &state.admin_email, &id)
        .await
        .or_failure("Erro ao excluir usuário. Tente novamente.")?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /users/:id/toggle-status`
pub async fn toggle_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<UserView>> {
    let caller = state.caller(&headers).await?;
    let user = users::toggle_user_status(state.console.store(), &caller.user, &state.admin_email, &id)
        .await
        .or_failure("Erro ao alterar status do usuário. Tente novamente.")?;
    Ok(Json(UserView::from(&user)))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use crate::api::tests::{ADMIN_EMAIL, ADMIN_PASSWORD, login, send, test_app};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_user_admin_flow() {
        let app = test_app().await;
        let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

        let (status, created) = send(
            &app,
            "POST",
            "/users",
            Some(&admin),
            Some(json!({ "name": "Ana", "email": "ana@lumanet.ao", "password": "segredo1" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["role"], "user");
        assert_eq!(created["permissions"].as_array().unwrap().len(), 4);

        let (_, stats) = send(&app, "GET", "/users/stats", Some(&admin), None).await;
        assert_eq!(stats["total"], 2);
        assert_eq!(stats["admins"], 1);

        // A deactivated user is logged out on the next request
        let ana = login(&app, "ana@lumanet.ao", "segredo1").await;
        let uri = format!("/users/{}/toggle-status", created["id"].as_str().unwrap());
        let (status, toggled) = send(&app, "POST", &uri, Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(toggled["statusBadge"]["label"], "Inativo");
        let (status, _) = send(&app, "GET", "/auth/me", Some(&ana), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_default_admin_is_protected_and_users_need_manage_users() {
        let app = test_app().await;
        let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

        let (_, me) = send(&app, "GET", "/auth/me", Some(&admin), None).await;
        let uri = format!("/users/{}", me["user"]["id"].as_str().unwrap());
        let (status, body) = send(&app, "DELETE", &uri, Some(&admin), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "Não é possível excluir o usuário administrador padrão.");

        send(
            &app,
            "POST",
            "/users",
            Some(&admin),
            Some(json!({ "name": "Ana", "email": "ana@lumanet.ao", "password": "segredo1" })),
        )
        .await;
        let ana = login(&app, "ana@lumanet.ao", "segredo1").await;
        let (status, _) = send(&app, "GET", "/users", Some(&ana), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}
