//! Login, logout and the current session.

use super::error::{ApiResult, OrFailure};
use super::{AppState, Caller};
use crate::core::auth;
use crate::core::permissions::{Section, visible_sections};
use crate::core::users::UserView;
use crate::entities::UserModel;
use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Login form
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    email: String,
    password: String,
}

/// The logged-in user and the sections they may open
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    user: UserView,
    sections: Vec<Section>,
}

impl SessionResponse {
    fn new(token: Option<String>, user: &UserModel) -> Self {
        Self {
            token,
            user: UserView::from(user),
            sections: visible_sections(user),
        }
    }
}

/// `POST /auth/login`
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let (session, user) = auth::login(state.console.store(), &state.sessions, &req.email, &req.password)
        .await
        .or_failure("Erro ao fazer login. Tente novamente.")?;
    Ok(Json(SessionResponse::new(Some(session.token), &user)))
}

/// `POST /auth/logout`
pub async fn logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> ApiResult<StatusCode> {
    let Caller { token, .. } = state.caller(&headers).await?;
    auth::logout(&state.sessions, &token).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /auth/me`
pub async fn me(State(state): State<Arc<AppState>>, headers: HeaderMap) -> ApiResult<Json<SessionResponse>> {
    let caller = state.caller(&headers).await?;
    Ok(Json(SessionResponse::new(None, &caller.user)))
}
