//! Save indicator and manual save.

use super::AppState;
use super::error::{ApiResult, OrFailure};
use crate::core::workbench::{SaveOutcome, SaveStatus};
use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use std::sync::Arc;

/// `GET /save/status`
pub async fn status(State(state): State<Arc<AppState>>, headers: HeaderMap) -> ApiResult<Json<SaveStatus>> {
    let caller = state.caller(&headers).await?;
    let workbench = state.workbench(&caller).await?;
    Ok(Json(workbench.status().await?))
}

/// `POST /save`
pub async fn save_now(State(state): State<Arc<AppState>>, headers: HeaderMap) -> ApiResult<Json<SaveOutcome>> {
    let caller = state.caller(&headers).await?;
    let workbench = state.workbench(&caller).await?;
    let outcome = workbench
        .save_now()
        .await
        .or_failure("Erro ao salvar alterações. Tente novamente.")?;
    Ok(Json(outcome))
}
