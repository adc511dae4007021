//! Dashboard and reports routes.

use super::AppState;
use super::error::{ApiResult, OrFailure};
use crate::core::report::{self, Dashboard, Reports};
use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use std::sync::Arc;

/// `GET /dashboard`
pub async fn dashboard(State(state): State<Arc<AppState>>, headers: HeaderMap) -> ApiResult<Json<Dashboard>> {
    let caller = state.caller(&headers).await?;
    let workbench = state.workbench(&caller).await?;
    let dashboard = report::dashboard(&caller.user, &workbench, &state.catalog)
        .await
        .or_failure("Erro ao carregar o dashboard. Tente novamente.")?;
    Ok(Json(dashboard))
}

/// `GET /reports`
pub async fn reports(State(state): State<Arc<AppState>>, headers: HeaderMap) -> ApiResult<Json<Reports>> {
    let caller = state.caller(&headers).await?;
    let workbench = state.workbench(&caller).await?;
    let reports = report::reports(&caller.user, &workbench)
        .await
        .or_failure("Erro ao gerar relatórios. Tente novamente.")?;
    Ok(Json(reports))
}
