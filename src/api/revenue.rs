//! Revenue calculator, expenses, analytics, projections and comparison routes.
//!
//! Periods and expenses belong to the caller, like clients do.

use super::AppState;
use super::error::{ApiResult, OrFailure};
use crate::core::labels::{Badged, StatusBadge};
use crate::core::revenue::{
    self, Analytics, Calculation, Comparison, ExpenseInput, PeriodInput, ProjectionParams,
    ProjectionReport, Quantities,
};
use crate::entities::{ExpenseModel, RevenuePeriodModel};
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const LOAD_FAILURE: &str = "Erro ao carregar dados de receita. Tente novamente.";

/// Calculator input
#[derive(Debug, Deserialize)]
pub struct CalculateRequest {
    #[serde(default)]
    quantities: Quantities,
}

/// Period keys to compare
#[derive(Debug, Deserialize)]
pub struct CompareQuery {
    first: String,
    second: String,
}

/// An expense with its kind badge
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseView {
    #[serde(flatten)]
    expense: ExpenseModel,
    kind_badge: StatusBadge,
}

impl From<ExpenseModel> for ExpenseView {
    fn from(expense: ExpenseModel) -> Self {
        Self {
            kind_badge: expense.kind.badge(),
            expense,
        }
    }
}

/// `GET /revenue/periods`
pub async fn list_periods(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<RevenuePeriodModel>>> {
    let caller = state.caller(&headers).await?;
    let periods = revenue::list_periods(state.console.store(), &caller.user, &caller.user.id)
        .await
        .or_failure(LOAD_FAILURE)?;
    Ok(Json(periods))
}

/// `POST /revenue/periods`
pub async fn record_period(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(input): Json<PeriodInput>,
) -> ApiResult<(StatusCode, Json<RevenuePeriodModel>)> {
    let caller = state.caller(&headers).await?;
    let period = revenue::record_period(
        state.console.store(),
        &caller.user,
        &caller.user.id,
        &state.catalog,
        input,
    )
    .await
    .or_failure("Erro ao salvar dados de receita. Tente novamente.")?;
    Ok((StatusCode::CREATED, Json(period)))
}

/// `POST /revenue/calculate`
pub async fn calculate(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CalculateRequest>,
) -> ApiResult<Json<Calculation>> {
    let caller = state.caller(&headers).await?;
    let calculation = revenue::preview(
        state.console.store(),
        &caller.user,
        &caller.user.id,
        &state.catalog,
        &req.quantities,
    )
    .await
    .or_failure(LOAD_FAILURE)?;
    Ok(Json(calculation))
}

/// `GET /revenue/analytics`
pub async fn analytics(State(state): State<Arc<AppState>>, headers: HeaderMap) -> ApiResult<Json<Analytics>> {
    let caller = state.caller(&headers).await?;
    let analytics = revenue::analytics(state.console.store(), &caller.user, &caller.user.id, &state.catalog)
        .await
        .or_failure(LOAD_FAILURE)?;
    Ok(Json(analytics))
}

/// `POST /revenue/projections`
pub async fn projections(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(params): Json<ProjectionParams>,
) -> ApiResult<Json<ProjectionReport>> {
    let caller = state.caller(&headers).await?;
    let report = revenue::projections(state.console.store(), &caller.user, &caller.user.id, &params)
        .await
        .or_failure(LOAD_FAILURE)?;
    Ok(Json(report))
}

/// `GET /revenue/compare?first=&second=`
pub async fn compare(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<CompareQuery>,
) -> ApiResult<Json<Comparison>> {
    let caller = state.caller(&headers).await?;
    let comparison = revenue::compare(
        state.console.store(),
        &caller.user,
        &caller.user.id,
        &state.catalog,
        &query.first,
        &query.second,
    )
    .await
    .or_failure(LOAD_FAILURE)?;
    Ok(Json(comparison))
}

/// `GET /revenue/expenses`
pub async fn list_expenses(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<ExpenseView>>> {
    let caller = state.caller(&headers).await?;
    let expenses = revenue::list_expenses(state.console.store(), &caller.user, &caller.user.id)
        .await
        .or_failure(LOAD_FAILURE)?;
    Ok(Json(expenses.into_iter().map(ExpenseView::from).collect()))
}

/// `POST /revenue/expenses`
pub async fn add_expense(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(input): Json<ExpenseInput>,
) -> ApiResult<(StatusCode, Json<ExpenseView>)> {
    let caller = state.caller(&headers).await?;
    let expense = revenue::add_expense(state.console.store(), &caller.user, &caller.user.id, input)
        .await
        .or_failure("Erro ao adicionar despesa. Tente novamente.")?;
    Ok((StatusCode::CREATED, Json(ExpenseView::from(expense))))
}

/// `DELETE /revenue/expenses/:id`
pub async fn remove_expense(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let caller = state.caller(&headers).await?;
    revenue::remove_expense(state.console.store(), &caller.user, &caller.user.id, &id)
        .await
        .or_failure("Erro ao remover despesa. Tente novamente.")?;
    Ok(StatusCode::NO_CONTENT)
}
