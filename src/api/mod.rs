//! JSON over HTTP.
//!
//! Handlers are thin: resolve the caller from the bearer token, call into
//! [`crate::core`], wrap the result. Records scoped to a user (clients,
//! subscriptions, invoices, revenue data) live under the caller's id.

pub mod auth;
pub mod clients;
pub mod error;
pub mod invoices;
pub mod reports;
pub mod revenue;
pub mod save;
pub mod subscriptions;
pub mod users;

use crate::config::plans::{Plan, PlanCatalog};
use crate::core::auth::{SessionStore, current_user};
use crate::core::labels::{Badged, StatusBadge, format_kwanza};
use crate::core::workbench::{Console, Workbench};
use crate::entities::UserModel;
use crate::errors::Error;
use axum::extract::State;
use axum::http::{HeaderMap, header};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use error::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shown while the service runs on local storage.
pub const DEMO_BANNER: &str = "Modo Demo: Os dados são salvos localmente e serão perdidos ao limpar o armazenamento local.";

/// Shared state behind every handler
#[derive(Debug)]
pub struct AppState {
    /// Store and per-user workbenches
    pub console: Console,
    /// Open login sessions
    pub sessions: SessionStore,
    /// Internet plans
    pub catalog: PlanCatalog,
    /// E-mail of the protected default administrator
    pub admin_email: String,
}

/// The authenticated caller of a request
#[derive(Debug)]
pub struct Caller {
    /// Bearer token the caller presented
    pub token: String,
    /// Current user record
    pub user: UserModel,
}

impl AppState {
    /// Resolves the bearer token in `headers` to an active user.
    pub async fn caller(&self, headers: &HeaderMap) -> ApiResult<Caller> {
        let token = bearer_token(headers).ok_or_else(|| ApiError::from(Error::Unauthenticated))?;
        let user = current_user(self.console.store(), &self.sessions, token).await?;
        Ok(Caller {
            token: token.to_string(),
            user,
        })
    }

    /// The caller's workbench.
    pub async fn workbench(&self, caller: &Caller) -> ApiResult<Arc<Workbench>> {
        Ok(self.console.workbench(&caller.user.id).await?)
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// A record together with the badge for its status
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithBadge<T> {
    /// The record itself
    #[serde(flatten)]
    pub record: T,
    /// Badge for the record's status
    pub status_badge: StatusBadge,
}

impl<T> WithBadge<T> {
    /// Pairs `record` with the badge of `status`.
    pub fn new(record: T, status: &impl Badged) -> Self {
        Self {
            status_badge: status.badge(),
            record,
        }
    }
}

/// `?search=` on list routes
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    /// Free-text filter
    pub search: Option<String>,
}

/// Builds the router with every route and request tracing.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/mode", get(mode))
        .route("/plans", get(plans))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/clients", get(clients::list).post(clients::create))
        .route("/clients/:id", put(clients::update).delete(clients::remove))
        .route(
            "/subscriptions",
            get(subscriptions::list).post(subscriptions::create),
        )
        .route(
            "/subscriptions/:id",
            put(subscriptions::update).delete(subscriptions::remove),
        )
        .route("/invoices", get(invoices::list).post(invoices::create))
        .route("/invoices/:id", put(invoices::update).delete(invoices::remove))
        .route("/dashboard", get(reports::dashboard))
        .route("/reports", get(reports::reports))
        .route("/users", get(users::list).post(users::create))
        .route("/users/stats", get(users::stats))
        .route("/users/:id", put(users::update).delete(users::remove))
        .route("/users/:id/toggle-status", post(users::toggle_status))
        .route("/save/status", get(save::status))
        .route("/save", post(save::save_now))
        .route(
            "/revenue/periods",
            get(revenue::list_periods).post(revenue::record_period),
        )
        .route("/revenue/calculate", post(revenue::calculate))
        .route("/revenue/analytics", get(revenue::analytics))
        .route("/revenue/projections", post(revenue::projections))
        .route("/revenue/compare", get(revenue::compare))
        .route(
            "/revenue/expenses",
            get(revenue::list_expenses).post(revenue::add_expense),
        )
        .route("/revenue/expenses/:id", delete(revenue::remove_expense))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Debug, Serialize)]
struct ModeResponse {
    demo: bool,
    banner: Option<&'static str>,
}

async fn mode(State(state): State<Arc<AppState>>) -> Json<ModeResponse> {
    let demo = state.console.store().is_demo();
    Json(ModeResponse {
        demo,
        banner: demo.then_some(DEMO_BANNER),
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PlanResponse {
    #[serde(flatten)]
    plan: Plan,
    tier_label: &'static str,
    price_label: String,
}

async fn plans(State(state): State<Arc<AppState>>) -> Json<Vec<PlanResponse>> {
    Json(
        state
            .catalog
            .plans()
            .iter()
            .map(|plan| PlanResponse {
                tier_label: plan.tier.label(),
                price_label: format_kwanza(plan.price),
                plan: plan.clone(),
            })
            .collect(),
    )
}
