//! Dashboard and report generation.
//!
//! Figures are computed from the owner's workbench, so unsaved edits are already
//! reflected. The growth percentages, the monthly performance table and the plan
//! distribution are fixed sample figures shown until historical data exists.

use super::autosave::Workspace;
use super::labels::format_kwanza;
use super::permissions::{Section, require_section};
use super::workbench::Workbench;
use crate::config::plans::{PlanCatalog, PlanTier};
use crate::entities::{ClientStatus, InvoiceStatus, SubscriptionStatus, UserModel};
use crate::errors::Result;
use serde::Serialize;

/// Headline numbers shared by the dashboard and the reports
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    /// Clients with status `Active`
    pub active_clients: usize,
    /// Subscriptions with status `Active`
    pub active_subscriptions: usize,
    /// Sum of paid invoices
    pub total_revenue: f64,
    /// Sum of pending invoices
    pub pending_revenue: f64,
    /// Number of pending invoices
    pub pending_invoices: usize,
}

/// Computes the headline numbers for a workspace.
#[must_use]
pub fn summarize(workspace: &Workspace) -> Totals {
    let mut totals = Totals {
        active_clients: workspace
            .clients
            .iter()
            .filter(|client| client.status == ClientStatus::Active)
            .count(),
        active_subscriptions: workspace
            .subscriptions
            .iter()
            .filter(|sub| sub.status == SubscriptionStatus::Active)
            .count(),
        ..Totals::default()
    };
    for invoice in &workspace.invoices {
        match invoice.status {
            InvoiceStatus::Paid => totals.total_revenue += invoice.amount,
            InvoiceStatus::Pending => {
                totals.pending_revenue += invoice.amount;
                totals.pending_invoices += 1;
            }
            InvoiceStatus::Overdue => {}
        }
    }
    totals
}

/// One catalog plan on the dashboard
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanOverview {
    /// Plan name
    pub name: String,
    /// Tier
    pub tier: PlanTier,
    /// Localized tier name
    pub tier_label: &'static str,
    /// Monthly price
    pub price: f64,
    /// Price formatted in kwanza
    pub price_label: String,
    /// Active subscriptions on this plan
    pub subscribers: usize,
}

/// Dashboard payload
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    /// Headline numbers
    #[serde(flatten)]
    pub totals: Totals,
    /// Paid revenue formatted in kwanza
    pub total_revenue_label: String,
    /// Client growth this month, in percent
    pub client_growth: f64,
    /// Revenue growth this month, in percent
    pub revenue_growth: f64,
    /// Subscription growth this month, in percent
    pub subscription_growth: f64,
    /// Subscribers per catalog plan
    pub plans: Vec<PlanOverview>,
}

/// Builds the dashboard for `actor`.
pub async fn dashboard(
    actor: &UserModel,
    workbench: &Workbench,
    catalog: &PlanCatalog,
) -> Result<Dashboard> {
    require_section(actor, Section::Dashboard)?;
    Ok(workbench
        .read(|workspace| build_dashboard(workspace, catalog))
        .await)
}

/// Dashboard figures for a workspace.
#[must_use]
pub fn build_dashboard(workspace: &Workspace, catalog: &PlanCatalog) -> Dashboard {
    let totals = summarize(workspace);
    let plans = catalog
        .plans()
        .iter()
        .map(|plan| PlanOverview {
            name: plan.name.clone(),
            tier: plan.tier,
            tier_label: plan.tier.label(),
            price: plan.price,
            price_label: format_kwanza(plan.price),
            subscribers: workspace
                .subscriptions
                .iter()
                .filter(|sub| sub.status == SubscriptionStatus::Active && sub.plan == plan.name)
                .count(),
        })
        .collect();

    Dashboard {
        total_revenue_label: format_kwanza(totals.total_revenue),
        totals,
        client_growth: 15.2,
        revenue_growth: 23.1,
        subscription_growth: 8.7,
        plans,
    }
}

/// A month in the performance table
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct MonthlyPerformance {
    /// Month abbreviation
    pub month: &'static str,
    /// Revenue in kwanza
    pub revenue: f64,
    /// Client count
    pub clients: u32,
}

/// A plan's share of subscribers
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PlanShare {
    /// Plan name
    pub plan: &'static str,
    /// Subscribers
    pub count: u32,
    /// Share of all subscribers, in percent
    pub percentage: f64,
}

const MONTHLY_PERFORMANCE: [MonthlyPerformance; 6] = [
    MonthlyPerformance { month: "Jan", revenue: 450_000.0, clients: 45 },
    MonthlyPerformance { month: "Fev", revenue: 520_000.0, clients: 52 },
    MonthlyPerformance { month: "Mar", revenue: 480_000.0, clients: 48 },
    MonthlyPerformance { month: "Abr", revenue: 610_000.0, clients: 61 },
    MonthlyPerformance { month: "Mai", revenue: 580_000.0, clients: 58 },
    MonthlyPerformance { month: "Jun", revenue: 720_000.0, clients: 72 },
];

const PLAN_DISTRIBUTION: [PlanShare; 5] = [
    PlanShare { plan: "Básico 2Mbps", count: 25, percentage: 35.0 },
    PlanShare { plan: "Básico 4Mbps", count: 18, percentage: 25.0 },
    PlanShare { plan: "Premium 6Mbps", count: 15, percentage: 21.0 },
    PlanShare { plan: "Premium 8Mbps", count: 10, percentage: 14.0 },
    PlanShare { plan: "Enterprise 10Mbps", count: 4, percentage: 5.0 },
];

/// Reports payload
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reports {
    /// Headline numbers
    #[serde(flatten)]
    pub totals: Totals,
    /// Paid revenue formatted in kwanza
    pub total_revenue_label: String,
    /// Pending revenue formatted in kwanza
    pub pending_revenue_label: String,
    /// Monthly performance table
    pub monthly_performance: Vec<MonthlyPerformance>,
    /// Plan distribution table
    pub plan_distribution: Vec<PlanShare>,
    /// Customer satisfaction, in percent
    pub satisfaction_rate: f64,
    /// Monthly churn, in percent
    pub churn_rate: f64,
}

/// Builds the reports view for `actor`.
pub async fn reports(actor: &UserModel, workbench: &Workbench) -> Result<Reports> {
    require_section(actor, Section::Reports)?;
    let totals = workbench.read(summarize).await;
    Ok(Reports {
        total_revenue_label: format_kwanza(totals.total_revenue),
        pending_revenue_label: format_kwanza(totals.pending_revenue),
        totals,
        monthly_performance: MONTHLY_PERFORMANCE.to_vec(),
        plan_distribution: PLAN_DISTRIBUTION.to_vec(),
        satisfaction_rate: 87.5,
        churn_rate: 2.3,
    })
}
