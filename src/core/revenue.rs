//! Revenue calculator, expenses, analytics, projections and period comparison.
//!
//! Periods and expenses are written to the store immediately. Every entry point
//! requires `view_reports`.

use super::ids::next_id;
use super::permissions::require_permission;
use crate::config::plans::{PlanCatalog, PlanTier};
use crate::entities::revenue_period::PlanLines;
use crate::entities::{ExpenseKind, ExpenseModel, Permission, PlanLine, RevenuePeriodModel, UserModel};
use crate::errors::{Error, Result};
use crate::store::{Backend, Store};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

/// Share of revenue assumed to go to expenses in projections.
const PROJECTED_EXPENSE_RATIO: f64 = 0.6;

/// Result of multiplying plan quantities by prices
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Calculation {
    /// One line per catalog plan
    pub lines: Vec<PlanLine>,
    /// Basic tier revenue
    pub basic_total: f64,
    /// Premium tier revenue
    pub premium_total: f64,
    /// Enterprise tier revenue
    pub enterprise_total: f64,
    /// All plans
    pub total_revenue: f64,
    /// Sum of registered expenses
    pub expenses: f64,
    /// `total_revenue - expenses`
    pub net_revenue: f64,
}

/// Subscriber counts per plan code; missing plans count as zero.
pub type Quantities = BTreeMap<String, u32>;

/// Multiplies `quantities` by catalog prices and deducts `expenses`.
pub fn calculate(
    catalog: &PlanCatalog,
    quantities: &Quantities,
    expenses: &[ExpenseModel],
) -> Result<Calculation> {
    if let Some(code) = quantities.keys().find(|code| catalog.find_by_code(code).is_none()) {
        return Err(Error::validation(format!("Plano desconhecido: {code}")));
    }

    let mut calculation = Calculation::default();
    for plan in catalog.plans() {
        let quantity = quantities.get(&plan.code).copied().unwrap_or(0);
        let total = f64::from(quantity) * plan.price;
        match plan.tier {
            PlanTier::Basic => calculation.basic_total += total,
            PlanTier::Premium => calculation.premium_total += total,
            PlanTier::Enterprise => calculation.enterprise_total += total,
        }
        calculation.lines.push(PlanLine {
            code: plan.code.clone(),
            name: plan.name.clone(),
            tier: plan.tier,
            quantity,
            unit_price: plan.price,
            total,
        });
    }
    calculation.total_revenue =
        calculation.basic_total + calculation.premium_total + calculation.enterprise_total;
    calculation.expenses = expenses.iter().map(|expense| expense.amount).sum();
    calculation.net_revenue = calculation.total_revenue - calculation.expenses;
    Ok(calculation)
}

/// Growth of `current` over `previous`, in percent; zero without a usable base.
#[must_use]
pub fn growth_over(previous: Option<&RevenuePeriodModel>, current: f64) -> f64 {
    match previous {
        Some(previous) if previous.total_revenue != 0.0 => {
            (current - previous.total_revenue) / previous.total_revenue * 100.0
        }
        _ => 0.0,
    }
}

/// Previews a calculation against the owner's current expenses.
pub async fn preview(
    store: &Store,
    actor: &UserModel,
    owner_id: &str,
    catalog: &PlanCatalog,
    quantities: &Quantities,
) -> Result<Calculation> {
    require_permission(actor, Permission::ViewReports)?;
    let expenses: Vec<ExpenseModel> = store.list(owner_id).await?;
    calculate(catalog, quantities, &expenses)
}

/// Input for recording a period
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodInput {
    /// Month name
    pub month: String,
    /// Calendar year
    pub year: i32,
    /// Subscribers per plan code
    #[serde(default)]
    pub quantities: Quantities,
}

/// Recorded periods in recording order.
pub async fn list_periods(
    store: &Store,
    actor: &UserModel,
    owner_id: &str,
) -> Result<Vec<RevenuePeriodModel>> {
    require_permission(actor, Permission::ViewReports)?;
    load_periods(store, owner_id).await
}

async fn load_periods(store: &Store, owner_id: &str) -> Result<Vec<RevenuePeriodModel>> {
    let mut periods: Vec<RevenuePeriodModel> = store.list(owner_id).await?;
    periods.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(periods)
}

/// Calculates and stores a period, with growth against the last recorded one.
pub async fn record_period(
    store: &Store,
    actor: &UserModel,
    owner_id: &str,
    catalog: &PlanCatalog,
    input: PeriodInput,
) -> Result<RevenuePeriodModel> {
    require_permission(actor, Permission::ViewReports)?;
    let month = input.month.trim();
    if month.is_empty() {
        return Err(Error::validation("Selecione o mês."));
    }

    let expenses: Vec<ExpenseModel> = store.list(owner_id).await?;
    let calculation = calculate(catalog, &input.quantities, &expenses)?;
    let periods = load_periods(store, owner_id).await?;

    let period = RevenuePeriodModel {
        id: next_id(),
        owner_id: owner_id.to_string(),
        month: month.to_string(),
        year: input.year,
        growth: growth_over(periods.last(), calculation.total_revenue),
        lines: PlanLines(calculation.lines),
        basic_total: calculation.basic_total,
        premium_total: calculation.premium_total,
        enterprise_total: calculation.enterprise_total,
        total_revenue: calculation.total_revenue,
        expenses: calculation.expenses,
        net_revenue: calculation.net_revenue,
    };
    let saved = store.upsert(owner_id, &period).await?;
    info!("Recorded revenue period {}", saved.period_key());
    Ok(saved)
}

/// Expense form input
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseInput {
    /// Short name
    pub name: String,
    /// Monthly amount
    pub amount: f64,
    /// Fixed or variable, `fixed` when omitted
    #[serde(default)]
    pub kind: Option<ExpenseKind>,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Date
    #[serde(default)]
    pub date: String,
}

/// Registered expenses.
pub async fn list_expenses(
    store: &Store,
    actor: &UserModel,
    owner_id: &str,
) -> Result<Vec<ExpenseModel>> {
    require_permission(actor, Permission::ViewReports)?;
    store.list(owner_id).await
}

/// Registers an expense.
pub async fn add_expense(
    store: &Store,
    actor: &UserModel,
    owner_id: &str,
    input: ExpenseInput,
) -> Result<ExpenseModel> {
    require_permission(actor, Permission::ViewReports)?;
    if input.name.trim().is_empty() {
        return Err(Error::validation("O nome da despesa é obrigatório."));
    }
    if !input.amount.is_finite() || input.amount <= 0.0 {
        return Err(Error::InvalidAmount {
            amount: input.amount,
        });
    }
    let expense = ExpenseModel {
        id: next_id(),
        owner_id: owner_id.to_string(),
        name: input.name.trim().to_string(),
        amount: input.amount,
        kind: input.kind.unwrap_or(ExpenseKind::Fixed),
        description: input.description,
        date: input.date,
    };
    store.upsert(owner_id, &expense).await
}

/// Removes an expense; removing an unknown id is not an error.
pub async fn remove_expense(store: &Store, actor: &UserModel, owner_id: &str, id: &str) -> Result<()> {
    require_permission(actor, Permission::ViewReports)?;
    store.delete::<ExpenseModel>(owner_id, id).await
}

/// Totals for one plan across every period
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanAnalysis {
    /// Plan code
    pub code: String,
    /// Plan name
    pub name: String,
    /// Subscribers summed over periods
    pub total_clients: u64,
    /// Revenue summed over periods
    pub total_revenue: f64,
}

/// Aggregates over recorded periods
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
    /// Number of periods
    pub periods: usize,
    /// Revenue summed over periods
    pub total_revenue: f64,
    /// Expenses summed over periods
    pub total_expenses: f64,
    /// `total_revenue - total_expenses`
    pub total_net_revenue: f64,
    /// Subscribers summed over periods
    pub total_clients: u64,
    /// Revenue per subscriber
    pub average_revenue_per_client: f64,
    /// Net over gross revenue, in percent
    pub profit_margin: f64,
    /// Mean period growth, in percent
    pub average_growth: f64,
    /// Per-plan totals, in catalog order
    pub plans: Vec<PlanAnalysis>,
}

/// Aggregates `periods`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn analyze(catalog: &PlanCatalog, periods: &[RevenuePeriodModel]) -> Analytics {
    let total_revenue: f64 = periods.iter().map(|p| p.total_revenue).sum();
    let total_expenses: f64 = periods.iter().map(|p| p.expenses).sum();
    let total_net_revenue = total_revenue - total_expenses;
    let total_clients: u64 = periods.iter().map(RevenuePeriodModel::total_clients).sum();

    let average_growth = if periods.is_empty() {
        0.0
    } else {
        periods.iter().map(|p| p.growth).sum::<f64>() / periods.len() as f64
    };

    let plans = catalog
        .plans()
        .iter()
        .map(|plan| {
            let lines = periods.iter().filter_map(|period| period.line(&plan.code));
            let (clients, revenue) = lines.fold((0_u64, 0.0), |(clients, revenue), line| {
                (clients + u64::from(line.quantity), revenue + line.total)
            });
            PlanAnalysis {
                code: plan.code.clone(),
                name: plan.name.clone(),
                total_clients: clients,
                total_revenue: revenue,
            }
        })
        .collect();

    Analytics {
        periods: periods.len(),
        total_revenue,
        total_expenses,
        total_net_revenue,
        total_clients,
        average_revenue_per_client: if total_clients > 0 {
            total_revenue / total_clients as f64
        } else {
            0.0
        },
        profit_margin: if total_revenue > 0.0 {
            total_net_revenue / total_revenue * 100.0
        } else {
            0.0
        },
        average_growth,
        plans,
    }
}

/// Analytics over the owner's recorded periods.
pub async fn analytics(
    store: &Store,
    actor: &UserModel,
    owner_id: &str,
    catalog: &PlanCatalog,
) -> Result<Analytics> {
    require_permission(actor, Permission::ViewReports)?;
    let periods = load_periods(store, owner_id).await?;
    Ok(analyze(catalog, &periods))
}

/// Projection scenario
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scenario {
    /// 70 % of the parameters
    Conservative,
    /// The parameters as given
    #[default]
    Realistic,
    /// 130 % of the parameters
    Optimistic,
}

impl Scenario {
    /// Factor applied to growth, new clients and churn.
    #[must_use]
    pub const fn multiplier(self) -> f64 {
        match self {
            Self::Conservative => 0.7,
            Self::Realistic => 1.0,
            Self::Optimistic => 1.3,
        }
    }
}

/// Projection parameters
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectionParams {
    /// Months to project
    pub months: u32,
    /// Yearly revenue growth, in percent
    pub growth_rate: f64,
    /// New subscribers per month
    pub new_clients_per_month: f64,
    /// Monthly churn, in percent of subscribers
    pub churn_rate: f64,
    /// Scenario multiplier
    pub scenario: Scenario,
}

/// Longest horizon a projection may cover, in months.
pub const MAX_PROJECTION_MONTHS: u32 = 120;
const MAX_GROWTH_RATE: f64 = 1_000.0;
const MAX_NEW_CLIENTS_PER_MONTH: f64 = 1_000_000.0;

impl ProjectionParams {
    /// Rejects horizons outside `1..=MAX_PROJECTION_MONTHS` and rates that are
    /// negative, not finite or past their ceiling.
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_PROJECTION_MONTHS).contains(&self.months) {
            return Err(Error::validation(format!(
                "O período de projeção deve ter entre 1 e {MAX_PROJECTION_MONTHS} meses."
            )));
        }
        let within = |value: f64, max: f64| value.is_finite() && (0.0..=max).contains(&value);
        if !within(self.growth_rate, MAX_GROWTH_RATE) {
            return Err(Error::validation("Taxa de crescimento inválida."));
        }
        if !within(self.new_clients_per_month, MAX_NEW_CLIENTS_PER_MONTH) {
            return Err(Error::validation("Número de novos clientes inválido."));
        }
        if !within(self.churn_rate, 100.0) {
            return Err(Error::validation("Taxa de cancelamento inválida."));
        }
        Ok(())
    }
}

impl Default for ProjectionParams {
    fn default() -> Self {
        Self {
            months: 6,
            growth_rate: 10.0,
            new_clients_per_month: 50.0,
            churn_rate: 5.0,
            scenario: Scenario::Realistic,
        }
    }
}

/// One projected month
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Projection {
    /// Months after the last recorded period
    pub month: u32,
    /// Projected revenue
    pub total_revenue: f64,
    /// Revenue after estimated expenses
    pub net_revenue: f64,
    /// Projected subscribers
    pub total_clients: i64,
    /// Subscribers gained this month
    pub new_clients: i64,
    /// Subscribers lost this month
    pub lost_clients: i64,
    /// Annualised growth, in percent of one
    pub growth: f64,
}

/// Projections plus their summary
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionReport {
    /// Month by month
    pub projections: Vec<Projection>,
    /// Revenue over the whole horizon
    pub total_projected_revenue: f64,
    /// Mean of the monthly growth figures
    pub average_growth: f64,
}

/// Projects forward from the last period. No history, no projections.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn project(periods: &[RevenuePeriodModel], params: &ProjectionParams) -> Result<ProjectionReport> {
    params.validate()?;
    let Some(last) = periods.last() else {
        return Ok(ProjectionReport::default());
    };

    let multiplier = params.scenario.multiplier();
    let mut revenue = last.total_revenue;
    let mut clients = i64::try_from(last.total_clients()).unwrap_or(i64::MAX);
    let mut projections = Vec::with_capacity(params.months as usize);

    for month in 1..=params.months {
        let new_clients = (params.new_clients_per_month * multiplier).round() as i64;
        let lost_clients =
            (clients as f64 * params.churn_rate / 100.0 * multiplier).round() as i64;
        clients = clients.saturating_add(new_clients).saturating_sub(lost_clients);

        let monthly_growth = params.growth_rate / 100.0 * multiplier;
        revenue *= 1.0 + monthly_growth / 12.0;
        let expenses = revenue * PROJECTED_EXPENSE_RATIO;

        projections.push(Projection {
            month,
            total_revenue: revenue,
            net_revenue: revenue - expenses,
            total_clients: clients,
            new_clients,
            lost_clients,
            growth: monthly_growth * 12.0,
        });
    }

    let total_projected_revenue = projections.iter().map(|p| p.total_revenue).sum();
    let average_growth = if projections.is_empty() {
        0.0
    } else {
        projections.iter().map(|p| p.growth).sum::<f64>() / projections.len() as f64
    };
    Ok(ProjectionReport {
        projections,
        total_projected_revenue,
        average_growth,
    })
}

/// Projections from the owner's recorded periods.
pub async fn projections(
    store: &Store,
    actor: &UserModel,
    owner_id: &str,
    params: &ProjectionParams,
) -> Result<ProjectionReport> {
    require_permission(actor, Permission::ViewReports)?;
    params.validate()?;
    let periods = load_periods(store, owner_id).await?;
    project(&periods, params)
}

/// Absolute and relative difference between two values
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Difference {
    /// `first - second`
    pub absolute: f64,
    /// Difference relative to `second`, in percent; zero when `second` is zero
    pub percentage: f64,
}

impl Difference {
    /// Difference of `first` against the base `second`.
    #[must_use]
    pub fn between(first: f64, second: f64) -> Self {
        let absolute = first - second;
        let percentage = if second == 0.0 {
            0.0
        } else {
            absolute / second * 100.0
        };
        Self {
            absolute,
            percentage,
        }
    }
}

/// Per-plan revenue difference
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanDifference {
    /// Plan code
    pub code: String,
    /// Plan name
    pub name: String,
    /// Revenue difference
    pub revenue: Difference,
}

/// Two periods side by side
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    /// Period being compared
    pub first: RevenuePeriodModel,
    /// Base period
    pub second: RevenuePeriodModel,
    /// Gross revenue difference
    pub total_revenue: Difference,
    /// Net revenue difference
    pub net_revenue: Difference,
    /// Expense difference
    pub expenses: Difference,
    /// Subscriber difference
    pub total_clients: Difference,
    /// Per-plan revenue differences, in catalog order
    pub plans: Vec<PlanDifference>,
}

/// Compares the periods keyed `first` and `second` (`"{month}-{year}"`).
#[allow(clippy::cast_precision_loss)]
pub fn compare_periods(
    catalog: &PlanCatalog,
    periods: &[RevenuePeriodModel],
    first: &str,
    second: &str,
) -> Result<Comparison> {
    let find = |key: &str| {
        periods
            .iter()
            .find(|period| period.period_key() == key)
            .cloned()
            .ok_or_else(|| Error::not_found("revenue period", key))
    };
    let first = find(first)?;
    let second = find(second)?;

    let line_total = |period: &RevenuePeriodModel, code: &str| period.line(code).map_or(0.0, |line| line.total);
    let plans = catalog
        .plans()
        .iter()
        .map(|plan| PlanDifference {
            code: plan.code.clone(),
            name: plan.name.clone(),
            revenue: Difference::between(line_total(&first, &plan.code), line_total(&second, &plan.code)),
        })
        .collect();

    Ok(Comparison {
        total_revenue: Difference::between(first.total_revenue, second.total_revenue),
        net_revenue: Difference::between(first.net_revenue, second.net_revenue),
        expenses: Difference::between(first.expenses, second.expenses),
        total_clients: Difference::between(
            first.total_clients() as f64,
            second.total_clients() as f64,
        ),
        plans,
        first,
        second,
    })
}

/// Compares two of the owner's recorded periods.
pub async fn compare(
    store: &Store,
    actor: &UserModel,
    owner_id: &str,
    catalog: &PlanCatalog,
    first: &str,
    second: &str,
) -> Result<Comparison> {
    require_permission(actor, Permission::ViewReports)?;
    let periods = load_periods(store, owner_id).await?;
    compare_periods(catalog, &periods, first, second)
}
