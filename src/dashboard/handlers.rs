//! Dashboard route handlers.

use axum::{Json, extract::State};
use serde::Deserialize;

use crate::{
    Error,
    app_state::RecordState,
    dashboard::{DashboardSummary, ExpenseGroupSummary, aggregate, summarize},
    extract::ApiQuery,
    period::MonthPeriod,
    recurring_expense::get_recurring_expenses,
    savings_pot::get_savings_pots,
    transaction::get_transactions,
};

/// The month to report on, the current one by default.
#[derive(Debug, Default, Deserialize)]
pub struct PeriodQuery {
    /// The month number, 1-12.
    pub month: Option<i64>,
    /// The calendar year.
    pub year: Option<i64>,
}

/// A route handler for the monthly summary and next-month forecast.
pub async fn get_dashboard_summary(
    State(state): State<RecordState>,
    ApiQuery(query): ApiQuery<PeriodQuery>,
) -> Result<Json<DashboardSummary>, Error> {
    let timezone = state.local_timezone;
    let period = MonthPeriod::from_parts(query.month, query.year, timezone)?;
    let connection = state.connection()?;

    let transactions = get_transactions(&state.user_id, &connection)
        .inspect_err(|error| tracing::error!("could not get transactions: {error}"))?;
    let savings_pots = get_savings_pots(&state.user_id, &connection)
        .inspect_err(|error| tracing::error!("could not get savings pots: {error}"))?;
    let recurring_expenses = get_recurring_expenses(&state.user_id, &connection)
        .inspect_err(|error| tracing::error!("could not get recurring expenses: {error}"))?;

    Ok(Json(summarize(
        period,
        &transactions,
        &savings_pots,
        &recurring_expenses,
        timezone,
    )))
}

/// A route handler for a month's expenses broken down by expense group.
pub async fn get_expense_groups(
    State(state): State<RecordState>,
    ApiQuery(query): ApiQuery<PeriodQuery>,
) -> Result<Json<ExpenseGroupSummary>, Error> {
    let timezone = state.local_timezone;
    let period = MonthPeriod::from_parts(query.month, query.year, timezone)?;
    let connection = state.connection()?;

    let transactions = get_transactions(&state.user_id, &connection)
        .inspect_err(|error| tracing::error!("could not get transactions: {error}"))?;

    Ok(Json(aggregate(&transactions, period, timezone)))
}
