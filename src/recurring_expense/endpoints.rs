use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;

use crate::{
    Error, MessageBody,
    app_state::{RecordState, lock_connection},
    database_id::DatabaseId,
    extract::{ApiJson, ApiPath},
    period::MonthPeriod,
    recurring_expense::{
        RecurringExpense, RecurringExpenseForm, create_recurring_expense,
        delete_recurring_expense, generate_recurring_transactions, get_recurring_expense,
        get_recurring_expenses, update_recurring_expense,
    },
    transaction::{Transaction, TransactionState, TransactionWriter},
};

/// A route handler for listing the user's recurring expenses.
pub async fn get_recurring_expenses_endpoint(
    State(state): State<RecordState>,
) -> Result<Json<Vec<RecurringExpense>>, Error> {
    let connection = state.connection()?;

    get_recurring_expenses(&state.user_id, &connection)
        .inspect_err(|error| tracing::error!("could not get recurring expenses: {error}"))
        .map(Json)
}

/// A route handler for creating a recurring expense.
pub async fn create_recurring_expense_endpoint(
    State(state): State<RecordState>,
    ApiJson(form): ApiJson<RecurringExpenseForm>,
) -> Result<(StatusCode, Json<RecurringExpense>), Error> {
    let new_expense = form.validate(None)?;
    let connection = state.connection()?;

    let expense = create_recurring_expense(new_expense, &state.user_id, &connection)
        .inspect_err(|error| tracing::error!("could not create recurring expense: {error}"))?;

    Ok((StatusCode::CREATED, Json(expense)))
}

/// A route handler for editing a recurring expense.
pub async fn update_recurring_expense_endpoint(
    State(state): State<RecordState>,
    ApiPath(expense_id): ApiPath<DatabaseId>,
    ApiJson(form): ApiJson<RecurringExpenseForm>,
) -> Result<Json<RecurringExpense>, Error> {
    let connection = state.connection()?;

    let existing = get_recurring_expense(expense_id, &state.user_id, &connection)?;
    let new_expense = form.validate(Some(&existing))?;

    update_recurring_expense(expense_id, &state.user_id, new_expense, &connection)
        .inspect_err(|error| {
            tracing::error!("could not update recurring expense {expense_id}: {error}")
        })
        .map(Json)
}

/// A route handler for deleting a recurring expense.
pub async fn delete_recurring_expense_endpoint(
    State(state): State<RecordState>,
    ApiPath(expense_id): ApiPath<DatabaseId>,
) -> Result<Json<MessageBody>, Error> {
    let connection = state.connection()?;

    match delete_recurring_expense(expense_id, &state.user_id, &connection)? {
        true => Ok(Json(MessageBody::new("Recurring expense deleted successfully"))),
        false => Err(Error::NotFound),
    }
}

/// The month to generate recurring transactions for, the current one by default.
#[derive(Debug, Default, Deserialize)]
pub struct GenerateRequest {
    /// The month number, 1-12.
    pub month: Option<i64>,
    /// The calendar year.
    pub year: Option<i64>,
}

/// A route handler for creating a month's transactions from the recurring
/// expenses. Responds with only the transactions created by this request.
pub async fn generate_recurring_transactions_endpoint(
    State(state): State<TransactionState>,
    ApiJson(request): ApiJson<GenerateRequest>,
) -> Result<(StatusCode, Json<Vec<Transaction>>), Error> {
    let timezone = state.local_timezone;
    let period = MonthPeriod::from_parts(request.month, request.year, timezone)?;
    let connection = lock_connection(&state.db_connection)?;
    let writer = TransactionWriter::new(
        &connection,
        &state.user_id,
        state.pot_matching,
        timezone,
    );

    let created = generate_recurring_transactions(period, &writer)?;
    tracing::info!(
        "generated {} recurring transactions for {:?} {}",
        created.len(),
        period.month,
        period.year
    );

    Ok((StatusCode::CREATED, Json(created)))
}
