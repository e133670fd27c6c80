use axum::{Json, extract::State, http::StatusCode};

use crate::{
    Error, MessageBody,
    app_state::RecordState,
    database_id::DatabaseId,
    debt::{Debt, DebtForm, create_debt, delete_debt, get_debt, get_debts, update_debt},
    extract::{ApiJson, ApiPath},
    transaction::{Transaction, get_expenses_in_category},
};

/// A route handler for listing the user's debts.
pub async fn get_debts_endpoint(State(state): State<RecordState>) -> Result<Json<Vec<Debt>>, Error> {
    let connection = state.connection()?;

    get_debts(&state.user_id, &connection)
        .inspect_err(|error| tracing::error!("could not get debts: {error}"))
        .map(Json)
}

/// A route handler for getting a single debt.
pub async fn get_debt_endpoint(
    State(state): State<RecordState>,
    ApiPath(debt_id): ApiPath<DatabaseId>,
) -> Result<Json<Debt>, Error> {
    let connection = state.connection()?;

    get_debt(debt_id, &state.user_id, &connection).map(Json)
}

/// A route handler for listing the expenses that look like payments towards a
/// debt, i.e. the user's expenses in the debt's category, newest first.
pub async fn get_debt_transactions_endpoint(
    State(state): State<RecordState>,
    ApiPath(debt_id): ApiPath<DatabaseId>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let connection = state.connection()?;

    let debt = get_debt(debt_id, &state.user_id, &connection)?;

    get_expenses_in_category(debt.category, &state.user_id, &connection)
        .inspect_err(|error| {
            tracing::error!("could not get transactions for debt {debt_id}: {error}")
        })
        .map(Json)
}

/// A route handler for recording a debt.
pub async fn create_debt_endpoint(
    State(state): State<RecordState>,
    ApiJson(form): ApiJson<DebtForm>,
) -> Result<(StatusCode, Json<Debt>), Error> {
    let new_debt = form.validate(None, state.local_timezone)?;
    let connection = state.connection()?;

    let debt = create_debt(new_debt, &state.user_id, &connection)
        .inspect_err(|error| tracing::error!("could not create debt: {error}"))?;

    Ok((StatusCode::CREATED, Json(debt)))
}

/// A route handler for editing a debt.
pub async fn update_debt_endpoint(
    State(state): State<RecordState>,
    ApiPath(debt_id): ApiPath<DatabaseId>,
    ApiJson(form): ApiJson<DebtForm>,
) -> Result<Json<Debt>, Error> {
    let timezone = state.local_timezone;
    let connection = state.connection()?;

    let existing = get_debt(debt_id, &state.user_id, &connection)?;
    let new_debt = form.validate(Some(&existing), timezone)?;

    update_debt(debt_id, &state.user_id, new_debt, &connection)
        .inspect_err(|error| tracing::error!("could not update debt {debt_id}: {error}"))
        .map(Json)
}

/// A route handler for deleting a debt.
pub async fn delete_debt_endpoint(
    State(state): State<RecordState>,
    ApiPath(debt_id): ApiPath<DatabaseId>,
) -> Result<Json<MessageBody>, Error> {
    let connection = state.connection()?;

    match delete_debt(debt_id, &state.user_id, &connection)? {
        true => Ok(Json(MessageBody::new("Debt deleted successfully"))),
        false => Err(Error::NotFound),
    }
}
