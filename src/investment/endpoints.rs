use axum::{Json, extract::State, http::StatusCode};

use crate::{
    Error, MessageBody,
    app_state::RecordState,
    database_id::DatabaseId,
    extract::{ApiJson, ApiPath},
    investment::{
        Investment, InvestmentForm, create_investment, delete_investment, get_investment,
        get_investments, update_investment,
    },
};

/// A route handler for listing the user's investments.
pub async fn get_investments_endpoint(
    State(state): State<RecordState>,
) -> Result<Json<Vec<Investment>>, Error> {
    let connection = state.connection()?;

    get_investments(&state.user_id, &connection)
        .inspect_err(|error| tracing::error!("could not get investments: {error}"))
        .map(Json)
}

/// A route handler for recording an investment.
pub async fn create_investment_endpoint(
    State(state): State<RecordState>,
    ApiJson(form): ApiJson<InvestmentForm>,
) -> Result<(StatusCode, Json<Investment>), Error> {
    let new_investment = form.validate(None)?;
    let connection = state.connection()?;

    let investment = create_investment(new_investment, &state.user_id, &connection)
        .inspect_err(|error| tracing::error!("could not create investment: {error}"))?;

    Ok((StatusCode::CREATED, Json(investment)))
}

/// A route handler for editing an investment.
pub async fn update_investment_endpoint(
    State(state): State<RecordState>,
    ApiPath(investment_id): ApiPath<DatabaseId>,
    ApiJson(form): ApiJson<InvestmentForm>,
) -> Result<Json<Investment>, Error> {
    let connection = state.connection()?;

    let existing = get_investment(investment_id, &state.user_id, &connection)?;
    let new_investment = form.validate(Some(&existing))?;

    update_investment(investment_id, &state.user_id, new_investment, &connection)
        .inspect_err(|error| {
            tracing::error!("could not update investment {investment_id}: {error}")
        })
        .map(Json)
}

/// A route handler for deleting an investment.
pub async fn delete_investment_endpoint(
    State(state): State<RecordState>,
    ApiPath(investment_id): ApiPath<DatabaseId>,
) -> Result<Json<MessageBody>, Error> {
    let connection = state.connection()?;

    match delete_investment(investment_id, &state.user_id, &connection)? {
        true => Ok(Json(MessageBody::new("Investment deleted successfully"))),
        false => Err(Error::NotFound),
    }
}
