//! Route handlers for savings pots.

use axum::{Json, extract::State, http::StatusCode};

use crate::{
    Error, MessageBody,
    app_state::RecordState,
    database_id::DatabaseId,
    extract::{ApiJson, ApiPath},
    savings_pot::{
        SavingsPotForm, SavingsPotView, create_savings_pot, delete_savings_pot, get_savings_pot,
        get_savings_pots, update_savings_pot,
    },
};

/// A route handler for listing the user's savings pots.
pub async fn get_savings_pots_endpoint(
    State(state): State<RecordState>,
) -> Result<Json<Vec<SavingsPotView>>, Error> {
    let connection = state.connection()?;

    let pots = get_savings_pots(&state.user_id, &connection)
        .inspect_err(|error| tracing::error!("could not get savings pots: {error}"))?;

    Ok(Json(pots.into_iter().map(SavingsPotView::from).collect()))
}

/// A route handler for getting a single savings pot.
pub async fn get_savings_pot_endpoint(
    State(state): State<RecordState>,
    ApiPath(pot_id): ApiPath<DatabaseId>,
) -> Result<Json<SavingsPotView>, Error> {
    let connection = state.connection()?;

    get_savings_pot(pot_id, &state.user_id, &connection).map(|pot| Json(pot.into()))
}

/// A route handler for creating a savings pot.
pub async fn create_savings_pot_endpoint(
    State(state): State<RecordState>,
    ApiJson(form): ApiJson<SavingsPotForm>,
) -> Result<(StatusCode, Json<SavingsPotView>), Error> {
    let new_pot = form.validate(None, state.local_timezone)?;
    let connection = state.connection()?;

    let pot = create_savings_pot(new_pot, &state.user_id, &connection)
        .inspect_err(|error| tracing::error!("could not create savings pot: {error}"))?;

    Ok((StatusCode::CREATED, Json(pot.into())))
}

/// A route handler for editing a savings pot.
pub async fn update_savings_pot_endpoint(
    State(state): State<RecordState>,
    ApiPath(pot_id): ApiPath<DatabaseId>,
    ApiJson(form): ApiJson<SavingsPotForm>,
) -> Result<Json<SavingsPotView>, Error> {
    let timezone = state.local_timezone;
    let connection = state.connection()?;

    let existing = get_savings_pot(pot_id, &state.user_id, &connection)?;
    let new_pot = form.validate(Some(&existing), timezone)?;

    update_savings_pot(pot_id, &state.user_id, new_pot, &connection)
        .inspect_err(|error| tracing::error!("could not update savings pot {pot_id}: {error}"))
        .map(|pot| Json(pot.into()))
}

/// A route handler for deleting a savings pot.
pub async fn delete_savings_pot_endpoint(
    State(state): State<RecordState>,
    ApiPath(pot_id): ApiPath<DatabaseId>,
) -> Result<Json<MessageBody>, Error> {
    let connection = state.connection()?;

    match delete_savings_pot(pot_id, &state.user_id, &connection)? {
        true => Ok(Json(MessageBody::new("Savings pot deleted successfully"))),
        false => Err(Error::NotFound),
    }
}
