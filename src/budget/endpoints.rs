use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;

use crate::{
    Error, MessageBody,
    app_state::RecordState,
    budget::{Budget, BudgetForm, create_budget, delete_budget, get_budget, get_budgets, update_budget},
    database_id::DatabaseId,
    extract::{ApiJson, ApiPath, ApiQuery},
    validation::FieldErrors,
};

/// The optional month filter for listing budgets.
#[derive(Debug, Default, Deserialize)]
pub struct BudgetQuery {
    /// The month number, 1-12.
    pub month: Option<i64>,
    /// The calendar year.
    pub year: Option<i64>,
}

/// A route handler for listing the user's budgets, optionally for one month.
pub async fn get_budgets_endpoint(
    State(state): State<RecordState>,
    ApiQuery(query): ApiQuery<BudgetQuery>,
) -> Result<Json<Vec<Budget>>, Error> {
    let mut errors = FieldErrors::default();
    let month = query.month.and_then(|number| {
        let month = u8::try_from(number)
            .ok()
            .filter(|month| (1..=12).contains(month));
        if month.is_none() {
            errors.push("month", "must be between 1 and 12");
        }
        month
    });
    let year = query.year.and_then(|number| {
        let year = i32::try_from(number).ok();
        if year.is_none() {
            errors.push("year", "is out of range");
        }
        year
    });
    errors.into_result()?;

    let connection = state.connection()?;

    get_budgets(&state.user_id, month, year, &connection)
        .inspect_err(|error| tracing::error!("could not get budgets: {error}"))
        .map(Json)
}

/// A route handler for creating a budget.
pub async fn create_budget_endpoint(
    State(state): State<RecordState>,
    ApiJson(form): ApiJson<BudgetForm>,
) -> Result<(StatusCode, Json<Budget>), Error> {
    let new_budget = form.validate(None)?;
    let connection = state.connection()?;

    let budget = create_budget(new_budget, &state.user_id, &connection)
        .inspect_err(|error| tracing::error!("could not create budget: {error}"))?;

    Ok((StatusCode::CREATED, Json(budget)))
}

/// A route handler for editing a budget.
pub async fn update_budget_endpoint(
    State(state): State<RecordState>,
    ApiPath(budget_id): ApiPath<DatabaseId>,
    ApiJson(form): ApiJson<BudgetForm>,
) -> Result<Json<Budget>, Error> {
    let connection = state.connection()?;

    let existing = get_budget(budget_id, &state.user_id, &connection)?;
    let new_budget = form.validate(Some(&existing))?;

    update_budget(budget_id, &state.user_id, new_budget, &connection)
        .inspect_err(|error| tracing::error!("could not update budget {budget_id}: {error}"))
        .map(Json)
}

/// A route handler for deleting a budget.
pub async fn delete_budget_endpoint(
    State(state): State<RecordState>,
    ApiPath(budget_id): ApiPath<DatabaseId>,
) -> Result<Json<MessageBody>, Error> {
    let connection = state.connection()?;

    match delete_budget(budget_id, &state.user_id, &connection)? {
        true => Ok(Json(MessageBody::new("Budget deleted successfully"))),
        false => Err(Error::NotFound),
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::{endpoints, test_utils::must_create_test_server};

    #[tokio::test]
    async fn filters_budgets_by_query_month() {
        let server = must_create_test_server();
        for month in [1, 2] {
            server
                .post(endpoints::BUDGETS)
                .json(&json!({
                    "category": "food",
                    "budgetAmount": "300",
                    "month": month,
                    "year": 2025,
                }))
                .await
                .assert_status(StatusCode::CREATED);
        }

        let february: Value = server
            .get(endpoints::BUDGETS)
            .add_query_param("month", 2)
            .add_query_param("year", 2025)
            .await
            .json();

        let february = february.as_array().unwrap();
        assert_eq!(february.len(), 1);
        assert_eq!(february[0]["month"], 2);
        assert_eq!(february[0]["spentAmount"], "0.00");
    }

    #[tokio::test]
    async fn rejects_invalid_query_month() {
        let server = must_create_test_server();

        let response = server
            .get(endpoints::BUDGETS)
            .add_query_param("month", 0)
            .expect_failure()
            .await;

        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["errors"][0]["field"], "month");
    }
}
