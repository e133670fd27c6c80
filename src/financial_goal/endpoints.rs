use axum::{Json, extract::State, http::StatusCode};

use crate::{
    Error, MessageBody,
    app_state::RecordState,
    database_id::DatabaseId,
    extract::{ApiJson, ApiPath},
    financial_goal::{
        FinancialGoal, FinancialGoalForm, create_financial_goal, delete_financial_goal,
        get_financial_goal, get_financial_goals, update_financial_goal,
    },
};

/// A route handler for listing the user's financial goals.
pub async fn get_financial_goals_endpoint(
    State(state): State<RecordState>,
) -> Result<Json<Vec<FinancialGoal>>, Error> {
    let connection = state.connection()?;

    get_financial_goals(&state.user_id, &connection)
        .inspect_err(|error| tracing::error!("could not get financial goals: {error}"))
        .map(Json)
}

/// A route handler for creating a financial goal.
pub async fn create_financial_goal_endpoint(
    State(state): State<RecordState>,
    ApiJson(form): ApiJson<FinancialGoalForm>,
) -> Result<(StatusCode, Json<FinancialGoal>), Error> {
    let new_goal = form.validate(None, state.local_timezone)?;
    let connection = state.connection()?;

    let goal = create_financial_goal(new_goal, &state.user_id, &connection)
        .inspect_err(|error| tracing::error!("could not create financial goal: {error}"))?;

    Ok((StatusCode::CREATED, Json(goal)))
}

/// A route handler for editing a financial goal.
pub async fn update_financial_goal_endpoint(
    State(state): State<RecordState>,
    ApiPath(goal_id): ApiPath<DatabaseId>,
    ApiJson(form): ApiJson<FinancialGoalForm>,
) -> Result<Json<FinancialGoal>, Error> {
    let timezone = state.local_timezone;
    let connection = state.connection()?;

    let existing = get_financial_goal(goal_id, &state.user_id, &connection)?;
    let new_goal = form.validate(Some(&existing), timezone)?;

    update_financial_goal(goal_id, &state.user_id, new_goal, &connection)
        .inspect_err(|error| tracing::error!("could not update financial goal {goal_id}: {error}"))
        .map(Json)
}

/// A route handler for deleting a financial goal.
pub async fn delete_financial_goal_endpoint(
    State(state): State<RecordState>,
    ApiPath(goal_id): ApiPath<DatabaseId>,
) -> Result<Json<MessageBody>, Error> {
    let connection = state.connection()?;

    match delete_financial_goal(goal_id, &state.user_id, &connection)? {
        true => Ok(Json(MessageBody::new("Financial goal deleted successfully"))),
        false => Err(Error::NotFound),
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::{
        endpoints::{self, format_endpoint},
        test_utils::must_create_test_server,
    };

    #[tokio::test]
    async fn create_list_delete() {
        let server = must_create_test_server();

        let response = server
            .post(endpoints::FINANCIAL_GOALS)
            .json(&json!({
                "name": "Emergency fund",
                "targetAmount": "10000",
                "category": "safety",
                "priority": "high",
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let created: Value = response.json();
        assert_eq!(created["currentAmount"], "0.00");
        assert_eq!(created["targetDate"], Value::Null);

        let listed: Value = server.get(endpoints::FINANCIAL_GOALS).await.json();
        assert_eq!(listed[0]["priority"], "high");

        let response = server
            .delete(&format_endpoint(
                endpoints::FINANCIAL_GOAL,
                created["id"].as_str().unwrap(),
            ))
            .await;
        response.assert_status_ok();
        response.assert_json(&json!({ "message": "Financial goal deleted successfully" }));
    }

    #[tokio::test]
    async fn malformed_id_is_a_validation_error() {
        let server = must_create_test_server();

        let response = server
            .put(&format_endpoint(endpoints::FINANCIAL_GOAL, "not-a-uuid"))
            .json(&json!({ "name": "x" }))
            .expect_failure()
            .await;

        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["errors"][0]["field"], "id");
    }
}
