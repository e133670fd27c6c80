//! Route handlers for transactions.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
};
use rusqlite::Connection;

use crate::{
    AppState, Error, MessageBody, PotMatching,
    app_state::lock_connection,
    database_id::DatabaseId,
    extract::{ApiJson, ApiPath},
    timezone::LocalTimezone,
    transaction::{Transaction, TransactionForm, TransactionWriter, get_transaction, get_transactions},
};

/// The state needed to read and write transactions.
#[derive(Debug, Clone)]
pub struct TransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The owner of the transactions.
    pub user_id: String,
    /// The timezone that plain dates are read in.
    pub local_timezone: LocalTimezone,
    /// How savings expenses are linked to savings pots.
    pub pot_matching: PotMatching,
}

impl FromRef<AppState> for TransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            user_id: state.user_id.clone(),
            local_timezone: state.local_timezone,
            pot_matching: state.pot_matching,
        }
    }
}

/// A route handler for listing the user's transactions, oldest first.
pub async fn get_transactions_endpoint(
    State(state): State<TransactionState>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_transactions(&state.user_id, &connection)
        .inspect_err(|error| tracing::error!("could not get transactions: {error}"))
        .map(Json)
}

/// A route handler for getting a single transaction.
pub async fn get_transaction_endpoint(
    State(state): State<TransactionState>,
    ApiPath(transaction_id): ApiPath<DatabaseId>,
) -> Result<Json<Transaction>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_transaction(transaction_id, &state.user_id, &connection).map(Json)
}

/// A route handler for creating a transaction.
pub async fn create_transaction_endpoint(
    State(state): State<TransactionState>,
    ApiJson(form): ApiJson<TransactionForm>,
) -> Result<(StatusCode, Json<Transaction>), Error> {
    let timezone = state.local_timezone;
    let connection = lock_connection(&state.db_connection)?;
    let writer =
        TransactionWriter::new(&connection, &state.user_id, state.pot_matching, timezone);

    let transaction = writer.create(form)?;

    Ok((StatusCode::CREATED, Json(transaction)))
}

/// A route handler for editing a transaction.
pub async fn update_transaction_endpoint(
    State(state): State<TransactionState>,
    ApiPath(transaction_id): ApiPath<DatabaseId>,
    ApiJson(form): ApiJson<TransactionForm>,
) -> Result<Json<Transaction>, Error> {
    let timezone = state.local_timezone;
    let connection = lock_connection(&state.db_connection)?;
    let writer =
        TransactionWriter::new(&connection, &state.user_id, state.pot_matching, timezone);

    writer.update(transaction_id, form).map(Json)
}

/// A route handler for deleting a transaction.
pub async fn delete_transaction_endpoint(
    State(state): State<TransactionState>,
    ApiPath(transaction_id): ApiPath<DatabaseId>,
) -> Result<Json<MessageBody>, Error> {
    let timezone = state.local_timezone;
    let connection = lock_connection(&state.db_connection)?;
    let writer =
        TransactionWriter::new(&connection, &state.user_id, state.pot_matching, timezone);

    match writer.delete(transaction_id)? {
        true => Ok(Json(MessageBody::new("Transaction deleted successfully"))),
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
    async fn create_returns_201_and_the_exact_amount() {
        let server = must_create_test_server();

        let response = server
            .post(endpoints::TRANSACTIONS)
            .json(&json!({
                "type": "expense",
                "amount": "1200.00",
                "category": "food",
                "description": "Groceries",
                "date": "2025-03-15",
                "expenseGroup": "fundamentals",
                "isSharedExpense": false,
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        assert_eq!(body["amount"], "1200.00");
        assert_eq!(body["type"], "expense");
        assert_eq!(body["expenseGroup"], "fundamentals");
        assert_eq!(body["isSharedExpense"], false);
        assert_eq!(body["date"], "2025-03-15T00:00:00Z");
        assert_eq!(body["recurringExpenseId"], Value::Null);
    }

    #[tokio::test]
    async fn invalid_transaction_lists_every_field() {
        let server = must_create_test_server();

        let response = server
            .post(endpoints::TRANSACTIONS)
            .json(&json!({ "type": "expense", "amount": "0", "category": "salary" }))
            .expect_failure()
            .await;

        response.assert_status_bad_request();
        let body: Value = response.json();
        let fields: Vec<_> = body["errors"]
            .as_array()
            .unwrap()
            .iter()
            .map(|error| error["field"].as_str().unwrap().to_owned())
            .collect();
        assert_eq!(fields, ["amount", "description", "date", "category"]);
    }

    #[tokio::test]
    async fn amounts_past_the_limit_are_rejected_and_reads_still_work() {
        let server = must_create_test_server();
        let body = |amount: &str| {
            json!({
                "type": "income",
                "amount": amount,
                "category": "salary",
                "description": "Windfall",
                "date": "2025-03-15",
            })
        };

        server
            .post(endpoints::TRANSACTIONS)
            .json(&body("999999999999999.99"))
            .await
            .assert_status(StatusCode::CREATED);
        let response = server
            .post(endpoints::TRANSACTIONS)
            .json(&body("1000000000000000000000000000"))
            .expect_failure()
            .await;

        response.assert_status_bad_request();
        let errors: Value = response.json();
        assert_eq!(errors["errors"][0]["field"], "amount");
        let response = server.get(endpoints::TRANSACTIONS).await;
        response.assert_status_ok();
        let transactions: Value = response.json();
        assert_eq!(transactions.as_array().unwrap().len(), 1);
        assert_eq!(transactions[0]["amount"], "999999999999999.99");
    }

    #[tokio::test]
    async fn update_delete_and_not_found() {
        let server = must_create_test_server();
        let created: Value = server
            .post(endpoints::TRANSACTIONS)
            .json(&json!({
                "type": "income",
                "amount": "3000",
                "category": "salary",
                "description": "Pay",
                "date": "2025-03-01",
            }))
            .await
            .json();
        let url = format_endpoint(endpoints::TRANSACTION, created["id"].as_str().unwrap());

        let updated: Value = server
            .put(&url)
            .json(&json!({ "description": "March pay" }))
            .await
            .json();
        assert_eq!(updated["description"], "March pay");
        assert_eq!(updated["amount"], "3000.00");

        let deleted: Value = server.delete(&url).await.json();
        assert_eq!(deleted["message"], "Transaction deleted successfully");

        server.get(&url).expect_failure().await.assert_status_not_found();
        server.delete(&url).expect_failure().await.assert_status_not_found();
    }

    #[tokio::test]
    async fn malformed_id_is_a_validation_error() {
        let server = must_create_test_server();

        let response = server
            .get(&format_endpoint(endpoints::TRANSACTION, "42"))
            .expect_failure()
            .await;

        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["errors"][0]["field"], "id");
    }

    #[tokio::test]
    async fn savings_expense_tops_up_pot() {
        let server = must_create_test_server();
        let pot: Value = server
            .post(endpoints::SAVINGS_POTS)
            .json(&json!({ "name": "Vacation", "targetAmount": "2000", "currentAmount": "100.00" }))
            .await
            .json();
        let pot_url = format_endpoint(endpoints::SAVINGS_POT, pot["id"].as_str().unwrap());

        let transaction: Value = server
            .post(endpoints::TRANSACTIONS)
            .json(&json!({
                "type": "expense",
                "amount": "50.00",
                "category": "savings",
                "description": "Vacation fund top-up",
                "date": "2025-03-15",
            }))
            .await
            .json();
        let pot_after_create: Value = server.get(&pot_url).await.json();
        assert_eq!(pot_after_create["currentAmount"], "150.00");

        server
            .delete(&format_endpoint(
                endpoints::TRANSACTION,
                transaction["id"].as_str().unwrap(),
            ))
            .await
            .assert_status_ok();
        let pot_after_delete: Value = server.get(&pot_url).await.json();
        assert_eq!(pot_after_delete["currentAmount"], "100.00");
    }
}
