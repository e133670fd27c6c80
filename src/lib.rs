//! A personal finance tracker.
//!
//! Records income, expense and transfer transactions, tracks savings pots,
//! debts, investments, budgets, financial goals and recurring monthly expenses,
//! and serves monthly summaries and forecasts through a JSON REST API.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde::Serialize;
use tokio::signal;

mod app_state;
mod budget;
mod category;
mod dashboard;
mod database_id;
mod db;
mod debt;
mod endpoints;
mod extract;
mod financial_goal;
mod investment;
mod logging;
mod money;
mod period;
mod recurring_expense;
mod routing;
mod savings_pot;
mod timezone;
mod transaction;
mod user;
mod validation;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;
pub use savings_pot::PotMatching;
pub use user::DEFAULT_USER_ID;
pub use validation::FieldError;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {error}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to install signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The client sent a request with missing or malformed fields.
    ///
    /// Every offending field is listed so the client can fix them all at once.
    #[error("the request has {} invalid field(s)", .0.len())]
    Validation(Vec<FieldError>),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

/// The JSON body sent to the client when a request fails.
#[derive(Debug, Serialize)]
struct ErrorBody {
    message: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<FieldError>,
}

impl ErrorBody {
    fn new(message: &'static str) -> Self {
        Self {
            message,
            errors: Vec::new(),
        }
    }
}

/// The JSON body sent to the client when a request succeeds without a record
/// to return, e.g. after a delete.
#[derive(Debug, Serialize)]
pub struct MessageBody {
    message: &'static str,
}

impl MessageBody {
    /// Create a body with `message`.
    pub fn new(message: &'static str) -> Self {
        Self { message }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Error::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    message: "Invalid request data",
                    errors,
                },
            ),
            Error::NotFound => (
                StatusCode::NOT_FOUND,
                ErrorBody::new("The requested resource could not be found"),
            ),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::new("An unexpected error occurred, check the server logs for more details"),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
