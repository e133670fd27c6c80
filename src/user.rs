//! The user that owns every record.
//!
//! There is no log in. A single user is seeded when the database is
//! initialized and every request acts on their behalf.

use axum::{Json, extract::State};
use rusqlite::{Connection, Row};
use serde::Serialize;

use crate::{Error, app_state::RecordState};

/// The ID of the user seeded at start up.
pub const DEFAULT_USER_ID: &str = "default-user";

/// A person who owns records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// The user's ID.
    pub id: String,
    /// The name the user logs in with.
    pub username: String,
    /// The name shown on screen.
    pub name: String,
    /// A URL for the user's picture.
    pub avatar: Option<String>,
}

/// Create the user table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id TEXT PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                avatar TEXT
                )",
        (),
    )?;

    Ok(())
}

/// Insert the default user if it does not exist yet.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn seed_default_user(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "INSERT OR IGNORE INTO user (id, username, name, avatar) VALUES (?1, ?2, ?3, NULL)",
        (DEFAULT_USER_ID, "default", "Default User"),
    )?;

    Ok(())
}

/// Retrieve a user by their `id`.
///
/// # Errors
/// Returns [Error::NotFound] if there is no such user, or [Error::SqlError]
/// if there is some other SQL error.
pub fn get_user(id: &str, connection: &Connection) -> Result<User, Error> {
    let user = connection
        .prepare("SELECT id, username, name, avatar FROM user WHERE id = :id")?
        .query_one(&[(":id", &id)], map_user_row)?;

    Ok(user)
}

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        name: row.get(2)?,
        avatar: row.get(3)?,
    })
}

/// A route handler for getting the current user.
pub async fn get_current_user_endpoint(State(state): State<RecordState>) -> Result<Json<User>, Error> {
    let connection = state.connection()?;

    get_user(&state.user_id, &connection)
        .inspect_err(|error| tracing::error!("could not get user {}: {error}", state.user_id))
        .map(Json)
}
