//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex, MutexGuard};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::{
    Error, PotMatching,
    db::initialize,
    timezone::{LocalTimezone, resolve_timezone},
    user::DEFAULT_USER_ID,
};

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The timezone that dates and months are read in.
    pub local_timezone: LocalTimezone,

    /// How savings expenses are linked to savings pots.
    pub pot_matching: PotMatching,

    /// The user that every request acts on behalf of.
    pub user_id: String,

    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    /// `local_timezone` should be a valid, canonical timezone name, e.g. "Pacific/Auckland".
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized or the timezone is not valid.
    pub fn new(
        db_connection: Connection,
        local_timezone: &str,
        pot_matching: PotMatching,
    ) -> Result<Self, Error> {
        let local_timezone = resolve_timezone(local_timezone)?;
        initialize(&db_connection)?;

        Ok(Self {
            local_timezone,
            pot_matching,
            user_id: DEFAULT_USER_ID.to_owned(),
            db_connection: Arc::new(Mutex::new(db_connection)),
        })
    }
}

/// The state needed by handlers that read and write plain records.
#[derive(Debug, Clone)]
pub struct RecordState {
    /// The database connection for managing records.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The owner of the records.
    pub user_id: String,
    /// The timezone that dates and months are read in.
    pub local_timezone: LocalTimezone,
}

impl RecordState {
    /// Lock the database connection.
    pub fn connection(&self) -> Result<MutexGuard<'_, Connection>, Error> {
        lock_connection(&self.db_connection)
    }
}

impl FromRef<AppState> for RecordState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            user_id: state.user_id.clone(),
            local_timezone: state.local_timezone,
        }
    }
}

/// Acquire the lock on a shared database connection.
///
/// # Errors
/// Returns [Error::DatabaseLockError] if the lock is poisoned.
pub fn lock_connection(
    db_connection: &Arc<Mutex<Connection>>,
) -> Result<MutexGuard<'_, Connection>, Error> {
    db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)
}
