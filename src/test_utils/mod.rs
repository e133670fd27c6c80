#![allow(missing_docs)]

use axum_test::TestServer;
use rusqlite::Connection;

use crate::{AppState, PotMatching, build_router, db::initialize, money::Amount};

#[track_caller]
pub(crate) fn must_create_test_connection() -> Connection {
    let connection =
        Connection::open_in_memory().expect("Could not open database in memory.");
    initialize(&connection).expect("Could not initialize database.");

    connection
}

#[track_caller]
pub(crate) fn amount(text: &str) -> Amount {
    text.parse()
        .unwrap_or_else(|error| panic!("invalid test amount {text:?}: {error}"))
}

#[track_caller]
pub(crate) fn must_create_test_state() -> AppState {
    let connection =
        Connection::open_in_memory().expect("Could not open database in memory.");

    AppState::new(connection, "UTC", PotMatching::NameFallback)
        .expect("Could not create app state.")
}

#[track_caller]
pub(crate) fn must_create_test_server() -> TestServer {
    let app = build_router(must_create_test_state());

    TestServer::try_new(app).expect("Could not create test server.")
}
