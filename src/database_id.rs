//! Database ID type definitions.

use uuid::Uuid;

/// Alias for the type used for the primary key of every record.
///
/// IDs are random (v4) UUIDs generated by the server when a record is created.
pub type DatabaseId = Uuid;

/// Generate the ID for a new record.
pub fn new_database_id() -> DatabaseId {
    Uuid::new_v4()
}
