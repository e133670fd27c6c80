//! Field-level validation of request bodies.
//!
//! Request bodies are deserialized into "form" structs whose fields are all
//! optional raw values. Validating a form parses every field, collecting an
//! error for each one that is missing or malformed so the client receives the
//! complete list in one response.
//!
//! The same forms are used for partial updates: a field missing from the
//! request falls back to the value stored on the existing record.

use serde::{Deserialize, Deserializer, Serialize};
use time::{
    Date, OffsetDateTime, UtcOffset, format_description::well_known::Rfc3339, macros::format_description,
};

use crate::{Error, database_id::DatabaseId, money::Amount, timezone::LocalTimezone};

/// A problem with one field of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// The name of the offending field as the client sent it, e.g. "amount".
    pub field: String,
    /// What is wrong with the field.
    pub message: String,
}

impl FieldError {
    /// Create an error for `field`.
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_owned(),
            message: message.into(),
        }
    }
}

/// Collects [FieldError]s while a form is validated.
#[derive(Debug, Default)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    /// Record a problem with `field`.
    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0.push(FieldError::new(field, message));
    }

    /// Validate a field that must end up with a value.
    ///
    /// The value is parsed from `raw` when the client sent one, otherwise
    /// `fallback` (the stored value during an update) is used. Returns `None`
    /// and records an error if parsing fails or there is no value at all.
    pub fn required<R, T>(
        &mut self,
        field: &str,
        raw: Option<R>,
        fallback: Option<T>,
        parse: impl FnOnce(R) -> Result<T, String>,
    ) -> Option<T> {
        match raw {
            Some(raw) => self.record(field, parse(raw)),
            None => {
                if fallback.is_none() {
                    self.push(field, "is required");
                }

                fallback
            }
        }
    }

    /// Validate a nullable field.
    ///
    /// `raw` is `None` when the field was absent, `Some(None)` when the client
    /// explicitly sent `null`, and `Some(Some(_))` for a value.
    pub fn optional<R, T>(
        &mut self,
        field: &str,
        raw: Option<Option<R>>,
        fallback: Option<T>,
        parse: impl FnOnce(R) -> Result<T, String>,
    ) -> Option<T> {
        match raw {
            Some(Some(raw)) => self.record(field, parse(raw)),
            Some(None) => None,
            None => fallback,
        }
    }

    fn record<T>(&mut self, field: &str, result: Result<T, String>) -> Option<T> {
        result
            .inspect_err(|message| self.push(field, message.as_str()))
            .ok()
    }

    /// Whether no errors have been recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Convert the collected errors into an [Error::Validation].
    pub fn into_error(self) -> Error {
        Error::Validation(self.0)
    }

    /// `Ok` if no errors were recorded, otherwise an [Error::Validation].
    pub fn into_result(self) -> Result<(), Error> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self.into_error())
        }
    }
}

/// Deserialize a field so that an explicit `null` can be told apart from a
/// missing field.
///
/// Use with `#[serde(default, deserialize_with = "nullable")]` on an
/// `Option<Option<T>>` field.
pub fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Parse a text field that must contain something other than whitespace.
pub fn parse_non_empty(raw: String) -> Result<String, String> {
    let trimmed = raw.trim();

    if trimmed.is_empty() {
        Err("must not be empty".to_owned())
    } else {
        Ok(trimmed.to_owned())
    }
}

/// Parse a money amount that must be greater than zero.
pub fn parse_positive_amount(raw: String) -> Result<Amount, String> {
    let amount: Amount = raw.parse().map_err(|error| format!("{error}"))?;

    if amount.is_positive() {
        Ok(amount)
    } else {
        Err("must be greater than zero".to_owned())
    }
}

/// Parse a money amount that may be zero but not negative.
pub fn parse_non_negative_amount(raw: String) -> Result<Amount, String> {
    let amount: Amount = raw.parse().map_err(|error| format!("{error}"))?;

    if amount < Amount::ZERO {
        Err("must not be negative".to_owned())
    } else {
        Ok(amount)
    }
}

/// Parse an ISO date (`2025-01-31`) or an RFC 3339 date-time.
///
/// A plain date means local midnight in `timezone`, so that it stays on the
/// same calendar day for the user. The result is converted to UTC.
pub fn parse_instant(raw: &str, timezone: LocalTimezone) -> Result<OffsetDateTime, String> {
    let raw = raw.trim();

    if let Ok(instant) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Ok(instant.to_offset(UtcOffset::UTC));
    }

    Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .map(|date| timezone.midnight_on(date))
        .map_err(|_| format!("\"{raw}\" is not a valid ISO date"))
}

/// Parse the ID of another record.
pub fn parse_database_id(raw: String) -> Result<DatabaseId, String> {
    raw.trim()
        .parse()
        .map_err(|_| format!("\"{raw}\" is not a valid ID"))
}
