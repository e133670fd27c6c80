//! Defines the savings pot model, its form and database queries.

use rust_decimal::{Decimal, RoundingStrategy};
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    database_id::{DatabaseId, new_database_id},
    money::Amount,
    timezone::LocalTimezone,
    validation::{
        FieldErrors, nullable, parse_instant, parse_non_empty, parse_non_negative_amount,
        parse_positive_amount,
    },
};

const DEFAULT_ICON: &str = "piggy-bank";
const DEFAULT_COLOR: &str = "green";

// ============================================================================
// MODELS
// ============================================================================

/// A named savings goal with a running total.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsPot {
    /// The ID of the pot.
    pub id: DatabaseId,
    /// The user that owns the pot.
    pub user_id: String,
    /// What the user is saving for, e.g. "Vacation".
    pub name: String,
    /// How much the user wants to save.
    pub target_amount: Amount,
    /// How much has been saved so far.
    pub current_amount: Amount,
    /// The name of the icon shown next to the pot.
    pub icon: String,
    /// The accent color of the pot.
    pub color: String,
    /// A free-form label for grouping pots.
    pub category: Option<String>,
    /// When the user wants to reach the target.
    #[serde(with = "time::serde::rfc3339::option")]
    pub deadline: Option<OffsetDateTime>,
    /// When the pot was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl SavingsPot {
    /// How far along the pot is, as a percentage of the target rounded to two
    /// decimal places. Goes past 100 once the target is exceeded.
    pub fn progress_percentage(&self) -> Decimal {
        if !self.target_amount.is_positive() {
            return Decimal::ZERO;
        }

        self.current_amount
            .value()
            .checked_div(self.target_amount.value())
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .unwrap_or(Decimal::MAX)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }

    /// How much is left to save. Negative once the target is exceeded.
    pub fn remaining_amount(&self) -> Amount {
        self.target_amount - self.current_amount
    }
}

/// A savings pot with the figures derived from its amounts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsPotView {
    /// The stored pot.
    #[serde(flatten)]
    pub pot: SavingsPot,
    /// See [SavingsPot::progress_percentage].
    #[serde(with = "rust_decimal::serde::float")]
    pub progress_percentage: Decimal,
    /// See [SavingsPot::remaining_amount].
    pub remaining_amount: Amount,
}

impl From<SavingsPot> for SavingsPotView {
    fn from(pot: SavingsPot) -> Self {
        Self {
            progress_percentage: pot.progress_percentage(),
            remaining_amount: pot.remaining_amount(),
            pot,
        }
    }
}

/// A savings pot that has been validated but not saved yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSavingsPot {
    /// What the user is saving for.
    pub name: String,
    /// How much the user wants to save.
    pub target_amount: Amount,
    /// How much has been saved so far.
    pub current_amount: Amount,
    /// The name of the icon shown next to the pot.
    pub icon: String,
    /// The accent color of the pot.
    pub color: String,
    /// A free-form label for grouping pots.
    pub category: Option<String>,
    /// When the user wants to reach the target.
    pub deadline: Option<OffsetDateTime>,
}

impl NewSavingsPot {
    /// A pot with nothing saved yet and the default look.
    pub fn new(name: &str, target_amount: Amount) -> Self {
        Self {
            name: name.to_owned(),
            target_amount,
            current_amount: Amount::ZERO,
            icon: DEFAULT_ICON.to_owned(),
            color: DEFAULT_COLOR.to_owned(),
            category: None,
            deadline: None,
        }
    }

    /// Set the amount saved so far.
    pub fn current_amount(mut self, current_amount: Amount) -> Self {
        self.current_amount = current_amount;
        self
    }
}

/// The JSON body for creating or editing a savings pot.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsPotForm {
    /// What the user is saving for.
    pub name: Option<String>,
    /// A positive decimal string.
    pub target_amount: Option<String>,
    /// A non-negative decimal string, zero if absent on creation.
    pub current_amount: Option<String>,
    /// Defaults to "piggy-bank".
    pub icon: Option<String>,
    /// Defaults to "green".
    pub color: Option<String>,
    /// A free-form label for grouping pots.
    #[serde(default, deserialize_with = "nullable")]
    pub category: Option<Option<String>>,
    /// An ISO date or RFC 3339 date-time.
    #[serde(default, deserialize_with = "nullable")]
    pub deadline: Option<Option<String>>,
}

impl SavingsPotForm {
    /// Validate the form, filling in absent fields from `existing` when editing.
    ///
    /// # Errors
    /// Returns [Error::Validation] listing every missing or malformed field.
    pub fn validate(
        self,
        existing: Option<&SavingsPot>,
        timezone: LocalTimezone,
    ) -> Result<NewSavingsPot, Error> {
        let mut errors = FieldErrors::default();

        let name = errors.required(
            "name",
            self.name,
            existing.map(|pot| pot.name.clone()),
            parse_non_empty,
        );
        let target_amount = errors.required(
            "targetAmount",
            self.target_amount,
            existing.map(|pot| pot.target_amount),
            parse_positive_amount,
        );
        let current_amount = errors.required(
            "currentAmount",
            self.current_amount,
            Some(existing.map_or(Amount::ZERO, |pot| pot.current_amount)),
            parse_non_negative_amount,
        );
        let icon = errors.required(
            "icon",
            self.icon,
            Some(existing.map_or(DEFAULT_ICON.to_owned(), |pot| pot.icon.clone())),
            parse_non_empty,
        );
        let color = errors.required(
            "color",
            self.color,
            Some(existing.map_or(DEFAULT_COLOR.to_owned(), |pot| pot.color.clone())),
            parse_non_empty,
        );
        let category = errors.optional(
            "category",
            self.category,
            existing.and_then(|pot| pot.category.clone()),
            parse_non_empty,
        );
        let deadline = errors.optional(
            "deadline",
            self.deadline,
            existing.and_then(|pot| pot.deadline),
            |raw| parse_instant(&raw, timezone),
        );

        let (Some(name), Some(target_amount), Some(current_amount), Some(icon), Some(color)) =
            (name, target_amount, current_amount, icon, color)
        else {
            return Err(errors.into_error());
        };

        errors.into_result()?;

        Ok(NewSavingsPot {
            name,
            target_amount,
            current_amount,
            icon,
            color,
            category,
            deadline,
        })
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const SAVINGS_POT_COLUMNS: &str =
    "id, user_id, name, target_amount, current_amount, icon, color, category, deadline, created_at";

/// Create a new savings pot in the database.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn create_savings_pot(
    new_pot: NewSavingsPot,
    user_id: &str,
    connection: &Connection,
) -> Result<SavingsPot, Error> {
    let pot = connection
        .prepare(&format!(
            "INSERT INTO savings_pot ({SAVINGS_POT_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             RETURNING {SAVINGS_POT_COLUMNS}"
        ))?
        .query_row(
            rusqlite::params![
                new_database_id(),
                user_id,
                new_pot.name,
                new_pot.target_amount,
                new_pot.current_amount,
                new_pot.icon,
                new_pot.color,
                new_pot.category,
                new_pot.deadline,
                OffsetDateTime::now_utc(),
            ],
            map_savings_pot_row,
        )?;

    Ok(pot)
}

/// Retrieve a savings pot owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a pot of the user,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_savings_pot(
    id: DatabaseId,
    user_id: &str,
    connection: &Connection,
) -> Result<SavingsPot, Error> {
    let pot = connection
        .prepare(&format!(
            "SELECT {SAVINGS_POT_COLUMNS} FROM savings_pot WHERE id = ?1 AND user_id = ?2"
        ))?
        .query_one((id, user_id), map_savings_pot_row)?;

    Ok(pot)
}

/// Retrieve all of a user's savings pots in the order they were created.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn get_savings_pots(user_id: &str, connection: &Connection) -> Result<Vec<SavingsPot>, Error> {
    connection
        .prepare(&format!(
            "SELECT {SAVINGS_POT_COLUMNS} FROM savings_pot
             WHERE user_id = ?1
             ORDER BY created_at ASC, rowid ASC"
        ))?
        .query_map([user_id], map_savings_pot_row)?
        .map(|maybe_pot| maybe_pot.map_err(Error::from))
        .collect()
}

/// Replace the stored fields of a savings pot.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a pot of the user,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_savings_pot(
    id: DatabaseId,
    user_id: &str,
    new_pot: NewSavingsPot,
    connection: &Connection,
) -> Result<SavingsPot, Error> {
    let pot = connection
        .prepare(&format!(
            "UPDATE savings_pot
             SET name = ?3, target_amount = ?4, current_amount = ?5, icon = ?6, color = ?7,
                 category = ?8, deadline = ?9
             WHERE id = ?1 AND user_id = ?2
             RETURNING {SAVINGS_POT_COLUMNS}"
        ))?
        .query_row(
            rusqlite::params![
                id,
                user_id,
                new_pot.name,
                new_pot.target_amount,
                new_pot.current_amount,
                new_pot.icon,
                new_pot.color,
                new_pot.category,
                new_pot.deadline,
            ],
            map_savings_pot_row,
        )?;

    Ok(pot)
}

/// Overwrite the amount saved in a pot.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a pot of the user,
/// - or [Error::SqlError] there is some other SQL error.
pub fn set_savings_pot_amount(
    id: DatabaseId,
    user_id: &str,
    current_amount: Amount,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE savings_pot SET current_amount = ?3 WHERE id = ?1 AND user_id = ?2",
        (id, user_id, current_amount),
    )?;

    match rows_affected {
        0 => Err(Error::NotFound),
        _ => Ok(()),
    }
}

/// Delete a savings pot, returning whether it existed.
///
/// Transactions linked to the pot are kept but lose the link.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn delete_savings_pot(
    id: DatabaseId,
    user_id: &str,
    connection: &Connection,
) -> Result<bool, Error> {
    let rows_affected = connection.execute(
        "DELETE FROM savings_pot WHERE id = ?1 AND user_id = ?2",
        (id, user_id),
    )?;

    Ok(rows_affected > 0)
}

/// Create the savings pot table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_savings_pot_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS savings_pot (
                id BLOB PRIMARY KEY,
                user_id TEXT NOT NULL,
                name TEXT NOT NULL,
                target_amount TEXT NOT NULL,
                current_amount TEXT NOT NULL,
                icon TEXT NOT NULL,
                color TEXT NOT NULL,
                category TEXT,
                deadline TEXT,
                created_at TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Map a database row to a SavingsPot.
pub fn map_savings_pot_row(row: &Row) -> Result<SavingsPot, rusqlite::Error> {
    Ok(SavingsPot {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        target_amount: row.get(3)?,
        current_amount: row.get(4)?,
        icon: row.get(5)?,
        color: row.get(6)?,
        category: row.get(7)?,
        deadline: row.get(8)?,
        created_at: row.get(9)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
        use uuid::Uuid;

    use crate::{
        Error,
        test_utils::{amount, must_create_test_connection},
        timezone::LocalTimezone,
        user::DEFAULT_USER_ID,
    };

    use super::{
        NewSavingsPot, SavingsPotForm, SavingsPotView, create_savings_pot, delete_savings_pot,
        get_savings_pot, get_savings_pots, set_savings_pot_amount, update_savings_pot,
    };

    #[test]
    fn form_applies_defaults() {
        let form = SavingsPotForm {
            name: Some("Vacation".to_owned()),
            target_amount: Some("2000".to_owned()),
            ..Default::default()
        };

        let new_pot = form.validate(None, LocalTimezone::UTC).unwrap();

        assert_eq!(new_pot, NewSavingsPot::new("Vacation", amount("2000.00")));
    }

    #[test]
    fn form_requires_name_and_target() {
        let result = SavingsPotForm::default().validate(None, LocalTimezone::UTC);

        let Err(Error::Validation(errors)) = result else {
            panic!("expected a validation error");
        };
        let fields: Vec<_> = errors.iter().map(|error| error.field.as_str()).collect();
        assert_eq!(fields, ["name", "targetAmount"]);
    }

    #[test]
    fn derived_figures() {
        let connection = must_create_test_connection();
        let pot = create_savings_pot(
            NewSavingsPot::new("Vacation", amount("2000.00")).current_amount(amount("500.00")),
            DEFAULT_USER_ID,
            &connection,
        )
        .unwrap();

        let view = SavingsPotView::from(pot);

        assert_eq!(view.progress_percentage, dec!(25));
        assert_eq!(view.remaining_amount, amount("1500.00"));

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["progressPercentage"], 25.0);
        assert_eq!(json["remainingAmount"], "1500.00");
        assert_eq!(json["currentAmount"], "500.00");
        assert_eq!(json["icon"], "piggy-bank");
    }

    #[test]
    fn crud() {
        let connection = must_create_test_connection();
        let pot = create_savings_pot(
            NewSavingsPot::new("Vacation", amount("2000.00")),
            DEFAULT_USER_ID,
            &connection,
        )
        .unwrap();

        assert_eq!(get_savings_pot(pot.id, DEFAULT_USER_ID, &connection), Ok(pot.clone()));

        let updated = update_savings_pot(
            pot.id,
            DEFAULT_USER_ID,
            NewSavingsPot::new("Holiday", amount("3000.00")),
            &connection,
        )
        .unwrap();
        assert_eq!(updated.name, "Holiday");
        assert_eq!(updated.created_at, pot.created_at);

        set_savings_pot_amount(pot.id, DEFAULT_USER_ID, amount("12.34"), &connection).unwrap();
        assert_eq!(
            get_savings_pot(pot.id, DEFAULT_USER_ID, &connection)
                .unwrap()
                .current_amount,
            amount("12.34")
        );

        assert_eq!(delete_savings_pot(pot.id, DEFAULT_USER_ID, &connection), Ok(true));
        assert_eq!(
            get_savings_pot(pot.id, DEFAULT_USER_ID, &connection),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn setting_amount_of_missing_pot_is_not_found() {
        let connection = must_create_test_connection();

        assert_eq!(
            set_savings_pot_amount(Uuid::new_v4(), DEFAULT_USER_ID, amount("1.00"), &connection),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn lists_pots_in_creation_order() {
        let connection = must_create_test_connection();
        for name in ["Vacation", "Car", "House"] {
            create_savings_pot(
                NewSavingsPot::new(name, amount("100.00")),
                DEFAULT_USER_ID,
                &connection,
            )
            .unwrap();
        }

        let names: Vec<_> = get_savings_pots(DEFAULT_USER_ID, &connection)
            .unwrap()
            .into_iter()
            .map(|pot| pot.name)
            .collect();

        assert_eq!(names, ["Vacation", "Car", "House"]);
    }
}
