//! Defines the monthly budget model, its form and database queries.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    category::ExpenseCategory,
    database_id::{DatabaseId, new_database_id},
    money::Amount,
    validation::{FieldErrors, parse_non_negative_amount, parse_positive_amount},
};

/// A spending limit for one expense category in one month.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    /// The ID of the budget.
    pub id: DatabaseId,
    /// The user the budget belongs to.
    pub user_id: String,
    /// The expense category being limited.
    pub category: ExpenseCategory,
    /// How much the user plans to spend.
    pub budget_amount: Amount,
    /// How much the user has spent so far, entered by hand.
    pub spent_amount: Amount,
    /// The month number, 1-12.
    pub month: u8,
    /// The calendar year.
    pub year: i32,
    /// When the budget was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A budget that has been validated but not saved yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBudget {
    /// The expense category being limited.
    pub category: ExpenseCategory,
    /// How much the user plans to spend.
    pub budget_amount: Amount,
    /// How much the user has spent so far.
    pub spent_amount: Amount,
    /// The month number, 1-12.
    pub month: u8,
    /// The calendar year.
    pub year: i32,
}

/// The JSON body for creating or editing a budget.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetForm {
    /// One of the expense categories.
    pub category: Option<String>,
    /// A positive decimal string.
    pub budget_amount: Option<String>,
    /// A non-negative decimal string, zero if absent on creation.
    pub spent_amount: Option<String>,
    /// The month number, 1-12.
    pub month: Option<i64>,
    /// The calendar year, 1-9999.
    pub year: Option<i64>,
}

impl BudgetForm {
    /// Validate the form, filling in absent fields from `existing` when editing.
    ///
    /// # Errors
    /// Returns [Error::Validation] listing every missing or malformed field.
    pub fn validate(self, existing: Option<&Budget>) -> Result<NewBudget, Error> {
        let mut errors = FieldErrors::default();

        let category = errors.required(
            "category",
            self.category,
            existing.map(|budget| budget.category),
            |raw| raw.parse(),
        );
        let budget_amount = errors.required(
            "budgetAmount",
            self.budget_amount,
            existing.map(|budget| budget.budget_amount),
            parse_positive_amount,
        );
        let spent_amount = errors.required(
            "spentAmount",
            self.spent_amount,
            Some(existing.map_or(Amount::ZERO, |budget| budget.spent_amount)),
            parse_non_negative_amount,
        );
        let month = errors.required(
            "month",
            self.month,
            existing.map(|budget| budget.month),
            |number| {
                u8::try_from(number)
                    .ok()
                    .filter(|month| (1..=12).contains(month))
                    .ok_or_else(|| "must be between 1 and 12".to_owned())
            },
        );
        let year = errors.required(
            "year",
            self.year,
            existing.map(|budget| budget.year),
            |number| {
                i32::try_from(number)
                    .ok()
                    .filter(|year| (1..=9999).contains(year))
                    .ok_or_else(|| "must be between 1 and 9999".to_owned())
            },
        );

        let (Some(category), Some(budget_amount), Some(spent_amount), Some(month), Some(year)) =
            (category, budget_amount, spent_amount, month, year)
        else {
            return Err(errors.into_error());
        };

        errors.into_result()?;

        Ok(NewBudget {
            category,
            budget_amount,
            spent_amount,
            month,
            year,
        })
    }
}

const BUDGET_COLUMNS: &str =
    "id, user_id, category, budget_amount, spent_amount, month, year, created_at";

/// Create a new budget in the database.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn create_budget(
    new_budget: NewBudget,
    user_id: &str,
    connection: &Connection,
) -> Result<Budget, Error> {
    let budget = connection
        .prepare(&format!(
            "INSERT INTO budget ({BUDGET_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             RETURNING {BUDGET_COLUMNS}"
        ))?
        .query_row(
            rusqlite::params![
                new_database_id(),
                user_id,
                new_budget.category,
                new_budget.budget_amount,
                new_budget.spent_amount,
                new_budget.month,
                new_budget.year,
                OffsetDateTime::now_utc(),
            ],
            map_budget_row,
        )?;

    Ok(budget)
}

/// Retrieve a budget owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a budget of the user,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_budget(id: DatabaseId, user_id: &str, connection: &Connection) -> Result<Budget, Error> {
    let budget = connection
        .prepare(&format!(
            "SELECT {BUDGET_COLUMNS} FROM budget WHERE id = ?1 AND user_id = ?2"
        ))?
        .query_one((id, user_id), map_budget_row)?;

    Ok(budget)
}

/// Retrieve a user's budgets in the order they were recorded.
///
/// Only budgets for `month` and `year` are returned when they are given.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn get_budgets(
    user_id: &str,
    month: Option<u8>,
    year: Option<i32>,
    connection: &Connection,
) -> Result<Vec<Budget>, Error> {
    connection
        .prepare(&format!(
            "SELECT {BUDGET_COLUMNS} FROM budget
             WHERE user_id = ?1 AND (?2 IS NULL OR month = ?2) AND (?3 IS NULL OR year = ?3)
             ORDER BY created_at ASC, rowid ASC"
        ))?
        .query_map((user_id, month, year), map_budget_row)?
        .map(|maybe_budget| maybe_budget.map_err(Error::from))
        .collect()
}

/// Replace the stored fields of a budget.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a budget of the user,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_budget(
    id: DatabaseId,
    user_id: &str,
    new_budget: NewBudget,
    connection: &Connection,
) -> Result<Budget, Error> {
    let budget = connection
        .prepare(&format!(
            "UPDATE budget
             SET category = ?3, budget_amount = ?4, spent_amount = ?5, month = ?6, year = ?7
             WHERE id = ?1 AND user_id = ?2
             RETURNING {BUDGET_COLUMNS}"
        ))?
        .query_row(
            rusqlite::params![
                id,
                user_id,
                new_budget.category,
                new_budget.budget_amount,
                new_budget.spent_amount,
                new_budget.month,
                new_budget.year,
            ],
            map_budget_row,
        )?;

    Ok(budget)
}

/// Delete a budget, returning whether it existed.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn delete_budget(id: DatabaseId, user_id: &str, connection: &Connection) -> Result<bool, Error> {
    let rows_affected = connection.execute(
        "DELETE FROM budget WHERE id = ?1 AND user_id = ?2",
        (id, user_id),
    )?;

    Ok(rows_affected > 0)
}

/// Create the budget table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_budget_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS budget (
                id BLOB PRIMARY KEY,
                user_id TEXT NOT NULL,
                category TEXT NOT NULL,
                budget_amount TEXT NOT NULL,
                spent_amount TEXT NOT NULL,
                month INTEGER NOT NULL CHECK (month BETWEEN 1 AND 12),
                year INTEGER NOT NULL,
                created_at TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

fn map_budget_row(row: &Row) -> Result<Budget, rusqlite::Error> {
    Ok(Budget {
        id: row.get(0)?,
        user_id: row.get(1)?,
        category: row.get(2)?,
        budget_amount: row.get(3)?,
        spent_amount: row.get(4)?,
        month: row.get(5)?,
        year: row.get(6)?,
        created_at: row.get(7)?,
    })
}
