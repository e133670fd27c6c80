//! Defines the recurring expense model, its form and database queries.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    category::{ExpenseCategory, ExpenseGroup},
    database_id::{DatabaseId, new_database_id},
    money::Amount,
    validation::{FieldErrors, parse_non_empty, parse_positive_amount},
};

/// A template for an expense that happens every month, e.g. rent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringExpense {
    /// The ID of the recurring expense.
    pub id: DatabaseId,
    /// The user that pays the expense.
    pub user_id: String,
    /// Copied onto every generated transaction.
    pub description: String,
    /// The amount charged each month.
    pub amount: Amount,
    /// The expense category of the generated transactions.
    pub category: ExpenseCategory,
    /// The budgeting bucket of the generated transactions.
    pub expense_group: ExpenseGroup,
    /// The day of the month the expense is charged, 1-31.
    ///
    /// Days past the end of a short month fall on its last day.
    pub day_of_month: u8,
    /// Whether the expense is split with a partner.
    pub is_shared_expense: bool,
    /// Inactive recurring expenses are neither generated nor forecast.
    pub is_active: bool,
    /// When the recurring expense was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the recurring expense was last changed.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// A recurring expense that has been validated but not saved yet.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecurringExpense {
    pub description: String,
    pub amount: Amount,
    pub category: ExpenseCategory,
    pub expense_group: ExpenseGroup,
    pub day_of_month: u8,
    pub is_shared_expense: bool,
    pub is_active: bool,
}

/// The JSON body for creating or editing a recurring expense.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringExpenseForm {
    /// A non-empty description.
    pub description: Option<String>,
    /// A positive decimal string.
    pub amount: Option<String>,
    /// One of the expense categories.
    pub category: Option<String>,
    /// One of the expense groups.
    pub expense_group: Option<String>,
    /// The day of the month, 1-31.
    pub day_of_month: Option<i64>,
    /// False if absent on creation.
    pub is_shared_expense: Option<bool>,
    /// True if absent on creation.
    pub is_active: Option<bool>,
}

impl RecurringExpenseForm {
    /// Validate the form, filling in absent fields from `existing` when editing.
    ///
    /// # Errors
    /// Returns [Error::Validation] listing every missing or malformed field.
    pub fn validate(
        self,
        existing: Option<&RecurringExpense>,
    ) -> Result<NewRecurringExpense, Error> {
        let mut errors = FieldErrors::default();

        let description = errors.required(
            "description",
            self.description,
            existing.map(|expense| expense.description.clone()),
            parse_non_empty,
        );
        let amount = errors.required(
            "amount",
            self.amount,
            existing.map(|expense| expense.amount),
            parse_positive_amount,
        );
        let category = errors.required(
            "category",
            self.category,
            existing.map(|expense| expense.category),
            |raw| raw.parse(),
        );
        let expense_group = errors.required(
            "expenseGroup",
            self.expense_group,
            existing.map(|expense| expense.expense_group),
            |raw| raw.parse(),
        );
        let day_of_month = errors.required(
            "dayOfMonth",
            self.day_of_month,
            existing.map(|expense| expense.day_of_month),
            |number| {
                u8::try_from(number)
                    .ok()
                    .filter(|day| (1..=31).contains(day))
                    .ok_or_else(|| "must be between 1 and 31".to_owned())
            },
        );
        let is_shared_expense = self
            .is_shared_expense
            .or(existing.map(|expense| expense.is_shared_expense))
            .unwrap_or(false);
        let is_active = self
            .is_active
            .or(existing.map(|expense| expense.is_active))
            .unwrap_or(true);

        let (Some(description), Some(amount), Some(category), Some(expense_group), Some(day_of_month)) =
            (description, amount, category, expense_group, day_of_month)
        else {
            return Err(errors.into_error());
        };

        errors.into_result()?;

        Ok(NewRecurringExpense {
            description,
            amount,
            category,
            expense_group,
            day_of_month,
            is_shared_expense,
            is_active,
        })
    }
}

const RECURRING_EXPENSE_COLUMNS: &str = "id, user_id, description, amount, category, \
     expense_group, day_of_month, is_shared_expense, is_active, created_at, updated_at";

/// Create a new recurring expense in the database.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn create_recurring_expense(
    new_expense: NewRecurringExpense,
    user_id: &str,
    connection: &Connection,
) -> Result<RecurringExpense, Error> {
    let now = OffsetDateTime::now_utc();

    let expense = connection
        .prepare(&format!(
            "INSERT INTO recurring_expense ({RECURRING_EXPENSE_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)
             RETURNING {RECURRING_EXPENSE_COLUMNS}"
        ))?
        .query_row(
            rusqlite::params![
                new_database_id(),
                user_id,
                new_expense.description,
                new_expense.amount,
                new_expense.category,
                new_expense.expense_group,
                new_expense.day_of_month,
                new_expense.is_shared_expense,
                new_expense.is_active,
                now,
            ],
            map_recurring_expense_row,
        )?;

    Ok(expense)
}

/// Retrieve a recurring expense owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a recurring expense of the user,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_recurring_expense(
    id: DatabaseId,
    user_id: &str,
    connection: &Connection,
) -> Result<RecurringExpense, Error> {
    let expense = connection
        .prepare(&format!(
            "SELECT {RECURRING_EXPENSE_COLUMNS} FROM recurring_expense
             WHERE id = ?1 AND user_id = ?2"
        ))?
        .query_one((id, user_id), map_recurring_expense_row)?;

    Ok(expense)
}

/// Retrieve all of a user's recurring expenses in the order they were created.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn get_recurring_expenses(
    user_id: &str,
    connection: &Connection,
) -> Result<Vec<RecurringExpense>, Error> {
    query_recurring_expenses(user_id, false, connection)
}

/// Retrieve the user's recurring expenses that are still being charged.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn get_active_recurring_expenses(
    user_id: &str,
    connection: &Connection,
) -> Result<Vec<RecurringExpense>, Error> {
    query_recurring_expenses(user_id, true, connection)
}

fn query_recurring_expenses(
    user_id: &str,
    active_only: bool,
    connection: &Connection,
) -> Result<Vec<RecurringExpense>, Error> {
    connection
        .prepare(&format!(
            "SELECT {RECURRING_EXPENSE_COLUMNS} FROM recurring_expense
             WHERE user_id = ?1 AND (?2 = 0 OR is_active = 1)
             ORDER BY created_at ASC, rowid ASC"
        ))?
        .query_map((user_id, active_only), map_recurring_expense_row)?
        .map(|maybe_expense| maybe_expense.map_err(Error::from))
        .collect()
}

/// Replace the stored fields of a recurring expense and bump `updated_at`.
///
/// Transactions already generated from it are left as they are.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a recurring expense of the user,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_recurring_expense(
    id: DatabaseId,
    user_id: &str,
    new_expense: NewRecurringExpense,
    connection: &Connection,
) -> Result<RecurringExpense, Error> {
    let expense = connection
        .prepare(&format!(
            "UPDATE recurring_expense
             SET description = ?3, amount = ?4, category = ?5, expense_group = ?6,
                 day_of_month = ?7, is_shared_expense = ?8, is_active = ?9, updated_at = ?10
             WHERE id = ?1 AND user_id = ?2
             RETURNING {RECURRING_EXPENSE_COLUMNS}"
        ))?
        .query_row(
            rusqlite::params![
                id,
                user_id,
                new_expense.description,
                new_expense.amount,
                new_expense.category,
                new_expense.expense_group,
                new_expense.day_of_month,
                new_expense.is_shared_expense,
                new_expense.is_active,
                OffsetDateTime::now_utc(),
            ],
            map_recurring_expense_row,
        )?;

    Ok(expense)
}

/// Delete a recurring expense, returning whether it existed.
///
/// Generated transactions are kept but lose their link to the template.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn delete_recurring_expense(
    id: DatabaseId,
    user_id: &str,
    connection: &Connection,
) -> Result<bool, Error> {
    let rows_affected = connection.execute(
        "DELETE FROM recurring_expense WHERE id = ?1 AND user_id = ?2",
        (id, user_id),
    )?;

    Ok(rows_affected > 0)
}

/// Create the recurring expense table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_recurring_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS recurring_expense (
                id BLOB PRIMARY KEY,
                user_id TEXT NOT NULL,
                description TEXT NOT NULL,
                amount TEXT NOT NULL,
                category TEXT NOT NULL,
                expense_group TEXT NOT NULL,
                day_of_month INTEGER NOT NULL CHECK (day_of_month BETWEEN 1 AND 31),
                is_shared_expense INTEGER NOT NULL,
                is_active INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

fn map_recurring_expense_row(row: &Row) -> Result<RecurringExpense, rusqlite::Error> {
    Ok(RecurringExpense {
        id: row.get(0)?,
        user_id: row.get(1)?,
        description: row.get(2)?,
        amount: row.get(3)?,
        category: row.get(4)?,
        expense_group: row.get(5)?,
        day_of_month: row.get(6)?,
        is_shared_expense: row.get(7)?,
        is_active: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}
