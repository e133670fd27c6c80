//! Defines the debt model, its form and database queries.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    category::ExpenseCategory,
    database_id::{DatabaseId, new_database_id},
    money::Amount,
    timezone::LocalTimezone,
    validation::{
        FieldErrors, nullable, parse_instant, parse_non_empty, parse_non_negative_amount,
        parse_positive_amount,
    },
};

/// Money the user owes, e.g. a credit card balance or a loan.
///
/// Debts are maintained by hand. Payments recorded as transactions do not
/// change the remaining amount.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Debt {
    /// The ID of the debt.
    pub id: DatabaseId,
    /// The user that owes the money.
    pub user_id: String,
    /// What the debt is, e.g. "Visa".
    pub name: String,
    /// The expense category that payments towards the debt are recorded under.
    pub category: ExpenseCategory,
    /// The amount originally borrowed.
    pub total_amount: Amount,
    /// The amount still owed.
    pub remaining_amount: Amount,
    /// The yearly interest rate as a percentage.
    pub interest_rate: Option<Amount>,
    /// The smallest payment the lender accepts.
    pub minimum_payment: Option<Amount>,
    /// When the next payment is due.
    #[serde(with = "time::serde::rfc3339::option")]
    pub due_date: Option<OffsetDateTime>,
    /// When the debt was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A debt that has been validated but not saved yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDebt {
    /// What the debt is.
    pub name: String,
    /// The expense category that payments are recorded under.
    pub category: ExpenseCategory,
    /// The amount originally borrowed.
    pub total_amount: Amount,
    /// The amount still owed.
    pub remaining_amount: Amount,
    /// The yearly interest rate as a percentage.
    pub interest_rate: Option<Amount>,
    /// The smallest payment the lender accepts.
    pub minimum_payment: Option<Amount>,
    /// When the next payment is due.
    pub due_date: Option<OffsetDateTime>,
}

/// The JSON body for creating or editing a debt.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtForm {
    /// What the debt is.
    pub name: Option<String>,
    /// One of the expense categories.
    pub category: Option<String>,
    /// A positive decimal string.
    pub total_amount: Option<String>,
    /// A non-negative decimal string.
    pub remaining_amount: Option<String>,
    /// A non-negative percentage, `null` clears it.
    #[serde(default, deserialize_with = "nullable")]
    pub interest_rate: Option<Option<String>>,
    /// A non-negative decimal string, `null` clears it.
    #[serde(default, deserialize_with = "nullable")]
    pub minimum_payment: Option<Option<String>>,
    /// An ISO date or RFC 3339 date-time, `null` clears it.
    #[serde(default, deserialize_with = "nullable")]
    pub due_date: Option<Option<String>>,
}

impl DebtForm {
    /// Validate the form, filling in absent fields from `existing` when editing.
    ///
    /// # Errors
    /// Returns [Error::Validation] listing every missing or malformed field.
    pub fn validate(
        self,
        existing: Option<&Debt>,
        timezone: LocalTimezone,
    ) -> Result<NewDebt, Error> {
        let mut errors = FieldErrors::default();

        let name = errors.required(
            "name",
            self.name,
            existing.map(|debt| debt.name.clone()),
            parse_non_empty,
        );
        let category = errors.required(
            "category",
            self.category,
            existing.map(|debt| debt.category),
            |raw| raw.parse(),
        );
        let total_amount = errors.required(
            "totalAmount",
            self.total_amount,
            existing.map(|debt| debt.total_amount),
            parse_positive_amount,
        );
        let remaining_amount = errors.required(
            "remainingAmount",
            self.remaining_amount,
            existing.map(|debt| debt.remaining_amount),
            parse_non_negative_amount,
        );
        let interest_rate = errors.optional(
            "interestRate",
            self.interest_rate,
            existing.and_then(|debt| debt.interest_rate),
            parse_non_negative_amount,
        );
        let minimum_payment = errors.optional(
            "minimumPayment",
            self.minimum_payment,
            existing.and_then(|debt| debt.minimum_payment),
            parse_non_negative_amount,
        );
        let due_date = errors.optional(
            "dueDate",
            self.due_date,
            existing.and_then(|debt| debt.due_date),
            |raw| parse_instant(&raw, timezone),
        );

        let (Some(name), Some(category), Some(total_amount), Some(remaining_amount)) =
            (name, category, total_amount, remaining_amount)
        else {
            return Err(errors.into_error());
        };

        errors.into_result()?;

        Ok(NewDebt {
            name,
            category,
            total_amount,
            remaining_amount,
            interest_rate,
            minimum_payment,
            due_date,
        })
    }
}

const DEBT_COLUMNS: &str = "id, user_id, name, category, total_amount, remaining_amount, \
     interest_rate, minimum_payment, due_date, created_at";

/// Create a new debt in the database.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn create_debt(new_debt: NewDebt, user_id: &str, connection: &Connection) -> Result<Debt, Error> {
    let debt = connection
        .prepare(&format!(
            "INSERT INTO debt ({DEBT_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             RETURNING {DEBT_COLUMNS}"
        ))?
        .query_row(
            rusqlite::params![
                new_database_id(),
                user_id,
                new_debt.name,
                new_debt.category,
                new_debt.total_amount,
                new_debt.remaining_amount,
                new_debt.interest_rate,
                new_debt.minimum_payment,
                new_debt.due_date,
                OffsetDateTime::now_utc(),
            ],
            map_debt_row,
        )?;

    Ok(debt)
}

/// Retrieve a debt owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a debt of the user,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_debt(id: DatabaseId, user_id: &str, connection: &Connection) -> Result<Debt, Error> {
    let debt = connection
        .prepare(&format!(
            "SELECT {DEBT_COLUMNS} FROM debt WHERE id = ?1 AND user_id = ?2"
        ))?
        .query_one((id, user_id), map_debt_row)?;

    Ok(debt)
}

/// Retrieve all of a user's debts in the order they were recorded.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn get_debts(user_id: &str, connection: &Connection) -> Result<Vec<Debt>, Error> {
    connection
        .prepare(&format!(
            "SELECT {DEBT_COLUMNS} FROM debt WHERE user_id = ?1 ORDER BY created_at ASC, rowid ASC"
        ))?
        .query_map([user_id], map_debt_row)?
        .map(|maybe_debt| maybe_debt.map_err(Error::from))
        .collect()
}

/// Replace the stored fields of a debt.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a debt of the user,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_debt(
    id: DatabaseId,
    user_id: &str,
    new_debt: NewDebt,
    connection: &Connection,
) -> Result<Debt, Error> {
    let debt = connection
        .prepare(&format!(
            "UPDATE debt
             SET name = ?3, category = ?4, total_amount = ?5, remaining_amount = ?6,
                 interest_rate = ?7, minimum_payment = ?8, due_date = ?9
             WHERE id = ?1 AND user_id = ?2
             RETURNING {DEBT_COLUMNS}"
        ))?
        .query_row(
            rusqlite::params![
                id,
                user_id,
                new_debt.name,
                new_debt.category,
                new_debt.total_amount,
                new_debt.remaining_amount,
                new_debt.interest_rate,
                new_debt.minimum_payment,
                new_debt.due_date,
            ],
            map_debt_row,
        )?;

    Ok(debt)
}

/// Delete a debt, returning whether it existed.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn delete_debt(id: DatabaseId, user_id: &str, connection: &Connection) -> Result<bool, Error> {
    let rows_affected = connection.execute(
        "DELETE FROM debt WHERE id = ?1 AND user_id = ?2",
        (id, user_id),
    )?;

    Ok(rows_affected > 0)
}

/// Create the debt table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_debt_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS debt (
                id BLOB PRIMARY KEY,
                user_id TEXT NOT NULL,
                name TEXT NOT NULL,
                category TEXT NOT NULL,
                total_amount TEXT NOT NULL,
                remaining_amount TEXT NOT NULL,
                interest_rate TEXT,
                minimum_payment TEXT,
                due_date TEXT,
                created_at TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

fn map_debt_row(row: &Row) -> Result<Debt, rusqlite::Error> {
    Ok(Debt {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        category: row.get(3)?,
        total_amount: row.get(4)?,
        remaining_amount: row.get(5)?,
        interest_rate: row.get(6)?,
        minimum_payment: row.get(7)?,
        due_date: row.get(8)?,
        created_at: row.get(9)?,
    })
}
