//! Defines the financial goal model, its form and database queries.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    category::text_enum,
    database_id::{DatabaseId, new_database_id},
    money::Amount,
    timezone::LocalTimezone,
    validation::{
        FieldErrors, nullable, parse_instant, parse_non_empty, parse_non_negative_amount,
        parse_positive_amount,
    },
};

text_enum! {
    /// How urgent a goal is to the user.
    Priority {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
}

/// A longer-term target such as a house deposit.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialGoal {
    /// The ID of the goal.
    pub id: DatabaseId,
    /// The user working towards the goal.
    pub user_id: String,
    /// What the goal is.
    pub name: String,
    /// The amount needed.
    pub target_amount: Amount,
    /// The amount put towards the goal so far, entered by hand.
    pub current_amount: Amount,
    /// When the user wants to reach the goal.
    #[serde(with = "time::serde::rfc3339::option")]
    pub target_date: Option<OffsetDateTime>,
    /// A free-form label, e.g. "home".
    pub category: String,
    /// How urgent the goal is.
    pub priority: Priority,
    /// When the goal was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A financial goal that has been validated but not saved yet.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq)]
pub struct NewFinancialGoal {
    pub name: String,
    pub target_amount: Amount,
    pub current_amount: Amount,
    pub target_date: Option<OffsetDateTime>,
    pub category: String,
    pub priority: Priority,
}

/// The JSON body for creating or editing a financial goal.
#[allow(missing_docs)]
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialGoalForm {
    pub name: Option<String>,
    pub target_amount: Option<String>,
    /// Zero if absent on creation.
    pub current_amount: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub target_date: Option<Option<String>>,
    pub category: Option<String>,
    /// Medium if absent on creation.
    pub priority: Option<String>,
}

impl FinancialGoalForm {
    /// Validate the form, filling in absent fields from `existing` when editing.
    ///
    /// # Errors
    /// Returns [Error::Validation] listing every missing or malformed field.
    pub fn validate(
        self,
        existing: Option<&FinancialGoal>,
        timezone: LocalTimezone,
    ) -> Result<NewFinancialGoal, Error> {
        let mut errors = FieldErrors::default();

        let name = errors.required(
            "name",
            self.name,
            existing.map(|goal| goal.name.clone()),
            parse_non_empty,
        );
        let target_amount = errors.required(
            "targetAmount",
            self.target_amount,
            existing.map(|goal| goal.target_amount),
            parse_positive_amount,
        );
        let current_amount = errors.required(
            "currentAmount",
            self.current_amount,
            Some(existing.map_or(Amount::ZERO, |goal| goal.current_amount)),
            parse_non_negative_amount,
        );
        let target_date = errors.optional(
            "targetDate",
            self.target_date,
            existing.and_then(|goal| goal.target_date),
            |raw| parse_instant(&raw, timezone),
        );
        let category = errors.required(
            "category",
            self.category,
            existing.map(|goal| goal.category.clone()),
            parse_non_empty,
        );
        let priority = errors.required(
            "priority",
            self.priority,
            Some(existing.map_or(Priority::Medium, |goal| goal.priority)),
            |raw| raw.parse(),
        );

        let (Some(name), Some(target_amount), Some(current_amount), Some(category), Some(priority)) =
            (name, target_amount, current_amount, category, priority)
        else {
            return Err(errors.into_error());
        };

        errors.into_result()?;

        Ok(NewFinancialGoal {
            name,
            target_amount,
            current_amount,
            target_date,
            category,
            priority,
        })
    }
}

const FINANCIAL_GOAL_COLUMNS: &str = "id, user_id, name, target_amount, current_amount, \
     target_date, category, priority, created_at";

/// Create a new financial goal in the database.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn create_financial_goal(
    new_goal: NewFinancialGoal,
    user_id: &str,
    connection: &Connection,
) -> Result<FinancialGoal, Error> {
    let goal = connection
        .prepare(&format!(
            "INSERT INTO financial_goal ({FINANCIAL_GOAL_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             RETURNING {FINANCIAL_GOAL_COLUMNS}"
        ))?
        .query_row(
            rusqlite::params![
                new_database_id(),
                user_id,
                new_goal.name,
                new_goal.target_amount,
                new_goal.current_amount,
                new_goal.target_date,
                new_goal.category,
                new_goal.priority,
                OffsetDateTime::now_utc(),
            ],
            map_financial_goal_row,
        )?;

    Ok(goal)
}

/// Retrieve a financial goal owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a goal of the user,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_financial_goal(
    id: DatabaseId,
    user_id: &str,
    connection: &Connection,
) -> Result<FinancialGoal, Error> {
    let goal = connection
        .prepare(&format!(
            "SELECT {FINANCIAL_GOAL_COLUMNS} FROM financial_goal WHERE id = ?1 AND user_id = ?2"
        ))?
        .query_one((id, user_id), map_financial_goal_row)?;

    Ok(goal)
}

/// Retrieve all of a user's financial goals in the order they were recorded.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn get_financial_goals(
    user_id: &str,
    connection: &Connection,
) -> Result<Vec<FinancialGoal>, Error> {
    connection
        .prepare(&format!(
            "SELECT {FINANCIAL_GOAL_COLUMNS} FROM financial_goal
             WHERE user_id = ?1 ORDER BY created_at ASC, rowid ASC"
        ))?
        .query_map([user_id], map_financial_goal_row)?
        .map(|maybe_goal| maybe_goal.map_err(Error::from))
        .collect()
}

/// Replace the stored fields of a financial goal.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a goal of the user,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_financial_goal(
    id: DatabaseId,
    user_id: &str,
    new_goal: NewFinancialGoal,
    connection: &Connection,
) -> Result<FinancialGoal, Error> {
    let goal = connection
        .prepare(&format!(
            "UPDATE financial_goal
             SET name = ?3, target_amount = ?4, current_amount = ?5, target_date = ?6,
                 category = ?7, priority = ?8
             WHERE id = ?1 AND user_id = ?2
             RETURNING {FINANCIAL_GOAL_COLUMNS}"
        ))?
        .query_row(
            rusqlite::params![
                id,
                user_id,
                new_goal.name,
                new_goal.target_amount,
                new_goal.current_amount,
                new_goal.target_date,
                new_goal.category,
                new_goal.priority,
            ],
            map_financial_goal_row,
        )?;

    Ok(goal)
}

/// Delete a financial goal, returning whether it existed.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn delete_financial_goal(
    id: DatabaseId,
    user_id: &str,
    connection: &Connection,
) -> Result<bool, Error> {
    let rows_affected = connection.execute(
        "DELETE FROM financial_goal WHERE id = ?1 AND user_id = ?2",
        (id, user_id),
    )?;

    Ok(rows_affected > 0)
}

/// Create the financial goal table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_financial_goal_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS financial_goal (
                id BLOB PRIMARY KEY,
                user_id TEXT NOT NULL,
                name TEXT NOT NULL,
                target_amount TEXT NOT NULL,
                current_amount TEXT NOT NULL,
                target_date TEXT,
                category TEXT NOT NULL,
                priority TEXT NOT NULL,
                created_at TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

fn map_financial_goal_row(row: &Row) -> Result<FinancialGoal, rusqlite::Error> {
    Ok(FinancialGoal {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        target_amount: row.get(3)?,
        current_amount: row.get(4)?,
        target_date: row.get(5)?,
        category: row.get(6)?,
        priority: row.get(7)?,
        created_at: row.get(8)?,
    })
}
