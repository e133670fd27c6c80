//! Creates the database schema.

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{
    Error,
    budget::create_budget_table,
    debt::create_debt_table,
    financial_goal::create_financial_goal_table,
    investment::create_investment_table,
    recurring_expense::create_recurring_expense_table,
    savings_pot::create_savings_pot_table,
    transaction::create_transaction_table,
    user::{create_user_table, seed_default_user},
};

/// Create the tables for every record type and seed the default user.
///
/// Safe to call on an existing database: tables are only created if they do
/// not already exist and the default user is only inserted once.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    // Foreign keys cannot be toggled inside a transaction.
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_savings_pot_table(&transaction)?;
    create_recurring_expense_table(&transaction)?;
    create_transaction_table(&transaction)?;
    create_debt_table(&transaction)?;
    create_investment_table(&transaction)?;
    create_budget_table(&transaction)?;
    create_financial_goal_table(&transaction)?;
    seed_default_user(&transaction)?;

    transaction.commit()?;

    Ok(())
}
