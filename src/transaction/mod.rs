//! Transaction management for the finance tracker.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and `NewTransaction` builder
//! - Database functions for storing and querying transactions
//! - The `TransactionWriter`, which keeps savings pots in step with writes
//! - Route handlers for the transaction API

mod core;
mod endpoints;
mod form;
mod writer;

pub use core::{
    NewTransaction, Transaction, TransactionType, create_transaction_table,
    get_expenses_in_category, get_transaction, get_transactions,
    get_transactions_for_recurring_expense,
};
pub use endpoints::{
    TransactionState, create_transaction_endpoint, delete_transaction_endpoint,
    get_transaction_endpoint, get_transactions_endpoint, update_transaction_endpoint,
};
pub use form::TransactionForm;
pub use writer::TransactionWriter;

pub(crate) use core::{create_transaction, delete_transaction, set_credited_pot, update_transaction};
