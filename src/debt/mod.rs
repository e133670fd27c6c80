//! Debts: money the user owes, maintained by hand.

mod core;
mod endpoints;

pub use core::{
    Debt, DebtForm, create_debt, create_debt_table, delete_debt, get_debt, get_debts, update_debt,
};
pub use endpoints::{
    create_debt_endpoint, delete_debt_endpoint, get_debt_endpoint, get_debt_transactions_endpoint,
    get_debts_endpoint, update_debt_endpoint,
};
