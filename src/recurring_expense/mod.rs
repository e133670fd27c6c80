//! Recurring expenses and the generator that turns them into monthly
//! transactions.

mod core;
mod endpoints;
mod generator;

pub use core::{
    RecurringExpense, RecurringExpenseForm, create_recurring_expense,
    create_recurring_expense_table, delete_recurring_expense, get_active_recurring_expenses,
    get_recurring_expense, get_recurring_expenses, update_recurring_expense,
};
pub use endpoints::{
    create_recurring_expense_endpoint, delete_recurring_expense_endpoint,
    generate_recurring_transactions_endpoint, get_recurring_expenses_endpoint,
    update_recurring_expense_endpoint,
};
pub use generator::generate_recurring_transactions;
