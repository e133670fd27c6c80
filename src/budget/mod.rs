//! Budgets: per-category spending limits for a month.

mod core;
mod endpoints;

pub use core::{
    Budget, BudgetForm, create_budget, create_budget_table, delete_budget, get_budget,
    get_budgets, update_budget,
};
pub use endpoints::{
    create_budget_endpoint, delete_budget_endpoint, get_budgets_endpoint,
    update_budget_endpoint,
};
