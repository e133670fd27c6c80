//! Dashboard module
//!
//! Provides the monthly summary with a next-month forecast, and the
//! breakdown of expenses by expense group.

mod expense_groups;
mod handlers;
mod summary;

pub use expense_groups::{ExpenseGroupSummary, aggregate};
pub use handlers::{get_dashboard_summary, get_expense_groups};
pub use summary::{DashboardSummary, summarize};
