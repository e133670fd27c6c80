//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/debts/{id}', use [format_endpoint].

/// The route to list and create transactions.
pub const TRANSACTIONS: &str = "/api/transactions";
/// The route to get, update and delete a single transaction.
pub const TRANSACTION: &str = "/api/transactions/{id}";
/// The route to list and create savings pots.
pub const SAVINGS_POTS: &str = "/api/savings-pots";
/// The route to get, update and delete a single savings pot.
pub const SAVINGS_POT: &str = "/api/savings-pots/{id}";
/// The route to list and create debts.
pub const DEBTS: &str = "/api/debts";
/// The route to get, update and delete a single debt.
pub const DEBT: &str = "/api/debts/{id}";
/// The route to list the expenses in a debt's category.
pub const DEBT_TRANSACTIONS: &str = "/api/debts/{id}/transactions";
/// The route to list and create investments.
pub const INVESTMENTS: &str = "/api/investments";
/// The route to update and delete a single investment.
pub const INVESTMENT: &str = "/api/investments/{id}";
/// The route to list and create budgets.
pub const BUDGETS: &str = "/api/budgets";
/// The route to update and delete a single budget.
pub const BUDGET: &str = "/api/budgets/{id}";
/// The route to list and create financial goals.
pub const FINANCIAL_GOALS: &str = "/api/financial-goals";
/// The route to update and delete a single financial goal.
pub const FINANCIAL_GOAL: &str = "/api/financial-goals/{id}";
/// The route to list and create recurring expenses.
pub const RECURRING_EXPENSES: &str = "/api/recurring-expenses";
/// The route to update and delete a single recurring expense.
pub const RECURRING_EXPENSE: &str = "/api/recurring-expenses/{id}";
/// The route to create a month's transactions from the recurring expenses.
pub const GENERATE_RECURRING_EXPENSES: &str = "/api/recurring-expenses/generate";
/// The route for the monthly summary and forecast.
pub const DASHBOARD_SUMMARY: &str = "/api/dashboard/summary";
/// The route for a month's expenses by expense group.
pub const EXPENSE_GROUPS: &str = "/api/dashboard/expense-groups";
/// The route for the current user.
pub const USER: &str = "/api/user";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is the text between a left and right brace, e.g. '{id}' in
/// '/api/debts/{id}/transactions'. Only the first parameter is replaced.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: impl std::fmt::Display) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map_or(endpoint_path.len(), |end| param_start + end + 1);

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
