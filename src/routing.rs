//! Application router configuration.

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::{
    AppState, Error,
    budget::{
        create_budget_endpoint, delete_budget_endpoint, get_budgets_endpoint,
        update_budget_endpoint,
    },
    dashboard::{get_dashboard_summary, get_expense_groups},
    debt::{
        create_debt_endpoint, delete_debt_endpoint, get_debt_endpoint,
        get_debt_transactions_endpoint, get_debts_endpoint, update_debt_endpoint,
    },
    endpoints,
    financial_goal::{
        create_financial_goal_endpoint, delete_financial_goal_endpoint,
        get_financial_goals_endpoint, update_financial_goal_endpoint,
    },
    investment::{
        create_investment_endpoint, delete_investment_endpoint, get_investments_endpoint,
        update_investment_endpoint,
    },
    recurring_expense::{
        create_recurring_expense_endpoint, delete_recurring_expense_endpoint,
        generate_recurring_transactions_endpoint, get_recurring_expenses_endpoint,
        update_recurring_expense_endpoint,
    },
    savings_pot::{
        create_savings_pot_endpoint, delete_savings_pot_endpoint, get_savings_pot_endpoint,
        get_savings_pots_endpoint, update_savings_pot_endpoint,
    },
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, get_transaction_endpoint,
        get_transactions_endpoint, update_transaction_endpoint,
    },
    user::get_current_user_endpoint,
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let record_routes = Router::new()
        .route(
            endpoints::TRANSACTIONS,
            get(get_transactions_endpoint).post(create_transaction_endpoint),
        )
        .route(
            endpoints::TRANSACTION,
            get(get_transaction_endpoint)
                .put(update_transaction_endpoint)
                .delete(delete_transaction_endpoint),
        )
        .route(
            endpoints::SAVINGS_POTS,
            get(get_savings_pots_endpoint).post(create_savings_pot_endpoint),
        )
        .route(
            endpoints::SAVINGS_POT,
            get(get_savings_pot_endpoint)
                .put(update_savings_pot_endpoint)
                .delete(delete_savings_pot_endpoint),
        )
        .route(
            endpoints::DEBTS,
            get(get_debts_endpoint).post(create_debt_endpoint),
        )
        .route(
            endpoints::DEBT,
            get(get_debt_endpoint)
                .put(update_debt_endpoint)
                .delete(delete_debt_endpoint),
        )
        .route(
            endpoints::DEBT_TRANSACTIONS,
            get(get_debt_transactions_endpoint),
        )
        .route(
            endpoints::INVESTMENTS,
            get(get_investments_endpoint).post(create_investment_endpoint),
        )
        .route(
            endpoints::INVESTMENT,
            put(update_investment_endpoint).delete(delete_investment_endpoint),
        )
        .route(
            endpoints::BUDGETS,
            get(get_budgets_endpoint).post(create_budget_endpoint),
        )
        .route(
            endpoints::BUDGET,
            put(update_budget_endpoint).delete(delete_budget_endpoint),
        )
        .route(
            endpoints::FINANCIAL_GOALS,
            get(get_financial_goals_endpoint).post(create_financial_goal_endpoint),
        )
        .route(
            endpoints::FINANCIAL_GOAL,
            put(update_financial_goal_endpoint).delete(delete_financial_goal_endpoint),
        );

    let recurring_routes = Router::new()
        .route(
            endpoints::RECURRING_EXPENSES,
            get(get_recurring_expenses_endpoint).post(create_recurring_expense_endpoint),
        )
        .route(
            endpoints::GENERATE_RECURRING_EXPENSES,
            post(generate_recurring_transactions_endpoint),
        )
        .route(
            endpoints::RECURRING_EXPENSE,
            put(update_recurring_expense_endpoint).delete(delete_recurring_expense_endpoint),
        );

    let dashboard_routes = Router::new()
        .route(endpoints::DASHBOARD_SUMMARY, get(get_dashboard_summary))
        .route(endpoints::EXPENSE_GROUPS, get(get_expense_groups))
        .route(endpoints::USER, get(get_current_user_endpoint));

    record_routes
        .merge(recurring_routes)
        .merge(dashboard_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

async fn get_404_not_found() -> Error {
    Error::NotFound
}
