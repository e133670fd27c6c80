//! Financial goals: longer-term savings targets with a priority.

mod core;
mod endpoints;

pub use core::{
    FinancialGoal, FinancialGoalForm, create_financial_goal,
    create_financial_goal_table, delete_financial_goal, get_financial_goal, get_financial_goals,
    update_financial_goal,
};
pub use endpoints::{
    create_financial_goal_endpoint, delete_financial_goal_endpoint, get_financial_goals_endpoint,
    update_financial_goal_endpoint,
};
