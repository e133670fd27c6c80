//! Investments: assets the user holds, valued by hand.

mod core;
mod endpoints;

pub use core::{
    Investment, InvestmentForm, create_investment, create_investment_table,
    delete_investment, get_investment, get_investments, update_investment,
};
pub use endpoints::{
    create_investment_endpoint, delete_investment_endpoint, get_investments_endpoint,
    update_investment_endpoint,
};
