//! Savings pots: named savings goals whose totals follow savings expenses.

mod core;
mod endpoints;
mod reconcile;

pub use core::{
    NewSavingsPot, SavingsPot, SavingsPotForm, SavingsPotView, create_savings_pot,
    create_savings_pot_table, delete_savings_pot, get_savings_pot, get_savings_pots,
    set_savings_pot_amount, update_savings_pot,
};
pub use endpoints::{
    create_savings_pot_endpoint, delete_savings_pot_endpoint, get_savings_pot_endpoint,
    get_savings_pots_endpoint, update_savings_pot_endpoint,
};
pub use reconcile::{PotMatching, reconcile_savings_pots};
