//! Keeps savings pot totals in step with savings expenses.
//!
//! A savings expense adds its amount to one pot. The pot is the one named by
//! the transaction's `savingsPotId`, or, for transactions without a link, the
//! first pot whose name matches the description when name matching is on.
//! The chosen pot is remembered on the transaction, and only that pot gives
//! the amount back when the transaction is edited or deleted.

use clap::ValueEnum;
use rusqlite::Connection;

use crate::{
    Error,
    database_id::DatabaseId,
    savings_pot::{SavingsPot, get_savings_pot, get_savings_pots, set_savings_pot_amount},
    transaction::Transaction,
};

/// How savings expenses without an explicit pot link are matched to pots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum PotMatching {
    /// Only transactions with a `savingsPotId` affect pots.
    ExplicitOnly,
    /// Fall back to matching the pot name against the transaction description.
    #[default]
    NameFallback,
}

/// Move the effect of a transaction write onto the linked savings pots.
///
/// `old` is the transaction as it was before the write and `new` as it is
/// after, so a create passes only `new`, a delete only `old`, and an update
/// both. The old amount is taken back out of the pot recorded in
/// `old.credited_pot_id` (never going below zero) before the new amount is
/// added to the pot that `new` links to.
///
/// Returns the ID of the pot that now holds the new amount, if any. A pot that
/// would go past [crate::money::Amount::MAX] is left unchanged and not returned.
///
/// # Errors
/// Returns an error if a pot could not be read or written. The transaction
/// itself is not affected.
pub fn reconcile_savings_pots(
    old: Option<&Transaction>,
    new: Option<&Transaction>,
    user_id: &str,
    pot_matching: PotMatching,
    connection: &Connection,
) -> Result<Option<DatabaseId>, Error> {
    if let Some(old) = old
        && let Some(pot_id) = old.credited_pot_id
    {
        match get_savings_pot(pot_id, user_id, connection) {
            Ok(pot) => {
                let current_amount = pot.current_amount.saturating_sub(old.amount);
                set_savings_pot_amount(pot.id, user_id, current_amount, connection)?;
                tracing::debug!(
                    "removed {} from savings pot {:?}, now {current_amount}",
                    old.amount,
                    pot.name
                );
            }
            Err(Error::NotFound) => {
                tracing::debug!("savings pot {pot_id} of transaction {} is gone", old.id);
            }
            Err(error) => return Err(error),
        }
    }

    let Some(new) = new else {
        return Ok(None);
    };
    let Some(pot) = find_linked_pot(new, user_id, pot_matching, connection)? else {
        return Ok(None);
    };

    let Some(current_amount) = pot.current_amount.checked_add(new.amount) else {
        tracing::warn!(
            "adding {} to savings pot {:?} would exceed the maximum amount, leaving it at {}",
            new.amount,
            pot.name,
            pot.current_amount
        );
        return Ok(None);
    };
    set_savings_pot_amount(pot.id, user_id, current_amount, connection)?;
    tracing::debug!(
        "added {} to savings pot {:?}, now {current_amount}",
        new.amount,
        pot.name
    );

    Ok(Some(pot.id))
}

/// Find the pot that `transaction` contributes to, if any.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn find_linked_pot(
    transaction: &Transaction,
    user_id: &str,
    pot_matching: PotMatching,
    connection: &Connection,
) -> Result<Option<SavingsPot>, Error> {
    if !transaction.is_savings_expense() {
        return Ok(None);
    }

    if let Some(pot_id) = transaction.savings_pot_id {
        return match get_savings_pot(pot_id, user_id, connection) {
            Ok(pot) => Ok(Some(pot)),
            Err(Error::NotFound) => {
                tracing::warn!(
                    "transaction {} links to missing savings pot {pot_id}",
                    transaction.id
                );
                Ok(None)
            }
            Err(error) => Err(error),
        };
    }

    match pot_matching {
        PotMatching::ExplicitOnly => Ok(None),
        PotMatching::NameFallback => Ok(get_savings_pots(user_id, connection)?
            .into_iter()
            .find(|pot| names_match(&pot.name, &transaction.description))),
    }
}

/// Whether a pot name and a transaction description refer to the same thing:
/// either contains the other, ignoring case.
fn names_match(pot_name: &str, description: &str) -> bool {
    let pot_name = pot_name.to_lowercase();
    let description = description.to_lowercase();

    description.contains(&pot_name) || pot_name.contains(&description)
}
