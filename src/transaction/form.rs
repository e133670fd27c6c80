//! Validation of the request bodies used to create and edit transactions.

use serde::Deserialize;

use crate::{
    Error,
    category::Category,
    timezone::LocalTimezone,
    transaction::{NewTransaction, Transaction, TransactionType},
    validation::{
        FieldErrors, nullable, parse_database_id, parse_instant, parse_non_empty,
        parse_positive_amount,
    },
};

/// The JSON body for creating or editing a transaction.
///
/// Every field is optional so the same form can be used for partial updates.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionForm {
    /// One of "income", "expense" or "transfer".
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// A positive decimal string with at most two decimal places.
    pub amount: Option<String>,
    /// A category label from the set for `kind`.
    pub category: Option<String>,
    /// What the transaction was for.
    pub description: Option<String>,
    /// An ISO date or RFC 3339 date-time.
    pub date: Option<String>,
    /// The budgeting bucket of an expense.
    #[serde(default, deserialize_with = "nullable")]
    pub expense_group: Option<Option<String>>,
    /// Whether an expense is split with a partner.
    #[serde(default, deserialize_with = "nullable")]
    pub is_shared_expense: Option<Option<bool>>,
    /// The savings pot that a savings expense is credited to.
    #[serde(default, deserialize_with = "nullable")]
    pub savings_pot_id: Option<Option<String>>,
}

impl TransactionForm {
    /// Validate the form, filling in absent fields from `existing` when editing.
    ///
    /// # Errors
    /// Returns [Error::Validation] listing every missing or malformed field.
    pub fn validate(
        self,
        existing: Option<&Transaction>,
        timezone: LocalTimezone,
    ) -> Result<NewTransaction, Error> {
        let mut errors = FieldErrors::default();

        let kind = errors.required("type", self.kind, existing.map(|old| old.kind), |raw| {
            raw.parse::<TransactionType>()
        });
        let amount = errors.required(
            "amount",
            self.amount,
            existing.map(|old| old.amount),
            parse_positive_amount,
        );
        let description = errors.required(
            "description",
            self.description,
            existing.map(|old| old.description.clone()),
            parse_non_empty,
        );
        let date = errors.required("date", self.date, existing.map(|old| old.date), |raw| {
            parse_instant(&raw, timezone)
        });

        let category = match kind {
            Some(kind) => {
                // A stored category only carries over if the type is unchanged.
                let stored = existing
                    .filter(|old| old.kind == kind)
                    .map(|old| old.category);
                errors.required("category", self.category, stored, |raw| {
                    Category::parse(kind, &raw)
                })
            }
            None => {
                if self.category.is_none() && existing.is_none() {
                    errors.push("category", "is required");
                }
                None
            }
        };

        let is_expense = kind == Some(TransactionType::Expense);
        let expense_existing = existing.filter(|old| old.kind == TransactionType::Expense);

        let expense_group = if is_expense {
            errors.optional(
                "expenseGroup",
                self.expense_group,
                expense_existing.and_then(|old| old.expense_group),
                |raw| raw.parse(),
            )
        } else {
            reject_if_present(&mut errors, "expenseGroup", &self.expense_group, kind);
            None
        };

        let is_shared_expense = if is_expense {
            errors.optional(
                "isSharedExpense",
                self.is_shared_expense,
                expense_existing.and_then(|old| old.is_shared_expense),
                Ok,
            )
        } else {
            reject_if_present(&mut errors, "isSharedExpense", &self.is_shared_expense, kind);
            None
        };

        let is_savings_expense = category.is_some_and(|category| category.is_savings_expense());
        let savings_pot_id = if is_savings_expense {
            errors.optional(
                "savingsPotId",
                self.savings_pot_id,
                existing.and_then(|old| old.savings_pot_id),
                parse_database_id,
            )
        } else {
            if category.is_some() && matches!(self.savings_pot_id, Some(Some(_))) {
                errors.push(
                    "savingsPotId",
                    "is only allowed on expenses in the savings category",
                );
            }
            None
        };

        let (Some(amount), Some(category), Some(description), Some(date)) =
            (amount, category, description, date)
        else {
            return Err(errors.into_error());
        };

        errors.into_result()?;

        Ok(Transaction::build(amount, category, &description, date)
            .expense_group(expense_group)
            .shared(is_shared_expense)
            .savings_pot_id(savings_pot_id)
            .recurring_expense_id(existing.and_then(|old| old.recurring_expense_id)))
    }
}

fn reject_if_present<T>(
    errors: &mut FieldErrors,
    field: &str,
    raw: &Option<Option<T>>,
    kind: Option<TransactionType>,
) {
    if kind.is_some() && matches!(raw, Some(Some(_))) {
        errors.push(field, "is only allowed on expense transactions");
    }
}
