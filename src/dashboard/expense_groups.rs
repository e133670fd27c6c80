//! Splits a month's expenses into the three budgeting groups.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::{
    category::ExpenseGroup,
    money::Amount,
    period::MonthPeriod,
    timezone::LocalTimezone,
    transaction::{Transaction, TransactionType},
};

/// The spending in one expense group.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupTotal {
    /// The sum of the group's expenses.
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    /// The group's share of all grouped expenses, 0-100.
    #[serde(with = "rust_decimal::serde::float")]
    pub percentage_of_total: Decimal,
}

/// The spending on fundamentals, split by whether it was shared.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FundamentalsTotal {
    /// The sum of the fundamentals expenses.
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    /// The part of the total split with a partner.
    #[serde(with = "rust_decimal::serde::float")]
    pub shared: Decimal,
    /// The part of the total the user paid alone.
    #[serde(with = "rust_decimal::serde::float")]
    pub individual: Decimal,
    /// The group's share of all grouped expenses, 0-100.
    #[serde(with = "rust_decimal::serde::float")]
    pub percentage_of_total: Decimal,
}

/// A month's expenses broken down by expense group.
///
/// `total_expenses` only covers grouped expenses. Expenses without a group
/// are reported in `ungrouped` so that they are not silently lost.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseGroupSummary {
    /// The month, 1-12.
    pub month: u8,
    /// The year.
    pub year: i32,
    /// Needs.
    pub fundamentals: FundamentalsTotal,
    /// Wants.
    pub fun: GroupTotal,
    /// Savings and investments.
    pub future_you: GroupTotal,
    /// Expenses that have no group.
    #[serde(with = "rust_decimal::serde::float")]
    pub ungrouped: Decimal,
    /// The sum of the three groups.
    #[serde(with = "rust_decimal::serde::float")]
    pub total_expenses: Decimal,
}

/// Total the expenses in `period` by expense group.
///
/// Fundamentals are further split into shared and individual spending. An
/// expense with no shared flag counts as individual.
pub fn aggregate(
    transactions: &[Transaction],
    period: MonthPeriod,
    timezone: LocalTimezone,
) -> ExpenseGroupSummary {
    let mut shared = Amount::ZERO;
    let mut individual = Amount::ZERO;
    let mut fun = Amount::ZERO;
    let mut future_you = Amount::ZERO;
    let mut ungrouped = Amount::ZERO;

    let expenses = transactions.iter().filter(|transaction| {
        transaction.kind == TransactionType::Expense
            && period.contains(transaction.date, timezone)
    });

    for expense in expenses {
        match expense.expense_group {
            Some(ExpenseGroup::Fundamentals) if expense.is_shared_expense == Some(true) => {
                shared += expense.amount
            }
            Some(ExpenseGroup::Fundamentals) => individual += expense.amount,
            Some(ExpenseGroup::Fun) => fun += expense.amount,
            Some(ExpenseGroup::FutureYou) => future_you += expense.amount,
            None => ungrouped += expense.amount,
        }
    }

    let fundamentals = shared + individual;
    let total_expenses = (fundamentals + fun + future_you).value();
    let percentage = |amount: Amount| percentage_of(amount.value(), total_expenses);

    ExpenseGroupSummary {
        month: period.month_number(),
        year: period.year,
        fundamentals: FundamentalsTotal {
            total: fundamentals.value(),
            shared: shared.value(),
            individual: individual.value(),
            percentage_of_total: percentage(fundamentals),
        },
        fun: GroupTotal {
            total: fun.value(),
            percentage_of_total: percentage(fun),
        },
        future_you: GroupTotal {
            total: future_you.value(),
            percentage_of_total: percentage(future_you),
        },
        ungrouped: ungrouped.value(),
        total_expenses,
    }
}

fn percentage_of(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        return Decimal::ZERO;
    }

    (part / whole * Decimal::ONE_HUNDRED).round_dp(2)
}
