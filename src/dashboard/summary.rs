//! The monthly overview and next-month forecast.

use std::cmp::Reverse;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::{
    money::Amount,
    period::MonthPeriod,
    recurring_expense::RecurringExpense,
    savings_pot::SavingsPot,
    timezone::LocalTimezone,
    transaction::{Transaction, TransactionType},
};

/// How many of the latest transactions the summary includes.
const RECENT_TRANSACTION_COUNT: usize = 5;

/// How many months before the target month are averaged when projecting income.
const INCOME_LOOKBACK_MONTHS: usize = 3;

/// Where the next-month forecast comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ForecastBasis {
    /// Sums of transactions already dated in the next month.
    Scheduled,
    /// Estimated from recurring expenses and recent income.
    Projected,
}

/// The expected totals for the month after the summarized month.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Forecast {
    /// Expected income.
    #[serde(with = "rust_decimal::serde::float")]
    pub next_month_income: Decimal,
    /// Expected expenses.
    #[serde(with = "rust_decimal::serde::float")]
    pub next_month_expenses: Decimal,
    /// Expected income minus expected expenses.
    #[serde(with = "rust_decimal::serde::float")]
    pub next_month_net: Decimal,
    /// Where the figures come from.
    pub basis: ForecastBasis,
}

/// An overview of one month of the user's finances.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    /// The summarized month, 1-12.
    pub month: u8,
    /// The summarized year.
    pub year: i32,
    /// Income received in the month.
    #[serde(with = "rust_decimal::serde::float")]
    pub monthly_income: Decimal,
    /// Money spent in the month.
    #[serde(with = "rust_decimal::serde::float")]
    pub monthly_expenses: Decimal,
    /// Income minus expenses for the month.
    #[serde(with = "rust_decimal::serde::float")]
    pub total_balance: Decimal,
    /// The sum of every savings pot's current amount.
    #[serde(with = "rust_decimal::serde::float")]
    pub total_savings: Decimal,
    /// The estimate for the following month.
    pub forecast: Forecast,
    /// The latest transactions of all time, newest first.
    pub recent_transactions: Vec<Transaction>,
}

/// Summarize `period` from the user's records.
///
/// Transactions are assigned to months using `timezone`. Only active
/// recurring expenses count towards a projected forecast.
pub fn summarize(
    period: MonthPeriod,
    transactions: &[Transaction],
    savings_pots: &[SavingsPot],
    recurring_expenses: &[RecurringExpense],
    timezone: LocalTimezone,
) -> DashboardSummary {
    let monthly_income = sum_in_period(transactions, period, TransactionType::Income, timezone);
    let monthly_expenses =
        sum_in_period(transactions, period, TransactionType::Expense, timezone);
    let total_savings: Amount = savings_pots.iter().map(|pot| pot.current_amount).sum();

    let forecast = forecast(
        period,
        monthly_income,
        transactions,
        recurring_expenses,
        timezone,
    );

    DashboardSummary {
        month: period.month_number(),
        year: period.year,
        monthly_income: monthly_income.value(),
        monthly_expenses: monthly_expenses.value(),
        total_balance: (monthly_income - monthly_expenses).value(),
        total_savings: total_savings.value(),
        forecast,
        recent_transactions: recent_transactions(transactions),
    }
}

fn forecast(
    period: MonthPeriod,
    monthly_income: Amount,
    transactions: &[Transaction],
    recurring_expenses: &[RecurringExpense],
    timezone: LocalTimezone,
) -> Forecast {
    let next_period = period.next();
    let has_scheduled = transactions
        .iter()
        .any(|transaction| next_period.contains(transaction.date, timezone));

    let (income, expenses, basis) = if has_scheduled {
        (
            sum_in_period(transactions, next_period, TransactionType::Income, timezone),
            sum_in_period(transactions, next_period, TransactionType::Expense, timezone),
            ForecastBasis::Scheduled,
        )
    } else {
        let expenses: Amount = recurring_expenses
            .iter()
            .filter(|expense| expense.is_active)
            .map(|expense| expense.amount)
            .sum();
        let income = if monthly_income.is_positive() {
            monthly_income
        } else {
            average_recent_income(period, transactions, timezone)
        };

        (income, expenses, ForecastBasis::Projected)
    };

    Forecast {
        next_month_income: income.value(),
        next_month_expenses: expenses.value(),
        next_month_net: (income - expenses).value(),
        basis,
    }
}

/// The mean income of the months before `period` that had any income.
fn average_recent_income(
    period: MonthPeriod,
    transactions: &[Transaction],
    timezone: LocalTimezone,
) -> Amount {
    let incomes: Vec<Amount> = std::iter::successors(Some(period.previous()), |month| {
        Some(month.previous())
    })
    .take(INCOME_LOOKBACK_MONTHS)
    .map(|month| sum_in_period(transactions, month, TransactionType::Income, timezone))
    .filter(|income| income.is_positive())
    .collect();

    if incomes.is_empty() {
        return Amount::ZERO;
    }

    let month_count = Decimal::from(incomes.len());
    let total: Amount = incomes.into_iter().sum();
    Amount::new(total.value() / month_count)
}

fn sum_in_period(
    transactions: &[Transaction],
    period: MonthPeriod,
    kind: TransactionType,
    timezone: LocalTimezone,
) -> Amount {
    transactions
        .iter()
        .filter(|transaction| transaction.kind == kind)
        .filter(|transaction| period.contains(transaction.date, timezone))
        .map(|transaction| transaction.amount)
        .sum()
}

fn recent_transactions(transactions: &[Transaction]) -> Vec<Transaction> {
    let mut recent = transactions.to_vec();
    recent.sort_by_key(|transaction| Reverse((transaction.date, transaction.created_at)));
    recent.truncate(RECENT_TRANSACTION_COUNT);
    recent
}
