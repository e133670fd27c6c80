//! Turns recurring expenses into the transactions for a month.

use time::OffsetDateTime;

use crate::{
    Error, FieldError,
    category::Category,
    period::MonthPeriod,
    recurring_expense::{RecurringExpense, get_active_recurring_expenses},
    timezone::LocalTimezone,
    transaction::{Transaction, TransactionWriter, get_transactions_for_recurring_expense},
};

/// Create the transactions for `period` from the user's active recurring
/// expenses, returning the ones created by this call.
///
/// A recurring expense that already has a transaction in `period` is skipped,
/// so calling this again for the same month creates nothing. Transactions are
/// saved with `writer`, so savings expenses also top up their savings pot.
///
/// Generating one expense failing does not stop the others: the error is
/// logged and that expense is skipped.
///
/// # Errors
/// Returns an [Error::SqlError] if the recurring expenses cannot be read.
pub fn generate_recurring_transactions(
    period: MonthPeriod,
    writer: &TransactionWriter,
) -> Result<Vec<Transaction>, Error> {
    let recurring_expenses = get_active_recurring_expenses(writer.user_id(), writer.connection())
        .inspect_err(|error| tracing::error!("could not get recurring expenses: {error}"))?;

    let mut created = Vec::new();

    for recurring_expense in recurring_expenses {
        match generate_one(&recurring_expense, period, writer) {
            Ok(Some(transaction)) => {
                tracing::debug!(
                    "generated transaction {} from recurring expense {}",
                    transaction.id,
                    recurring_expense.id
                );
                created.push(transaction);
            }
            Ok(None) => {
                tracing::debug!(
                    "recurring expense {} already generated for {:?} {}",
                    recurring_expense.id,
                    period.month,
                    period.year
                );
            }
            Err(error) => {
                tracing::warn!(
                    "skipping recurring expense {} for {:?} {}: {error}",
                    recurring_expense.id,
                    period.month,
                    period.year
                );
            }
        }
    }

    Ok(created)
}

fn generate_one(
    recurring_expense: &RecurringExpense,
    period: MonthPeriod,
    writer: &TransactionWriter,
) -> Result<Option<Transaction>, Error> {
    let timezone = writer.timezone();

    let already_generated = get_transactions_for_recurring_expense(
        recurring_expense.id,
        writer.user_id(),
        writer.connection(),
    )?
    .iter()
    .any(|transaction| period.contains(transaction.date, timezone));

    if already_generated {
        return Ok(None);
    }

    let date = charge_date(recurring_expense.day_of_month, period, timezone)?;

    let new_transaction = Transaction::build(
        recurring_expense.amount,
        Category::Expense(recurring_expense.category),
        &recurring_expense.description,
        date,
    )
    .expense_group(Some(recurring_expense.expense_group))
    .shared(Some(recurring_expense.is_shared_expense))
    .recurring_expense_id(Some(recurring_expense.id));

    writer.insert(new_transaction).map(Some)
}

/// Local midnight on `day_of_month` of `period` in `timezone`, in UTC.
fn charge_date(
    day_of_month: u8,
    period: MonthPeriod,
    timezone: LocalTimezone,
) -> Result<OffsetDateTime, Error> {
    let date = period.date_on(day_of_month).ok_or_else(|| {
        Error::Validation(vec![FieldError::new(
            "year",
            "is outside the supported range",
        )])
    })?;

    Ok(timezone.midnight_on(date))
}

#[cfg(test)]
mod tests {
    use time::{
        Month,
        macros::{datetime, offset},
    };

    use crate::{
        PotMatching,
        category::ExpenseGroup,
        period::MonthPeriod,
        recurring_expense::core::tests::must_create_recurring_expense,
        savings_pot::{NewSavingsPot, create_savings_pot, get_savings_pot},
        test_utils::{amount, must_create_test_connection},
        timezone::LocalTimezone,
        transaction::{TransactionWriter, get_transactions},
        user::DEFAULT_USER_ID,
    };

    use super::generate_recurring_transactions;

    #[test]
    fn generates_active_expenses_once_per_month() {
        let connection = must_create_test_connection();
        let rent = must_create_recurring_expense("Rent", "1500", "housing", 1, true, &connection);
        must_create_recurring_expense("Gym", "60", "healthcare", 5, false, &connection);
        let writer = TransactionWriter::new(
            &connection,
            DEFAULT_USER_ID,
            PotMatching::NameFallback,
            LocalTimezone::UTC,
        );
        let march = MonthPeriod::new(2025, Month::March);

        let first = generate_recurring_transactions(march, &writer).unwrap();
        let second = generate_recurring_transactions(march, &writer).unwrap();

        assert_eq!(first.len(), 1);
        assert_eq!(first[0].recurring_expense_id, Some(rent.id));
        assert_eq!(first[0].amount, amount("1500"));
        assert_eq!(first[0].date, datetime!(2025-03-01 00:00 UTC));
        assert_eq!(first[0].expense_group, Some(ExpenseGroup::Fundamentals));
        assert_eq!(first[0].is_shared_expense, Some(false));
        assert_eq!(second, vec![]);
        assert_eq!(get_transactions(DEFAULT_USER_ID, &connection).unwrap().len(), 1);
    }

    #[test]
    fn next_month_is_generated_separately() {
        let connection = must_create_test_connection();
        must_create_recurring_expense("Rent", "1500", "housing", 1, true, &connection);
        let writer = TransactionWriter::new(
            &connection,
            DEFAULT_USER_ID,
            PotMatching::NameFallback,
            LocalTimezone::UTC,
        );

        generate_recurring_transactions(MonthPeriod::new(2025, Month::March), &writer).unwrap();
        let april =
            generate_recurring_transactions(MonthPeriod::new(2025, Month::April), &writer).unwrap();

        assert_eq!(april.len(), 1);
        assert_eq!(april[0].date, datetime!(2025-04-01 00:00 UTC));
    }

    #[test]
    fn clamps_day_to_end_of_short_month() {
        let connection = must_create_test_connection();
        must_create_recurring_expense("Insurance", "80", "other", 31, true, &connection);
        let writer = TransactionWriter::new(
            &connection,
            DEFAULT_USER_ID,
            PotMatching::NameFallback,
            LocalTimezone::UTC,
        );

        let created =
            generate_recurring_transactions(MonthPeriod::new(2025, Month::February), &writer)
                .unwrap();

        assert_eq!(created[0].date, datetime!(2025-02-28 00:00 UTC));
    }

    #[test]
    fn dates_are_local_midnight() {
        let connection = must_create_test_connection();
        must_create_recurring_expense("Rent", "1500", "housing", 1, true, &connection);
        let writer = TransactionWriter::new(
            &connection,
            DEFAULT_USER_ID,
            PotMatching::NameFallback,
            offset!(+13).into(),
        );

        let created =
            generate_recurring_transactions(MonthPeriod::new(2025, Month::March), &writer)
                .unwrap();
        let again =
            generate_recurring_transactions(MonthPeriod::new(2025, Month::March), &writer)
                .unwrap();

        assert_eq!(created[0].date, datetime!(2025-02-28 11:00 UTC));
        assert_eq!(again, vec![]);
    }

    #[test]
    fn stays_idempotent_across_daylight_saving_change() {
        let connection = must_create_test_connection();
        must_create_recurring_expense("Rent", "1500", "housing", 1, true, &connection);
        must_create_recurring_expense("Insurance", "80", "other", 30, true, &connection);
        let writer = TransactionWriter::new(
            &connection,
            DEFAULT_USER_ID,
            PotMatching::NameFallback,
            LocalTimezone::from_name("Pacific/Auckland").unwrap(),
        );
        let march = MonthPeriod::new(2025, Month::March);
        let april = MonthPeriod::new(2025, Month::April);

        // Daylight saving in Auckland ends on 6 April 2025 (UTC+13 to UTC+12).
        let created = generate_recurring_transactions(april, &writer).unwrap();
        generate_recurring_transactions(march, &writer).unwrap();
        let april_again = generate_recurring_transactions(april, &writer).unwrap();
        let march_again = generate_recurring_transactions(march, &writer).unwrap();

        let dates: Vec<_> = created.iter().map(|transaction| transaction.date).collect();
        assert_eq!(
            dates,
            [datetime!(2025-03-31 11:00 UTC), datetime!(2025-04-29 12:00 UTC)]
        );
        assert_eq!(april_again, vec![]);
        assert_eq!(march_again, vec![]);
        assert_eq!(get_transactions(DEFAULT_USER_ID, &connection).unwrap().len(), 4);
    }

    #[test]
    fn savings_expenses_top_up_matching_pot() {
        let connection = must_create_test_connection();
        let pot = create_savings_pot(
            NewSavingsPot::new("Vacation", amount("2000")),
            DEFAULT_USER_ID,
            &connection,
        )
        .unwrap();
        must_create_recurring_expense("Vacation fund", "250", "savings", 15, true, &connection);
        let writer = TransactionWriter::new(
            &connection,
            DEFAULT_USER_ID,
            PotMatching::NameFallback,
            LocalTimezone::UTC,
        );

        generate_recurring_transactions(MonthPeriod::new(2025, Month::June), &writer).unwrap();

        let pot = get_savings_pot(pot.id, DEFAULT_USER_ID, &connection).unwrap();
        assert_eq!(pot.current_amount, amount("250"));
    }

    #[test]
    fn one_failure_does_not_stop_the_batch() {
        let connection = must_create_test_connection();
        let rent = must_create_recurring_expense("Rent", "1500", "housing", 1, true, &connection);
        must_create_recurring_expense("Power", "120", "utilities", 10, true, &connection);
        connection
            .execute_batch(&format!(
                "CREATE TRIGGER reject_rent BEFORE INSERT ON \"transaction\"
                 WHEN NEW.description = '{}'
                 BEGIN SELECT RAISE(FAIL, 'rejected'); END;",
                rent.description
            ))
            .unwrap();
        let writer = TransactionWriter::new(
            &connection,
            DEFAULT_USER_ID,
            PotMatching::NameFallback,
            LocalTimezone::UTC,
        );

        let created =
            generate_recurring_transactions(MonthPeriod::new(2025, Month::May), &writer).unwrap();

        assert_eq!(created.len(), 1);
        assert_eq!(created[0].description, "Power");
    }
}
