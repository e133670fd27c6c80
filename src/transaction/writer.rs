//! Writes transactions and applies their side effects on savings pots.

use rusqlite::Connection;

use crate::{
    Error, FieldError, PotMatching,
    database_id::DatabaseId,
    savings_pot::{get_savings_pot, reconcile_savings_pots},
    timezone::LocalTimezone,
    transaction::{
        NewTransaction, Transaction, TransactionForm, create_transaction, delete_transaction,
        get_transaction, set_credited_pot, update_transaction,
    },
};

/// Creates, edits and deletes a user's transactions.
///
/// Every write of a savings expense also moves its amount in or out of the
/// linked savings pot. That second step is best effort: if it fails, the
/// error is logged and the transaction write still counts as a success.
#[derive(Debug, Clone, Copy)]
pub struct TransactionWriter<'a> {
    connection: &'a Connection,
    user_id: &'a str,
    pot_matching: PotMatching,
    timezone: LocalTimezone,
}

impl<'a> TransactionWriter<'a> {
    /// Create a writer acting on behalf of `user_id`.
    ///
    /// `timezone` is used to interpret plain dates in forms.
    pub fn new(
        connection: &'a Connection,
        user_id: &'a str,
        pot_matching: PotMatching,
        timezone: LocalTimezone,
    ) -> Self {
        Self {
            connection,
            user_id,
            pot_matching,
            timezone,
        }
    }

    /// The connection the writer saves to.
    pub fn connection(&self) -> &'a Connection {
        self.connection
    }

    /// The owner of the transactions.
    pub fn user_id(&self) -> &'a str {
        self.user_id
    }

    /// The timezone used to interpret plain dates and months.
    pub fn timezone(&self) -> LocalTimezone {
        self.timezone
    }

    /// Validate and save a new transaction.
    ///
    /// # Errors
    /// Returns [Error::Validation] if the form is invalid or names a savings
    /// pot that does not exist, or [Error::SqlError] if the write fails.
    pub fn create(&self, form: TransactionForm) -> Result<Transaction, Error> {
        let new_transaction = form.validate(None, self.timezone)?;
        self.insert(new_transaction)
    }

    /// Save an already validated transaction.
    ///
    /// # Errors
    /// Returns [Error::Validation] if the transaction names a savings pot that
    /// does not exist, or [Error::SqlError] if the write fails.
    pub fn insert(&self, new_transaction: NewTransaction) -> Result<Transaction, Error> {
        self.check_savings_pot(&new_transaction)?;

        let transaction = create_transaction(new_transaction, self.user_id, self.connection)
            .inspect_err(|error| tracing::error!("could not create transaction: {error}"))?;

        Ok(self.reconcile(None, transaction))
    }

    /// Apply a partial edit to a transaction.
    ///
    /// The form is merged over the stored transaction and the result is
    /// validated as a whole.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if the transaction does not exist,
    /// [Error::Validation] if the merged transaction is invalid, or
    /// [Error::SqlError] if the write fails.
    pub fn update(&self, id: DatabaseId, form: TransactionForm) -> Result<Transaction, Error> {
        let existing = get_transaction(id, self.user_id, self.connection)?;
        let new_transaction = form.validate(Some(&existing), self.timezone)?;
        self.check_savings_pot(&new_transaction)?;

        let updated = update_transaction(id, self.user_id, new_transaction, self.connection)
            .inspect_err(|error| tracing::error!("could not update transaction {id}: {error}"))?;

        Ok(self.reconcile(Some(&existing), updated))
    }

    /// Delete a transaction, returning whether it existed.
    ///
    /// # Errors
    /// Returns [Error::SqlError] if the delete fails.
    pub fn delete(&self, id: DatabaseId) -> Result<bool, Error> {
        let existing = match get_transaction(id, self.user_id, self.connection) {
            Ok(transaction) => transaction,
            Err(Error::NotFound) => return Ok(false),
            Err(error) => return Err(error),
        };

        let deleted = delete_transaction(id, self.user_id, self.connection)
            .inspect_err(|error| tracing::error!("could not delete transaction {id}: {error}"))?;

        if deleted
            && let Err(error) = reconcile_savings_pots(
                Some(&existing),
                None,
                self.user_id,
                self.pot_matching,
                self.connection,
            )
        {
            tracing::error!(
                "transaction {id} was deleted but its savings pot could not be updated: {error}"
            );
        }

        Ok(deleted)
    }

    fn check_savings_pot(&self, new_transaction: &NewTransaction) -> Result<(), Error> {
        let Some(pot_id) = new_transaction.savings_pot_id else {
            return Ok(());
        };

        match get_savings_pot(pot_id, self.user_id, self.connection) {
            Ok(_) => Ok(()),
            Err(Error::NotFound) => Err(Error::Validation(vec![FieldError::new(
                "savingsPotId",
                format!("no savings pot with ID {pot_id}"),
            )])),
            Err(error) => Err(error),
        }
    }

    /// Move the savings pot effect from `old` to `saved`, returning `saved`
    /// with the pot that now holds its amount.
    fn reconcile(&self, old: Option<&Transaction>, mut saved: Transaction) -> Transaction {
        let credited_pot_id = match reconcile_savings_pots(
            old,
            Some(&saved),
            self.user_id,
            self.pot_matching,
            self.connection,
        ) {
            Ok(credited_pot_id) => credited_pot_id,
            Err(error) => {
                tracing::error!(
                    "transaction {} was saved but its savings pot could not be updated: {error}",
                    saved.id
                );
                return saved;
            }
        };

        if saved.credited_pot_id == credited_pot_id {
            return saved;
        }

        match set_credited_pot(saved.id, self.user_id, credited_pot_id, self.connection) {
            Ok(()) => saved.credited_pot_id = credited_pot_id,
            Err(error) => tracing::error!(
                "could not record the savings pot of transaction {}: {error}",
                saved.id
            ),
        }

        saved
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;
    use uuid::Uuid;

    use crate::{
        Error, PotMatching,
        category::{Category, ExpenseCategory},
        savings_pot::{
            NewSavingsPot, SavingsPot, create_savings_pot, delete_savings_pot, get_savings_pot,
        },
        test_utils::{amount, must_create_test_connection},
        timezone::LocalTimezone,
        transaction::{Transaction, TransactionForm, get_transaction},
        user::DEFAULT_USER_ID,
    };

    use super::TransactionWriter;

    fn vacation_pot(connection: &rusqlite::Connection) -> SavingsPot {
        create_savings_pot(
            NewSavingsPot::new("Vacation", amount("2000.00")).current_amount(amount("100.00")),
            DEFAULT_USER_ID,
            connection,
        )
        .unwrap()
    }

    fn savings_form(description: &str, amount: &str) -> TransactionForm {
        TransactionForm {
            kind: Some("expense".to_owned()),
            amount: Some(amount.to_owned()),
            category: Some("savings".to_owned()),
            description: Some(description.to_owned()),
            date: Some("2025-03-15".to_owned()),
            expense_group: Some(Some("future-you".to_owned())),
            ..Default::default()
        }
    }

    #[track_caller]
    fn assert_pot_amount(pot: &SavingsPot, want: &str, connection: &rusqlite::Connection) {
        let got = get_savings_pot(pot.id, DEFAULT_USER_ID, connection)
            .unwrap()
            .current_amount;
        assert_eq!(got, amount(want), "want pot amount {want}, got {got}");
    }

    #[test]
    fn vacation_top_up_round_trip() {
        let connection = must_create_test_connection();
        let pot = vacation_pot(&connection);
        let writer = TransactionWriter::new(
            &connection,
            DEFAULT_USER_ID,
            PotMatching::NameFallback,
            LocalTimezone::UTC,
        );

        let transaction = writer
            .create(savings_form("Vacation fund top-up", "50.00"))
            .unwrap();
        assert_pot_amount(&pot, "150.00", &connection);

        assert_eq!(writer.delete(transaction.id), Ok(true));
        assert_pot_amount(&pot, "100.00", &connection);
    }

    #[test]
    fn update_reverses_then_reapplies() {
        let connection = must_create_test_connection();
        let pot = vacation_pot(&connection);
        let writer = TransactionWriter::new(
            &connection,
            DEFAULT_USER_ID,
            PotMatching::NameFallback,
            LocalTimezone::UTC,
        );
        let transaction = writer
            .create(savings_form("Vacation fund top-up", "50.00"))
            .unwrap();

        writer
            .update(
                transaction.id,
                TransactionForm {
                    amount: Some("80.00".to_owned()),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_pot_amount(&pot, "180.00", &connection);
    }

    #[test]
    fn changing_category_away_from_savings_takes_the_money_back() {
        let connection = must_create_test_connection();
        let pot = vacation_pot(&connection);
        let writer = TransactionWriter::new(
            &connection,
            DEFAULT_USER_ID,
            PotMatching::NameFallback,
            LocalTimezone::UTC,
        );
        let transaction = writer
            .create(savings_form("Vacation fund top-up", "50.00"))
            .unwrap();

        writer
            .update(
                transaction.id,
                TransactionForm {
                    category: Some("entertainment".to_owned()),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_pot_amount(&pot, "100.00", &connection);
    }

    #[test]
    fn explicit_pot_link() {
        let connection = must_create_test_connection();
        let pot = vacation_pot(&connection);
        let writer = TransactionWriter::new(
            &connection,
            DEFAULT_USER_ID,
            PotMatching::ExplicitOnly,
            LocalTimezone::UTC,
        );

        let transaction = writer
            .create(TransactionForm {
                savings_pot_id: Some(Some(pot.id.to_string())),
                ..savings_form("Monthly savings", "25.00")
            })
            .unwrap();

        assert_eq!(transaction.savings_pot_id, Some(pot.id));
        assert_pot_amount(&pot, "125.00", &connection);
    }

    #[test]
    fn records_the_pot_found_by_name() {
        let connection = must_create_test_connection();
        let pot = vacation_pot(&connection);
        let writer = TransactionWriter::new(
            &connection,
            DEFAULT_USER_ID,
            PotMatching::NameFallback,
            LocalTimezone::UTC,
        );

        let transaction = writer
            .create(savings_form("Vacation fund top-up", "50.00"))
            .unwrap();

        assert_eq!(transaction.savings_pot_id, None);
        assert_eq!(transaction.credited_pot_id, Some(pot.id));
        assert_eq!(
            get_transaction(transaction.id, DEFAULT_USER_ID, &connection)
                .unwrap()
                .credited_pot_id,
            Some(pot.id)
        );
    }

    #[test]
    fn deleting_the_linked_pot_does_not_move_money_to_a_name_match() {
        let connection = must_create_test_connection();
        let vacation = vacation_pot(&connection);
        let car = create_savings_pot(
            NewSavingsPot::new("Car", amount("5000.00")),
            DEFAULT_USER_ID,
            &connection,
        )
        .unwrap();
        let writer = TransactionWriter::new(
            &connection,
            DEFAULT_USER_ID,
            PotMatching::NameFallback,
            LocalTimezone::UTC,
        );
        let transaction = writer
            .create(TransactionForm {
                savings_pot_id: Some(Some(car.id.to_string())),
                ..savings_form("Vacation fund top-up", "50.00")
            })
            .unwrap();
        assert_pot_amount(&vacation, "100.00", &connection);

        assert_eq!(delete_savings_pot(car.id, DEFAULT_USER_ID, &connection), Ok(true));
        assert_eq!(writer.delete(transaction.id), Ok(true));

        assert_pot_amount(&vacation, "100.00", &connection);
    }

    #[test]
    fn pot_created_after_the_transaction_is_not_debited() {
        let connection = must_create_test_connection();
        let writer = TransactionWriter::new(
            &connection,
            DEFAULT_USER_ID,
            PotMatching::NameFallback,
            LocalTimezone::UTC,
        );
        let transaction = writer
            .create(savings_form("Vacation fund top-up", "50.00"))
            .unwrap();
        assert_eq!(transaction.credited_pot_id, None);
        let pot = vacation_pot(&connection);

        assert_eq!(writer.delete(transaction.id), Ok(true));

        assert_pot_amount(&pot, "100.00", &connection);
    }

    #[test]
    fn pot_overflow_keeps_the_pot_unchanged() {
        let connection = must_create_test_connection();
        let pot = create_savings_pot(
            NewSavingsPot::new("Vacation", amount("2000.00"))
                .current_amount(amount("999999999999999.00")),
            DEFAULT_USER_ID,
            &connection,
        )
        .unwrap();
        let writer = TransactionWriter::new(
            &connection,
            DEFAULT_USER_ID,
            PotMatching::NameFallback,
            LocalTimezone::UTC,
        );

        let transaction = writer
            .create(savings_form("Vacation fund top-up", "50.00"))
            .unwrap();

        assert_eq!(transaction.credited_pot_id, None);
        assert_pot_amount(&pot, "999999999999999.00", &connection);
        assert_eq!(writer.delete(transaction.id), Ok(true));
        assert_pot_amount(&pot, "999999999999999.00", &connection);
    }

    #[test]
    fn unknown_pot_is_a_validation_error() {
        let connection = must_create_test_connection();
        let writer = TransactionWriter::new(
            &connection,
            DEFAULT_USER_ID,
            PotMatching::NameFallback,
            LocalTimezone::UTC,
        );

        let result = writer.create(TransactionForm {
            savings_pot_id: Some(Some(Uuid::new_v4().to_string())),
            ..savings_form("Monthly savings", "25.00")
        });

        let Err(Error::Validation(errors)) = result else {
            panic!("expected a validation error");
        };
        assert_eq!(errors[0].field, "savingsPotId");
    }

    #[test]
    fn no_matching_pot_still_saves() {
        let connection = must_create_test_connection();
        let pot = vacation_pot(&connection);
        let writer = TransactionWriter::new(
            &connection,
            DEFAULT_USER_ID,
            PotMatching::NameFallback,
            LocalTimezone::UTC,
        );

        let transaction = writer
            .create(savings_form("Rainy day", "25.00"))
            .unwrap();

        assert!(get_transaction(transaction.id, DEFAULT_USER_ID, &connection).is_ok());
        assert_pot_amount(&pot, "100.00", &connection);
    }

    #[test]
    fn pot_failure_does_not_fail_the_write() {
        let connection = must_create_test_connection();
        vacation_pot(&connection);
        connection
            .execute_batch(
                "CREATE TRIGGER fail_pot_update BEFORE UPDATE ON savings_pot
                 BEGIN SELECT RAISE(FAIL, 'pot update failed'); END;",
            )
            .unwrap();
        let writer = TransactionWriter::new(
            &connection,
            DEFAULT_USER_ID,
            PotMatching::NameFallback,
            LocalTimezone::UTC,
        );

        let result = writer.create(savings_form("Vacation fund top-up", "50.00"));

        assert!(result.is_ok(), "want the transaction to be saved, got {result:?}");
    }

    #[test]
    fn insert_accepts_built_transactions() {
        let connection = must_create_test_connection();
        let pot = vacation_pot(&connection);
        let writer = TransactionWriter::new(
            &connection,
            DEFAULT_USER_ID,
            PotMatching::NameFallback,
            LocalTimezone::UTC,
        );

        writer
            .insert(Transaction::build(
                amount("10.00"),
                Category::Expense(ExpenseCategory::Savings),
                "vacation",
                datetime!(2025-03-01 00:00 UTC),
            ))
            .unwrap();

        assert_pot_amount(&pot, "110.00", &connection);
    }

    #[test]
    fn deleting_missing_transaction_returns_false() {
        let connection = must_create_test_connection();
        let writer = TransactionWriter::new(
            &connection,
            DEFAULT_USER_ID,
            PotMatching::NameFallback,
            LocalTimezone::UTC,
        );

        assert_eq!(writer.delete(Uuid::new_v4()), Ok(false));
    }
}
