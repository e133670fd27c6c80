//! Defines the core data models and database queries for transactions.

use rusqlite::{Connection, Row, types::Type};
use serde::Serialize;
use time::OffsetDateTime;

use crate::{
    Error,
    category::{Category, ExpenseCategory, ExpenseGroup, text_enum},
    database_id::{DatabaseId, new_database_id},
    money::Amount,
};

// ============================================================================
// MODELS
// ============================================================================

text_enum! {
    /// The direction that money moved in.
    TransactionType {
        /// Money earned.
        Income => "income",
        /// Money spent.
        Expense => "expense",
        /// Money moved between the user's own accounts.
        Transfer => "transfer",
    }
}

impl Category {
    /// The type of transaction this category belongs to.
    pub fn transaction_type(&self) -> TransactionType {
        match self {
            Category::Income(_) => TransactionType::Income,
            Category::Expense(_) => TransactionType::Expense,
            Category::Transfer(_) => TransactionType::Transfer,
        }
    }
}

/// An income, expense or transfer, i.e. an event where money was earned,
/// spent or moved.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: DatabaseId,
    /// The user that owns the transaction.
    pub user_id: String,
    /// Whether money was earned, spent or moved.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// How much money changed hands. Always positive.
    pub amount: Amount,
    /// What the money was for.
    pub category: Category,
    /// A text description of what the transaction was for.
    pub description: String,
    /// When the transaction happened.
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    /// The budgeting bucket of an expense.
    pub expense_group: Option<ExpenseGroup>,
    /// Whether an expense is split with a partner.
    pub is_shared_expense: Option<bool>,
    /// The recurring expense this transaction was generated from.
    pub recurring_expense_id: Option<DatabaseId>,
    /// The savings pot a savings expense is credited to.
    pub savings_pot_id: Option<DatabaseId>,
    /// The savings pot that currently holds this transaction's amount.
    ///
    /// Set by the writer after it adds the amount to a pot, so that edits and
    /// deletes take the amount back out of the same pot.
    #[serde(skip)]
    pub credited_pot_id: Option<DatabaseId>,
    /// When the transaction was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [NewTransaction] for discoverability. The type of the
    /// transaction follows from `category`.
    pub fn build(
        amount: Amount,
        category: Category,
        description: &str,
        date: OffsetDateTime,
    ) -> NewTransaction {
        NewTransaction {
            amount,
            category,
            description: description.to_owned(),
            date,
            expense_group: None,
            is_shared_expense: None,
            recurring_expense_id: None,
            savings_pot_id: None,
        }
    }

    /// Whether this transaction adds money to a savings pot.
    pub fn is_savings_expense(&self) -> bool {
        self.category.is_savings_expense()
    }
}

/// A transaction that has not been saved yet.
///
/// Fields that only apply to expenses are ignored for other types.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// How much money changed hands.
    pub amount: Amount,
    /// What the money was for.
    pub category: Category,
    /// A text description of what the transaction was for.
    pub description: String,
    /// When the transaction happened.
    pub date: OffsetDateTime,
    /// The budgeting bucket of an expense.
    pub expense_group: Option<ExpenseGroup>,
    /// Whether an expense is split with a partner.
    pub is_shared_expense: Option<bool>,
    /// The recurring expense the transaction was generated from.
    pub recurring_expense_id: Option<DatabaseId>,
    /// The savings pot a savings expense is credited to.
    pub savings_pot_id: Option<DatabaseId>,
}

impl NewTransaction {
    /// Set the expense group.
    pub fn expense_group(mut self, expense_group: Option<ExpenseGroup>) -> Self {
        self.expense_group = expense_group;
        self
    }

    /// Mark the expense as shared, or not.
    pub fn shared(mut self, is_shared_expense: Option<bool>) -> Self {
        self.is_shared_expense = is_shared_expense;
        self
    }

    /// Link the transaction to the recurring expense it was generated from.
    pub fn recurring_expense_id(mut self, recurring_expense_id: Option<DatabaseId>) -> Self {
        self.recurring_expense_id = recurring_expense_id;
        self
    }

    /// Link a savings expense to a savings pot.
    pub fn savings_pot_id(mut self, savings_pot_id: Option<DatabaseId>) -> Self {
        self.savings_pot_id = savings_pot_id;
        self
    }

    /// The type of the transaction.
    pub fn kind(&self) -> TransactionType {
        self.category.transaction_type()
    }

    fn is_expense(&self) -> bool {
        self.kind() == TransactionType::Expense
    }

    fn expense_fields(&self) -> (Option<ExpenseGroup>, Option<bool>) {
        if self.is_expense() {
            (self.expense_group, self.is_shared_expense)
        } else {
            (None, None)
        }
    }

    fn savings_pot(&self) -> Option<DatabaseId> {
        self.savings_pot_id
            .filter(|_| self.category.is_savings_expense())
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const TRANSACTION_COLUMNS: &str = "id, user_id, type, amount, category, description, date, \
     expense_group, is_shared_expense, recurring_expense_id, savings_pot_id, created_at, \
     credited_pot_id";

/// Create a new transaction in the database.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error,
/// e.g. the savings pot or recurring expense does not exist.
pub fn create_transaction(
    new_transaction: NewTransaction,
    user_id: &str,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let (expense_group, is_shared_expense) = new_transaction.expense_fields();
    let savings_pot_id = new_transaction.savings_pot();

    let transaction = connection
        .prepare(&format!(
            "INSERT INTO \"transaction\" ({TRANSACTION_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, NULL)
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            rusqlite::params![
                new_database_id(),
                user_id,
                new_transaction.kind(),
                new_transaction.amount,
                new_transaction.category,
                new_transaction.description,
                new_transaction.date.to_offset(time::UtcOffset::UTC),
                expense_group,
                is_shared_expense,
                new_transaction.recurring_expense_id,
                savings_pot_id,
                OffsetDateTime::now_utc(),
            ],
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Retrieve a transaction owned by `user_id` from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction of the user,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(
    id: DatabaseId,
    user_id: &str,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE id = ?1 AND user_id = ?2"
        ))?
        .query_one((id, user_id), map_transaction_row)?;

    Ok(transaction)
}

/// Retrieve all of a user's transactions, oldest first.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn get_transactions(user_id: &str, connection: &Connection) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
             WHERE user_id = ?1
             ORDER BY date ASC, created_at ASC"
        ))?
        .query_map([user_id], map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// Retrieve the transactions generated from a recurring expense.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn get_transactions_for_recurring_expense(
    recurring_expense_id: DatabaseId,
    user_id: &str,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
             WHERE recurring_expense_id = ?1 AND user_id = ?2
             ORDER BY date ASC"
        ))?
        .query_map((recurring_expense_id, user_id), map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// Retrieve a user's expenses in `category`, newest first.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn get_expenses_in_category(
    category: ExpenseCategory,
    user_id: &str,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
             WHERE user_id = ?1 AND type = ?2 AND category = ?3
             ORDER BY date DESC, created_at DESC"
        ))?
        .query_map(
            (user_id, TransactionType::Expense, category),
            map_transaction_row,
        )?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// Replace the stored fields of a transaction.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction of the user,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_transaction(
    id: DatabaseId,
    user_id: &str,
    new_transaction: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let (expense_group, is_shared_expense) = new_transaction.expense_fields();
    let savings_pot_id = new_transaction.savings_pot();

    let transaction = connection
        .prepare(&format!(
            "UPDATE \"transaction\"
             SET type = ?3, amount = ?4, category = ?5, description = ?6, date = ?7,
                 expense_group = ?8, is_shared_expense = ?9, recurring_expense_id = ?10,
                 savings_pot_id = ?11
             WHERE id = ?1 AND user_id = ?2
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            rusqlite::params![
                id,
                user_id,
                new_transaction.kind(),
                new_transaction.amount,
                new_transaction.category,
                new_transaction.description,
                new_transaction.date.to_offset(time::UtcOffset::UTC),
                expense_group,
                is_shared_expense,
                new_transaction.recurring_expense_id,
                savings_pot_id,
            ],
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Record which savings pot holds the amount of transaction `id`.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn set_credited_pot(
    id: DatabaseId,
    user_id: &str,
    pot_id: Option<DatabaseId>,
    connection: &Connection,
) -> Result<(), Error> {
    connection.execute(
        "UPDATE \"transaction\" SET credited_pot_id = ?3 WHERE id = ?1 AND user_id = ?2",
        (id, user_id, pot_id),
    )?;

    Ok(())
}

/// Delete a transaction, returning whether it existed.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn delete_transaction(
    id: DatabaseId,
    user_id: &str,
    connection: &Connection,
) -> Result<bool, Error> {
    let rows_affected = connection.execute(
        "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
        (id, user_id),
    )?;

    Ok(rows_affected > 0)
}

/// Create the transaction table in the database.
///
/// Must run after the savings pot and recurring expense tables are created.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id BLOB PRIMARY KEY,
                user_id TEXT NOT NULL,
                type TEXT NOT NULL,
                amount TEXT NOT NULL,
                category TEXT NOT NULL,
                description TEXT NOT NULL,
                date TEXT NOT NULL,
                expense_group TEXT,
                is_shared_expense INTEGER,
                recurring_expense_id BLOB,
                savings_pot_id BLOB,
                created_at TEXT NOT NULL,
                credited_pot_id BLOB,
                FOREIGN KEY(recurring_expense_id) REFERENCES recurring_expense(id) ON DELETE SET NULL,
                FOREIGN KEY(savings_pot_id) REFERENCES savings_pot(id) ON DELETE SET NULL,
                FOREIGN KEY(credited_pot_id) REFERENCES savings_pot(id) ON DELETE SET NULL
                )",
        (),
    )?;

    // Used by the dashboard and the transaction list.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date);",
        (),
    )?;

    // Used by the recurring expense generator.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_recurring_expense
         ON \"transaction\"(recurring_expense_id);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let kind: TransactionType = row.get(2)?;
    let category_text: String = row.get(4)?;
    let category = Category::parse(kind, &category_text)
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, error.into()))?;

    Ok(Transaction {
        id: row.get(0)?,
        user_id: row.get(1)?,
        kind,
        amount: row.get(3)?,
        category,
        description: row.get(5)?,
        date: row.get(6)?,
        expense_group: row.get(7)?,
        is_shared_expense: row.get(8)?,
        recurring_expense_id: row.get(9)?,
        savings_pot_id: row.get(10)?,
        created_at: row.get(11)?,
        credited_pot_id: row.get(12)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod database_tests {
    use time::macros::datetime;
    use uuid::Uuid;

    use crate::{
        Error,
        category::{Category, ExpenseCategory, ExpenseGroup, IncomeCategory},
        money::Amount,
        test_utils::{amount, must_create_test_connection},
        transaction::TransactionType,
        user::DEFAULT_USER_ID,
    };

    use super::{
        Transaction, create_transaction, delete_transaction, get_expenses_in_category,
        get_transaction, get_transactions, update_transaction,
    };

    #[test]
    fn create_returns_the_exact_amount() {
        let connection = must_create_test_connection();

        let transaction = create_transaction(
            Transaction::build(
                amount("1234567.89"),
                Category::Income(IncomeCategory::Salary),
                "Pay day",
                datetime!(2025-03-01 00:00 UTC),
            ),
            DEFAULT_USER_ID,
            &connection,
        )
        .unwrap();

        assert_eq!(transaction.amount, amount("1234567.89"));
        assert_eq!(transaction.kind, TransactionType::Income);
        assert_eq!(
            get_transaction(transaction.id, DEFAULT_USER_ID, &connection),
            Ok(transaction)
        );
    }

    #[test]
    fn largest_amount_reads_back() {
        let connection = must_create_test_connection();
        let build = |value| {
            Transaction::build(
                value,
                Category::Income(IncomeCategory::Salary),
                "Lottery",
                datetime!(2025-03-01 00:00 UTC),
            )
        };

        let largest = create_transaction(build(Amount::MAX), DEFAULT_USER_ID, &connection)
            .unwrap();
        let too_large = create_transaction(
            build(Amount::MAX + amount("0.01")),
            DEFAULT_USER_ID,
            &connection,
        );

        assert!(too_large.is_err(), "want an error, got {too_large:?}");
        let transactions = get_transactions(DEFAULT_USER_ID, &connection).unwrap();
        assert_eq!(transactions, vec![largest]);
        assert_eq!(transactions[0].amount.to_string(), "999999999999999.99");
    }

    #[test]
    fn expense_fields_are_dropped_for_income() {
        let connection = must_create_test_connection();

        let transaction = create_transaction(
            Transaction::build(
                amount("10.00"),
                Category::Income(IncomeCategory::Other),
                "Refund",
                datetime!(2025-03-01 00:00 UTC),
            )
            .expense_group(Some(ExpenseGroup::Fun))
            .shared(Some(true)),
            DEFAULT_USER_ID,
            &connection,
        )
        .unwrap();

        assert_eq!(transaction.expense_group, None);
        assert_eq!(transaction.is_shared_expense, None);
    }

    #[test]
    fn get_is_scoped_to_the_owner() {
        let connection = must_create_test_connection();
        let transaction = create_transaction(
            Transaction::build(
                amount("5.00"),
                Category::Expense(ExpenseCategory::Food),
                "Lunch",
                datetime!(2025-03-01 00:00 UTC),
            ),
            DEFAULT_USER_ID,
            &connection,
        )
        .unwrap();

        assert_eq!(
            get_transaction(transaction.id, "someone-else", &connection),
            Err(Error::NotFound)
        );
        assert_eq!(
            get_transaction(Uuid::new_v4(), DEFAULT_USER_ID, &connection),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn lists_transactions_by_date() {
        let connection = must_create_test_connection();
        for (description, date) in [
            ("second", datetime!(2025-03-02 00:00 UTC)),
            ("third", datetime!(2025-03-03 00:00 UTC)),
            ("first", datetime!(2025-03-01 00:00 UTC)),
        ] {
            create_transaction(
                Transaction::build(
                    amount("1.00"),
                    Category::Expense(ExpenseCategory::Food),
                    description,
                    date,
                ),
                DEFAULT_USER_ID,
                &connection,
            )
            .unwrap();
        }

        let descriptions: Vec<_> = get_transactions(DEFAULT_USER_ID, &connection)
            .unwrap()
            .into_iter()
            .map(|transaction| transaction.description)
            .collect();

        assert_eq!(descriptions, ["first", "second", "third"]);
    }

    #[test]
    fn update_replaces_fields() {
        let connection = must_create_test_connection();
        let transaction = create_transaction(
            Transaction::build(
                amount("5.00"),
                Category::Expense(ExpenseCategory::Food),
                "Lunch",
                datetime!(2025-03-01 00:00 UTC),
            ),
            DEFAULT_USER_ID,
            &connection,
        )
        .unwrap();

        let updated = update_transaction(
            transaction.id,
            DEFAULT_USER_ID,
            Transaction::build(
                amount("7.50"),
                Category::Expense(ExpenseCategory::Entertainment),
                "Movie",
                datetime!(2025-03-02 00:00 UTC),
            ),
            &connection,
        )
        .unwrap();

        assert_eq!(updated.id, transaction.id);
        assert_eq!(updated.amount, amount("7.50"));
        assert_eq!(updated.description, "Movie");
        assert_eq!(updated.created_at, transaction.created_at);
    }

    #[test]
    fn update_missing_transaction_is_not_found() {
        let connection = must_create_test_connection();

        let result = update_transaction(
            Uuid::new_v4(),
            DEFAULT_USER_ID,
            Transaction::build(
                amount("7.50"),
                Category::Expense(ExpenseCategory::Food),
                "Movie",
                datetime!(2025-03-02 00:00 UTC),
            ),
            &connection,
        );

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn delete_reports_whether_the_transaction_existed() {
        let connection = must_create_test_connection();
        let transaction = create_transaction(
            Transaction::build(
                amount("5.00"),
                Category::Expense(ExpenseCategory::Food),
                "Lunch",
                datetime!(2025-03-01 00:00 UTC),
            ),
            DEFAULT_USER_ID,
            &connection,
        )
        .unwrap();

        assert_eq!(delete_transaction(transaction.id, DEFAULT_USER_ID, &connection), Ok(true));
        assert_eq!(delete_transaction(transaction.id, DEFAULT_USER_ID, &connection), Ok(false));
    }

    #[test]
    fn finds_expenses_by_category_newest_first() {
        let connection = must_create_test_connection();
        for (category, date) in [
            (ExpenseCategory::CreditCards, datetime!(2025-03-01 00:00 UTC)),
            (ExpenseCategory::Food, datetime!(2025-03-02 00:00 UTC)),
            (ExpenseCategory::CreditCards, datetime!(2025-03-03 00:00 UTC)),
        ] {
            create_transaction(
                Transaction::build(amount("1.00"), Category::Expense(category), "Card", date),
                DEFAULT_USER_ID,
                &connection,
            )
            .unwrap();
        }

        let dates: Vec<_> =
            get_expenses_in_category(ExpenseCategory::CreditCards, DEFAULT_USER_ID, &connection)
                .unwrap()
                .into_iter()
                .map(|transaction| transaction.date)
                .collect();

        assert_eq!(
            dates,
            [
                datetime!(2025-03-03 00:00 UTC),
                datetime!(2025-03-01 00:00 UTC)
            ]
        );
    }
}
