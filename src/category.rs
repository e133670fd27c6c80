//! The closed sets of labels used to classify money movements.
//!
//! Each set is stored and sent over the wire as its kebab-case label, e.g.
//! `"credit-cards"`.

use std::fmt;

use rusqlite::{ToSql, types::ToSqlOutput};
use serde::{Serialize, Serializer};

use crate::transaction::TransactionType;

/// Define an enum whose variants map one-to-one onto text labels, with the
/// conversions needed to parse it from requests and store it in SQLite.
macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($(#[$variant_meta:meta])* $variant:ident => $label:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[allow(missing_docs)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$variant_meta])* $variant),+
        }

        impl $name {
            /// Every value, in declaration order.
            #[allow(dead_code)]
            pub const ALL: &[$name] = &[$($name::$variant),+];

            /// The text label for this value.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = String;

            fn from_str(text: &str) -> Result<Self, Self::Err> {
                match text {
                    $($label => Ok($name::$variant),)+
                    other => Err(format!(
                        "\"{other}\" is not one of: {}",
                        [$($label),+].join(", ")
                    )),
                }
            }
        }

        impl ::serde::Serialize for $name {
            fn serialize<S: ::serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D: ::serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let text = <String as ::serde::Deserialize>::deserialize(deserializer)?;
                text.parse().map_err(::serde::de::Error::custom)
            }
        }

        impl ::rusqlite::ToSql for $name {
            fn to_sql(&self) -> ::rusqlite::Result<::rusqlite::types::ToSqlOutput<'_>> {
                Ok(::rusqlite::types::ToSqlOutput::from(self.as_str()))
            }
        }

        impl ::rusqlite::types::FromSql for $name {
            fn column_result(
                value: ::rusqlite::types::ValueRef<'_>,
            ) -> ::rusqlite::types::FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|error: String| ::rusqlite::types::FromSqlError::Other(error.into()))
            }
        }
    };
}

pub(crate) use text_enum;

text_enum! {
    /// The budgeting bucket an expense belongs to.
    ExpenseGroup {
        /// Needs such as rent, groceries and utilities.
        Fundamentals => "fundamentals",
        /// Wants.
        Fun => "fun",
        /// Savings and investments.
        FutureYou => "future-you",
    }
}

text_enum! {
    /// Where income comes from.
    IncomeCategory {
        Salary => "salary",
        Freelance => "freelance",
        Investment => "investment",
        Business => "business",
        Other => "other",
    }
}

text_enum! {
    /// What money was spent on.
    ExpenseCategory {
        Food => "food",
        Transport => "transport",
        Shopping => "shopping",
        Utilities => "utilities",
        Entertainment => "entertainment",
        Healthcare => "healthcare",
        Education => "education",
        Housing => "housing",
        /// Money put aside, which is credited to a savings pot.
        Savings => "savings",
        CreditCards => "credit-cards",
        Subscriptions => "subscriptions",
        Other => "other",
    }
}

text_enum! {
    /// Where transferred money went.
    TransferCategory {
        Savings => "savings",
        Checking => "checking",
        Investment => "investment",
        Other => "other",
    }
}

/// The category of a transaction, drawn from the set that matches its type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// The category of an income transaction.
    Income(IncomeCategory),
    /// The category of an expense transaction.
    Expense(ExpenseCategory),
    /// The category of a transfer transaction.
    Transfer(TransferCategory),
}

impl Category {
    /// Parse `text` as a category of a `kind` transaction.
    ///
    /// # Errors
    /// Returns a message listing the valid labels if `text` does not belong to
    /// the set for `kind`.
    pub fn parse(kind: TransactionType, text: &str) -> Result<Self, String> {
        match kind {
            TransactionType::Income => text.parse().map(Category::Income),
            TransactionType::Expense => text.parse().map(Category::Expense),
            TransactionType::Transfer => text.parse().map(Category::Transfer),
        }
    }

    /// The text label for this category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Income(category) => category.as_str(),
            Category::Expense(category) => category.as_str(),
            Category::Transfer(category) => category.as_str(),
        }
    }

    /// Whether this is the expense category that feeds savings pots.
    pub fn is_savings_expense(&self) -> bool {
        *self == Category::Expense(ExpenseCategory::Savings)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl ToSql for Category {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use crate::transaction::TransactionType;

    use super::{Category, ExpenseCategory, ExpenseGroup, IncomeCategory, TransferCategory};

    #[test]
    fn parses_kebab_case_labels() {
        assert_eq!("credit-cards".parse(), Ok(ExpenseCategory::CreditCards));
        assert_eq!("future-you".parse(), Ok(ExpenseGroup::FutureYou));
        assert_eq!(ExpenseGroup::FutureYou.to_string(), "future-you");
    }

    #[test]
    fn category_must_match_the_transaction_type() {
        assert_eq!(
            Category::parse(TransactionType::Income, "salary"),
            Ok(Category::Income(IncomeCategory::Salary))
        );
        assert!(Category::parse(TransactionType::Expense, "salary").is_err());
        assert_eq!(
            Category::parse(TransactionType::Transfer, "checking"),
            Ok(Category::Transfer(TransferCategory::Checking))
        );
    }

    #[test]
    fn error_lists_valid_labels() {
        let error = "nonsense".parse::<ExpenseGroup>().unwrap_err();

        assert_eq!(
            error,
            "\"nonsense\" is not one of: fundamentals, fun, future-you"
        );
    }

    #[test]
    fn only_savings_expenses_feed_pots() {
        assert!(Category::Expense(ExpenseCategory::Savings).is_savings_expense());
        assert!(!Category::Transfer(TransferCategory::Savings).is_savings_expense());
        assert!(!Category::Expense(ExpenseCategory::Food).is_savings_expense());
    }

    #[test]
    fn stores_every_label_round_trip() {
        for category in ExpenseCategory::ALL {
            assert_eq!(category.as_str().parse(), Ok(*category));
        }
    }
}
