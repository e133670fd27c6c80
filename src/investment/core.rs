//! Defines the investment model, its form and database queries.

use std::str::FromStr;

use rusqlite::{Connection, Row, types::Type};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    category::text_enum,
    database_id::{DatabaseId, new_database_id},
    money::Amount,
    validation::{FieldErrors, nullable, parse_non_empty, parse_non_negative_amount},
};

text_enum! {
    /// The kind of asset an investment holds.
    InvestmentType {
        Stocks => "stocks",
        Bonds => "bonds",
        Crypto => "crypto",
        RealEstate => "real_estate",
        Other => "other",
    }
}

/// The number of decimal places kept for investment quantities.
const QUANTITY_SCALE: u32 = 4;

/// An asset the user holds, valued by hand.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Investment {
    /// The ID of the investment.
    pub id: DatabaseId,
    /// The user that holds the investment.
    pub user_id: String,
    /// A display name, e.g. "Index fund".
    pub name: String,
    /// The kind of asset.
    #[serde(rename = "type")]
    pub kind: InvestmentType,
    /// What the holding is worth now.
    pub current_value: Amount,
    /// What the user paid for the holding.
    pub purchase_price: Amount,
    /// The number of units held, e.g. shares or coins.
    #[serde(with = "rust_decimal::serde::float_option")]
    pub quantity: Option<Decimal>,
    /// The ticker symbol.
    pub symbol: Option<String>,
    /// When the investment was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// An investment that has been validated but not saved yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewInvestment {
    /// A display name.
    pub name: String,
    /// The kind of asset.
    pub kind: InvestmentType,
    /// What the holding is worth now.
    pub current_value: Amount,
    /// What the user paid for the holding.
    pub purchase_price: Amount,
    /// The number of units held.
    pub quantity: Option<Decimal>,
    /// The ticker symbol.
    pub symbol: Option<String>,
}

/// The JSON body for creating or editing an investment.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentForm {
    /// A display name.
    pub name: Option<String>,
    /// One of the investment types.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// A non-negative decimal string.
    pub current_value: Option<String>,
    /// A non-negative decimal string.
    pub purchase_price: Option<String>,
    /// A non-negative decimal string with up to four decimal places.
    #[serde(default, deserialize_with = "nullable")]
    pub quantity: Option<Option<String>>,
    /// `null` clears the symbol.
    #[serde(default, deserialize_with = "nullable")]
    pub symbol: Option<Option<String>>,
}

impl InvestmentForm {
    /// Validate the form, filling in absent fields from `existing` when editing.
    ///
    /// # Errors
    /// Returns [Error::Validation] listing every missing or malformed field.
    pub fn validate(self, existing: Option<&Investment>) -> Result<NewInvestment, Error> {
        let mut errors = FieldErrors::default();

        let name = errors.required(
            "name",
            self.name,
            existing.map(|investment| investment.name.clone()),
            parse_non_empty,
        );
        let kind = errors.required(
            "type",
            self.kind,
            existing.map(|investment| investment.kind),
            |raw| raw.parse(),
        );
        let current_value = errors.required(
            "currentValue",
            self.current_value,
            existing.map(|investment| investment.current_value),
            parse_non_negative_amount,
        );
        let purchase_price = errors.required(
            "purchasePrice",
            self.purchase_price,
            existing.map(|investment| investment.purchase_price),
            parse_non_negative_amount,
        );
        let quantity = errors.optional(
            "quantity",
            self.quantity,
            existing.and_then(|investment| investment.quantity),
            parse_quantity,
        );
        let symbol = errors.optional(
            "symbol",
            self.symbol,
            existing.and_then(|investment| investment.symbol.clone()),
            parse_non_empty,
        );

        let (Some(name), Some(kind), Some(current_value), Some(purchase_price)) =
            (name, kind, current_value, purchase_price)
        else {
            return Err(errors.into_error());
        };

        errors.into_result()?;

        Ok(NewInvestment {
            name,
            kind,
            current_value,
            purchase_price,
            quantity,
            symbol,
        })
    }
}

fn parse_quantity(raw: String) -> Result<Decimal, String> {
    let quantity = Decimal::from_str(raw.trim())
        .map_err(|_| format!("\"{raw}\" is not a valid number"))?
        .normalize();

    if quantity.is_sign_negative() && !quantity.is_zero() {
        Err("must not be negative".to_owned())
    } else if quantity.scale() > QUANTITY_SCALE {
        Err(format!("must have at most {QUANTITY_SCALE} decimal places"))
    } else {
        Ok(quantity)
    }
}

const INVESTMENT_COLUMNS: &str =
    "id, user_id, name, type, current_value, purchase_price, quantity, symbol, created_at";

/// Create a new investment in the database.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn create_investment(
    new_investment: NewInvestment,
    user_id: &str,
    connection: &Connection,
) -> Result<Investment, Error> {
    let investment = connection
        .prepare(&format!(
            "INSERT INTO investment ({INVESTMENT_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             RETURNING {INVESTMENT_COLUMNS}"
        ))?
        .query_row(
            rusqlite::params![
                new_database_id(),
                user_id,
                new_investment.name,
                new_investment.kind,
                new_investment.current_value,
                new_investment.purchase_price,
                new_investment.quantity.map(|quantity| quantity.to_string()),
                new_investment.symbol,
                OffsetDateTime::now_utc(),
            ],
            map_investment_row,
        )?;

    Ok(investment)
}

/// Retrieve an investment owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to an investment of the user,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_investment(
    id: DatabaseId,
    user_id: &str,
    connection: &Connection,
) -> Result<Investment, Error> {
    let investment = connection
        .prepare(&format!(
            "SELECT {INVESTMENT_COLUMNS} FROM investment WHERE id = ?1 AND user_id = ?2"
        ))?
        .query_one((id, user_id), map_investment_row)?;

    Ok(investment)
}

/// Retrieve all of a user's investments in the order they were recorded.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn get_investments(user_id: &str, connection: &Connection) -> Result<Vec<Investment>, Error> {
    connection
        .prepare(&format!(
            "SELECT {INVESTMENT_COLUMNS} FROM investment
             WHERE user_id = ?1 ORDER BY created_at ASC, rowid ASC"
        ))?
        .query_map([user_id], map_investment_row)?
        .map(|maybe_investment| maybe_investment.map_err(Error::from))
        .collect()
}

/// Replace the stored fields of an investment.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to an investment of the user,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_investment(
    id: DatabaseId,
    user_id: &str,
    new_investment: NewInvestment,
    connection: &Connection,
) -> Result<Investment, Error> {
    let investment = connection
        .prepare(&format!(
            "UPDATE investment
             SET name = ?3, type = ?4, current_value = ?5, purchase_price = ?6,
                 quantity = ?7, symbol = ?8
             WHERE id = ?1 AND user_id = ?2
             RETURNING {INVESTMENT_COLUMNS}"
        ))?
        .query_row(
            rusqlite::params![
                id,
                user_id,
                new_investment.name,
                new_investment.kind,
                new_investment.current_value,
                new_investment.purchase_price,
                new_investment.quantity.map(|quantity| quantity.to_string()),
                new_investment.symbol,
            ],
            map_investment_row,
        )?;

    Ok(investment)
}

/// Delete an investment, returning whether it existed.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn delete_investment(
    id: DatabaseId,
    user_id: &str,
    connection: &Connection,
) -> Result<bool, Error> {
    let rows_affected = connection.execute(
        "DELETE FROM investment WHERE id = ?1 AND user_id = ?2",
        (id, user_id),
    )?;

    Ok(rows_affected > 0)
}

/// Create the investment table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_investment_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS investment (
                id BLOB PRIMARY KEY,
                user_id TEXT NOT NULL,
                name TEXT NOT NULL,
                type TEXT NOT NULL,
                current_value TEXT NOT NULL,
                purchase_price TEXT NOT NULL,
                quantity TEXT,
                symbol TEXT,
                created_at TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

fn map_investment_row(row: &Row) -> Result<Investment, rusqlite::Error> {
    let quantity = row
        .get::<_, Option<String>>(6)?
        .map(|raw| Decimal::from_str(&raw))
        .transpose()
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(error)))?;

    Ok(Investment {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        kind: row.get(3)?,
        current_value: row.get(4)?,
        purchase_price: row.get(5)?,
        quantity,
        symbol: row.get(7)?,
        created_at: row.get(8)?,
    })
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use crate::{
        Error,
        test_utils::{amount, must_create_test_connection},
        user::DEFAULT_USER_ID,
    };

    use super::{
        InvestmentForm, InvestmentType, create_investment, delete_investment, get_investment,
        get_investments, update_investment,
    };

    fn index_fund_form() -> InvestmentForm {
        InvestmentForm {
            name: Some("Index fund".to_owned()),
            kind: Some("stocks".to_owned()),
            current_value: Some("10500".to_owned()),
            purchase_price: Some("9000".to_owned()),
            quantity: Some(Some("12.3456".to_owned())),
            symbol: Some(Some("VTI".to_owned())),
        }
    }

    #[test]
    fn stores_quantity_with_four_decimal_places() {
        let connection = must_create_test_connection();
        let new_investment = index_fund_form().validate(None).unwrap();

        let investment = create_investment(new_investment, DEFAULT_USER_ID, &connection).unwrap();

        assert_eq!(investment.kind, InvestmentType::Stocks);
        assert_eq!(investment.quantity, Some(dec!(12.3456)));
        assert_eq!(investment.current_value, amount("10500"));
        assert_eq!(
            get_investment(investment.id, DEFAULT_USER_ID, &connection),
            Ok(investment)
        );
    }

    #[test]
    fn rejects_overly_precise_quantity_and_unknown_type() {
        let form = InvestmentForm {
            kind: Some("art".to_owned()),
            quantity: Some(Some("1.23456".to_owned())),
            ..index_fund_form()
        };

        let Err(Error::Validation(errors)) = form.validate(None) else {
            panic!("expected a validation error");
        };
        let fields: Vec<_> = errors.iter().map(|error| error.field.as_str()).collect();
        assert_eq!(fields, ["type", "quantity"]);
    }

    #[test]
    fn real_estate_uses_underscore_label() {
        assert_eq!("real_estate".parse(), Ok(InvestmentType::RealEstate));
    }

    #[test]
    fn update_clears_optional_fields() {
        let connection = must_create_test_connection();
        let investment = create_investment(
            index_fund_form().validate(None).unwrap(),
            DEFAULT_USER_ID,
            &connection,
        )
        .unwrap();
        let patch = InvestmentForm {
            current_value: Some("11000".to_owned()),
            quantity: Some(None),
            symbol: Some(None),
            ..Default::default()
        };

        let new_investment = patch.validate(Some(&investment)).unwrap();
        let updated =
            update_investment(investment.id, DEFAULT_USER_ID, new_investment, &connection).unwrap();

        assert_eq!(updated.current_value, amount("11000"));
        assert_eq!(updated.quantity, None);
        assert_eq!(updated.symbol, None);
        assert_eq!(updated.name, "Index fund");

        assert_eq!(
            delete_investment(investment.id, DEFAULT_USER_ID, &connection),
            Ok(true)
        );
        assert_eq!(get_investments(DEFAULT_USER_ID, &connection), Ok(vec![]));
    }
}
