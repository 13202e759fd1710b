//! Defines the core data models and database queries for transactions.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{PrimitiveDateTime, format_description::BorrowedFormatItem, macros::format_description};

use crate::{Error, auth::UserID};

/// The database ID of a transaction.
pub type TransactionId = i64;

/// The format used to display and enter transaction timestamps, e.g. "2025-01-31 18:05".
pub const CREATED_AT_FORMAT: &[BorrowedFormatItem] =
    format_description!("[year]-[month]-[day] [hour]:[minute]");

/// The format used by `datetime-local` inputs, e.g. "2025-01-31T18:05".
pub const CREATED_AT_INPUT_FORMAT: &[BorrowedFormatItem] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]");

// ============================================================================
// MODELS
// ============================================================================

/// Whether money was earned or spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money earned.
    Income,
    /// Money spent.
    Expense,
}

impl TransactionType {
    /// The name stored in the database and used in forms.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionType::Income => write!(f, "Income"),
            TransactionType::Expense => write!(f, "Expense"),
        }
    }
}

impl FromStr for TransactionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            _ => Err(Error::InvalidTransactionType(s.to_owned())),
        }
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

/// An expense or income recorded by a user.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user that owns the transaction. Never changes after creation.
    pub user_id: UserID,
    /// Whether the money was earned or spent.
    pub type_: TransactionType,
    /// The amount of money, never negative.
    pub amount: f64,
    /// A text description of what the transaction was for.
    pub description: Option<String>,
    /// A free-form category label, empty if the user did not give one.
    pub category: String,
    /// When the transaction happened, in the server's local time.
    pub created_at: PrimitiveDateTime,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(
        user_id: UserID,
        type_: TransactionType,
        amount: f64,
        created_at: PrimitiveDateTime,
    ) -> TransactionBuilder {
        TransactionBuilder {
            user_id,
            type_,
            amount,
            description: None,
            category: String::new(),
            created_at,
        }
    }

    /// The amount with income positive and expenses negative.
    pub fn signed_amount(&self) -> f64 {
        match self.type_ {
            TransactionType::Income => self.amount,
            TransactionType::Expense => -self.amount,
        }
    }

    /// `created_at` in the format "YYYY-MM-DD HH:MM".
    pub fn created_at_string(&self) -> String {
        self.created_at
            .format(CREATED_AT_FORMAT)
            .unwrap_or_else(|_| self.created_at.to_string())
    }
}

/// A builder for creating [Transaction] instances.
///
/// # Examples
///
/// ```ignore
/// use time::macros::datetime;
///
/// use crate::{auth::UserID, transaction::{Transaction, TransactionType}};
///
/// let builder = Transaction::build(
///         UserID::new(1),
///         TransactionType::Expense,
///         45.99,
///         datetime!(2025-01-15 12:30),
///     )
///     .description(Some("Coffee".to_owned()))
///     .category("food");
/// ```
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// The user that will own the transaction.
    pub user_id: UserID,
    /// Whether the money was earned or spent.
    pub type_: TransactionType,
    /// The amount of money, never negative.
    pub amount: f64,
    /// An optional description. Blank descriptions are stored as `None`.
    pub description: Option<String>,
    /// The category label. Defaults to the empty string.
    pub category: String,
    /// When the transaction happened.
    pub created_at: PrimitiveDateTime,
}

impl TransactionBuilder {
    /// Set the description for the transaction.
    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = normalize_description(description);
        self
    }

    /// Set the category for the transaction.
    pub fn category(mut self, category: &str) -> Self {
        self.category = category.trim().to_owned();
        self
    }
}

/// A partial update of a transaction. Fields that are `None` keep their prior value.
#[derive(Debug, Default, PartialEq, Clone)]
pub struct TransactionUpdate {
    /// The new transaction type.
    pub type_: Option<TransactionType>,
    /// The new amount.
    pub amount: Option<f64>,
    /// The new description, a blank string clears it.
    pub description: Option<String>,
    /// The new category, a blank string clears it.
    pub category: Option<String>,
    /// The new timestamp.
    pub created_at: Option<PrimitiveDateTime>,
}

impl TransactionUpdate {
    /// Apply the update to `transaction`. The ID and owner are never changed.
    pub fn apply_to(self, transaction: Transaction) -> Transaction {
        Transaction {
            type_: self.type_.unwrap_or(transaction.type_),
            amount: self.amount.unwrap_or(transaction.amount),
            description: match self.description {
                Some(description) => normalize_description(Some(description)),
                None => transaction.description,
            },
            category: self
                .category
                .map(|category| category.trim().to_owned())
                .unwrap_or(transaction.category),
            created_at: self.created_at.unwrap_or(transaction.created_at),
            ..transaction
        }
    }
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|description| description.trim().to_owned())
        .filter(|description| !description.is_empty())
}

// ============================================================================
// PARSING
// ============================================================================

/// Parse a user entered amount.
///
/// # Errors
/// Returns [Error::InvalidAmount] if `raw_amount` is not a finite, non-negative number.
pub fn parse_amount(raw_amount: &str) -> Result<f64, Error> {
    match raw_amount.trim().parse::<f64>() {
        Ok(amount) if amount.is_finite() && amount >= 0.0 => Ok(amount),
        _ => Err(Error::InvalidAmount(raw_amount.to_owned())),
    }
}

/// Parse a user entered timestamp in the format "YYYY-MM-DD HH:MM".
///
/// The "YYYY-MM-DDTHH:MM" format sent by `datetime-local` inputs is also accepted.
///
/// # Errors
/// Returns [Error::InvalidTimestamp] if `raw_created_at` is in neither format.
pub fn parse_created_at(raw_created_at: &str) -> Result<PrimitiveDateTime, Error> {
    let trimmed = raw_created_at.trim();

    PrimitiveDateTime::parse(trimmed, CREATED_AT_FORMAT)
        .or_else(|_| PrimitiveDateTime::parse(trimmed, CREATED_AT_INPUT_FORMAT))
        .map_err(|_| Error::InvalidTimestamp(raw_created_at.to_owned()))
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                type TEXT NOT NULL CHECK (type IN ('income', 'expense')),
                amount REAL NOT NULL,
                description TEXT,
                category TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    // Used by the dashboard to list a user's transactions newest first.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_created_at
         ON \"transaction\"(user_id, created_at);",
        (),
    )?;

    Ok(())
}

/// Create a new transaction in the database from a builder.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the builder's user does not exist,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(
            "INSERT INTO \"transaction\" (user_id, type, amount, description, category, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING id, user_id, type, amount, description, category, created_at",
        )?
        .query_row(
            (
                builder.user_id.as_i64(),
                builder.type_,
                builder.amount,
                builder.description,
                builder.category,
                builder.created_at,
            ),
            map_transaction_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::NotFound,
            error => error.into(),
        })
}

/// Retrieve a transaction from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(id: TransactionId, connection: &Connection) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "SELECT id, user_id, type, amount, description, category, created_at
             FROM \"transaction\" WHERE id = :id",
        )?
        .query_row(&[(":id", &id)], map_transaction_row)?;

    Ok(transaction)
}

/// Retrieve the transaction `id` if it belongs to `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - [Error::Forbidden] if the transaction belongs to another user,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_owned_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = get_transaction(id, connection)?;

    if transaction.user_id != user_id {
        tracing::warn!(
            "User {user_id} tried to access transaction {id} owned by user {}",
            transaction.user_id
        );
        return Err(Error::Forbidden);
    }

    Ok(transaction)
}

/// Retrieve all of a user's transactions, newest first.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn get_user_transactions(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, type, amount, description, category, created_at
             FROM \"transaction\" WHERE user_id = :user_id
             ORDER BY created_at DESC, id DESC",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], map_transaction_row)?
        .map(|transaction_result| transaction_result.map_err(Error::SqlError))
        .collect()
}

/// Write the editable fields of `transaction` to the database.
///
/// The owner of the stored row is left unchanged.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
///
/// Returns the number of rows affected, zero if the transaction does not exist.
pub fn update_transaction(
    transaction: &Transaction,
    connection: &Connection,
) -> Result<usize, Error> {
    connection
        .execute(
            "UPDATE \"transaction\"
             SET type = ?1, amount = ?2, description = ?3, category = ?4, created_at = ?5
             WHERE id = ?6",
            (
                transaction.type_,
                transaction.amount,
                &transaction.description,
                &transaction.category,
                transaction.created_at,
                transaction.id,
            ),
        )
        .map_err(|error| error.into())
}

/// Delete the transaction `id`.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
///
/// Returns the number of rows affected, zero if the transaction does not exist.
pub fn delete_transaction(id: TransactionId, connection: &Connection) -> Result<usize, Error> {
    connection
        .execute("DELETE FROM \"transaction\" WHERE id = ?1", [id])
        .map_err(|error| error.into())
}

/// Get the total number of transactions in the database.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn count_transactions(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM \"transaction\";", [], |row| {
            row.get(0)
        })
        .map_err(|error| error.into())
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let user_id = UserID::new(row.get(1)?);
    let type_ = row.get(2)?;
    let amount = row.get(3)?;
    let description = row.get(4)?;
    let category = row.get(5)?;
    let created_at = row.get(6)?;

    Ok(Transaction {
        id,
        user_id,
        type_,
        amount,
        description,
        category,
        created_at,
    })
}

// ============================================================================
// TESTS
// ============================================================================
