//! Defines the app level error type and conversions to rendered HTML pages, alerts and JSON bodies.
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{
    alert::Alert, html::error_view, internal_server_error::InternalServerError,
    not_found::NotFoundError,
};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The user provided an invalid combination of username and password.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// The auth token cookie is missing from the cookie jar in the request,
    /// could not be decrypted or has expired.
    #[error("no valid auth cookie in the cookie jar")]
    CookieMissing,

    /// An empty (or whitespace only) string was used as a username.
    #[error("username cannot be empty")]
    EmptyUsername,

    /// An empty (or whitespace only) string was used as a password.
    #[error("password cannot be empty")]
    EmptyPassword,

    /// The password and the confirmation password did not match.
    #[error("passwords do not match")]
    PasswordMismatch,

    /// The username is already taken by another user.
    #[error("the username \"{0}\" already exists in the database")]
    DuplicateUsername(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The amount could not be parsed as a finite, non-negative number.
    #[error("invalid amount \"{0}\"")]
    InvalidAmount(String),

    /// The transaction type was neither "income" nor "expense".
    #[error("invalid transaction type \"{0}\"")]
    InvalidTransactionType(String),

    /// The transaction timestamp was not in the format "YYYY-MM-DD HH:MM".
    #[error("invalid timestamp \"{0}\"")]
    InvalidTimestamp(String),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The resource exists but belongs to another user.
    #[error("the requested resource belongs to another user")]
    Forbidden,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// An error occurred while serializing or deserializing a struct as JSON.
    #[error("could not (de)serialize JSON: {0}")]
    JSONSerializationError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

const INVALID_TIMEZONE_FIX: &str = "Check your server settings and ensure the timezone has \
    been set to valid, canonical timezone string";

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => NotFoundError.into_response(),
            Error::Forbidden => (
                StatusCode::FORBIDDEN,
                error_view(
                    "Forbidden",
                    "403",
                    "Access denied",
                    "You do not have permission to access this resource.",
                ),
            )
                .into_response(),
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: "Invalid Timezone Settings",
                fix: &format!("Could not get local timezone \"{timezone}\". {INVALID_TIMEZONE_FIX}"),
            }
            .into_response(),
            Error::DatabaseLockError => InternalServerError::default().into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    /// Convert the error into an alert to show the user, e.g. as a flash message.
    pub fn into_alert(self) -> Alert {
        match self {
            Error::InvalidCredentials => Alert::ErrorSimple {
                message: "Invalid username or password.".to_owned(),
            },
            Error::EmptyUsername => Alert::ErrorSimple {
                message: "Username cannot be empty.".to_owned(),
            },
            Error::EmptyPassword => Alert::ErrorSimple {
                message: "Password cannot be empty.".to_owned(),
            },
            Error::PasswordMismatch => Alert::ErrorSimple {
                message: "Passwords do not match.".to_owned(),
            },
            Error::DuplicateUsername(username) => Alert::Error {
                message: "Username already taken".to_owned(),
                details: format!("The username \"{username}\" is already registered. Choose another one."),
            },
            Error::InvalidAmount(amount) => Alert::Error {
                message: "Invalid amount format".to_owned(),
                details: format!("\"{amount}\" is not a valid non-negative number."),
            },
            Error::InvalidTransactionType(type_) => Alert::Error {
                message: "Invalid transaction type".to_owned(),
                details: format!("\"{type_}\" is not a transaction type, use income or expense."),
            },
            Error::InvalidTimestamp(timestamp) => Alert::Error {
                message: "Invalid date format".to_owned(),
                details: format!("Could not read \"{timestamp}\", use 'YYYY-MM-DD HH:MM'."),
            },
            Error::NotFound => Alert::ErrorSimple {
                message: "The transaction could not be found.".to_owned(),
            },
            Error::Forbidden => Alert::ErrorSimple {
                message: "You do not have permission to access this transaction.".to_owned(),
            },
            Error::InvalidTimezoneError(timezone) => Alert::Error {
                message: "Invalid Timezone Settings".to_owned(),
                details: format!(
                    "Could not get local timezone \"{timezone}\". {INVALID_TIMEZONE_FIX}"
                ),
            },
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                Alert::Error {
                    message: "Something went wrong".to_owned(),
                    details:
                        "An unexpected error occurred, check the server logs for more details."
                            .to_owned(),
                }
            }
        }
    }

    /// Convert the error into an HTTP response with a JSON body of the form `{"error": "..."}`.
    pub fn into_json_response(self) -> Response {
        let (status_code, message) = match self {
            Error::InvalidAmount(_) => (StatusCode::BAD_REQUEST, "Invalid amount format.".to_owned()),
            Error::InvalidTransactionType(type_) => (
                StatusCode::BAD_REQUEST,
                format!("Invalid transaction type \"{type_}\", expected \"income\" or \"expense\"."),
            ),
            Error::InvalidTimestamp(_) => (
                StatusCode::BAD_REQUEST,
                "Invalid date format. Use 'YYYY-MM-DD HH:MM'.".to_owned(),
            ),
            Error::Forbidden => (
                StatusCode::FORBIDDEN,
                "You do not have permission to modify this transaction.".to_owned(),
            ),
            Error::NotFound => (StatusCode::NOT_FOUND, "Transaction not found.".to_owned()),
            Error::CookieMissing => (
                StatusCode::UNAUTHORIZED,
                "You must be logged in to access this resource.".to_owned(),
            ),
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred.".to_owned(),
                )
            }
        };

        (status_code, Json(json!({ "error": message }))).into_response()
    }
}
