//! The endpoint for creating a transaction from the dashboard form.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::Response,
};
use axum_extra::extract::{Form, PrivateCookieJar, cookie::Key};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    alert::Alert,
    auth::UserID,
    endpoints,
    flash::flash_redirect,
    timezone::local_now,
    transaction::{
        Transaction, TransactionType, create_transaction, parse_amount, parse_created_at,
    },
};

/// The state needed to create a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<CreateTransactionState> for Key {
    fn from_ref(state: &CreateTransactionState) -> Self {
        state.cookie_key.clone()
    }
}

/// The raw values of the create transaction form. Empty fields are `None`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CreateTransactionForm {
    /// "income" or "expense".
    #[serde(rename = "type")]
    pub type_: Option<String>,
    /// The amount as typed by the user.
    pub amount: Option<String>,
    /// An optional description.
    pub description: Option<String>,
    /// An optional category label.
    pub category: Option<String>,
    /// When the transaction happened, defaults to now.
    pub created_at: Option<String>,
}

const TRANSACTION_ADDED_MSG: &str = "Transaction added successfully!";

/// A route handler for creating a new transaction.
///
/// Redirects to the dashboard with a flash message, whether or not the form was valid.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Extension(user_id): Extension<UserID>,
    jar: PrivateCookieJar,
    Form(form): Form<CreateTransactionForm>,
) -> Response {
    match try_create_transaction(&state, user_id, form) {
        Ok(transaction) => {
            tracing::info!(
                "User {user_id} created transaction {}",
                transaction.id
            );
            flash_redirect(
                jar,
                Alert::SuccessSimple {
                    message: TRANSACTION_ADDED_MSG.to_owned(),
                },
                endpoints::DASHBOARD_VIEW,
            )
        }
        Err(error) => {
            tracing::debug!("Could not create transaction for user {user_id}: {error}");
            flash_redirect(jar, error.into_alert(), endpoints::DASHBOARD_VIEW)
        }
    }
}

fn try_create_transaction(
    state: &CreateTransactionState,
    user_id: UserID,
    form: CreateTransactionForm,
) -> Result<Transaction, Error> {
    let type_: TransactionType = form.type_.as_deref().unwrap_or_default().parse()?;
    let amount = parse_amount(form.amount.as_deref().unwrap_or_default())?;
    let created_at = match form.created_at.as_deref() {
        Some(created_at) => parse_created_at(created_at)?,
        None => local_now(&state.local_timezone)?,
    };

    let builder = Transaction::build(user_id, type_, amount, created_at)
        .description(form.description)
        .category(form.category.as_deref().unwrap_or_default());

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    create_transaction(builder, &connection)
}
