//! The page for editing a transaction.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    alert::Alert,
    auth::UserID,
    endpoints::{self, format_endpoint},
    flash::{flash_redirect, take_flash},
    html::{BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, base, link},
    navigation::NavBar,
    transaction::{
        Transaction, TransactionId,
        form::{TransactionFormDefaults, transaction_form_fields},
        get_owned_transaction,
    },
};

/// The state needed for viewing and submitting the edit transaction form.
#[derive(Debug, Clone)]
pub struct EditTransactionState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The database connection for accessing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<EditTransactionState> for Key {
    fn from_ref(state: &EditTransactionState) -> Self {
        state.cookie_key.clone()
    }
}

fn edit_transaction_view(transaction: &Transaction, flash: Option<Alert>) -> Markup {
    let nav_bar = NavBar::new(endpoints::EDIT_TRANSACTION).into_html();
    let edit_endpoint = format_endpoint(endpoints::EDIT_TRANSACTION, transaction.id);
    let form_fields = transaction_form_fields(&TransactionFormDefaults {
        transaction_type: transaction.type_,
        amount: Some(transaction.amount),
        description: transaction.description.as_deref(),
        category: &transaction.category,
        created_at: Some(transaction.created_at),
    });

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            div class="w-full max-w-md space-y-4"
            {
                h1 class="text-xl font-bold" { "Edit Transaction" }

                @if let Some(alert) = flash {
                    (alert.into_html())
                }

                form
                    method="post"
                    action=(edit_endpoint)
                    class="w-full space-y-4 md:space-y-6"
                {
                    (form_fields)

                    button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
                    {
                        "Save Changes"
                    }
                }

                p { (link(endpoints::DASHBOARD_VIEW, "Back to dashboard")) }
            }
        }
    };

    base("Edit Transaction", &[], &content)
}

/// Renders the page for editing a transaction.
///
/// Responds with the 404 page if the transaction does not exist, and redirects
/// to the dashboard if it belongs to another user.
pub async fn get_edit_transaction_page(
    State(state): State<EditTransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<TransactionId>,
    jar: PrivateCookieJar,
) -> Response {
    let transaction = match state.db_connection.lock() {
        Ok(connection) => get_owned_transaction(transaction_id, user_id, &connection),
        Err(_) => Err(Error::DatabaseLockError),
    };

    match transaction {
        Ok(transaction) => {
            let (jar, flash) = take_flash(jar);
            (jar, edit_transaction_view(&transaction, flash)).into_response()
        }
        Err(error @ Error::Forbidden) => {
            flash_redirect(jar, error.into_alert(), endpoints::DASHBOARD_VIEW)
        }
        Err(error) => error.into_response(),
    }
}
