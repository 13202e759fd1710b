//! The endpoint for deleting a transaction from the dashboard table.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    alert::Alert,
    auth::UserID,
    endpoints,
    flash::flash_redirect,
    transaction::{TransactionId, delete_transaction, get_owned_transaction},
};

/// The state needed to delete a transaction.
#[derive(Debug, Clone)]
pub struct DeleteTransactionState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

impl FromRef<DeleteTransactionState> for Key {
    fn from_ref(state: &DeleteTransactionState) -> Self {
        state.cookie_key.clone()
    }
}

const TRANSACTION_DELETED_MSG: &str = "Transaction deleted.";

/// A route handler for deleting a transaction, redirects to the dashboard.
pub async fn delete_transaction_endpoint(
    State(state): State<DeleteTransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<TransactionId>,
    jar: PrivateCookieJar,
) -> Response {
    let result = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)
        .and_then(|connection| {
            get_owned_transaction(transaction_id, user_id, &connection)?;
            delete_transaction(transaction_id, &connection)
        });

    match result {
        Ok(0) | Err(Error::NotFound) => Error::NotFound.into_response(),
        Ok(_) => {
            tracing::info!("User {user_id} deleted transaction {transaction_id}");
            flash_redirect(
                jar,
                Alert::SuccessSimple {
                    message: TRANSACTION_DELETED_MSG.to_owned(),
                },
                endpoints::DASHBOARD_VIEW,
            )
        }
        Err(error @ Error::Forbidden) => {
            flash_redirect(jar, error.into_alert(), endpoints::DASHBOARD_VIEW)
        }
        Err(error) => error.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
    };
    use axum_extra::extract::PrivateCookieJar;
    use rusqlite::Connection;
    use time::macros::datetime;

    use crate::{
        app_state::create_cookie_key,
        auth::{PasswordHash, UserID, Username, create_user},
        db::initialize,
        endpoints,
        test_utils::{assert_redirect, must_get_flash_message},
        transaction::{Transaction, TransactionType, count_transactions, create_transaction},
    };

    use super::{DeleteTransactionState, delete_transaction_endpoint};

    fn get_test_state() -> (DeleteTransactionState, UserID, UserID, Transaction) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let alice = create_user(
            Username::new_unchecked("alice"),
            PasswordHash::new_unchecked("hash"),
            &connection,
        )
        .unwrap();
        let bob = create_user(
            Username::new_unchecked("bob"),
            PasswordHash::new_unchecked("hash"),
            &connection,
        )
        .unwrap();
        let transaction = create_transaction(
            Transaction::build(
                alice.id,
                TransactionType::Income,
                100.0,
                datetime!(2025-01-01 09:00),
            ),
            &connection,
        )
        .unwrap();

        (
            DeleteTransactionState {
                cookie_key: create_cookie_key("foobar"),
                db_connection: Arc::new(Mutex::new(connection)),
            },
            alice.id,
            bob.id,
            transaction,
        )
    }

    async fn delete(
        state: &DeleteTransactionState,
        user_id: UserID,
        transaction_id: i64,
    ) -> axum::response::Response {
        let jar = PrivateCookieJar::new(state.cookie_key.clone());
        delete_transaction_endpoint(
            State(state.clone()),
            Extension(user_id),
            Path(transaction_id),
            jar,
        )
        .await
    }

    #[tokio::test]
    async fn owner_can_delete_transaction() {
        let (state, alice, _, transaction) = get_test_state();

        let response = delete(&state, alice, transaction.id).await;

        assert_redirect(&response, endpoints::DASHBOARD_VIEW);
        assert_eq!(
            must_get_flash_message(&response, &state.cookie_key),
            "Transaction deleted."
        );
        assert_eq!(count_transactions(&state.db_connection.lock().unwrap()), Ok(0));
    }

    #[tokio::test]
    async fn other_user_cannot_delete_transaction() {
        let (state, _, bob, transaction) = get_test_state();

        let response = delete(&state, bob, transaction.id).await;

        assert_redirect(&response, endpoints::DASHBOARD_VIEW);
        assert_eq!(
            must_get_flash_message(&response, &state.cookie_key),
            "You do not have permission to access this transaction."
        );
        assert_eq!(count_transactions(&state.db_connection.lock().unwrap()), Ok(1));
    }

    #[tokio::test]
    async fn deleting_twice_is_not_found() {
        let (state, alice, _, transaction) = get_test_state();

        delete(&state, alice, transaction.id).await;
        let response = delete(&state, alice, transaction.id).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
