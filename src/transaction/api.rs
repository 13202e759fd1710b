//! The JSON API for updating and deleting transactions.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{
    AppState, Error,
    auth::UserID,
    transaction::{
        TransactionId, TransactionUpdate, delete_transaction, get_owned_transaction,
        parse_amount, parse_created_at, update_transaction,
    },
};

/// The state needed for the transaction API.
#[derive(Debug, Clone)]
pub struct TransactionApiState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionApiState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The body of a partial update. Absent or null fields keep their prior value.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TransactionPatch {
    /// "income" or "expense".
    #[serde(rename = "type")]
    pub type_: Option<String>,
    /// Either a JSON number or a numeric string.
    pub amount: Option<Value>,
    /// The new description, an empty string clears it.
    pub description: Option<String>,
    /// The new category, an empty string clears it.
    pub category: Option<String>,
    /// The new timestamp, "YYYY-MM-DD HH:MM".
    pub created_at: Option<String>,
}

fn parse_amount_value(value: &Value) -> Result<Option<f64>, Error> {
    match value {
        Value::Null => Ok(None),
        Value::Number(number) => match number.as_f64() {
            Some(amount) if amount.is_finite() && amount >= 0.0 => Ok(Some(amount)),
            _ => Err(Error::InvalidAmount(number.to_string())),
        },
        Value::String(raw_amount) => parse_amount(raw_amount).map(Some),
        other => Err(Error::InvalidAmount(other.to_string())),
    }
}

impl TryFrom<TransactionPatch> for TransactionUpdate {
    type Error = Error;

    fn try_from(patch: TransactionPatch) -> Result<Self, Self::Error> {
        let amount = match &patch.amount {
            Some(value) => parse_amount_value(value)?,
            None => None,
        };
        let type_ = patch.type_.map(|type_| type_.parse()).transpose()?;
        let created_at = patch
            .created_at
            .map(|created_at| parse_created_at(&created_at))
            .transpose()?;

        Ok(TransactionUpdate {
            type_,
            amount,
            description: patch.description,
            category: patch.category,
            created_at,
        })
    }
}

fn message_response(message: &str) -> Response {
    (StatusCode::OK, Json(json!({ "message": message }))).into_response()
}

/// A route handler for partially updating a transaction from a JSON body.
///
/// Responds with `{"message": ...}` on success and `{"error": ...}` otherwise.
pub async fn update_transaction_api(
    State(state): State<TransactionApiState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<TransactionId>,
    payload: Result<Json<TransactionPatch>, JsonRejection>,
) -> Response {
    let patch = match payload {
        Ok(Json(patch)) => patch,
        Err(rejection) => {
            tracing::debug!("Rejected transaction update body: {rejection}");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Invalid JSON body." })),
            )
                .into_response();
        }
    };

    let result = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)
        .and_then(|connection| {
            let transaction = get_owned_transaction(transaction_id, user_id, &connection)?;
            let update = TransactionUpdate::try_from(patch)?;
            update_transaction(&update.apply_to(transaction), &connection)
        });

    match result {
        Ok(0) => Error::NotFound.into_json_response(),
        Ok(_) => {
            tracing::info!("User {user_id} updated transaction {transaction_id} via the API");
            message_response("Transaction updated.")
        }
        Err(error) => error.into_json_response(),
    }
}

/// A route handler for deleting a transaction. Deleting the same ID twice responds with 404.
pub async fn delete_transaction_api(
    State(state): State<TransactionApiState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<TransactionId>,
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
        Ok(0) => Error::NotFound.into_json_response(),
        Ok(_) => {
            tracing::info!("User {user_id} deleted transaction {transaction_id} via the API");
            message_response("Transaction deleted.")
        }
        Err(error) => error.into_json_response(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Router, middleware, routing::put};
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::{Value, json};
    use time::macros::datetime;

    use crate::{
        Error,
        auth::{PasswordHash, UserID, Username, create_user},
        db::initialize,
        transaction::{
            Transaction, TransactionType, count_transactions, create_transaction,
            get_transaction,
        },
    };

    use super::{TransactionApiState, delete_transaction_api, update_transaction_api};

    struct Fixture {
        state: TransactionApiState,
        alice: UserID,
        bob: UserID,
        transaction: Transaction,
    }

    fn fixture() -> Fixture {
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
                TransactionType::Expense,
                20.0,
                datetime!(2025-02-10 08:00),
            )
            .description(Some("Taxi".to_owned()))
            .category("transport"),
            &connection,
        )
        .unwrap();

        Fixture {
            state: TransactionApiState {
                db_connection: Arc::new(Mutex::new(connection)),
            },
            alice: alice.id,
            bob: bob.id,
            transaction,
        }
    }

    /// Serve the API as `user_id`, standing in for the auth middleware.
    fn server_as(state: TransactionApiState, user_id: UserID) -> TestServer {
        let app = Router::new()
            .route(
                "/api/transaction/{transaction_id}",
                put(update_transaction_api).delete(delete_transaction_api),
            )
            .layer(middleware::from_fn(
                move |mut request: axum::extract::Request, next: middleware::Next| async move {
                    request.extensions_mut().insert(user_id);
                    next.run(request).await
                },
            ))
            .with_state(state);

        TestServer::try_new(app).expect("Could not create test server.")
    }

    fn url(id: i64) -> String {
        format!("/api/transaction/{id}")
    }

    #[tokio::test]
    async fn partial_update_keeps_absent_fields() {
        let Fixture {
            state,
            alice,
            transaction,
            ..
        } = fixture();
        let server = server_as(state.clone(), alice);

        let response = server
            .put(&url(transaction.id))
            .json(&json!({ "amount": 35.5 }))
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({ "message": "Transaction updated." }));
        let got = get_transaction(transaction.id, &state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(
            got,
            Transaction {
                amount: 35.5,
                ..transaction
            }
        );
    }

    #[tokio::test]
    async fn update_accepts_amount_as_string_and_other_fields() {
        let Fixture {
            state,
            alice,
            transaction,
            ..
        } = fixture();
        let server = server_as(state.clone(), alice);

        let response = server
            .put(&url(transaction.id))
            .json(&json!({
                "type": "income",
                "amount": "12",
                "description": "",
                "category": "refund",
                "created_at": "2025-03-01 10:15",
            }))
            .await;

        response.assert_status_ok();
        let got = get_transaction(transaction.id, &state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(got.type_, TransactionType::Income);
        assert_eq!(got.amount, 12.0);
        assert_eq!(got.description, None);
        assert_eq!(got.category, "refund");
        assert_eq!(got.created_at, datetime!(2025-03-01 10:15));
    }

    #[tokio::test]
    async fn invalid_amount_is_bad_request_and_unchanged() {
        let Fixture {
            state,
            alice,
            transaction,
            ..
        } = fixture();
        let server = server_as(state.clone(), alice);

        let response = server
            .put(&url(transaction.id))
            .json(&json!({ "amount": "twelve" }))
            .await;

        response.assert_status_bad_request();
        let body: Value = response.json();
        assert!(body["error"].is_string());
        let got = get_transaction(transaction.id, &state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(got, transaction);
    }

    #[tokio::test]
    async fn negative_amount_is_bad_request() {
        let Fixture {
            state,
            alice,
            transaction,
            ..
        } = fixture();
        let server = server_as(state, alice);

        server
            .put(&url(transaction.id))
            .json(&json!({ "amount": -5 }))
            .await
            .assert_status_bad_request();
    }

    #[tokio::test]
    async fn malformed_body_is_bad_request() {
        let Fixture {
            state,
            alice,
            transaction,
            ..
        } = fixture();
        let server = server_as(state, alice);

        server
            .put(&url(transaction.id))
            .text("{not json")
            .content_type("application/json")
            .await
            .assert_status_bad_request();
    }

    #[tokio::test]
    async fn other_user_gets_forbidden() {
        let Fixture {
            state,
            bob,
            transaction,
            ..
        } = fixture();
        let server = server_as(state.clone(), bob);

        server
            .put(&url(transaction.id))
            .json(&json!({ "amount": 1 }))
            .await
            .assert_status_forbidden();
        server
            .delete(&url(transaction.id))
            .await
            .assert_status_forbidden();

        let got = get_transaction(transaction.id, &state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(got, transaction);
    }

    #[tokio::test]
    async fn unknown_transaction_is_not_found() {
        let Fixture { state, alice, .. } = fixture();
        let server = server_as(state, alice);

        server
            .put(&url(999))
            .json(&json!({ "amount": 1 }))
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn second_delete_is_not_found() {
        let Fixture {
            state,
            alice,
            transaction,
            ..
        } = fixture();
        let server = server_as(state.clone(), alice);

        let response = server.delete(&url(transaction.id)).await;
        response.assert_status_ok();
        response.assert_json(&json!({ "message": "Transaction deleted." }));

        let response = server
            .delete(&url(transaction.id))
            .await;
        response.assert_status_not_found();
        response.assert_json(&json!({ "error": "Transaction not found." }));
        assert_eq!(
            count_transactions(&state.db_connection.lock().unwrap()),
            Ok(0)
        );
    }

    #[test]
    fn null_amount_keeps_prior_value() {
        assert_eq!(super::parse_amount_value(&Value::Null), Ok(None));
        assert_eq!(
            super::parse_amount_value(&json!(true)),
            Err(Error::InvalidAmount("true".to_owned()))
        );
    }
}
