//! The endpoint for submitting the edit transaction form.

use axum::{
    Extension, Form,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::PrivateCookieJar;
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    alert::Alert,
    auth::UserID,
    endpoints::{self, format_endpoint},
    flash::flash_redirect,
    transaction::{
        TransactionId, TransactionUpdate, edit_page::EditTransactionState,
        get_owned_transaction, parse_amount, parse_created_at, update_transaction,
    },
};

/// The raw values of the edit transaction form.
///
/// A field that is absent keeps its prior value. An empty description or
/// category clears it, while an empty type or date keeps the prior value.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct EditTransactionForm {
    /// "income" or "expense".
    #[serde(rename = "type")]
    pub type_: Option<String>,
    /// The amount as typed by the user. Required.
    pub amount: Option<String>,
    /// The new description.
    pub description: Option<String>,
    /// The new category label.
    pub category: Option<String>,
    /// The new timestamp, "YYYY-MM-DD HH:MM".
    pub created_at: Option<String>,
}

const TRANSACTION_UPDATED_MSG: &str = "Transaction updated.";

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

impl EditTransactionForm {
    fn into_update(self) -> Result<TransactionUpdate, Error> {
        let amount = parse_amount(self.amount.as_deref().unwrap_or_default())?;
        let type_ = non_empty(self.type_)
            .map(|type_| type_.parse())
            .transpose()?;
        let created_at = non_empty(self.created_at)
            .map(|created_at| parse_created_at(&created_at))
            .transpose()?;

        Ok(TransactionUpdate {
            type_,
            amount: Some(amount),
            description: self.description,
            category: self.category,
            created_at,
        })
    }
}

/// A route handler for updating a transaction from the edit form.
///
/// Invalid input sends the user back to the edit page with a flash message.
/// Success redirects to the dashboard.
pub async fn edit_transaction_endpoint(
    State(state): State<EditTransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<TransactionId>,
    jar: PrivateCookieJar,
    Form(form): Form<EditTransactionForm>,
) -> Response {
    let Ok(connection) = state.db_connection.lock() else {
        return Error::DatabaseLockError.into_response();
    };

    let transaction = match get_owned_transaction(transaction_id, user_id, &connection) {
        Ok(transaction) => transaction,
        Err(error @ Error::Forbidden) => {
            return flash_redirect(jar, error.into_alert(), endpoints::DASHBOARD_VIEW);
        }
        Err(error) => return error.into_response(),
    };

    let update = match form.into_update() {
        Ok(update) => update,
        Err(error) => {
            let edit_page = format_endpoint(endpoints::EDIT_TRANSACTION, transaction_id);
            return flash_redirect(jar, error.into_alert(), &edit_page);
        }
    };

    match update_transaction(&update.apply_to(transaction), &connection) {
        Ok(0) => Error::NotFound.into_response(),
        Ok(_) => {
            tracing::info!("User {user_id} updated transaction {transaction_id}");
            flash_redirect(
                jar,
                Alert::SuccessSimple {
                    message: TRANSACTION_UPDATED_MSG.to_owned(),
                },
                endpoints::DASHBOARD_VIEW,
            )
        }
        Err(error) => {
            tracing::error!("Could not update transaction {transaction_id}: {error}");
            error.into_response()
        }
    }
}
