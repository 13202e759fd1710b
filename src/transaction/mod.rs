//! Transaction management for the finance app.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model, `TransactionBuilder` and `TransactionUpdate`
//! - Database functions for storing, querying, and managing transactions
//! - Form handlers and the JSON API for creating, editing and deleting transactions

mod api;
mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod edit_page;
mod form;
mod table;

pub use api::{TransactionApiState, delete_transaction_api, update_transaction_api};
pub use core::{
    Transaction, TransactionBuilder, TransactionId, TransactionType, TransactionUpdate,
    create_transaction, create_transaction_table, delete_transaction, get_owned_transaction,
    get_transaction, get_user_transactions, parse_amount, parse_created_at, update_transaction,
};
pub use create_endpoint::{CreateTransactionState, create_transaction_endpoint};
pub use delete_endpoint::{DeleteTransactionState, delete_transaction_endpoint};
pub use edit_endpoint::edit_transaction_endpoint;
pub use edit_page::{EditTransactionState, get_edit_transaction_page};
pub use form::{TransactionFormDefaults, transaction_form_fields};
pub use table::transactions_table;

#[cfg(test)]
pub use core::count_transactions;
