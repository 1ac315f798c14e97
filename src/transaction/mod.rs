//! Transactions and the route handlers for listing and creating them.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and its `Amount`
//! - The handler that lists every stored transaction
//! - The handler that stores a new transaction and notifies the payee's device

mod core;
mod create_endpoint;
mod list_endpoint;

pub use core::{Amount, Transaction, TransactionId, server_timestamp};
pub use create_endpoint::{
    CREATED_MESSAGE, CreateTransactionRequest, CreateTransactionResponse, CreateTransactionState,
    PLACEHOLDER_PAYMENT_METHOD, create_transaction_endpoint,
};
pub use list_endpoint::{ListTransactionsState, get_transactions_endpoint};
