//! Defines the endpoint for listing every transaction.
use std::sync::Arc;

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{AppState, stores::TransactionStore};

/// The state needed to list transactions.
#[derive(Clone)]
pub struct ListTransactionsState {
    /// The store to read transactions from.
    pub transaction_store: Arc<dyn TransactionStore>,
}

impl FromRef<AppState> for ListTransactionsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            transaction_store: state.transaction_store.clone(),
        }
    }
}

/// A route handler that responds with every transaction keyed by its ID, or
/// `{}` if there are none.
pub async fn get_transactions_endpoint(State(state): State<ListTransactionsState>) -> Response {
    match state.transaction_store.list_all().await {
        Ok(transactions) => (StatusCode::OK, Json(transactions)).into_response(),
        Err(error) => error.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::BTreeMap, sync::Arc};

    use axum::{extract::State, http::StatusCode, response::Response};

    use crate::{
        stores::{InMemoryTransactionStore, TransactionStore},
        test_utils::UnavailableStore,
        transaction::Transaction,
    };

    use super::{ListTransactionsState, get_transactions_endpoint};

    async fn parse_body(response: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn empty_store_responds_with_empty_object() {
        let state = ListTransactionsState {
            transaction_store: Arc::new(InMemoryTransactionStore::new()),
        };

        let response = get_transactions_endpoint(State(state)).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(parse_body(response).await, serde_json::json!({}));
    }

    #[tokio::test]
    async fn responds_with_transactions_keyed_by_id() {
        let store = Arc::new(InMemoryTransactionStore::new());
        let (id, transaction) = store
            .append(Transaction::new(
                "Shop".to_owned(),
                "Ana".to_owned(),
                "25.00".into(),
            ))
            .await
            .unwrap();
        let state = ListTransactionsState {
            transaction_store: store,
        };

        let response = get_transactions_endpoint(State(state)).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body: BTreeMap<String, Transaction> =
            serde_json::from_value(parse_body(response).await).unwrap();
        assert_eq!(body, BTreeMap::from([(id, transaction)]));
    }

    #[tokio::test]
    async fn unavailable_store_is_internal_server_error() {
        let state = ListTransactionsState {
            transaction_store: Arc::new(UnavailableStore),
        };

        let response = get_transactions_endpoint(State(state)).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = parse_body(response).await;
        assert!(
            !body["error"].as_str().unwrap_or_default().is_empty(),
            "want non-empty error message, got {body}"
        );
    }
}
