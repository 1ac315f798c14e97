//! Defines the endpoint for creating a new transaction.
use std::sync::Arc;

use axum::{
    Json,
    extract::{FromRef, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    config::NotificationMode,
    notification::{Notifier, notify},
    stores::TransactionStore,
    transaction::{Amount, Transaction, TransactionId},
};

/// The payment method shown in notifications.
///
/// Clients cannot send a payment method yet, so every notification uses
/// this label.
pub const PLACEHOLDER_PAYMENT_METHOD: &str = "in-app payment";

/// The message sent back when a transaction has been stored.
pub const CREATED_MESSAGE: &str = "transaction saved";

/// The state needed to create a transaction.
#[derive(Clone)]
pub struct CreateTransactionState {
    /// The store to add transactions to.
    pub transaction_store: Arc<dyn TransactionStore>,
    /// Sends a notification for each new transaction.
    pub notifier: Arc<dyn Notifier>,
    /// Whether a device token is required, optional or ignored.
    pub notification_mode: NotificationMode,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            transaction_store: state.transaction_store.clone(),
            notifier: state.notifier.clone(),
            notification_mode: state.notification_mode,
        }
    }
}

/// The JSON body for creating a transaction.
///
/// Every field is optional at the parsing stage so that a missing field is
/// reported as a missing field rather than as malformed JSON.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
    /// The name of the application the payment came from.
    #[serde(alias = "nombreAplicacion", skip_serializing_if = "Option::is_none")]
    pub application_name: Option<String>,
    /// The display name of the user who paid or was paid.
    #[serde(alias = "nombreUsuario", skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    /// How much money was transferred.
    #[serde(alias = "dineroTransaccionado", skip_serializing_if = "Option::is_none")]
    pub amount: Option<Amount>,
    /// The registration token of the device to notify.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_token: Option<String>,
}

impl CreateTransactionRequest {
    /// Check the required fields and build the transaction to store, along
    /// with the device token to notify, if any.
    ///
    /// # Errors
    /// Returns [Error::MissingFields] if the application name, user name or
    /// amount is missing or blank, or if `mode` is
    /// [NotificationMode::Required] and there is no device token.
    fn validate(self, mode: NotificationMode) -> Result<(Transaction, Option<String>), Error> {
        let application_name = non_blank(self.application_name).ok_or(Error::MissingFields)?;
        let user_name = non_blank(self.user_name).ok_or(Error::MissingFields)?;
        let amount = self
            .amount
            .filter(|amount| !amount.is_blank())
            .ok_or(Error::MissingFields)?;

        let device_token = match mode {
            NotificationMode::Required => {
                Some(non_blank(self.device_token).ok_or(Error::MissingFields)?)
            }
            NotificationMode::Optional => non_blank(self.device_token),
            NotificationMode::Disabled => None,
        };

        Ok((
            Transaction::new(application_name, user_name, amount),
            device_token,
        ))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

/// The JSON body sent back after creating a transaction.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateTransactionResponse {
    /// The ID the store generated for the transaction.
    pub id: TransactionId,
    /// A confirmation message.
    pub message: String,
    /// The transaction as it was stored.
    pub transaction: Transaction,
}

/// A route handler for creating a new transaction, responds with 201 Created
/// and the stored transaction on success.
///
/// If a device token is given (and notifications are not disabled), a push
/// notification is sent after the transaction is stored. A failed
/// notification does not change the response.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    payload: Result<Json<CreateTransactionRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return Error::InvalidJson(rejection.body_text()).into_response(),
    };

    let (transaction, device_token) = match request.validate(state.notification_mode) {
        Ok(validated) => validated,
        Err(error) => return error.into_response(),
    };

    let (id, transaction) = match state.transaction_store.append(transaction).await {
        Ok(stored) => stored,
        Err(error) => return error.into_response(),
    };

    tracing::info!("Created transaction {id}");

    if let Some(device_token) = device_token {
        notify(
            state.notifier.as_ref(),
            &device_token,
            &id,
            &transaction.amount.to_string(),
            PLACEHOLDER_PAYMENT_METHOD,
        )
        .await;
    }

    (
        StatusCode::CREATED,
        Json(CreateTransactionResponse {
            id,
            message: CREATED_MESSAGE.to_owned(),
            transaction,
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{Json, extract::State, http::StatusCode, response::Response};

    use crate::{
        Error,
        config::NotificationMode,
        notification::NotificationRequest,
        stores::{InMemoryTransactionStore, TransactionStore},
        test_utils::{RecordingNotifier, UnavailableStore},
        transaction::Amount,
    };

    use super::{
        CREATED_MESSAGE, CreateTransactionRequest, CreateTransactionResponse,
        CreateTransactionState, PLACEHOLDER_PAYMENT_METHOD, create_transaction_endpoint,
    };

    fn request(device_token: Option<&str>) -> CreateTransactionRequest {
        CreateTransactionRequest {
            application_name: Some("Shop".to_owned()),
            user_name: Some("Ana".to_owned()),
            amount: Some(Amount::from("25.00")),
            device_token: device_token.map(str::to_owned),
        }
    }

    fn get_test_state(
        mode: NotificationMode,
    ) -> (
        CreateTransactionState,
        Arc<InMemoryTransactionStore>,
        Arc<RecordingNotifier>,
    ) {
        let store = Arc::new(InMemoryTransactionStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let state = CreateTransactionState {
            transaction_store: store.clone(),
            notifier: notifier.clone(),
            notification_mode: mode,
        };

        (state, store, notifier)
    }

    async fn parse_created(response: Response) -> CreateTransactionResponse {
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        serde_json::from_slice(&body).unwrap()
    }

    #[test]
    fn validation_rejects_each_missing_field() {
        let cases = [
            CreateTransactionRequest {
                application_name: None,
                ..request(None)
            },
            CreateTransactionRequest {
                user_name: Some(" ".to_owned()),
                ..request(None)
            },
            CreateTransactionRequest {
                amount: Some(Amount::from("")),
                ..request(None)
            },
            CreateTransactionRequest::default(),
        ];

        for case in cases {
            let result = case.validate(NotificationMode::Optional);
            assert_eq!(result.err(), Some(Error::MissingFields));
        }
    }

    #[test]
    fn validation_requires_token_in_required_mode() {
        let result = request(None).validate(NotificationMode::Required);

        assert_eq!(result.err(), Some(Error::MissingFields));
    }

    #[test]
    fn validation_drops_token_in_disabled_mode() {
        let (_, device_token) = request(Some("device-1"))
            .validate(NotificationMode::Disabled)
            .unwrap();

        assert_eq!(device_token, None);
    }

    #[tokio::test]
    async fn can_create_transaction() {
        let (state, store, notifier) = get_test_state(NotificationMode::Optional);

        let response = create_transaction_endpoint(State(state), Ok(Json(request(None)))).await;

        let created = parse_created(response).await;
        assert!(!created.id.is_empty());
        assert_eq!(created.message, CREATED_MESSAGE);
        assert_eq!(created.transaction.application_name, "Shop");
        assert_eq!(created.transaction.user_name, "Ana");
        assert_eq!(created.transaction.amount, Amount::from("25.00"));

        let stored = store.list_all().await.unwrap();
        assert_eq!(stored.get(&created.id), Some(&created.transaction));
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn notifies_device_when_token_given() {
        let (state, _, notifier) = get_test_state(NotificationMode::Optional);

        let response =
            create_transaction_endpoint(State(state), Ok(Json(request(Some("device-1"))))).await;

        let created = parse_created(response).await;
        assert_eq!(
            notifier.sent(),
            vec![NotificationRequest {
                device_token: "device-1".to_owned(),
                transaction_id: created.id,
                amount: "25.00".to_owned(),
                method: PLACEHOLDER_PAYMENT_METHOD.to_owned(),
            }]
        );
    }

    #[tokio::test]
    async fn does_not_notify_when_disabled() {
        let (state, _, notifier) = get_test_state(NotificationMode::Disabled);

        let response =
            create_transaction_endpoint(State(state), Ok(Json(request(Some("device-1"))))).await;

        parse_created(response).await;
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn missing_token_in_required_mode_stores_nothing() {
        let (state, store, notifier) = get_test_state(NotificationMode::Required);

        let response = create_transaction_endpoint(State(state), Ok(Json(request(None)))).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(store.list_all().await.unwrap().is_empty());
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn failed_notification_still_creates_transaction() {
        let store = Arc::new(InMemoryTransactionStore::new());
        let state = CreateTransactionState {
            transaction_store: store.clone(),
            notifier: Arc::new(RecordingNotifier::failing()),
            notification_mode: NotificationMode::Required,
        };

        let response =
            create_transaction_endpoint(State(state), Ok(Json(request(Some("device-1"))))).await;

        let created = parse_created(response).await;
        assert!(store.list_all().await.unwrap().contains_key(&created.id));
    }

    #[tokio::test]
    async fn unavailable_store_is_internal_server_error_without_notification() {
        let notifier = Arc::new(RecordingNotifier::default());
        let state = CreateTransactionState {
            transaction_store: Arc::new(UnavailableStore),
            notifier: notifier.clone(),
            notification_mode: NotificationMode::Optional,
        };

        let response =
            create_transaction_endpoint(State(state), Ok(Json(request(Some("device-1"))))).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(notifier.sent().is_empty());
    }
}
