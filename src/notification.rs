//! Push notifications about new transactions, sent with Firebase Cloud Messaging.
//!
//! Notifications are best effort: [notify] logs a failed delivery and returns
//! normally, so callers never fail because a device could not be reached.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use serde::Serialize;

use crate::{Error, credentials::TokenSource};

/// The title of every transaction notification.
pub const NOTIFICATION_TITLE: &str = "New Transaction";

/// The FCM HTTP v1 API root.
pub const CLOUD_MESSAGING_BASE_URL: &str = "https://fcm.googleapis.com/v1";

/// A notification about one stored transaction, addressed to one device.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationRequest {
    /// The registration token of the device to notify.
    pub device_token: String,
    /// The key of the stored transaction.
    pub transaction_id: String,
    /// The amount as the client sent it.
    pub amount: String,
    /// How the payment was made.
    pub method: String,
}

impl NotificationRequest {
    /// The text shown under the title.
    pub fn body(&self) -> String {
        format!("Amount: {} via {}", self.amount, self.method)
    }

    /// The data payload. FCM only accepts string values here.
    pub fn data(&self) -> HashMap<&'static str, String> {
        HashMap::from([
            ("transactionId", self.transaction_id.clone()),
            ("amount", self.amount.clone()),
            ("method", self.method.clone()),
        ])
    }
}

/// Delivers notifications to devices.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `request` once.
    ///
    /// # Errors
    /// Returns [Error::Notification] if the provider rejects the message or
    /// cannot be reached.
    async fn send(&self, request: &NotificationRequest) -> Result<(), Error>;
}

/// Send a notification about a new transaction, logging the outcome.
///
/// A failure is logged as a warning and otherwise ignored.
pub async fn notify(
    notifier: &dyn Notifier,
    device_token: &str,
    transaction_id: &str,
    amount: &str,
    method: &str,
) {
    let request = NotificationRequest {
        device_token: device_token.to_owned(),
        transaction_id: transaction_id.to_owned(),
        amount: amount.to_owned(),
        method: method.to_owned(),
    };

    match notifier.send(&request).await {
        Ok(()) => tracing::info!("Sent notification for transaction {transaction_id}"),
        Err(error) => {
            tracing::warn!("Could not notify device about transaction {transaction_id}: {error}")
        }
    }
}

#[derive(Debug, Serialize)]
struct SendMessageBody<'a> {
    message: Message<'a>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    token: &'a str,
    notification: Notification,
    data: HashMap<&'static str, String>,
}

#[derive(Debug, Serialize)]
struct Notification {
    title: &'static str,
    body: String,
}

/// Sends notifications with the FCM HTTP v1 API.
#[derive(Clone)]
pub struct CloudMessagingNotifier {
    http_client: reqwest::Client,
    send_url: String,
    credentials: Arc<dyn TokenSource>,
}

impl CloudMessagingNotifier {
    /// Create a notifier for the Firebase project `project_id`.
    pub fn new(
        http_client: reqwest::Client,
        project_id: &str,
        credentials: Arc<dyn TokenSource>,
    ) -> Self {
        Self::with_base_url(http_client, CLOUD_MESSAGING_BASE_URL, project_id, credentials)
    }

    /// Create a notifier that talks to the API rooted at `base_url`.
    pub fn with_base_url(
        http_client: reqwest::Client,
        base_url: &str,
        project_id: &str,
        credentials: Arc<dyn TokenSource>,
    ) -> Self {
        let send_url = format!(
            "{}/projects/{project_id}/messages:send",
            base_url.trim_end_matches('/')
        );

        Self {
            http_client,
            send_url,
            credentials,
        }
    }

    /// The endpoint messages are posted to.
    pub fn send_url(&self) -> &str {
        &self.send_url
    }
}

#[async_trait]
impl Notifier for CloudMessagingNotifier {
    async fn send(&self, request: &NotificationRequest) -> Result<(), Error> {
        let token = self
            .credentials
            .access_token()
            .await
            .map_err(|error| Error::Notification(error.to_string()))?;

        let body = SendMessageBody {
            message: Message {
                token: &request.device_token,
                notification: Notification {
                    title: NOTIFICATION_TITLE,
                    body: request.body(),
                },
                data: request.data(),
            },
        };

        let response = self
            .http_client
            .post(&self.send_url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|error| Error::Notification(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Notification(format!("{status}: {text}")));
        }

        Ok(())
    }
}

/// A notifier that only logs, for running without Firebase.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, request: &NotificationRequest) -> Result<(), Error> {
        tracing::info!(
            "{NOTIFICATION_TITLE}: {} (transaction {})",
            request.body(),
            request.transaction_id
        );

        Ok(())
    }
}
