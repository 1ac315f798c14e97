//! Implements a struct that holds the state of the REST server.

use std::sync::Arc;

use crate::{config::NotificationMode, notification::Notifier, stores::TransactionStore};

/// The state of the REST server.
///
/// Built once at start up and shared by every request.
#[derive(Clone)]
pub struct AppState {
    /// Where transactions are stored.
    pub transaction_store: Arc<dyn TransactionStore>,

    /// Sends push notifications for new transactions.
    pub notifier: Arc<dyn Notifier>,

    /// Whether creating a transaction requires, allows or ignores a device token.
    pub notification_mode: NotificationMode,
}

impl AppState {
    /// Create a new [AppState].
    pub fn new(
        transaction_store: impl TransactionStore + 'static,
        notifier: impl Notifier + 'static,
        notification_mode: NotificationMode,
    ) -> Self {
        Self {
            transaction_store: Arc::new(transaction_store),
            notifier: Arc::new(notifier),
            notification_mode,
        }
    }
}
