//! Test doubles for the store and the notifier.

use std::{collections::BTreeMap, sync::Mutex};

use async_trait::async_trait;

use crate::{
    Error,
    notification::{NotificationRequest, Notifier},
    stores::TransactionStore,
    transaction::{Transaction, TransactionId},
};

/// A store whose every operation fails as if the database were unreachable.
pub(crate) struct UnavailableStore;

#[async_trait]
impl TransactionStore for UnavailableStore {
    async fn list_all(&self) -> Result<BTreeMap<TransactionId, Transaction>, Error> {
        Err(Error::StorageRead("connection refused".to_owned()))
    }

    async fn append(
        &self,
        _transaction: Transaction,
    ) -> Result<(TransactionId, Transaction), Error> {
        Err(Error::StorageWrite("connection refused".to_owned()))
    }
}

/// A notifier that remembers every delivery attempt.
#[derive(Default)]
pub(crate) struct RecordingNotifier {
    attempts: Mutex<Vec<NotificationRequest>>,
    fail: bool,
}

impl RecordingNotifier {
    /// A notifier that records attempts and then fails them.
    pub(crate) fn failing() -> Self {
        Self {
            attempts: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// Every request passed to [Notifier::send] so far.
    pub(crate) fn sent(&self) -> Vec<NotificationRequest> {
        self.attempts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, request: &NotificationRequest) -> Result<(), Error> {
        self.attempts.lock().unwrap().push(request.clone());

        if self.fail {
            Err(Error::Notification("device not registered".to_owned()))
        } else {
            Ok(())
        }
    }
}
