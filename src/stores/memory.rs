//! Implements a transaction store that keeps everything in memory.
use std::{collections::BTreeMap, sync::Mutex};

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::{
    Error,
    push_id::PushIdGenerator,
    stores::TransactionStore,
    transaction::{Transaction, TransactionId},
};

#[derive(Debug, Default)]
struct State {
    transactions: BTreeMap<TransactionId, Transaction>,
    ids: PushIdGenerator,
}

/// Stores transactions in memory, generating keys the same way the Realtime
/// Database does.
///
/// Everything is lost when the process exits. Intended for local development
/// and tests.
#[derive(Debug, Default)]
pub struct InMemoryTransactionStore {
    state: Mutex<State>,
}

impl InMemoryTransactionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn list_all(&self) -> Result<BTreeMap<TransactionId, Transaction>, Error> {
        let state = self
            .state
            .lock()
            .map_err(|error| Error::StorageRead(format!("could not acquire store lock: {error}")))?;

        Ok(state.transactions.clone())
    }

    async fn append(
        &self,
        transaction: Transaction,
    ) -> Result<(TransactionId, Transaction), Error> {
        let mut state = self.state.lock().map_err(|error| {
            Error::StorageWrite(format!("could not acquire store lock: {error}"))
        })?;

        let now_millis = (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64;
        let id = state.ids.generate(now_millis);
        state.transactions.insert(id.clone(), transaction.clone());

        Ok((id, transaction))
    }
}
