//! Defines the transaction store trait.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::{
    Error,
    transaction::{Transaction, TransactionId},
};

/// Handles the creation and retrieval of transactions.
///
/// The store is append-only: there is no way to update or delete a
/// transaction once it has been created.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Retrieve every transaction, keyed by the ID the store generated for it.
    ///
    /// An empty or missing collection is an empty map, not an error.
    ///
    /// # Errors
    /// Returns [Error::StorageRead] if the store could not be read.
    async fn list_all(&self) -> Result<BTreeMap<TransactionId, Transaction>, Error>;

    /// Add `transaction` to the store under a newly generated, unique ID.
    ///
    /// Returns the generated ID along with the stored transaction.
    ///
    /// # Errors
    /// Returns [Error::StorageWrite] if the transaction could not be written.
    async fn append(
        &self,
        transaction: Transaction,
    ) -> Result<(TransactionId, Transaction), Error>;
}
