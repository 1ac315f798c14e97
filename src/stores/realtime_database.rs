//! Implements a transaction store backed by the Firebase Realtime Database REST API.
use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use serde::Deserialize;

use crate::{
    Error,
    credentials::TokenSource,
    stores::TransactionStore,
    transaction::{Transaction, TransactionId},
};

/// The path of the collection that transactions are stored under.
pub const COLLECTION: &str = "transactions";

/// The response to a `POST`, which holds the key generated for the new child.
#[derive(Debug, Deserialize)]
struct PushResponse {
    name: TransactionId,
}

/// Stores transactions under [COLLECTION] in a Realtime Database.
///
/// Keys for new transactions are generated by the database, so concurrent
/// appends never conflict.
#[derive(Clone)]
pub struct RealtimeDatabaseStore {
    http_client: reqwest::Client,
    collection_url: String,
    credentials: Arc<dyn TokenSource>,
}

impl RealtimeDatabaseStore {
    /// Create a store for the database at `database_url`, e.g.
    /// `https://my-app-default-rtdb.firebaseio.com`.
    pub fn new(
        http_client: reqwest::Client,
        database_url: &str,
        credentials: Arc<dyn TokenSource>,
    ) -> Self {
        let collection_url = format!("{}/{COLLECTION}.json", database_url.trim_end_matches('/'));

        Self {
            http_client,
            collection_url,
            credentials,
        }
    }

    /// The REST endpoint for the transactions collection.
    pub fn collection_url(&self) -> &str {
        &self.collection_url
    }
}

/// Turn a non-success response into an error message that includes the body,
/// which is where the database explains what went wrong.
async fn describe_failure(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    match serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|value| value.get("error").and_then(|e| e.as_str()).map(str::to_owned))
    {
        Some(message) => format!("{status}: {message}"),
        None => format!("{status}: {body}"),
    }
}

/// Convert the children of the collection into transactions.
///
/// Other clients can write to the collection, so a child that is not a valid
/// transaction is logged and left out instead of failing the whole read.
fn parse_children(
    children: BTreeMap<TransactionId, serde_json::Value>,
) -> BTreeMap<TransactionId, Transaction> {
    children
        .into_iter()
        .filter_map(|(id, value)| match serde_json::from_value::<Transaction>(value) {
            Ok(transaction) => Some((id, transaction)),
            Err(error) => {
                tracing::warn!("Skipping malformed transaction {id}: {error}");
                None
            }
        })
        .collect()
}

#[async_trait]
impl TransactionStore for RealtimeDatabaseStore {
    async fn list_all(&self) -> Result<BTreeMap<TransactionId, Transaction>, Error> {
        let token = self
            .credentials
            .access_token()
            .await
            .map_err(|error| Error::StorageRead(error.to_string()))?;

        let response = self
            .http_client
            .get(&self.collection_url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|error| Error::StorageRead(error.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::StorageRead(describe_failure(response).await));
        }

        // The database returns `null` for a path that has no data.
        let children: Option<BTreeMap<TransactionId, serde_json::Value>> = response
            .json()
            .await
            .map_err(|error| Error::StorageRead(error.to_string()))?;

        Ok(parse_children(children.unwrap_or_default()))
    }

    async fn append(
        &self,
        transaction: Transaction,
    ) -> Result<(TransactionId, Transaction), Error> {
        let token = self
            .credentials
            .access_token()
            .await
            .map_err(|error| Error::StorageWrite(error.to_string()))?;

        let response = self
            .http_client
            .post(&self.collection_url)
            .bearer_auth(token)
            .json(&transaction)
            .send()
            .await
            .map_err(|error| Error::StorageWrite(error.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::StorageWrite(describe_failure(response).await));
        }

        let PushResponse { name } = response
            .json()
            .await
            .map_err(|error| Error::StorageWrite(error.to_string()))?;

        tracing::debug!("Stored transaction {name}");

        Ok((name, transaction))
    }
}
