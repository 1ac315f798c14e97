//! The long-lived Firebase client shared by the database store and the notifier.

use std::sync::Arc;

use reqwest::Url;

use crate::{
    Error,
    config::FirebaseConfig,
    credentials::{ServiceAccountTokenSource, TokenSource},
    notification::CloudMessagingNotifier,
    stores::RealtimeDatabaseStore,
};

/// An initialized connection to a Firebase project.
///
/// Created once at start up. The HTTP connection pool and the access token
/// cache are shared by every handle derived from it.
#[derive(Clone)]
pub struct FirebaseApp {
    http_client: reqwest::Client,
    database_url: Url,
    project_id: String,
    credentials: Arc<dyn TokenSource>,
}

impl std::fmt::Debug for FirebaseApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirebaseApp")
            .field("database_url", &self.database_url.as_str())
            .field("project_id", &self.project_id)
            .finish_non_exhaustive()
    }
}

impl FirebaseApp {
    /// Initialize the client from `config`.
    ///
    /// # Errors
    /// Returns:
    /// - [Error::ClientInitialization] if the project ID or client email is
    ///   missing, or the database URL is not an HTTP(S) URL,
    /// - [Error::InvalidPrivateKey] if the private key cannot be parsed.
    pub fn initialize(config: &FirebaseConfig) -> Result<Self, Error> {
        let account = &config.service_account;

        if account.project_id.is_empty() {
            return Err(Error::ClientInitialization(
                "service account must have a project ID".to_owned(),
            ));
        }

        if account.client_email.is_empty() {
            return Err(Error::ClientInitialization(
                "service account must have a client email".to_owned(),
            ));
        }

        let database_url = parse_database_url(&config.database_url)?;

        let http_client = reqwest::Client::builder()
            .build()
            .map_err(|error| Error::ClientInitialization(error.to_string()))?;

        let credentials = ServiceAccountTokenSource::new(http_client.clone(), account)?;

        Ok(Self::with_token_source(
            http_client,
            database_url,
            account.project_id.clone(),
            Arc::new(credentials),
        ))
    }

    /// Create a client that authenticates with `credentials` instead of a
    /// service account, e.g. to talk to the Firebase emulators.
    pub fn with_token_source(
        http_client: reqwest::Client,
        database_url: Url,
        project_id: String,
        credentials: Arc<dyn TokenSource>,
    ) -> Self {
        Self {
            http_client,
            database_url,
            project_id,
            credentials,
        }
    }

    /// A store for the transactions collection of the project's database.
    pub fn database(&self) -> RealtimeDatabaseStore {
        RealtimeDatabaseStore::new(
            self.http_client.clone(),
            self.database_url.as_str(),
            self.credentials.clone(),
        )
    }

    /// A notifier that sends push notifications through the project.
    pub fn messaging(&self) -> CloudMessagingNotifier {
        CloudMessagingNotifier::new(
            self.http_client.clone(),
            &self.project_id,
            self.credentials.clone(),
        )
    }
}

fn parse_database_url(raw: &str) -> Result<Url, Error> {
    if raw.is_empty() {
        return Err(Error::ClientInitialization(
            "a database URL is required".to_owned(),
        ));
    }

    let url = Url::parse(raw).map_err(|error| {
        Error::ClientInitialization(format!("invalid database URL \"{raw}\": {error}"))
    })?;

    match url.scheme() {
        "https" | "http" => Ok(url),
        scheme => Err(Error::ClientInitialization(format!(
            "database URL must use http or https, got \"{scheme}\""
        ))),
    }
}
