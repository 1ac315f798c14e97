//! OAuth2 access tokens for a service account.
//!
//! Tokens are obtained with the JWT bearer grant: a short-lived assertion is
//! signed with the service account's private key and exchanged at the token
//! endpoint for an access token, which is cached until shortly before it
//! expires.

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use tokio::sync::Mutex;

use crate::{Error, config::ServiceAccount};

/// Used when the service account does not specify a token endpoint.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// The scopes needed to read and write the Realtime Database and send
/// messages with Firebase Cloud Messaging.
const SCOPES: &str = "https://www.googleapis.com/auth/firebase.database \
    https://www.googleapis.com/auth/userinfo.email \
    https://www.googleapis.com/auth/firebase.messaging";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Google accepts assertions that are valid for at most an hour.
const ASSERTION_LIFETIME: Duration = Duration::hours(1);

/// Cached tokens are refreshed this long before they expire.
const EXPIRY_MARGIN: Duration = Duration::minutes(1);

/// Something that can produce a bearer token for outgoing requests.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Get a valid access token.
    async fn access_token(&self) -> Result<String, Error>;
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: OffsetDateTime,
}

impl CachedToken {
    fn is_fresh(&self, now: OffsetDateTime) -> bool {
        self.expires_at - EXPIRY_MARGIN > now
    }
}

/// Exchanges signed assertions for access tokens on behalf of a service account.
pub struct ServiceAccountTokenSource {
    http_client: reqwest::Client,
    client_email: String,
    private_key_id: String,
    token_uri: String,
    encoding_key: EncodingKey,
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountTokenSource {
    /// Create a token source for `account`.
    ///
    /// # Errors
    /// Returns [Error::InvalidPrivateKey] if the private key is not a valid
    /// RSA key in PEM format.
    pub fn new(http_client: reqwest::Client, account: &ServiceAccount) -> Result<Self, Error> {
        let encoding_key = EncodingKey::from_rsa_pem(account.private_key.as_bytes())
            .map_err(|error| Error::InvalidPrivateKey(error.to_string()))?;

        Ok(Self {
            http_client,
            client_email: account.client_email.clone(),
            private_key_id: account.private_key_id.clone(),
            token_uri: account
                .token_uri
                .clone()
                .unwrap_or_else(|| DEFAULT_TOKEN_URI.to_owned()),
            encoding_key,
            cached: Mutex::new(None),
        })
    }

    fn sign_assertion(&self, now: OffsetDateTime) -> Result<String, Error> {
        let mut header = Header::new(Algorithm::RS256);
        if !self.private_key_id.is_empty() {
            header.kid = Some(self.private_key_id.clone());
        }

        let claims = Claims {
            iss: &self.client_email,
            scope: SCOPES,
            aud: &self.token_uri,
            iat: now.unix_timestamp(),
            exp: (now + ASSERTION_LIFETIME).unix_timestamp(),
        };

        jsonwebtoken::encode(&header, &claims, &self.encoding_key)
            .map_err(|error| Error::Credentials(format!("could not sign assertion: {error}")))
    }

    async fn fetch_token(&self, now: OffsetDateTime) -> Result<CachedToken, Error> {
        let assertion = self.sign_assertion(now)?;

        let response = self
            .http_client
            .post(&self.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|error| Error::Credentials(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Credentials(format!(
                "token endpoint returned {status}: {body}"
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|error| Error::Credentials(error.to_string()))?;

        tracing::debug!("Obtained access token valid for {}s", token.expires_in);

        Ok(CachedToken {
            value: token.access_token,
            expires_at: now + Duration::seconds(token.expires_in),
        })
    }
}

#[async_trait]
impl TokenSource for ServiceAccountTokenSource {
    async fn access_token(&self) -> Result<String, Error> {
        let mut cached = self.cached.lock().await;
        let now = OffsetDateTime::now_utc();

        if let Some(token) = cached.as_ref().filter(|token| token.is_fresh(now)) {
            return Ok(token.value.clone());
        }

        let token = self.fetch_token(now).await?;
        let value = token.value.clone();
        *cached = Some(token);

        Ok(value)
    }
}

/// A token source that always returns the same token.
///
/// Useful for emulators and tests where no real authentication takes place.
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

#[async_trait]
impl TokenSource for StaticToken {
    async fn access_token(&self) -> Result<String, Error> {
        Ok(self.0.clone())
    }
}
