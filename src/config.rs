//! Loads the Firebase service account and related settings from the environment.
//!
//! The loader functions take a `lookup` closure that maps a variable name to
//! its value so that they can be tested without touching the process
//! environment. Use the `from_env` variants in production.

use std::fmt;

use crate::Error;

/// The Firebase web API key.
pub const API_KEY: &str = "FIREBASE_API_KEY";
/// The Google Cloud project ID.
pub const PROJECT_ID: &str = "FIREBASE_PROJECT_ID";
/// The ID of the service account's private key.
pub const PRIVATE_KEY_ID: &str = "FIREBASE_PRIVATE_KEY_ID";
/// The service account's PEM private key, with newlines encoded as `\n`.
pub const PRIVATE_KEY: &str = "FIREBASE_PRIVATE_KEY";
/// The service account's email address.
pub const CLIENT_EMAIL: &str = "FIREBASE_CLIENT_EMAIL";
/// The service account's client ID.
pub const CLIENT_ID: &str = "FIREBASE_CLIENT_ID";
/// The URL of the Realtime Database, e.g. `https://my-app.firebaseio.com`.
pub const DATABASE_URL: &str = "FIREBASE_DATABASE_URL";

const AUTH_URI: &str = "FIREBASE_AUTH_URI";
const TOKEN_URI: &str = "FIREBASE_TOKEN_URI";
const AUTH_PROVIDER_CERT_URL: &str = "FIREBASE_AUTH_PROVIDER_CERT_URL";
const CLIENT_CERT_URL: &str = "FIREBASE_CLIENT_CERT_URL";
const UNIVERSE_DOMAIN: &str = "FIREBASE_UNIVERSE_DOMAIN";

/// The environment variables that must be set for the server to work.
pub const REQUIRED_VARIABLES: [&str; 7] = [
    API_KEY,
    PROJECT_ID,
    PRIVATE_KEY_ID,
    PRIVATE_KEY,
    CLIENT_EMAIL,
    CLIENT_ID,
    DATABASE_URL,
];

/// Controls whether creating a transaction sends a push notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum NotificationMode {
    /// Every new transaction must include a device token and is always notified.
    Required,
    /// A notification is sent only when the request includes a device token.
    #[default]
    Optional,
    /// Notifications are never sent, device tokens are ignored.
    Disabled,
}

impl fmt::Display for NotificationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NotificationMode::Required => "required",
            NotificationMode::Optional => "optional",
            NotificationMode::Disabled => "disabled",
        };

        f.write_str(name)
    }
}

/// The credentials of a Google service account, with the same fields as the
/// JSON key file that Google issues.
#[derive(Clone, PartialEq)]
pub struct ServiceAccount {
    /// Always "service_account".
    pub account_type: String,
    /// The Google Cloud project ID.
    pub project_id: String,
    /// The ID of the private key, sent as the `kid` of signed assertions.
    pub private_key_id: String,
    /// The decoded, multi-line PEM private key.
    pub private_key: String,
    /// The service account's email address.
    pub client_email: String,
    /// The service account's client ID.
    pub client_id: String,
    /// Passed through as-is.
    pub auth_uri: Option<String>,
    /// The OAuth2 token endpoint. Falls back to Google's default when unset.
    pub token_uri: Option<String>,
    /// Passed through as-is.
    pub auth_provider_x509_cert_url: Option<String>,
    /// Passed through as-is.
    pub client_x509_cert_url: Option<String>,
    /// Passed through as-is.
    pub universe_domain: Option<String>,
}

// The private key must never end up in the logs.
impl fmt::Debug for ServiceAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccount")
            .field("project_id", &self.project_id)
            .field("private_key_id", &self.private_key_id)
            .field("private_key", &"********")
            .field("client_email", &self.client_email)
            .field("client_id", &self.client_id)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

/// Everything needed to initialize a [crate::FirebaseApp].
#[derive(Debug, Clone, PartialEq)]
pub struct FirebaseConfig {
    /// The Firebase web API key. Not used for server-to-server calls, kept
    /// so that a missing key is reported at start up.
    pub api_key: Option<String>,
    /// The URL of the Realtime Database.
    pub database_url: String,
    /// The credentials used to sign requests.
    pub service_account: ServiceAccount,
}

impl FirebaseConfig {
    /// Load the config from the process environment.
    ///
    /// # Errors
    /// Returns [Error::MissingPrivateKey] if the private key is missing or empty.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load the config using `lookup` to read variables.
    ///
    /// Missing required variables are logged as warnings but are otherwise
    /// left for the client initialization to reject. The only fatal error at
    /// this stage is a missing private key.
    ///
    /// # Errors
    /// Returns [Error::MissingPrivateKey] if the private key is missing or empty.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        check_required_variables(&lookup);

        let private_key = lookup(PRIVATE_KEY)
            .map(|raw| decode_private_key(&raw))
            .filter(|key| !key.trim().is_empty())
            .ok_or(Error::MissingPrivateKey)?;

        let get = |name: &str| lookup(name).unwrap_or_default();
        let get_optional = |name: &str| lookup(name).filter(|value| !value.is_empty());

        let service_account = ServiceAccount {
            account_type: "service_account".to_owned(),
            project_id: get(PROJECT_ID),
            private_key_id: get(PRIVATE_KEY_ID),
            private_key,
            client_email: get(CLIENT_EMAIL),
            client_id: get(CLIENT_ID),
            auth_uri: get_optional(AUTH_URI),
            token_uri: get_optional(TOKEN_URI),
            auth_provider_x509_cert_url: get_optional(AUTH_PROVIDER_CERT_URL),
            client_x509_cert_url: get_optional(CLIENT_CERT_URL),
            universe_domain: get_optional(UNIVERSE_DOMAIN),
        };

        Ok(Self {
            api_key: get_optional(API_KEY),
            database_url: get(DATABASE_URL),
            service_account,
        })
    }
}

/// Check that each of [REQUIRED_VARIABLES] is set and not empty.
///
/// Logs a warning for each missing variable and returns their names.
pub fn check_required_variables(lookup: impl Fn(&str) -> Option<String>) -> Vec<&'static str> {
    let mut missing = Vec::new();

    for name in REQUIRED_VARIABLES {
        match lookup(name) {
            Some(value) if !value.is_empty() => tracing::info!("{name} loaded"),
            _ => {
                tracing::warn!("Missing environment variable: {name}");
                missing.push(name);
            }
        }
    }

    missing
}

/// Replace the two character sequence `\n` with a real newline.
///
/// Multi-line PEM keys are usually stored in environment variables as a
/// single line with escaped newlines.
pub fn decode_private_key(raw: &str) -> String {
    raw.replace("\\n", "\n")
}
