//! Defines the core data models for transactions.

use std::fmt;

use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, UtcOffset};

/// The key the store generates for a transaction.
pub type TransactionId = String;

/// A payment made or received through another application.
///
/// Transactions are immutable: once stored they are never updated or deleted.
///
/// Clients written against the earlier API send Spanish field names, these
/// are accepted as input aliases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The name of the application the payment came from.
    #[serde(alias = "nombreAplicacion")]
    pub application_name: String,
    /// The display name of the user who paid or was paid.
    #[serde(alias = "nombreUsuario")]
    pub user_name: String,
    /// How much money was transferred, stored exactly as the client sent it.
    #[serde(alias = "dineroTransaccionado")]
    pub amount: Amount,
    /// When the server received the transaction, in ISO-8601 format.
    #[serde(alias = "fechaTransaccion")]
    pub timestamp: String,
}

impl Transaction {
    /// Create a new transaction stamped with the current server time.
    pub fn new(application_name: String, user_name: String, amount: Amount) -> Self {
        Self {
            application_name,
            user_name,
            amount,
            timestamp: server_timestamp(OffsetDateTime::now_utc()),
        }
    }
}

/// An amount of money as the client sent it, either a JSON string or number.
///
/// No currency or precision normalization is done.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    /// A numeric amount, e.g. `25.5`.
    Number(serde_json::Number),
    /// A textual amount, e.g. `"25.50"`.
    Text(String),
}

impl Amount {
    /// Whether the amount counts as missing: an empty or blank string, or zero.
    pub fn is_blank(&self) -> bool {
        match self {
            Amount::Text(text) => text.trim().is_empty(),
            Amount::Number(number) => number.as_f64() == Some(0.0),
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Amount::Number(number) => write!(f, "{number}"),
            Amount::Text(text) => f.write_str(text),
        }
    }
}

impl From<&str> for Amount {
    fn from(value: &str) -> Self {
        Amount::Text(value.to_owned())
    }
}

/// Format `time` as an RFC 3339 UTC timestamp with millisecond precision,
/// e.g. `2024-05-01T12:30:00.125Z`.
pub fn server_timestamp(time: OffsetDateTime) -> String {
    let time = time.to_offset(UtcOffset::UTC);

    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}Z",
        time.year(),
        u8::from(time.month()),
        time.day(),
        time.hour(),
        time.minute(),
        time.second(),
        time.millisecond()
    )
}
