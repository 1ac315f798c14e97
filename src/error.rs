//! Defines the app level error type and its conversion to JSON error responses.
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The private key is missing from the environment, or is empty after
    /// decoding escaped newlines.
    #[error("the service account private key is missing or empty")]
    MissingPrivateKey,

    /// The private key is present but could not be parsed as an RSA PEM key.
    #[error("the service account private key is invalid: {0}")]
    InvalidPrivateKey(String),

    /// The database or messaging client could not be initialized from the
    /// service account, e.g. the database URL is malformed.
    #[error("could not initialize the Firebase client: {0}")]
    ClientInitialization(String),

    /// One or more of the required fields for creating a transaction were
    /// missing or empty.
    #[error("missing required fields")]
    MissingFields,

    /// The request body could not be parsed as JSON.
    #[error("invalid JSON body: {0}")]
    InvalidJson(String),

    /// The request body is larger than the given number of bytes.
    #[error("request body is larger than {0} bytes")]
    PayloadTooLarge(usize),

    /// Reading from the database failed.
    ///
    /// The string is the message of the underlying transport or server error.
    #[error("could not read transactions: {0}")]
    StorageRead(String),

    /// Writing to the database failed.
    ///
    /// The string is the message of the underlying transport or server error.
    #[error("could not save transaction: {0}")]
    StorageWrite(String),

    /// An OAuth2 access token could not be obtained for the service account.
    #[error("could not obtain an access token: {0}")]
    Credentials(String),

    /// A push notification could not be delivered.
    ///
    /// This error is only ever logged, it is never sent to the client.
    #[error("could not send notification: {0}")]
    Notification(String),
}

impl Error {
    /// The HTTP status code the error maps to when it reaches a route handler.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::MissingFields | Error::InvalidJson(_) => StatusCode::BAD_REQUEST,
            Error::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        if status_code.is_server_error() {
            tracing::error!("{self}");
        } else {
            tracing::debug!("rejected request: {self}");
        }

        (status_code, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use super::Error;

    async fn response_json(error: Error) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn validation_errors_are_bad_requests() {
        let (status, body) = response_json(Error::MissingFields).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "missing required fields");
    }

    #[tokio::test]
    async fn storage_errors_echo_the_underlying_message() {
        let (status, body) =
            response_json(Error::StorageRead("connection refused".to_owned())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body["error"],
            "could not read transactions: connection refused"
        );
    }

    #[test]
    fn write_errors_are_server_errors() {
        assert_eq!(
            Error::StorageWrite("timeout".to_owned()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn oversized_bodies_are_payload_too_large() {
        assert_eq!(
            Error::PayloadTooLarge(16).status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }
}
