//! Paylog is a small REST service that records payment transactions reported
//! by other applications.
//!
//! Transactions are stored in a Firebase Realtime Database and, when the
//! client supplies a device token, a push notification about the new
//! transaction is sent with Firebase Cloud Messaging.
//!
//! This library provides the REST API and the clients for both Firebase
//! services.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod app_state;
pub mod config;
pub mod credentials;
mod endpoints;
mod error;
mod firebase;
mod logging;
pub mod notification;
mod not_found;
mod push_id;
mod routing;
pub mod stores;
#[cfg(test)]
mod test_utils;
pub mod transaction;

pub use app_state::AppState;
pub use config::{FirebaseConfig, NotificationMode};
pub use endpoints::TRANSACTIONS_API;
pub use error::Error;
pub use firebase::FirebaseApp;
pub use logging::{LOG_BODY_LENGTH_LIMIT, MAX_REQUEST_BODY_BYTES, logging_middleware};
pub use push_id::PushIdGenerator;
pub use routing::build_router;
pub use transaction::{Amount, Transaction, TransactionId};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to install signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}
