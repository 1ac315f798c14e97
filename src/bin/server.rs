use std::net::{IpAddr, SocketAddr};

use axum::{
    Router,
    extract::{MatchedPath, Request},
};
use axum_server::Handle;
use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use paylog_rs::{
    AppState, Error, FirebaseApp, FirebaseConfig, NotificationMode, build_router,
    graceful_shutdown, notification::LogNotifier, stores::InMemoryTransactionStore,
};

/// The REST API server for paylog_rs.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// The address to listen on.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: IpAddr,

    /// The port to serve the API from.
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// Whether new transactions require, allow or ignore a device token to notify.
    #[arg(long, env = "NOTIFICATIONS", value_enum, default_value_t = NotificationMode::Optional)]
    notifications: NotificationMode,

    /// Keep transactions in memory and log notifications instead of using Firebase.
    #[arg(long)]
    in_memory: bool,
}

#[tokio::main]
async fn main() {
    // Load .env before parsing so that its values can fill in the arguments.
    dotenv::dotenv().ok();
    setup_logging();

    let args = Args::parse();

    let state = if args.in_memory {
        tracing::warn!("Running with the in-memory store, transactions will not be persisted");
        AppState::new(
            InMemoryTransactionStore::new(),
            LogNotifier,
            args.notifications,
        )
    } else {
        match connect_to_firebase(args.notifications) {
            Ok(state) => state,
            Err(error) => {
                tracing::error!("Could not initialize Firebase: {error}");
                std::process::exit(1);
            }
        }
    };

    tracing::info!("Notifications are {}", args.notifications);

    let addr = SocketAddr::from((args.host, args.port));

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = add_tracing_layer(build_router(state));

    tracing::info!("HTTP server listening on {}", addr);
    if let Err(error) = axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await
    {
        tracing::error!("Server error: {error}");
        std::process::exit(1);
    }
}

fn connect_to_firebase(notification_mode: NotificationMode) -> Result<AppState, Error> {
    let config = FirebaseConfig::from_env()?;
    let app = FirebaseApp::initialize(&config)?;
    tracing::info!("Firebase initialized: {app:?}");

    Ok(AppState::new(
        app.database(),
        app.messaging(),
        notification_mode,
    ))
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // By default, `TraceLayer` will log 5xx responses but we're doing our specific
        // logging of errors so disable that
        .on_failure(());

    router.layer(tracing_layer)
}
