//! worldstate-notifier entry point.
//!
//! Starts the poll loop, the inbound command loop and, unless disabled,
//! the status API. Ctrl-C or SIGTERM stops all three.

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use worldstate_notifier::api;
use worldstate_notifier::app_state::AppState;
use worldstate_notifier::chat::commands::run_inbound;
use worldstate_notifier::chat::{CommandHandler, TelegramClient};
use worldstate_notifier::config::NotifierConfig;
use worldstate_notifier::feed::{HttpFeedClient, Normalizer};
use worldstate_notifier::service::{Dispatcher, PollLoop};
use worldstate_notifier::store::{AlertRepository, DocumentStore, SubscriberRepository};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    // Load configuration
    let config = NotifierConfig::from_env()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;
    tracing::info!(
        feed = %config.feed_base_url,
        token = %config.masked_token(),
        poll_interval_secs = config.poll_interval().as_secs(),
        "starting worldstate-notifier"
    );

    // Build store layer
    let store = Arc::new(
        DocumentStore::open(config.data_dir.clone())
            .await
            .context("opening document store")?,
    );
    tracing::info!(root = %store.root().display(), "document store ready");
    let subscribers = SubscriberRepository::new(Arc::clone(&store));
    let alerts = AlertRepository::new(Arc::clone(&store));

    // Build transports
    let feed = Arc::new(HttpFeedClient::new(
        &config.feed_base_url,
        &config.feed_language,
        config.http_timeout(),
    )?);
    let chat = Arc::new(TelegramClient::new(
        &config.telegram_api_url,
        &config.telegram_bot_token,
        config.http_timeout(),
    )?);

    // Build service layer
    let poll = Arc::new(PollLoop::new(
        Normalizer::new(feed),
        Dispatcher::new(Arc::clone(&chat), subscribers.clone()),
        alerts.clone(),
        config.poll_interval(),
    ));
    let commands = Arc::new(CommandHandler::new(
        chat,
        subscribers.clone(),
        alerts,
        poll.snapshots(),
    ));

    let shutdown = CancellationToken::new();
    tokio::spawn(shutdown_signal(shutdown.clone()));

    let poll_task = tokio::spawn({
        let poll = Arc::clone(&poll);
        let shutdown = shutdown.clone();
        async move { poll.run(shutdown).await }
    });
    let inbound_task = tokio::spawn(run_inbound(
        commands,
        config.inbound_poll_timeout(),
        shutdown.clone(),
    ));

    if config.status_api_enabled {
        let app_state = AppState {
            reports: poll.reports(),
            subscribers,
            poll_interval: config.poll_interval(),
        };
        let app = Router::new()
            .merge(api::build_router())
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(app_state);

        let listener = tokio::net::TcpListener::bind(config.listen_addr)
            .await
            .with_context(|| format!("binding {}", config.listen_addr))?;
        tracing::info!(addr = %config.listen_addr, "status API listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown.clone().cancelled_owned())
            .await?;
    } else {
        tracing::info!("status API disabled");
        shutdown.cancelled().await;
    }

    // The in-flight cycle is allowed to finish.
    let (poll_result, inbound_result) = tokio::join!(poll_task, inbound_task);
    if let Err(e) = poll_result {
        tracing::error!(error = %e, "poll loop task failed");
    }
    if let Err(e) = inbound_result {
        tracing::error!(error = %e, "inbound command task failed");
    }

    tracing::info!("shutdown complete");
    Ok(())
}

/// Installs the global subscriber. `LOG_FORMAT=json` selects JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Cancels `shutdown` on Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    tracing::info!("shutdown signal received");
    shutdown.cancel();
}
