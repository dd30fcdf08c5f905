//! annoflag-worker - long-running NIPSA propagation worker process.
//!
//! Reads newline-delimited queue payloads from stdin (e.g. piped from a
//! broker tail CLI) and propagates each flag/unflag event into the search
//! index. Runs until stdin closes or a shutdown signal arrives.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use annoflag_index::HttpSearchIndex;
use annoflag_worker::{Listener, ListenerConfig, PipeConsumer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with configurable output
    //
    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_FILE    - path to log file (optional, enables file logging)
    //   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
    //   RUST_LOG    - standard env filter (default: "annoflag_worker=debug,annoflag_index=debug")
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "annoflag_worker=debug,annoflag_index=debug".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    let _file_guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("annoflag-worker.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false), // no ANSI in files
                )
                .init();
        }
        Some(guard)
    } else if log_format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
        None
    } else {
        let mut layer = tracing_subscriber::fmt::layer();
        if let Some(ansi) = log_ansi {
            layer = layer.with_ansi(ansi);
        }
        registry.with(layer).init();
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    // Get configuration from environment
    let index_url =
        std::env::var("INDEX_URL").unwrap_or_else(|_| "http://localhost:9200".to_string());
    let index_name = std::env::var("INDEX_NAME")
        .unwrap_or_else(|_| annoflag_core::defaults::INDEX_NAME.to_string());
    let config = ListenerConfig::from_env()?;

    info!(
        index_url = %index_url,
        index_name = %index_name,
        queue = %config.queue,
        channel = %config.channel,
        "Starting NIPSA propagation worker"
    );

    let index = Arc::new(HttpSearchIndex::new(index_url, index_name)?);
    let listener = Listener::new(index, PipeConsumer::stdin(), config);

    let handle = listener.start();
    let mut events = handle.events();

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received, draining");
            handle.shutdown().await?;
        }
        _ = annoflag_worker::wait_until_stopped(&mut events) => {
            info!("Queue closed, exiting");
        }
    }

    Ok(())
}
