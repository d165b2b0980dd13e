//! This file defines the pandora-series binary entry point.

use pandora_series::app;
use pandora_series::cli;
use pandora_series::metrics;
use pandora_series::server;
use pandora_series::tracing;

/// Application entry point
#[tokio::main]
async fn main() {
    let args = cli::parse();
    tracing::init_tracing(&args);
    ::tracing::debug!(?args, "parsed arguments");
    metrics::register_metrics();
    app::init(&args);
    let service = app::service(&args);
    server::serve(&args, service).await;
}
