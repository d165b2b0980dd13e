//! HTTP API: routing and request handlers.

use crate::app_state::{AppState, SharedAppState};
use crate::cli::CommandLineArgs;
use crate::error::SeriesError;
use crate::loader;
use crate::metrics;
use crate::models;
use crate::query;
use crate::validated_query::ValidatedQuery;

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use chrono::Datelike;
use tower::Layer;
use tower_http::cors::CorsLayer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::trace::TraceLayer;

/// Service that serves the API, ignoring trailing slashes in request paths.
pub type Service = NormalizePath<Router>;

/// Initialise the application.
pub fn init(args: &CommandLineArgs) {
    if !args.data_dir.is_dir() {
        tracing::warn!(
            data_dir = %args.data_dir.display(),
            "data directory does not exist, every request will fail"
        );
    }
}

/// Returns a [Service] reading measurement logs from the configured data directory.
///
/// # Arguments
///
/// * `args`: Command line arguments
pub fn service(args: &CommandLineArgs) -> Service {
    let state = Arc::new(AppState::new(args));
    NormalizePathLayer::trim_trailing_slash().layer(router(state))
}

/// Returns a [axum::Router] for the API.
///
/// # Arguments
///
/// * `state`: Shared application state
pub fn router(state: SharedAppState) -> Router {
    let allow_any_origin = state.args.allow_any_origin;
    let router = Router::new()
        .route("/data", get(data))
        .route("/compare", get(compare))
        .route("/metrics", get(metrics::metrics_handler))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .on_request(metrics::request_counter)
                .on_response(metrics::record_response_metrics),
        );
    if allow_any_origin {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

/// Handler for the series endpoint.
///
/// Loading and transformation run on the blocking thread pool.
async fn data(
    State(state): State<SharedAppState>,
    ValidatedQuery(params): ValidatedQuery<models::DataParams>,
) -> Result<Json<models::SeriesResponse>, SeriesError> {
    let location = params
        .location
        .unwrap_or_else(|| state.args.default_location.clone());
    let chemical = params
        .chemical
        .unwrap_or_else(|| state.args.default_chemical.clone());
    let range = params.range;
    let response = tokio::task::spawn_blocking(move || {
        let series = loader::load(state.source.as_ref(), &location, &chemical)?;
        Ok::<_, SeriesError>(query::extract_range(&series, range))
    })
    .await??;
    Ok(Json(response))
}

/// Handler for the comparison endpoint.
///
/// Loading and transformation run on the blocking thread pool.
async fn compare(
    State(state): State<SharedAppState>,
    ValidatedQuery(params): ValidatedQuery<models::CompareParams>,
) -> Result<Json<models::Comparison>, SeriesError> {
    let chemical = params
        .chemical
        .unwrap_or_else(|| state.args.default_chemical.clone());
    let year = params.year.unwrap_or_else(|| chrono::Local::now().year());
    let locations = params.locations;
    let comparison = tokio::task::spawn_blocking(move || {
        query::compare(state.source.as_ref(), &locations, &chemical, year)
    })
    .await??;
    Ok(Json(comparison))
}
