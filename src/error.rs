//! Error handling.

use axum::{
    http::header,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::PathBuf;
use thiserror::Error;
use tokio::task::JoinError;
use tracing::{event, Level};

/// Pandora series error type
///
/// This type encapsulates the various errors that may occur while loading and querying
/// measurement logs. Each variant may result in a different API error response.
#[derive(Debug, Error)]
pub enum SeriesError {
    /// Error parsing a measurement log as CSV
    #[error("failed to parse measurement log {}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// No measurement log exists for the requested key
    #[error("no data available for chemical {chemical} at location {location}")]
    DataUnavailable { location: String, chemical: String },

    /// A query string parameter could not be interpreted
    #[error("invalid value {value:?} for query parameter {name}")]
    InvalidQueryParameter { name: &'static str, value: String },

    /// The measurement log exists but does not have the expected shape
    #[error("measurement log {} is malformed: {reason}", .path.display())]
    MalformedSource { path: PathBuf, reason: String },

    /// Error validating request parameters (multiple errors)
    #[error("request parameters are not valid")]
    RequestValidation(#[from] validator::ValidationErrors),

    /// Error reading a measurement log
    #[error("failed to read measurement log {}", .path.display())]
    SourceIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A blocking load task failed to complete
    #[error("error waiting for data processing task")]
    TaskJoin(#[from] JoinError),
}

impl IntoResponse for SeriesError {
    /// Convert from a `SeriesError` into an [axum::response::Response].
    fn into_response(self) -> Response {
        ErrorResponse::from(self).into_response()
    }
}

/// Body of error response
///
/// Implements serde (de)serialise.
#[derive(Deserialize, Serialize)]
struct ErrorBody {
    /// Main error message
    message: String,

    /// Optional list of causes
    #[serde(skip_serializing_if = "Option::is_none")]
    caused_by: Option<Vec<String>>,
}

impl ErrorBody {
    /// Return a new ErrorBody
    ///
    /// # Arguments
    ///
    /// * `error`: The error that occurred
    fn new<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        let message = error.to_string();
        let mut causes = Vec::new();
        let mut current = error.source();
        while let Some(source) = current {
            causes.push(source.to_string());
            current = source.source();
        }
        causes.dedup();
        let caused_by = if causes.is_empty() {
            None
        } else {
            Some(causes)
        };
        ErrorBody { message, caused_by }
    }
}

/// A response to send in error cases
///
/// Implements serde (de)serialise.
#[derive(Deserialize, Serialize)]
struct ErrorResponse {
    /// HTTP status of the response
    #[serde(skip)]
    status: StatusCode,

    /// Response body
    error: ErrorBody,
}

impl ErrorResponse {
    /// Return a new ErrorResponse
    ///
    /// # Arguments
    ///
    /// * `status`: HTTP status of the response
    /// * `error`: The error that occurred. This will be formatted into a suitable `ErrorBody`
    fn new<E>(status: StatusCode, error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        ErrorResponse {
            status,
            error: ErrorBody::new(error),
        }
    }

    /// Return a 400 bad request ErrorResponse
    fn bad_request<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        Self::new(StatusCode::BAD_REQUEST, error)
    }

    /// Return a 404 not found ErrorResponse
    fn not_found<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        Self::new(StatusCode::NOT_FOUND, error)
    }

    /// Return a 500 internal server error ErrorResponse
    fn internal_server_error<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, error)
    }
}

impl From<SeriesError> for ErrorResponse {
    /// Convert from a `SeriesError` into an `ErrorResponse`.
    fn from(error: SeriesError) -> Self {
        let response = match &error {
            // Bad request
            SeriesError::InvalidQueryParameter { .. }
            | SeriesError::RequestValidation(_) => Self::bad_request(&error),

            // Not found
            SeriesError::DataUnavailable { .. } => Self::not_found(&error),

            // Internal server error
            SeriesError::Csv { .. }
            | SeriesError::MalformedSource { .. }
            | SeriesError::SourceIo { .. }
            | SeriesError::TaskJoin(_) => Self::internal_server_error(&error),
        };

        // Log server errors.
        if response.status.is_server_error() {
            event!(Level::ERROR, "{}", error.to_string());
            let mut current = error.source();
            while let Some(source) = current {
                event!(Level::ERROR, "Caused by: {}", source.to_string());
                current = source.source();
            }
        }

        response
    }
}

impl IntoResponse for ErrorResponse {
    /// Convert from an `ErrorResponse` into an `axum::response::Response`.
    ///
    /// Renders the response as JSON.
    fn into_response(self) -> Response {
        let json_body = serde_json::to_string_pretty(&self);
        match json_body {
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to serialise error response: {}", err),
            )
                .into_response(),
            Ok(json_body) => (
                self.status,
                [(&header::CONTENT_TYPE, mime::APPLICATION_JSON.to_string())],
                json_body,
            )
                .into_response(),
        }
    }
}
