//! This crate provides a read-only HTTP service over Pandora spectrometer measurements of
//! chemical concentrations (vertical column amounts), recorded per monitoring location.
//!
//! Two queries are supported:
//!
//! * `GET /data` returns the time series of one chemical at one location, either a trailing
//!   window (`3d`, `7d`, `1m`) relative to the latest measurement, or the whole series
//!   averaged over 15 minute intervals (`all`).
//! * `GET /compare` returns, for each of several locations, one year of measurements grouped
//!   by month of year, suitable for box plots.
//!
//! Measurements are read from CSV logs, one per (chemical, location) pair. Only rows flagged
//! `high quality na` are used.
//!
//! The service is built on top of a number of open source components.
//!
//! * [Tokio](tokio), the most popular asynchronous Rust runtime.
//! * [Axum](axum) web framework, built by the Tokio team, on top of the [hyper] HTTP library.
//! * [Serde](serde) performs serialisation of JSON response data.
//! * [csv] reads measurement logs and [chrono] handles their timestamps.

pub mod app;
pub mod app_state;
pub mod cli;
pub mod error;
pub mod loader;
pub mod metrics;
pub mod models;
pub mod query;
pub mod server;
pub mod source;
#[cfg(test)]
pub mod test_utils;
pub mod tracing;
pub mod validated_query;
