//! Prometheus metrics

use axum::{body::Body, extract::MatchedPath, http::Request, response::Response};
use lazy_static::lazy_static;
use prometheus::{self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};
use tracing::Span;

lazy_static! {
    // Registry for holding metric state
    pub static ref REGISTRY: Registry = Registry::new();
    // Simple request counter
    pub static ref INCOMING_REQUESTS: IntCounterVec = IntCounterVec::new(
        Opts::new("incoming_requests", "The number of HTTP requests received"),
        &["http_method", "route"]
    ).unwrap();
    // Request counter by status code
    pub static ref RESPONSE_CODE_COLLECTOR: IntCounterVec = IntCounterVec::new(
        Opts::new("outgoing_response", "The number of responses sent."),
        &["status_code"]
    ).unwrap();
    // Request histogram by response time
    pub static ref RESPONSE_TIME_COLLECTOR: HistogramVec = HistogramVec::new(
        HistogramOpts{
            common_opts: Opts::new("response_time", "The time taken to respond to each request"),
            buckets: prometheus::DEFAULT_BUCKETS.to_vec(), // Change buckets here if desired
        },
        &[],
    ).unwrap();
    // Measurement log loads by outcome
    pub static ref SOURCE_LOADS: IntCounterVec = IntCounterVec::new(
        Opts::new("source_loads", "The number of measurement logs loaded, by outcome"),
        &["outcome"]
    ).unwrap();
}

pub fn register_metrics() {
    REGISTRY
        .register(Box::new(INCOMING_REQUESTS.clone()))
        .unwrap();
    REGISTRY
        .register(Box::new(RESPONSE_CODE_COLLECTOR.clone()))
        .unwrap();
    REGISTRY
        .register(Box::new(RESPONSE_TIME_COLLECTOR.clone()))
        .unwrap();
    REGISTRY.register(Box::new(SOURCE_LOADS.clone())).unwrap();
}

pub async fn metrics_handler() -> String {
    let encoder = prometheus::TextEncoder::new();
    let mut buffer = Vec::new();

    if let Err(err) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        tracing::error!("failed to encode metrics: {err}");
    }

    String::from_utf8_lossy(&buffer).into_owned()
}

/// Increments the prometheus counter on all incoming requests, labelled by http method and
/// route. Requests matching no route share a single label.
pub fn request_counter(request: &Request<Body>, _span: &Span) {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(MatchedPath::as_str)
        .unwrap_or("unmatched");
    let method = request.method().as_str().to_ascii_uppercase();
    INCOMING_REQUESTS
        .with_label_values(&[method.as_str(), route])
        .inc();
}

/// Increment the prometheus counter on all outgoing responses, labelled by status code
pub fn record_response_metrics<B>(
    response: &Response<B>,
    latency: std::time::Duration,
    _span: &Span,
) {
    RESPONSE_CODE_COLLECTOR
        .with_label_values(&[response.status().as_str()])
        .inc();

    RESPONSE_TIME_COLLECTOR
        .with_label_values(&[])
        .observe(latency.as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_counter_unmatched() {
        let request = Request::builder()
            .method("GET")
            .uri("/nowhere")
            .body(Body::empty())
            .unwrap();
        let counter = INCOMING_REQUESTS.with_label_values(&["GET", "unmatched"]);
        let before = counter.get();
        request_counter(&request, &Span::none());
        assert!(counter.get() > before);
    }

    #[tokio::test]
    async fn test_metrics_handler() {
        SOURCE_LOADS.with_label_values(&["ok"]).inc();
        // Registration fails if another test already registered the collectors.
        let _ = REGISTRY.register(Box::new(SOURCE_LOADS.clone()));
        let output = metrics_handler().await;
        assert!(output.contains("source_loads"), "output: {output}");
    }
}
