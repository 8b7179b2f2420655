//! Prometheus metrics for the API server.

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "tubely_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "tubely_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "tubely_http_requests_in_flight";

    // Upload pipeline metrics
    pub const UPLOADS_TOTAL: &str = "tubely_uploads_total";
    pub const UPLOADS_IN_FLIGHT: &str = "tubely_uploads_in_flight";
    pub const UPLOAD_STAGE_DURATION_SECONDS: &str = "tubely_upload_stage_duration_seconds";
    pub const PUBLISHED_BYTES_TOTAL: &str = "tubely_published_bytes_total";
    pub const VIDEOS_CLASSIFIED_TOTAL: &str = "tubely_videos_classified_total";
    pub const ORPHANED_OBJECTS_TOTAL: &str = "tubely_orphaned_objects_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record the end of an upload. `stage` is the stage that failed, or "done".
pub fn record_upload_outcome(kind: &str, outcome: &str, stage: &str) {
    let labels = [
        ("kind", kind.to_string()),
        ("outcome", outcome.to_string()),
        ("stage", stage.to_string()),
    ];
    counter!(names::UPLOADS_TOTAL, &labels).increment(1);
}

/// Adjust the in-flight uploads gauge.
pub fn add_uploads_in_flight(kind: &str, delta: f64) {
    let labels = [("kind", kind.to_string())];
    gauge!(names::UPLOADS_IN_FLIGHT, &labels).increment(delta);
}

/// Record how long one pipeline stage took.
pub fn record_stage_duration(kind: &str, stage: &str, duration_secs: f64) {
    let labels = [("kind", kind.to_string()), ("stage", stage.to_string())];
    histogram!(names::UPLOAD_STAGE_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record bytes written to the object store (the remuxed file for videos).
pub fn record_published_bytes(kind: &str, bytes: u64) {
    let labels = [("kind", kind.to_string())];
    counter!(names::PUBLISHED_BYTES_TOTAL, &labels).increment(bytes);
}

/// Record a video's aspect classification.
pub fn record_classification(classification: &str) {
    let labels = [("classification", classification.to_string())];
    counter!(names::VIDEOS_CLASSIFIED_TOTAL, &labels).increment(1);
}

/// Record an object published without a record pointing at it.
pub fn record_orphaned_object(kind: &str) {
    let labels = [("kind", kind.to_string())];
    counter!(names::ORPHANED_OBJECTS_TOTAL, &labels).increment(1);
}

/// Sanitize path for metrics labels (collapse IDs and asset keys).
fn sanitize_path(path: &str) -> String {
    if path.starts_with("/assets/") {
        return "/assets/*".to_string();
    }

    path.split('/')
        .map(|segment| {
            if uuid::Uuid::parse_str(segment).is_ok() {
                ":video_id"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}
