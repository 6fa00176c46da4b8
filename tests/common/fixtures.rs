/// Test data fixtures for consistent testing
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::json;

/// A counter and a gauge for job `sample`, with HELP and TYPE lines.
pub fn counter_and_gauge() -> &'static str {
    r#"# HELP http_requests_total Total HTTP requests served.
# TYPE http_requests_total counter
http_requests_total{job="sample",method="get"} 1027
http_requests_total{job="sample",method="post"} 3
# HELP room_temperature_celsius Current room temperature.
# TYPE room_temperature_celsius gauge
room_temperature_celsius{job="sample",room="kitchen"} 21.5
"#
}

/// A histogram with its buckets, count and sum.
pub fn histogram() -> &'static str {
    r#"# HELP request_duration_seconds Request latency.
# TYPE request_duration_seconds histogram
request_duration_seconds_bucket{le="0.1"} 5
request_duration_seconds_bucket{le="0.5"} 9
request_duration_seconds_bucket{le="+Inf"} 10
request_duration_seconds_sum 2.7
request_duration_seconds_count 10
"#
}

/// Tokenizes fine, but the value is not a number.
pub fn non_numeric_value() -> &'static str {
    "# HELP queue_size Items waiting.\n# TYPE queue_size gauge\nqueue_size{job=\"sample\"} lots\n"
}

/// Three families, none of them with a HELP line.
pub fn without_help() -> &'static str {
    "# TYPE jobs_total counter\njobs_total 4\n# TYPE workers gauge\nworkers 2\nlast_run_timestamp_seconds 1700000000\n"
}

/// Does not even tokenize.
pub fn broken_labels() -> &'static str {
    "http_requests_total{job=\"sample\" 1\n"
}

pub fn encode(metrics: &str) -> String {
    STANDARD.encode(metrics)
}

/// A `/push_metrics` body.
pub fn packed_request(target_url: &str, metrics: &str) -> String {
    json!({
        "target_url": target_url,
        "method": "PUT",
        "headers": {"Content-Type": "text/plain; version=0.0.4"},
        "data": encode(metrics),
    })
    .to_string()
}
