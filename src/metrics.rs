use lazy_static::lazy_static;
use prometheus::{
    Counter, CounterVec, Encoder, Gauge, Histogram, TextEncoder, register_counter,
    register_counter_vec, register_gauge, register_histogram,
};

lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("weather_gateway_requests_total", "Total number of weather requests").unwrap();
    pub static ref REJECTIONS: CounterVec = register_counter_vec!(
        "weather_gateway_rejections_total",
        "Requests turned away by admission control",
        &["reason"]
    )
    .unwrap();
    pub static ref UPSTREAM_ERRORS: Counter =
        register_counter!("weather_gateway_upstream_errors_total", "Failed upstream calls").unwrap();
    pub static ref UPSTREAM_LATENCY: Histogram = register_histogram!(
        "weather_gateway_upstream_latency_seconds",
        "Upstream latency in seconds"
    )
    .unwrap();
    pub static ref DAILY_USAGE: Gauge =
        register_gauge!("weather_gateway_daily_usage", "Requests admitted today (UTC)").unwrap();
    pub static ref RATE_LIMIT_KEYS: Gauge =
        register_gauge!("weather_gateway_rate_limit_keys", "Rate-limit keys being tracked").unwrap();
}

// Text exposition of everything in the default registry
pub fn render() -> Result<String, String> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| e.to_string())?;
    String::from_utf8(buffer).map_err(|e| e.to_string())
}
