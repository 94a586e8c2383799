use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::fmt::Debug;
use std::time::{Duration, Instant};

use crate::error::GatewayError;
use crate::metrics::{UPSTREAM_ERRORS, UPSTREAM_LATENCY};
use crate::models::{Location, WeatherQuery};

pub const OPENWEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

/// The weather provider behind the gateway.
///
/// Returns the provider's JSON on success. Any non-2xx answer comes back as
/// [`GatewayError::Upstream`] carrying the provider's own status and body.
#[async_trait]
pub trait WeatherUpstream: Send + Sync + Debug {
    async fn fetch(&self, api_key: &str, query: &WeatherQuery) -> Result<Value, GatewayError>;
}

// Query string sent to OpenWeather
pub fn upstream_params(api_key: &str, query: &WeatherQuery) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("appid", api_key.to_string()),
        ("units", query.units.clone()),
        ("lang", query.lang.clone()),
    ];

    match &query.location {
        Location::City(city) => params.push(("q", format!("{},{}", city, query.country))),
        Location::Postal(postal) => params.push(("zip", format!("{},{}", postal, query.country))),
    }

    params
}

// Best effort: JSON if it parses, raw text otherwise
pub fn parse_error_body(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
}

#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    http: Client,
    url: String,
}

impl OpenWeatherClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, GatewayError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }
}

#[async_trait]
impl WeatherUpstream for OpenWeatherClient {
    async fn fetch(&self, api_key: &str, query: &WeatherQuery) -> Result<Value, GatewayError> {
        let start = Instant::now();

        let result = self
            .http
            .get(&self.url)
            .query(&upstream_params(api_key, query))
            .send()
            .await;

        UPSTREAM_LATENCY.observe(start.elapsed().as_secs_f64());

        let res = match result {
            Ok(res) => res,
            Err(e) => {
                UPSTREAM_ERRORS.inc();
                tracing::warn!(error = %e, "upstream request failed");
                return Err(e.into());
            }
        };

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            UPSTREAM_ERRORS.inc();
            tracing::warn!(status = status.as_u16(), "upstream returned an error");
            return Err(GatewayError::Upstream {
                status,
                body: parse_error_body(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            UPSTREAM_ERRORS.inc();
            GatewayError::UpstreamTransport(format!("invalid JSON from upstream: {}", e))
        })
    }
}
