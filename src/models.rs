use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::GatewayError;

fn default_country() -> String {
    "us".to_string()
}

fn default_units() -> String {
    "metric".to_string()
}

fn default_lang() -> String {
    "en".to_string()
}

// Raw query string of GET /weather
#[derive(Debug, Clone, Deserialize)]
pub struct WeatherParams {
    pub city: Option<String>,
    pub postal: Option<String>,
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default = "default_units")]
    pub units: String,
    #[serde(default = "default_lang")]
    pub lang: String,
}

impl Default for WeatherParams {
    fn default() -> Self {
        Self {
            city: None,
            postal: None,
            country: default_country(),
            units: default_units(),
            lang: default_lang(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    City(String),
    Postal(String),
}

impl Location {
    pub fn query_type(&self) -> &'static str {
        match self {
            Location::City(_) => "city",
            Location::Postal(_) => "postal",
        }
    }
}

/// A lookup that passed validation and is ready to send upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherQuery {
    pub location: Location,
    // upper-cased
    pub country: String,
    pub units: String,
    // lower-cased
    pub lang: String,
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl WeatherParams {
    /// Pick the location selector. City wins when both are given.
    pub fn validate(&self) -> Result<WeatherQuery, GatewayError> {
        let location = match (non_blank(self.city.as_deref()), non_blank(self.postal.as_deref())) {
            (Some(city), _) => Location::City(city),
            (None, Some(postal)) => Location::Postal(postal),
            (None, None) => {
                return Err(GatewayError::Validation(
                    "Provide either city or postal".to_string(),
                ));
            }
        };

        let country = self.country.trim().to_uppercase();
        if country.is_empty() {
            return Err(GatewayError::Validation("Provide a country code".to_string()));
        }

        let units = self.units.trim();
        let lang = self.lang.trim().to_lowercase();

        Ok(WeatherQuery {
            location,
            country,
            units: if units.is_empty() { default_units() } else { units.to_string() },
            lang: if lang.is_empty() { default_lang() } else { lang },
        })
    }
}

/// The stable subset of the provider payload returned to callers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeatherResponse {
    pub name: Value,
    pub sys: Value,
    pub main: Value,
    pub wind: Value,
    pub weather: Value,
}

impl WeatherResponse {
    // Missing fields come back as null
    pub fn shape(payload: &Value) -> Self {
        let field = |key: &str| payload.get(key).cloned().unwrap_or(Value::Null);
        Self {
            name: field("name"),
            sys: field("sys"),
            main: field("main"),
            wind: field("wind"),
            weather: field("weather"),
        }
    }
}

pub const DEFAULT_HISTORY_LIMIT: usize = 25;
pub const MAX_HISTORY_LIMIT: usize = 200;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub limit: Option<i64>,
}

// Out-of-range values, negatives included, are clamped rather than rejected
pub fn clamp_limit(limit: Option<i64>) -> usize {
    match limit {
        None => DEFAULT_HISTORY_LIMIT,
        Some(n) => n.clamp(1, MAX_HISTORY_LIMIT as i64) as usize,
    }
}
