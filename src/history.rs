use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

use crate::error::GatewayError;
use crate::models::{Location, WeatherQuery};

/// One successful upstream lookup, as persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UsageRecord {
    pub id: u64,
    pub created_utc: DateTime<Utc>,
    pub query_type: String,
    pub city: Option<String>,
    pub postal: Option<String>,
    pub country: String,
    pub units: String,
    pub lang: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub temp: Option<f64>,
    pub humidity: Option<i64>,
    pub wind_speed: Option<f64>,
    pub raw: Value,
}

/// What the history endpoints return: the record without the raw payload.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UsageSummary {
    pub id: u64,
    pub created_utc: DateTime<Utc>,
    pub query_type: String,
    pub city: Option<String>,
    pub postal: Option<String>,
    pub country: String,
    pub units: String,
    pub lang: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub temp: Option<f64>,
    pub humidity: Option<i64>,
    pub wind_speed: Option<f64>,
}

impl UsageRecord {
    // Pull the searchable fields out of the provider payload
    pub fn from_lookup(
        id: u64,
        created_utc: DateTime<Utc>,
        query: &WeatherQuery,
        payload: &Value,
    ) -> Self {
        let (city, postal) = match &query.location {
            Location::City(city) => (Some(city.clone()), None),
            Location::Postal(postal) => (None, Some(postal.clone())),
        };

        Self {
            id,
            created_utc,
            query_type: query.location.query_type().to_string(),
            city,
            postal,
            country: query.country.clone(),
            units: query.units.clone(),
            lang: query.lang.clone(),
            name: payload["name"].as_str().map(str::to_string),
            description: payload["weather"][0]["description"]
                .as_str()
                .map(str::to_string),
            temp: payload["main"]["temp"].as_f64(),
            humidity: payload["main"]["humidity"].as_i64(),
            wind_speed: payload["wind"]["speed"].as_f64(),
            raw: payload.clone(),
        }
    }

    pub fn summary(&self) -> UsageSummary {
        UsageSummary {
            id: self.id,
            created_utc: self.created_utc,
            query_type: self.query_type.clone(),
            city: self.city.clone(),
            postal: self.postal.clone(),
            country: self.country.clone(),
            units: self.units.clone(),
            lang: self.lang.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            temp: self.temp,
            humidity: self.humidity,
            wind_speed: self.wind_speed,
        }
    }

    // Case-insensitive substring match on city, resolved name and condition
    pub fn matches(&self, needle: &str) -> bool {
        [&self.city, &self.name, &self.description]
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(needle))
    }
}

/// Where successful lookups are recorded.
///
/// Append-only: there is no update or delete.
#[async_trait]
pub trait UsageLog: Send + Sync {
    async fn append(
        &self,
        created_utc: DateTime<Utc>,
        query: &WeatherQuery,
        payload: &Value,
    ) -> Result<UsageRecord, GatewayError>;

    fn recent(&self, limit: usize) -> Result<Vec<UsageRecord>, GatewayError>;

    fn search(&self, text: &str, limit: usize) -> Result<Vec<UsageRecord>, GatewayError>;
}

/// Append-only usage log backed by sled.
///
/// Keys are big-endian ids from `generate_id`, so tree order is insertion
/// order and "most recent" is a reverse scan.
pub struct HistoryStore {
    db: sled::Db,
    tree: sled::Tree,
}

impl HistoryStore {
    pub fn open(path: &Path) -> Result<Self, GatewayError> {
        let db = sled::open(path)?;
        Self::with_db(db)
    }

    // Throwaway store, removed on drop
    pub fn temporary() -> Result<Self, GatewayError> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::with_db(db)
    }

    pub fn with_db(db: sled::Db) -> Result<Self, GatewayError> {
        let tree = db.open_tree("usage")?;
        Ok(Self { db, tree })
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    // Newest first, stopping after `limit` hits
    fn scan<F>(&self, limit: usize, keep: F) -> Result<Vec<UsageRecord>, GatewayError>
    where
        F: Fn(&UsageRecord) -> bool,
    {
        let mut out = Vec::new();

        for entry in self.tree.iter().rev() {
            if out.len() >= limit {
                break;
            }
            let (_, value) = entry?;
            let record: UsageRecord = serde_json::from_slice(&value)
                .map_err(|e| GatewayError::History(format!("Deserialization error: {}", e)))?;
            if keep(&record) {
                out.push(record);
            }
        }

        Ok(out)
    }
}

#[async_trait]
impl UsageLog for HistoryStore {
    async fn append(
        &self,
        created_utc: DateTime<Utc>,
        query: &WeatherQuery,
        payload: &Value,
    ) -> Result<UsageRecord, GatewayError> {
        let id = self.db.generate_id()?;
        let record = UsageRecord::from_lookup(id, created_utc, query, payload);

        let value = serde_json::to_vec(&record)
            .map_err(|e| GatewayError::History(format!("Serialization error: {}", e)))?;

        self.tree.insert(id.to_be_bytes(), value)?;

        // fsync on the blocking pool, not on a runtime worker
        let tree = self.tree.clone();
        tokio::task::spawn_blocking(move || tree.flush())
            .await
            .map_err(|e| GatewayError::History(format!("flush task failed: {}", e)))??;

        Ok(record)
    }

    fn recent(&self, limit: usize) -> Result<Vec<UsageRecord>, GatewayError> {
        self.scan(limit, |_| true)
    }

    fn search(&self, text: &str, limit: usize) -> Result<Vec<UsageRecord>, GatewayError> {
        let needle = text.trim().to_lowercase();
        self.scan(limit, |record| record.matches(&needle))
    }
}
