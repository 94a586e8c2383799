use clap::Parser;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use crate::upstream::OPENWEATHER_URL;

// CLI argument structure; every flag can also come from the environment
#[derive(Parser, Debug, Clone)]
#[command(name = "weather-gateway")]
#[command(about = "Rate-limited gateway in front of the OpenWeather API")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    #[arg(long, env = "BIND_ADDRESS", default_value = "0.0.0.0")]
    pub bind: String,

    // OpenWeather API key used for every upstream call
    #[arg(long, env = "OPENWEATHER_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    // Allowed bearer tokens (comma-separated). Empty disables auth
    #[arg(long, env = "PROXY_TOKENS", default_value = "", hide_env_values = true)]
    pub tokens: String,

    // Max requests per caller per minute
    #[arg(long, env = "RATE_LIMIT_PER_MIN", default_value_t = 60)]
    pub rate_limit: u32,

    // Max requests across all callers per UTC day
    #[arg(long, env = "DAILY_LIMIT", default_value_t = 1000)]
    pub daily_limit: u32,

    #[arg(long, env = "OPENWEATHER_URL", default_value = OPENWEATHER_URL)]
    pub upstream_url: String,

    // Upstream request timeout in seconds
    #[arg(long, env = "UPSTREAM_TIMEOUT_SECS", default_value_t = 8)]
    pub upstream_timeout: u64,

    // Directory of the usage history database
    #[arg(long, env = "HISTORY_PATH", default_value = "weather_history")]
    pub history_path: PathBuf,

    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_filter: String,
}

/// Settings the gateway needs at request time, cleaned up from [`Args`].
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub api_key: Option<String>,
    pub tokens: HashSet<String>,
    pub rate_limit: u32,
    pub daily_limit: u32,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            tokens: HashSet::new(),
            rate_limit: 60,
            daily_limit: 1000,
        }
    }
}

// "a, b,,c" -> {a, b, c}
pub fn parse_tokens(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl Args {
    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            api_key: self
                .api_key
                .as_deref()
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string),
            tokens: parse_tokens(&self.tokens),
            rate_limit: self.rate_limit,
            daily_limit: self.daily_limit,
        }
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout)
    }
}
