use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::admission::Decision;
use crate::auth::{Authenticator, fingerprint};
use crate::clock::Clock;
use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::history::UsageLog;
use crate::metrics::{DAILY_USAGE, RATE_LIMIT_KEYS, REJECTIONS, REQUEST_TOTAL};
use crate::models::{WeatherParams, WeatherResponse};
use crate::quota::{DailyQuota, DailyUsage};
use crate::rate_limit::{RateLimiter, rate_key};
use crate::upstream::WeatherUpstream;

// One inbound /weather call, already pulled apart by the HTTP layer
#[derive(Debug, Clone)]
pub struct WeatherRequest {
    pub credential: Option<String>,
    pub client_addr: String,
    pub params: WeatherParams,
}

/// Admission control plus forwarding for weather lookups.
///
/// Checks run in a fixed order and stop at the first rejection:
/// upstream key configured, daily quota, bearer token, per-key rate,
/// location selector. Only then is the provider called. Every lock taken
/// by a check is released before the upstream call starts, and a request
/// that got past the quota and rate checks stays counted whatever happens
/// afterwards.
pub struct Gateway {
    config: GatewayConfig,
    auth: Authenticator,
    quota: DailyQuota,
    limiter: RateLimiter,
    upstream: Arc<dyn WeatherUpstream>,
    history: Arc<dyn UsageLog>,
    clock: Arc<dyn Clock>,
}

impl Gateway {
    pub fn new(
        config: GatewayConfig,
        upstream: Arc<dyn WeatherUpstream>,
        history: Arc<dyn UsageLog>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            auth: Authenticator::new(config.tokens.clone()),
            quota: DailyQuota::new(config.daily_limit, clock.now()),
            limiter: RateLimiter::new(config.rate_limit),
            config,
            upstream,
            history,
            clock,
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn history(&self) -> &dyn UsageLog {
        self.history.as_ref()
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Current time on the gateway's clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn daily_usage(&self) -> DailyUsage {
        self.quota.usage(self.now())
    }

    pub async fn handle(&self, req: &WeatherRequest) -> Result<WeatherResponse, GatewayError> {
        REQUEST_TOTAL.inc();

        let api_key = self.config.api_key.as_deref().ok_or_else(|| {
            tracing::error!("OPENWEATHER_API_KEY is not configured");
            GatewayError::Config
        })?;

        self.admit(req)?;

        let query = req.params.validate()?;

        let payload = self.upstream.fetch(api_key, &query).await?;

        if let Err(e) = self.history.append(self.clock.now(), &query, &payload).await {
            tracing::warn!(error = %e, "failed to record usage");
        }

        Ok(WeatherResponse::shape(&payload))
    }

    /// Bearer check on its own, for routes that never reach the provider.
    pub fn authenticate(&self, credential: Option<&str>) -> Result<(), GatewayError> {
        self.enforce(self.auth.authenticate(credential), "-")
    }

    fn admit(&self, req: &WeatherRequest) -> Result<(), GatewayError> {
        let now = self.clock.now();
        let credential = req.credential.as_deref();
        let key = rate_key(credential, &req.client_addr);
        let log_key = match credential {
            Some(token) => format!("token:{}", fingerprint(token)),
            None => key.clone(),
        };

        let quota = self.quota.check_and_record(now);
        DAILY_USAGE.set(self.quota.usage(now).count as f64);
        self.enforce(quota, &log_key)?;

        self.enforce(self.auth.authenticate(credential), &log_key)?;

        let rate = self.limiter.check_and_record(&key, now);
        RATE_LIMIT_KEYS.set(self.limiter.tracked_keys() as f64);
        self.enforce(rate, &log_key)?;

        tracing::debug!(key = %log_key, "request admitted");
        Ok(())
    }

    fn enforce(&self, decision: Decision, log_key: &str) -> Result<(), GatewayError> {
        if let Decision::Rejected(rejection) = &decision {
            REJECTIONS.with_label_values(&[rejection.reason()]).inc();
            tracing::warn!(key = %log_key, reason = rejection.reason(), "request rejected");
        }
        decision.into_result()
    }
}
