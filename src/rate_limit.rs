use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::collections::VecDeque;

use crate::admission::{Decision, Rejection};

pub const WINDOW_SECS: i64 = 60;

// Admitted request timestamps for one key, oldest first
pub type SlidingWindow = VecDeque<DateTime<Utc>>;

// "token:<credential>" for authenticated callers, "ip:<address>" otherwise
pub fn rate_key(credential: Option<&str>, addr: &str) -> String {
    match credential {
        Some(token) => format!("token:{}", token),
        None => format!("ip:{}", addr),
    }
}

/// Drop every timestamp strictly older than `now - 60s`.
///
/// Timestamps are appended in order, so eviction only ever touches the front.
pub fn prune(window: &mut SlidingWindow, now: DateTime<Utc>) {
    let cutoff = now - Duration::seconds(WINDOW_SECS);
    while window.front().is_some_and(|&t| t < cutoff) {
        window.pop_front();
    }
}

/// Per-key sliding-window limiter.
///
/// Each key's window sits in its own map entry; the entry guard is held for
/// the whole prune/check/append step so two requests on the same key can't
/// both see room for one more.
pub struct RateLimiter {
    windows: DashMap<String, SlidingWindow>,
    limit_per_minute: u32,
}

impl RateLimiter {
    pub fn new(limit_per_minute: u32) -> Self {
        Self {
            windows: DashMap::new(),
            limit_per_minute,
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit_per_minute
    }

    pub fn check_and_record(&self, key: &str, now: DateTime<Utc>) -> Decision {
        let mut window = self.windows.entry(key.to_string()).or_default();

        prune(&mut window, now);

        // rejected requests don't count against themselves
        if window.len() >= self.limit_per_minute as usize {
            return Decision::Rejected(Rejection::RateExceeded);
        }

        window.push_back(now);
        Decision::Allowed
    }

    // Entries currently in a key's window, without pruning
    pub fn window_len(&self, key: &str) -> usize {
        self.windows.get(key).map(|w| w.len()).unwrap_or(0)
    }

    pub fn tracked_keys(&self) -> usize {
        self.windows.len()
    }
}
