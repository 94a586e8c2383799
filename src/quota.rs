use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::sync::Mutex;

use crate::admission::{Decision, Rejection};

// Requests admitted on one UTC calendar day
#[derive(Debug, Clone, Copy)]
struct DailyCounter {
    date: NaiveDate,
    count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyUsage {
    pub date: NaiveDate,
    pub count: u32,
    pub limit: u32,
}

/// Global cap on requests per UTC day, shared by every caller.
///
/// The counter resets at UTC midnight, not 24 hours after the first request.
pub struct DailyQuota {
    counter: Mutex<DailyCounter>,
    limit: u32,
}

impl DailyQuota {
    pub fn new(limit: u32, now: DateTime<Utc>) -> Self {
        Self {
            counter: Mutex::new(DailyCounter {
                date: now.date_naive(),
                count: 0,
            }),
            limit,
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn check_and_record(&self, now: DateTime<Utc>) -> Decision {
        let today = now.date_naive();
        let mut counter = self.counter.lock().unwrap_or_else(|e| e.into_inner());

        if counter.date != today {
            counter.date = today;
            counter.count = 0;
        }

        if counter.count >= self.limit {
            return Decision::Rejected(Rejection::QuotaExceeded { limit: self.limit });
        }

        counter.count += 1;
        Decision::Allowed
    }

    // Snapshot for `now`'s date; a stale counter reads as zero
    pub fn usage(&self, now: DateTime<Utc>) -> DailyUsage {
        let today = now.date_naive();
        let counter = self.counter.lock().unwrap_or_else(|e| e.into_inner());
        let count = if counter.date == today { counter.count } else { 0 };

        DailyUsage {
            date: today,
            count,
            limit: self.limit,
        }
    }
}
