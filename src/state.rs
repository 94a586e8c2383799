use chrono::{DateTime, Utc};

use crate::gateway::Gateway;

// app's shared state; uptime is measured on the gateway's clock
pub struct AppState {
    pub gateway: Gateway,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(gateway: Gateway) -> Self {
        Self {
            started_at: gateway.now(),
            gateway,
        }
    }
}
