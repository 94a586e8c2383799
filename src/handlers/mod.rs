mod caller;
mod health;
mod history;
mod metrics;
mod weather;

pub use caller::Caller;
pub use health::{health_handler, root_handler};
pub use history::{HistoryPage, history_handler, search_handler};
pub use metrics::metrics_handler;
pub use weather::weather_handler;
