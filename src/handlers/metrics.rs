use crate::error::GatewayError;
use crate::metrics;

pub async fn metrics_handler() -> Result<String, GatewayError> {
    metrics::render().map_err(GatewayError::Internal)
}
