use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use std::sync::Arc;

use crate::error::GatewayError;
use crate::gateway::WeatherRequest;
use crate::handlers::Caller;
use crate::models::{WeatherParams, WeatherResponse};
use crate::state::AppState;

pub async fn weather_handler(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    params: Result<Query<WeatherParams>, QueryRejection>,
) -> Result<Json<WeatherResponse>, GatewayError> {
    let Query(params) = params?;
    let request = WeatherRequest {
        credential: caller.credential,
        client_addr: caller.addr,
        params,
    };

    state.gateway.handle(&request).await.map(Json)
}
