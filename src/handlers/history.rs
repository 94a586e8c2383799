use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use serde::Serialize;
use std::sync::Arc;

use crate::error::GatewayError;
use crate::handlers::Caller;
use crate::history::{UsageLog, UsageSummary};
use crate::models::{HistoryParams, SearchParams, clamp_limit};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HistoryPage {
    pub items: Vec<UsageSummary>,
}

// Most recent lookups first. Auth applies, quota and rate limits don't
pub async fn history_handler(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    params: Result<Query<HistoryParams>, QueryRejection>,
) -> Result<Json<HistoryPage>, GatewayError> {
    state.gateway.authenticate(caller.credential.as_deref())?;
    let Query(params) = params?;

    let records = state.gateway.history().recent(clamp_limit(params.limit))?;
    Ok(Json(HistoryPage {
        items: records.iter().map(|r| r.summary()).collect(),
    }))
}

pub async fn search_handler(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<HistoryPage>, GatewayError> {
    state.gateway.authenticate(caller.credential.as_deref())?;
    let Query(params) = params?;

    let text = params.q.as_deref().map(str::trim).unwrap_or_default();
    if text.is_empty() {
        return Err(GatewayError::Validation("Search text can't be blank.".to_string()));
    }

    let records = state
        .gateway
        .history()
        .search(text, clamp_limit(params.limit))?;
    Ok(Json(HistoryPage {
        items: records.iter().map(|r| r.summary()).collect(),
    }))
}
