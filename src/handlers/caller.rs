use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::request::Parts,
};
use std::convert::Infallible;
use std::net::SocketAddr;

use crate::auth::bearer_token;

/// Who is calling: the bearer token if one was sent, and the peer address.
///
/// The address falls back to `unknown` when the server wasn't started with
/// connect info (e.g. when the router is driven directly in tests).
#[derive(Debug, Clone)]
pub struct Caller {
    pub credential: Option<String>,
    pub addr: String,
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let addr = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        Ok(Self {
            credential: bearer_token(&parts.headers),
            addr,
        })
    }
}
