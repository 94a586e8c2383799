use axum::http::{HeaderMap, header::AUTHORIZATION};
use sha2::{Digest, Sha256};
use std::collections::HashSet;

use crate::admission::{Decision, Rejection};

/// Bearer-token check against a fixed allow-list.
///
/// An empty allow-list means auth is switched off and every caller gets in.
#[derive(Debug, Clone, Default)]
pub struct Authenticator {
    tokens: HashSet<String>,
}

impl Authenticator {
    pub fn new(tokens: HashSet<String>) -> Self {
        Self { tokens }
    }

    pub fn is_open(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn authenticate(&self, credential: Option<&str>) -> Decision {
        if self.is_open() {
            return Decision::Allowed;
        }

        match credential {
            Some(token) if self.tokens.contains(token) => Decision::Allowed,
            _ => Decision::Rejected(Rejection::Unauthorized),
        }
    }
}

// Pull the token out of "Authorization: Bearer <token>"
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

// Short hash of a token, safe to put in logs
pub fn fingerprint(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..12].to_string()
}
