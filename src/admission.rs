use crate::error::GatewayError;

// Why an admission check turned a request away
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    Unauthorized,
    QuotaExceeded { limit: u32 },
    RateExceeded,
}

impl Rejection {
    // Label used for the rejections metric
    pub fn reason(&self) -> &'static str {
        match self {
            Rejection::Unauthorized => "unauthorized",
            Rejection::QuotaExceeded { .. } => "daily_quota",
            Rejection::RateExceeded => "rate_limit",
        }
    }
}

/// Outcome of a single admission check.
///
/// Checks return a `Decision` instead of an error so the gateway decides
/// the order they run in and how each rejection surfaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Rejected(Rejection),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed)
    }

    pub fn into_result(self) -> Result<(), GatewayError> {
        match self {
            Decision::Allowed => Ok(()),
            Decision::Rejected(rejection) => Err(rejection.into()),
        }
    }
}

impl From<Rejection> for GatewayError {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::Unauthorized => GatewayError::Unauthorized,
            Rejection::QuotaExceeded { limit } => GatewayError::QuotaExceeded { limit },
            Rejection::RateExceeded => GatewayError::RateExceeded,
        }
    }
}
