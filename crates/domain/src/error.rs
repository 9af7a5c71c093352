//! Domain error types.
//!
//! Every failure leaving the redemption validator or the feed reader is one of
//! these kinds; storage failures never escape unclassified.

use thiserror::Error;

/// Outcome of a rejected redemption attempt.
///
/// The first five kinds are expected business-rule outcomes. `Storage` is the
/// only infrastructure failure and is safe to retry because no effect was
/// applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RedemptionError {
    #[error("Redemption code is empty or malformed")]
    InvalidInput,

    #[error("No offer matches the redemption code")]
    NotFound,

    #[error("Offer is not active")]
    Inactive,

    #[error("Offer has expired")]
    Expired,

    #[error("Offer has no remaining capacity")]
    CapacityExceeded,

    #[error("Storage error: {0}")]
    Storage(String),
}

impl RedemptionError {
    /// Stable machine-readable code for clients.
    pub fn code(&self) -> &'static str {
        match self {
            RedemptionError::InvalidInput => "invalid_input",
            RedemptionError::NotFound => "not_found",
            RedemptionError::Inactive => "inactive",
            RedemptionError::Expired => "expired",
            RedemptionError::CapacityExceeded => "capacity_exceeded",
            RedemptionError::Storage(_) => "storage_error",
        }
    }

    /// Default user-facing message (es-CL).
    pub fn user_message(&self) -> &'static str {
        match self {
            RedemptionError::InvalidInput => "Ingresa un código válido",
            RedemptionError::NotFound => "Código QR inválido",
            RedemptionError::Inactive => "Esta oferta ya no está activa",
            RedemptionError::Expired => "Esta oferta ha expirado",
            RedemptionError::CapacityExceeded => "No quedan cupos disponibles",
            RedemptionError::Storage(_) => "Error al procesar la oferta, intenta de nuevo",
        }
    }

    /// Whether this is an expected business-rule rejection.
    pub fn is_business_rule(&self) -> bool {
        !matches!(self, RedemptionError::Storage(_))
    }

    /// Whether the caller may retry the same request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RedemptionError::Storage(_))
    }
}

/// Failure of an offer feed query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    #[error("Invalid feed query: {0}")]
    InvalidQuery(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Errors an [`crate::services::OfferStore`] may report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The atomic unit was aborted by a concurrent writer; nothing was applied.
    #[error("Concurrent update conflict: {0}")]
    Conflict(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for FeedError {
    fn from(err: StoreError) -> Self {
        FeedError::Storage(err.to_string())
    }
}
