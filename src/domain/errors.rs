// src/domain/errors.rs

// 📦 External crates
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PriceError {
    // -------------------------------------------------------
    // Validation errors
    // -------------------------------------------------------
    #[error("Symbol '{symbol}' misformatted, expected two legs joined by '-'")]
    InvalidSymbolFormat { symbol: String },
    #[error("Financial instrument with symbol '{symbol}' not found")]
    SymbolNotFound { symbol: String },

    // -------------------------------------------------------
    // Upstream provider errors
    // -------------------------------------------------------
    #[error("Price data provider is currently unavailable: {0}")]
    ProviderUnavailable(String),
    #[error("Price data provider error: {0}")]
    ProviderError(String),

    #[error("Price request cancelled")]
    Cancelled,
}

impl PriceError {
    /// Provider failures are the ones a watch loop swallows and retries on the next tick.
    #[must_use]
    pub const fn is_provider_failure(&self) -> bool {
        matches!(self, Self::ProviderUnavailable(_) | Self::ProviderError(_))
    }
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache backend failure: {0}")]
    Backend(String),
}
