// src/domain/provider/mod.rs

// 📦 External crates
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

// 🧠 Internal modules
use super::errors::PriceError;
use crate::model::{PriceUpdate, Symbol};

mod alphavantage;
pub use alphavantage::{AlphaVantageClient, ALPHAVANTAGE_BASE_URL};

#[async_trait]
pub trait PriceDataProvider: Send + Sync {
    /// Fetch the current price of `symbol` from upstream.
    ///
    /// # Errors
    /// [`PriceError::ProviderUnavailable`] when upstream is overloaded or down,
    /// [`PriceError::ProviderError`] for bad responses and transport failures,
    /// [`PriceError::Cancelled`] when `cancel` fires first.
    async fn fetch(
        &self,
        symbol: &Symbol,
        cancel: &CancellationToken,
    ) -> Result<PriceUpdate, PriceError>;
}
