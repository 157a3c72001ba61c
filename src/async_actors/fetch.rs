// src/async_actors/fetch.rs

// 🌍 Standard library
use std::collections::HashMap;
use std::sync::Arc;

// 📦 External crates
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

// 🧠 Internal modules
use crate::domain::{PriceCache, PriceDataProvider, PriceError, SymbolCatalog};
use crate::model::{PriceUpdate, Symbol};

/// Serialises cache-or-upstream reads per symbol.
///
/// One lock per catalog symbol is created up front and lives as long as the
/// coordinator. While a caller holds a symbol's lock it re-checks the cache, fetches
/// upstream on a miss and writes the result back, so concurrent first reads of a
/// symbol collapse into a single upstream call. Different symbols never contend.
pub struct FetchCoordinator {
    catalog: SymbolCatalog,
    cache: PriceCache,
    provider: Arc<dyn PriceDataProvider>,
    symbol_locks: HashMap<Symbol, Mutex<()>>,
}

impl FetchCoordinator {
    pub fn new(
        catalog: SymbolCatalog,
        cache: PriceCache,
        provider: Arc<dyn PriceDataProvider>,
    ) -> Self {
        let symbol_locks = catalog
            .list_symbols()
            .iter()
            .map(|symbol| (symbol.clone(), Mutex::new(())))
            .collect();
        Self {
            catalog,
            cache,
            provider,
            symbol_locks,
        }
    }

    pub fn catalog(&self) -> &SymbolCatalog {
        &self.catalog
    }

    /// Current price of `symbol`, from the cache when fresh, otherwise from upstream.
    ///
    /// # Errors
    /// [`PriceError::SymbolNotFound`] for symbols outside the catalog, provider errors
    /// unchanged, and [`PriceError::Cancelled`] if `cancel` fires while waiting for the
    /// lock or for cache/upstream I/O.
    pub async fn get_current_price(
        &self,
        symbol: &str,
        cancel: &CancellationToken,
    ) -> Result<PriceUpdate, PriceError> {
        let Some((symbol, lock)) = self.symbol_locks.get_key_value(symbol) else {
            warn!("Attempt to get price update for unsupported symbol '{symbol}'");
            return Err(PriceError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        };

        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!("Price request for {symbol} cancelled");
                Err(PriceError::Cancelled)
            }
            result = self.read_through(symbol, lock, cancel) => result,
        }
    }

    async fn read_through(
        &self,
        symbol: &Symbol,
        lock: &Mutex<()>,
        cancel: &CancellationToken,
    ) -> Result<PriceUpdate, PriceError> {
        let _guard = lock.lock().await;

        if let Some(cached) = self.cache.get(symbol).await {
            return Ok(cached);
        }

        let update = self.provider.fetch(symbol, cancel).await?;
        self.cache.set(symbol, &update).await;
        debug!("Fetched {update} from upstream");
        Ok(update)
    }
}
