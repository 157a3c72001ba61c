// src/domain/cache.rs
//! Price cache gateway over a string-keyed TTL store.
//!
//! The cache is advisory: backend failures and undecodable entries read as a miss
//! and failed writes are logged and dropped.

// 🌍 Standard library
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

// 📦 External crates
use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, warn};

// 🧠 Internal modules
use super::errors::CacheError;
use crate::model::{PriceUpdate, Symbol};

pub const PRICE_CACHE_TTL: Duration = Duration::from_secs(60);

/// External key/value store with per-entry expiry. A missing key is `Ok(None)`.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: Instant,
}

/// In-process [`CacheStore`] backed by a `HashMap`.
#[derive(Debug, Default, Clone)]
pub struct MemoryCacheStore {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

impl MemoryCacheStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included until the next write prunes them.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|entry| Instant::now() < entry.expires_at)
            .map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                expires_at: now + ttl,
            },
        );
        Ok(())
    }
}

/// Get/set of the last known [`PriceUpdate`] per symbol.
#[derive(Clone)]
pub struct PriceCache {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl PriceCache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self::with_ttl(store, PRICE_CACHE_TTL)
    }

    pub fn with_ttl(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub async fn get(&self, symbol: &Symbol) -> Option<PriceUpdate> {
        let raw = match self.store.get(symbol.as_str()).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("Cache miss for {symbol}");
                return None;
            }
            Err(e) => {
                warn!("Cache read for {symbol} failed, treating as miss: {e}");
                return None;
            }
        };
        match serde_json::from_str::<PriceUpdate>(&raw) {
            Ok(update) => {
                debug!("Cache hit for {symbol}");
                Some(update)
            }
            Err(e) => {
                warn!("Undecodable cache entry for {symbol}, treating as miss: {e}");
                None
            }
        }
    }

    pub async fn set(&self, symbol: &Symbol, update: &PriceUpdate) {
        let raw = match serde_json::to_string(update) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Could not serialise price update for {symbol}: {e}");
                return;
            }
        };
        if let Err(e) = self.store.set(symbol.as_str(), raw, self.ttl).await {
            warn!("Cache write for {symbol} failed: {e}");
        }
    }
}
