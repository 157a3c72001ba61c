// src/async_actors/watch.rs

// 🌍 Standard library
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

// 📦 External crates
use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn, Instrument};

// 🧠 Internal modules
use super::fetch::FetchCoordinator;
use crate::domain::PriceError;
use crate::model::{PriceUpdate, Symbol};

pub const PRICE_WATCH_INTERVAL: Duration = Duration::from_secs(60);

/// Receives price changes produced by a running watch.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, symbol: &Symbol, update: PriceUpdate);
}

struct WatchHandle {
    cancel: CancellationToken,
    join_handle: JoinHandle<()>,
}

/// Owns at most one polling loop per symbol.
pub struct WatchManager {
    fetcher: Arc<FetchCoordinator>,
    interval: Duration,
    watches: Mutex<HashMap<Symbol, WatchHandle>>,
}

impl WatchManager {
    pub fn new(fetcher: Arc<FetchCoordinator>, interval: Duration) -> Self {
        Self {
            fetcher,
            interval,
            watches: Mutex::new(HashMap::new()),
        }
    }

    fn lock_watches(&self) -> MutexGuard<'_, HashMap<Symbol, WatchHandle>> {
        self.watches.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Spawn the polling loop for `symbol` unless one is already running.
    ///
    /// Returns `false` when a watch was already live. Must be called from within a
    /// tokio runtime.
    pub fn start(&self, symbol: Symbol, notifier: Arc<dyn Notifier>) -> bool {
        let mut watches = self.lock_watches();
        if watches.contains_key(&symbol) {
            warn!("Price watch for {symbol} already running");
            return false;
        }

        let cancel = CancellationToken::new();
        let watch = PriceWatch {
            symbol: symbol.clone(),
            fetcher: self.fetcher.clone(),
            notifier,
            interval: self.interval,
            cancel: cancel.clone(),
        };
        let join_handle = tokio::spawn(watch.run());
        watches.insert(
            symbol,
            WatchHandle {
                cancel,
                join_handle,
            },
        );
        true
    }

    /// Cancel the loop for `symbol`. Returns `false` when no watch was running.
    pub fn stop(&self, symbol: &Symbol) -> bool {
        let Some(handle) = self.lock_watches().remove(symbol) else {
            warn!("Price watch for {symbol} not running");
            return false;
        };
        debug!("Stopping price watch for {symbol}");
        handle.cancel.cancel();
        info!("Stopped price watch for {symbol}");
        true
    }

    #[must_use]
    pub fn is_running(&self, symbol: &Symbol) -> bool {
        self.lock_watches().contains_key(symbol)
    }

    #[must_use]
    pub fn running_count(&self) -> usize {
        self.lock_watches().len()
    }

    /// Cancel every watch and wait for the loops to exit.
    pub async fn shutdown(&self) {
        let handles: Vec<(Symbol, WatchHandle)> = self.lock_watches().drain().collect();
        for (symbol, handle) in handles {
            handle.cancel.cancel();
            if let Err(e) = handle.join_handle.await {
                error!("Price watch for {symbol} ended abnormally: {e}");
            }
        }
    }
}

struct PriceWatch {
    symbol: Symbol,
    fetcher: Arc<FetchCoordinator>,
    notifier: Arc<dyn Notifier>,
    interval: Duration,
    cancel: CancellationToken,
}

impl PriceWatch {
    async fn run(self) {
        let span = tracing::info_span!("PriceWatch", symbol = %self.symbol);

        async move {
            info!("Starting price watch");
            // Baseline is the first successful fetch, only later changes are delivered.
            let mut last_delivered: Option<PriceUpdate> = None;

            while !self.cancel.is_cancelled() {
                let changed = match self
                    .fetcher
                    .get_current_price(self.symbol.as_str(), &self.cancel)
                    .await
                {
                    Ok(update) => Self::detect_change(&mut last_delivered, update),
                    Err(PriceError::Cancelled) => break,
                    Err(e @ PriceError::ProviderUnavailable(_)) => {
                        warn!("Error fetching price update: {e}");
                        None
                    }
                    Err(e) => {
                        error!("Error fetching price update: {e}");
                        None
                    }
                };

                let delivery = async {
                    if let Some(update) = changed {
                        debug!("Delivering changed price {update}");
                        self.notifier.deliver(&self.symbol, update).await;
                    }
                };

                tokio::select! {
                    biased;
                    () = self.cancel.cancelled() => break,
                    _ = async { tokio::join!(delivery, time::sleep(self.interval)) } => {}
                }
            }
            info!("Price watch stopped");
        }
        .instrument(span)
        .await
    }

    fn detect_change(
        last_delivered: &mut Option<PriceUpdate>,
        update: PriceUpdate,
    ) -> Option<PriceUpdate> {
        match last_delivered.as_ref().map(|last| last.price_differs(&update)) {
            Some(false) => None,
            Some(true) => {
                *last_delivered = Some(update.clone());
                Some(update)
            }
            None => {
                *last_delivered = Some(update);
                None
            }
        }
    }
}
