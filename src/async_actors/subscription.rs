// src/async_actors/subscription.rs

// 🌍 Standard library
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

// 📦 External crates
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn, Instrument};

// 🧠 Internal modules
use super::broadcast::BroadcastDispatcher;
use super::fetch::FetchCoordinator;
use super::watch::WatchManager;
use crate::domain::PriceError;
use crate::model::{ConnectionId, Symbol};

#[derive(Default)]
struct RegistryState {
    connection_to_symbol: HashMap<ConnectionId, Symbol>,
    subscriber_count: HashMap<Symbol, usize>,
}

impl RegistryState {
    /// Drop the connection's mapping and decrement its symbol's count.
    ///
    /// Returns the symbol and whether its count reached zero.
    fn release(&mut self, connection_id: ConnectionId) -> Option<(Symbol, bool)> {
        let symbol = self.connection_to_symbol.remove(&connection_id)?;
        let count = self.subscriber_count.entry(symbol.clone()).or_default();
        *count = count.saturating_sub(1);
        let last = *count == 0;
        if last {
            self.subscriber_count.remove(&symbol);
        }
        Some((symbol, last))
    }
}

/// Tracks which symbol each connection follows and starts or stops watches as
/// subscriber counts move between zero and one.
///
/// The count change and the resulting start/stop decision happen under one lock.
pub struct SubscriptionRegistry {
    state: Mutex<RegistryState>,
    fetcher: Arc<FetchCoordinator>,
    watches: Arc<WatchManager>,
    dispatcher: BroadcastDispatcher,
}

impl SubscriptionRegistry {
    pub fn new(
        fetcher: Arc<FetchCoordinator>,
        watches: Arc<WatchManager>,
        dispatcher: BroadcastDispatcher,
    ) -> Self {
        Self {
            state: Mutex::new(RegistryState::default()),
            fetcher,
            watches,
            dispatcher,
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Subscribe `connection_id` to `symbol`, replacing any previous subscription.
    ///
    /// Returns the symbol that was replaced, if the connection followed a different
    /// one. An initial snapshot is fetched and sent to this connection alone in the
    /// background.
    ///
    /// # Errors
    /// [`PriceError::SymbolNotFound`] when `symbol` is not in the catalog.
    pub fn subscribe(
        &self,
        connection_id: ConnectionId,
        symbol: &str,
    ) -> Result<Option<Symbol>, PriceError> {
        let symbol = self.fetcher.catalog().resolve(symbol)?;

        let replaced = {
            let mut state = self.lock_state();
            let current = state.connection_to_symbol.get(&connection_id).cloned();
            let replaced = match current {
                Some(current) if current == symbol => {
                    debug!("{connection_id} already subscribed to {symbol}");
                    None
                }
                Some(_) => {
                    let released = state.release(connection_id);
                    if let Some((previous, true)) = &released {
                        self.watches.stop(previous);
                    }
                    released.map(|(previous, _)| previous)
                }
                None => None,
            };

            if !state.connection_to_symbol.contains_key(&connection_id) {
                state
                    .connection_to_symbol
                    .insert(connection_id, symbol.clone());
                let count = state.subscriber_count.entry(symbol.clone()).or_default();
                *count += 1;
                if *count == 1 {
                    self.watches
                        .start(symbol.clone(), Arc::new(self.dispatcher.clone()));
                }
            }
            replaced
        };

        info!("{connection_id} subscribed to {symbol}");
        self.send_snapshot(connection_id, symbol);
        Ok(replaced)
    }

    /// Remove the connection's subscription. Returns the symbol it followed, or
    /// `None` if it had none.
    pub fn unsubscribe(&self, connection_id: ConnectionId) -> Option<Symbol> {
        let mut state = self.lock_state();
        let Some((symbol, last)) = state.release(connection_id) else {
            debug!("{connection_id} has no subscription to remove");
            return None;
        };
        if last {
            self.watches.stop(&symbol);
        }
        info!("{connection_id} unsubscribed from {symbol}");
        Some(symbol)
    }

    #[must_use]
    pub fn subscriber_count(&self, symbol: &Symbol) -> usize {
        self.lock_state()
            .subscriber_count
            .get(symbol)
            .copied()
            .unwrap_or(0)
    }

    #[must_use]
    pub fn subscription_of(&self, connection_id: ConnectionId) -> Option<Symbol> {
        self.lock_state()
            .connection_to_symbol
            .get(&connection_id)
            .cloned()
    }

    fn send_snapshot(&self, connection_id: ConnectionId, symbol: Symbol) {
        let fetcher = self.fetcher.clone();
        let dispatcher = self.dispatcher.clone();
        let span = tracing::info_span!("Snapshot", %connection_id, %symbol);

        tokio::spawn(
            async move {
                match fetcher
                    .get_current_price(symbol.as_str(), &CancellationToken::new())
                    .await
                {
                    Ok(update) => dispatcher.deliver_to_one(connection_id, update).await,
                    Err(e) => warn!("Could not fetch initial snapshot: {e}"),
                }
            }
            .instrument(span),
        );
    }
}
