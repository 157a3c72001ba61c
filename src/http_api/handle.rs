// src/http_api/handle.rs

// 🌍 Standard library
use std::sync::Arc;
use std::time::Duration;

// 📦 External crates
use tokio::task::JoinHandle;

// 🧠 Internal modules
use super::hub::ConnectionHub;
use crate::async_actors::{BroadcastActor, FetchCoordinator, SubscriptionRegistry, WatchManager};

/// Shared services behind every HTTP and WebSocket handler.
#[derive(Clone)]
pub struct AppState {
    pub fetcher: Arc<FetchCoordinator>,
    pub watches: Arc<WatchManager>,
    pub registry: Arc<SubscriptionRegistry>,
    pub hub: Arc<ConnectionHub>,
}

impl AppState {
    /// Wire the watch manager, connection hub and registry around `fetcher` and spawn
    /// the broadcast actor feeding the hub.
    pub fn new(fetcher: Arc<FetchCoordinator>, poll_interval: Duration) -> (Self, JoinHandle<()>) {
        let hub = Arc::new(ConnectionHub::new());
        let (dispatcher, broadcast_handle) = BroadcastActor::spawn(hub.clone());
        let watches = Arc::new(WatchManager::new(fetcher.clone(), poll_interval));
        let registry = Arc::new(SubscriptionRegistry::new(
            fetcher.clone(),
            watches.clone(),
            dispatcher,
        ));

        (
            Self {
                fetcher,
                watches,
                registry,
                hub,
            },
            broadcast_handle,
        )
    }
}
