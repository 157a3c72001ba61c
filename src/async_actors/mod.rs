// src/async_actors/mod.rs

pub mod broadcast;
pub mod fetch;
pub mod messages;
pub mod subscription;
pub mod watch;

pub use broadcast::{BroadcastActor, BroadcastDispatcher, Transport, TransportError};
pub use fetch::FetchCoordinator;
pub use subscription::SubscriptionRegistry;
pub use watch::{Notifier, WatchManager};
