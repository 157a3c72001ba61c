// src/async_actors/broadcast.rs

// 🌍 Standard library
use std::sync::Arc;

// 📦 External crates
use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn, Instrument};

// 🧠 Internal modules
use super::messages::BroadcastCommand;
use super::watch::Notifier;
use crate::model::{ConnectionId, PriceUpdate, Symbol};

const BROADCAST_QUEUE_CAPACITY: usize = 256;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Connection {0} not found")]
    ConnectionNotFound(ConnectionId),
    #[error("Outbound channel closed")]
    ChannelClosed,
    #[error("Outbound queue for connection {0} is full, frame dropped")]
    QueueFull(ConnectionId),
    #[error("Serialisation failed: {0}")]
    Serialisation(String),
}

/// Push channel to connected clients.
///
/// Groups are keyed by symbol name and hold every connection subscribed to it.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_to_connection(
        &self,
        connection_id: ConnectionId,
        update: &PriceUpdate,
    ) -> Result<(), TransportError>;

    async fn send_to_group(&self, symbol: &Symbol, update: &PriceUpdate)
        -> Result<(), TransportError>;
}

/// Cheap handle queueing deliveries for the [`BroadcastActor`].
///
/// Delivery is fire-and-forget: failures are logged and never surface to the caller.
#[derive(Clone)]
pub struct BroadcastDispatcher {
    sender: mpsc::Sender<BroadcastCommand>,
}

impl BroadcastDispatcher {
    pub async fn deliver_to_one(&self, connection_id: ConnectionId, update: PriceUpdate) {
        self.enqueue(BroadcastCommand::ToConnection {
            connection_id,
            update,
        })
        .await;
    }

    pub async fn deliver_to_group(&self, symbol: Symbol, update: PriceUpdate) {
        self.enqueue(BroadcastCommand::ToGroup { symbol, update })
            .await;
    }

    async fn enqueue(&self, command: BroadcastCommand) {
        if let Err(e) = self.sender.send(command).await {
            error!("Broadcast actor gone, dropping {}", e.0);
        }
    }
}

#[async_trait]
impl Notifier for BroadcastDispatcher {
    async fn deliver(&self, symbol: &Symbol, update: PriceUpdate) {
        self.deliver_to_group(symbol.clone(), update).await;
    }
}

pub struct BroadcastActor {
    transport: Arc<dyn Transport>,
    receiver: mpsc::Receiver<BroadcastCommand>,
}

impl BroadcastActor {
    /// Start the actor; it runs until every dispatcher clone is dropped.
    pub fn spawn(transport: Arc<dyn Transport>) -> (BroadcastDispatcher, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(BROADCAST_QUEUE_CAPACITY);
        let actor = Self {
            transport,
            receiver,
        };
        let handle = tokio::spawn(actor.run());
        (BroadcastDispatcher { sender }, handle)
    }

    async fn run(mut self) {
        let span = tracing::info_span!("BroadcastActor");

        async move {
            info!("Broadcast actor started");
            while let Some(command) = self.receiver.recv().await {
                debug!("Broadcasting {command}");
                let result = match &command {
                    BroadcastCommand::ToConnection {
                        connection_id,
                        update,
                    } => self.transport.send_to_connection(*connection_id, update).await,
                    BroadcastCommand::ToGroup { symbol, update } => {
                        self.transport.send_to_group(symbol, update).await
                    }
                };
                if let Err(e) = result {
                    warn!("Could not broadcast {command}: {e}");
                }
            }
            info!("All dispatchers dropped, exiting actor loop");
        }
        .instrument(span)
        .await
    }
}
