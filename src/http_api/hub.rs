// src/http_api/hub.rs

// 🌍 Standard library
use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard, PoisonError};

// 📦 External crates
use async_trait::async_trait;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::debug;

// 🧠 Internal modules
use super::requests::ServerMessage;
use crate::async_actors::{Transport, TransportError};
use crate::model::{ConnectionId, PriceUpdate, Symbol};

/// Frames buffered per connection before new ones are dropped.
pub const OUTBOUND_QUEUE_CAPACITY: usize = 64;

#[derive(Default)]
struct HubState {
    connections: HashMap<ConnectionId, mpsc::Sender<String>>,
    groups: HashMap<Symbol, HashSet<ConnectionId>>,
}

/// Live WebSocket connections and their symbol groups.
///
/// Each connection is a bounded queue of serialised frames drained by the
/// connection's writer task. A stalled client loses frames once its queue is full.
#[derive(Default)]
pub struct ConnectionHub {
    state: RwLock<HubState>,
}

impl ConnectionHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HubState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HubState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn register(&self, connection_id: ConnectionId) -> mpsc::Receiver<String> {
        let (sender, receiver) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);
        self.write().connections.insert(connection_id, sender);
        receiver
    }

    /// Drop the connection and every group membership it holds.
    pub fn remove(&self, connection_id: ConnectionId) {
        let mut state = self.write();
        state.connections.remove(&connection_id);
        state.groups.retain(|_, members| {
            members.remove(&connection_id);
            !members.is_empty()
        });
    }

    pub fn join_group(&self, connection_id: ConnectionId, symbol: Symbol) {
        self.write()
            .groups
            .entry(symbol)
            .or_default()
            .insert(connection_id);
    }

    pub fn leave_group(&self, connection_id: ConnectionId, symbol: &Symbol) {
        let mut state = self.write();
        if let Some(members) = state.groups.get_mut(symbol) {
            members.remove(&connection_id);
            if members.is_empty() {
                state.groups.remove(symbol);
            }
        }
    }

    #[must_use]
    pub fn group_size(&self, symbol: &Symbol) -> usize {
        self.read().groups.get(symbol).map_or(0, HashSet::len)
    }

    /// Queue `message` for a single connection.
    ///
    /// # Errors
    /// [`TransportError::ConnectionNotFound`] for unknown connections,
    /// [`TransportError::ChannelClosed`] when its writer has gone away,
    /// [`TransportError::QueueFull`] when the client is not keeping up.
    pub fn send(
        &self,
        connection_id: ConnectionId,
        message: &ServerMessage,
    ) -> Result<(), TransportError> {
        let frame = serialise(message)?;
        let state = self.read();
        let sender = state
            .connections
            .get(&connection_id)
            .ok_or(TransportError::ConnectionNotFound(connection_id))?;
        enqueue(connection_id, sender, frame)
    }
}

fn enqueue(
    connection_id: ConnectionId,
    sender: &mpsc::Sender<String>,
    frame: String,
) -> Result<(), TransportError> {
    sender.try_send(frame).map_err(|e| match e {
        TrySendError::Full(_) => TransportError::QueueFull(connection_id),
        TrySendError::Closed(_) => TransportError::ChannelClosed,
    })
}

fn serialise(message: &ServerMessage) -> Result<String, TransportError> {
    serde_json::to_string(message).map_err(|e| TransportError::Serialisation(e.to_string()))
}

#[async_trait]
impl Transport for ConnectionHub {
    async fn send_to_connection(
        &self,
        connection_id: ConnectionId,
        update: &PriceUpdate,
    ) -> Result<(), TransportError> {
        self.send(connection_id, &ServerMessage::StockUpdate(update.clone()))
    }

    /// Fan out to every member; one closed member does not block the rest.
    async fn send_to_group(
        &self,
        symbol: &Symbol,
        update: &PriceUpdate,
    ) -> Result<(), TransportError> {
        let frame = serialise(&ServerMessage::StockUpdate(update.clone()))?;
        let state = self.read();
        let Some(members) = state.groups.get(symbol) else {
            debug!("No members in group {symbol}");
            return Ok(());
        };

        let mut result = Ok(());
        for connection_id in members {
            let sent = match state.connections.get(connection_id) {
                Some(sender) => enqueue(*connection_id, sender, frame.clone()),
                None => Err(TransportError::ConnectionNotFound(*connection_id)),
            };
            if let Err(e) = sent {
                debug!("Skipping {connection_id} in group {symbol}: {e}");
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn update(price: f64) -> PriceUpdate {
        PriceUpdate::new(Symbol::from("EUR-USD"), price, Utc::now())
    }

    #[tokio::test]
    async fn group_send_reaches_members_only() {
        let hub = ConnectionHub::new();
        let (a, b, c) = (
            ConnectionId::from_raw(1),
            ConnectionId::from_raw(2),
            ConnectionId::from_raw(3),
        );
        let mut rx_a = hub.register(a);
        let mut rx_b = hub.register(b);
        let mut rx_c = hub.register(c);
        let eur_usd = Symbol::from("EUR-USD");
        hub.join_group(a, eur_usd.clone());
        hub.join_group(b, eur_usd.clone());
        hub.join_group(c, Symbol::from("BTC-USD"));

        hub.send_to_group(&eur_usd, &update(1.1)).await.unwrap();

        for rx in [&mut rx_a, &mut rx_b] {
            let frame = rx.try_recv().unwrap();
            assert!(frame.contains(r#""type":"stockUpdate""#));
            assert!(frame.contains(r#""price":1.1"#));
        }
        assert!(rx_c.try_recv().is_err());
    }

    #[tokio::test]
    async fn send_to_unknown_connection_fails() {
        let hub = ConnectionHub::new();
        let result = hub
            .send_to_connection(ConnectionId::from_raw(42), &update(1.0))
            .await;
        assert!(matches!(result, Err(TransportError::ConnectionNotFound(_))));
    }

    #[tokio::test]
    async fn send_after_writer_dropped_reports_closed_channel() {
        let hub = ConnectionHub::new();
        let conn = ConnectionId::from_raw(1);
        drop(hub.register(conn));

        let result = hub.send_to_connection(conn, &update(1.0)).await;
        assert!(matches!(result, Err(TransportError::ChannelClosed)));
    }

    #[tokio::test]
    async fn one_dead_member_does_not_block_the_group() {
        let hub = ConnectionHub::new();
        let alive = ConnectionId::from_raw(1);
        let dead = ConnectionId::from_raw(2);
        let mut rx_alive = hub.register(alive);
        drop(hub.register(dead));
        let symbol = Symbol::from("EUR-USD");
        hub.join_group(alive, symbol.clone());
        hub.join_group(dead, symbol.clone());

        let result = hub.send_to_group(&symbol, &update(1.2)).await;

        assert!(matches!(result, Err(TransportError::ChannelClosed)));
        assert!(rx_alive.try_recv().is_ok());
    }

    #[tokio::test]
    async fn group_member_without_connection_is_not_found() {
        let hub = ConnectionHub::new();
        let ghost = ConnectionId::from_raw(9);
        let symbol = Symbol::from("EUR-USD");
        hub.join_group(ghost, symbol.clone());

        let result = hub.send_to_group(&symbol, &update(1.0)).await;
        assert!(matches!(result, Err(TransportError::ConnectionNotFound(id)) if id == ghost));
    }

    #[tokio::test]
    async fn stalled_client_drops_frames_beyond_queue_capacity() {
        let hub = ConnectionHub::new();
        let slow = ConnectionId::from_raw(1);
        let fast = ConnectionId::from_raw(2);
        let mut rx_slow = hub.register(slow);
        let mut rx_fast = hub.register(fast);
        let symbol = Symbol::from("EUR-USD");
        hub.join_group(slow, symbol.clone());
        hub.join_group(fast, symbol.clone());

        for i in 0..OUTBOUND_QUEUE_CAPACITY {
            hub.send_to_group(&symbol, &update(i as f64)).await.unwrap();
            rx_fast.try_recv().unwrap();
        }
        let overflow = hub.send_to_group(&symbol, &update(-1.0)).await;

        assert!(matches!(overflow, Err(TransportError::QueueFull(id)) if id == slow));
        assert!(rx_fast.try_recv().unwrap().contains(r#""price":-1.0"#));
        let mut buffered = 0;
        while rx_slow.try_recv().is_ok() {
            buffered += 1;
        }
        assert_eq!(buffered, OUTBOUND_QUEUE_CAPACITY);
    }

    #[test]
    fn leaving_and_removing_shrink_groups() {
        let hub = ConnectionHub::new();
        let symbol = Symbol::from("EUR-USD");
        let (a, b) = (ConnectionId::from_raw(1), ConnectionId::from_raw(2));
        let _rx_a = hub.register(a);
        let _rx_b = hub.register(b);
        hub.join_group(a, symbol.clone());
        hub.join_group(b, symbol.clone());
        assert_eq!(hub.group_size(&symbol), 2);

        hub.leave_group(a, &symbol);
        assert_eq!(hub.group_size(&symbol), 1);

        hub.remove(b);
        assert_eq!(hub.group_size(&symbol), 0);
    }
}
