// src/devtools/mocks.rs
#![cfg(test)]

// 🌍 Standard library
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// 📦 External crates
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

// 🧠 Internal modules
use crate::async_actors::broadcast::{Transport, TransportError};
use crate::async_actors::fetch::FetchCoordinator;
use crate::async_actors::watch::Notifier;
use crate::domain::{MemoryCacheStore, PriceCache, PriceDataProvider, PriceError, SymbolCatalog};
use crate::model::{ConnectionId, PriceUpdate, Symbol};

/// Step of a [`ScriptedProvider`] script.
#[derive(Debug, Clone)]
pub enum Step {
    Price(f64),
    Fail(PriceError),
}

/// Upstream provider replaying a script of prices and failures, one step per call.
///
/// The last step repeats once the script is exhausted. Tracks call counts and the
/// highest number of concurrently running fetches.
pub struct ScriptedProvider {
    steps: Mutex<VecDeque<Step>>,
    last: Mutex<Step>,
    latency: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ScriptedProvider {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        let steps: VecDeque<Step> = steps.into_iter().collect();
        let last = steps.back().cloned().unwrap_or(Step::Price(1.0));
        Self {
            steps: Mutex::new(steps),
            last: Mutex::new(last),
            latency: Duration::ZERO,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn fixed(price: f64) -> Self {
        Self::new([Step::Price(price)])
    }

    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn next_step(&self) -> Step {
        let mut steps = self.steps.lock().unwrap();
        match steps.pop_front() {
            Some(step) => {
                *self.last.lock().unwrap() = step.clone();
                step
            }
            None => self.last.lock().unwrap().clone(),
        }
    }
}

#[async_trait]
impl PriceDataProvider for ScriptedProvider {
    async fn fetch(
        &self,
        symbol: &Symbol,
        _cancel: &CancellationToken,
    ) -> Result<PriceUpdate, PriceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);
        let _in_flight = InFlight(&self.in_flight);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        match self.next_step() {
            Step::Price(price) => Ok(PriceUpdate::new(symbol.clone(), price, Utc::now())),
            Step::Fail(e) => Err(e),
        }
    }
}

/// Coordinator over the default catalog, an in-memory cache and `provider`.
pub fn coordinator(provider: Arc<ScriptedProvider>, cache_ttl: Duration) -> Arc<FetchCoordinator> {
    let cache = PriceCache::with_ttl(Arc::new(MemoryCacheStore::new()), cache_ttl);
    Arc::new(FetchCoordinator::new(
        SymbolCatalog::default(),
        cache,
        provider,
    ))
}

/// Notifier forwarding every delivery into a channel.
pub struct RecordingNotifier {
    sender: mpsc::UnboundedSender<(Symbol, PriceUpdate)>,
    delay: Duration,
}

impl RecordingNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(Symbol, PriceUpdate)>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                sender,
                delay: Duration::ZERO,
            },
            receiver,
        )
    }

    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn deliver(&self, symbol: &Symbol, update: PriceUpdate) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let _ = self.sender.send((symbol.clone(), update));
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    ToConnection(ConnectionId, PriceUpdate),
    ToGroup(Symbol, PriceUpdate),
}

/// Transport recording every send, optionally failing all of them.
pub struct RecordingTransport {
    sender: mpsc::UnboundedSender<Sent>,
    fail: bool,
}

impl RecordingTransport {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Sent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender, fail: false }, receiver)
    }

    pub fn failing() -> (Self, mpsc::UnboundedReceiver<Sent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender, fail: true }, receiver)
    }

    fn record(&self, sent: Sent) -> Result<(), TransportError> {
        let _ = self.sender.send(sent);
        if self.fail {
            Err(TransportError::ChannelClosed)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_to_connection(
        &self,
        connection_id: ConnectionId,
        update: &PriceUpdate,
    ) -> Result<(), TransportError> {
        self.record(Sent::ToConnection(connection_id, update.clone()))
    }

    async fn send_to_group(
        &self,
        symbol: &Symbol,
        update: &PriceUpdate,
    ) -> Result<(), TransportError> {
        self.record(Sent::ToGroup(symbol.clone(), update.clone()))
    }
}
