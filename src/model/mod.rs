// src/model/mod.rs

// 🌍 Standard library
use core::fmt;
use std::borrow::Borrow;
use std::sync::atomic::{AtomicU64, Ordering};

// 📦 External crates
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Identifier of a tradable pair, two legs joined by `-` (e.g. `EUR-USD`).
///
/// Construction does not validate; use [`crate::domain::SymbolCatalog`] for
/// membership and [`crate::domain::catalog::split_legs`] for format checks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self(symbol.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Symbol {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Last known price of an instrument. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceUpdate {
    pub instrument: Symbol,
    pub price: f64,
    pub refresh_time: DateTime<Utc>,
}

impl PriceUpdate {
    #[must_use]
    pub fn new(instrument: Symbol, price: f64, refresh_time: DateTime<Utc>) -> Self {
        Self {
            instrument,
            price,
            refresh_time,
        }
    }

    /// Change detection only looks at the price, `refresh_time` is informational.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn price_differs(&self, other: &Self) -> bool {
        self.price != other.price
    }
}

impl fmt::Display for PriceUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} @ {} ({})",
            self.instrument,
            self.price,
            self.refresh_time.to_rfc3339()
        )
    }
}

/// Identifier the transport assigns to a live client connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    #[must_use]
    pub fn next() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    #[must_use]
    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}
