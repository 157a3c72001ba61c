// src/domain/catalog.rs

// 📦 External crates
use once_cell::sync::Lazy;

// 🧠 Internal modules
use super::errors::PriceError;
use crate::model::Symbol;

const LEG_SEPARATOR: char = '-';

pub const EUR_USD: &str = "EUR-USD";
pub const USD_JPY: &str = "USD-JPY";
pub const BTC_USD: &str = "BTC-USD";

static DEFAULT_SYMBOLS: Lazy<Vec<Symbol>> =
    Lazy::new(|| [EUR_USD, USD_JPY, BTC_USD].into_iter().map(Symbol::from).collect());

/// Split a composite symbol into its two legs.
///
/// # Errors
/// Returns [`PriceError::InvalidSymbolFormat`] unless the separator yields exactly two
/// non-empty parts.
pub fn split_legs(symbol: &str) -> Result<(&str, &str), PriceError> {
    let mut parts = symbol.split(LEG_SEPARATOR);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(base), Some(quote), None) if !base.is_empty() && !quote.is_empty() => {
            Ok((base, quote))
        }
        _ => Err(PriceError::InvalidSymbolFormat {
            symbol: symbol.to_string(),
        }),
    }
}

/// Fixed set of supported instrument symbols, immutable after construction.
#[derive(Debug, Clone)]
pub struct SymbolCatalog {
    symbols: Vec<Symbol>,
}

impl Default for SymbolCatalog {
    fn default() -> Self {
        Self {
            symbols: DEFAULT_SYMBOLS.clone(),
        }
    }
}

impl SymbolCatalog {
    /// Build a catalog from an explicit symbol list.
    ///
    /// # Errors
    /// Returns [`PriceError::InvalidSymbolFormat`] for the first malformed symbol.
    pub fn new(symbols: impl IntoIterator<Item = Symbol>) -> Result<Self, PriceError> {
        let mut catalog = Vec::new();
        for symbol in symbols {
            split_legs(symbol.as_str())?;
            if !catalog.contains(&symbol) {
                catalog.push(symbol);
            }
        }
        Ok(Self { symbols: catalog })
    }

    #[must_use]
    pub fn list_symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    #[must_use]
    pub fn is_supported(&self, symbol: &str) -> bool {
        self.symbols.iter().any(|s| s.as_str() == symbol)
    }

    /// Look up a supported symbol.
    ///
    /// # Errors
    /// Returns [`PriceError::SymbolNotFound`] when the symbol is not in the catalog.
    pub fn resolve(&self, symbol: &str) -> Result<Symbol, PriceError> {
        self.symbols
            .iter()
            .find(|s| s.as_str() == symbol)
            .cloned()
            .ok_or_else(|| PriceError::SymbolNotFound {
                symbol: symbol.to_string(),
            })
    }
}
