// src/domain/mod.rs

pub mod cache;
pub mod catalog;
pub mod errors;
pub mod provider;
pub use cache::{CacheStore, MemoryCacheStore, PriceCache};
pub use catalog::SymbolCatalog;
pub use errors::{CacheError, PriceError};
pub use provider::{AlphaVantageClient, PriceDataProvider};
