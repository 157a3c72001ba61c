// src/http_api/request_handler.rs

// 📦 External crates
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    serve, Json, Router,
};
use serde_json::json;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

// 🧠 Internal modules
use super::handle::AppState;
use super::ws::ws_handler;
use crate::domain::PriceError;
use crate::model::{PriceUpdate, Symbol};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    ServiceUnavailable(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PriceError> for ApiError {
    fn from(error: PriceError) -> Self {
        match error {
            PriceError::SymbolNotFound { .. } | PriceError::InvalidSymbolFormat { .. } => {
                Self::NotFound(error.to_string())
            }
            e if e.is_provider_failure() => Self::ServiceUnavailable(e.to_string()),
            e => Self::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/currencyExchangeRates", get(list_symbols_handler))
        .route(
            "/api/currencyExchangeRates/{symbol}/price",
            get(price_handler),
        )
        .route("/stockticker", get(ws_handler))
        .with_state(state)
}

/// Serve the API on `listener` until `shutdown` is cancelled.
pub async fn start_http_server(
    listener: TcpListener,
    state: AppState,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    info!("📡 HTTP server listening on http://{addr}");
    serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}

pub async fn list_symbols_handler(State(state): State<AppState>) -> Json<Vec<Symbol>> {
    Json(state.fetcher.catalog().list_symbols().to_vec())
}

pub async fn price_handler(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<PriceUpdate>, ApiError> {
    // Request-scoped token, never shared with a watch.
    let cancel = CancellationToken::new();
    match state.fetcher.get_current_price(&symbol, &cancel).await {
        Ok(update) => Ok(Json(update)),
        Err(e) => {
            warn!("❌ Price request for '{symbol}' failed: {e}");
            Err(e.into())
        }
    }
}
