// src/http_api/mod.rs

mod handle;
mod hub;
mod request_handler;
mod requests;
mod ws;

pub use handle::AppState;
pub use hub::ConnectionHub;
pub use request_handler::{router, start_http_server, ApiError};
pub use requests::{ClientMessage, ServerMessage};
