// src/http_api/ws.rs

// 📦 External crates
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, info, warn, Instrument};

// 🧠 Internal modules
use super::handle::AppState;
use super::requests::{ClientMessage, ServerMessage};
use crate::model::{ConnectionId, Symbol};

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let connection_id = ConnectionId::next();
    let span = tracing::info_span!("WsConnection", %connection_id);

    async move {
        info!("Client connected");
        let mut outbound = state.hub.register(connection_id);
        let (mut sink, mut stream) = socket.split();

        let writer = tokio::spawn(async move {
            while let Some(frame) = outbound.recv().await {
                if sink.send(Message::Text(frame.into())).await.is_err() {
                    break;
                }
            }
        });

        while let Some(result) = stream.next().await {
            match result {
                Ok(Message::Text(text)) => {
                    handle_client_message(&state, connection_id, text.as_str());
                }
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    warn!("WebSocket error: {e}");
                    break;
                }
            }
        }

        // A dropped connection goes through the same path as an unsubscribe.
        release(&state, connection_id);
        state.hub.remove(connection_id);
        writer.abort();
        info!("Client disconnected");
    }
    .instrument(span)
    .await
}

fn handle_client_message(state: &AppState, connection_id: ConnectionId, text: &str) {
    let reply = match serde_json::from_str::<ClientMessage>(text) {
        Ok(ClientMessage::Subscribe { symbol }) => subscribe(state, connection_id, &symbol),
        Ok(ClientMessage::Unsubscribe) => {
            release(state, connection_id).map(|symbol| ServerMessage::Unsubscribed { symbol })
        }
        Err(e) => {
            debug!("Unreadable client message: {e}");
            Some(ServerMessage::Error {
                message: format!("Invalid message: {e}"),
            })
        }
    };

    if let Some(reply) = reply {
        if let Err(e) = state.hub.send(connection_id, &reply) {
            warn!("Could not reply to client: {e}");
        }
    }
}

fn subscribe(state: &AppState, connection_id: ConnectionId, symbol: &str) -> Option<ServerMessage> {
    match state.registry.subscribe(connection_id, symbol) {
        Ok(replaced) => {
            if let Some(previous) = replaced {
                state.hub.leave_group(connection_id, &previous);
            }
            let symbol = Symbol::from(symbol);
            state.hub.join_group(connection_id, symbol.clone());
            Some(ServerMessage::Subscribed { symbol })
        }
        Err(e) => Some(ServerMessage::Error {
            message: e.to_string(),
        }),
    }
}

fn release(state: &AppState, connection_id: ConnectionId) -> Option<Symbol> {
    let symbol = state.registry.unsubscribe(connection_id)?;
    state.hub.leave_group(connection_id, &symbol);
    Some(symbol)
}
