// src/async_actors/messages.rs

use std::fmt;

use crate::model::{ConnectionId, PriceUpdate, Symbol};

/// Work item queued for the broadcast actor.
#[derive(Debug, Clone, PartialEq)]
pub enum BroadcastCommand {
    ToConnection {
        connection_id: ConnectionId,
        update: PriceUpdate,
    },
    ToGroup {
        symbol: Symbol,
        update: PriceUpdate,
    },
}

impl fmt::Display for BroadcastCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BroadcastCommand::ToConnection {
                connection_id,
                update,
            } => write!(f, "{update} to {connection_id}"),
            BroadcastCommand::ToGroup { symbol, update } => {
                write!(f, "{update} to group {symbol}")
            }
        }
    }
}
