// src/http_api/requests.rs

// 📦 External crates
use serde::{Deserialize, Serialize};

// 🧠 Internal modules
use crate::model::{PriceUpdate, Symbol};

/// Message sent by a WebSocket client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ClientMessage {
    Subscribe { symbol: String },
    Unsubscribe,
}

/// Message pushed to a WebSocket client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    StockUpdate(PriceUpdate),
    Subscribed { symbol: Symbol },
    Unsubscribed { symbol: Symbol },
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn parses_client_actions() {
        let subscribe: ClientMessage =
            serde_json::from_str(r#"{"action":"subscribe","symbol":"EUR-USD"}"#).unwrap();
        assert_eq!(
            subscribe,
            ClientMessage::Subscribe {
                symbol: "EUR-USD".into()
            }
        );

        let unsubscribe: ClientMessage =
            serde_json::from_str(r#"{"action":"unsubscribe"}"#).unwrap();
        assert_eq!(unsubscribe, ClientMessage::Unsubscribe);
    }

    #[test]
    fn rejects_unknown_action_and_missing_symbol() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"action":"ping"}"#).is_err());
        assert!(serde_json::from_str::<ClientMessage>(r#"{"action":"subscribe"}"#).is_err());
    }

    #[test]
    fn stock_update_is_flattened_under_its_type_tag() {
        let refresh_time = Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap();
        let message = ServerMessage::StockUpdate(PriceUpdate::new(
            Symbol::from("EUR-USD"),
            1.0845,
            refresh_time,
        ));

        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({
                "type": "stockUpdate",
                "instrument": "EUR-USD",
                "price": 1.0845,
                "refreshTime": "2025-03-14T09:26:53Z",
            })
        );
    }

    #[test]
    fn acknowledgements_carry_the_symbol() {
        let message = ServerMessage::Subscribed {
            symbol: Symbol::from("BTC-USD"),
        };
        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({ "type": "subscribed", "symbol": "BTC-USD" })
        );
    }
}
