use serde::{Deserialize, Serialize};

use crate::model::quote::QuoteUpdate;

/// Deserialize an optional decimal that Coinbase sends as a string (numbers
/// are accepted too). `null` maps to `None`.
pub fn opt_string_or_number_to_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let v = serde_json::Value::deserialize(deserializer)?;
    match v {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        serde_json::Value::Number(n) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom("invalid number")),
        _ => Err(serde::de::Error::custom("invalid numeric value")),
    }
}

/// Any frame on the Coinbase Exchange feed. Only the fields this crate reads
/// are modelled.
#[derive(Debug, Deserialize)]
pub struct CoinbaseFeedMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, deserialize_with = "opt_string_or_number_to_f64")]
    pub best_bid: Option<f64>,
    #[serde(default, deserialize_with = "opt_string_or_number_to_f64")]
    pub best_ask: Option<f64>,
    #[serde(default, deserialize_with = "opt_string_or_number_to_f64")]
    pub best_bid_size: Option<f64>,
    #[serde(default, deserialize_with = "opt_string_or_number_to_f64")]
    pub best_ask_size: Option<f64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Subscription request sent once after each successful connect.
#[derive(Debug, Serialize)]
pub struct SubscribeRequest {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub product_ids: Vec<String>,
    pub channels: Vec<&'static str>,
}

impl SubscribeRequest {
    pub fn ticker(product_id: &str) -> Self {
        Self {
            kind: "subscribe",
            product_ids: vec![product_id.to_string()],
            channels: vec!["ticker"],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeedFrame {
    Quote(QuoteUpdate),
    Subscribed,
    Error(String),
    Ignored,
}

/// Classify a text frame. Anything that is not a ticker with both best bid
/// and best ask (including malformed JSON) is `Ignored`.
pub fn decode_frame(text: &str) -> FeedFrame {
    let msg = match serde_json::from_str::<CoinbaseFeedMessage>(text) {
        Ok(m) => m,
        Err(e) => {
            tracing::debug!(error = %e, "failed to parse feed message");
            return FeedFrame::Ignored;
        }
    };
    match msg.kind.as_str() {
        "ticker" => match (msg.best_bid, msg.best_ask) {
            (Some(best_bid), Some(best_ask)) => FeedFrame::Quote(QuoteUpdate {
                best_bid,
                best_ask,
                best_bid_qty: msg.best_bid_size.unwrap_or(0.0),
                best_ask_qty: msg.best_ask_size.unwrap_or(0.0),
            }),
            _ => FeedFrame::Ignored,
        },
        "subscriptions" => FeedFrame::Subscribed,
        "error" => {
            let text = match (msg.message, msg.reason) {
                (Some(m), Some(r)) => format!("{}: {}", m, r),
                (Some(m), None) => m,
                (None, Some(r)) => r,
                (None, None) => "unknown error".to_string(),
            };
            FeedFrame::Error(text)
        }
        _ => FeedFrame::Ignored,
    }
}

/// The quote carried by a frame, if it is one. See [`decode_frame`].
pub fn decode_quote(text: &str) -> Option<QuoteUpdate> {
    match decode_frame(text) {
        FeedFrame::Quote(q) => Some(q),
        _ => None,
    }
}
