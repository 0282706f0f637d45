pub mod types;
pub mod ws;

pub const DEFAULT_WS_URL: &str = "wss://ws-feed.exchange.coinbase.com";
pub const DEFAULT_PRODUCT_ID: &str = "BTC-USD";
