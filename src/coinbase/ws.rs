use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::watch;
use tokio_tungstenite::tungstenite;

use super::types::{decode_frame, FeedFrame, SubscribeRequest};
use crate::error::AppError;
use crate::ticker_store::TickerStore;

/// Exponential backoff for reconnection.
#[derive(Debug)]
pub struct ExponentialBackoff {
    current: Duration,
    initial: Duration,
    max: Duration,
    factor: f64,
}

impl ExponentialBackoff {
    pub fn new(initial: Duration, max: Duration, factor: f64) -> Self {
        Self {
            current: initial,
            initial,
            max,
            factor,
        }
    }

    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = Duration::from_secs_f64(
            (self.current.as_secs_f64() * self.factor).min(self.max.as_secs_f64()),
        );
        delay
    }

    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(60), 2.0)
    }
}

/// Coinbase Exchange ticker feed for one product.
pub struct CoinbaseWsClient {
    url: String,
    product_id: String,
}

impl CoinbaseWsClient {
    pub fn new(ws_url: &str, product_id: &str) -> Self {
        Self {
            url: ws_url.to_string(),
            product_id: product_id.to_string(),
        }
    }

    /// Connect and run the read loop with automatic reconnection, writing
    /// every decoded quote into `store`. Returns once `shutdown` flips.
    pub async fn connect_and_run(
        &self,
        store: Arc<TickerStore>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        let mut backoff = ExponentialBackoff::default();
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            match self.connect_once(&store, &mut shutdown, &mut backoff).await {
                Ok(()) => {
                    tracing::info!(product = %self.product_id, "feed closed on shutdown");
                    break;
                }
                Err(e) => {
                    let delay = backoff.next_delay();
                    let reason = format!("{:#}", e);
                    tracing::warn!(
                        error = %reason,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "feed disconnected, reconnecting"
                    );

                    tokio::select! {
                        _ = tokio::time::sleep(delay) => continue,
                        _ = shutdown.changed() => {
                            tracing::info!("shutdown during reconnect");
                            break;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    async fn connect_once(
        &self,
        store: &TickerStore,
        shutdown: &mut watch::Receiver<bool>,
        backoff: &mut ExponentialBackoff,
    ) -> Result<()> {
        tracing::info!(url = %self.url, "connecting");

        let (ws_stream, _resp) = tokio_tungstenite::connect_async(self.url.as_str())
            .await
            .context("WebSocket connect failed")?;
        backoff.reset();

        let (mut write, mut read) = ws_stream.split();

        let subscribe = serde_json::to_string(&SubscribeRequest::ticker(&self.product_id))
            .context("failed to encode subscribe request")?;
        write
            .send(tungstenite::Message::Text(subscribe))
            .await
            .context("failed to send subscribe request")?;
        tracing::info!(product = %self.product_id, "subscribed to ticker channel");

        let mut quotes: u64 = 0;
        loop {
            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(tungstenite::Message::Text(text))) => match decode_frame(&text) {
                            FeedFrame::Quote(q) => {
                                store.update(q)?;
                                quotes += 1;
                                if quotes == 1 {
                                    tracing::info!(bid = q.best_bid, ask = q.best_ask, "first quote received");
                                }
                            }
                            FeedFrame::Subscribed => {
                                tracing::debug!("subscription confirmed");
                            }
                            FeedFrame::Error(reason) => {
                                tracing::warn!(reason = %reason, "feed reported an error");
                            }
                            FeedFrame::Ignored => {}
                        },
                        Some(Ok(tungstenite::Message::Ping(_))) => {
                            // tokio-tungstenite handles pong automatically
                        }
                        Some(Ok(tungstenite::Message::Close(frame))) => {
                            return Err(anyhow::anyhow!("WebSocket closed by server: {:?}", frame));
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            return Err(AppError::WebSocket(e)).context("WebSocket read error");
                        }
                        None => {
                            return Err(anyhow::anyhow!("WebSocket stream ended"));
                        }
                    }
                }
                _ = shutdown.changed() => {
                    let _ = write.close().await;
                    return Ok(());
                }
            }
        }
    }
}
