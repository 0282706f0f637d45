/// A decoded best-bid/best-ask update from the feed.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct QuoteUpdate {
    pub best_bid: f64,
    pub best_ask: f64,
    pub best_bid_qty: f64,
    pub best_ask_qty: f64,
}

impl QuoteUpdate {
    /// Quote without size fields; quantities default to zero.
    pub fn from_prices(best_bid: f64, best_ask: f64) -> Self {
        Self {
            best_bid,
            best_ask,
            ..Self::default()
        }
    }
}

/// Latest top-of-book state as seen by the sampler.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TickerState {
    pub bid: f64,
    pub ask: f64,
    pub bid_qty: f64,
    pub ask_qty: f64,
}

impl TickerState {
    pub fn mid_price(&self) -> f64 {
        (self.bid + self.ask) / 2.0
    }

    /// Ask minus bid. Negative when the book is crossed.
    pub fn spread(&self) -> f64 {
        self.ask - self.bid
    }
}

impl From<QuoteUpdate> for TickerState {
    fn from(q: QuoteUpdate) -> Self {
        Self {
            bid: q.best_bid,
            ask: q.best_ask,
            bid_qty: q.best_bid_qty,
            ask_qty: q.best_ask_qty,
        }
    }
}
