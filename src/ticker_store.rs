use std::sync::Mutex;

use anyhow::Result;

use crate::model::quote::{QuoteUpdate, TickerState};

#[derive(Debug, Default)]
struct Inner {
    state: TickerState,
    updates: u64,
}

/// Latest quote shared between the feed task (writer) and the sampler (reader).
#[derive(Debug, Default)]
pub struct TickerStore {
    inner: Mutex<Inner>,
}

impl TickerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole state with `q`. Fields are never merged.
    pub fn update(&self, q: QuoteUpdate) -> Result<()> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| anyhow::anyhow!("ticker store lock poisoned"))?;
        guard.state = TickerState::from(q);
        guard.updates = guard.updates.saturating_add(1);
        Ok(())
    }

    pub fn snapshot(&self) -> Result<TickerState> {
        let guard = self
            .inner
            .lock()
            .map_err(|_| anyhow::anyhow!("ticker store lock poisoned"))?;
        Ok(guard.state)
    }

    pub fn update_count(&self) -> Result<u64> {
        let guard = self
            .inner
            .lock()
            .map_err(|_| anyhow::anyhow!("ticker store lock poisoned"))?;
        Ok(guard.updates)
    }
}
