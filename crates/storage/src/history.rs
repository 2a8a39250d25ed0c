//! Bounded creation history persisted under a single key.

use std::sync::Arc;

use anyhow::{Context, Result};
use shared::domain::{History, HistoryItem, HistoryItemId};
use tracing::{debug, warn};

use crate::KeyValueStore;

pub const HISTORY_STORAGE_KEY: &str = "alterevo-history";

#[derive(Clone)]
pub struct HistoryStore {
    kv: Arc<dyn KeyValueStore>,
    key: String,
}

impl HistoryStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self::with_key(kv, HISTORY_STORAGE_KEY)
    }

    pub fn with_key(kv: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            kv,
            key: key.into(),
        }
    }

    /// Reads the persisted history. Never fails: a missing, unreadable or
    /// malformed record yields an empty history, and a malformed record is
    /// removed so the next load starts clean.
    pub async fn load(&self) -> History {
        let raw = match self.kv.get(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return History::new(),
            Err(err) => {
                warn!(key = %self.key, "failed to read history, starting empty: {err:#}");
                return History::new();
            }
        };

        match serde_json::from_str::<History>(&raw) {
            Ok(history) => {
                debug!(key = %self.key, items = history.len(), "loaded history");
                history
            }
            Err(err) => {
                warn!(key = %self.key, "discarding malformed history record: {err}");
                if let Err(err) = self.kv.remove(&self.key).await {
                    warn!(key = %self.key, "failed to remove malformed history record: {err:#}");
                }
                History::new()
            }
        }
    }

    /// Prepends `item`, bounds the result and persists it.
    pub async fn append(&self, history: &History, item: HistoryItem) -> Result<History> {
        let updated = history.prepend_bounded(item);
        self.persist(&updated).await?;
        Ok(updated)
    }

    /// Drops every entry by removing the persisted key.
    pub async fn clear(&self) -> Result<History> {
        self.kv
            .remove(&self.key)
            .await
            .context("failed to clear persisted history")?;
        debug!(key = %self.key, "cleared history");
        Ok(History::new())
    }

    pub async fn persist(&self, history: &History) -> Result<()> {
        let raw = serde_json::to_string(history).context("failed to serialize history")?;
        self.kv
            .set(&self.key, &raw)
            .await
            .context("failed to persist history")?;
        debug!(key = %self.key, items = history.len(), "persisted history");
        Ok(())
    }

    pub fn make_id(timestamp_millis: i64) -> HistoryItemId {
        HistoryItemId::from_timestamp(timestamp_millis)
    }
}

#[cfg(test)]
#[path = "tests/history_tests.rs"]
mod tests;
