use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::TransactionRecord;

use super::Repository;

/// An immutable copy of the store contents at one point in time.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub records: Arc<[TransactionRecord]>,
    pub loaded_at: DateTime<Utc>,
}

/// Holds the last loaded snapshot of the store.
///
/// The cache never reloads on its own: it loads once on first use and
/// afterwards only on `refresh`, or on the next use after `invalidate`.
#[derive(Debug, Default)]
pub struct TransactionCache {
    snapshot: RwLock<Option<Snapshot>>,
}

impl TransactionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached snapshot, loading it from `repo` if there is none.
    pub async fn get_or_load(&self, repo: &Repository) -> Result<Snapshot> {
        if let Some(snapshot) = self.snapshot.read().await.as_ref() {
            return Ok(snapshot.clone());
        }

        let mut guard = self.snapshot.write().await;
        // Another caller may have loaded while we waited for the lock.
        if let Some(snapshot) = guard.as_ref() {
            return Ok(snapshot.clone());
        }

        let snapshot = load(repo).await?;
        *guard = Some(snapshot.clone());
        Ok(snapshot)
    }

    /// Reload from `repo` unconditionally and replace the cached snapshot.
    pub async fn refresh(&self, repo: &Repository) -> Result<Snapshot> {
        let snapshot = load(repo).await?;
        *self.snapshot.write().await = Some(snapshot.clone());
        Ok(snapshot)
    }

    /// Drop the cached snapshot. The next `get_or_load` reads the store again.
    pub async fn invalidate(&self) {
        *self.snapshot.write().await = None;
    }
}

async fn load(repo: &Repository) -> Result<Snapshot> {
    let records = repo.list_records().await?;
    tracing::debug!(records = records.len(), "loaded receipts into cache");
    Ok(Snapshot {
        records: records.into(),
        loaded_at: Utc::now(),
    })
}
