//! Append-only ledger of sent notifications
//!
//! The ledger is the only state the cooldown decision depends on. Records are
//! never updated or removed; both backends guard their records with a
//! `tokio::sync::RwLock` so concurrent notification flows can append safely.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::config::LedgerConfig;
use crate::HeraldError;

/// A notification that was actually sent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub target_name: String,
    pub recorded_at: DateTime<Utc>,
    /// The state that triggered the notification (true = recovery)
    pub is_healthy: bool,
}

impl NotificationRecord {
    pub fn new(
        target_name: impl Into<String>,
        recorded_at: DateTime<Utc>,
        is_healthy: bool,
    ) -> Self {
        Self {
            target_name: target_name.into(),
            recorded_at,
            is_healthy,
        }
    }

    /// Target names compare case-insensitively
    pub fn is_for(&self, target_name: &str) -> bool {
        target_key(&self.target_name) == target_key(target_name)
    }
}

fn target_key(target_name: &str) -> String {
    target_name.chars().flat_map(char::to_lowercase).collect()
}

/// Storage for notification records
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait NotificationLedger: Send + Sync {
    /// Most recent record for a target, by `recorded_at`
    async fn latest(&self, target_name: &str) -> crate::Result<Option<NotificationRecord>>;

    /// Append a record. Either the whole record is stored or nothing is.
    async fn append(&self, record: NotificationRecord) -> crate::Result<()>;

    /// Up to `limit` records across all targets, newest first
    async fn recent(&self, limit: usize) -> crate::Result<Vec<NotificationRecord>>;
}

/// Records in append order, plus the latest record per target
#[derive(Debug, Default)]
struct LedgerIndex {
    records: Vec<NotificationRecord>,
    latest: HashMap<String, NotificationRecord>,
}

impl LedgerIndex {
    fn push(&mut self, record: NotificationRecord) {
        // >= so equal timestamps resolve to the later append
        match self.latest.entry(target_key(&record.target_name)) {
            Entry::Occupied(mut entry) => {
                if record.recorded_at >= entry.get().recorded_at {
                    entry.insert(record.clone());
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(record.clone());
            }
        }
        self.records.push(record);
    }

    fn latest(&self, target_name: &str) -> Option<NotificationRecord> {
        self.latest.get(&target_key(target_name)).cloned()
    }

    fn recent(&self, limit: usize) -> Vec<NotificationRecord> {
        let mut newest: Vec<NotificationRecord> = self.records.iter().rev().cloned().collect();
        newest.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        newest.truncate(limit);
        newest
    }
}

/// In-process ledger, lost on restart
#[derive(Debug, Default)]
pub struct MemoryLedger {
    index: RwLock<LedgerIndex>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.index.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.index.read().await.records.is_empty()
    }

    /// All records in append order
    pub async fn records(&self) -> Vec<NotificationRecord> {
        self.index.read().await.records.clone()
    }
}

#[async_trait]
impl NotificationLedger for MemoryLedger {
    async fn latest(&self, target_name: &str) -> crate::Result<Option<NotificationRecord>> {
        Ok(self.index.read().await.latest(target_name))
    }

    async fn append(&self, record: NotificationRecord) -> crate::Result<()> {
        self.index.write().await.push(record);
        Ok(())
    }

    async fn recent(&self, limit: usize) -> crate::Result<Vec<NotificationRecord>> {
        Ok(self.index.read().await.recent(limit))
    }
}

/// Byte storage behind a [`FileLedger`]
#[async_trait]
trait LedgerSink: Send + Sync {
    async fn size(&mut self) -> io::Result<u64>;

    /// Write a whole line and wait until it is on disk
    async fn write_line(&mut self, line: &[u8]) -> io::Result<()>;

    async fn truncate(&mut self, len: u64) -> io::Result<()>;
}

#[async_trait]
impl LedgerSink for tokio::fs::File {
    async fn size(&mut self) -> io::Result<u64> {
        Ok(self.metadata().await?.len())
    }

    async fn write_line(&mut self, line: &[u8]) -> io::Result<()> {
        // write_all only hands the bytes to a background task; flush reports its error
        self.write_all(line).await?;
        self.flush().await?;
        self.sync_data().await
    }

    async fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len).await?;
        self.sync_data().await
    }
}

struct FileLedgerInner {
    sink: Box<dyn LedgerSink>,
    index: LedgerIndex,
}

/// Ledger persisted as one JSON object per line
pub struct FileLedger {
    path: PathBuf,
    inner: RwLock<FileLedgerInner>,
}

impl std::fmt::Debug for FileLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileLedger")
            .field("path", &self.path)
            .finish()
    }
}

impl FileLedger {
    /// Open (or create) a ledger file and load the records already in it
    pub async fn open(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };

        let mut index = LedgerIndex::default();
        for (line_no, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<NotificationRecord>(line) {
                Ok(record) => index.push(record),
                Err(e) => tracing::warn!(
                    "Skipping unreadable ledger line {} in {:?}: {}",
                    line_no + 1,
                    path,
                    e
                ),
            }
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| HeraldError::Ledger(format!("Failed to open {:?}: {}", path, e)))?;

        // Terminate a torn last line so the next record starts on its own line
        if !content.is_empty() && !content.ends_with('\n') {
            file.write_line(b"\n").await?;
        }

        tracing::debug!("Opened ledger {:?} with {} records", path, index.records.len());

        Ok(Self::with_sink(path, Box::new(file), index))
    }

    fn with_sink(path: PathBuf, sink: Box<dyn LedgerSink>, index: LedgerIndex) -> Self {
        Self {
            path,
            inner: RwLock::new(FileLedgerInner { sink, index }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl NotificationLedger for FileLedger {
    async fn latest(&self, target_name: &str) -> crate::Result<Option<NotificationRecord>> {
        Ok(self.inner.read().await.index.latest(target_name))
    }

    async fn append(&self, record: NotificationRecord) -> crate::Result<()> {
        let mut line = serde_json::to_vec(&record)?;
        line.push(b'\n');

        let mut inner = self.inner.write().await;
        let prev_len = inner.sink.size().await.map_err(|e| {
            HeraldError::Ledger(format!("Failed to stat {:?}: {}", self.path, e))
        })?;

        if let Err(e) = inner.sink.write_line(&line).await {
            // Drop whatever part of the line reached the file
            if let Err(rollback) = inner.sink.truncate(prev_len).await {
                tracing::error!(
                    "Failed to roll back partial write in {:?}: {}",
                    self.path,
                    rollback
                );
            }
            return Err(HeraldError::Ledger(format!(
                "Failed to append to {:?}: {}",
                self.path, e
            )));
        }

        inner.index.push(record);
        Ok(())
    }

    async fn recent(&self, limit: usize) -> crate::Result<Vec<NotificationRecord>> {
        Ok(self.inner.read().await.index.recent(limit))
    }
}

/// Build the ledger backend selected by the configuration
pub async fn open_ledger(config: &LedgerConfig) -> crate::Result<Arc<dyn NotificationLedger>> {
    match &config.path {
        Some(path) => {
            tracing::info!("Using file ledger at {:?}", path);
            Ok(Arc::new(FileLedger::open(path).await?))
        }
        None => {
            tracing::info!("Using in-memory ledger; cooldown state is lost on restart");
            Ok(Arc::new(MemoryLedger::new()))
        }
    }
}
