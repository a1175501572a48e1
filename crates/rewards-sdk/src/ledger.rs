use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{info, warn};

use crate::error::{Result, RewardsError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Redemption,
    Grant,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub timestamp: DateTime<Utc>,
    pub kind: ActivityKind,
    /// Reward name for redemptions, source label for grants
    pub label: String,
    /// Signed point delta: negative for redemptions
    pub points: i64,
    pub tx_signature: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

impl ActivityRecord {
    pub fn redemption(label: &str, points: u64, tx_signature: String) -> Result<Self> {
        Ok(Self::build(
            ActivityKind::Redemption,
            label,
            -signed(points)?,
            tx_signature,
        ))
    }

    pub fn grant(label: &str, points: u64, tx_signature: String) -> Result<Self> {
        Ok(Self::build(ActivityKind::Grant, label, signed(points)?, tx_signature))
    }

    pub fn with_idempotency_key(mut self, key: Option<&str>) -> Self {
        self.idempotency_key = key.map(str::to_string);
        self
    }

    fn build(kind: ActivityKind, label: &str, points: i64, tx_signature: String) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
            label: label.to_string(),
            points,
            tx_signature,
            idempotency_key: None,
        }
    }
}

fn signed(points: u64) -> Result<i64> {
    i64::try_from(points).map_err(|_| RewardsError::InvalidInput(format!("Point amount too large: {}", points)))
}

/// Append-only activity log. Records are never changed or removed; with a
/// path configured each record is written as one JSON line before it becomes
/// visible in memory.
pub struct ActivityLedger {
    path: Option<PathBuf>,
    records: Mutex<Vec<ActivityRecord>>,
}

impl ActivityLedger {
    pub fn in_memory() -> Self {
        Self {
            path: None,
            records: Mutex::new(Vec::new()),
        }
    }

    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let records = Self::load(&path)?;
        info!("Loaded {} activity records from {}", records.len(), path.display());
        Ok(Self {
            path: Some(path),
            records: Mutex::new(records),
        })
    }

    fn load(path: &Path) -> Result<Vec<ActivityRecord>> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(RewardsError::Storage(format!(
                    "Read {} failed: {}",
                    path.display(),
                    e
                )))
            }
        };

        let mut records = Vec::new();
        for (line_no, line) in raw.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<ActivityRecord>(line) {
                Ok(record) => records.push(record),
                Err(e) => warn!("Skipping corrupt ledger line {}: {}", line_no + 1, e),
            }
        }
        Ok(records)
    }

    pub fn append(&self, record: ActivityRecord) -> Result<()> {
        let mut records = self.lock();
        if let Some(path) = &self.path {
            let mut line = serde_json::to_string(&record)
                .map_err(|e| RewardsError::Storage(format!("Serialize failed: {}", e)))?;
            line.push('\n');

            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .map_err(|e| RewardsError::Storage(format!("Create dir failed: {}", e)))?;
            }
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| RewardsError::Storage(format!("Open failed: {}", e)))?;
            file.write_all(line.as_bytes())
                .and_then(|_| file.flush())
                .map_err(|e| RewardsError::Storage(format!("Write failed: {}", e)))?;
        }
        records.push(record);
        Ok(())
    }

    /// Newest first.
    pub fn recent(&self, limit: Option<usize>) -> Vec<ActivityRecord> {
        let records = self.lock();
        let take = limit.unwrap_or(records.len());
        records.iter().rev().take(take).cloned().collect()
    }

    pub fn find_by_idempotency_key(&self, key: &str) -> Option<ActivityRecord> {
        self.lock()
            .iter()
            .find(|r| r.idempotency_key.as_deref() == Some(key))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ActivityRecord>> {
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }
}
