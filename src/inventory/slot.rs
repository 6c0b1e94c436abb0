//! Storage slot trait and its SQLite and in-memory implementations.

use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, OptionalExtension};
use std::sync::Arc;
#[cfg(test)]
use std::sync::Mutex;

use crate::db::Database;

/// Key the inventory has always been stored under.
pub const DEFAULT_SLOT_KEY: &str = "phoneInventory";

/// A single named value that is always read and written whole.
pub trait StorageSlot: Send + Sync {
  /// Read the stored value, `None` if nothing was ever written.
  fn read(&self) -> Result<Option<String>>;

  /// Replace the stored value.
  fn write(&self, value: &str) -> Result<()>;
}

/// Slot stored as one row of the `kv_slot` table.
pub struct SqliteSlot {
  db: Arc<Database>,
  key: String,
}

impl SqliteSlot {
  pub fn new(db: Arc<Database>, key: impl Into<String>) -> Self {
    Self {
      db,
      key: key.into(),
    }
  }
}

impl StorageSlot for SqliteSlot {
  fn read(&self) -> Result<Option<String>> {
    let conn = self.db.conn()?;
    conn
      .query_row(
        "SELECT value FROM kv_slot WHERE key = ?",
        params![self.key],
        |row| row.get(0),
      )
      .optional()
      .map_err(|e| eyre!("Failed to read slot '{}': {}", self.key, e))
  }

  fn write(&self, value: &str) -> Result<()> {
    let conn = self.db.conn()?;
    conn
      .execute(
        "INSERT OR REPLACE INTO kv_slot (key, value, written_at) VALUES (?, ?, datetime('now'))",
        params![self.key, value],
      )
      .map_err(|e| eyre!("Failed to write slot '{}': {}", self.key, e))?;
    Ok(())
  }
}

/// In-memory slot with an optional size quota.
#[cfg(test)]
#[derive(Default)]
pub struct MemorySlot {
  value: Mutex<Option<String>>,
  quota: Option<usize>,
}

#[cfg(test)]
impl MemorySlot {
  pub fn new() -> Self {
    Self::default()
  }

  /// Slot that refuses writes larger than `bytes`.
  pub fn with_quota(bytes: usize) -> Self {
    Self {
      value: Mutex::new(None),
      quota: Some(bytes),
    }
  }

  /// Slot pre-filled with a value.
  pub fn with_value(value: impl Into<String>) -> Self {
    Self {
      value: Mutex::new(Some(value.into())),
      quota: None,
    }
  }

  /// Change the quota, e.g. to simulate freeing space.
  pub fn set_quota(&mut self, quota: Option<usize>) {
    self.quota = quota;
  }
}

#[cfg(test)]
impl StorageSlot for MemorySlot {
  fn read(&self) -> Result<Option<String>> {
    let value = self
      .value
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    Ok(value.clone())
  }

  fn write(&self, value: &str) -> Result<()> {
    if let Some(quota) = self.quota {
      if value.len() > quota {
        return Err(eyre!(
          "Quota exceeded: {} bytes requested, {} allowed",
          value.len(),
          quota
        ));
      }
    }
    let mut slot = self
      .value
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    *slot = Some(value.to_string());
    Ok(())
  }
}
