//! Inventory errors.

use thiserror::Error;

use super::types::Imei;

/// Errors that can occur when changing the inventory.
#[derive(Debug, Error)]
pub enum StoreError {
  /// Input failed validation; nothing was changed.
  #[error("Invalid input: {0}")]
  Validation(String),

  /// Another phone already has this IMEI; nothing was changed.
  #[error("A phone with IMEI {0} is already in stock")]
  DuplicateImei(Imei),

  /// The in-memory change happened but could not be written out.
  #[error("Storage is full or unavailable, changes are not saved: {0}")]
  Storage(String),
}
