//! Phone inventory: records, validation, the persisted store and exports.
//!
//! The whole inventory lives in memory and is written to a single storage
//! slot as one JSON array after every change.

mod error;
pub mod export;
pub mod image;
mod slot;
mod store;
mod types;

pub use error::StoreError;
pub use export::ExportFormat;
pub use slot::{SqliteSlot, DEFAULT_SLOT_KEY};
pub use store::{InventoryStore, LoadOutcome};
pub use types::{Confirmation, NewPhone, PhoneRecord, PhoneUpdate, Ram, RecordId, Stats, Storage};
