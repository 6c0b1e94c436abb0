//! The inventory store: the authoritative list of phones, kept in sync with
//! its storage slot by rewriting the whole slot after every change.

use chrono::Utc;
use tracing::{debug, info, warn};

use super::error::StoreError;
use super::slot::StorageSlot;
use super::types::{Confirmation, Imei, NewPhone, PhoneRecord, PhoneUpdate, RecordId, Stats};

/// What `load` found in the slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
  /// Nothing was stored yet
  Fresh,
  /// The stored inventory was read, with this many records
  Loaded(usize),
  /// Something is stored but could not be read. The store starts empty and
  /// the stored value is left alone until the next change overwrites it.
  Unreadable { reason: String },
  /// The stored inventory was read, but some IMEIs appear on more than one
  /// record. Every record is kept so nothing is lost; giving another record
  /// one of the listed IMEIs is still refused.
  DuplicateImeis { count: usize, imeis: Vec<Imei> },
}

/// Issues record ids from the wall clock, never repeating or going back.
pub struct IdGenerator {
  last: i64,
  clock: fn() -> i64,
}

impl Default for IdGenerator {
  fn default() -> Self {
    Self::with_clock(|| Utc::now().timestamp_millis())
  }
}

impl IdGenerator {
  /// Generator reading milliseconds from `clock`.
  pub fn with_clock(clock: fn() -> i64) -> Self {
    Self { last: 0, clock }
  }

  /// Make sure future ids are greater than `id`.
  pub fn observe(&mut self, id: RecordId) {
    self.last = self.last.max(id.value());
  }

  pub fn next_id(&mut self) -> Result<RecordId, StoreError> {
    let next = self
      .last
      .checked_add(1)
      .ok_or_else(|| StoreError::Validation("No record ids left after the stored ones".into()))?;
    self.last = (self.clock)().max(next);
    Ok(RecordId::new(self.last))
  }
}

/// In-memory inventory backed by a storage slot.
pub struct InventoryStore<S: StorageSlot> {
  slot: S,
  records: Vec<PhoneRecord>,
  ids: IdGenerator,
  /// Memory holds changes the slot does not
  dirty: bool,
}

impl<S: StorageSlot> InventoryStore<S> {
  /// Create an empty store; call `load` to read the slot.
  pub fn new(slot: S) -> Self {
    Self::with_ids(slot, IdGenerator::default())
  }

  pub fn with_ids(slot: S, ids: IdGenerator) -> Self {
    Self {
      slot,
      records: Vec::new(),
      ids,
      dirty: false,
    }
  }

  /// Create a store and load it in one go.
  pub fn open(slot: S) -> (Self, LoadOutcome) {
    let mut store = Self::new(slot);
    let outcome = store.load();
    (store, outcome)
  }

  /// Replace the in-memory inventory with what the slot holds.
  ///
  /// Never fails: an unreadable slot yields an empty inventory and an
  /// `Unreadable` outcome for the caller to report.
  pub fn load(&mut self) -> LoadOutcome {
    self.dirty = false;
    let raw = match self.slot.read() {
      Ok(Some(raw)) => raw,
      Ok(None) => {
        self.records.clear();
        debug!("No stored inventory, starting empty");
        return LoadOutcome::Fresh;
      }
      Err(e) => {
        self.records.clear();
        warn!(error = %e, "Failed to read stored inventory, starting empty");
        return LoadOutcome::Unreadable {
          reason: e.to_string(),
        };
      }
    };

    match serde_json::from_str::<Vec<PhoneRecord>>(&raw) {
      Ok(records) => {
        for record in &records {
          self.ids.observe(record.id);
        }
        self.records = records;
        info!(count = self.records.len(), "Loaded inventory");
        let imeis = self.duplicate_imeis();
        if imeis.is_empty() {
          LoadOutcome::Loaded(self.records.len())
        } else {
          warn!(duplicates = imeis.len(), "Stored inventory has IMEIs on more than one record");
          LoadOutcome::DuplicateImeis {
            count: self.records.len(),
            imeis,
          }
        }
      }
      Err(e) => {
        self.records.clear();
        warn!(error = %e, bytes = raw.len(), "Stored inventory is unreadable, starting empty");
        LoadOutcome::Unreadable {
          reason: e.to_string(),
        }
      }
    }
  }

  /// Add a phone and persist.
  ///
  /// Validation and duplicate errors leave the inventory untouched. A
  /// `Storage` error means the phone was added in memory but not saved.
  pub fn add(&mut self, phone: NewPhone) -> Result<PhoneRecord, StoreError> {
    let brand = required("Brand", &phone.brand)?;
    let model = required("Model", &phone.model)?;
    let imei = Imei::parse(&phone.imei)?;
    if self.records.iter().any(|r| r.imei == imei) {
      return Err(StoreError::DuplicateImei(imei));
    }

    let record = PhoneRecord {
      id: self.ids.next_id()?,
      brand,
      model,
      imei,
      ram: phone.ram,
      storage: phone.storage,
      image: phone.image,
      sold: false,
    };
    info!(id = %record.id, imei = %record.imei, "Added phone");
    self.records.push(record.clone());
    self.persist()?;
    Ok(record)
  }

  /// Merge `update` into the phone with `id` and persist.
  ///
  /// Returns `Ok(None)` without touching anything when no such phone exists.
  pub fn update(
    &mut self,
    id: RecordId,
    update: PhoneUpdate,
  ) -> Result<Option<PhoneRecord>, StoreError> {
    let Some(idx) = self.position(id) else {
      debug!(%id, "Update for unknown phone ignored");
      return Ok(None);
    };

    // Validate everything before changing anything
    let brand = update.brand.as_deref().map(|b| required("Brand", b)).transpose()?;
    let model = update.model.as_deref().map(|m| required("Model", m)).transpose()?;
    let imei = update.imei.as_deref().map(Imei::parse).transpose()?;
    if let Some(imei) = &imei {
      if self.records.iter().any(|r| r.id != id && &r.imei == imei) {
        return Err(StoreError::DuplicateImei(imei.clone()));
      }
    }

    let record = &mut self.records[idx];
    if let Some(brand) = brand {
      record.brand = brand;
    }
    if let Some(model) = model {
      record.model = model;
    }
    if let Some(imei) = imei {
      record.imei = imei;
    }
    if let Some(ram) = update.ram {
      record.ram = ram;
    }
    if let Some(storage) = update.storage {
      record.storage = storage;
    }
    if update.clear_image {
      record.image = None;
    } else if let Some(image) = update.image {
      record.image = Some(image);
    }
    let updated = record.clone();
    info!(%id, "Updated phone");

    self.persist()?;
    Ok(Some(updated))
  }

  /// Remove the phone with `id` and persist.
  pub fn delete(
    &mut self,
    id: RecordId,
    _confirmed: Confirmation,
  ) -> Result<Option<PhoneRecord>, StoreError> {
    let Some(idx) = self.position(id) else {
      return Ok(None);
    };
    let removed = self.records.remove(idx);
    info!(%id, imei = %removed.imei, "Deleted phone");
    self.persist()?;
    Ok(Some(removed))
  }

  /// Flag the phone with `id` as sold and persist. There is no way back.
  pub fn mark_sold(
    &mut self,
    id: RecordId,
    _confirmed: Confirmation,
  ) -> Result<Option<PhoneRecord>, StoreError> {
    let Some(idx) = self.position(id) else {
      return Ok(None);
    };
    let record = &mut self.records[idx];
    record.sold = true;
    let sold = record.clone();
    info!(%id, "Marked phone as sold");
    self.persist()?;
    Ok(Some(sold))
  }

  /// Phones whose brand, model or IMEI contains `query`, ignoring case.
  pub fn find(&self, query: &str) -> Vec<&PhoneRecord> {
    let needle = query.trim().to_lowercase();
    self.records.iter().filter(|r| r.matches(&needle)).collect()
  }

  /// Write the whole inventory to the slot.
  ///
  /// On failure memory is left as is and the store stays dirty until a
  /// later write goes through.
  pub fn persist(&mut self) -> Result<(), StoreError> {
    let result = serde_json::to_string(&self.records)
      .map_err(|e| StoreError::Storage(e.to_string()))
      .and_then(|json| {
        self
          .slot
          .write(&json)
          .map_err(|e| StoreError::Storage(e.to_string()))
      });

    match result {
      Ok(()) => {
        if self.dirty {
          info!("Pending inventory changes saved");
        }
        self.dirty = false;
        Ok(())
      }
      Err(e) => {
        self.dirty = true;
        warn!(error = %e, "Failed to save inventory, memory and storage now differ");
        Err(e)
      }
    }
  }

  pub fn get(&self, id: RecordId) -> Option<&PhoneRecord> {
    self.records.iter().find(|r| r.id == id)
  }

  pub fn records(&self) -> &[PhoneRecord] {
    &self.records
  }

  pub fn len(&self) -> usize {
    self.records.len()
  }

  pub fn is_empty(&self) -> bool {
    self.records.is_empty()
  }

  /// Whether in-memory changes are missing from storage.
  pub fn is_dirty(&self) -> bool {
    self.dirty
  }

  pub fn stats(&self) -> Stats {
    let sold = self.records.iter().filter(|r| r.sold).count();
    Stats {
      total: self.records.len(),
      available: self.records.len() - sold,
      sold,
    }
  }

  #[cfg(test)]
  pub fn slot(&self) -> &S {
    &self.slot
  }

  #[cfg(test)]
  pub fn slot_mut(&mut self) -> &mut S {
    &mut self.slot
  }

  /// IMEIs held by more than one record, in first-seen order.
  fn duplicate_imeis(&self) -> Vec<Imei> {
    let mut seen: Vec<&Imei> = Vec::new();
    let mut duplicates: Vec<Imei> = Vec::new();
    for record in &self.records {
      if seen.contains(&&record.imei) {
        if !duplicates.contains(&record.imei) {
          duplicates.push(record.imei.clone());
        }
      } else {
        seen.push(&record.imei);
      }
    }
    duplicates
  }

  fn position(&self, id: RecordId) -> Option<usize> {
    self.records.iter().position(|r| r.id == id)
  }
}

fn required(field: &str, value: &str) -> Result<String, StoreError> {
  let value = value.trim();
  if value.is_empty() {
    Err(StoreError::Validation(format!("{} is required", field)))
  } else {
    Ok(value.to_string())
  }
}
