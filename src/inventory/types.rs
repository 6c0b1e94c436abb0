//! Inventory record types and field validation.

use chrono::{DateTime, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::StoreError;

/// Identifier of an inventory record: milliseconds since the Unix epoch at
/// the time it was added, bumped when needed to stay unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(i64);

impl RecordId {
  pub const fn new(value: i64) -> Self {
    Self(value)
  }

  pub const fn value(self) -> i64 {
    self.0
  }

  /// The moment this record was added, derived from the id.
  pub fn added_at(self) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(self.0).single()
  }

  /// Local calendar date the record was added, as `YYYY-MM-DD`.
  pub fn added_date(self) -> String {
    self
      .added_at()
      .map(|t| t.with_timezone(&Local).format("%Y-%m-%d").to_string())
      .unwrap_or_default()
  }
}

impl fmt::Display for RecordId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Display::fmt(&self.0, f)
  }
}

impl FromStr for RecordId {
  type Err = std::num::ParseIntError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    s.trim().parse().map(Self)
  }
}

/// A 15-digit IMEI.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Imei(String);

impl Imei {
  pub const LEN: usize = 15;

  /// Parse an IMEI, accepting surrounding whitespace.
  pub fn parse(raw: &str) -> Result<Self, StoreError> {
    let trimmed = raw.trim();
    if trimmed.len() == Self::LEN && trimmed.bytes().all(|b| b.is_ascii_digit()) {
      Ok(Self(trimmed.to_string()))
    } else {
      Err(StoreError::Validation(format!(
        "IMEI must be exactly {} digits, got '{}'",
        Self::LEN,
        trimmed
      )))
    }
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl TryFrom<String> for Imei {
  type Error = StoreError;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    Self::parse(&value)
  }
}

impl From<Imei> for String {
  fn from(imei: Imei) -> Self {
    imei.0
  }
}

impl fmt::Display for Imei {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.pad(&self.0)
  }
}

/// Declares a closed set of capacity options that serialize as their labels.
macro_rules! capacity_options {
  ($(#[$meta:meta])* $name:ident, $what:literal { $($variant:ident => $label:literal),+ $(,)? }) => {
    $(#[$meta])*
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub enum $name {
      $(
        #[serde(rename = $label)]
        $variant,
      )+
    }

    impl $name {
      pub const ALL: &'static [$name] = &[$($name::$variant),+];

      pub fn label(self) -> &'static str {
        match self {
          $($name::$variant => $label,)+
        }
      }

      /// The option after this one, wrapping around.
      pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|o| *o == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
      }

      /// The option before this one, wrapping around.
      pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|o| *o == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
      }
    }

    impl fmt::Display for $name {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
      }
    }

    impl FromStr for $name {
      type Err = StoreError;

      fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
          .iter()
          .copied()
          .find(|o| o.label().eq_ignore_ascii_case(wanted))
          .ok_or_else(|| {
            let labels: Vec<&str> = Self::ALL.iter().map(|o| o.label()).collect();
            StoreError::Validation(format!(
              "unknown {} option '{}', expected one of {}",
              $what,
              wanted,
              labels.join(", ")
            ))
          })
      }
    }
  };
}

capacity_options! {
  /// Memory size options offered for a phone.
  Ram, "RAM" {
    Gb2 => "2GB",
    Gb3 => "3GB",
    Gb4 => "4GB",
    Gb6 => "6GB",
    Gb8 => "8GB",
    Gb12 => "12GB",
    Gb16 => "16GB",
  }
}

capacity_options! {
  /// Internal storage options offered for a phone.
  Storage, "storage" {
    Gb16 => "16GB",
    Gb32 => "32GB",
    Gb64 => "64GB",
    Gb128 => "128GB",
    Gb256 => "256GB",
    Gb512 => "512GB",
    Tb1 => "1TB",
  }
}

/// A phone held in stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneRecord {
  pub id: RecordId,
  pub brand: String,
  pub model: String,
  pub imei: Imei,
  pub ram: Ram,
  pub storage: Storage,
  /// Photo as a `data:` URL
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub image: Option<String>,
  #[serde(default)]
  pub sold: bool,
}

impl PhoneRecord {
  /// Case-insensitive substring match on brand, model or IMEI.
  /// `needle` must already be lowercased.
  pub fn matches(&self, needle: &str) -> bool {
    needle.is_empty()
      || self.brand.to_lowercase().contains(needle)
      || self.model.to_lowercase().contains(needle)
      || self.imei.as_str().contains(needle)
  }

  pub fn status_label(&self) -> &'static str {
    if self.sold {
      "Sold"
    } else {
      "Available"
    }
  }
}

/// Input for adding a phone. The IMEI is raw user input, validated on add.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPhone {
  pub brand: String,
  pub model: String,
  pub imei: String,
  pub ram: Ram,
  pub storage: Storage,
  pub image: Option<String>,
}

/// Partial update of a phone. Fields left as `None` are kept.
///
/// Deserializing a patch ignores unknown keys, including `id`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PhoneUpdate {
  pub brand: Option<String>,
  pub model: Option<String>,
  pub imei: Option<String>,
  pub ram: Option<Ram>,
  pub storage: Option<Storage>,
  pub image: Option<String>,
  /// Drop the stored image (takes precedence over `image`)
  pub clear_image: bool,
}

impl PhoneUpdate {
  pub fn is_empty(&self) -> bool {
    *self == Self::default()
  }
}

/// Proof that the user explicitly confirmed a destructive action.
#[derive(Debug, Clone, Copy)]
pub struct Confirmation(());

impl Confirmation {
  /// Record that the user answered yes to a confirmation prompt.
  pub fn by_user() -> Self {
    Self(())
  }
}

/// Inventory counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
  pub total: usize,
  pub available: usize,
  pub sold: usize,
}
