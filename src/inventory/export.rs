//! JSON and spreadsheet (CSV) exports of the inventory.

use chrono::NaiveDate;
use color_eyre::{eyre::eyre, Result};
use std::path::{Path, PathBuf};
use tracing::info;

use super::types::PhoneRecord;

/// Export file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
  /// Full records as a JSON array
  Json,
  /// One spreadsheet row per phone
  Csv,
}

impl ExportFormat {
  pub fn extension(self) -> &'static str {
    match self {
      ExportFormat::Json => "json",
      ExportFormat::Csv => "csv",
    }
  }
}

const CSV_HEADER: [&str; 9] = [
  "No", "Brand", "Model", "IMEI", "RAM", "Storage", "Status", "Has Image", "Added",
];

/// Serialize the full records as pretty-printed JSON.
pub fn to_json(records: &[PhoneRecord]) -> Result<String> {
  serde_json::to_string_pretty(records).map_err(|e| eyre!("Failed to serialize inventory: {}", e))
}

/// Render one spreadsheet row per record, with a header row.
pub fn to_csv(records: &[PhoneRecord]) -> String {
  let mut out = String::new();
  push_row(&mut out, CSV_HEADER.iter().map(|s| s.to_string()));

  for (i, record) in records.iter().enumerate() {
    push_row(
      &mut out,
      [
        (i + 1).to_string(),
        record.brand.clone(),
        record.model.clone(),
        record.imei.to_string(),
        record.ram.to_string(),
        record.storage.to_string(),
        record.status_label().to_string(),
        if record.image.is_some() { "Yes" } else { "No" }.to_string(),
        record.id.added_date(),
      ],
    );
  }
  out
}

fn push_row(out: &mut String, fields: impl IntoIterator<Item = String>) {
  let fields: Vec<String> = fields.into_iter().map(|f| csv_field(&f)).collect();
  out.push_str(&fields.join(","));
  out.push_str("\r\n");
}

/// Quote a field when it contains a separator, quote or line break.
fn csv_field(value: &str) -> String {
  if value.contains([',', '"', '\n', '\r']) {
    format!("\"{}\"", value.replace('"', "\"\""))
  } else {
    value.to_string()
  }
}

/// `phone-inventory-YYYY-MM-DD.<ext>`
pub fn default_file_name(format: ExportFormat, date: NaiveDate) -> String {
  format!(
    "phone-inventory-{}.{}",
    date.format("%Y-%m-%d"),
    format.extension()
  )
}

/// Write an export into `dir`, returning the file written.
pub fn write_export(
  dir: &Path,
  format: ExportFormat,
  records: &[PhoneRecord],
  date: NaiveDate,
) -> Result<PathBuf> {
  let contents = match format {
    ExportFormat::Json => to_json(records)?,
    ExportFormat::Csv => to_csv(records),
  };

  std::fs::create_dir_all(dir)
    .map_err(|e| eyre!("Failed to create export directory {}: {}", dir.display(), e))?;
  let path = dir.join(default_file_name(format, date));
  std::fs::write(&path, contents)
    .map_err(|e| eyre!("Failed to write export {}: {}", path.display(), e))?;

  info!(path = %path.display(), count = records.len(), "Exported inventory");
  Ok(path)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::inventory::types::{Imei, Ram, RecordId, Storage};
  use chrono::{Local, TimeZone};

  fn record(id: i64, brand: &str, imei: &str, sold: bool) -> PhoneRecord {
    PhoneRecord {
      id: RecordId::new(id),
      brand: brand.into(),
      model: "Galaxy A54".into(),
      imei: Imei::parse(imei).unwrap(),
      ram: Ram::Gb8,
      storage: Storage::Gb128,
      image: None,
      sold,
    }
  }

  #[test]
  fn test_csv_rows_and_status() {
    let added = Local.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap();
    let mut sold = record(added.timestamp_millis(), "Samsung", "123456789012345", true);
    sold.image = Some("data:image/png;base64,AAAA".into());
    let records = vec![
      sold,
      record(added.timestamp_millis() + 1, "Apple", "222222222222222", false),
    ];

    let csv = to_csv(&records);
    let lines: Vec<&str> = csv.split("\r\n").filter(|l| !l.is_empty()).collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "No,Brand,Model,IMEI,RAM,Storage,Status,Has Image,Added");
    assert_eq!(
      lines[1],
      "1,Samsung,Galaxy A54,123456789012345,8GB,128GB,Sold,Yes,2024-03-05"
    );
    assert_eq!(
      lines[2],
      "2,Apple,Galaxy A54,222222222222222,8GB,128GB,Available,No,2024-03-05"
    );
  }

  #[test]
  fn test_csv_quotes_special_fields() {
    assert_eq!(csv_field("plain"), "plain");
    assert_eq!(csv_field("a,b"), "\"a,b\"");
    assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
  }

  #[test]
  fn test_json_export_is_full_array() {
    let records = vec![record(1, "Samsung", "123456789012345", false)];
    let json = to_json(&records).unwrap();
    let back: Vec<PhoneRecord> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, records);
  }

  #[test]
  fn test_default_file_name() {
    let date = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
    assert_eq!(
      default_file_name(ExportFormat::Csv, date),
      "phone-inventory-2024-01-31.csv"
    );
  }
}
