use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::db::Database;
use crate::inventory::DEFAULT_SLOT_KEY;
use crate::shell::ShellError;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
  pub storage: StorageConfig,
  pub ui: UiConfig,
  pub shell: ShellConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
  /// Database file (defaults to the platform data directory)
  pub database: Option<PathBuf>,
  /// Key of the slot holding the inventory
  pub slot_key: String,
}

impl Default for StorageConfig {
  fn default() -> Self {
    Self {
      database: None,
      slot_key: DEFAULT_SLOT_KEY.to_string(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiConfig {
  /// How long status banners stay on screen
  pub banner_seconds: u64,
  /// Largest photo accepted for a record
  pub max_image_bytes: u64,
  /// Where the `x`/`X` keys write exports
  pub export_dir: PathBuf,
}

impl Default for UiConfig {
  fn default() -> Self {
    Self {
      banner_seconds: 3,
      max_image_bytes: 2 * 1024 * 1024,
      export_dir: PathBuf::from("."),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
  /// Where the app is served from; manifest entries resolve against it
  pub base_url: String,
  pub cache_prefix: String,
  /// Bump to start a new cache generation
  pub version: String,
  /// Resources cached on install
  pub manifest: Vec<String>,
  /// Document served to navigations when offline
  pub shell_document: String,
  pub timeout_secs: u64,
}

impl Default for ShellConfig {
  fn default() -> Self {
    Self {
      base_url: "http://localhost:8080/".to_string(),
      cache_prefix: "phonestock-".to_string(),
      version: "v1".to_string(),
      manifest: vec![
        "./".to_string(),
        "./index.html".to_string(),
        "./app.js".to_string(),
        "./manifest.json".to_string(),
        "https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.4.0/css/all.min.css".to_string(),
      ],
      shell_document: "./index.html".to_string(),
      timeout_secs: 30,
    }
  }
}

impl ShellConfig {
  /// Name of the current cache generation.
  pub fn generation(&self) -> String {
    format!("{}{}", self.cache_prefix, self.version)
  }

  pub fn base_url(&self) -> Result<Url, ShellError> {
    Url::parse(&self.base_url).map_err(|e| ShellError::Url {
      url: self.base_url.clone(),
      reason: e.to_string(),
    })
  }

  pub fn timeout(&self) -> Duration {
    Duration::from_secs(self.timeout_secs)
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./phonestock.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/phonestock/config.yaml
  ///
  /// Without any file the defaults apply.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("phonestock.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("phonestock").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self> {
    // An empty file is a valid "all defaults" config
    if contents.trim().is_empty() {
      return Ok(Self::default());
    }
    Ok(serde_yaml::from_str(contents)?)
  }

  /// Database file to use.
  pub fn database_path(&self) -> Result<PathBuf> {
    match &self.storage.database {
      Some(path) => Ok(path.clone()),
      None => Database::default_path(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_config_uses_defaults() {
    let config = Config::parse("").unwrap();
    assert_eq!(config.storage.slot_key, "phoneInventory");
    assert_eq!(config.ui.banner_seconds, 3);
    assert_eq!(config.shell.generation(), "phonestock-v1");
    assert_eq!(config.shell.manifest.len(), 5);
  }

  #[test]
  fn test_partial_config_keeps_other_defaults() {
    let yaml = r#"
shell:
  version: v2
  base_url: https://stock.example.com/app/
ui:
  banner_seconds: 5
"#;
    let config = Config::parse(yaml).unwrap();
    assert_eq!(config.shell.generation(), "phonestock-v2");
    assert_eq!(
      config.shell.base_url().unwrap().as_str(),
      "https://stock.example.com/app/"
    );
    assert_eq!(config.shell.shell_document, "./index.html");
    assert_eq!(config.ui.banner_seconds, 5);
    assert_eq!(config.ui.max_image_bytes, 2 * 1024 * 1024);
  }

  #[test]
  fn test_explicit_missing_file_is_an_error() {
    assert!(Config::load(Some(Path::new("/definitely/not/here.yaml"))).is_err());
  }

  #[test]
  fn test_bad_base_url() {
    let config = ShellConfig {
      base_url: "not a url".into(),
      ..ShellConfig::default()
    };
    assert!(matches!(config.base_url(), Err(ShellError::Url { .. })));
  }
}
