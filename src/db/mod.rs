pub mod schema;

use color_eyre::{eyre::eyre, Result};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Database connection wrapper shared by the inventory slot and the shell cache
pub struct Database {
  conn: Mutex<Connection>,
}

impl Database {
  /// Open or create the database at the given location
  pub fn open(path: &Path) -> Result<Self> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create database directory: {}", e))?;
    }

    let conn = Connection::open(path)
      .map_err(|e| eyre!("Failed to open database at {}: {}", path.display(), e))?;

    Self::with_connection(conn)
  }

  /// Open a private in-memory database
  #[cfg(test)]
  pub fn open_in_memory() -> Result<Self> {
    let conn =
      Connection::open_in_memory().map_err(|e| eyre!("Failed to open in-memory database: {}", e))?;
    Self::with_connection(conn)
  }

  fn with_connection(conn: Connection) -> Result<Self> {
    let db = Self {
      conn: Mutex::new(conn),
    };
    db.run_migrations()?;
    Ok(db)
  }

  /// Get the default database path
  pub fn default_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("phonestock").join("phonestock.db"))
  }

  /// Run database migrations
  fn run_migrations(&self) -> Result<()> {
    self
      .conn()?
      .execute_batch(schema::SCHEMA)
      .map_err(|e| eyre!("Failed to run migrations: {}", e))?;
    self.add_column_if_missing(
      "cache_generations",
      "complete",
      "INTEGER NOT NULL DEFAULT 0",
    )
  }

  /// `CREATE TABLE IF NOT EXISTS` leaves older tables alone, so new columns
  /// are added here.
  fn add_column_if_missing(&self, table: &str, column: &str, decl: &str) -> Result<()> {
    let conn = self.conn()?;
    let exists: bool = conn
      .query_row(
        &format!("SELECT COUNT(*) > 0 FROM pragma_table_info('{}') WHERE name = ?", table),
        [column],
        |row| row.get(0),
      )
      .map_err(|e| eyre!("Failed to inspect {}: {}", table, e))?;
    if !exists {
      conn
        .execute_batch(&format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, decl))
        .map_err(|e| eyre!("Failed to add {}.{}: {}", table, column, e))?;
    }
    Ok(())
  }

  /// Lock the connection
  pub fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
    self.conn.lock().map_err(|e| eyre!("Lock poisoned: {}", e))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_migrations_are_idempotent() {
    let db = Database::open_in_memory().unwrap();
    db.run_migrations().unwrap();

    let tables: i64 = db
      .conn()
      .unwrap()
      .query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('kv_slot', 'cache_generations', 'cache_entries')",
        [],
        |row| row.get(0),
      )
      .unwrap();
    assert_eq!(tables, 3);
  }

  #[test]
  fn test_migrations_upgrade_older_generation_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn
      .execute_batch(
        "CREATE TABLE cache_generations (name TEXT PRIMARY KEY, created_at TEXT NOT NULL DEFAULT (datetime('now')));
         INSERT INTO cache_generations (name) VALUES ('phonestock-v1');",
      )
      .unwrap();
    let db = Database::with_connection(conn).unwrap();

    let complete: i64 = db
      .conn()
      .unwrap()
      .query_row(
        "SELECT complete FROM cache_generations WHERE name = 'phonestock-v1'",
        [],
        |row| row.get(0),
      )
      .unwrap();
    assert_eq!(complete, 0);
  }
}
