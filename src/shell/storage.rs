//! Cache generation storage trait and SQLite implementation.

use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use std::sync::{Arc, MutexGuard};
use tracing::warn;

use super::error::ShellError;
use super::types::{Response, ResponseType};
use crate::db::Database;

/// Trait for shell cache backends.
///
/// A backend holds any number of named generations, each mapping URLs to
/// responses. Every single write must be atomic per key.
pub trait CacheStore: Send + Sync + 'static {
  /// Names of all generations, oldest first.
  fn generations(&self) -> Result<Vec<String>, ShellError>;

  /// Create the generation if it does not exist yet.
  fn open(&self, generation: &str) -> Result<(), ShellError>;

  /// Store one response, replacing any previous one for `url`.
  fn put(&self, generation: &str, url: &str, response: &Response) -> Result<(), ShellError>;

  /// Store several responses at once, all of them or none, and mark the
  /// generation complete in the same write.
  fn put_all(&self, generation: &str, entries: &[(String, Response)]) -> Result<(), ShellError>;

  /// Find a response for `url` in any generation, trying `preferred` first.
  fn lookup(&self, url: &str, preferred: &str) -> Result<Option<Response>, ShellError>;

  /// Whether `put_all` has completed for the generation.
  fn is_complete(&self, generation: &str) -> Result<bool, ShellError>;

  /// Drop a generation and everything in it. Returns whether it existed.
  fn delete(&self, generation: &str) -> Result<bool, ShellError>;

  /// Number of responses held by a generation.
  fn count(&self, generation: &str) -> Result<usize, ShellError>;
}

/// SQLite-based shell cache.
pub struct SqliteCacheStore {
  db: Arc<Database>,
}

impl SqliteCacheStore {
  pub fn new(db: Arc<Database>) -> Self {
    Self { db }
  }

  fn conn(&self) -> Result<MutexGuard<'_, Connection>, ShellError> {
    self.db.conn().map_err(|e| ShellError::Cache(e.to_string()))
  }
}

fn digest(body: &[u8]) -> String {
  let mut hasher = Sha256::new();
  hasher.update(body);
  hex::encode(hasher.finalize())
}

fn insert_entry(
  conn: &Connection,
  generation: &str,
  url: &str,
  response: &Response,
) -> Result<(), ShellError> {
  conn.execute(
    "INSERT OR IGNORE INTO cache_generations (name) VALUES (?)",
    params![generation],
  )?;
  conn.execute(
    "INSERT OR REPLACE INTO cache_entries (generation, url, status, response_type, content_type, body, digest, cached_at)
     VALUES (?, ?, ?, ?, ?, ?, ?, datetime('now'))",
    params![
      generation,
      url,
      response.status,
      response.response_type.as_str(),
      response.content_type,
      response.body,
      digest(&response.body)
    ],
  )?;
  Ok(())
}

impl CacheStore for SqliteCacheStore {
  fn generations(&self) -> Result<Vec<String>, ShellError> {
    let conn = self.conn()?;
    let mut stmt = conn.prepare("SELECT name FROM cache_generations ORDER BY rowid")?;
    let names = stmt
      .query_map([], |row| row.get(0))?
      .collect::<Result<Vec<String>, _>>()?;
    Ok(names)
  }

  fn open(&self, generation: &str) -> Result<(), ShellError> {
    self.conn()?.execute(
      "INSERT OR IGNORE INTO cache_generations (name) VALUES (?)",
      params![generation],
    )?;
    Ok(())
  }

  fn put(&self, generation: &str, url: &str, response: &Response) -> Result<(), ShellError> {
    let conn = self.conn()?;
    insert_entry(&conn, generation, url, response)
  }

  fn put_all(&self, generation: &str, entries: &[(String, Response)]) -> Result<(), ShellError> {
    let mut conn = self.conn()?;
    let tx = conn.transaction()?;
    for (url, response) in entries {
      insert_entry(&tx, generation, url, response)?;
    }
    tx.execute(
      "INSERT OR IGNORE INTO cache_generations (name) VALUES (?)",
      params![generation],
    )?;
    tx.execute(
      "UPDATE cache_generations SET complete = 1 WHERE name = ?",
      params![generation],
    )?;
    tx.commit()?;
    Ok(())
  }

  fn lookup(&self, url: &str, preferred: &str) -> Result<Option<Response>, ShellError> {
    let conn = self.conn()?;
    let mut stmt = conn.prepare(
      "SELECT e.status, e.response_type, e.content_type, e.body, e.digest, e.generation
       FROM cache_entries e
       INNER JOIN cache_generations g ON g.name = e.generation
       WHERE e.url = ?
       ORDER BY (e.generation = ?) DESC, g.rowid",
    )?;

    let rows = stmt.query_map(params![url, preferred], |row| {
      Ok((
        row.get::<_, u16>(0)?,
        row.get::<_, String>(1)?,
        row.get::<_, Option<String>>(2)?,
        row.get::<_, Vec<u8>>(3)?,
        row.get::<_, String>(4)?,
        row.get::<_, String>(5)?,
      ))
    })?;

    for row in rows {
      let (status, response_type, content_type, body, stored_digest, generation) = row?;
      if digest(&body) != stored_digest {
        warn!(%url, %generation, "Cached body does not match its digest, ignoring entry");
        continue;
      }
      let response_type = response_type
        .parse::<ResponseType>()
        .map_err(ShellError::Cache)?;
      return Ok(Some(Response {
        status,
        response_type,
        content_type,
        body,
      }));
    }
    Ok(None)
  }

  fn is_complete(&self, generation: &str) -> Result<bool, ShellError> {
    let complete = self
      .conn()?
      .query_row(
        "SELECT complete FROM cache_generations WHERE name = ?",
        params![generation],
        |row| row.get::<_, bool>(0),
      )
      .optional()?;
    Ok(complete.unwrap_or(false))
  }

  fn delete(&self, generation: &str) -> Result<bool, ShellError> {
    let mut conn = self.conn()?;
    let tx = conn.transaction()?;
    tx.execute(
      "DELETE FROM cache_entries WHERE generation = ?",
      params![generation],
    )?;
    let removed = tx.execute(
      "DELETE FROM cache_generations WHERE name = ?",
      params![generation],
    )?;
    tx.commit()?;
    Ok(removed > 0)
  }

  fn count(&self, generation: &str) -> Result<usize, ShellError> {
    let count: i64 = self.conn()?.query_row(
      "SELECT COUNT(*) FROM cache_entries WHERE generation = ?",
      params![generation],
      |row| row.get(0),
    )?;
    Ok(count as usize)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn store() -> (Arc<Database>, SqliteCacheStore) {
    let db = Arc::new(Database::open_in_memory().unwrap());
    (db.clone(), SqliteCacheStore::new(db))
  }

  fn page(body: &str) -> Response {
    Response {
      status: 200,
      response_type: ResponseType::Basic,
      content_type: Some("text/html".into()),
      body: body.as_bytes().to_vec(),
    }
  }

  #[test]
  fn test_put_and_lookup() {
    let (_db, store) = store();
    store.put("v1", "http://app/index.html", &page("one")).unwrap();

    let hit = store.lookup("http://app/index.html", "v1").unwrap().unwrap();
    assert_eq!(hit, page("one"));
    assert!(store.lookup("http://app/missing", "v1").unwrap().is_none());
    assert_eq!(store.generations().unwrap(), vec!["v1".to_string()]);
  }

  #[test]
  fn test_put_replaces_same_key() {
    let (_db, store) = store();
    store.put("v1", "http://app/a", &page("old")).unwrap();
    store.put("v1", "http://app/a", &page("new")).unwrap();

    assert_eq!(store.count("v1").unwrap(), 1);
    assert_eq!(store.lookup("http://app/a", "v1").unwrap().unwrap(), page("new"));
  }

  #[test]
  fn test_lookup_prefers_given_generation() {
    let (_db, store) = store();
    store.put("v1", "http://app/a", &page("from v1")).unwrap();
    store.put("v2", "http://app/a", &page("from v2")).unwrap();

    assert_eq!(store.lookup("http://app/a", "v2").unwrap().unwrap(), page("from v2"));
    assert_eq!(store.lookup("http://app/a", "v1").unwrap().unwrap(), page("from v1"));
    // Unknown preference falls back to the oldest generation
    assert_eq!(store.lookup("http://app/a", "v9").unwrap().unwrap(), page("from v1"));
  }

  #[test]
  fn test_delete_generation() {
    let (_db, store) = store();
    store.open("v1").unwrap();
    store.put("v1", "http://app/a", &page("a")).unwrap();
    store.open("v2").unwrap();

    assert!(store.delete("v1").unwrap());
    assert!(!store.delete("v1").unwrap());
    assert_eq!(store.generations().unwrap(), vec!["v2".to_string()]);
    assert!(store.lookup("http://app/a", "v2").unwrap().is_none());
  }

  #[test]
  fn test_corrupted_entry_is_a_miss() {
    let (db, store) = store();
    store.put("v1", "http://app/a", &page("intact")).unwrap();
    db.conn()
      .unwrap()
      .execute("UPDATE cache_entries SET body = x'00' WHERE url = 'http://app/a'", [])
      .unwrap();

    assert!(store.lookup("http://app/a", "v1").unwrap().is_none());
  }

  #[test]
  fn test_put_all_writes_every_entry() {
    let (_db, store) = store();
    let entries = vec![
      ("http://app/".to_string(), page("root")),
      ("http://app/app.js".to_string(), page("js")),
    ];
    store.open("v1").unwrap();
    assert!(!store.is_complete("v1").unwrap());

    store.put_all("v1", &entries).unwrap();
    assert_eq!(store.count("v1").unwrap(), 2);
    assert!(store.is_complete("v1").unwrap());
  }

  #[test]
  fn test_single_puts_do_not_complete_a_generation() {
    let (_db, store) = store();
    store.put("v1", "http://app/a", &page("a")).unwrap();
    assert!(!store.is_complete("v1").unwrap());
    assert!(!store.is_complete("v9").unwrap());
  }
}
