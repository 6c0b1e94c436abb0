/// Schema for the local database.
pub const SCHEMA: &str = r#"
-- Single-value slots (the inventory lives in one row, rewritten on every change)
CREATE TABLE IF NOT EXISTS kv_slot (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    written_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Named shell cache generations
CREATE TABLE IF NOT EXISTS cache_generations (
    name TEXT PRIMARY KEY,
    -- Set once every manifest resource has been written
    complete INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Cached responses, one per (generation, url)
CREATE TABLE IF NOT EXISTS cache_entries (
    generation TEXT NOT NULL,
    url TEXT NOT NULL,
    status INTEGER NOT NULL,
    response_type TEXT NOT NULL,
    content_type TEXT,
    body BLOB NOT NULL,
    digest TEXT NOT NULL,
    cached_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (generation, url),
    FOREIGN KEY (generation) REFERENCES cache_generations(name) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_cache_entries_url ON cache_entries(url);
"#;
