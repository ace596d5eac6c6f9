//! SQL schema for the envlog SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Readings are strictly append-only.
CREATE TABLE IF NOT EXISTS readings (
    reading_id     INTEGER PRIMARY KEY AUTOINCREMENT,
    temperature    REAL NOT NULL,   -- °C
    humidity       REAL NOT NULL,   -- %RH
    pressure       REAL NOT NULL,   -- kPa
    gas_resistance REAL,            -- kΩ
    created_at     TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%SZ', 'NOW'))
);

-- Zero or one annotation row per reading; fields are edited in place.
CREATE TABLE IF NOT EXISTS reading_metadata (
    entry_id   INTEGER PRIMARY KEY AUTOINCREMENT,
    reading_id INTEGER NOT NULL UNIQUE REFERENCES readings(reading_id),
    ac         INTEGER,
    coverings  INTEGER,
    notes      TEXT,
    created_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%SZ', 'NOW'))
);

CREATE INDEX IF NOT EXISTS readings_created_idx ON readings(created_at);

PRAGMA user_version = 1;
";
