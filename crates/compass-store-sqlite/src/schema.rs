//! SQL schema for the compass SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// Unique columns carry plain UNIQUE constraints. Soft-deleted rows keep
/// their slot free by having their unique values tombstoned.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS sources (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL UNIQUE CHECK (name <> ''),
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    deleted_at  TEXT
);

CREATE TABLE IF NOT EXISTS questions (
    id          TEXT PRIMARY KEY,
    title       TEXT NOT NULL UNIQUE CHECK (title <> ''),
    subtitle    TEXT,
    position    TEXT NOT NULL CHECK (position IN (
                  'top-left', 'top', 'top-right',
                  'left', 'center', 'right',
                  'bottom-left', 'bottom', 'bottom-right')),
    is_primary  INTEGER NOT NULL DEFAULT 0,
    -- Nulled when the owning source is force-deleted.
    source_id   TEXT REFERENCES sources(id) ON DELETE SET NULL,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    deleted_at  TEXT
);

CREATE TABLE IF NOT EXISTS parties (
    id            TEXT PRIMARY KEY,
    name          TEXT NOT NULL UNIQUE CHECK (name <> ''),
    abbreviation  TEXT NOT NULL UNIQUE CHECK (abbreviation <> ''),
    external_id   TEXT,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL,
    deleted_at    TEXT
);

CREATE TABLE IF NOT EXISTS answers (
    question_id  TEXT NOT NULL REFERENCES questions(id) ON DELETE CASCADE,
    party_id     TEXT NOT NULL REFERENCES parties(id)   ON DELETE CASCADE,
    agree_level  INTEGER NOT NULL CHECK (agree_level BETWEEN 1 AND 5),
    statement    TEXT,
    source       TEXT,
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL,
    deleted_at   TEXT,
    PRIMARY KEY (question_id, party_id)
);

-- Submitted quiz results; `answers` is a JSON array of
-- {\"questionId\", \"agreeLevel\"} objects.
CREATE TABLE IF NOT EXISTS results (
    id           TEXT PRIMARY KEY,
    answers      TEXT NOT NULL DEFAULT '[]',
    ip_address   TEXT NOT NULL,
    fingerprint  TEXT NOT NULL,
    zip_code     INTEGER,
    gender       TEXT CHECK (gender IN ('male', 'female', 'other')),
    birth_year   INTEGER,
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL,
    deleted_at   TEXT
);

CREATE INDEX IF NOT EXISTS questions_source_idx ON questions(source_id);
CREATE INDEX IF NOT EXISTS answers_party_idx    ON answers(party_id);

PRAGMA user_version = 1;
";
