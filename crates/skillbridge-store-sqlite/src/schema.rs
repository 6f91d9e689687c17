//! SQL schema for the skillbridge SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Engagement and performance facts are append-only.
-- No UPDATE or DELETE is ever issued against these tables. Derived scores,
-- grades and trends are not stored; they are recomputed on read.
CREATE TABLE IF NOT EXISTS engagement_records (
    record_id      TEXT PRIMARY KEY,
    subject_id     TEXT NOT NULL,
    counterpart_id TEXT NOT NULL,
    occurred_at    TEXT NOT NULL,   -- RFC 3339 UTC, fixed width
    activity_json  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS performance_records (
    record_id      TEXT PRIMARY KEY,
    subject_id     TEXT NOT NULL,
    counterpart_id TEXT NOT NULL,
    category       TEXT NOT NULL,
    score          REAL NOT NULL,
    previous_score REAL,
    recorded_at    TEXT NOT NULL
);

-- One row per (subject, counterpart, day); rewritten wholesale on upsert.
CREATE TABLE IF NOT EXISTS attendance_records (
    subject_id     TEXT NOT NULL,
    counterpart_id TEXT NOT NULL,
    date           TEXT NOT NULL,   -- YYYY-MM-DD
    payload_json   TEXT NOT NULL,
    updated_at     TEXT NOT NULL,
    UNIQUE (subject_id, counterpart_id, date)
);

-- Snapshots of entities owned by another system; replaced on import.
CREATE TABLE IF NOT EXISTS teaching_profiles (
    user_id      TEXT NOT NULL,
    skill_id     TEXT NOT NULL,
    level        INTEGER NOT NULL,
    hours_taught REAL NOT NULL,
    rating       REAL NOT NULL,
    PRIMARY KEY (user_id, skill_id)
);

CREATE TABLE IF NOT EXISTS learning_profiles (
    user_id        TEXT NOT NULL,
    skill_id       TEXT NOT NULL,
    current_level  INTEGER NOT NULL,
    target_level   INTEGER NOT NULL,
    total_sessions INTEGER NOT NULL,
    PRIMARY KEY (user_id, skill_id)
);

CREATE TABLE IF NOT EXISTS locations (
    user_id TEXT PRIMARY KEY,
    country TEXT NOT NULL,
    city    TEXT
);

CREATE TABLE IF NOT EXISTS skills (
    skill_id        TEXT PRIMARY KEY,
    name            TEXT NOT NULL,
    difficulty      INTEGER NOT NULL,
    industry_demand REAL NOT NULL,
    total_learners  INTEGER NOT NULL,
    trending_score  REAL NOT NULL
);

CREATE INDEX IF NOT EXISTS engagement_counterpart_idx
    ON engagement_records(counterpart_id, occurred_at);
CREATE INDEX IF NOT EXISTS performance_counterpart_idx
    ON performance_records(counterpart_id, recorded_at);
CREATE INDEX IF NOT EXISTS attendance_counterpart_idx
    ON attendance_records(counterpart_id, date);
CREATE INDEX IF NOT EXISTS teaching_skill_idx
    ON teaching_profiles(skill_id);

PRAGMA user_version = 1;
";
