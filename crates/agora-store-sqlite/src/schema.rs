//! SQL schema for the Agora SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS questions (
    question_id TEXT PRIMARY KEY,
    text        TEXT NOT NULL,
    pub_date    TEXT NOT NULL,   -- RFC 3339 UTC, fixed width
    end_date    TEXT             -- NULL = voting never closes
);

CREATE TABLE IF NOT EXISTS choices (
    choice_id   TEXT PRIMARY KEY,
    question_id TEXT NOT NULL REFERENCES questions(question_id) ON DELETE CASCADE,
    text        TEXT NOT NULL,
    position    INTEGER NOT NULL,
    UNIQUE (choice_id, question_id)
);

-- One row per (user, question). question_id is carried alongside choice_id so
-- the uniqueness constraint can be expressed; the composite foreign key keeps
-- the two consistent.
CREATE TABLE IF NOT EXISTS votes (
    vote_id     TEXT PRIMARY KEY,
    user_id     TEXT NOT NULL,
    question_id TEXT NOT NULL,
    choice_id   TEXT NOT NULL,
    cast_at     TEXT NOT NULL,
    UNIQUE (user_id, question_id),
    FOREIGN KEY (choice_id, question_id)
        REFERENCES choices(choice_id, question_id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS questions_pub_idx ON questions(pub_date);
CREATE INDEX IF NOT EXISTS choices_question_idx ON choices(question_id, position);
CREATE INDEX IF NOT EXISTS votes_choice_idx ON votes(choice_id);

PRAGMA user_version = 1;
";
