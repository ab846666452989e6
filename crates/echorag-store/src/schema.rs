use anyhow::{Context, Result};
use rusqlite::Connection;

pub(crate) fn apply_pragmas(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        PRAGMA foreign_keys = ON;
        ",
    )
    .context("apply sqlite pragmas")
}

pub(crate) fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS documents (
            id          TEXT PRIMARY KEY,
            filename    TEXT NOT NULL,
            filetype    TEXT NOT NULL,
            created_at  TEXT NOT NULL,
            meta_json   TEXT NOT NULL DEFAULT '{}',
            index_state TEXT NOT NULL DEFAULT 'pending'
        );

        CREATE TABLE IF NOT EXISTS chunks (
            id                TEXT PRIMARY KEY,
            doc_id            TEXT NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
            chunk_index       INTEGER NOT NULL,
            text              TEXT NOT NULL,
            doc_type          TEXT NOT NULL,
            sensitivity_level TEXT NOT NULL,
            redacted          INTEGER NOT NULL,
            is_parent         INTEGER NOT NULL,
            parent_chunk_id   TEXT,
            section           TEXT,
            UNIQUE (doc_id, chunk_index)
        );

        CREATE TABLE IF NOT EXISTS doc_headings (
            doc_id       TEXT NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
            idx          INTEGER NOT NULL,
            heading_text TEXT NOT NULL,
            chunk_id     TEXT NOT NULL,
            chunk_index  INTEGER NOT NULL,
            PRIMARY KEY (doc_id, idx)
        );

        CREATE INDEX IF NOT EXISTS idx_documents_state ON documents(index_state);
        ",
    )
    .context("create echorag tables")
}
