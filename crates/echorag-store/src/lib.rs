//! echorag-store
//!
//! SQLite-backed [`ChunkStore`]: documents, every chunk (parents included)
//! and the heading index. One connection behind a mutex; every multi-row
//! write runs in a single transaction.

mod rows;
mod schema;

use anyhow::{Context, Result};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use echorag_core::traits::ChunkStore;
use echorag_core::{Chunk, DocId, Document, HeadingRow, IndexState};

use rows::{chunk_from_row, document_from_row, heading_from_row, to_i64, CHUNK_COLUMNS, DOCUMENT_COLUMNS};

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (creating if needed) the database file and its tables.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create store dir {}", parent.display()))?;
        }
        let conn = Connection::open(path).with_context(|| format!("open sqlite at {}", path.display()))?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory().context("open in-memory sqlite")?)
    }

    fn init(conn: Connection) -> Result<Self> {
        schema::apply_pragmas(&conn)?;
        schema::migrate(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| anyhow::anyhow!("sqlite connection mutex poisoned"))
    }

    /// Every stored chunk across all documents, ordered by document then index.
    pub fn all_chunks(&self) -> Result<Vec<Chunk>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare(&format!("SELECT {CHUNK_COLUMNS} FROM chunks ORDER BY doc_id, chunk_index"))?;
        let rows = stmt.query_map([], chunk_from_row)?;
        rows.map(|r| r?).collect()
    }
}

fn insert_rows(conn: &Connection, doc: &Document, chunks: &[Chunk]) -> Result<()> {
    conn.execute(
        "INSERT INTO documents (id, filename, filetype, created_at, meta_json, index_state)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            doc.id,
            doc.filename,
            doc.filetype,
            rows::format_time(&doc.created_at),
            serde_json::to_string(&doc.metadata)?,
            IndexState::Pending.as_str(),
        ],
    )
    .with_context(|| format!("insert document {}", doc.id))?;

    let mut stmt = conn.prepare(
        "INSERT INTO chunks (id, doc_id, chunk_index, text, doc_type, sensitivity_level,
                             redacted, is_parent, parent_chunk_id, section)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
    )?;
    for c in chunks {
        stmt.execute(params![
            c.chunk_id,
            c.doc_id,
            to_i64(c.chunk_index)?,
            c.text,
            c.doc_type.as_str(),
            c.sensitivity_level.as_str(),
            c.redacted,
            c.is_parent,
            c.parent_chunk_id,
            c.section,
        ])
        .with_context(|| format!("insert chunk {}", c.chunk_id))?;
    }
    Ok(())
}

impl ChunkStore for SqliteStore {
    fn insert_document(&self, doc: &Document, chunks: &[Chunk]) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        insert_rows(&tx, doc, chunks)?;
        tx.commit().context("commit document insert")?;
        tracing::debug!(doc_id = %doc.id, chunks = chunks.len(), "stored document");
        Ok(())
    }

    fn set_index_state(&self, doc_id: &str, state: IndexState) -> Result<()> {
        let conn = self.conn()?;
        let n = conn.execute(
            "UPDATE documents SET index_state = ?1 WHERE id = ?2",
            params![state.as_str(), doc_id],
        )?;
        anyhow::ensure!(n == 1, "no document {doc_id} to mark {}", state.as_str());
        Ok(())
    }

    fn documents_in_state(&self, state: IndexState) -> Result<Vec<DocId>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT id FROM documents WHERE index_state = ?1 ORDER BY created_at")?;
        let ids = stmt.query_map([state.as_str()], |row| row.get::<_, String>(0))?;
        Ok(ids.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn get_document(&self, doc_id: &str) -> Result<Option<Document>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                &format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = ?1"),
                [doc_id],
                document_from_row,
            )
            .optional()?;
        row.transpose()
    }

    fn list_documents(&self) -> Result<Vec<Document>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt.query_map([], document_from_row)?;
        rows.map(|r| r?).collect()
    }

    fn get_chunk(&self, chunk_id: &str) -> Result<Option<Chunk>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(&format!("SELECT {CHUNK_COLUMNS} FROM chunks WHERE id = ?1"), [chunk_id], chunk_from_row)
            .optional()?;
        row.transpose()
    }

    fn chunk_at(&self, doc_id: &str, chunk_index: usize) -> Result<Option<Chunk>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                &format!("SELECT {CHUNK_COLUMNS} FROM chunks WHERE doc_id = ?1 AND chunk_index = ?2"),
                params![doc_id, to_i64(chunk_index)?],
                chunk_from_row,
            )
            .optional()?;
        row.transpose()
    }

    fn chunks_for_doc(&self, doc_id: &str) -> Result<Vec<Chunk>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {CHUNK_COLUMNS} FROM chunks WHERE doc_id = ?1 ORDER BY chunk_index"
        ))?;
        let rows = stmt.query_map([doc_id], chunk_from_row)?;
        rows.map(|r| r?).collect()
    }

    fn delete_document(&self, doc_id: &str) -> Result<bool> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM doc_headings WHERE doc_id = ?1", [doc_id])?;
        tx.execute("DELETE FROM chunks WHERE doc_id = ?1", [doc_id])?;
        let n = tx.execute("DELETE FROM documents WHERE id = ?1", [doc_id])?;
        tx.commit().context("commit document delete")?;
        Ok(n > 0)
    }

    fn replace_headings(&self, doc_id: &str, rows: &[HeadingRow]) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM doc_headings WHERE doc_id = ?1", [doc_id])?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO doc_headings (doc_id, idx, heading_text, chunk_id, chunk_index)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for h in rows {
                stmt.execute(params![doc_id, h.idx, h.heading_text, h.chunk_id, to_i64(h.chunk_index)?])?;
            }
        }
        tx.commit().context("commit headings")?;
        Ok(())
    }

    fn headings_for_docs(&self, doc_ids: &[DocId]) -> Result<Vec<HeadingRow>> {
        if doc_ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.conn()?;
        let placeholders = vec!["?"; doc_ids.len()].join(", ");
        let mut stmt = conn.prepare(&format!(
            "SELECT doc_id, idx, heading_text, chunk_id, chunk_index FROM doc_headings
             WHERE doc_id IN ({placeholders}) ORDER BY doc_id, idx"
        ))?;
        let rows = stmt.query_map(params_from_iter(doc_ids.iter()), heading_from_row)?;
        rows.map(|r| r?).collect()
    }
}
