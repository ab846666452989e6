//! echorag-text
//!
//! Sparse side of the hybrid index: BM25 over pre-tokenized chunk text,
//! backed by tantivy. Writes commit immediately and reload the reader, so a
//! snapshot taken after `insert` returns sees the new entries.
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tantivy::directory::MmapDirectory;
use tantivy::schema::Field;
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, Term};

use echorag_core::traits::{SparseEntry, SparseIndex, SparseSnapshot};

use crate::search::TantivySnapshot;
use crate::tantivy_utils::{build_schema, register_tokenizer};

const WRITER_HEAP_BYTES: usize = 50_000_000;

pub struct TantivySparseIndex {
	reader: IndexReader,
	writer: Mutex<IndexWriter>,
	chunk_id_field: Field,
	doc_id_field: Field,
	tokens_field: Field,
}

impl TantivySparseIndex {
	/// Open the index in `index_dir`, creating it when missing.
	pub fn open(index_dir: &Path) -> Result<Self> {
		std::fs::create_dir_all(index_dir)?;
		let dir = MmapDirectory::open(index_dir).with_context(|| format!("open tantivy dir {}", index_dir.display()))?;
		let index = Index::open_or_create(dir, build_schema())?;
		Self::from_index(index)
	}

	pub fn in_ram() -> Result<Self> {
		Self::from_index(Index::create_in_ram(build_schema()))
	}

	fn from_index(index: Index) -> Result<Self> {
		register_tokenizer(&index);
		let schema = index.schema();
		let chunk_id_field = schema.get_field("chunk_id")?;
		let doc_id_field = schema.get_field("doc_id")?;
		let tokens_field = schema.get_field("tokens")?;
		let reader = index.reader_builder().reload_policy(ReloadPolicy::Manual).try_into()?;
		let writer = index.writer(WRITER_HEAP_BYTES)?;
		Ok(Self { reader, writer: Mutex::new(writer), chunk_id_field, doc_id_field, tokens_field })
	}

	pub fn num_docs(&self) -> u64 {
		self.reader.searcher().num_docs()
	}

	fn commit(&self, writer: &mut IndexWriter) -> Result<()> {
		writer.commit()?;
		self.reader.reload()?;
		Ok(())
	}
}

impl SparseIndex for TantivySparseIndex {
	fn insert(&self, entries: &[SparseEntry]) -> Result<()> {
		if entries.is_empty() { return Ok(()); }
		let mut writer = self.writer.lock().map_err(|_| anyhow::anyhow!("tantivy writer lock poisoned"))?;
		for e in entries {
			// re-inserting a chunk replaces it
			writer.delete_term(Term::from_field_text(self.chunk_id_field, &e.chunk_id));
			writer.add_document(doc!(
				self.chunk_id_field => e.chunk_id.clone(),
				self.doc_id_field => e.doc_id.clone(),
				self.tokens_field => e.tokens.join(" "),
			))?;
		}
		self.commit(&mut writer)?;
		tracing::debug!(count = entries.len(), "sparse entries committed");
		Ok(())
	}

	fn delete_doc(&self, doc_id: &str) -> Result<()> {
		let mut writer = self.writer.lock().map_err(|_| anyhow::anyhow!("tantivy writer lock poisoned"))?;
		writer.delete_term(Term::from_field_text(self.doc_id_field, doc_id));
		self.commit(&mut writer)
	}

	fn snapshot(&self) -> Result<Arc<dyn SparseSnapshot>> {
		Ok(Arc::new(TantivySnapshot::new(self.reader.searcher(), self.chunk_id_field, self.tokens_field)))
	}
}
