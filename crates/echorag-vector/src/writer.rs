use anyhow::{Context, Result};
use arrow_array::{FixedSizeListArray, RecordBatch, RecordBatchIterator, StringArray};
use async_trait::async_trait;
use lancedb::Connection;
use std::path::Path;
use std::sync::Arc;

use echorag_core::traits::{DenseEntry, DenseIndex, DenseSnapshot};

use crate::schema::build_arrow_schema;
use crate::search::LanceSnapshot;
use crate::table::{ensure_table, open_db, sql_literal};

/// Unit vectors keyed by `chunk_id` in one lancedb table.
pub struct LanceDenseIndex {
	db: Connection,
	table_name: String,
	dim: usize,
}

impl LanceDenseIndex {
	pub async fn open(db_path: &Path, table_name: &str, dim: usize) -> Result<Self> {
		let db = open_db(db_path.to_string_lossy().as_ref()).await.with_context(|| format!("open lancedb at {}", db_path.display()))?;
		ensure_table(&db, table_name, build_arrow_schema(dim as i32)).await?;
		Ok(Self { db, table_name: table_name.to_string(), dim })
	}

	pub async fn count(&self) -> Result<usize> {
		let table = self.db.open_table(&self.table_name).execute().await?;
		Ok(table.count_rows(None).await?)
	}

	fn to_record_batch(&self, entries: &[DenseEntry]) -> Result<RecordBatch> {
		let mut chunk_ids = Vec::with_capacity(entries.len());
		let mut doc_ids = Vec::with_capacity(entries.len());
		let mut vectors: Vec<Option<Vec<Option<f32>>>> = Vec::with_capacity(entries.len());
		for e in entries {
			anyhow::ensure!(e.vector.len() == self.dim, "vector for {} has dim {}, expected {}", e.chunk_id, e.vector.len(), self.dim);
			chunk_ids.push(e.chunk_id.clone());
			doc_ids.push(e.doc_id.clone());
			vectors.push(Some(e.vector.iter().map(|&x| Some(x)).collect()));
		}
		let record_batch = RecordBatch::try_new(build_arrow_schema(self.dim as i32), vec![
			Arc::new(StringArray::from(chunk_ids)),
			Arc::new(StringArray::from(doc_ids)),
			Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(vectors.into_iter(), self.dim as i32)),
		])?;
		Ok(record_batch)
	}
}

#[async_trait]
impl DenseIndex for LanceDenseIndex {
	async fn insert(&self, entries: &[DenseEntry]) -> Result<()> {
		if entries.is_empty() { return Ok(()); }
		let rb = self.to_record_batch(entries)?;
		let schema = rb.schema();
		let reader = Box::new(RecordBatchIterator::new(vec![Ok(rb)].into_iter(), schema));
		let table = self.db.open_table(&self.table_name).execute().await?;
		// upsert on chunk_id so re-indexing a document is idempotent
		let mut mi = table.merge_insert(&["chunk_id"]);
		mi.when_matched_update_all(None).when_not_matched_insert_all();
		let _ = mi.execute(reader).await?;
		tracing::debug!(count = entries.len(), table = %self.table_name, "dense entries written");
		Ok(())
	}

	async fn delete_doc(&self, doc_id: &str) -> Result<()> {
		let table = self.db.open_table(&self.table_name).execute().await?;
		table.delete(&format!("doc_id = {}", sql_literal(doc_id))).await?;
		Ok(())
	}

	async fn snapshot(&self) -> Result<Arc<dyn DenseSnapshot>> {
		let table = self.db.open_table(&self.table_name).execute().await?;
		let version = table.version().await?;
		table.checkout(version).await?;
		Ok(Arc::new(LanceSnapshot::new(table)))
	}
}
