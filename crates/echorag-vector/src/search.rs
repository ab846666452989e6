use anyhow::Result;
use arrow_array::{Float32Array, StringArray};
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{DistanceType, Table};

use echorag_core::traits::DenseSnapshot;
use echorag_core::types::{SearchHit, SourceKind};

/// A table handle checked out at a fixed version.
pub struct LanceSnapshot {
	table: Table,
}

impl LanceSnapshot {
	pub fn new(table: Table) -> Self {
		Self { table }
	}
}

#[async_trait]
impl DenseSnapshot for LanceSnapshot {
	async fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
		if k == 0 { return Ok(Vec::new()); }
		let mut stream = self.table
			.vector_search(query.to_vec())?
			.distance_type(DistanceType::Dot)
			.limit(k)
			.execute()
			.await?;
		let mut hits = Vec::new();
		while let Some(batch) = stream.try_next().await? {
			let ids = batch.column_by_name("chunk_id")
				.and_then(|c| c.as_any().downcast_ref::<StringArray>())
				.ok_or_else(|| anyhow::anyhow!("chunk_id column missing"))?;
			let distances = batch.column_by_name("_distance")
				.and_then(|c| c.as_any().downcast_ref::<Float32Array>())
				.ok_or_else(|| anyhow::anyhow!("_distance column missing"))?;
			for i in 0..batch.num_rows() {
				// lance reports dot distance as 1 - x.y
				let score = 1.0 - distances.value(i);
				hits.push(SearchHit { id: ids.value(i).to_string(), score, source: SourceKind::Dense });
			}
		}
		hits.sort_by(|a, b| b.score.total_cmp(&a.score));
		Ok(hits)
	}
}
