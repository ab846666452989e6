use anyhow::Result;
use async_trait::async_trait;
use std::sync::{Arc, RwLock};

use echorag_core::traits::{DenseEntry, DenseIndex, DenseSnapshot};
use echorag_core::types::{SearchHit, SourceKind};

/// Exact inner-product search over an in-memory vector list.
///
/// Writers replace the shared list wholesale, so a snapshot keeps the list
/// it was taken from.
#[derive(Default)]
pub struct FlatIndex {
	entries: RwLock<Arc<Vec<DenseEntry>>>,
}

impl FlatIndex {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn len(&self) -> usize {
		self.entries.read().map(|e| e.len()).unwrap_or(0)
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	fn update(&self, f: impl FnOnce(&mut Vec<DenseEntry>)) -> Result<()> {
		let mut guard = self.entries.write().map_err(|_| anyhow::anyhow!("flat index lock poisoned"))?;
		let mut next = guard.as_ref().clone();
		f(&mut next);
		*guard = Arc::new(next);
		Ok(())
	}
}

pub struct FlatSnapshot {
	entries: Arc<Vec<DenseEntry>>,
}

#[async_trait]
impl DenseIndex for FlatIndex {
	async fn insert(&self, entries: &[DenseEntry]) -> Result<()> {
		self.update(|all| {
			for e in entries {
				all.retain(|x| x.chunk_id != e.chunk_id);
				all.push(e.clone());
			}
		})
	}

	async fn delete_doc(&self, doc_id: &str) -> Result<()> {
		self.update(|all| all.retain(|x| x.doc_id != doc_id))
	}

	async fn snapshot(&self) -> Result<Arc<dyn DenseSnapshot>> {
		let entries = self.entries.read().map_err(|_| anyhow::anyhow!("flat index lock poisoned"))?.clone();
		Ok(Arc::new(FlatSnapshot { entries }))
	}
}

#[async_trait]
impl DenseSnapshot for FlatSnapshot {
	async fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
		let mut hits: Vec<SearchHit> = self.entries
			.iter()
			.map(|e| SearchHit {
				id: e.chunk_id.clone(),
				score: e.vector.iter().zip(query).map(|(a, b)| a * b).sum(),
				source: SourceKind::Dense,
			})
			.collect();
		hits.sort_by(|a, b| b.score.total_cmp(&a.score));
		hits.truncate(k);
		Ok(hits)
	}
}
