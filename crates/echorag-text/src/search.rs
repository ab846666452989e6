use anyhow::Result;
use std::collections::BTreeSet;
use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, Occur, Query, TermQuery};
use tantivy::schema::{Field, IndexRecordOption, Value};
use tantivy::{Searcher, TantivyDocument, Term};

use echorag_core::traits::SparseSnapshot;
use echorag_core::types::{SearchHit, SourceKind};

/// Point-in-time view over the committed segments.
pub struct TantivySnapshot {
	searcher: Searcher,
	chunk_id_field: Field,
	tokens_field: Field,
}

impl TantivySnapshot {
	pub fn new(searcher: Searcher, chunk_id_field: Field, tokens_field: Field) -> Self {
		Self { searcher, chunk_id_field, tokens_field }
	}
}

impl SparseSnapshot for TantivySnapshot {
	/// BM25 over a disjunction of the given tokens.
	fn search(&self, tokens: &[String], k: usize) -> Result<Vec<SearchHit>> {
		let terms: BTreeSet<&str> = tokens.iter().map(String::as_str).collect();
		if k == 0 || terms.is_empty() { return Ok(Vec::new()); }

		let clauses: Vec<(Occur, Box<dyn Query>)> = terms
			.into_iter()
			.map(|t| {
				let term = Term::from_field_text(self.tokens_field, t);
				let q: Box<dyn Query> = Box::new(TermQuery::new(term, IndexRecordOption::WithFreqs));
				(Occur::Should, q)
			})
			.collect();
		let query = BooleanQuery::new(clauses);

		let top_docs = self.searcher.search(&query, &TopDocs::with_limit(k))?;
		let mut hits = Vec::with_capacity(top_docs.len());
		for (score, addr) in top_docs {
			let doc: TantivyDocument = self.searcher.doc(addr)?;
			let Some(id) = doc.get_first(self.chunk_id_field).and_then(|v| v.as_str()) else { continue };
			hits.push(SearchHit { id: id.to_string(), score, source: SourceKind::Sparse });
		}
		Ok(hits)
	}
}
