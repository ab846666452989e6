use tantivy::schema::{Schema, TextFieldIndexing, TextOptions, IndexRecordOption, STRING, STORED};
use tantivy::tokenizer::{TextAnalyzer, WhitespaceTokenizer, LowerCaser, StopWordFilter};
use tantivy::Index;

pub const TOKENIZER_NAME: &str = "echorag_tokens";

/// `chunk_id` and `doc_id` are exact-match keys; `tokens` holds the
/// space-joined output of [`crate::tokenize`].
pub fn build_schema() -> Schema {
	let mut schema_builder = Schema::builder();
	let _chunk_id_field = schema_builder.add_text_field("chunk_id", STRING | STORED);
	let _doc_id_field = schema_builder.add_text_field("doc_id", STRING | STORED);
	let tokens_indexing = TextFieldIndexing::default().set_tokenizer(TOKENIZER_NAME).set_index_option(IndexRecordOption::WithFreqsAndPositions);
	let tokens_options = TextOptions::default().set_indexing_options(tokens_indexing);
	let _tokens_field = schema_builder.add_text_field("tokens", tokens_options);
	schema_builder.build()
}

pub fn register_tokenizer(index: &Index) {
	let stop_words = vec![
		"an","and","are","as","at","be","by","for","from","has","he","in","is","it","its","of","on","that","the","to","was","will","with","or","but","not","this","these","they","them","their","there","then","than","so","if","when","where","why","how","what","which","who","whom","whose","can","could","should","would","may","might","must","shall","do","does","did","have","had","having",
	];
	let tokenizer = TextAnalyzer::builder(WhitespaceTokenizer::default())
		.filter(LowerCaser)
		.filter(StopWordFilter::remove(stop_words.into_iter().map(|s| s.to_string())))
		.build();
	index.tokenizers().register(TOKENIZER_NAME, tokenizer);
}
