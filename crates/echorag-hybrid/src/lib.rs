//! echorag-hybrid
//!
//! Ingestion and retrieval over the dense and sparse indexes.
//!
//! Ingestion: chunk, embed with retry, write store + both indexes as one
//! logical unit (rolled back on failure, repairable after a crash).
//!
//! Retrieval: expand the question, fan out dense/sparse lookups per variant
//! against one snapshot, fuse with weighted RRF, hydrate from the store, run
//! the post-rank filters, optionally rerank, then gate on relevance.

pub mod context;
pub mod expand;
pub mod filters;
pub mod fuse;
pub mod ingest;
pub mod options;
pub mod rerank;
pub mod retrieve;
pub mod search;
pub mod writer;

pub use context::{dedupe_sentences, BlockKind, ContextAssembler, ContextBlock};
pub use expand::{heuristic_intent, heuristic_variants, is_general_conversation, Expansion, QueryExpander};
pub use filters::{authoritative_sort, decay_factor, has_toc_signal, FilterCtx, Scored};
pub use fuse::{rrf_fuse, Fused, RankedList};
pub use ingest::{IngestReport, Ingestor, NewDocument};
pub use options::{ContextOptions, DecayParams, RetrievalOptions, RetryPolicy, TagBoostParams, TimeWindow};
pub use retrieve::{OptionalStages, RetrievalResult, Retriever, INSUFFICIENT_CONTEXT_MSG};
pub use search::HybridSearcher;
pub use writer::{Backends, IndexWriter};
