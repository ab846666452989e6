//! echorag-vector
//!
//! Dense side of the hybrid index. `LanceDenseIndex` stores unit vectors in a
//! lancedb table searched by dot product; `FlatIndex` is an exact in-memory
//! equivalent for tests and small corpora.

pub mod flat;
pub mod schema;
pub mod search;
pub mod table;
pub mod writer;

pub use flat::FlatIndex;
pub use search::LanceSnapshot;
pub use writer::LanceDenseIndex;
