pub mod tantivy_utils;
pub mod tokenize;
pub mod index;
pub mod search;

pub use index::TantivySparseIndex;
pub use search::TantivySnapshot;
pub use tokenize::tokenize;
