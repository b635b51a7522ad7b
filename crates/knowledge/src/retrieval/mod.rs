//! Document retrieval over dense or lexical indexes.

pub mod dense;
pub mod lexical;
pub mod mode;
pub mod retriever;

pub use dense::DenseIndex;
pub use lexical::LexicalIndex;
pub use mode::{IndexMode, ModeEvent};
pub use retriever::Retriever;
