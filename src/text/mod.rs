//! Text preparation: normalization and chunking.

pub mod normalize;
pub mod segment;

pub use normalize::normalize;
pub use segment::{Chunk, PunctuationBoundary, Segmenter, SentenceBoundary};
