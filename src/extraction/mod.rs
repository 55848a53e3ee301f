mod confidence;
mod entities;
mod fields;
mod layout;
mod normalize;
mod pipeline;
mod select;

pub use confidence::{ConfidenceScorer, legal_keyword_count};
pub use pipeline::{DocumentSource, Pipeline};
pub use select::CandidateSelector;
