//! Service modules for address extraction

pub mod extractor;
pub mod heuristic_extractor;
pub mod llm_extractor;
pub mod response_cleaner;

// Re-export service types
pub use extractor::{select_extractor, AddressExtractor};
pub use heuristic_extractor::{extract_fields, FullTextMode, HeuristicExtractor};
pub use llm_extractor::LlmExtractor;
