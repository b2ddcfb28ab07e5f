pub mod cleaner;
pub mod report;
pub mod text_extractor;

pub use cleaner::TextCleaner;
pub use report::ExtractionReport;
pub use text_extractor::{DedupState, TextExtractor};
