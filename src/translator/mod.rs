pub mod batch;
pub mod provider;

pub use batch::{BatchStats, TranslationBatch, TranslationProgress, TranslationReport};
pub use provider::{parse_gtx_response, HttpTranslator, Translator};
