pub mod engine;
pub mod map;

pub use engine::{substitute, ReplaceReport, RewriteOutcome, SubstitutionEngine};
pub use map::SubstitutionMap;
