use crate::archive::Format;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize)]
pub struct ExtractionReport {
    pub archive: PathBuf,
    pub csv: PathBuf,
    pub format: Format,
    pub pages_scanned: usize,
    pub records_exported: usize,
    pub duration: Duration,
    pub extracted_at: DateTime<Utc>,
}
