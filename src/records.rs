//! Text records and their CSV framing.
//!
//! The extraction CSV has the columns `page,text`; the translation CSV adds
//! `new_text`. Readers trim every field, headers included, and tolerate rows
//! with missing trailing fields.

use crate::error::{PencilTextError, Result};
use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const PAGE_COLUMN: &str = "page";
pub const TEXT_COLUMN: &str = "text";
pub const NEW_TEXT_COLUMN: &str = "new_text";

/// One visible string found on a page, optionally paired with its replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextRecord {
    pub page: String,
    pub text: String,
    pub replacement: Option<String>,
}

impl TextRecord {
    pub fn new<P: Into<String>, T: Into<String>>(page: P, text: T) -> Self {
        Self {
            page: page.into(),
            text: text.into(),
            replacement: None,
        }
    }

    pub fn with_replacement<R: Into<String>>(mut self, replacement: R) -> Self {
        self.replacement = Some(replacement.into());
        self
    }
}

#[derive(Serialize)]
struct ExtractionRow<'a> {
    page: &'a str,
    text: &'a str,
}

#[derive(Serialize)]
struct TranslationRow<'a> {
    page: &'a str,
    text: &'a str,
    new_text: &'a str,
}

#[derive(Deserialize)]
struct InputRow {
    #[serde(default)]
    page: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    new_text: Option<String>,
}

pub fn write_extraction_csv<P: AsRef<Path>>(path: P, records: &[TextRecord]) -> Result<()> {
    let mut writer = WriterBuilder::new().from_path(path.as_ref())?;
    for record in records {
        writer.serialize(ExtractionRow {
            page: &record.page,
            text: &record.text,
        })?;
    }
    if records.is_empty() {
        writer.write_record([PAGE_COLUMN, TEXT_COLUMN])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_translation_csv<P: AsRef<Path>>(path: P, records: &[TextRecord]) -> Result<()> {
    let mut writer = WriterBuilder::new().from_path(path.as_ref())?;
    for record in records {
        writer.serialize(TranslationRow {
            page: &record.page,
            text: &record.text,
            new_text: record.replacement.as_deref().unwrap_or(""),
        })?;
    }
    if records.is_empty() {
        writer.write_record([PAGE_COLUMN, TEXT_COLUMN, NEW_TEXT_COLUMN])?;
    }
    writer.flush()?;
    Ok(())
}

/// Reads every row of a record CSV after checking that `required` columns
/// are present in the header. Empty `new_text` cells come back as `None`.
pub fn read_records<P: AsRef<Path>>(path: P, required: &[&str]) -> Result<Vec<TextRecord>> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(PencilTextError::MissingFile {
            path: path.display().to_string(),
        });
    }

    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    require_columns(path, &headers, required)?;

    let mut records = Vec::new();
    for row in reader.deserialize::<InputRow>() {
        let row = row?;
        records.push(TextRecord {
            page: row.page,
            text: row.text,
            replacement: row.new_text.filter(|t| !t.is_empty()),
        });
    }

    log::debug!("Read {} rows from {}", records.len(), path.display());
    Ok(records)
}

fn require_columns(path: &Path, headers: &StringRecord, required: &[&str]) -> Result<()> {
    let missing: Vec<String> = required
        .iter()
        .filter(|column| !headers.iter().any(|h| h == **column))
        .map(|column| column.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(PencilTextError::InvalidHeader {
            path: path.display().to_string(),
            missing,
        })
    }
}
