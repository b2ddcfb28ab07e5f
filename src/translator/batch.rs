use crate::config::TranslationConfig;
use crate::error::Result;
use crate::records::{read_records, write_translation_csv, TextRecord, PAGE_COLUMN, TEXT_COLUMN};
use crate::translator::provider::Translator;
use crate::ui::GracefulShutdown;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct TranslationProgress {
    pub texts_processed: usize,
    pub total_texts: usize,
    pub failures: usize,
    pub current_text: Option<String>,
    pub start_time: Instant,
}

impl TranslationProgress {
    pub fn new(total_texts: usize) -> Self {
        Self {
            texts_processed: 0,
            total_texts,
            failures: 0,
            current_text: None,
            start_time: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TranslationReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub source_language: String,
    pub target_language: String,
    pub rows: usize,
    pub unique_texts: usize,
    pub translated: usize,
    pub failed: usize,
    pub duration: Duration,
    pub translated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub unique_texts: usize,
    pub translated: usize,
    pub failed: usize,
}

/// Sequential translation of a record set: every distinct text is sent once,
/// with a fixed pause between requests, and the result is fanned back out
/// to every row carrying that text.
pub struct TranslationBatch {
    source_language: String,
    target_language: String,
    delay: Duration,
    shutdown: Option<GracefulShutdown>,
}

impl TranslationBatch {
    pub fn new(config: &TranslationConfig) -> Self {
        Self {
            source_language: config.source_language.clone(),
            target_language: config.target_language.clone(),
            delay: config.request_delay(),
            shutdown: None,
        }
    }

    pub fn with_shutdown(mut self, shutdown: GracefulShutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    pub fn translate_csv<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        translator: &dyn Translator,
        csv_in: P,
        csv_out: Q,
        progress_callback: Option<&dyn Fn(&TranslationProgress)>,
    ) -> Result<TranslationReport> {
        let start = Instant::now();
        let csv_in = csv_in.as_ref();
        let csv_out = csv_out.as_ref();

        let records = read_records(csv_in, &[PAGE_COLUMN, TEXT_COLUMN])?;
        let (translated, stats) = self.run(translator, records, progress_callback)?;
        write_translation_csv(csv_out, &translated)?;

        log::info!(
            "Translated {} of {} unique texts into {}",
            stats.translated,
            stats.unique_texts,
            csv_out.display()
        );

        Ok(TranslationReport {
            input: csv_in.to_path_buf(),
            output: csv_out.to_path_buf(),
            source_language: self.source_language.clone(),
            target_language: self.target_language.clone(),
            rows: translated.len(),
            unique_texts: stats.unique_texts,
            translated: stats.translated,
            failed: stats.failed,
            duration: start.elapsed(),
            translated_at: Utc::now(),
        })
    }

    /// Fills in `replacement` for every record. A text the provider fails on
    /// gets an empty translation and the batch moves on.
    pub fn run(
        &self,
        translator: &dyn Translator,
        records: Vec<TextRecord>,
        progress_callback: Option<&dyn Fn(&TranslationProgress)>,
    ) -> Result<(Vec<TextRecord>, BatchStats)> {
        let unique = unique_texts(&records);
        let mut progress = TranslationProgress::new(unique.len());
        let mut translations: HashMap<&str, String> = HashMap::with_capacity(unique.len());
        let mut stats = BatchStats {
            unique_texts: unique.len(),
            ..BatchStats::default()
        };

        for (index, text) in unique.iter().copied().enumerate() {
            if let Some(shutdown) = &self.shutdown {
                shutdown.check_shutdown()?;
            }
            if index > 0 && !self.delay.is_zero() {
                std::thread::sleep(self.delay);
            }

            progress.current_text = Some(text.to_string());
            if let Some(callback) = progress_callback {
                callback(&progress);
            }

            let translated = match translator.translate(text, &self.source_language, &self.target_language) {
                Ok(translated) => {
                    stats.translated += 1;
                    translated
                }
                Err(e) => {
                    log::warn!("Could not translate \"{}\": {}", text, e);
                    stats.failed += 1;
                    progress.failures += 1;
                    String::new()
                }
            };

            translations.insert(text, translated);
            progress.texts_processed += 1;
        }

        if let Some(callback) = progress_callback {
            callback(&progress);
        }

        let output = records
            .iter()
            .map(|record| TextRecord {
                page: record.page.clone(),
                text: record.text.clone(),
                replacement: translations.get(record.text.as_str()).cloned(),
            })
            .collect();

        Ok((output, stats))
    }
}

/// Distinct non-empty texts in order of first appearance.
fn unique_texts(records: &[TextRecord]) -> Vec<&str> {
    let mut seen = HashSet::new();
    records
        .iter()
        .map(|r| r.text.as_str())
        .filter(|text| !text.is_empty() && seen.insert(*text))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PencilTextError;
    use std::cell::RefCell;
    use std::fs;
    use tempfile::TempDir;

    #[derive(Debug, Default)]
    struct RecordingTranslator {
        calls: RefCell<Vec<String>>,
    }

    impl Translator for RecordingTranslator {
        fn translate(&self, text: &str, source: &str, target: &str) -> Result<String> {
            self.calls.borrow_mut().push(text.to_string());
            if text == "Roto" {
                return Err(PencilTextError::ProviderError {
                    message: "503 Service Unavailable".to_string(),
                });
            }
            Ok(format!("{}->{}:{}", source, target, text.to_uppercase()))
        }
    }

    fn batch() -> TranslationBatch {
        TranslationBatch::new(&TranslationConfig {
            request_delay_ms: 0,
            ..TranslationConfig::default()
        })
    }

    #[test]
    fn test_each_unique_text_is_translated_once() {
        let translator = RecordingTranslator::default();
        let records = vec![
            TextRecord::new("page_1.xml", "Hola"),
            TextRecord::new("page_1.xml", "Adiós"),
            TextRecord::new("page_2.xml", "Hola"),
        ];

        let (translated, stats) = batch().run(&translator, records, None).unwrap();

        assert_eq!(*translator.calls.borrow(), vec!["Hola", "Adiós"]);
        assert_eq!(stats, BatchStats { unique_texts: 2, translated: 2, failed: 0 });
        assert_eq!(translated[2].page, "page_2.xml");
        assert_eq!(translated[2].replacement.as_deref(), Some("es->en:HOLA"));
    }

    #[test]
    fn test_failures_become_empty_translations() {
        let translator = RecordingTranslator::default();
        let records = vec![
            TextRecord::new("page_1.xml", "Roto"),
            TextRecord::new("page_1.xml", "Bien"),
        ];

        let (translated, stats) = batch().run(&translator, records, None).unwrap();

        assert_eq!(stats.failed, 1);
        assert_eq!(translated[0].replacement.as_deref(), Some(""));
        assert_eq!(translated[1].replacement.as_deref(), Some("es->en:BIEN"));
    }

    #[test]
    fn test_translate_csv_keeps_row_order() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("texts.csv");
        let output = temp_dir.path().join("texts_translated.csv");
        fs::write(&input, "page,text\npage_1.xml,b\npage_1.xml,a\npage_2.xml,b\n").unwrap();

        let report = batch()
            .translate_csv(&RecordingTranslator::default(), &input, &output, None)
            .unwrap();

        assert_eq!(report.rows, 3);
        assert_eq!(report.unique_texts, 2);
        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            "page,text,new_text\npage_1.xml,b,es->en:B\npage_1.xml,a,es->en:A\npage_2.xml,b,es->en:B\n"
        );
    }

    #[test]
    fn test_cancellation_stops_before_next_request() {
        let shutdown = GracefulShutdown::new_for_test();
        shutdown.request_shutdown();

        let translator = RecordingTranslator::default();
        let result = batch()
            .with_shutdown(shutdown)
            .run(&translator, vec![TextRecord::new("page_1.xml", "Hola")], None);

        assert!(matches!(result, Err(PencilTextError::Cancelled)));
        assert!(translator.calls.borrow().is_empty());
    }
}
