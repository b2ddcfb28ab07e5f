use crate::archive::WorkingDirectory;
use crate::config::ExtractionConfig;
use crate::error::Result;
use crate::extractor::cleaner::TextCleaner;
use crate::extractor::report::ExtractionReport;
use crate::markup::{descendants, itertext, Element, PENCIL_NS, SVG_NS};
use crate::records::{write_extraction_csv, TextRecord};
use crate::scanner::{PageLocator, PageProgress};
use crate::ui::GracefulShutdown;
use chrono::Utc;
use std::path::Path;
use std::time::Instant;

/// Last emitted text of an extraction run. Threaded through every page so a
/// string repeated back to back is exported once, even across page
/// boundaries; any different string in between resets the suppression.
#[derive(Debug, Clone, Default)]
pub struct DedupState {
    last: Option<String>,
}

impl DedupState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when `text` should be emitted, and remembers it.
    pub fn accept(&mut self, text: &str) -> bool {
        if text.is_empty() || self.last.as_deref() == Some(text) {
            return false;
        }
        self.last = Some(text.to_string());
        true
    }
}

pub struct TextExtractor {
    locator: PageLocator,
    property_names: Vec<String>,
    cleaner: TextCleaner,
    shutdown: Option<GracefulShutdown>,
}

impl TextExtractor {
    pub fn new(config: &ExtractionConfig) -> Result<Self> {
        Ok(Self {
            locator: PageLocator::new(config),
            property_names: config.property_names.clone(),
            cleaner: TextCleaner::new()?,
            shutdown: None,
        })
    }

    pub fn with_shutdown(mut self, shutdown: GracefulShutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    pub fn extract<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        archive: P,
        csv_out: Q,
        progress_callback: Option<&dyn Fn(&PageProgress)>,
    ) -> Result<ExtractionReport> {
        let start = Instant::now();
        let archive = archive.as_ref();
        let csv_out = csv_out.as_ref();

        let workspace = WorkingDirectory::unpack(archive)?;
        log::debug!(
            "Unpacked {} ({}) into {}",
            archive.display(),
            workspace.format(),
            workspace.path().display()
        );

        let (records, pages_scanned) = self.collect_records(workspace.path(), progress_callback)?;
        write_extraction_csv(csv_out, &records)?;

        log::info!(
            "Exported {} strings from {} pages to {}",
            records.len(),
            pages_scanned,
            csv_out.display()
        );

        Ok(ExtractionReport {
            archive: archive.to_path_buf(),
            csv: csv_out.to_path_buf(),
            format: workspace.format(),
            pages_scanned,
            records_exported: records.len(),
            duration: start.elapsed(),
            extracted_at: Utc::now(),
        })
    }

    /// Scans every page under an unpacked document and returns the records
    /// in extraction order together with the number of pages read.
    pub fn collect_records(
        &self,
        root: &Path,
        progress_callback: Option<&dyn Fn(&PageProgress)>,
    ) -> Result<(Vec<TextRecord>, usize)> {
        let pages = self.locator.find_pages(root);
        let mut progress = PageProgress::new(pages.count()?);
        let mut dedup = DedupState::new();
        let mut records = Vec::new();

        for page in &pages {
            if let Some(shutdown) = &self.shutdown {
                shutdown.check_shutdown()?;
            }
            if let Some(callback) = progress_callback {
                callback(&progress);
            }

            let page = page?;
            let tree = page.load_markup()?;
            let before = records.len();
            self.scan_page(&page.name, &tree, &mut dedup, &mut records);
            log::debug!("{}: {} strings", page.display_path(), records.len() - before);

            progress.update_page(page.name);
        }

        if let Some(callback) = progress_callback {
            callback(&progress);
        }

        Ok((records, progress.pages_processed))
    }

    /// Appends the visible strings of one page. Sources are scanned in
    /// priority order: allow-listed properties, shapes carrying a `p:name`,
    /// then SVG text (tspan children before the text element's own text).
    pub fn scan_page(&self, page: &str, root: &Element, dedup: &mut DedupState, records: &mut Vec<TextRecord>) {
        let mut emit = |raw: &str| {
            let text = self.cleaner.clean(raw);
            if dedup.accept(&text) {
                records.push(TextRecord::new(page, text));
            }
        };

        for property in descendants(root).filter(|e| e.is(PENCIL_NS, "property")) {
            let listed = property
                .attribute("name")
                .is_some_and(|name| self.property_names.iter().any(|p| p == name));
            if listed {
                emit(property.text.as_deref().unwrap_or(""));
            }
        }

        for shape in descendants(root).filter(|e| e.attribute_ns(PENCIL_NS, "name").is_some()) {
            emit(&itertext(shape));
        }

        for text in descendants(root).filter(|e| e.is(SVG_NS, "text")) {
            for tspan in text.children.iter().filter(|c| c.is(SVG_NS, "tspan")) {
                emit(tspan.text.as_deref().unwrap_or(""));
            }
            emit(text.text.as_deref().unwrap_or(""));
        }
    }
}
