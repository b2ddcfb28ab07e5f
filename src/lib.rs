pub mod archive;
pub mod cli;
pub mod config;
pub mod error;
pub mod extractor;
pub mod markup;
pub mod records;
pub mod scanner;
pub mod substitution;
pub mod translator;
pub mod ui;

// Public API re-exports
pub use cli::{Cli, Command, OutputFormat};
pub use config::{AutoConfig, CliOverrides, Config, ExtractionConfig, TranslationConfig};
pub use error::{PencilTextError, Result, UserFriendlyError};

// Core functionality re-exports
pub use archive::{detect_format, Format, WorkingDirectory};
pub use extractor::{DedupState, ExtractionReport, TextExtractor};
pub use records::TextRecord;
pub use scanner::{PageFile, PageLocator, PageProgress};
pub use substitution::{ReplaceReport, SubstitutionEngine, SubstitutionMap};
pub use translator::{HttpTranslator, TranslationBatch, TranslationProgress, TranslationReport, Translator};
pub use ui::{GracefulShutdown, OutputFormatter, OutputMode, ProgressManager};

use serde::Serialize;
use std::path::{Path, PathBuf};

/// Outcome of the zero-argument pipeline: extract, translate, replace.
#[derive(Debug, Clone, Serialize)]
pub struct AutoReport {
    pub archive: PathBuf,
    pub directory: PathBuf,
    pub extraction: ExtractionReport,
    pub translation: TranslationReport,
    pub replace: ReplaceReport,
}

/// Main library interface for pencil-text functionality
pub struct PencilText {
    config: Config,
    output_formatter: OutputFormatter,
    progress_manager: ProgressManager,
    shutdown: GracefulShutdown,
}

impl PencilText {
    pub fn new(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Result<Self> {
        let output_formatter = OutputFormatter::new(output_mode, verbose, quiet);
        let progress_manager = ProgressManager::new(output_formatter.wants_progress());
        let shutdown = GracefulShutdown::new()?;

        Ok(Self {
            config,
            output_formatter,
            progress_manager,
            shutdown,
        })
    }

    /// Instance without a Ctrl+C handler, so several can coexist in one test process.
    #[doc(hidden)]
    pub fn new_for_test(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        let output_formatter = OutputFormatter::new(output_mode, verbose, quiet);
        let progress_manager = ProgressManager::new(false);
        let shutdown = GracefulShutdown::new_for_test();

        Self {
            config,
            output_formatter,
            progress_manager,
            shutdown,
        }
    }

    pub fn from_cli(cli_args: &Cli) -> Result<Self> {
        let config = cli_args.load_config()?;
        let output_mode = OutputMode::from(&cli_args.output_format);

        Self::new(config, output_mode, cli_args.verbose, cli_args.quiet)
    }

    /// Exports the visible texts of `archive` to `csv_out`.
    pub fn extract<P: AsRef<Path>, Q: AsRef<Path>>(&self, archive: P, csv_out: Q) -> Result<ExtractionReport> {
        let archive = archive.as_ref();
        self.shutdown.check_shutdown()?;
        self.output_formatter
            .start_operation(&format!("Extracting texts from {}", archive.display()));

        let page_progress = self.progress_manager.create_page_progress("Reading pages...");
        let progress_callback = {
            let pb = page_progress.clone();
            move |progress: &PageProgress| {
                ui::progress::update_page_progress(&pb, progress);
            }
        };

        let extractor = TextExtractor::new(&self.config.extraction)?.with_shutdown(self.shutdown.clone());
        let result = extractor.extract(archive, csv_out, Some(&progress_callback));

        match result {
            Ok(ref report) => ui::progress::finish_progress_with_summary(
                &page_progress,
                &format!("Scanned {} pages", report.pages_scanned),
                report.duration,
            ),
            Err(_) => page_progress.abandon(),
        }

        result
    }

    /// Translates `csv_in` with the configured HTTP provider.
    pub fn translate<P: AsRef<Path>, Q: AsRef<Path>>(&self, csv_in: P, csv_out: Q) -> Result<TranslationReport> {
        let translator = HttpTranslator::new(&self.config.translation)?;
        self.translate_with(&translator, csv_in, csv_out)
    }

    pub fn translate_with<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        translator: &dyn Translator,
        csv_in: P,
        csv_out: Q,
    ) -> Result<TranslationReport> {
        let csv_in = csv_in.as_ref();
        self.shutdown.check_shutdown()?;
        self.output_formatter.start_operation(&format!(
            "Translating {} ({} -> {})",
            csv_in.display(),
            self.config.translation.source_language,
            self.config.translation.target_language
        ));

        let text_progress = self.progress_manager.create_translation_progress("Translating...");
        let progress_callback = {
            let pb = text_progress.clone();
            move |progress: &TranslationProgress| {
                ui::progress::update_translation_progress(&pb, progress);
            }
        };

        let batch = TranslationBatch::new(&self.config.translation).with_shutdown(self.shutdown.clone());
        let result = batch.translate_csv(translator, csv_in, csv_out, Some(&progress_callback));

        match result {
            Ok(ref report) => ui::progress::finish_progress_with_summary(
                &text_progress,
                &format!("Translated {} texts", report.translated),
                report.duration,
            ),
            Err(_) => text_progress.abandon(),
        }

        result
    }

    /// Writes `output` with the replacements of `csv_in` applied to `archive`.
    /// When nothing matched, the report has no output and no file is written.
    pub fn replace<P, Q, R>(&self, archive: P, csv_in: Q, output: R) -> Result<ReplaceReport>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
        R: AsRef<Path>,
    {
        let archive = archive.as_ref();
        self.shutdown.check_shutdown()?;
        self.output_formatter
            .start_operation(&format!("Replacing texts in {}", archive.display()));

        let page_progress = self.progress_manager.create_page_progress("Rewriting pages...");
        let progress_callback = {
            let pb = page_progress.clone();
            move |progress: &PageProgress| {
                ui::progress::update_page_progress(&pb, progress);
            }
        };

        let engine = SubstitutionEngine::new(&self.config.extraction).with_shutdown(self.shutdown.clone());
        let result = engine.replace(archive, csv_in, output, Some(&progress_callback));

        match result {
            Ok(ref report) => ui::progress::finish_progress_with_summary(
                &page_progress,
                &format!("{} replacements", report.replacements),
                report.duration,
            ),
            Err(_) => page_progress.abandon(),
        }

        result
    }

    /// Runs extract, translate and replace on the single archive of the
    /// auto directory, writing every artifact next to it.
    pub fn run_auto(&self) -> Result<AutoReport> {
        let translator = HttpTranslator::new(&self.config.translation)?;
        self.run_auto_with(&translator)
    }

    pub fn run_auto_with(&self, translator: &dyn Translator) -> Result<AutoReport> {
        let directory = self.auto_directory()?;
        let archive = find_single_archive(&directory, &self.config.auto.archive_extension)?;
        let auto = &self.config.auto;

        let csv = directory.join(&auto.extract_csv);
        let translated_csv = directory.join(&auto.translated_csv);
        let output = directory.join(output_file_name(&archive, &auto.output_suffix, &auto.archive_extension));

        self.output_formatter
            .info(&format!("Processing {}", archive.display()));

        let extraction = self.extract(&archive, &csv)?;
        let translation = self.translate_with(translator, &csv, &translated_csv)?;
        let replace = self.replace(&archive, &translated_csv, &output)?;

        Ok(AutoReport {
            archive,
            directory,
            extraction,
            translation,
            replace,
        })
    }

    fn auto_directory(&self) -> Result<PathBuf> {
        if let Some(ref directory) = self.config.auto.directory {
            return Ok(directory.clone());
        }

        let exe = std::env::current_exe()?;
        exe.parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| PencilTextError::InvalidPath {
                path: format!("Executable has no parent directory: {}", exe.display()),
            })
    }

    pub fn generate_sample_config<P: AsRef<Path>>(output_path: P) -> Result<()> {
        let sample_config = Config::create_sample_config();
        std::fs::write(output_path.as_ref(), sample_config)?;
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn output_formatter(&self) -> &OutputFormatter {
        &self.output_formatter
    }

    pub fn is_running(&self) -> bool {
        self.shutdown.is_running()
    }

    pub fn request_shutdown(&self) {
        self.shutdown.request_shutdown();
    }

    pub fn handle_error(&self, error: &PencilTextError) {
        self.output_formatter.print_user_friendly_error(error);
    }
}

/// Returns the only file in `directory` with the given extension.
pub fn find_single_archive<P: AsRef<Path>>(directory: P, extension: &str) -> Result<PathBuf> {
    let directory = directory.as_ref();
    let extension = extension.trim_start_matches('.');

    let mut candidates = Vec::new();
    for entry in std::fs::read_dir(directory)? {
        let path = entry?.path();
        if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some(extension) {
            candidates.push(path);
        }
    }
    candidates.sort();

    match candidates.len() {
        0 => Err(PencilTextError::ArchiveNotFound {
            dir: directory.display().to_string(),
        }),
        1 => Ok(candidates.remove(0)),
        count => Err(PencilTextError::AmbiguousArchive {
            dir: directory.display().to_string(),
            count,
        }),
    }
}

/// `<stem><suffix>.<extension>`, e.g. `design.epgz` becomes `design_EN.epgz`.
pub fn output_file_name(archive: &Path, suffix: &str, extension: &str) -> String {
    let stem = archive
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    format!("{}{}.{}", stem, suffix, extension.trim_start_matches('.'))
}
