use crate::cli::OutputFormat;
use crate::error::{PencilTextError, UserFriendlyError};
use crate::extractor::ExtractionReport;
use crate::substitution::ReplaceReport;
use crate::translator::TranslationReport;
use crate::AutoReport;
use console::{style, Emoji, Term};
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputMode {
    Human,
    Json,
    Plain,
}

impl From<&OutputFormat> for OutputMode {
    fn from(format: &OutputFormat) -> Self {
        match format {
            OutputFormat::Human => OutputMode::Human,
            OutputFormat::Json => OutputMode::Json,
            OutputFormat::Plain => OutputMode::Plain,
        }
    }
}

static CHECKMARK: Emoji = Emoji("✅ ", "✓ ");
static CROSS: Emoji = Emoji("❌ ", "✗ ");
static INFO: Emoji = Emoji("ℹ️  ", "i ");
static WARNING: Emoji = Emoji("⚠️  ", "! ");
static ROCKET: Emoji = Emoji("🚀 ", "> ");
static SPARKLES: Emoji = Emoji("✨ ", "* ");

pub struct OutputFormatter {
    term: Term,
    mode: OutputMode,
    use_colors: bool,
    verbose_level: u8,
    quiet: bool,
}

impl OutputFormatter {
    pub fn new(mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        let term = Term::stdout();
        let use_colors = match mode {
            OutputMode::Human => term.features().colors_supported() && !quiet,
            _ => false,
        };

        Self {
            term,
            mode,
            use_colors,
            verbose_level: if quiet { 0 } else { verbose },
            quiet,
        }
    }

    /// Progress bars only make sense on an interactive terminal in human mode.
    pub fn wants_progress(&self) -> bool {
        self.mode == OutputMode::Human && !self.quiet && self.term.is_term()
    }

    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Human => self.print_human_message(MessageType::Success, message),
            OutputMode::Json => self.print_json_message("success", message),
            OutputMode::Plain => println!("SUCCESS: {}", message),
        }
    }

    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Human => self.print_human_message(MessageType::Error, message),
            OutputMode::Json => self.print_json_message("error", message),
            OutputMode::Plain => eprintln!("ERROR: {}", message),
        }
    }

    pub fn warning(&self, message: &str) {
        if self.should_show_message(0) {
            match self.mode {
                OutputMode::Human => self.print_human_message(MessageType::Warning, message),
                OutputMode::Json => self.print_json_message("warning", message),
                OutputMode::Plain => println!("WARNING: {}", message),
            }
        }
    }

    pub fn info(&self, message: &str) {
        if self.should_show_message(1) {
            match self.mode {
                OutputMode::Human => self.print_human_message(MessageType::Info, message),
                OutputMode::Json => self.print_json_message("info", message),
                OutputMode::Plain => println!("INFO: {}", message),
            }
        }
    }

    pub fn start_operation(&self, operation: &str) {
        if self.should_show_message(0) {
            match self.mode {
                OutputMode::Human => {
                    if self.use_colors {
                        println!("{}{}", ROCKET, style(operation).bold());
                    } else {
                        println!("> {}", operation);
                    }
                }
                OutputMode::Json => self.print_json_message("operation_start", operation),
                OutputMode::Plain => println!("STARTING: {}", operation),
            }
        }
    }

    pub fn print_user_friendly_error(&self, error: &PencilTextError) {
        let user_message = error.user_message();
        self.error(&user_message);

        if let Some(suggestion) = error.suggestion() {
            match self.mode {
                OutputMode::Human => {
                    eprintln!();
                    if self.use_colors {
                        eprintln!("{}{}", INFO, style(format!("Suggestion: {}", suggestion)).cyan());
                    } else {
                        eprintln!("Suggestion: {}", suggestion);
                    }
                }
                OutputMode::Json => {
                    self.print_json_object(&serde_json::json!({
                        "type": "suggestion",
                        "message": suggestion
                    }));
                }
                OutputMode::Plain => {
                    eprintln!("SUGGESTION: {}", suggestion);
                }
            }
        }
    }

    pub fn print_extraction_report(&self, report: &ExtractionReport) {
        match self.mode {
            OutputMode::Json => self.print_json_report("extraction", report),
            OutputMode::Plain => {
                println!("EXTRACTED: {}", report.csv.display());
                println!("Format: {}", report.format);
                println!("Pages: {}", report.pages_scanned);
                println!("Strings: {}", report.records_exported);
                println!("Duration: {:?}", report.duration);
            }
            OutputMode::Human => {
                if self.quiet {
                    return;
                }
                self.success(&format!(
                    "{} strings exported to {}",
                    report.records_exported,
                    report.csv.display()
                ));
                self.print_field("Archive", &format!("{} ({})", report.archive.display(), report.format));
                self.print_field("Pages scanned", &report.pages_scanned.to_string());
                self.print_field("Time taken", &format_duration(report.duration));
            }
        }
    }

    pub fn print_translation_report(&self, report: &TranslationReport) {
        match self.mode {
            OutputMode::Json => self.print_json_report("translation", report),
            OutputMode::Plain => {
                println!("TRANSLATED: {}", report.output.display());
                println!("Languages: {} -> {}", report.source_language, report.target_language);
                println!("Rows: {}", report.rows);
                println!("Unique texts: {}", report.unique_texts);
                println!("Failed: {}", report.failed);
                println!("Duration: {:?}", report.duration);
            }
            OutputMode::Human => {
                if self.quiet {
                    return;
                }
                self.success(&format!(
                    "{} of {} unique texts translated ({} -> {}) into {}",
                    report.translated,
                    report.unique_texts,
                    report.source_language,
                    report.target_language,
                    report.output.display()
                ));
                if report.failed > 0 {
                    self.warning(&format!(
                        "{} texts could not be translated and were left empty",
                        report.failed
                    ));
                }
                self.print_field("Rows written", &report.rows.to_string());
                self.print_field("Time taken", &format_duration(report.duration));
            }
        }
    }

    pub fn print_replace_report(&self, report: &ReplaceReport) {
        match self.mode {
            OutputMode::Json => self.print_json_report("replace", report),
            OutputMode::Plain => {
                match &report.output {
                    Some(output) => println!("REPLACED: {}", output.display()),
                    None => println!("UNCHANGED: {}", report.archive.display()),
                }
                println!("Replacements: {}", report.replacements);
                println!("Pages modified: {}/{}", report.pages_modified, report.pages_scanned);
                println!("Duration: {:?}", report.duration);
            }
            OutputMode::Human => match &report.output {
                Some(output) => {
                    if self.quiet {
                        return;
                    }
                    self.success(&format!("{} replacements written to {}", report.replacements, output.display()));
                    self.print_field(
                        "Pages modified",
                        &format!("{} of {}", report.pages_modified, report.pages_scanned),
                    );
                    self.print_field("Format", &report.format.to_string());
                    self.print_field("Time taken", &format_duration(report.duration));
                }
                None => self.warning("No changes made: no text matched the substitutions"),
            },
        }
    }

    pub fn print_auto_report(&self, report: &AutoReport) {
        match self.mode {
            OutputMode::Json => self.print_json_report("auto", report),
            _ => {
                self.print_header("Pencil text pipeline");
                self.print_extraction_report(&report.extraction);
                self.print_translation_report(&report.translation);
                self.print_replace_report(&report.replace);
            }
        }
    }

    pub fn print_header(&self, title: &str) {
        if self.quiet {
            return;
        }

        match self.mode {
            OutputMode::Human => {
                println!();
                if self.use_colors {
                    println!("{} {}", SPARKLES, style(title).bold().cyan());
                } else {
                    println!("=== {} ===", title);
                }
                println!();
            }
            OutputMode::Json => {
                self.print_json_object(&serde_json::json!({
                    "type": "header",
                    "title": title
                }));
            }
            OutputMode::Plain => {
                println!("=== {} ===", title);
            }
        }
    }

    fn should_show_message(&self, min_verbose_level: u8) -> bool {
        !self.quiet && self.verbose_level >= min_verbose_level
    }

    fn print_field(&self, label: &str, value: &str) {
        let label = format!("{}:", label);
        if self.use_colors {
            println!("  {:<16}{}", label, style(value).cyan().bold());
        } else {
            println!("  {:<16}{}", label, value);
        }
    }

    fn print_human_message(&self, msg_type: MessageType, message: &str) {
        #[allow(clippy::type_complexity)]
        let (emoji, color_fn): (Emoji, Box<dyn Fn(&str) -> console::StyledObject<&str>>) =
            match msg_type {
                MessageType::Success => (CHECKMARK, Box::new(|msg| style(msg).green().bold())),
                MessageType::Error => (CROSS, Box::new(|msg| style(msg).red().bold())),
                MessageType::Warning => (WARNING, Box::new(|msg| style(msg).yellow().bold())),
                MessageType::Info => (INFO, Box::new(|msg| style(msg).cyan())),
            };

        if self.use_colors {
            match msg_type {
                MessageType::Error => eprintln!("{}{}", emoji, color_fn(message)),
                _ => println!("{}{}", emoji, color_fn(message)),
            }
        } else {
            let prefix = match msg_type {
                MessageType::Success => "✓",
                MessageType::Error => "✗",
                MessageType::Warning => "!",
                MessageType::Info => "i",
            };

            match msg_type {
                MessageType::Error => eprintln!("{} {}", prefix, message),
                _ => println!("{} {}", prefix, message),
            }
        }
    }

    fn print_json_message(&self, level: &str, message: &str) {
        self.print_json_object(&serde_json::json!({
            "type": "message",
            "level": level,
            "message": message,
            "timestamp": chrono::Utc::now().to_rfc3339()
        }));
    }

    fn print_json_report<T: Serialize>(&self, kind: &str, report: &T) {
        self.print_json_object(&serde_json::json!({
            "type": "report",
            "operation": kind,
            "report": report,
        }));
    }

    fn print_json_object(&self, obj: &serde_json::Value) {
        println!(
            "{}",
            serde_json::to_string(obj).unwrap_or_else(|_| "{}".to_string())
        );
    }
}

#[derive(Debug, Clone, Copy)]
enum MessageType {
    Success,
    Error,
    Warning,
    Info,
}

pub(crate) fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs > 0 {
        format!("{}s", secs)
    } else {
        format!("{}ms", duration.as_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_mode_from_cli_format() {
        assert_eq!(OutputMode::from(&OutputFormat::Human), OutputMode::Human);
        assert_eq!(OutputMode::from(&OutputFormat::Json), OutputMode::Json);
        assert_eq!(OutputMode::from(&OutputFormat::Plain), OutputMode::Plain);
    }

    #[test]
    fn test_quiet_mode() {
        let formatter = OutputFormatter::new(OutputMode::Human, 2, true);
        assert_eq!(formatter.verbose_level, 0);
        assert!(!formatter.wants_progress());
    }

    #[test]
    fn test_json_mode_never_shows_progress() {
        let formatter = OutputFormatter::new(OutputMode::Json, 0, false);
        assert!(!formatter.use_colors);
        assert!(!formatter.wants_progress());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(30)), "30s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
        assert_eq!(format_duration(Duration::from_millis(500)), "500ms");
    }

    #[test]
    fn test_should_show_message() {
        let formatter = OutputFormatter::new(OutputMode::Human, 1, false);
        assert!(formatter.should_show_message(0));
        assert!(formatter.should_show_message(1));
        assert!(!formatter.should_show_message(2));

        let quiet_formatter = OutputFormatter::new(OutputMode::Human, 2, true);
        assert!(!quiet_formatter.should_show_message(0));
    }
}
