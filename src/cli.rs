use crate::config::{CliOverrides, Config};
use crate::error::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pencil-text")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Extract, translate and replace the texts of Pencil .epgz documents")]
#[command(
    long_about = "pencil-text exports the user-visible strings of a Pencil Project document \
                  to CSV, translates them, and writes a copy of the document with the \
                  translated strings substituted. Run without a command to process the \
                  single .epgz file found next to the executable."
)]
#[command(before_help = "✏️  pencil-text - Pencil document localization")]
#[command(after_help = "EXAMPLES:\n  \
    pencil-text extract design.epgz --out texts.csv\n  \
    pencil-text translate texts.csv --out texts_translated.csv --target-lang fr\n  \
    pencil-text replace design.epgz texts_translated.csv --out design_FR.epgz\n  \
    pencil-text --dir ./mockups\n  \
    pencil-text --generate-config --config pencil-text.toml")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Configuration file path
    #[arg(short, long, global = true, help = "Path to TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(long, value_enum, global = true, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,

    /// Language of the extracted texts
    #[arg(long, global = true, value_parser = validate_language_code)]
    pub source_lang: Option<String>,

    /// Language to translate into
    #[arg(long, global = true, value_parser = validate_language_code)]
    pub target_lang: Option<String>,

    /// Pause between translation requests in milliseconds
    #[arg(long, global = true)]
    pub delay_ms: Option<u64>,

    /// Directory searched for the .epgz file when no command is given
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Verbose output level (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Generate sample configuration file
    #[arg(long, help = "Generate a sample configuration file")]
    pub generate_config: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Export the visible texts of a document to CSV (columns: page,text)
    Extract {
        /// Pencil document (.epgz)
        archive: PathBuf,

        #[arg(long, default_value = "texts.csv")]
        out: PathBuf,
    },

    /// Translate an extraction CSV (adds the new_text column)
    Translate {
        /// CSV produced by `extract`
        csv: PathBuf,

        #[arg(long, default_value = "texts_translated.csv")]
        out: PathBuf,
    },

    /// Write a copy of a document with the CSV replacements applied
    ///
    /// A text matches when the trimmed content of a page element equals the
    /// text column exactly. Rich text (contentText with inline tags or escaped
    /// markup) is exported without its tags, so those rows will not match and
    /// are left untranslated.
    Replace {
        /// Pencil document (.epgz)
        archive: PathBuf,

        /// CSV with page,text,new_text columns
        csv: PathBuf,

        #[arg(long, default_value = "output.epgz")]
        out: PathBuf,
    },
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON formatted output
    Json,
    /// Plain text output
    Plain,
}

impl Cli {
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load_with_defaults(self.config.as_ref())?;

        let overrides = self.create_cli_overrides();
        config.merge_with_cli_args(&overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn create_cli_overrides(&self) -> CliOverrides {
        CliOverrides::new()
            .with_source_language(self.source_lang.clone())
            .with_target_language(self.target_lang.clone())
            .with_request_delay(self.delay_ms)
            .with_auto_directory(self.dir.clone())
    }

    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }
}

/// Accepts provider language codes such as `es`, `en`, `pt-BR` or `zh-CN`.
pub fn validate_language_code(s: &str) -> std::result::Result<String, String> {
    let code = s.trim();

    if code.len() < 2 || code.len() > 10 {
        return Err("Language codes are 2 to 10 characters long (e.g. es, en, pt-BR)".to_string());
    }

    if !code.chars().all(|c| c.is_ascii_alphabetic() || c == '-') {
        return Err("Language codes may only contain letters and hyphens".to_string());
    }

    if code.starts_with('-') || code.ends_with('-') {
        return Err("Language codes cannot start or end with a hyphen".to_string());
    }

    Ok(code.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_language_codes() {
        for code in ["es", "en", "pt-BR", "zh-CN", " fr "] {
            assert!(validate_language_code(code).is_ok(), "Should accept: {}", code);
        }
        assert_eq!(validate_language_code(" fr ").unwrap(), "fr");
    }

    #[test]
    fn test_invalid_language_codes() {
        for code in ["", "e", "english-united-kingdom", "es_ES", "-es", "e5"] {
            assert!(validate_language_code(code).is_err(), "Should reject: {}", code);
        }
    }

    #[test]
    fn test_subcommand_defaults() {
        let cli = Cli::try_parse_from(["pencil-text", "extract", "design.epgz"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Command::Extract {
                archive: PathBuf::from("design.epgz"),
                out: PathBuf::from("texts.csv"),
            })
        );

        let cli = Cli::try_parse_from(["pencil-text", "replace", "a.epgz", "t.csv"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Command::Replace {
                archive: PathBuf::from("a.epgz"),
                csv: PathBuf::from("t.csv"),
                out: PathBuf::from("output.epgz"),
            })
        );
    }

    #[test]
    fn test_no_command_means_auto_mode() {
        let cli = Cli::try_parse_from(["pencil-text", "--dir", "/tmp"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.dir, Some(PathBuf::from("/tmp")));
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let cli = Cli::try_parse_from([
            "pencil-text",
            "translate",
            "texts.csv",
            "--target-lang",
            "fr",
            "--delay-ms",
            "250",
            "-vv",
        ])
        .unwrap();

        assert_eq!(cli.verbosity_level(), 2);
        let overrides = cli.create_cli_overrides();
        assert_eq!(overrides.target_language.as_deref(), Some("fr"));
        assert_eq!(overrides.request_delay_ms, Some(250));
    }

    #[test]
    fn test_replace_help_explains_matching() {
        use clap::CommandFactory;

        let mut command = Cli::command();
        let replace = command.find_subcommand_mut("replace").unwrap();
        let help = replace.render_long_help().to_string();

        assert!(help.contains("trimmed content"));
        assert!(help.contains("Rich text"));
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["pencil-text", "-q", "-v"]).is_err());
    }
}
