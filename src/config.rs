use crate::error::{PencilTextError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub extraction: ExtractionConfig,
    pub translation: TranslationConfig,
    pub auto: AutoConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub page_prefix: String,
    pub page_extension: String,
    /// Values of the `name` attribute of `p:property` elements that hold visible text.
    pub property_names: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TranslationConfig {
    pub endpoint: String,
    pub source_language: String,
    pub target_language: String,
    pub request_delay_ms: u64,
    pub timeout: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AutoConfig {
    /// Directory searched for the single `.epgz` archive. Defaults to the executable's directory.
    pub directory: Option<PathBuf>,
    pub archive_extension: String,
    pub extract_csv: String,
    pub translated_csv: String,
    pub output_suffix: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            page_prefix: "page_".to_string(),
            page_extension: "xml".to_string(),
            property_names: vec![
                "text".to_string(),
                "label".to_string(),
                "contentText".to_string(),
                "name".to_string(),
                "note".to_string(),
            ],
        }
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://translate.googleapis.com/translate_a/single".to_string(),
            source_language: "es".to_string(),
            target_language: "en".to_string(),
            request_delay_ms: 10,
            timeout: 30,
        }
    }
}

impl Default for AutoConfig {
    fn default() -> Self {
        Self {
            directory: None,
            archive_extension: "epgz".to_string(),
            extract_csv: "texts.csv".to_string(),
            translated_csv: "texts_translated.csv".to_string(),
            output_suffix: "_EN".to_string(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(PencilTextError::Config {
                message: format!("Configuration file not found: {}", path.display()),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| PencilTextError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| PencilTextError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })?;

        Ok(config)
    }

    pub fn load_with_defaults<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_from_file(path),
            None => {
                let default_paths = ["pencil-text.toml", ".pencil-text.toml"];

                for default_path in &default_paths {
                    if Path::new(default_path).exists() {
                        return Self::load_from_file(default_path);
                    }
                }

                Ok(Self::default())
            }
        }
    }

    pub fn merge_with_cli_args(&mut self, cli_args: &CliOverrides) {
        if let Some(ref source) = cli_args.source_language {
            self.translation.source_language = source.trim().to_string();
        }

        if let Some(ref target) = cli_args.target_language {
            self.translation.target_language = target.trim().to_string();
        }

        if let Some(delay) = cli_args.request_delay_ms {
            self.translation.request_delay_ms = delay;
        }

        if let Some(ref directory) = cli_args.auto_directory {
            self.auto.directory = Some(directory.clone());
        }
    }

    /// Startup checks. A provider that cannot be reached by construction is
    /// reported here rather than halfway through a translation batch.
    pub fn validate(&self) -> Result<()> {
        if self.extraction.page_extension.trim_start_matches('.').is_empty() {
            return Err(PencilTextError::Config {
                message: "Page file extension must not be empty".to_string(),
            });
        }

        if self.extraction.property_names.is_empty() {
            return Err(PencilTextError::Config {
                message: "At least one property name must be specified".to_string(),
            });
        }

        let endpoint = Url::parse(&self.translation.endpoint)?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(PencilTextError::Config {
                message: format!(
                    "Translation endpoint must use http or https: {}",
                    self.translation.endpoint
                ),
            });
        }

        if self.translation.source_language.is_empty() || self.translation.target_language.is_empty() {
            return Err(PencilTextError::Config {
                message: "Source and target languages must be specified".to_string(),
            });
        }

        if self.translation.timeout == 0 {
            return Err(PencilTextError::Config {
                message: "Translation timeout must be greater than 0".to_string(),
            });
        }

        if self.auto.extract_csv.is_empty() || self.auto.translated_csv.is_empty() {
            return Err(PencilTextError::Config {
                message: "Auto mode CSV file names must not be empty".to_string(),
            });
        }

        if let Some(ref directory) = self.auto.directory {
            if !directory.is_dir() {
                return Err(PencilTextError::Config {
                    message: format!("Auto mode directory does not exist: {}", directory.display()),
                });
            }
        }

        Ok(())
    }

    pub fn create_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config).unwrap_or_else(|_| String::new())
    }
}

impl TranslationConfig {
    /// Pause between two consecutive provider requests.
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

#[derive(Debug, Default)]
pub struct CliOverrides {
    pub source_language: Option<String>,
    pub target_language: Option<String>,
    pub request_delay_ms: Option<u64>,
    pub auto_directory: Option<PathBuf>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source_language(mut self, language: Option<String>) -> Self {
        self.source_language = language;
        self
    }

    pub fn with_target_language(mut self, language: Option<String>) -> Self {
        self.target_language = language;
        self
    }

    pub fn with_request_delay(mut self, delay_ms: Option<u64>) -> Self {
        self.request_delay_ms = delay_ms;
        self
    }

    pub fn with_auto_directory(mut self, directory: Option<PathBuf>) -> Self {
        self.auto_directory = directory;
        self
    }
}
