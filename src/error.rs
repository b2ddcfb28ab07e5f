use thiserror::Error;

#[derive(Error, Debug)]
pub enum PencilTextError {
    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unrecognized archive format: {path}")]
    UnrecognizedFormat { path: String },

    #[error("Path traversal detected in archive entry: {entry}")]
    PathTraversal { entry: String },

    #[error("ZIP container error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("File not found: {path}")]
    MissingFile { path: String },

    #[error("CSV file {path} lacks required columns: {}", missing.join(", "))]
    InvalidHeader { path: String, missing: Vec<String> },

    #[error("No usable substitutions in {path}")]
    EmptySubstitutionSet { path: String },

    #[error("Failed to process page {page}: {message}")]
    Markup { page: String, message: String },

    #[error("Translation provider error: {message}")]
    ProviderError { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Path validation failed: {path}")]
    InvalidPath { path: String },

    #[error("No .epgz archive found in {dir}")]
    ArchiveNotFound { dir: String },

    #[error("Expected a single .epgz archive in {dir}, found {count}")]
    AmbiguousArchive { dir: String, count: usize },

    #[error("Operation was cancelled by user")]
    Cancelled,
}

pub trait UserFriendlyError {
    fn user_message(&self) -> String;
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for PencilTextError {
    fn user_message(&self) -> String {
        match self {
            PencilTextError::UnrecognizedFormat { path } => {
                format!("Not a ZIP or gzip+tar archive: {}", path)
            }
            PencilTextError::PathTraversal { entry } => {
                format!("Archive entry escapes the extraction directory: {}", entry)
            }
            PencilTextError::MissingFile { path } => {
                format!("File not found: {}", path)
            }
            PencilTextError::InvalidHeader { path, missing } => {
                format!(
                    "CSV file {} has no valid header (missing: {})",
                    path,
                    missing.join(", ")
                )
            }
            PencilTextError::EmptySubstitutionSet { path } => {
                format!("CSV file {} has no rows with page, text and new_text", path)
            }
            PencilTextError::Markup { page, message } => {
                format!("Could not process page {}: {}", page, message)
            }
            PencilTextError::ProviderError { message } => {
                format!("Translation failed: {}", message)
            }
            PencilTextError::Config { message } => {
                format!("Configuration error: {}", message)
            }
            PencilTextError::InvalidPath { path } => {
                format!("Invalid file path: {}", path)
            }
            PencilTextError::ArchiveNotFound { dir } => {
                format!("No .epgz archive found in {}", dir)
            }
            PencilTextError::AmbiguousArchive { dir, count } => {
                format!("Expected a single .epgz archive in {}, found {}", dir, count)
            }
            PencilTextError::Cancelled => "Operation was cancelled by user".to_string(),
            _ => self.to_string(),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            PencilTextError::UnrecognizedFormat { .. } => Some(
                "Make sure the input is a Pencil .epgz document exported by Pencil Project.".to_string()
            ),
            PencilTextError::PathTraversal { .. } => Some(
                "The archive may have been crafted maliciously. Do not open it with other tools either.".to_string()
            ),
            PencilTextError::MissingFile { .. } => Some(
                "Check the path, or run the extract command first to produce the CSV.".to_string()
            ),
            PencilTextError::InvalidHeader { .. } => Some(
                "The first CSV row must name the columns: page,text,new_text.".to_string()
            ),
            PencilTextError::EmptySubstitutionSet { .. } => Some(
                "Fill the new_text column for the rows you want to replace.".to_string()
            ),
            PencilTextError::Config { .. } => Some(
                "Check your configuration file syntax, or regenerate it with --generate-config.".to_string()
            ),
            PencilTextError::ArchiveNotFound { .. } => Some(
                "Place exactly one .epgz file next to the executable, or pass --dir.".to_string()
            ),
            PencilTextError::AmbiguousArchive { .. } => Some(
                "Keep a single .epgz file in the directory, or use the extract/translate/replace commands explicitly.".to_string()
            ),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for PencilTextError {
    fn from(error: toml::de::Error) -> Self {
        PencilTextError::Config {
            message: error.to_string(),
        }
    }
}

impl From<walkdir::Error> for PencilTextError {
    fn from(error: walkdir::Error) -> Self {
        match error.into_io_error() {
            Some(io) => PencilTextError::Io(io),
            None => PencilTextError::InvalidPath {
                path: "filesystem loop detected".to_string(),
            },
        }
    }
}

impl From<url::ParseError> for PencilTextError {
    fn from(error: url::ParseError) -> Self {
        PencilTextError::Config {
            message: format!("invalid URL: {}", error),
        }
    }
}

pub type Result<T> = std::result::Result<T, PencilTextError>;
