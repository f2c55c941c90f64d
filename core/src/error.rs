use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("File not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Invalid JSON in {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Backup already exists: {}", path.display())]
    BackupExists { path: PathBuf },

    #[error("Expected a JSON array of records in {}", path.display())]
    NotAnArray { path: PathBuf },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

/// A value that could not be interpreted. The record is still produced,
/// with `null` or the default in place of the value.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseWarning {
    /// 0-based position of the record in the transformer's input.
    pub record_index: usize,
    pub field:        String,
    pub raw_value:    String,
    pub reason:       String,
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "record {}: field '{}' value '{}': {}",
            self.record_index, self.field, self.raw_value, self.reason
        )
    }
}
