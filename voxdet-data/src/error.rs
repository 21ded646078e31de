//! Error types for data ingest.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading calibration, label or point cloud files.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error at line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("Calibration key '{key}': {reason}")]
    Calibration { key: String, reason: String },

    #[error("Payload of {len} bytes is not a multiple of the {record}-byte point record")]
    PayloadLength { len: usize, record: usize },

    #[error("Camera-frame labels require a calibration record")]
    MissingCalibration,

    #[error("Invalid box: {0}")]
    InvalidBox(String),

    #[error("PCD error: {0}")]
    Pcd(String),

    #[error("PLY error: {0}")]
    Ply(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

impl DataError {
    pub(crate) fn parse(line: usize, reason: impl Into<String>) -> Self {
        DataError::Parse {
            line,
            reason: reason.into(),
        }
    }

    pub(crate) fn calibration(key: &str, reason: impl Into<String>) -> Self {
        DataError::Calibration {
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    /// The file could not be read or its payload has the wrong size.
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            DataError::Io(_) | DataError::ReadFile { .. } | DataError::PayloadLength { .. }
        )
    }

    /// A record was malformed (wrong field count, bad number, missing key).
    pub fn is_parse(&self) -> bool {
        matches!(
            self,
            DataError::Parse { .. }
                | DataError::Calibration { .. }
                | DataError::InvalidBox(_)
                | DataError::Pcd(_)
                | DataError::Ply(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, DataError>;

/// Read a whole file, attaching the path to any IO failure.
pub(crate) fn read_to_string(path: &std::path::Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| DataError::ReadFile {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn read_bytes(path: &std::path::Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|source| DataError::ReadFile {
        path: path.to_path_buf(),
        source,
    })
}
