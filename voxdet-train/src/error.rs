//! Error types for voxelization, target encoding and the frame pipeline.

use thiserror::Error;
use voxdet_data::DataError;

#[derive(Debug, Error)]
pub enum TrainError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error("Shape mismatch: {0}")]
    Shape(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config file error: {0}")]
    ConfigFile(#[from] serde_json::Error),
}

impl TrainError {
    pub(crate) fn config(reason: impl Into<String>) -> Self {
        TrainError::Config(reason.into())
    }
}

pub type Result<T> = std::result::Result<T, TrainError>;
