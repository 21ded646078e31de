//! Error types for the command-line front end.

use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] voxdet_train::TrainError),

    #[error("Data error: {0}")]
    Data(#[from] voxdet_data::DataError),

    #[error("Export error: {0}")]
    Export(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
