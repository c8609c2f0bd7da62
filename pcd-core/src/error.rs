use std::path::PathBuf;

use thiserror::Error;

/// Failure categories surfaced by the ingestion pipeline.
#[derive(Debug, Error)]
pub enum PcdError {
    /// Bad signature, truncated header or an unusable record layout.
    #[error("invalid LAS data: {0}")]
    Format(String),

    #[error("input file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// No point survived classification filtering.
    #[error("no points found for classifications {classifications:?}")]
    EmptyResult { classifications: Vec<u8> },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Copyable tag of a [`PcdError`], kept on failed analysis results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Format,
    FileNotFound,
    EmptyResult,
    Io,
    InvalidArgument,
}

impl PcdError {
    pub fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Format(_) => ErrorKind::Format,
            Self::FileNotFound(_) => ErrorKind::FileNotFound,
            Self::EmptyResult { .. } => ErrorKind::EmptyResult,
            Self::Io(_) => ErrorKind::Io,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
        }
    }
}

pub type Result<T> = std::result::Result<T, PcdError>;
