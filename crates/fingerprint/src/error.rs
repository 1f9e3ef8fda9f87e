use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for fingerprinting operations
pub type Result<T> = std::result::Result<T, FingerprintError>;

/// Errors that abort a fingerprinting run
#[derive(Error, Debug)]
pub enum FingerprintError {
    /// IO error occurred
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Input path is neither a file nor a directory
    #[error("Invalid input path: {}", .0.display())]
    InvalidPath(PathBuf),

    /// Directory enumeration failed
    #[error("Failed to enumerate directory: {0}")]
    WalkError(#[from] walkdir::Error),

    /// Text artifact is malformed under the selected encoding
    #[error("Cannot decode {} as {encoding}: {reason}", path.display())]
    DecodeError {
        path: PathBuf,
        encoding: &'static str,
        reason: String,
    },

    /// The disassembler could not be run at all
    #[error("Disassembler failed on {}: {message}", path.display())]
    DisassemblerError { path: PathBuf, message: String },
}

impl FingerprintError {
    /// Create an invalid path error
    pub fn invalid_path(path: impl AsRef<Path>) -> Self {
        Self::InvalidPath(path.as_ref().to_path_buf())
    }

    /// Create a decode error
    pub fn decode(path: impl AsRef<Path>, encoding: &'static str, reason: impl Into<String>) -> Self {
        Self::DecodeError {
            path: path.as_ref().to_path_buf(),
            encoding,
            reason: reason.into(),
        }
    }

    /// Create a disassembler error
    pub fn disassembler(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::DisassemblerError {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }
}
