use ilhash_fingerprint::FingerprintError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DisassemblerError>;

#[derive(Error, Debug)]
pub enum DisassemblerError {
    #[error("Disassembler tool {} could not be started: {source}", tool.display())]
    ToolUnavailable {
        tool: PathBuf,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to list disassembler output: {0}")]
    WalkError(#[from] walkdir::Error),

    #[error("Module path has no file name: {}", .0.display())]
    NoFileName(PathBuf),
}

impl DisassemblerError {
    pub fn into_fingerprint_error(self, module: impl Into<PathBuf>) -> FingerprintError {
        let module = module.into();
        FingerprintError::disassembler(module, self.to_string())
    }
}
