use crate::error::Result;
use std::path::{Path, PathBuf};

/// Turns a compiled module into IL text plus extracted resources.
///
/// Implementations must produce the same output for the same module bytes.
pub trait Disassembler {
    fn disassemble(&self, module: &Path) -> Result<Disassembly>;
}

/// Outcome of one disassembly attempt.
///
/// Owns an optional scratch directory holding the generated artifacts. The
/// directory is removed by [`delete`](Self::delete) or on drop, unless
/// [`persist`](Self::persist) was called.
#[derive(Debug)]
pub struct Disassembly {
    successful: bool,
    il_path: PathBuf,
    resources: Vec<PathBuf>,
    scratch_dir: Option<PathBuf>,
}

impl Disassembly {
    pub fn succeeded(
        il_path: impl Into<PathBuf>,
        resources: Vec<PathBuf>,
        scratch_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            successful: true,
            il_path: il_path.into(),
            resources,
            scratch_dir,
        }
    }

    /// The module was not recognized; `module` is hashed as raw bytes instead
    pub fn failed(module: impl Into<PathBuf>) -> Self {
        Self {
            successful: false,
            il_path: module.into(),
            resources: Vec::new(),
            scratch_dir: None,
        }
    }

    pub fn successful(&self) -> bool {
        self.successful
    }

    /// IL text path, or the original module path when unsuccessful
    pub fn il_path(&self) -> &Path {
        &self.il_path
    }

    pub fn resources(&self) -> &[PathBuf] {
        &self.resources
    }

    pub fn scratch_dir(&self) -> Option<&Path> {
        self.scratch_dir.as_deref()
    }

    /// Remove generated artifacts. Safe to call more than once.
    pub fn delete(&mut self) -> std::io::Result<()> {
        let Some(dir) = self.scratch_dir.take() else {
            return Ok(());
        };
        match std::fs::remove_dir_all(&dir) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }

    /// Keep generated artifacts on disk; returns their directory
    pub fn persist(&mut self) -> Option<PathBuf> {
        self.scratch_dir.take()
    }
}

impl Drop for Disassembly {
    fn drop(&mut self) {
        if let Err(e) = self.delete() {
            log::warn!("Failed to remove temporary files: {e}");
        }
    }
}

/// Disassembler that never recognizes a module
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDisassembler;

impl Disassembler for NullDisassembler {
    fn disassemble(&self, module: &Path) -> Result<Disassembly> {
        Ok(Disassembly::failed(module))
    }
}
