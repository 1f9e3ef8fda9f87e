use crate::error::{FingerprintError, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Flattens a mixed list of files and directories into an ordered file list
pub struct FileSetExpander {
    inputs: Vec<PathBuf>,
}

impl FileSetExpander {
    pub fn new<I, P>(inputs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        Self {
            inputs: inputs
                .into_iter()
                .map(|p| p.as_ref().to_path_buf())
                .collect(),
        }
    }

    /// Expand directories recursively.
    ///
    /// If any directory was expanded the whole list is sorted by the raw
    /// path bytes; a plain file list keeps the caller's order.
    pub fn expand(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let mut discovered = Vec::new();
        let mut expanded_any = false;

        for input in &self.inputs {
            log::debug!("Compiling file list for {}", input.display());
            let meta = std::fs::metadata(input).map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    FingerprintError::invalid_path(input)
                } else {
                    e.into()
                }
            })?;

            if meta.is_dir() {
                expanded_any = true;
                for entry in WalkDir::new(input).follow_links(true) {
                    let entry = entry?;
                    if entry.file_type().is_file() {
                        discovered.push(entry.into_path());
                    }
                }
            } else if meta.is_file() {
                files.push(input.clone());
            } else {
                return Err(FingerprintError::invalid_path(input));
            }
        }

        files.extend(discovered);
        if expanded_any {
            files.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
        }

        log::info!("Found {} files", files.len());
        Ok(files)
    }
}
