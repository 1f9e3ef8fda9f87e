use crate::config::IldasmConfig;
use crate::error::{DisassemblerError, Result};
use ilhash_fingerprint::{Disassembler, Disassembly};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use walkdir::WalkDir;

/// Runs `ildasm /all /nobar /utf8 /out=<stem>.il <module>` inside a fresh
/// scratch directory; every other file it leaves there is a resource.
pub struct IldasmDisassembler {
    config: IldasmConfig,
}

impl IldasmDisassembler {
    pub fn new(config: IldasmConfig) -> Self {
        Self { config }
    }

    fn scratch_dir(&self) -> Result<tempfile::TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("ilhash-");
        let dir = match &self.config.scratch_root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };
        Ok(dir)
    }

    fn run_tool(&self, module: &Path) -> Result<Disassembly> {
        let stem = module
            .file_stem()
            .ok_or_else(|| DisassemblerError::NoFileName(module.to_path_buf()))?;
        let il_name = format!("{}.il", stem.to_string_lossy());
        let absolute = std::path::absolute(module)?;

        let tool = resolve_tool(&self.config.tool)?;

        let scratch = self.scratch_dir()?;
        log::debug!(
            "Running {} on {} in {}",
            tool.display(),
            absolute.display(),
            scratch.path().display()
        );
        let output = Command::new(&tool)
            .current_dir(scratch.path())
            .arg("/all")
            .arg("/nobar")
            .arg("/utf8")
            .arg(format!("/out={il_name}"))
            .arg(&absolute)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| DisassemblerError::ToolUnavailable {
                tool: self.config.tool.clone(),
                source,
            })?;

        let il_path = scratch.path().join(&il_name);
        if !output.status.success() || !il_path.is_file() {
            log::debug!(
                "{} rejected {}: {}",
                self.config.tool.display(),
                module.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return Ok(Disassembly::failed(module));
        }

        let resources = list_resources(scratch.path(), &il_path)?;
        let scratch_dir = scratch.keep();
        Ok(Disassembly::succeeded(
            scratch_dir.join(&il_name),
            resources,
            Some(scratch_dir),
        ))
    }
}

impl Disassembler for IldasmDisassembler {
    fn disassemble(&self, module: &Path) -> ilhash_fingerprint::Result<Disassembly> {
        self.run_tool(module)
            .map_err(|e| e.into_fingerprint_error(module))
    }
}

/// The tool runs with the scratch directory as its working directory, so a
/// relative path with a directory part is made absolute first.
fn resolve_tool(tool: &Path) -> Result<PathBuf> {
    if tool.is_relative() && tool.components().count() > 1 {
        Ok(std::path::absolute(tool)?)
    } else {
        Ok(tool.to_path_buf())
    }
}

/// Files ildasm extracted next to the IL, ordered by name
fn list_resources(scratch: &Path, il_path: &Path) -> Result<Vec<PathBuf>> {
    let mut resources = Vec::new();
    for entry in WalkDir::new(scratch).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() && entry.path() != il_path {
            resources.push(entry.into_path());
        }
    }
    Ok(resources)
}
