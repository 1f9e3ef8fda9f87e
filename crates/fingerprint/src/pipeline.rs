use crate::disassembler::Disassembler;
use crate::encoding::TextEncoding;
use crate::error::Result;
use crate::expander::FileSetExpander;
use crate::filter::{FileCategory, NormalizationFilter};
use crate::manifest::{Manifest, ManifestBuilder};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Extensions handed to the disassembler
pub const MODULE_EXTENSIONS: &[&str] = &["dll", "exe"];

/// Options for one fingerprinting run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineOptions {
    /// Drop version attributes, build GUIDs and timestamps before hashing
    pub ignore_version_noise: bool,

    /// Leave disassembler output on disk after hashing
    pub keep_temporary_artifacts: bool,

    /// Decode text artifacts with this encoding instead of the category default
    pub encoding_override: Option<TextEncoding>,
}

impl PipelineOptions {
    pub fn ignoring_versions() -> Self {
        Self {
            ignore_version_noise: true,
            ..Default::default()
        }
    }

    fn filter_for(&self, category: FileCategory) -> NormalizationFilter {
        NormalizationFilter::select(category, self.ignore_version_noise)
            .with_encoding(self.encoding_override)
    }
}

/// Runs the normalization-and-hashing pipeline over an input set
pub struct Pipeline<'a, D: ?Sized> {
    disassembler: &'a D,
    options: PipelineOptions,
}

impl<'a, D: Disassembler + ?Sized> Pipeline<'a, D> {
    pub fn new(disassembler: &'a D, options: PipelineOptions) -> Self {
        Self {
            disassembler,
            options,
        }
    }

    /// Fingerprint `inputs`, returning the aggregate digest and the manifest
    pub fn run<I, P>(&self, inputs: I) -> Result<(String, Manifest)>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let files = FileSetExpander::new(inputs).expand()?;

        log::info!("Starting to hash {} files", files.len());
        let mut builder = ManifestBuilder::new();
        for file in &files {
            if is_module(file) {
                self.add_module(&mut builder, file)?;
            } else {
                let filter = self.options.filter_for(FileCategory::Opaque);
                builder.add_artifact(file, filter, label(file))?;
            }
        }

        let manifest = builder.finish();
        log::info!(
            "Master hash {} over {} components",
            manifest.master_hash,
            manifest.components.len()
        );
        Ok((manifest.master_hash.clone(), manifest))
    }

    fn add_module(&self, builder: &mut ManifestBuilder, module: &Path) -> Result<()> {
        log::info!("Disassembling {}", module.display());
        let mut disassembly = self.disassembler.disassemble(module)?;

        if disassembly.successful() {
            log::debug!("Disassembled to {}", disassembly.il_path().display());
            let name = file_name(module);
            builder.add_artifact(
                disassembly.il_path(),
                self.options.filter_for(FileCategory::ModuleIr),
                name,
            )?;

            for resource in disassembly.resources() {
                builder.add_artifact(
                    resource,
                    self.options.filter_for(FileCategory::for_resource(resource)),
                    file_name(resource),
                )?;
            }
        } else {
            log::info!(
                "{} could not be disassembled, hashing raw bytes",
                module.display()
            );
            builder.add_artifact(
                disassembly.il_path(),
                self.options.filter_for(FileCategory::Opaque),
                label(disassembly.il_path()),
            )?;
        }

        if self.options.keep_temporary_artifacts {
            if let Some(dir) = disassembly.persist() {
                log::info!("Keeping temporary files in {}", dir.display());
            }
        } else {
            log::debug!("Removing temporary files");
            disassembly.delete()?;
        }
        Ok(())
    }
}

/// Fingerprint `inputs` with default options, returning only the master hash
pub fn fingerprint_paths<I, P>(inputs: I, disassembler: &dyn Disassembler) -> Result<String>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    Pipeline::new(disassembler, PipelineOptions::default())
        .run(inputs)
        .map(|(master_hash, _)| master_hash)
}

/// Whether `path` has a compiled-module extension
pub fn is_module(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            MODULE_EXTENSIONS
                .iter()
                .any(|candidate| ext.eq_ignore_ascii_case(candidate))
        })
}

fn label(path: &Path) -> String {
    path.display().to_string()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| label(path))
}
