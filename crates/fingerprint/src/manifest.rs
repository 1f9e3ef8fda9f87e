use crate::accumulator::HashAccumulator;
use crate::error::Result;
use crate::filter::NormalizationFilter;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Fingerprint of a whole input set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Aggregate digest over every artifact, in processing order
    pub master_hash: String,

    /// One entry per artifact, in processing order
    pub components: Vec<ChildItem>,
}

/// Digest of a single artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildItem {
    pub path: String,
    pub hash: String,
}

impl Manifest {
    /// Look up a component by label
    pub fn component(&self, path: &str) -> Option<&ChildItem> {
        self.components.iter().find(|item| item.path == path)
    }
}

/// Folds artifacts into the aggregate and records a component for each
pub struct ManifestBuilder {
    aggregate: HashAccumulator,
    components: Vec<ChildItem>,
}

impl ManifestBuilder {
    pub fn new() -> Self {
        Self {
            aggregate: HashAccumulator::new(),
            components: Vec::new(),
        }
    }

    /// Hash one artifact twice: into the aggregate, then into a fresh
    /// accumulator for its own entry. The source is re-read and re-filtered
    /// for each pass.
    pub fn add_artifact(
        &mut self,
        path: &Path,
        filter: NormalizationFilter,
        label: impl Into<String>,
    ) -> Result<String> {
        filter.apply(path, &mut self.aggregate)?;

        log::debug!("Computing hash for {}", path.display());
        let mut single = HashAccumulator::new();
        filter.apply(path, &mut single)?;
        let hash = single.finalize().to_base64();
        log::debug!("Completed hash, result was {hash}");

        self.components.push(ChildItem {
            path: label.into(),
            hash: hash.clone(),
        });
        Ok(hash)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn finish(self) -> Manifest {
        log::debug!("Computing master hash for entire set");
        Manifest {
            master_hash: self.aggregate.finalize().to_base64(),
            components: self.components,
        }
    }
}

impl Default for ManifestBuilder {
    fn default() -> Self {
        Self::new()
    }
}
