//! # ilhash Fingerprint
//!
//! Deterministic content fingerprints for sets of compiled modules, ignoring
//! cosmetic build differences such as version stamps, GUIDs and timestamps.
//!
//! ## Pipeline
//!
//! ```text
//! Paths (files / directories)
//!     │
//!     ├──> FileSetExpander
//!     │      └─> Ordered file list (sorted when a directory was expanded)
//!     │
//!     ├──> Disassembler (.dll / .exe only)
//!     │      └─> IL text + extracted resources, or raw-byte fallback
//!     │
//!     ├──> NormalizationFilter (per artifact category)
//!     │      └─> Raw bytes or retained lines
//!     │
//!     └──> ManifestBuilder
//!            ├─> aggregate accumulator  → master hash
//!            └─> per-artifact accumulator → component hash
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use ilhash_fingerprint::{NullDisassembler, Pipeline, PipelineOptions};
//!
//! fn main() -> ilhash_fingerprint::Result<()> {
//!     let pipeline = Pipeline::new(&NullDisassembler, PipelineOptions::ignoring_versions());
//!     let (master_hash, manifest) = pipeline.run(["build/output"])?;
//!
//!     println!("{master_hash} over {} components", manifest.components.len());
//!     Ok(())
//! }
//! ```

mod accumulator;
mod disassembler;
mod encoding;
mod error;
mod expander;
mod filter;
mod manifest;
mod pipeline;

pub use accumulator::{digest_bytes, Digest, HashAccumulator, READ_CHUNK_BYTES};
pub use disassembler::{Disassembler, Disassembly, NullDisassembler};
pub use encoding::{LineReader, TextEncoding};
pub use error::{FingerprintError, Result};
pub use expander::FileSetExpander;
pub use filter::{FileCategory, FilteredLines, LineFilter, NormalizationFilter};
pub use manifest::{ChildItem, Manifest, ManifestBuilder};
pub use pipeline::{fingerprint_paths, is_module, Pipeline, PipelineOptions, MODULE_EXTENSIONS};
