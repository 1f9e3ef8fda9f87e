//! # ilhash Disassembler
//!
//! [`Disassembler`](ilhash_fingerprint::Disassembler) backed by the external
//! `ildasm` tool. Each module is disassembled into its own scratch directory,
//! which the returned [`Disassembly`](ilhash_fingerprint::Disassembly) owns.

mod config;
mod error;
mod ildasm;

pub use config::{IldasmConfig, ILDASM_ENV};
pub use error::{DisassemblerError, Result};
pub use ildasm::IldasmDisassembler;
