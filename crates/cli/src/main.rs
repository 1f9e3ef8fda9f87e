use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use ilhash_disasm::{IldasmConfig, IldasmDisassembler};
use ilhash_fingerprint::{
    Disassembler, Manifest, NullDisassembler, Pipeline, PipelineOptions, TextEncoding,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "ilhash")]
#[command(
    about = "Fingerprint compiled modules, ignoring cosmetic build differences",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// Files and directories to fingerprint, in order
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Ignore version attributes, build GUIDs and timestamps
    #[arg(long)]
    ignore_versions: bool,

    /// Keep disassembler output on disk
    #[arg(long)]
    keep_temp: bool,

    /// Decode text artifacts with this encoding
    #[arg(long, value_enum)]
    encoding: Option<EncodingFlag>,

    /// Hash modules as raw bytes instead of disassembling them
    #[arg(long)]
    no_disassemble: bool,

    /// ildasm executable (overrides ILHASH_ILDASM)
    #[arg(long)]
    ildasm: Option<PathBuf>,

    /// Write the manifest as JSON to this file
    #[arg(long)]
    manifest: Option<PathBuf>,

    /// Print the manifest as JSON instead of the bare hash
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long)]
    quiet: bool,
}

#[derive(Copy, Clone, ValueEnum)]
enum EncodingFlag {
    Utf8,
    Utf16le,
}

impl EncodingFlag {
    const fn as_domain(self) -> TextEncoding {
        match self {
            EncodingFlag::Utf8 => TextEncoding::Utf8,
            EncodingFlag::Utf16le => TextEncoding::Utf16Le,
        }
    }
}

fn main() -> Result<()> {
    let mut cli = Cli::parse();
    if cli.json {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let options = PipelineOptions {
        ignore_version_noise: cli.ignore_versions,
        keep_temporary_artifacts: cli.keep_temp,
        encoding_override: cli.encoding.map(EncodingFlag::as_domain),
    };

    let disassembler: Box<dyn Disassembler> = if cli.no_disassemble {
        Box::new(NullDisassembler)
    } else {
        let mut config = IldasmConfig::from_env();
        if let Some(tool) = &cli.ildasm {
            config = config.with_tool(tool);
        }
        Box::new(IldasmDisassembler::new(config))
    };

    let (master_hash, manifest) = Pipeline::new(disassembler.as_ref(), options)
        .run(&cli.paths)
        .context("Fingerprinting failed")?;

    if let Some(path) = &cli.manifest {
        write_manifest(path, &manifest)?;
        log::info!("Manifest written to {}", path.display());
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&manifest)?);
    } else {
        println!("{master_hash}");
    }
    Ok(())
}

fn write_manifest(path: &Path, manifest: &Manifest) -> Result<()> {
    let body = serde_json::to_string_pretty(manifest)?;
    fs::write(path, body).with_context(|| format!("Failed to write {}", path.display()))
}
