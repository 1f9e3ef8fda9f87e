use crate::accumulator::HashAccumulator;
use crate::encoding::{LineReader, TextEncoding};
use crate::error::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Kind of artifact being hashed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileCategory {
    /// Text produced by disassembling a compiled module
    ModuleIr,
    /// Extracted Win32 resource container (`.res`)
    ResourceContainer,
    /// Any other extracted resource
    GenericResource,
    /// Unrecognized input file
    Opaque,
}

impl FileCategory {
    /// Sub-categorize an extracted resource by its extension
    pub fn for_resource(path: impl AsRef<Path>) -> Self {
        let is_container = path
            .as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("res"));
        if is_container {
            Self::ResourceContainer
        } else {
            Self::GenericResource
        }
    }

    /// Encoding for text-oriented categories
    pub fn default_encoding(self) -> Option<TextEncoding> {
        match self {
            Self::ModuleIr => Some(TextEncoding::Utf8),
            Self::ResourceContainer => Some(TextEncoding::Utf16Le),
            Self::GenericResource | Self::Opaque => None,
        }
    }
}

/// Lines treated as build noise for one category
pub struct NoiseRules {
    drop: Regex,
    /// `.custom` attribute blobs may wrap onto continuation lines
    wraps_blobs: bool,
}

impl NoiseRules {
    fn is_noise(&self, line: &str) -> bool {
        self.drop.is_match(line)
    }
}

static MODULE_IR_NOISE: Lazy<NoiseRules> = Lazy::new(|| NoiseRules {
    drop: Regex::new(concat!(
        r"^\s*//\s*(MVID:|Image base:|Time-date stamp:|Checksum:|WARNING: Created Win32 resource file)",
        r"|^\s*\.ver\s+\d+:\d+:\d+:\d+",
        r"|^\s*\.custom\b.*\b(AssemblyVersionAttribute|AssemblyFileVersionAttribute|AssemblyInformationalVersionAttribute|GuidAttribute)\b",
    ))
    .expect("module IR noise pattern"),
    wraps_blobs: true,
});

static RESOURCE_CONTAINER_NOISE: Lazy<NoiseRules> = Lazy::new(|| NoiseRules {
    drop: Regex::new(r"FileVersion|ProductVersion|Assembly Version")
        .expect("resource noise pattern"),
    wraps_blobs: false,
});

/// How an artifact's bytes are transformed before hashing
#[derive(Clone, Copy)]
pub enum NormalizationFilter {
    /// Raw bytes, unchanged
    PassThrough,
    /// Decode, optionally drop noise lines, re-encode each kept line
    Lines(LineFilter),
}

#[derive(Clone, Copy)]
pub struct LineFilter {
    encoding: TextEncoding,
    rules: Option<&'static NoiseRules>,
}

impl NormalizationFilter {
    pub fn select(category: FileCategory, ignore_version_noise: bool) -> Self {
        let Some(encoding) = category.default_encoding() else {
            return Self::PassThrough;
        };
        let rules = match (category, ignore_version_noise) {
            (_, false) => None,
            (FileCategory::ModuleIr, true) => Some(&*MODULE_IR_NOISE),
            (FileCategory::ResourceContainer, true) => Some(&*RESOURCE_CONTAINER_NOISE),
            _ => None,
        };
        Self::Lines(LineFilter { encoding, rules })
    }

    /// Replace the category encoding of a line filter
    pub fn with_encoding(self, encoding: Option<TextEncoding>) -> Self {
        match (self, encoding) {
            (Self::Lines(filter), Some(encoding)) => Self::Lines(LineFilter { encoding, ..filter }),
            (filter, _) => filter,
        }
    }

    pub fn is_pass_through(&self) -> bool {
        matches!(self, Self::PassThrough)
    }

    /// Open `path` and stream its filtered bytes into `acc`.
    ///
    /// Every call re-reads the source, so the same artifact can be fed to
    /// several accumulators. Returns the number of bytes fed.
    pub fn apply(&self, path: &Path, acc: &mut HashAccumulator) -> Result<u64> {
        let file = File::open(path)?;
        match self {
            Self::PassThrough => Ok(acc.feed_reader(file)?),
            Self::Lines(filter) => {
                let mut fed = 0u64;
                let mut encoded = Vec::new();
                for line in filter.lines(BufReader::new(file), path) {
                    encoded.clear();
                    filter.encoding.encode_into(&line?, &mut encoded);
                    acc.feed(&encoded);
                    fed += encoded.len() as u64;
                }
                Ok(fed)
            }
        }
    }
}

impl LineFilter {
    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    pub fn drops_noise(&self) -> bool {
        self.rules.is_some()
    }

    /// Lazy single-pass sequence of retained lines
    pub fn lines<R: std::io::BufRead>(&self, reader: R, path: &Path) -> FilteredLines<R> {
        FilteredLines {
            inner: LineReader::new(reader, self.encoding, path),
            rules: self.rules,
            in_blob: false,
        }
    }
}

pub struct FilteredLines<R> {
    inner: LineReader<R>,
    rules: Option<&'static NoiseRules>,
    in_blob: bool,
}

impl<R: std::io::BufRead> Iterator for FilteredLines<R> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.inner.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e)),
            };
            let Some(rules) = self.rules else {
                return Some(Ok(line));
            };

            if self.in_blob {
                self.in_blob = !code_part(&line).contains(')');
                continue;
            }
            if rules.is_noise(&line) {
                self.in_blob = rules.wraps_blobs && opens_unclosed_blob(&line);
                continue;
            }
            return Some(Ok(line));
        }
    }
}

/// Line text before ildasm's trailing `//` comment, which echoes blob bytes
/// as ASCII and may contain `)`.
fn code_part(line: &str) -> &str {
    line.split("//").next().unwrap_or(line)
}

fn opens_unclosed_blob(line: &str) -> bool {
    let code = code_part(line);
    code.find("= (")
        .is_some_and(|start| !code[start..].contains(')'))
}
