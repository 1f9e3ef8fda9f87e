use crate::error::{FingerprintError, Result};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::io::{BufRead, ErrorKind};
use std::path::PathBuf;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16LE_BOM: &[u8] = &[0xFF, 0xFE];

/// Text encoding used to decode a text artifact and re-encode its lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextEncoding {
    /// Platform default for disassembled text
    Utf8,
    /// Encoding of Win32 resource containers
    Utf16Le,
}

impl TextEncoding {
    pub fn name(self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Utf16Le => "utf-16le",
        }
    }

    /// Append the encoded form of `text` to `out`
    pub fn encode_into(self, text: &str, out: &mut Vec<u8>) {
        match self {
            Self::Utf8 => out.extend_from_slice(text.as_bytes()),
            Self::Utf16Le => {
                for unit in text.encode_utf16() {
                    out.extend_from_slice(&unit.to_le_bytes());
                }
            }
        }
    }

    fn from_bom(prefix: &[u8]) -> Option<(Self, usize)> {
        if prefix.starts_with(UTF8_BOM) {
            Some((Self::Utf8, UTF8_BOM.len()))
        } else if prefix.starts_with(UTF16LE_BOM) {
            Some((Self::Utf16Le, UTF16LE_BOM.len()))
        } else {
            None
        }
    }
}

/// Decodes a byte stream into lines without their terminators.
///
/// `\n`, `\r\n` and a lone `\r` all end a line. A byte-order mark at the
/// start of the stream wins over the requested encoding and is skipped.
pub struct LineReader<R> {
    reader: R,
    encoding: TextEncoding,
    path: PathBuf,
    pending: VecDeque<String>,
    started: bool,
    exhausted: bool,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(reader: R, encoding: TextEncoding, path: impl Into<PathBuf>) -> Self {
        Self {
            reader,
            encoding,
            path: path.into(),
            pending: VecDeque::new(),
            started: false,
            exhausted: false,
        }
    }

    /// Encoding in effect after byte-order-mark detection
    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    fn skip_bom(&mut self) -> Result<()> {
        let prefix = self.reader.fill_buf()?;
        if let Some((detected, len)) = TextEncoding::from_bom(prefix) {
            self.encoding = detected;
            self.reader.consume(len);
        }
        Ok(())
    }

    /// Read up to and excluding the next `\n`. `None` at end of stream.
    fn read_segment(&mut self) -> Result<Option<String>> {
        match self.encoding {
            TextEncoding::Utf8 => {
                let mut bytes = Vec::new();
                if self.reader.read_until(b'\n', &mut bytes)? == 0 {
                    return Ok(None);
                }
                if bytes.last() == Some(&b'\n') {
                    bytes.pop();
                }
                String::from_utf8(bytes)
                    .map(Some)
                    .map_err(|e| FingerprintError::decode(&self.path, "utf-8", e.to_string()))
            }
            TextEncoding::Utf16Le => {
                let mut units = Vec::new();
                loop {
                    match self.read_unit()? {
                        None if units.is_empty() => return Ok(None),
                        None => break,
                        Some(0x000A) => break,
                        Some(unit) => units.push(unit),
                    }
                }
                String::from_utf16(&units)
                    .map(Some)
                    .map_err(|e| FingerprintError::decode(&self.path, "utf-16le", e.to_string()))
            }
        }
    }

    fn read_unit(&mut self) -> Result<Option<u16>> {
        let mut pair = [0u8; 2];
        let mut filled = 0;
        while filled < pair.len() {
            match self.reader.read(&mut pair[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        match filled {
            0 => Ok(None),
            2 => Ok(Some(u16::from_le_bytes(pair))),
            _ => Err(FingerprintError::decode(
                &self.path,
                "utf-16le",
                "odd number of bytes",
            )),
        }
    }
}

impl<R: BufRead> Iterator for LineReader<R> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(line) = self.pending.pop_front() {
            return Some(Ok(line));
        }
        if self.exhausted {
            return None;
        }
        if !self.started {
            self.started = true;
            if let Err(e) = self.skip_bom() {
                self.exhausted = true;
                return Some(Err(e));
            }
        }

        match self.read_segment() {
            Ok(Some(segment)) => {
                let segment = segment.strip_suffix('\r').unwrap_or(&segment);
                self.pending
                    .extend(segment.split('\r').map(str::to_string));
                self.pending.pop_front().map(Ok)
            }
            Ok(None) => {
                self.exhausted = true;
                None
            }
            Err(e) => {
                self.exhausted = true;
                Some(Err(e))
            }
        }
    }
}
