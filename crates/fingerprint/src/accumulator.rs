use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use std::fmt;
use std::io::{ErrorKind, Read};
use xxhash_rust::xxh3::Xxh3;

/// Chunk size used when streaming raw file bytes
pub const READ_CHUNK_BYTES: usize = 1024 * 1024;

/// Incremental 128-bit hash over an ordered stream of byte chunks.
///
/// Feeding is order-sensitive: the same chunks in a different order give a
/// different digest. [`finalize`](Self::finalize) consumes the accumulator,
/// so it cannot be fed again afterwards.
pub struct HashAccumulator {
    state: Xxh3,
    fed: u64,
}

impl HashAccumulator {
    pub fn new() -> Self {
        Self {
            state: Xxh3::new(),
            fed: 0,
        }
    }

    pub fn feed(&mut self, bytes: &[u8]) {
        self.state.update(bytes);
        self.fed += bytes.len() as u64;
    }

    /// Stream a reader to its end in [`READ_CHUNK_BYTES`] chunks.
    ///
    /// Stops only when a read returns zero bytes. Returns the number of
    /// bytes fed.
    pub fn feed_reader<R: Read>(&mut self, mut reader: R) -> std::io::Result<u64> {
        let mut buffer = vec![0u8; READ_CHUNK_BYTES];
        let mut total = 0u64;
        loop {
            let read = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            self.feed(&buffer[..read]);
            total += read as u64;
        }
        Ok(total)
    }

    /// Total bytes fed so far
    pub fn bytes_fed(&self) -> u64 {
        self.fed
    }

    pub fn finalize(self) -> Digest {
        Digest(self.state.digest128())
    }
}

impl Default for HashAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

/// Finalized 128-bit digest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest(u128);

impl Digest {
    pub fn to_bytes(self) -> [u8; 16] {
        self.0.to_be_bytes()
    }

    /// Standard padded base64 of the big-endian digest bytes
    pub fn to_base64(self) -> String {
        BASE64.encode(self.to_bytes())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base64())
    }
}

/// Digest of a single in-memory byte slice
pub fn digest_bytes(bytes: &[u8]) -> Digest {
    let mut acc = HashAccumulator::new();
    acc.feed(bytes);
    acc.finalize()
}
