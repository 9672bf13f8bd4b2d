/// Content fingerprints for duplicate detection.
///
/// A fingerprint is the 128-bit MD5 digest of a file's full content. Files are
/// streamed through the hasher in fixed-size chunks so memory use stays flat
/// no matter how large the file is.
use serde::{Serialize, Serializer};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default read chunk size (8 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

/// Digest of a file's content. Equal fingerprints mean identical content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentFingerprint([u8; 16]);

impl ContentFingerprint {
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Display for ContentFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl Serialize for ContentFingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A file could not be read while computing its fingerprint.
///
/// Recoverable: the file is treated as unique and never deleted.
#[derive(Debug, Error)]
#[error("Failed to read {} for hashing: {source}", path.display())]
pub struct ReadFailure {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Computes content fingerprints for files.
pub trait Fingerprinter {
    fn fingerprint(&self, path: &Path) -> Result<ContentFingerprint, ReadFailure>;
}

/// Streams files through MD5 in chunks of `chunk_size` bytes.
#[derive(Debug, Clone, Copy)]
pub struct Md5Fingerprinter {
    chunk_size: usize,
}

impl Md5Fingerprinter {
    pub fn new() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Uses a custom chunk size. A size of zero falls back to the default.
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        let chunk_size = if chunk_size == 0 {
            DEFAULT_CHUNK_SIZE
        } else {
            chunk_size
        };
        Self { chunk_size }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Hashes everything `reader` yields, one chunk at a time.
    pub fn fingerprint_reader<R: Read>(&self, mut reader: R) -> io::Result<ContentFingerprint> {
        let mut context = md5::Context::new();
        let mut buffer = vec![0u8; self.chunk_size];
        loop {
            let read = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            context.consume(&buffer[..read]);
        }
        Ok(ContentFingerprint(context.compute().0))
    }
}

impl Default for Md5Fingerprinter {
    fn default() -> Self {
        Self::new()
    }
}

impl Fingerprinter for Md5Fingerprinter {
    fn fingerprint(&self, path: &Path) -> Result<ContentFingerprint, ReadFailure> {
        let to_failure = |source| ReadFailure {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(to_failure)?;
        self.fingerprint_reader(file).map_err(to_failure)
    }
}
