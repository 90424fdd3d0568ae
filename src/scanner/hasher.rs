//! Streaming file hasher.
//!
//! # Overview
//!
//! [`Hasher`] computes a 32-byte content digest of a file by reading it in
//! fixed-size chunks, so peak memory is bounded by the chunk size no matter
//! how large the file is. SHA-256 is the default algorithm; BLAKE3 can be
//! selected for speed. Digests depend only on file content.
//!
//! # Example
//!
//! ```no_run
//! use dupsweep::scanner::{hash_to_hex, Hasher};
//! use std::path::Path;
//!
//! let hasher = Hasher::new();
//! let digest = hasher.hash_file(Path::new("Cargo.toml")).unwrap();
//! println!("{}", hash_to_hex(&digest));
//! ```

use std::fmt::Write as _;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use sha2::Digest as _;

use super::HashError;

/// A content digest. Both supported algorithms produce 32 bytes.
pub type Digest = [u8; 32];

/// Default read chunk size in bytes.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Largest accepted read chunk size in bytes (64 MiB).
pub const MAX_CHUNK_SIZE: usize = 64 * 1024 * 1024;

/// Supported digest algorithms.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// SHA-256, the reference algorithm.
    #[default]
    Sha256,
    /// BLAKE3.
    Blake3,
}

impl std::fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sha256 => write!(f, "sha256"),
            Self::Blake3 => write!(f, "blake3"),
        }
    }
}

enum Accumulator {
    Sha256(sha2::Sha256),
    Blake3(Box<blake3::Hasher>),
}

impl Accumulator {
    fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Sha256 => Self::Sha256(sha2::Sha256::new()),
            HashAlgorithm::Blake3 => Self::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    fn update(&mut self, chunk: &[u8]) {
        match self {
            Self::Sha256(h) => h.update(chunk),
            Self::Blake3(h) => {
                h.update(chunk);
            }
        }
    }

    fn finalize(self) -> Digest {
        match self {
            Self::Sha256(h) => h.finalize().into(),
            Self::Blake3(h) => *h.finalize().as_bytes(),
        }
    }
}

/// Hasher settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HasherConfig {
    /// Digest algorithm.
    pub algorithm: HashAlgorithm,
    /// Bytes requested per read.
    pub chunk_size: usize,
    /// Give up on a file once hashing has taken this long.
    /// Checked between chunks, so a single blocked read is not interrupted.
    pub timeout: Option<Duration>,
}

impl Default for HasherConfig {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithm::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            timeout: None,
        }
    }
}

impl HasherConfig {
    /// Set the digest algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the chunk size (at least 1 byte).
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Set the per-file timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Chunked content hasher.
#[derive(Debug, Clone, Default)]
pub struct Hasher {
    config: HasherConfig,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Hasher {
    /// Create a SHA-256 hasher with the default chunk size.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a hasher with the given settings.
    #[must_use]
    pub fn with_config(config: HasherConfig) -> Self {
        Self {
            config: HasherConfig {
                chunk_size: config.chunk_size.max(1),
                ..config
            },
            shutdown_flag: None,
        }
    }

    /// Stop hashing between chunks once `flag` is set.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// The configured algorithm.
    #[must_use]
    pub fn algorithm(&self) -> HashAlgorithm {
        self.config.algorithm
    }

    /// The configured chunk size.
    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.config.chunk_size
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Compute the digest of a file's content.
    ///
    /// Symlinks are followed; a dangling link reports [`HashError::NotFound`].
    ///
    /// # Errors
    ///
    /// Returns a [`HashError`] when the file cannot be opened or read, when
    /// shutdown is requested, or when the per-file timeout elapses. Callers
    /// are expected to skip the file rather than abort.
    pub fn hash_file(&self, path: &Path) -> Result<Digest, HashError> {
        let file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        let digest = self.stream(file, path)?;
        log::trace!("Hashed {} ({})", path.display(), self.config.algorithm);
        Ok(digest)
    }

    /// Compute the digest of everything `reader` yields.
    ///
    /// Never requests more than [`Hasher::chunk_size`] bytes per read.
    ///
    /// # Errors
    ///
    /// Returns a [`HashError`] if a read fails or hashing is interrupted.
    pub fn hash_reader<R: Read>(&self, reader: R) -> Result<Digest, HashError> {
        self.stream(reader, Path::new("<reader>"))
    }

    fn stream<R: Read>(&self, mut reader: R, path: &Path) -> Result<Digest, HashError> {
        let mut accumulator = Accumulator::new(self.config.algorithm);
        let mut buffer = vec![0u8; self.config.chunk_size];
        let started = Instant::now();

        loop {
            if self.is_shutdown_requested() {
                return Err(HashError::Interrupted(path.to_path_buf()));
            }
            if let Some(limit) = self.config.timeout {
                let elapsed = started.elapsed();
                if elapsed >= limit {
                    return Err(HashError::TimedOut {
                        path: path.to_path_buf(),
                        seconds: elapsed.as_secs_f64(),
                    });
                }
            }

            let read = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(HashError::from_io(path, e)),
            };
            accumulator.update(&buffer[..read]);
        }

        Ok(accumulator.finalize())
    }
}

/// Render a digest as lowercase hexadecimal.
#[must_use]
pub fn hash_to_hex(hash: &Digest) -> String {
    let mut out = String::with_capacity(hash.len() * 2);
    for byte in hash {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// Parse a 64-character hexadecimal string into a digest.
#[must_use]
pub fn hex_to_hash(hex: &str) -> Option<Digest> {
    if hex.len() != 64 || !hex.is_ascii() {
        return None;
    }
    let mut hash = [0u8; 32];
    for (i, byte) in hash.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).ok()?;
    }
    Some(hash)
}
