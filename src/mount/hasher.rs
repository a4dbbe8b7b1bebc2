//! Content hashing for mounted files using MD5
//!
//! Clients identify file versions by the lowercase hex MD5 of the file bytes,
//! so the digest here must match what the client computes byte for byte.

use md5::{Digest, Md5};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::time::SystemTime;

/// Hex-encoded content hash as exchanged with clients.
pub type Hash = String;

/// Read size used when streaming file contents into the hasher.
pub const CHUNK_SIZE: usize = 4096;

/// Filesystem access used by the hash cache.
///
/// `LocalFs` is the production implementation; tests substitute instrumented
/// sources to observe how often file contents are read.
pub trait ContentSource: Send + Sync {
    /// Modification time of the regular file at `path`.
    ///
    /// Returns an `io::ErrorKind::NotFound` error when the path is missing or
    /// is not a regular file.
    fn modified(&self, path: &Path) -> io::Result<SystemTime>;

    /// Open the file at `path` for reading.
    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + Send>>;
}

/// Reads straight from the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFs;

impl ContentSource for LocalFs {
    fn modified(&self, path: &Path) -> io::Result<SystemTime> {
        let metadata = std::fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("not a regular file: {}", path.display()),
            ));
        }
        metadata.modified()
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + Send>> {
        Ok(Box::new(File::open(path)?))
    }
}

/// Hash everything readable from `reader` in `CHUNK_SIZE` pieces.
pub fn hash_reader<R: Read + ?Sized>(reader: &mut R) -> io::Result<Hash> {
    let mut hasher = Md5::new();
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Compute the content hash of in-memory bytes.
pub fn compute_content_hash(content: &[u8]) -> Hash {
    hex::encode(Md5::digest(content))
}
