use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use tracing::debug;

/// SHA-256 of zero-length input.
pub const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

pub const READ_CHUNK_SIZE: usize = 8192;

/// Outcome of probing a tracked path.
///
/// Missing files, permission errors and read failures all collapse into
/// `Unreadable`; callers only ever need to know the content could not be hashed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DigestResult {
    Digest(String),
    Unreadable,
}

impl DigestResult {
    pub fn digest(&self) -> Option<&str> {
        match self {
            DigestResult::Digest(hex) => Some(hex),
            DigestResult::Unreadable => None,
        }
    }

    pub fn is_unreadable(&self) -> bool {
        matches!(self, DigestResult::Unreadable)
    }
}

pub trait HashProvider: Send + Sync {
    fn compute_digest(&self, path: &Path) -> DigestResult;

    /// Last write time of `path`, if the filesystem reports one.
    fn last_modified(&self, path: &Path) -> Option<DateTime<Utc>>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Provider;

impl HashProvider for Sha256Provider {
    fn compute_digest(&self, path: &Path) -> DigestResult {
        compute_digest(path)
    }

    fn last_modified(&self, path: &Path) -> Option<DateTime<Utc>> {
        std::fs::metadata(path)
            .and_then(|meta| meta.modified())
            .map(DateTime::<Utc>::from)
            .map_err(|e| debug!("No modification time for {}: {}", path.display(), e))
            .ok()
    }
}

pub fn compute_digest(path: &Path) -> DigestResult {
    match hash_file(path) {
        Ok(hex) => DigestResult::Digest(hex),
        Err(e) => {
            debug!("Cannot hash {}: {}", path.display(), e);
            DigestResult::Unreadable
        }
    }
}

fn hash_file(path: &Path) -> io::Result<String> {
    hash_reader(File::open(path)?)
}

fn hash_reader(mut reader: impl Read) -> io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buf = [0u8; READ_CHUNK_SIZE];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

pub fn sha256_hex(content: &[u8]) -> String {
    format!("{:x}", Sha256::digest(content))
}

/// True for a 64-character lowercase hex string.
pub fn is_sha256_hex(value: &str) -> bool {
    value.len() == 64 && value.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_empty_constant_matches_sha256() {
        assert_eq!(sha256_hex(b""), EMPTY_SHA256);
        assert_eq!(EMPTY_SHA256.len(), 64);
    }

    #[test]
    fn test_digest_known_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hello.txt");
        std::fs::write(&path, "hello world").unwrap();

        assert_eq!(
            compute_digest(&path),
            DigestResult::Digest(
                "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9".to_string()
            )
        );
    }

    #[test]
    fn test_empty_file_uses_empty_digest() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.txt");
        std::fs::write(&path, "").unwrap();

        assert_eq!(compute_digest(&path), DigestResult::Digest(EMPTY_SHA256.to_string()));
    }

    #[test]
    fn test_large_file_spanning_chunks() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("big.bin");
        let content: Vec<u8> = (0..(READ_CHUNK_SIZE * 3 + 17)).map(|i| (i % 251) as u8).collect();
        let mut file = File::create(&path).unwrap();
        file.write_all(&content).unwrap();
        drop(file);

        assert_eq!(compute_digest(&path), DigestResult::Digest(sha256_hex(&content)));
    }

    /// Yields `EINTR` before every chunk of its content.
    struct InterruptingReader {
        content: Vec<u8>,
        pos: usize,
        interrupt_next: bool,
    }

    impl Read for InterruptingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.interrupt_next {
                self.interrupt_next = false;
                return Err(io::Error::from(io::ErrorKind::Interrupted));
            }
            self.interrupt_next = true;
            let n = buf.len().min(self.content.len() - self.pos).min(5);
            buf[..n].copy_from_slice(&self.content[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    #[test]
    fn test_interrupted_reads_are_retried() {
        let reader = InterruptingReader {
            content: b"hello world".to_vec(),
            pos: 0,
            interrupt_next: true,
        };
        assert_eq!(hash_reader(reader).unwrap(), sha256_hex(b"hello world"));
    }

    #[test]
    fn test_missing_file_is_unreadable() {
        let dir = TempDir::new().unwrap();
        let result = compute_digest(&dir.path().join("nope.txt"));
        assert!(result.is_unreadable());
        assert_eq!(result.digest(), None);
    }

    #[test]
    fn test_directory_is_unreadable() {
        let dir = TempDir::new().unwrap();
        assert!(compute_digest(dir.path()).is_unreadable());
    }

    #[test]
    fn test_is_sha256_hex() {
        assert!(is_sha256_hex(EMPTY_SHA256));
        assert!(!is_sha256_hex(&EMPTY_SHA256.to_uppercase()));
        assert!(!is_sha256_hex("abc"));
        assert!(!is_sha256_hex("REMOVED"));
    }

    #[test]
    fn test_provider_reports_mtime() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "a").unwrap();

        let provider = Sha256Provider;
        assert!(provider.last_modified(&path).is_some());
        assert!(provider.last_modified(&dir.path().join("missing")).is_none());
    }
}
