use std::path::Path;
use chrono::Utc;
use crate::error::{HashWatchError, Result};
use crate::hashing::{DigestResult, HashProvider};
use super::entry::{format_timestamp, CurrentHash, MonitoredFile, Registry};

/// Start tracking `path`, recording its present content as the baseline.
pub fn track_file(
    registry: &mut Registry,
    hasher: &dyn HashProvider,
    path: &str,
    name: Option<&str>,
) -> Result<MonitoredFile> {
    if registry.contains_path(path) {
        return Err(HashWatchError::Registry(format!("{} is already tracked", path)));
    }

    let name = match name {
        Some(n) if !n.trim().is_empty() => n.to_string(),
        Some(_) => return Err(HashWatchError::Registry("name must not be empty".into())),
        None => Path::new(path)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| HashWatchError::Registry(format!("cannot derive a name from {}", path)))?,
    };

    if registry.get(&name).is_some() {
        return Err(HashWatchError::Registry(format!("name '{}' is already in use", name)));
    }

    let digest = match hasher.compute_digest(Path::new(path)) {
        DigestResult::Digest(hex) => hex,
        DigestResult::Unreadable => return Err(HashWatchError::FileUnreadable(path.to_string())),
    };

    let modified = hasher.last_modified(Path::new(path)).unwrap_or_else(Utc::now);
    let file = MonitoredFile::new(name, path, digest, format_timestamp(modified));
    registry.push(file.clone());
    Ok(file)
}

/// Replace the baseline of `name` with its present on-disk digest.
/// Returns the previous baseline.
pub fn accept_current(registry: &mut Registry, hasher: &dyn HashProvider, name: &str) -> Result<String> {
    let file = registry
        .get_mut(name)
        .ok_or_else(|| HashWatchError::Registry(format!("'{}' is not tracked", name)))?;

    let digest = match hasher.compute_digest(Path::new(&file.path)) {
        DigestResult::Digest(hex) => hex,
        DigestResult::Unreadable => return Err(HashWatchError::FileUnreadable(file.path.clone())),
    };

    let previous = std::mem::replace(&mut file.baseline_hash, digest.clone());
    file.current_hash = CurrentHash::Digest(digest);
    Ok(previous)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::{sha256_hex, Sha256Provider, EMPTY_SHA256};
    use tempfile::TempDir;

    #[test]
    fn test_track_file_records_baseline() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hosts");
        std::fs::write(&path, "127.0.0.1 localhost\n").unwrap();
        let path = path.to_string_lossy().to_string();

        let mut registry = Registry::default();
        let file = track_file(&mut registry, &Sha256Provider, &path, None).unwrap();

        assert_eq!(file.name, "hosts");
        assert_eq!(file.baseline_hash, sha256_hex(b"127.0.0.1 localhost\n"));
        assert!(file.matches_baseline());
        assert_eq!(file.last_modified.len(), "2024-01-01T00:00:00Z".len());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_track_rejects_duplicates_and_unreadable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "").unwrap();
        let path = path.to_string_lossy().to_string();

        let mut registry = Registry::default();
        let file = track_file(&mut registry, &Sha256Provider, &path, Some("a")).unwrap();
        assert_eq!(file.baseline_hash, EMPTY_SHA256);

        assert!(matches!(
            track_file(&mut registry, &Sha256Provider, &path, Some("b")),
            Err(HashWatchError::Registry(_))
        ));

        let missing = dir.path().join("missing.txt").to_string_lossy().to_string();
        assert!(matches!(
            track_file(&mut registry, &Sha256Provider, &missing, None),
            Err(HashWatchError::FileUnreadable(_))
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_accept_current_rebaselines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "v1").unwrap();
        let path_str = path.to_string_lossy().to_string();

        let mut registry = Registry::default();
        track_file(&mut registry, &Sha256Provider, &path_str, Some("a")).unwrap();

        std::fs::write(&path, "v2").unwrap();
        let previous = accept_current(&mut registry, &Sha256Provider, "a").unwrap();

        assert_eq!(previous, sha256_hex(b"v1"));
        let file = registry.get("a").unwrap();
        assert_eq!(file.baseline_hash, sha256_hex(b"v2"));
        assert!(file.matches_baseline());
    }

    #[test]
    fn test_accept_unknown_name() {
        let mut registry = Registry::default();
        assert!(accept_current(&mut registry, &Sha256Provider, "nope").is_err());
    }
}
