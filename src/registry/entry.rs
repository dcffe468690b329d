use std::collections::HashSet;
use std::fmt;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use crate::hashing::is_sha256_hex;

/// Persisted marker for a file that could not be read on the last pass.
pub const REMOVED: &str = "REMOVED";

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Last observed state of a file's content.
///
/// Serialized as the bare digest string, or the literal `REMOVED`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CurrentHash {
    Digest(String),
    Removed,
}

impl CurrentHash {
    pub fn as_str(&self) -> &str {
        match self {
            CurrentHash::Digest(hex) => hex,
            CurrentHash::Removed => REMOVED,
        }
    }

    pub fn digest(&self) -> Option<&str> {
        match self {
            CurrentHash::Digest(hex) => Some(hex),
            CurrentHash::Removed => None,
        }
    }

    pub fn is_removed(&self) -> bool {
        matches!(self, CurrentHash::Removed)
    }
}

impl From<String> for CurrentHash {
    fn from(value: String) -> Self {
        if value == REMOVED {
            CurrentHash::Removed
        } else {
            CurrentHash::Digest(value)
        }
    }
}

impl fmt::Display for CurrentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for CurrentHash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CurrentHash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(CurrentHash::from)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoredFile {
    pub name: String,
    pub path: String,
    pub baseline_hash: String,
    pub current_hash: CurrentHash,
    pub last_modified: String,
}

impl MonitoredFile {
    pub fn new(
        name: impl Into<String>,
        path: impl Into<String>,
        baseline_hash: impl Into<String>,
        last_modified: impl Into<String>,
    ) -> Self {
        let baseline_hash = baseline_hash.into();
        Self {
            name: name.into(),
            path: path.into(),
            current_hash: CurrentHash::Digest(baseline_hash.clone()),
            baseline_hash,
            last_modified: last_modified.into(),
        }
    }

    pub fn matches_baseline(&self) -> bool {
        self.current_hash.digest() == Some(self.baseline_hash.as_str())
    }
}

/// Ordered set of tracked files, persisted as `{"files": [...]}`.
///
/// Top-level keys other than `files` are carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Registry {
    pub files: Vec<MonitoredFile>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Registry {
    pub fn new(files: Vec<MonitoredFile>) -> Self {
        Self {
            files,
            extra: serde_json::Map::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MonitoredFile> {
        self.files.iter()
    }

    pub fn get(&self, name: &str) -> Option<&MonitoredFile> {
        self.files.iter().find(|f| f.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut MonitoredFile> {
        self.files.iter_mut().find(|f| f.name == name)
    }

    pub fn contains_path(&self, path: &str) -> bool {
        self.files.iter().any(|f| f.path == path)
    }

    pub fn push(&mut self, file: MonitoredFile) {
        self.files.push(file);
    }

    /// Problems worth surfacing to the operator. Entries are never rejected.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        let mut seen_paths = HashSet::new();

        for (idx, file) in self.files.iter().enumerate() {
            let label = if file.name.is_empty() {
                format!("entry #{}", idx + 1)
            } else {
                format!("'{}'", file.name)
            };

            if file.name.is_empty() {
                issues.push(format!("{} has an empty name", label));
            }
            if !is_sha256_hex(&file.baseline_hash) {
                issues.push(format!("{} has a malformed baseline hash '{}'", label, file.baseline_hash));
            }
            if let CurrentHash::Digest(hex) = &file.current_hash {
                if !is_sha256_hex(hex) {
                    issues.push(format!("{} has a malformed current hash '{}'", label, hex));
                }
            }
            if !seen_paths.insert(file.path.as_str()) {
                issues.push(format!("{} duplicates path {}", label, file.path));
            }
        }

        issues
    }
}
