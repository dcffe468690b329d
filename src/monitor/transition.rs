use chrono::{DateTime, Utc};
use crate::console;
use crate::hashing::DigestResult;
use crate::registry::{format_timestamp, CurrentHash, MonitoredFile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    Unchanged,
    Tampered,
    Missing,
}

impl Transition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transition::Unchanged => "unchanged",
            Transition::Tampered => "tampered",
            Transition::Missing => "missing",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Transition::Unchanged => "✓",
            Transition::Tampered => "⚠",
            Transition::Missing => "✗",
        }
    }

    pub fn is_alert(&self) -> bool {
        !matches!(self, Transition::Unchanged)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Alert {
    Tampered {
        name: String,
        baseline: String,
        current: String,
    },
    Missing {
        name: String,
        path: String,
    },
}

impl Alert {
    pub fn render(&self, at: DateTime<Utc>) -> String {
        match self {
            Alert::Tampered { baseline, current, .. } => console::tampered_line(at, baseline, current),
            Alert::Missing { name, path } => console::missing_line(at, name, path),
        }
    }
}

/// Side effect the loop driver must carry out for a classified file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Alert(Alert),
    /// Submit this digest to the threat lookup service.
    Lookup(String),
}

#[derive(Debug, Clone)]
pub struct Evaluation {
    pub file: MonitoredFile,
    pub transition: Transition,
    pub effects: Vec<Effect>,
}

impl Evaluation {
    pub fn lookups(&self) -> impl Iterator<Item = &str> {
        self.effects.iter().filter_map(|e| match e {
            Effect::Lookup(hash) => Some(hash.as_str()),
            Effect::Alert(_) => None,
        })
    }

    pub fn alerts(&self) -> impl Iterator<Item = &Alert> {
        self.effects.iter().filter_map(|e| match e {
            Effect::Alert(alert) => Some(alert),
            Effect::Lookup(_) => None,
        })
    }
}

/// Classify one probe result against the file's baseline.
///
/// The previous `current_hash` never takes part in the comparison, so a file
/// coming back from `REMOVED` is judged purely on its content. `modified_at`
/// is only consulted for tampered files.
pub fn evaluate<F>(file: &MonitoredFile, probe: &DigestResult, modified_at: F) -> Evaluation
where
    F: FnOnce() -> DateTime<Utc>,
{
    let mut updated = file.clone();

    match probe {
        DigestResult::Digest(hash) if *hash == file.baseline_hash => {
            updated.current_hash = CurrentHash::Digest(hash.clone());
            Evaluation {
                file: updated,
                transition: Transition::Unchanged,
                effects: Vec::new(),
            }
        }
        DigestResult::Digest(hash) => {
            updated.current_hash = CurrentHash::Digest(hash.clone());
            updated.last_modified = format_timestamp(modified_at());
            Evaluation {
                file: updated,
                transition: Transition::Tampered,
                effects: vec![
                    Effect::Alert(Alert::Tampered {
                        name: file.name.clone(),
                        baseline: file.baseline_hash.clone(),
                        current: hash.clone(),
                    }),
                    Effect::Lookup(hash.clone()),
                ],
            }
        }
        DigestResult::Unreadable => {
            updated.current_hash = CurrentHash::Removed;
            Evaluation {
                file: updated,
                transition: Transition::Missing,
                effects: vec![Effect::Alert(Alert::Missing {
                    name: file.name.clone(),
                    path: file.path.clone(),
                })],
            }
        }
    }
}
