pub mod error;
pub mod config;
pub mod hashing;
pub mod registry;
pub mod lookup;
pub mod console;
pub mod monitor;

pub use error::{HashWatchError, Result};
pub use config::{LookupConfig, MonitorConfig};
pub use hashing::{compute_digest, DigestResult, HashProvider, Sha256Provider, EMPTY_SHA256};
pub use registry::{
    accept_current, track_file, CurrentHash, JsonStateStore, MemoryStateStore, MonitoredFile,
    Registry, StateStore, REMOVED,
};
pub use lookup::{DisabledLookup, LookupVerdict, MalwareBazaarClient, ThreatLookup};
pub use monitor::{evaluate, Alert, Effect, Evaluation, FileCheck, IntegrityMonitor, PassReport, Transition};
