mod entry;
mod store;
mod baseline;

pub use entry::{format_timestamp, CurrentHash, MonitoredFile, Registry, REMOVED, TIMESTAMP_FORMAT};
pub use store::{JsonStateStore, MemoryStateStore, StateStore};
pub use baseline::{accept_current, track_file};
