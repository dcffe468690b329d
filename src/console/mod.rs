use chrono::{DateTime, Utc};
use colored::Colorize;
use crate::lookup::LookupVerdict;
use crate::registry::{format_timestamp, MonitoredFile, Registry};

/// Recorded fields of every entry, in registry order.
pub fn snapshot_text(registry: &Registry) -> String {
    let mut output = String::new();
    for file in registry.iter() {
        output.push_str(&entry_block(file));
        output.push('\n');
    }
    output
}

pub fn entry_block(file: &MonitoredFile) -> String {
    format!(
        "File: {}\nPath: {}\nBaseline Hash: {}\nCurrent Hash: {}\nLast Modified: {}\n",
        file.name, file.path, file.baseline_hash, file.current_hash, file.last_modified
    )
}

pub fn current_hash_line(name: &str, hash: &str) -> String {
    format!("Current Hash of {} is: {}", name, hash)
}

fn warning_prefix(at: DateTime<Utc>) -> String {
    format!("[{}] {}", format_timestamp(at), "[WARNING]".red())
}

pub fn tampered_line(at: DateTime<Utc>, baseline: &str, current: &str) -> String {
    format!(
        "{} Potential Tampering - Hash change from: {} -> {}",
        warning_prefix(at),
        baseline,
        current
    )
}

pub fn missing_line(at: DateTime<Utc>, name: &str, path: &str) -> String {
    format!(
        "{} Deletion/Movement - Could not locate file: {} at {}",
        warning_prefix(at),
        name,
        path
    )
}

pub fn lookup_banner(service: &str) -> String {
    format!("Sending hash to {}...", service).yellow().to_string()
}

pub fn verdict_line(service: &str, verdict: &LookupVerdict) -> String {
    let text = format!("{}: {}", service, verdict.describe());
    if verdict.is_known() {
        text.red().bold().to_string()
    } else {
        text
    }
}
