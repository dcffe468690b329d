use std::collections::HashMap;
use chrono::{DateTime, Utc};
use crate::lookup::LookupVerdict;
use crate::registry::CurrentHash;
use super::transition::Transition;

#[derive(Debug, Clone)]
pub struct FileCheck {
    pub name: String,
    pub path: String,
    pub transition: Transition,
    pub current_hash: CurrentHash,
    /// Warning lines emitted for this file.
    pub alerts: Vec<String>,
    pub lookups_issued: usize,
    pub verdict: Option<LookupVerdict>,
    pub lookup_failed: bool,
    pub persisted: bool,
}

#[derive(Debug)]
pub struct PassReport {
    pub started_at: DateTime<Utc>,
    pub checks: Vec<FileCheck>,
}

impl Default for PassReport {
    fn default() -> Self {
        Self::new()
    }
}

impl PassReport {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            checks: Vec::new(),
        }
    }

    pub fn add(&mut self, check: FileCheck) {
        self.checks.push(check);
    }

    pub fn get(&self, name: &str) -> Option<&FileCheck> {
        self.checks.iter().find(|c| c.name == name)
    }

    pub fn is_clean(&self) -> bool {
        self.checks.iter().all(|c| !c.transition.is_alert())
    }

    pub fn tampered(&self) -> Vec<&FileCheck> {
        self.by_transition(Transition::Tampered)
    }

    pub fn missing(&self) -> Vec<&FileCheck> {
        self.by_transition(Transition::Missing)
    }

    fn by_transition(&self, transition: Transition) -> Vec<&FileCheck> {
        self.checks.iter().filter(|c| c.transition == transition).collect()
    }

    pub fn summary(&self) -> HashMap<Transition, usize> {
        let mut counts: HashMap<Transition, usize> = HashMap::new();
        for c in &self.checks {
            *counts.entry(c.transition).or_default() += 1;
        }
        counts
    }

    pub fn lookups_issued(&self) -> usize {
        self.checks.iter().map(|c| c.lookups_issued).sum()
    }

    pub fn lookup_failures(&self) -> usize {
        self.checks.iter().filter(|c| c.lookup_failed).count()
    }

    pub fn save_failures(&self) -> usize {
        self.checks.iter().filter(|c| !c.persisted).count()
    }

    pub fn summary_line(&self) -> String {
        let counts = self.summary();
        let count = |t: Transition| counts.get(&t).copied().unwrap_or(0);
        format!(
            "{} files: {} unchanged, {} tampered, {} missing",
            self.checks.len(),
            count(Transition::Unchanged),
            count(Transition::Tampered),
            count(Transition::Missing)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(name: &str, transition: Transition, persisted: bool) -> FileCheck {
        FileCheck {
            name: name.to_string(),
            path: format!("./{}", name),
            transition,
            current_hash: CurrentHash::Removed,
            alerts: vec![],
            lookups_issued: usize::from(transition == Transition::Tampered),
            verdict: None,
            lookup_failed: false,
            persisted,
        }
    }

    #[test]
    fn test_summary_counts() {
        let mut report = PassReport::new();
        report.add(check("a", Transition::Unchanged, true));
        report.add(check("b", Transition::Tampered, true));
        report.add(check("c", Transition::Missing, false));
        report.add(check("d", Transition::Unchanged, true));

        let summary = report.summary();
        assert_eq!(summary.get(&Transition::Unchanged), Some(&2));
        assert_eq!(summary.get(&Transition::Tampered), Some(&1));
        assert_eq!(report.missing().len(), 1);
        assert_eq!(report.lookups_issued(), 1);
        assert_eq!(report.save_failures(), 1);
        assert!(!report.is_clean());
        assert_eq!(report.summary_line(), "4 files: 2 unchanged, 1 tampered, 1 missing");
    }

    #[test]
    fn test_empty_report_is_clean() {
        let report = PassReport::new();
        assert!(report.is_clean());
        assert_eq!(report.summary_line(), "0 files: 0 unchanged, 0 tampered, 0 missing");
    }
}
