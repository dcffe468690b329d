use std::path::Path;
use std::time::Duration;
use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use crate::config::MonitorConfig;
use crate::console;
use crate::error::Result;
use crate::hashing::HashProvider;
use crate::lookup::ThreatLookup;
use crate::registry::{Registry, StateStore};
use super::report::{FileCheck, PassReport};
use super::transition::{evaluate, Alert};

/// Owns the registry and drives the poll loop.
pub struct IntegrityMonitor {
    registry: Registry,
    store: Box<dyn StateStore>,
    hasher: Box<dyn HashProvider>,
    lookup: Box<dyn ThreatLookup>,
    poll_interval: Duration,
    lookup_timeout: Duration,
}

impl IntegrityMonitor {
    /// Load the registry from `store`. Load failures fall back to an empty
    /// registry unless `config.strict_load` is set.
    pub fn load(
        store: impl StateStore + 'static,
        hasher: impl HashProvider + 'static,
        lookup: impl ThreatLookup + 'static,
        config: &MonitorConfig,
    ) -> Result<Self> {
        config.validate()?;

        let registry = if config.strict_load {
            let registry = store.load()?;
            for issue in registry.validate() {
                warn!("Registry {}: {}", store.location(), issue);
            }
            registry
        } else {
            store.load_or_default()
        };

        info!("Loaded {} tracked files from {}", registry.len(), store.location());

        Ok(Self::with_registry(registry, store, hasher, lookup)
            .with_poll_interval(config.poll_interval)
            .with_lookup_timeout(config.lookup.timeout))
    }

    pub fn with_registry(
        registry: Registry,
        store: impl StateStore + 'static,
        hasher: impl HashProvider + 'static,
        lookup: impl ThreatLookup + 'static,
    ) -> Self {
        let defaults = MonitorConfig::default();
        Self {
            registry,
            store: Box::new(store),
            hasher: Box::new(hasher),
            lookup: Box::new(lookup),
            poll_interval: defaults.poll_interval,
            lookup_timeout: defaults.lookup.timeout,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn print_snapshot(&self) {
        print!("{}", console::snapshot_text(&self.registry));
    }

    /// Check every tracked file once, persisting after each one.
    pub async fn run_pass(&mut self) -> PassReport {
        let mut report = PassReport::new();
        for idx in 0..self.registry.len() {
            let check = self.check_file(idx).await;
            report.add(check);
        }
        report
    }

    async fn check_file(&mut self, idx: usize) -> FileCheck {
        let file = &self.registry.files[idx];
        let path = Path::new(&file.path);
        let probe = self.hasher.compute_digest(path);
        let hasher = &self.hasher;
        let evaluation = evaluate(file, &probe, || {
            hasher.last_modified(path).unwrap_or_else(|| {
                warn!("No modification time for {}, recording current time", file.path);
                Utc::now()
            })
        });

        let mut check = FileCheck {
            name: evaluation.file.name.clone(),
            path: evaluation.file.path.clone(),
            transition: evaluation.transition,
            current_hash: evaluation.file.current_hash.clone(),
            alerts: Vec::new(),
            lookups_issued: 0,
            verdict: None,
            lookup_failed: false,
            persisted: false,
        };

        if let Some(hash) = probe.digest() {
            println!("{}", console::current_hash_line(&check.name, hash));
        }

        let now = Utc::now();
        for alert in evaluation.alerts() {
            let line = alert.render(now);
            match alert {
                Alert::Tampered { .. } => println!("{}", line),
                Alert::Missing { .. } => eprintln!("{}", line),
            }
            check.alerts.push(line);
        }

        for hash in evaluation.lookups() {
            self.dispatch_lookup(hash, &mut check).await;
        }

        debug!(file = %check.name, transition = check.transition.as_str(), "checked");

        self.registry.files[idx] = evaluation.file;

        match self.store.save(&self.registry) {
            Ok(()) => check.persisted = true,
            Err(e) => error!("{} (after checking {})", e, check.name),
        }

        check
    }

    async fn dispatch_lookup(&self, hash: &str, check: &mut FileCheck) {
        if !self.lookup.is_enabled() {
            return;
        }

        let service = self.lookup.name();
        println!("{}", console::lookup_banner(service));
        check.lookups_issued += 1;

        match tokio::time::timeout(self.lookup_timeout, self.lookup.report(hash)).await {
            Ok(Ok(verdict)) => {
                println!("{}", console::verdict_line(service, &verdict));
                check.verdict = Some(verdict);
            }
            Ok(Err(e)) => {
                warn!("{} lookup for {} failed: {}", service, hash, e);
                check.lookup_failed = true;
            }
            Err(_) => {
                warn!("{} lookup for {} timed out after {:?}", service, hash, self.lookup_timeout);
                check.lookup_failed = true;
            }
        }
    }

    /// Run passes until `shutdown` reads `true` or its sender is dropped.
    /// The signal is honoured between passes, including during the sleep.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> u64 {
        let mut passes = 0u64;

        loop {
            if *shutdown.borrow() {
                break;
            }

            let report = self.run_pass().await;
            passes += 1;

            if report.is_clean() {
                debug!("Pass {}: {}", passes, report.summary_line());
            } else {
                info!("Pass {}: {}", passes, report.summary_line());
            }
            if report.save_failures() > 0 {
                warn!("Pass {}: {} state writes failed", passes, report.save_failures());
            }

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                _ = stop_requested(&mut shutdown) => break,
            }
        }

        info!("Monitor stopped after {} passes", passes);
        passes
    }
}

/// Resolves once `shutdown` flips to `true` or its sender goes away.
async fn stop_requested(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if shutdown.changed().await.is_err() || *shutdown.borrow_and_update() {
            return;
        }
    }
}
