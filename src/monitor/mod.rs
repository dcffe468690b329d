mod transition;
mod report;
mod runner;

pub use transition::{evaluate, Alert, Effect, Evaluation, Transition};
pub use report::{FileCheck, PassReport};
pub use runner::IntegrityMonitor;
