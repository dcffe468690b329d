mod bazaar;

use async_trait::async_trait;
use crate::error::Result;

pub use bazaar::{MalwareBazaarClient, MALWARE_BAZAAR_URL};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupVerdict {
    /// The hash is a known sample.
    Known {
        signature: Option<String>,
        file_type: Option<String>,
        first_seen: Option<String>,
    },
    NotFound,
    /// The service answered without a usable result (e.g. rate limited, bad key).
    Unavailable(String),
    /// No service configured.
    Skipped,
}

impl LookupVerdict {
    pub fn describe(&self) -> String {
        match self {
            LookupVerdict::Known { signature, file_type, first_seen } => {
                let mut parts = vec![format!(
                    "known sample ({})",
                    signature.as_deref().unwrap_or("unnamed")
                )];
                if let Some(ft) = file_type {
                    parts.push(format!("type {}", ft));
                }
                if let Some(seen) = first_seen {
                    parts.push(format!("first seen {}", seen));
                }
                parts.join(", ")
            }
            LookupVerdict::NotFound => "hash not found".to_string(),
            LookupVerdict::Unavailable(status) => format!("no result ({})", status),
            LookupVerdict::Skipped => "lookup disabled".to_string(),
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, LookupVerdict::Known { .. })
    }
}

/// Reputation service queried with a bare digest.
#[async_trait]
pub trait ThreatLookup: Send + Sync {
    fn name(&self) -> &'static str;

    fn is_enabled(&self) -> bool {
        true
    }

    async fn report(&self, hash: &str) -> Result<LookupVerdict>;
}

#[async_trait]
impl<T: ThreatLookup + ?Sized> ThreatLookup for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn is_enabled(&self) -> bool {
        (**self).is_enabled()
    }

    async fn report(&self, hash: &str) -> Result<LookupVerdict> {
        (**self).report(hash).await
    }
}

pub struct DisabledLookup;

#[async_trait]
impl ThreatLookup for DisabledLookup {
    fn name(&self) -> &'static str {
        "disabled"
    }

    fn is_enabled(&self) -> bool {
        false
    }

    async fn report(&self, _hash: &str) -> Result<LookupVerdict> {
        Ok(LookupVerdict::Skipped)
    }
}
