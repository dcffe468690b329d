use std::time::Duration;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use crate::config::LookupConfig;
use crate::error::{HashWatchError, Result};
use super::{LookupVerdict, ThreatLookup};

pub const MALWARE_BAZAAR_URL: &str = "https://mb-api.abuse.ch/api/v1/";

#[derive(Debug, Deserialize)]
struct BazaarResponse {
    query_status: String,
    #[serde(default)]
    data: Option<Vec<BazaarSample>>,
}

#[derive(Debug, Deserialize)]
struct BazaarSample {
    signature: Option<String>,
    file_type: Option<String>,
    first_seen: Option<String>,
}

impl BazaarResponse {
    fn into_verdict(self) -> LookupVerdict {
        match self.query_status.as_str() {
            "ok" => {
                let sample = self.data.and_then(|d| d.into_iter().next());
                match sample {
                    Some(s) => LookupVerdict::Known {
                        signature: s.signature,
                        file_type: s.file_type,
                        first_seen: s.first_seen,
                    },
                    None => LookupVerdict::Known {
                        signature: None,
                        file_type: None,
                        first_seen: None,
                    },
                }
            }
            "hash_not_found" | "no_results" => LookupVerdict::NotFound,
            other => LookupVerdict::Unavailable(other.to_string()),
        }
    }
}

/// MalwareBazaar `get_info` client.
pub struct MalwareBazaarClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl MalwareBazaarClient {
    pub fn new(config: &LookupConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| HashWatchError::Lookup(format!("client init: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ThreatLookup for MalwareBazaarClient {
    fn name(&self) -> &'static str {
        "MalwareBazaar"
    }

    async fn report(&self, hash: &str) -> Result<LookupVerdict> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .form(&[("query", "get_info"), ("hash", hash)]);

        if let Some(ref key) = self.api_key {
            request = request.header("Auth-Key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| HashWatchError::Lookup(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HashWatchError::Lookup(format!("HTTP {}", status)));
        }

        let body: BazaarResponse = response
            .json()
            .await
            .map_err(|e| HashWatchError::Lookup(format!("invalid response: {}", e)))?;

        debug!("MalwareBazaar query_status={} for {}", body.query_status, hash);
        Ok(body.into_verdict())
    }
}
