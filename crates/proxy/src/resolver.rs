//! Domain resolution over a prioritized RPC endpoint list
//!
//! The upstream domain lives in a registry contract on BNB Smart Chain.
//! Resolution issues the registry's fixed `eth_call` against each
//! configured JSON-RPC endpoint in order, takes the first non-empty
//! decoded domain, and caches it for the configured TTL. Per-endpoint
//! failures are logged and skipped; only a full sweep without a usable
//! result is an error.

use std::time::Duration;

use alloy_primitives::Address;
use eyre::{bail, eyre, Result};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::{abi, cache::DomainCache, error::ProxyError};

/// Default BNB Smart Chain JSON-RPC endpoints (free public endpoints),
/// tried in order during resolution.
pub const DEFAULT_RPC_URLS: &[&str] = &[
    "https://binance.llamarpc.com",
    "https://bsc.drpc.org",
    "https://rpc.ankr.com/bsc",
    "https://bsc-dataseed2.bnbchain.org",
];

/// Default domain registry contract queried for the upstream domain.
pub const DEFAULT_CONTRACT_ADDRESS: &str = "0xe9d5f645f79fa60fca82b4e1d35832e43370feb0";

/// Selector of the registry's zero-argument domain getter.
const DOMAIN_CALL_DATA: &str = "0x20965255";

/// Resolves the upstream domain through the registry contract, with
/// endpoint fallback and TTL caching.
#[derive(Debug)]
pub struct DomainResolver {
    client: reqwest::Client,
    rpc_urls: Vec<String>,
    contract_address: Address,
    cache: DomainCache,
}

impl DomainResolver {
    /// Creates a resolver over `rpc_urls`, tried in the given order.
    /// Each attempt is bounded by `rpc_timeout`.
    pub fn new(
        rpc_urls: Vec<String>,
        contract_address: Address,
        cache_ttl: Duration,
        rpc_timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(rpc_timeout).build()?;
        Ok(Self { client, rpc_urls, contract_address, cache: DomainCache::new(cache_ttl) })
    }

    /// The configured RPC endpoints, in fallback order.
    pub fn rpc_urls(&self) -> &[String] {
        &self.rpc_urls
    }

    /// Returns the upstream domain, from cache when fresh.
    ///
    /// On a cache miss every endpoint is tried at most once, in order;
    /// the first usable result wins and refreshes the cache. A failed
    /// sweep leaves the cache untouched.
    pub async fn resolve(&self) -> Result<String, ProxyError> {
        if let Some(domain) = self.cache.get().await {
            debug!(domain = %domain, "domain cache hit");
            return Ok(domain);
        }

        let payload = self.call_payload();
        for url in &self.rpc_urls {
            match self.try_endpoint(url, &payload).await {
                Ok(domain) => {
                    info!(endpoint = %url, domain = %domain, "resolved upstream domain");
                    self.cache.store(domain.clone()).await;
                    return Ok(domain);
                }
                Err(err) => {
                    warn!(endpoint = %url, error = %err, "domain resolution attempt failed");
                }
            }
        }

        Err(ProxyError::DomainUnavailable)
    }

    /// The fixed `eth_call` request for the registry's domain getter.
    fn call_payload(&self) -> Value {
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_call",
            "params": [
                { "to": self.contract_address, "data": DOMAIN_CALL_DATA },
                "latest",
            ],
        })
    }

    /// One resolution attempt against one endpoint.
    async fn try_endpoint(&self, url: &str, payload: &Value) -> Result<String> {
        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .json(payload)
            .send()
            .await?;

        if !response.status().is_success() {
            bail!("endpoint returned status {}", response.status());
        }

        let body: Value = response.json().await?;
        let result = body
            .get("result")
            .and_then(Value::as_str)
            .ok_or_else(|| eyre!("response carries no result field"))?;

        // Trailing slashes are stripped before the emptiness check, so a
        // slash-only result counts as unusable and never reaches the cache.
        let decoded = abi::decode_string_return(result);
        let domain = decoded.trim_end_matches('/');
        if domain.is_empty() {
            bail!("result decoded to an empty domain");
        }

        Ok(domain.to_string())
    }
}
