// Chaingate - Contract-directed reverse proxy
// Copyright (C) 2025 Chaingate Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Single-slot TTL cache for the resolved upstream domain
//!
//! The resolver consults this before touching the network: one value,
//! one timestamp, in memory only. The lock is never held across an
//! await, so concurrent cache misses may each resolve and store; the
//! last writer wins and no invariant depends on exactly-once refresh.

use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Default time a resolved domain stays valid.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);

/// A resolved domain and the moment it was stored.
///
/// The value is never empty; the resolver only stores usable domains.
#[derive(Debug, Clone)]
struct CachedDomain {
    value: String,
    resolved_at: Instant,
}

/// Single-value cache with a fixed time-to-live.
#[derive(Debug)]
pub struct DomainCache {
    slot: RwLock<Option<CachedDomain>>,
    ttl: Duration,
}

impl DomainCache {
    /// Creates an empty cache whose entries stay valid for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self { slot: RwLock::new(None), ttl }
    }

    /// Returns the cached domain if one is present and still fresh.
    pub async fn get(&self) -> Option<String> {
        let slot = self.slot.read().await;
        slot.as_ref()
            .filter(|entry| entry.resolved_at.elapsed() < self.ttl)
            .map(|entry| entry.value.clone())
    }

    /// Stores a freshly resolved domain, replacing any previous entry.
    pub async fn store(&self, value: String) {
        let mut slot = self.slot.write().await;
        *slot = Some(CachedDomain { value, resolved_at: Instant::now() });
    }
}
