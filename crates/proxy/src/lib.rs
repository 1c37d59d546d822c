// Copyright (C) 2025 Chaingate Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Chaingate Proxy Library
//!
//! A dynamic reverse proxy whose upstream origin is not configured
//! statically but published on-chain: a BNB Smart Chain registry
//! contract exposes the current domain, the proxy reads it via JSON-RPC
//! `eth_call` with ordered endpoint fallback, caches it briefly, and
//! relays client requests with normalized headers and permissive CORS.

pub mod abi;
pub mod cache;
pub mod error;
pub mod forward;
pub mod proxy;
pub mod resolver;
pub mod response;

pub use error::ProxyError;
pub use proxy::{ProxyServer, ProxyServerBuilder, PING_SENTINEL, PROXY_PATH};
pub use resolver::{DEFAULT_CONTRACT_ADDRESS, DEFAULT_RPC_URLS};
