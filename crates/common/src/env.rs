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

//! Environment variable name constants for Chaingate configuration.
//!
//! Single source of truth for the environment variables Chaingate
//! recognizes. The corresponding CLI arguments always take precedence
//! over these variables.

/// Environment variable overriding the JSON-RPC endpoint list.
///
/// Comma-separated list of endpoint URLs, tried in order during domain
/// resolution. When unset, the built-in BNB Smart Chain defaults are
/// used.
///
/// # Examples
///
/// ```bash
/// CHAINGATE_RPC_URLS=https://bsc.drpc.org,https://rpc.ankr.com/bsc chaingate-proxy
/// ```
///
/// # Related
///
/// Also available as the `--rpc-urls` CLI argument, which takes
/// precedence over this variable.
pub const CHAINGATE_RPC_URLS: &str = "CHAINGATE_RPC_URLS";

/// Environment variable overriding the domain registry contract address.
///
/// Must be a 20-byte hex address (`0x`-prefixed). The proxy queries this
/// contract for the upstream domain.
///
/// # Examples
///
/// ```bash
/// CHAINGATE_CONTRACT_ADDRESS=0xe9d5f645f79fa60fca82b4e1d35832e43370feb0 chaingate-proxy
/// ```
///
/// # Related
///
/// Also available as the `--contract-address` CLI argument, which takes
/// precedence over this variable.
pub const CHAINGATE_CONTRACT_ADDRESS: &str = "CHAINGATE_CONTRACT_ADDRESS";
