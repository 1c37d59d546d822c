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

//! Chaingate Common - Shared functionality for Chaingate components
//!
//! This crate provides the pieces shared by the proxy library and its
//! binary: logging setup and the environment variable names Chaingate
//! recognizes.

/// Environment variable name constants for Chaingate configuration
pub mod env;
/// Logging setup and utilities for consistent logging across Chaingate components
pub mod logging;

pub use logging::*;
