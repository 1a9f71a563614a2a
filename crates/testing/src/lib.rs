// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Shared helpers for tests across the workspace: tracing setup, catalog
//! fixtures and builders for common logical plans.

pub mod fixture;
pub mod plan;

use tracing_subscriber::{EnvFilter, fmt};

/// Installs a fmt subscriber filtered by `RUST_LOG`, `warn` when unset.
/// Calling it again is a no-op.
pub fn init_tracing() {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
	let _ = fmt().with_env_filter(filter).with_test_writer().try_init();
}

/// Rows in a deterministic order, for results whose order is unspecified.
pub fn sorted(mut rows: Vec<Vec<quarry_type::Value>>) -> Vec<Vec<quarry_type::Value>> {
	rows.sort();
	rows
}
