// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use quarry_type::{Value, error::diagnostic::runtime::invalid_argument, hash, return_error};

/// Hashes travel as Int8 so they compare like any other integer column.
pub(super) fn hash(args: &[&Value]) -> crate::Result<Value> {
	let Some(value) = args.first() else {
		return_error!(invalid_argument("hash", "expects one argument"));
	};
	Ok(Value::Int8(hash::hash_value(value) as i64))
}

/// `rotate_xor_hash(h, bits, v)`; a NULL running hash counts as zero.
pub(super) fn rotate_xor_hash(args: &[&Value]) -> crate::Result<Value> {
	let [running, bits, value] = args else {
		return_error!(invalid_argument("rotate_xor_hash", "expects three arguments"));
	};
	let running = running.as_i64().unwrap_or(0) as u64;
	let Some(bits) = bits.as_i64().and_then(|b| u32::try_from(b).ok()) else {
		return_error!(invalid_argument("rotate_xor_hash", "rotation must be a non-negative integer"));
	};
	Ok(Value::Int8(hash::rotate_xor_hash(running, bits, value) as i64))
}
