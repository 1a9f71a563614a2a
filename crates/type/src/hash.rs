// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Value hashing for hash joins and persisted hash indexes.
//!
//! Uses xxHash3 over a canonical byte encoding, so values that compare
//! equal across integer widths hash alike.

use xxhash_rust::xxh3;

use crate::value::Value;

const TAG_UNDEFINED: u8 = 0;
const TAG_BOOLEAN: u8 = 1;
const TAG_INTEGER: u8 = 2;
const TAG_FLOAT: u8 = 3;
const TAG_UTF8: u8 = 4;
const TAG_ROW_ID: u8 = 5;

/// Compute xxHash3 64-bit hash of data.
#[inline]
pub fn xxh3_64(data: &[u8]) -> u64 {
	xxh3::xxh3_64(data)
}

pub fn hash_value(value: &Value) -> u64 {
	let mut buf = Vec::with_capacity(16);
	match value {
		Value::Undefined => buf.push(TAG_UNDEFINED),
		Value::Boolean(b) => {
			buf.push(TAG_BOOLEAN);
			buf.push(*b as u8);
		}
		Value::Int4(v) => {
			buf.push(TAG_INTEGER);
			buf.extend_from_slice(&(*v as i64).to_le_bytes());
		}
		Value::Int8(v) => {
			buf.push(TAG_INTEGER);
			buf.extend_from_slice(&v.to_le_bytes());
		}
		Value::Float8(v) => {
			let f = v.value();
			if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
				buf.push(TAG_INTEGER);
				buf.extend_from_slice(&(f as i64).to_le_bytes());
			} else {
				buf.push(TAG_FLOAT);
				buf.extend_from_slice(&f.to_bits().to_le_bytes());
			}
		}
		Value::Utf8(s) => {
			buf.push(TAG_UTF8);
			buf.extend_from_slice(s.as_bytes());
		}
		Value::RowId(v) => {
			buf.push(TAG_ROW_ID);
			buf.extend_from_slice(&v.to_le_bytes());
		}
	}
	xxh3_64(&buf)
}

/// Mixes `value` into a running combined hash: rotate left by `bits`, then
/// xor with the value's own hash.
#[inline]
pub fn rotate_xor_hash(running: u64, bits: u32, value: &Value) -> u64 {
	running.rotate_left(bits) ^ hash_value(value)
}

/// Rotation width used when combining `columns` key columns into one hash.
#[inline]
pub fn combine_bits(columns: usize) -> u32 {
	1 + 63 / (columns as u32 + 1)
}

/// Combined hash of a whole key, in key-column order.
pub fn combined_hash(values: &[Value]) -> u64 {
	let bits = combine_bits(values.len());
	let mut iter = values.iter();
	let Some(first) = iter.next() else {
		return 0;
	};
	iter.fold(hash_value(first), |h, v| rotate_xor_hash(h, bits, v))
}
