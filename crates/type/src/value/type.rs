// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// The logical type of a column, expression or statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Type {
	/// The type of a bare NULL; coerces to every other type
	Undefined,
	Boolean,
	Int4,
	Int8,
	Float8,
	Utf8,
	/// Position handle into a column or table
	RowId,
}

impl Type {
	pub fn is_numeric(&self) -> bool {
		matches!(self, Type::Int4 | Type::Int8 | Type::Float8)
	}

	pub fn is_integer(&self) -> bool {
		matches!(self, Type::Int4 | Type::Int8)
	}

	/// The narrowest type both sides convert to without loss, if any.
	pub fn common(left: Type, right: Type) -> Option<Type> {
		if left == right {
			return Some(left);
		}
		match (left, right) {
			(Type::Undefined, other) | (other, Type::Undefined) => Some(other),
			(Type::Int4, Type::Int8) | (Type::Int8, Type::Int4) => Some(Type::Int8),
			(l, r) if l.is_numeric() && r.is_numeric() => Some(Type::Float8),
			_ => None,
		}
	}

	/// Whether a cast from `from` to `to` is allowed at all. Value-level
	/// failures (e.g. malformed text) are detected when the cast runs.
	pub fn castable(from: Type, to: Type) -> bool {
		if from == to || from == Type::Undefined {
			return true;
		}
		match (from, to) {
			(Type::RowId, Type::Int8) | (Type::Int8, Type::RowId) => true,
			(Type::RowId, _) | (_, Type::RowId) => false,
			(_, Type::Utf8) => true,
			(Type::Utf8, _) => true,
			(Type::Boolean, t) | (t, Type::Boolean) => t.is_integer(),
			(l, r) => l.is_numeric() && r.is_numeric(),
		}
	}
}

impl Display for Type {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Type::Undefined => f.write_str("UNDEFINED"),
			Type::Boolean => f.write_str("BOOL"),
			Type::Int4 => f.write_str("INT4"),
			Type::Int8 => f.write_str("INT8"),
			Type::Float8 => f.write_str("FLOAT8"),
			Type::Utf8 => f.write_str("UTF8"),
			Type::RowId => f.write_str("ROWID"),
		}
	}
}
