// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	cmp::Ordering,
	fmt::{Display, Formatter},
};

use serde::{Deserialize, Serialize};

mod ordered_f64;
mod r#type;

pub use ordered_f64::{NotANumber, OrderedF64};
pub use r#type::Type;

use crate::{error::diagnostic::runtime::invalid_cast, return_error};

/// A single SQL value, represented as a native Rust type.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Value {
	/// Value is not defined (SQL NULL)
	Undefined,
	/// A boolean: true or false.
	Boolean(bool),
	/// A 4-byte signed integer
	Int4(i32),
	/// An 8-byte signed integer
	Int8(i64),
	/// An 8-byte floating point
	Float8(OrderedF64),
	/// A UTF-8 encoded text
	Utf8(String),
	/// A position handle into a column or table
	RowId(u64),
}

impl Value {
	pub fn undefined() -> Self {
		Value::Undefined
	}

	pub fn bool(v: impl Into<bool>) -> Self {
		Value::Boolean(v.into())
	}

	pub fn int4(v: impl Into<i32>) -> Self {
		Value::Int4(v.into())
	}

	pub fn int8(v: impl Into<i64>) -> Self {
		Value::Int8(v.into())
	}

	pub fn float8(v: impl Into<f64>) -> Self {
		OrderedF64::try_from(v.into()).map(Value::Float8).unwrap_or(Value::Undefined)
	}

	pub fn utf8(v: impl Into<String>) -> Self {
		Value::Utf8(v.into())
	}

	pub fn row_id(v: u64) -> Self {
		Value::RowId(v)
	}

	pub fn get_type(&self) -> Type {
		match self {
			Value::Undefined => Type::Undefined,
			Value::Boolean(_) => Type::Boolean,
			Value::Int4(_) => Type::Int4,
			Value::Int8(_) => Type::Int8,
			Value::Float8(_) => Type::Float8,
			Value::Utf8(_) => Type::Utf8,
			Value::RowId(_) => Type::RowId,
		}
	}

	pub fn is_undefined(&self) -> bool {
		matches!(self, Value::Undefined)
	}

	pub fn as_bool(&self) -> Option<bool> {
		match self {
			Value::Boolean(b) => Some(*b),
			_ => None,
		}
	}

	pub fn as_i64(&self) -> Option<i64> {
		match self {
			Value::Int4(v) => Some(*v as i64),
			Value::Int8(v) => Some(*v),
			Value::RowId(v) => i64::try_from(*v).ok(),
			Value::Float8(v) if v.value().fract() == 0.0 => Some(v.value() as i64),
			_ => None,
		}
	}

	pub fn as_f64(&self) -> Option<f64> {
		match self {
			Value::Int4(v) => Some(*v as f64),
			Value::Int8(v) => Some(*v as f64),
			Value::Float8(v) => Some(v.value()),
			_ => None,
		}
	}

	pub fn as_row_id(&self) -> Option<u64> {
		match self {
			Value::RowId(v) => Some(*v),
			Value::Int4(v) => u64::try_from(*v).ok(),
			Value::Int8(v) => u64::try_from(*v).ok(),
			_ => None,
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			Value::Utf8(s) => Some(s.as_str()),
			_ => None,
		}
	}

	/// Three-valued comparison: `None` when either side is undefined or
	/// the types are not comparable.
	pub fn sql_cmp(&self, other: &Value) -> Option<Ordering> {
		match (self, other) {
			(Value::Undefined, _) | (_, Value::Undefined) => None,
			(Value::Boolean(l), Value::Boolean(r)) => Some(l.cmp(r)),
			(Value::Utf8(l), Value::Utf8(r)) => Some(l.cmp(r)),
			(Value::RowId(l), Value::RowId(r)) => Some(l.cmp(r)),
			(Value::Int4(l), Value::Int4(r)) => Some(l.cmp(r)),
			(Value::Int8(l), Value::Int8(r)) => Some(l.cmp(r)),
			(Value::Int4(l), Value::Int8(r)) => Some((*l as i64).cmp(r)),
			(Value::Int8(l), Value::Int4(r)) => Some(l.cmp(&(*r as i64))),
			(l, r) => {
				let l = l.as_f64()?;
				let r = r.as_f64()?;
				l.partial_cmp(&r)
			}
		}
	}

	pub fn sql_eq(&self, other: &Value) -> Option<bool> {
		self.sql_cmp(other).map(|o| o == Ordering::Equal)
	}

	/// Ordering used by sorts and grouping: undefined sorts first, numeric
	/// values compare across widths.
	pub fn order(&self, other: &Value) -> Ordering {
		match (self, other) {
			(Value::Undefined, Value::Undefined) => Ordering::Equal,
			(Value::Undefined, _) => Ordering::Less,
			(_, Value::Undefined) => Ordering::Greater,
			(l, r) => l.sql_cmp(r).unwrap_or_else(|| l.cmp(r)),
		}
	}

	/// Converts this value to `to`, failing on values that cannot be
	/// represented in the target type.
	pub fn cast(&self, to: Type) -> crate::Result<Value> {
		if self.get_type() == to {
			return Ok(self.clone());
		}
		let result = match (self, to) {
			(Value::Undefined, _) => Some(Value::Undefined),
			(v, Type::Utf8) => Some(Value::Utf8(v.to_string())),
			(Value::Boolean(b), Type::Int4) => Some(Value::Int4(*b as i32)),
			(Value::Boolean(b), Type::Int8) => Some(Value::Int8(*b as i64)),
			(Value::Int4(v), Type::Boolean) => Some(Value::Boolean(*v != 0)),
			(Value::Int8(v), Type::Boolean) => Some(Value::Boolean(*v != 0)),
			(Value::Int4(v), Type::Int8) => Some(Value::Int8(*v as i64)),
			(Value::Int8(v), Type::Int4) => i32::try_from(*v).ok().map(Value::Int4),
			(Value::Int4(v), Type::Float8) => Some(Value::float8(*v as f64)),
			(Value::Int8(v), Type::Float8) => Some(Value::float8(*v as f64)),
			(Value::Float8(v), Type::Int4) => float_to_int(v.value()).and_then(|v| i32::try_from(v).ok()).map(Value::Int4),
			(Value::Float8(v), Type::Int8) => float_to_int(v.value()).map(Value::Int8),
			(Value::RowId(v), Type::Int8) => i64::try_from(*v).ok().map(Value::Int8),
			(Value::Int8(v), Type::RowId) => u64::try_from(*v).ok().map(Value::RowId),
			(Value::Utf8(s), Type::Boolean) => match s.trim().to_ascii_lowercase().as_str() {
				"true" => Some(Value::Boolean(true)),
				"false" => Some(Value::Boolean(false)),
				_ => None,
			},
			(Value::Utf8(s), Type::Int4) => s.trim().parse::<i32>().ok().map(Value::Int4),
			(Value::Utf8(s), Type::Int8) => s.trim().parse::<i64>().ok().map(Value::Int8),
			(Value::Utf8(s), Type::Float8) => s.trim().parse::<f64>().ok().map(Value::float8),
			_ => None,
		};
		match result {
			Some(value) => Ok(value),
			None => return_error!(invalid_cast(self, to)),
		}
	}
}

fn float_to_int(v: f64) -> Option<i64> {
	if v.is_finite() && v >= i64::MIN as f64 && v <= i64::MAX as f64 {
		Some(v.trunc() as i64)
	} else {
		None
	}
}

impl Display for Value {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Value::Undefined => f.write_str("undefined"),
			Value::Boolean(b) => Display::fmt(b, f),
			Value::Int4(v) => Display::fmt(v, f),
			Value::Int8(v) => Display::fmt(v, f),
			Value::Float8(v) => Display::fmt(v, f),
			Value::Utf8(s) => f.write_str(s),
			Value::RowId(v) => write!(f, "@{}", v),
		}
	}
}

impl From<bool> for Value {
	fn from(value: bool) -> Self {
		Value::Boolean(value)
	}
}

impl From<i32> for Value {
	fn from(value: i32) -> Self {
		Value::Int4(value)
	}
}

impl From<i64> for Value {
	fn from(value: i64) -> Self {
		Value::Int8(value)
	}
}

impl From<f64> for Value {
	fn from(value: f64) -> Self {
		Value::float8(value)
	}
}

impl From<&str> for Value {
	fn from(value: &str) -> Self {
		Value::Utf8(value.to_string())
	}
}

impl From<String> for Value {
	fn from(value: String) -> Self {
		Value::Utf8(value)
	}
}

impl<T: Into<Value>> From<Option<T>> for Value {
	fn from(value: Option<T>) -> Self {
		value.map(Into::into).unwrap_or(Value::Undefined)
	}
}
