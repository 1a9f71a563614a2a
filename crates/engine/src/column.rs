// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use quarry_type::Value;

static UNDEFINED: Value = Value::Undefined;

/// The value a statement produced.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Slot {
	Scalar(Value),
	Column(Vec<Value>),
	/// Results of joins, groups and orders; picked apart by `Result`
	Multi(Vec<Vec<Value>>),
}

impl Slot {
	pub fn none() -> Self {
		Slot::Scalar(Value::Undefined)
	}
}

/// A kernel operand. A scalar repeats for every row.
#[derive(Debug, Clone, Copy)]
pub enum Column<'a> {
	Scalar(&'a Value),
	Vector(&'a [Value]),
}

impl<'a> Column<'a> {
	/// The value at `row`; rows past the end read as NULL.
	pub fn get(&self, row: usize) -> &'a Value {
		match *self {
			Column::Scalar(value) => value,
			Column::Vector(values) => values.get(row).unwrap_or(&UNDEFINED),
		}
	}

	pub fn is_scalar(&self) -> bool {
		matches!(self, Column::Scalar(_))
	}

	/// Number of rows; a scalar counts as one.
	pub fn len(&self) -> usize {
		match self {
			Column::Scalar(_) => 1,
			Column::Vector(values) => values.len(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// The values as a slice; a scalar is a single row.
	pub fn values(&self) -> &'a [Value] {
		match *self {
			Column::Scalar(value) => std::slice::from_ref(value),
			Column::Vector(values) => values,
		}
	}
}

/// Row position held by a `RowId` (or integer) value.
pub(crate) fn position(value: &Value) -> Option<usize> {
	value.as_row_id().and_then(|v| usize::try_from(v).ok())
}

pub(crate) fn row_ids(positions: impl IntoIterator<Item = usize>) -> Vec<Value> {
	positions.into_iter().map(|p| Value::RowId(p as u64)).collect()
}

/// Canonical form for hashing and equality across numeric widths.
pub(crate) fn normalize(value: &Value) -> Value {
	match value {
		Value::Int4(v) => Value::Int8(*v as i64),
		Value::Float8(v) if v.value().fract() == 0.0 && v.value().abs() < i64::MAX as f64 => {
			Value::Int8(v.value() as i64)
		}
		value => value.clone(),
	}
}
