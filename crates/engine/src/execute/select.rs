// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Selections and candidate list algebra. Every result here is a list of
//! positions (`RowId` values) into the selected column.

use std::collections::HashSet;

use quarry_rql::plan::dataflow::CompareOp;
use quarry_type::Value;

use crate::column::{Column, normalize, position, row_ids};

/// The rows a selection visits: the candidate positions, or every row.
pub(crate) fn rows(input: Column, candidates: Option<Column>) -> Vec<usize> {
	match candidates {
		Some(candidates) => candidates.values().iter().filter_map(position).collect(),
		None => (0..input.len()).collect(),
	}
}

pub(crate) fn select(input: Column, candidates: Option<Column>, op: CompareOp, value: Column) -> Vec<Value> {
	row_ids(rows(input, candidates).into_iter().filter(|row| {
		input.get(*row).sql_cmp(value.get(*row)).is_some_and(|ordering| op.holds(ordering))
	}))
}

/// Three-valued `low <= value <= high` with the given bound inclusivity.
pub(crate) fn between(value: &Value, low: &Value, high: &Value, low_inclusive: bool, high_inclusive: bool) -> Option<bool> {
	let lower = value.sql_cmp(low).map(|o| {
		if low_inclusive {
			o.is_ge()
		} else {
			o.is_gt()
		}
	});
	let upper = value.sql_cmp(high).map(|o| {
		if high_inclusive {
			o.is_le()
		} else {
			o.is_lt()
		}
	});
	match (lower, upper) {
		(Some(false), _) | (_, Some(false)) => Some(false),
		(Some(true), Some(true)) => Some(true),
		_ => None,
	}
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn range_select(
	input: Column,
	candidates: Option<Column>,
	low: Column,
	high: Column,
	low_inclusive: bool,
	high_inclusive: bool,
	anti: bool,
) -> Vec<Value> {
	row_ids(rows(input, candidates).into_iter().filter(|row| {
		between(input.get(*row), low.get(*row), high.get(*row), low_inclusive, high_inclusive)
			.is_some_and(|within| within != anti)
	}))
}

pub(crate) fn select_null(input: Column, candidates: Option<Column>, anti: bool) -> Vec<Value> {
	row_ids(rows(input, candidates).into_iter().filter(|row| input.get(*row).is_undefined() != anti))
}

fn value_set(column: Column) -> HashSet<Value> {
	column.values().iter().map(normalize).collect()
}

/// Sorted, duplicate free union.
pub(crate) fn union(left: Column, right: Column) -> Vec<Value> {
	let mut result: Vec<Value> = left.values().iter().chain(right.values()).cloned().collect();
	result.sort_by(Value::order);
	result.dedup_by(|a, b| a.order(b).is_eq());
	result
}

pub(crate) fn difference(left: Column, right: Column) -> Vec<Value> {
	let right = value_set(right);
	left.values().iter().filter(|v| !right.contains(&normalize(v))).cloned().collect()
}

pub(crate) fn intersect(left: Column, right: Column) -> Vec<Value> {
	let right = value_set(right);
	left.values().iter().filter(|v| right.contains(&normalize(v))).cloned().collect()
}

pub(crate) fn append(left: Column, right: Column) -> Vec<Value> {
	left.values().iter().chain(right.values()).cloned().collect()
}
