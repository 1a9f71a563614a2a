// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Join kernels. Every join yields two aligned position lists, ordered by
//! the outer (left) position and then by the inner one. NULL never matches.

use std::{collections::HashMap, sync::Arc};

use quarry_rql::plan::dataflow::{CompareOp, JoinOp};
use quarry_type::Value;
use tracing::trace;

use super::select::between;
use crate::{
	column::{Column, normalize, row_ids},
	function::ScalarFunction,
};

fn pairs(matches: Vec<(usize, usize)>) -> (Vec<Value>, Vec<Value>) {
	let left = row_ids(matches.iter().map(|(l, _)| *l));
	let right = row_ids(matches.iter().map(|(_, r)| *r));
	(left, right)
}

pub(crate) fn join(left: Column, right: Column, op: JoinOp) -> (Vec<Value>, Vec<Value>) {
	match op {
		JoinOp::Cross => pairs((0..left.len()).flat_map(|l| (0..right.len()).map(move |r| (l, r))).collect()),
		JoinOp::Compare(CompareOp::Equal) => hash_join(left, right),
		JoinOp::Compare(op) => nested_loop(left, right, op),
	}
}

/// Builds on the right input and probes with the left one.
fn hash_join(left: Column, right: Column) -> (Vec<Value>, Vec<Value>) {
	let mut table: HashMap<Value, Vec<usize>> = HashMap::new();
	for (r, value) in right.values().iter().enumerate() {
		if !value.is_undefined() {
			table.entry(normalize(value)).or_default().push(r);
		}
	}
	trace!(build = right.len(), probe = left.len(), keys = table.len(), "hash join");

	let mut matches = vec![];
	for (l, value) in left.values().iter().enumerate() {
		if value.is_undefined() {
			continue;
		}
		if let Some(rows) = table.get(&normalize(value)) {
			matches.extend(rows.iter().map(|r| (l, *r)));
		}
	}
	pairs(matches)
}

fn nested_loop(left: Column, right: Column, op: CompareOp) -> (Vec<Value>, Vec<Value>) {
	let mut matches = vec![];
	for (l, lv) in left.values().iter().enumerate() {
		for (r, rv) in right.values().iter().enumerate() {
			if lv.sql_cmp(rv).is_some_and(|o| op.holds(o)) {
				matches.push((l, r));
			}
		}
	}
	pairs(matches)
}

/// Pairs (value position, bound position) where the value lies within the
/// bounds of that row; `anti` keeps the pairs where it lies outside.
pub(crate) fn range_join(
	value: Column,
	low: Column,
	high: Column,
	low_inclusive: bool,
	high_inclusive: bool,
	anti: bool,
) -> (Vec<Value>, Vec<Value>) {
	let bounds = low.len().max(high.len());
	let mut matches = vec![];
	for v in 0..value.len() {
		for b in 0..bounds {
			let within = between(value.get(v), low.get(b), high.get(b), low_inclusive, high_inclusive);
			if within.is_some_and(|within| within != anti) {
				matches.push((v, b));
			}
		}
	}
	pairs(matches)
}

/// Pairs for which the boolean kernel holds on the left values of the
/// first position followed by the right values of the second.
pub(crate) fn filter_join(
	function: &Arc<dyn ScalarFunction>,
	left: &[Column],
	right: &[Column],
) -> crate::Result<(Vec<Value>, Vec<Value>)> {
	let left_rows = left.iter().map(Column::len).max().unwrap_or(0);
	let right_rows = right.iter().map(Column::len).max().unwrap_or(0);

	let mut matches = vec![];
	for l in 0..left_rows {
		let mut args: Vec<Column> = left.iter().map(|c| Column::Scalar(c.get(l))).collect();
		args.extend(right.iter().copied());
		let result = function.scalar(&args, right_rows)?;
		matches.extend(
			result.iter().enumerate().filter(|(_, v)| **v == Value::Boolean(true)).map(|(r, _)| (l, r)),
		);
	}
	Ok(pairs(matches))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::function::Functions;

	fn ints(values: &[Option<i32>]) -> Vec<Value> {
		values.iter().map(|v| v.map(Value::int4).unwrap_or(Value::Undefined)).collect()
	}

	#[test]
	fn test_equi_join_order_and_nulls() {
		let left = ints(&[Some(1), None, Some(2), Some(1)]);
		let right = ints(&[Some(1), Some(1), None, Some(3)]);
		let (l, r) = join(Column::Vector(&left), Column::Vector(&right), JoinOp::Compare(CompareOp::Equal));
		assert_eq!(l, row_ids([0, 0, 3, 3]));
		assert_eq!(r, row_ids([0, 1, 0, 1]));
	}

	#[test]
	fn test_hash_join_matches_nested_loop() {
		let left = ints(&[Some(1), None, Some(2), Some(2), Some(5)]);
		let right = vec![Value::int8(2), Value::Undefined, Value::float8(1.0), Value::int8(2)];
		let hashed = hash_join(Column::Vector(&left), Column::Vector(&right));
		let looped = nested_loop(Column::Vector(&left), Column::Vector(&right), CompareOp::Equal);
		assert_eq!(hashed, looped);
		assert_eq!(hashed.0.len(), 5);
	}

	#[test]
	fn test_theta_join() {
		let left = ints(&[Some(1), Some(3)]);
		let right = ints(&[Some(2), Some(0)]);
		let (l, r) = join(Column::Vector(&left), Column::Vector(&right), JoinOp::Compare(CompareOp::LessThan));
		assert_eq!((l, r), (row_ids([0]), row_ids([0])));
	}

	#[test]
	fn test_cross_join() {
		let left = ints(&[Some(1), Some(2)]);
		let right = ints(&[Some(3), Some(4), Some(5)]);
		let (l, r) = join(Column::Vector(&left), Column::Vector(&right), JoinOp::Cross);
		assert_eq!(l, row_ids([0, 0, 0, 1, 1, 1]));
		assert_eq!(r, row_ids([0, 1, 2, 0, 1, 2]));
	}

	#[test]
	fn test_range_join() {
		let values = ints(&[Some(1), Some(5), None]);
		let low = ints(&[Some(0), Some(4)]);
		let high = ints(&[Some(2), Some(6)]);
		let (v, b) = range_join(
			Column::Vector(&values),
			Column::Vector(&low),
			Column::Vector(&high),
			true,
			true,
			false,
		);
		assert_eq!((v, b), (row_ids([0, 1]), row_ids([0, 1])));
	}

	#[test]
	fn test_filter_join_with_like() {
		let like = Functions::builtins().get_scalar("like").unwrap();
		let names = vec![Value::utf8("apple"), Value::utf8("berry")];
		let patterns = vec![Value::utf8("b%"), Value::utf8("%e%")];
		let (l, r) = filter_join(&like, &[Column::Vector(&names)], &[Column::Vector(&patterns)]).unwrap();
		assert_eq!(l, row_ids([0, 1, 1]));
		assert_eq!(r, row_ids([1, 0, 1]));
	}
}
