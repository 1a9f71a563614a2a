// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use indexmap::IndexMap;
use quarry_rql::plan::dataflow::AggregateFunction;
use quarry_type::{Value, error::diagnostic::runtime::malformed_program, return_error};

use crate::{
	column::{Column, normalize, position, row_ids},
	function::Accumulator,
};

/// Result of a grouping pass.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Grouped {
	/// Dense group id per input row, numbered by first appearance
	pub ids: Vec<Value>,
	/// First input row of every group
	pub extent: Vec<Value>,
	pub counts: Vec<Value>,
}

/// Groups rows by `input`, refining the groups of `previous`. NULL values
/// form one group.
pub(crate) fn group(input: Column, previous: Option<Column>) -> Grouped {
	let rows = input.len().max(previous.map(|p| p.len()).unwrap_or(0));
	let mut groups: IndexMap<(Value, Value), (usize, i64)> = IndexMap::new();
	let mut ids = Vec::with_capacity(rows);
	for row in 0..rows {
		let outer = previous.map(|p| normalize(p.get(row))).unwrap_or(Value::Undefined);
		let key = (outer, normalize(input.get(row)));
		let entry = groups.entry(key);
		let id = entry.index();
		let (_, count) = entry.or_insert((row, 0));
		*count += 1;
		ids.push(Value::RowId(id as u64));
	}
	Grouped {
		ids,
		extent: groups.values().map(|(first, _)| Value::RowId(*first as u64)).collect(),
		counts: groups.values().map(|(_, count)| Value::Int8(*count)).collect(),
	}
}

/// One aggregate per group of `ids`, aligned with `extent`; without a
/// grouping a single value over all rows.
pub(crate) fn aggregate(
	input: Column,
	group: Option<(Column, Column)>,
	function: AggregateFunction,
) -> crate::Result<Vec<Value>> {
	match group {
		None => {
			let mut acc = Accumulator::new(function);
			for row in 0..input.len() {
				acc.add(input.get(row))?;
			}
			Ok(vec![acc.result()])
		}
		Some((ids, extent)) => {
			let mut accumulators = vec![Accumulator::new(function); extent.len()];
			for row in 0..ids.len() {
				let Some(acc) = position(ids.get(row)).and_then(|g| accumulators.get_mut(g)) else {
					return_error!(malformed_program("aggregate group id outside the extent"));
				};
				acc.add(input.get(row))?;
			}
			Ok(accumulators.iter().map(Accumulator::result).collect())
		}
	}
}

/// Each `ids[i]` repeated `counts[i]` times.
pub(crate) fn replicate(ids: Column, counts: Column) -> Vec<Value> {
	let mut result = vec![];
	for row in 0..ids.len() {
		let times = counts.get(row).as_i64().unwrap_or(0).max(0) as usize;
		result.extend(std::iter::repeat_n(ids.get(row).clone(), times));
	}
	result
}

/// Positions `0..len(input)`.
pub(crate) fn mirror(input: Column) -> Vec<Value> {
	row_ids(0..input.len())
}
