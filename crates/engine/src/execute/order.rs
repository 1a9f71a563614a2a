// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Sorting, bounded top-K passes, slicing and sampling.

use std::cmp::Ordering;

use quarry_rql::plan::dataflow::SortSpec;
use quarry_type::{Value, error::diagnostic::runtime::malformed_program, return_error};
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::column::{Column, position, row_ids};

/// Compares two sort key values. NULL placement follows `nulls_first`
/// whatever the direction.
pub(crate) fn compare(left: &Value, right: &Value, sort: SortSpec) -> Ordering {
	match (left.is_undefined(), right.is_undefined()) {
		(true, true) => Ordering::Equal,
		(true, false) if sort.nulls_first => Ordering::Less,
		(true, false) => Ordering::Greater,
		(false, true) if sort.nulls_first => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => {
			let ordering = left.order(right);
			if sort.asc {
				ordering
			} else {
				ordering.reverse()
			}
		}
	}
}

/// Dense tie group ids for consecutive sorted positions; `same(a, b)`
/// tells whether neighbours tie.
fn tie_groups(len: usize, same: impl Fn(usize, usize) -> bool) -> Vec<Value> {
	let mut groups = Vec::with_capacity(len);
	let mut group = 0u64;
	for k in 0..len {
		if k > 0 && !same(k - 1, k) {
			group += 1;
		}
		groups.push(Value::RowId(group));
	}
	groups
}

/// Stable sort: (permutation, tie group per sorted position).
pub(crate) fn order(input: Column, sort: SortSpec) -> (Vec<Value>, Vec<Value>) {
	let mut permutation: Vec<usize> = (0..input.len()).collect();
	permutation.sort_by(|a, b| compare(input.get(*a), input.get(*b), sort));
	let groups = tie_groups(permutation.len(), |a, b| {
		compare(input.get(permutation[a]), input.get(permutation[b]), sort).is_eq()
	});
	(row_ids(permutation), groups)
}

/// Refines an ordering: rows sort by `input` within each contiguous run of
/// equal `groups`, runs keep their place.
pub(crate) fn reorder(input: Column, sort: SortSpec, order: Column, groups: Column) -> crate::Result<(Vec<Value>, Vec<Value>)> {
	let mut permutation = Vec::with_capacity(order.len());
	for value in order.values() {
		let Some(row) = position(value) else {
			return_error!(malformed_program("ordering holds a non-position value"));
		};
		permutation.push(row);
	}

	let mut start = 0;
	while start < permutation.len() {
		let mut end = start + 1;
		while end < permutation.len() && groups.get(end) == groups.get(start) {
			end += 1;
		}
		permutation[start..end].sort_by(|a, b| compare(input.get(*a), input.get(*b), sort));
		start = end;
	}

	let refined = tie_groups(permutation.len(), |a, b| {
		groups.get(a) == groups.get(b) && compare(input.get(permutation[a]), input.get(permutation[b]), sort).is_eq()
	});
	Ok((row_ids(permutation), refined))
}

/// Parameters of a bounded top-K pass.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LimitSpec {
	pub sort: SortSpec,
	pub inclusive: bool,
	pub distinct: bool,
}

/// One bounded top-K pass over `input` (restricted to `candidates`).
///
/// Rows are ranked by the rank of the previous pass, then by their value.
/// An inclusive pass keeps every row tying with the `bound`-th one (with
/// `distinct`, the rows of the first `bound` distinct keys); otherwise
/// exactly `bound` rows survive. Survivors keep their candidate order and
/// come with their dense rank.
pub(crate) fn limit(
	input: Column,
	candidates: Option<Column>,
	groups: Option<Column>,
	bound: &Value,
	spec: LimitSpec,
) -> (Vec<Value>, Vec<Value>) {
	let rows: Vec<usize> = match candidates {
		Some(candidates) => candidates.values().iter().filter_map(position).collect(),
		None => (0..input.len()).collect(),
	};
	let previous = |i: usize| -> u64 { groups.and_then(|g| g.get(i).as_row_id()).unwrap_or(0) };
	let key = |a: usize, b: usize| -> Ordering {
		previous(a).cmp(&previous(b)).then_with(|| compare(input.get(rows[a]), input.get(rows[b]), spec.sort))
	};

	// indexes into `rows` in key order, ties by position
	let mut ranked: Vec<usize> = (0..rows.len()).collect();
	ranked.sort_by(|a, b| key(*a, *b));

	let bound = match bound {
		Value::Undefined => rows.len(),
		value => value.as_i64().unwrap_or(0).max(0) as usize,
	};

	let mut keep = vec![false; rows.len()];
	let mut rank = vec![0u64; rows.len()];
	let mut dense = 0u64;
	let mut group_start = 0;
	for (k, i) in ranked.iter().enumerate() {
		if k > 0 && key(ranked[k - 1], *i).is_ne() {
			dense += 1;
			group_start = k;
		}
		rank[*i] = dense;
		keep[*i] = match (spec.inclusive, spec.distinct) {
			(true, false) => group_start < bound,
			(true, true) => (dense as usize) < bound,
			(false, _) => k < bound,
		};
	}

	let survivors: Vec<usize> = (0..rows.len()).filter(|i| keep[*i]).collect();
	let positions = row_ids(survivors.iter().map(|i| rows[*i]));
	let ranks = survivors.iter().map(|i| Value::RowId(rank[*i])).collect();
	(positions, ranks)
}

/// Values of `input` at positions `[offset, offset + limit)`; a NULL limit
/// is unbounded.
pub(crate) fn slice(input: Column, offset: Option<&Value>, limit: Option<&Value>) -> Vec<Value> {
	let values = input.values();
	let offset = offset.and_then(Value::as_i64).unwrap_or(0).max(0) as usize;
	let start = offset.min(values.len());
	let end = match limit.and_then(Value::as_i64) {
		Some(limit) => start.saturating_add(limit.max(0) as usize).min(values.len()),
		None => values.len(),
	};
	values[start..end].to_vec()
}

/// Up to `size` distinct positions of `input` drawn with a seeded
/// generator, in ascending order.
pub(crate) fn sample(input: Column, size: &Value, seed: u64) -> Vec<Value> {
	let len = input.len();
	let size = size.as_i64().unwrap_or(0).max(0) as usize;
	if size >= len {
		return row_ids(0..len);
	}
	let mut rng = StdRng::seed_from_u64(seed);
	let mut positions: Vec<usize> = (0..len).collect();
	// partial Fisher-Yates: the first `size` slots end up a uniform sample
	for i in 0..size {
		let j = i + (rng.next_u64() % (len - i) as u64) as usize;
		positions.swap(i, j);
	}
	let mut chosen = positions[..size].to_vec();
	chosen.sort_unstable();
	row_ids(chosen)
}

#[cfg(test)]
mod tests {
	use super::*;

	const ASC: SortSpec = SortSpec {
		asc: true,
		nulls_first: true,
	};
	const DESC_NULLS_LAST: SortSpec = SortSpec {
		asc: false,
		nulls_first: false,
	};

	fn ints(values: &[Option<i32>]) -> Vec<Value> {
		values.iter().map(|v| v.map(Value::int4).unwrap_or(Value::Undefined)).collect()
	}

	fn spec(inclusive: bool, distinct: bool) -> LimitSpec {
		LimitSpec {
			sort: ASC,
			inclusive,
			distinct,
		}
	}

	#[test]
	fn test_order_is_stable_with_tie_groups() {
		let input = ints(&[Some(2), None, Some(1), Some(2)]);
		let (permutation, groups) = order(Column::Vector(&input), ASC);
		assert_eq!(permutation, row_ids([1, 2, 0, 3]));
		assert_eq!(groups, row_ids([0, 1, 2, 2]));

		let (permutation, _) = order(Column::Vector(&input), DESC_NULLS_LAST);
		assert_eq!(permutation, row_ids([0, 3, 2, 1]));
	}

	#[test]
	fn test_reorder_matches_direct_sort() {
		let k1 = ints(&[Some(1), Some(2), Some(1), Some(2), Some(1)]);
		let k2 = ints(&[Some(5), Some(6), Some(7), Some(6), Some(5)]);
		let (permutation, groups) = order(Column::Vector(&k1), ASC);
		let (refined, refined_groups) = reorder(
			Column::Vector(&k2),
			DESC_NULLS_LAST,
			Column::Vector(&permutation),
			Column::Vector(&groups),
		)
		.unwrap();

		let mut direct: Vec<usize> = (0..5).collect();
		direct.sort_by(|a, b| compare(&k1[*a], &k1[*b], ASC).then(compare(&k2[*a], &k2[*b], DESC_NULLS_LAST)));
		assert_eq!(refined, row_ids(direct));
		assert_eq!(refined_groups, row_ids([0, 1, 1, 2, 2]));
	}

	#[test]
	fn test_limit_exact() {
		let input = ints(&[Some(3), Some(1), Some(2), Some(1)]);
		let (positions, ranks) = limit(Column::Vector(&input), None, None, &Value::int8(2), spec(false, false));
		assert_eq!(positions, row_ids([1, 3]));
		assert_eq!(ranks, row_ids([0, 0]));
	}

	#[test]
	fn test_limit_inclusive_keeps_ties() {
		let input = ints(&[Some(3), Some(1), Some(2), Some(2)]);
		let (positions, ranks) = limit(Column::Vector(&input), None, None, &Value::int8(2), spec(true, false));
		assert_eq!(positions, row_ids([1, 2, 3]));
		assert_eq!(ranks, row_ids([0, 1, 1]));
	}

	#[test]
	fn test_limit_distinct_counts_keys() {
		let input = ints(&[Some(1), Some(1), Some(2), Some(3)]);
		let (positions, _) = limit(Column::Vector(&input), None, None, &Value::int8(2), spec(true, true));
		assert_eq!(positions, row_ids([0, 1, 2]));
	}

	#[test]
	fn test_limit_refines_previous_pass() {
		let input = ints(&[Some(9), Some(4), Some(7), Some(5)]);
		let candidates = row_ids([0, 2, 3]);
		let ranks = row_ids([0, 0, 1]);
		let (positions, _) = limit(
			Column::Vector(&input),
			Some(Column::Vector(&candidates)),
			Some(Column::Vector(&ranks)),
			&Value::int8(2),
			spec(false, false),
		);
		assert_eq!(positions, row_ids([0, 2]));
	}

	#[test]
	fn test_limit_null_bound_keeps_everything() {
		let input = ints(&[Some(1), Some(2)]);
		let (positions, _) = limit(Column::Vector(&input), None, None, &Value::Undefined, spec(false, false));
		assert_eq!(positions, row_ids([0, 1]));
	}

	#[test]
	fn test_slice() {
		let input = row_ids(0..5);
		assert_eq!(slice(Column::Vector(&input), Some(&Value::int8(1)), Some(&Value::int8(2))), row_ids([1, 2]));
		assert_eq!(slice(Column::Vector(&input), Some(&Value::int8(4)), None), row_ids([4]));
		assert_eq!(slice(Column::Vector(&input), Some(&Value::int8(9)), Some(&Value::int8(2))), Vec::<Value>::new());
		assert_eq!(slice(Column::Vector(&input), None, Some(&Value::Undefined)).len(), 5);
	}

	#[test]
	fn test_sample_is_seeded() {
		let input = row_ids(0..100);
		let first = sample(Column::Vector(&input), &Value::int8(10), 42);
		let second = sample(Column::Vector(&input), &Value::int8(10), 42);
		assert_eq!(first, second);
		assert_eq!(first.len(), 10);
		assert!(first.windows(2).all(|w| w[0] < w[1]));
		assert_eq!(sample(Column::Vector(&input[..3]), &Value::int8(10), 1), row_ids([0, 1, 2]));
	}
}
