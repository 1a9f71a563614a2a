// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Window kernels. The last three call arguments describe the window
//! ordering: the permutation of the input rows, the partition id and the
//! peer group id of every sorted position. Partitions and peer groups are
//! contiguous runs of sorted positions.

use quarry_rql::expression::AggregateFunction;
use quarry_type::{Value, error::diagnostic::runtime::malformed_program, return_error};

use super::{Accumulator, WindowFunction};
use crate::column::{Column, position};

#[derive(Debug, Clone, PartialEq)]
pub struct WindowFrame {
	/// Input row at each sorted position
	order: Vec<usize>,
	partition: Vec<Value>,
	peers: Vec<Value>,
}

impl WindowFrame {
	pub fn new(permutation: Column, partition: Column, peers: Column) -> crate::Result<Self> {
		let len = permutation.len();
		let mut order = Vec::with_capacity(len);
		for k in 0..len {
			let Some(row) = position(permutation.get(k)) else {
				return_error!(malformed_program("window permutation holds a non-position value"));
			};
			order.push(row);
		}
		Ok(Self {
			order,
			partition: (0..len).map(|k| partition.get(k).clone()).collect(),
			peers: (0..len).map(|k| peers.get(k).clone()).collect(),
		})
	}

	/// Splits the trailing frame columns off the call arguments.
	pub fn split<'a, 'b>(args: &'b [Column<'a>]) -> crate::Result<(&'b [Column<'a>], Self)> {
		let Some(split) = args.len().checked_sub(3) else {
			return_error!(malformed_program("window call without ordering arguments"));
		};
		let (values, frame) = args.split_at(split);
		Ok((values, Self::new(frame[0], frame[1], frame[2])?))
	}

	pub fn len(&self) -> usize {
		self.order.len()
	}

	pub fn is_empty(&self) -> bool {
		self.order.is_empty()
	}

	/// Contiguous runs of equal ids as `(start, end)` sorted positions.
	fn runs(ids: &[Value], from: usize, to: usize) -> Vec<(usize, usize)> {
		let mut runs = vec![];
		let mut start = from;
		for k in from + 1..=to {
			if k == to || ids[k] != ids[start] {
				runs.push((start, k));
				start = k;
			}
		}
		runs
	}

	pub(crate) fn partitions(&self) -> Vec<(usize, usize)> {
		if self.is_empty() {
			return vec![];
		}
		Self::runs(&self.partition, 0, self.len())
	}

	/// Peer groups inside the partition `[start, end)`.
	pub(crate) fn peer_groups(&self, start: usize, end: usize) -> Vec<(usize, usize)> {
		if start >= end {
			return vec![];
		}
		Self::runs(&self.peers, start, end)
	}

	/// Calls `f(sorted position, peer group index, peer start, partition
	/// start)` and scatters the results back to input row order.
	fn evaluate(&self, mut f: impl FnMut(usize, usize, usize, usize) -> crate::Result<Value>) -> crate::Result<Vec<Value>> {
		let mut result = vec![Value::Undefined; self.len()];
		for (start, end) in self.partitions() {
			for (group, (peer_start, peer_end)) in self.peer_groups(start, end).into_iter().enumerate() {
				for k in peer_start..peer_end {
					let value = f(k, group, peer_start, start)?;
					if let Some(slot) = result.get_mut(self.order[k]) {
						*slot = value;
					}
				}
			}
		}
		Ok(result)
	}
}

pub(super) struct RowNumber;

impl WindowFunction for RowNumber {
	fn window(&self, _args: &[Column], frame: &WindowFrame) -> crate::Result<Vec<Value>> {
		frame.evaluate(|k, _, _, start| Ok(Value::Int8((k - start + 1) as i64)))
	}
}

pub(super) struct Rank;

impl WindowFunction for Rank {
	fn window(&self, _args: &[Column], frame: &WindowFrame) -> crate::Result<Vec<Value>> {
		frame.evaluate(|_, _, peer_start, start| Ok(Value::Int8((peer_start - start + 1) as i64)))
	}
}

pub(super) struct DenseRank;

impl WindowFunction for DenseRank {
	fn window(&self, _args: &[Column], frame: &WindowFrame) -> crate::Result<Vec<Value>> {
		frame.evaluate(|_, group, _, _| Ok(Value::Int8(group as i64 + 1)))
	}
}

/// Running aggregate over the partition up to the end of the current peer
/// group.
pub(super) struct Running(pub AggregateFunction);

impl WindowFunction for Running {
	fn window(&self, args: &[Column], frame: &WindowFrame) -> crate::Result<Vec<Value>> {
		let Some(values) = args.first() else {
			return_error!(malformed_program("running aggregate without an argument"));
		};
		let mut result = vec![Value::Undefined; frame.len()];
		for (start, end) in frame.partitions() {
			let mut acc = Accumulator::new(self.0);
			for (peer_start, peer_end) in frame.peer_groups(start, end) {
				for k in peer_start..peer_end {
					acc.add(values.get(frame.order[k]))?;
				}
				let value = acc.result();
				for k in peer_start..peer_end {
					if let Some(slot) = result.get_mut(frame.order[k]) {
						*slot = value.clone();
					}
				}
			}
		}
		Ok(result)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::column::row_ids;

	fn ids(values: &[i64]) -> Vec<Value> {
		values.iter().map(|v| Value::int8(*v)).collect()
	}

	/// Rows 0..5 sorted as [3, 1, 4, 0, 2]; partitions {3, 1, 4} and {0, 2};
	/// rows 1 and 4 are peers.
	fn frame() -> WindowFrame {
		let permutation = row_ids([3, 1, 4, 0, 2]);
		let partition = ids(&[0, 0, 0, 1, 1]);
		let peers = ids(&[0, 1, 1, 2, 3]);
		WindowFrame::new(Column::Vector(&permutation), Column::Vector(&partition), Column::Vector(&peers)).unwrap()
	}

	#[test]
	fn test_row_number_restarts_per_partition() {
		let result = RowNumber.window(&[], &frame()).unwrap();
		assert_eq!(result, ids(&[1, 2, 2, 1, 3]));
	}

	#[test]
	fn test_rank_and_dense_rank() {
		assert_eq!(Rank.window(&[], &frame()).unwrap(), ids(&[1, 2, 2, 1, 2]));
		assert_eq!(DenseRank.window(&[], &frame()).unwrap(), ids(&[1, 2, 2, 1, 2]));

		let permutation = row_ids([0, 1, 2]);
		let partition = ids(&[0, 0, 0]);
		let peers = ids(&[0, 0, 1]);
		let frame =
			WindowFrame::new(Column::Vector(&permutation), Column::Vector(&partition), Column::Vector(&peers))
				.unwrap();
		assert_eq!(Rank.window(&[], &frame).unwrap(), ids(&[1, 1, 3]));
		assert_eq!(DenseRank.window(&[], &frame).unwrap(), ids(&[1, 1, 2]));
	}

	#[test]
	fn test_running_sum_includes_peers() {
		let values = vec![Value::int4(10), Value::int4(1), Value::int4(20), Value::int4(100), Value::int4(2)];
		let result = Running(AggregateFunction::Sum).window(&[Column::Vector(&values)], &frame()).unwrap();
		// partition {3, 1, 4}: 100, then 100 + 1 + 2 for the peers 1 and 4
		assert_eq!(result, ids(&[10, 103, 30, 100, 103]));
	}

	#[test]
	fn test_split_trailing_arguments() {
		let values = vec![Value::int4(1)];
		let permutation = row_ids([0]);
		let zero = Value::int8(0);
		let args = [Column::Vector(&values), Column::Vector(&permutation), Column::Scalar(&zero), Column::Scalar(&zero)];
		let (rest, frame) = WindowFrame::split(&args).unwrap();
		assert_eq!(rest.len(), 1);
		assert_eq!(frame.len(), 1);
		assert!(WindowFrame::split(&args[..2]).is_err());
	}
}
