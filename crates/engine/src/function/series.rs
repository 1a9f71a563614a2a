// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use quarry_type::{Value, error::diagnostic::runtime::invalid_argument, return_error};

use crate::{column::Column, function::TableFunction};

/// `generate_series(start, stop[, step])`: integers from `start` up to but
/// excluding `stop`. Evaluated once per argument row and concatenated; a
/// NULL argument contributes no rows.
pub struct GenerateSeries;

impl TableFunction for GenerateSeries {
	fn table(&self, args: &[Column], rows: usize) -> crate::Result<Vec<Vec<Value>>> {
		if args.len() < 2 || args.len() > 3 {
			return_error!(invalid_argument("generate_series", "expects two or three arguments"));
		}
		let mut values = Vec::new();
		for row in 0..rows {
			let start = args[0].get(row);
			let stop = args[1].get(row);
			let step = args.get(2).map(|a| a.get(row));
			if start.is_undefined() || stop.is_undefined() || step.is_some_and(Value::is_undefined) {
				continue;
			}
			let (Some(start), Some(stop)) = (start.as_i64(), stop.as_i64()) else {
				return_error!(invalid_argument("generate_series", "bounds must be integers"));
			};
			let step = match step.map(Value::as_i64) {
				None => 1,
				Some(Some(0)) => return_error!(invalid_argument("generate_series", "step must not be zero")),
				Some(Some(step)) => step,
				Some(None) => return_error!(invalid_argument("generate_series", "step must be an integer")),
			};

			let mut current = start;
			while (step > 0 && current < stop) || (step < 0 && current > stop) {
				values.push(Value::Int8(current));
				match current.checked_add(step) {
					Some(next) => current = next,
					None => break,
				}
			}
		}
		Ok(vec![values])
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn series(args: &[Value]) -> crate::Result<Vec<Value>> {
		let columns: Vec<Column> = args.iter().map(Column::Scalar).collect();
		Ok(GenerateSeries.table(&columns, 1)?.remove(0))
	}

	#[test]
	fn test_stop_is_excluded() {
		assert_eq!(series(&[Value::int4(1), Value::int4(4)]).unwrap(), vec![Value::Int8(1), Value::Int8(2), Value::Int8(3)]);
		assert!(series(&[Value::int4(4), Value::int4(4)]).unwrap().is_empty());
	}

	#[test]
	fn test_negative_step() {
		assert_eq!(
			series(&[Value::int4(5), Value::int4(0), Value::int4(-2)]).unwrap(),
			vec![Value::Int8(5), Value::Int8(3), Value::Int8(1)]
		);
	}

	#[test]
	fn test_zero_step_is_rejected() {
		let err = series(&[Value::int4(1), Value::int4(3), Value::int4(0)]).unwrap_err();
		assert_eq!(err.code, "RUNTIME_004");
	}

	#[test]
	fn test_null_bound_yields_nothing() {
		assert!(series(&[Value::Undefined, Value::int4(3)]).unwrap().is_empty());
	}

	#[test]
	fn test_one_series_per_row() {
		let starts = vec![Value::int4(0), Value::int4(10)];
		let stop_offset = vec![Value::int4(2), Value::int4(12)];
		let result = GenerateSeries.table(&[Column::Vector(&starts), Column::Vector(&stop_offset)], 2).unwrap();
		assert_eq!(result, vec![vec![Value::Int8(0), Value::Int8(1), Value::Int8(10), Value::Int8(11)]]);
	}
}
