// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use quarry_rql::expression::AggregateFunction;
use quarry_type::{Value, error::diagnostic::runtime::arithmetic_overflow, return_error};

/// Running state of one aggregate over one group.
#[derive(Debug, Clone)]
pub(crate) struct Accumulator {
	function: AggregateFunction,
	count: i64,
	int_sum: i64,
	float_sum: f64,
	float: bool,
	extreme: Option<Value>,
}

impl Accumulator {
	pub fn new(function: AggregateFunction) -> Self {
		Self {
			function,
			count: 0,
			int_sum: 0,
			float_sum: 0.0,
			float: false,
			extreme: None,
		}
	}

	pub fn add(&mut self, value: &Value) -> crate::Result<()> {
		if self.function == AggregateFunction::CountAll {
			self.count += 1;
			return Ok(());
		}
		if value.is_undefined() {
			return Ok(());
		}
		self.count += 1;
		match self.function {
			AggregateFunction::Count | AggregateFunction::CountAll => {}
			AggregateFunction::Sum | AggregateFunction::Avg => match value {
				Value::Int4(_) | Value::Int8(_) if !self.float => {
					let Some(sum) = value.as_i64().and_then(|v| self.int_sum.checked_add(v)) else {
						return_error!(arithmetic_overflow(self.function.name()));
					};
					self.int_sum = sum;
				}
				other => {
					if !self.float {
						self.float = true;
						self.float_sum = self.int_sum as f64;
					}
					self.float_sum += other.as_f64().unwrap_or(0.0);
				}
			},
			AggregateFunction::Min => {
				if self.extreme.as_ref().is_none_or(|current| value.order(current).is_lt()) {
					self.extreme = Some(value.clone());
				}
			}
			AggregateFunction::Max => {
				if self.extreme.as_ref().is_none_or(|current| value.order(current).is_gt()) {
					self.extreme = Some(value.clone());
				}
			}
		}
		Ok(())
	}

	/// The aggregate so far; NULL when no value contributed, except for
	/// counts.
	pub fn result(&self) -> Value {
		match self.function {
			AggregateFunction::Count | AggregateFunction::CountAll => Value::Int8(self.count),
			_ if self.count == 0 => Value::Undefined,
			AggregateFunction::Sum if self.float => Value::float8(self.float_sum),
			AggregateFunction::Sum => Value::Int8(self.int_sum),
			AggregateFunction::Avg => {
				let sum = if self.float {
					self.float_sum
				} else {
					self.int_sum as f64
				};
				Value::float8(sum / self.count as f64)
			}
			AggregateFunction::Min | AggregateFunction::Max => self.extreme.clone().unwrap_or(Value::Undefined),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn run(function: AggregateFunction, values: &[Value]) -> crate::Result<Value> {
		let mut acc = Accumulator::new(function);
		for value in values {
			acc.add(value)?;
		}
		Ok(acc.result())
	}

	#[test]
	fn test_count_skips_null() {
		let values = [Value::int4(1), Value::Undefined, Value::int4(3)];
		assert_eq!(run(AggregateFunction::Count, &values).unwrap(), Value::int8(2));
		assert_eq!(run(AggregateFunction::CountAll, &values).unwrap(), Value::int8(3));
	}

	#[test]
	fn test_empty_aggregates_are_null() {
		assert_eq!(run(AggregateFunction::Sum, &[]).unwrap(), Value::Undefined);
		assert_eq!(run(AggregateFunction::Avg, &[Value::Undefined]).unwrap(), Value::Undefined);
		assert_eq!(run(AggregateFunction::Min, &[]).unwrap(), Value::Undefined);
		assert_eq!(run(AggregateFunction::Count, &[]).unwrap(), Value::int8(0));
	}

	#[test]
	fn test_sum_and_avg() {
		let values = [Value::int4(1), Value::int4(2), Value::int4(4)];
		assert_eq!(run(AggregateFunction::Sum, &values).unwrap(), Value::int8(7));
		assert_eq!(run(AggregateFunction::Avg, &[Value::int4(1), Value::int4(2)]).unwrap(), Value::float8(1.5));
		assert_eq!(run(AggregateFunction::Sum, &[Value::int4(1), Value::float8(0.5)]).unwrap(), Value::float8(1.5));
	}

	#[test]
	fn test_sum_overflow() {
		let values = [Value::int8(i64::MAX), Value::int8(1)];
		assert_eq!(run(AggregateFunction::Sum, &values).unwrap_err().code, "RUNTIME_006");
	}

	#[test]
	fn test_min_max() {
		let values = [Value::utf8("b"), Value::Undefined, Value::utf8("a"), Value::utf8("c")];
		assert_eq!(run(AggregateFunction::Min, &values).unwrap(), Value::utf8("a"));
		assert_eq!(run(AggregateFunction::Max, &values).unwrap(), Value::utf8("c"));
	}
}
