// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use quarry_type::{
	Value,
	error::diagnostic::runtime::{arithmetic_overflow, division_by_zero, invalid_argument},
	return_error,
};

#[derive(Debug, Clone, Copy)]
enum Number {
	Int4(i32),
	Int8(i64),
	Float(f64),
}

fn number(function: &str, value: &Value) -> crate::Result<Option<Number>> {
	Ok(Some(match value {
		Value::Undefined => return Ok(None),
		Value::Int4(v) => Number::Int4(*v),
		Value::Int8(v) => Number::Int8(*v),
		Value::Float8(v) => Number::Float(v.value()),
		other => {
			return_error!(invalid_argument(function, &format!("expects numbers, got {}", other.get_type())))
		}
	}))
}

impl Number {
	fn as_i64(self) -> Option<i64> {
		match self {
			Number::Int4(v) => Some(v as i64),
			Number::Int8(v) => Some(v),
			Number::Float(_) => None,
		}
	}

	fn as_f64(self) -> f64 {
		match self {
			Number::Int4(v) => v as f64,
			Number::Int8(v) => v as f64,
			Number::Float(v) => v,
		}
	}
}

/// Int4 with Int4 stays Int4, integers widen to Int8, anything with a
/// float is Float8.
fn arithmetic(
	function: &str,
	args: &[&Value],
	integer: fn(i64, i64) -> Option<i64>,
	float: fn(f64, f64) -> f64,
) -> crate::Result<Value> {
	let [left, right] = args else {
		return_error!(invalid_argument(function, "expects two arguments"));
	};
	let (Some(l), Some(r)) = (number(function, left)?, number(function, right)?) else {
		return Ok(Value::Undefined);
	};
	match (l, r) {
		(Number::Int4(a), Number::Int4(b)) => match integer(a as i64, b as i64).and_then(|v| i32::try_from(v).ok()) {
			Some(v) => Ok(Value::Int4(v)),
			None => return_error!(arithmetic_overflow(function)),
		},
		(l, r) => match (l.as_i64(), r.as_i64()) {
			(Some(a), Some(b)) => match integer(a, b) {
				Some(v) => Ok(Value::Int8(v)),
				None => return_error!(arithmetic_overflow(function)),
			},
			_ => Ok(Value::float8(float(l.as_f64(), r.as_f64()))),
		},
	}
}

pub(super) fn add(args: &[&Value]) -> crate::Result<Value> {
	arithmetic("add", args, i64::checked_add, |a, b| a + b)
}

pub(super) fn sub(args: &[&Value]) -> crate::Result<Value> {
	arithmetic("sub", args, i64::checked_sub, |a, b| a - b)
}

pub(super) fn mul(args: &[&Value]) -> crate::Result<Value> {
	arithmetic("mul", args, i64::checked_mul, |a, b| a * b)
}

/// Integer division truncates toward zero.
pub(super) fn div(args: &[&Value]) -> crate::Result<Value> {
	if let [_, divisor] = args {
		if divisor.as_f64() == Some(0.0) {
			return_error!(division_by_zero());
		}
	}
	arithmetic("div", args, i64::checked_div, |a, b| a / b)
}

pub(super) fn neg(args: &[&Value]) -> crate::Result<Value> {
	let Some(value) = args.first() else {
		return_error!(invalid_argument("neg", "expects one argument"));
	};
	match number("neg", value)? {
		None => Ok(Value::Undefined),
		Some(Number::Int4(v)) => match v.checked_neg() {
			Some(v) => Ok(Value::Int4(v)),
			None => return_error!(arithmetic_overflow("neg")),
		},
		Some(Number::Int8(v)) => match v.checked_neg() {
			Some(v) => Ok(Value::Int8(v)),
			None => return_error!(arithmetic_overflow("neg")),
		},
		Some(Number::Float(v)) => Ok(Value::float8(-v)),
	}
}

pub(super) fn abs(args: &[&Value]) -> crate::Result<Value> {
	let Some(value) = args.first() else {
		return_error!(invalid_argument("abs", "expects one argument"));
	};
	match number("abs", value)? {
		None => Ok(Value::Undefined),
		Some(Number::Int4(v)) => match v.checked_abs() {
			Some(v) => Ok(Value::Int4(v)),
			None => return_error!(arithmetic_overflow("abs")),
		},
		Some(Number::Int8(v)) => match v.checked_abs() {
			Some(v) => Ok(Value::Int8(v)),
			None => return_error!(arithmetic_overflow("abs")),
		},
		Some(Number::Float(v)) => Ok(Value::float8(v.abs())),
	}
}

fn extreme(function: &str, args: &[&Value], pick_left: fn(std::cmp::Ordering) -> bool) -> crate::Result<Value> {
	let [left, right] = args else {
		return_error!(invalid_argument(function, "expects two arguments"));
	};
	if left.is_undefined() || right.is_undefined() {
		return Ok(Value::Undefined);
	}
	Ok(if pick_left(left.order(right)) {
		(*left).clone()
	} else {
		(*right).clone()
	})
}

pub(super) fn sql_min(args: &[&Value]) -> crate::Result<Value> {
	extreme("sql_min", args, std::cmp::Ordering::is_le)
}

pub(super) fn sql_max(args: &[&Value]) -> crate::Result<Value> {
	extreme("sql_max", args, std::cmp::Ordering::is_ge)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_widening() {
		assert_eq!(add(&[&Value::int4(1), &Value::int4(2)]).unwrap(), Value::int4(3));
		assert_eq!(add(&[&Value::int4(1), &Value::int8(2)]).unwrap(), Value::int8(3));
		assert_eq!(mul(&[&Value::int8(2), &Value::float8(1.5)]).unwrap(), Value::float8(3.0));
	}

	#[test]
	fn test_null_propagates() {
		assert_eq!(sub(&[&Value::Undefined, &Value::int4(2)]).unwrap(), Value::Undefined);
		assert_eq!(neg(&[&Value::Undefined]).unwrap(), Value::Undefined);
		assert_eq!(sql_max(&[&Value::int8(1), &Value::Undefined]).unwrap(), Value::Undefined);
	}

	#[test]
	fn test_overflow_is_an_error() {
		let err = add(&[&Value::int4(i32::MAX), &Value::int4(1)]).unwrap_err();
		assert_eq!(err.code, "RUNTIME_006");
		assert!(abs(&[&Value::int8(i64::MIN)]).is_err());
	}

	#[test]
	fn test_division() {
		assert_eq!(div(&[&Value::int4(7), &Value::int4(2)]).unwrap(), Value::int4(3));
		assert_eq!(div(&[&Value::int4(-7), &Value::int4(2)]).unwrap(), Value::int4(-3));
		assert_eq!(div(&[&Value::int4(7), &Value::int4(0)]).unwrap_err().code, "RUNTIME_003");
		assert_eq!(div(&[&Value::Undefined, &Value::int4(0)]).unwrap_err().code, "RUNTIME_003");
	}

	#[test]
	fn test_min_max() {
		assert_eq!(sql_min(&[&Value::int8(3), &Value::int8(0)]).unwrap(), Value::int8(0));
		assert_eq!(sql_max(&[&Value::int8(-2), &Value::int8(0)]).unwrap(), Value::int8(0));
		assert_eq!(sql_min(&[&Value::utf8("b"), &Value::utf8("a")]).unwrap(), Value::utf8("a"));
	}

	#[test]
	fn test_non_numeric_operand() {
		assert_eq!(add(&[&Value::utf8("x"), &Value::int4(1)]).unwrap_err().code, "RUNTIME_004");
	}
}
