// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Comparisons and three-valued boolean logic. NULL operands yield NULL
//! unless the function is about NULL.

use std::cmp::Ordering;

use quarry_type::{Value, error::diagnostic::runtime::invalid_argument, return_error};

fn compare(args: &[&Value], test: fn(Ordering) -> bool) -> crate::Result<Value> {
	let [left, right] = args else {
		return_error!(invalid_argument("compare", "expects two arguments"));
	};
	Ok(match left.sql_cmp(right) {
		Some(ordering) => Value::Boolean(test(ordering)),
		None => Value::Undefined,
	})
}

pub(super) fn eq(args: &[&Value]) -> crate::Result<Value> {
	compare(args, Ordering::is_eq)
}

pub(super) fn ne(args: &[&Value]) -> crate::Result<Value> {
	compare(args, Ordering::is_ne)
}

pub(super) fn lt(args: &[&Value]) -> crate::Result<Value> {
	compare(args, Ordering::is_lt)
}

pub(super) fn le(args: &[&Value]) -> crate::Result<Value> {
	compare(args, Ordering::is_le)
}

pub(super) fn gt(args: &[&Value]) -> crate::Result<Value> {
	compare(args, Ordering::is_gt)
}

pub(super) fn ge(args: &[&Value]) -> crate::Result<Value> {
	compare(args, Ordering::is_ge)
}

fn truth(function: &str, value: &Value) -> crate::Result<Option<bool>> {
	match value {
		Value::Undefined => Ok(None),
		Value::Boolean(b) => Ok(Some(*b)),
		other => return_error!(invalid_argument(function, &format!("expects booleans, got {}", other.get_type()))),
	}
}

/// False wins over NULL.
pub(super) fn and(args: &[&Value]) -> crate::Result<Value> {
	let mut unknown = false;
	for arg in args {
		match truth("and", arg)? {
			Some(false) => return Ok(Value::Boolean(false)),
			None => unknown = true,
			Some(true) => {}
		}
	}
	Ok(if unknown {
		Value::Undefined
	} else {
		Value::Boolean(true)
	})
}

/// True wins over NULL.
pub(super) fn or(args: &[&Value]) -> crate::Result<Value> {
	let mut unknown = false;
	for arg in args {
		match truth("or", arg)? {
			Some(true) => return Ok(Value::Boolean(true)),
			None => unknown = true,
			Some(false) => {}
		}
	}
	Ok(if unknown {
		Value::Undefined
	} else {
		Value::Boolean(false)
	})
}

pub(super) fn not(args: &[&Value]) -> crate::Result<Value> {
	let Some(value) = args.first() else {
		return_error!(invalid_argument("not", "expects one argument"));
	};
	Ok(match truth("not", value)? {
		Some(b) => Value::Boolean(!b),
		None => Value::Undefined,
	})
}

pub(super) fn isnull(args: &[&Value]) -> crate::Result<Value> {
	Ok(Value::Boolean(args.first().is_none_or(|v| v.is_undefined())))
}

pub(super) fn coalesce(args: &[&Value]) -> crate::Result<Value> {
	Ok(args.iter().find(|v| !v.is_undefined()).map(|v| (*v).clone()).unwrap_or(Value::Undefined))
}

/// A NULL condition takes the else branch.
pub(super) fn ifthenelse(args: &[&Value]) -> crate::Result<Value> {
	let [condition, then, otherwise] = args else {
		return_error!(invalid_argument("ifthenelse", "expects three arguments"));
	};
	Ok(match truth("ifthenelse", condition)? {
		Some(true) => (*then).clone(),
		_ => (*otherwise).clone(),
	})
}
