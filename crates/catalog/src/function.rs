// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Signatures of the builtin functions. The kernels live with the
//! executor; the compiler only needs arity and result types.

use quarry_rql::interface::{Arity, FunctionDef, ReturnType};
use quarry_type::Type;

const COMPARISONS: [&str; 6] = ["eq", "ne", "lt", "le", "gt", "ge"];

const ARITHMETIC: [&str; 6] = ["add", "sub", "mul", "div", "sql_min", "sql_max"];

pub fn builtins() -> Vec<FunctionDef> {
	let mut result = Vec::with_capacity(40);

	for name in COMPARISONS {
		result.push(FunctionDef::scalar(name, Arity::Exact(2), ReturnType::Fixed(Type::Boolean)));
	}
	result.push(FunctionDef::scalar("and", Arity::AtLeast(2), ReturnType::Fixed(Type::Boolean)));
	result.push(FunctionDef::scalar("or", Arity::AtLeast(2), ReturnType::Fixed(Type::Boolean)));
	result.push(FunctionDef::scalar("not", Arity::Exact(1), ReturnType::Fixed(Type::Boolean)));
	result.push(FunctionDef::scalar("isnull", Arity::Exact(1), ReturnType::Fixed(Type::Boolean)));
	result.push(FunctionDef::scalar(
		"coalesce",
		Arity::AtLeast(1),
		ReturnType::Common {
			from: 0,
		},
	));
	result.push(FunctionDef::scalar(
		"ifthenelse",
		Arity::Exact(3),
		ReturnType::Common {
			from: 1,
		},
	));

	for name in ARITHMETIC {
		result.push(FunctionDef::scalar(name, Arity::Exact(2), ReturnType::Numeric));
	}
	result.push(FunctionDef::scalar("neg", Arity::Exact(1), ReturnType::Numeric));
	result.push(FunctionDef::scalar("abs", Arity::Exact(1), ReturnType::Numeric));

	result.push(FunctionDef::scalar("upper", Arity::Exact(1), ReturnType::Fixed(Type::Utf8)));
	result.push(FunctionDef::scalar("lower", Arity::Exact(1), ReturnType::Fixed(Type::Utf8)));
	result.push(FunctionDef::scalar("length", Arity::Exact(1), ReturnType::Fixed(Type::Int8)));
	result.push(FunctionDef::scalar("concat", Arity::AtLeast(1), ReturnType::Fixed(Type::Utf8)));
	result.push(FunctionDef::filter("like", Arity::Exact(2)));

	result.push(FunctionDef::scalar("hash", Arity::Exact(1), ReturnType::Fixed(Type::Int8)));
	result.push(FunctionDef::scalar("rotate_xor_hash", Arity::Exact(3), ReturnType::Fixed(Type::Int8)));

	result.push(FunctionDef::window("row_number", Arity::Exact(0), ReturnType::Fixed(Type::Int8)));
	result.push(FunctionDef::window("rank", Arity::Exact(0), ReturnType::Fixed(Type::Int8)));
	result.push(FunctionDef::window("dense_rank", Arity::Exact(0), ReturnType::Fixed(Type::Int8)));
	result.push(FunctionDef::window("window_sum", Arity::Exact(1), ReturnType::Numeric));
	result.push(FunctionDef::window("window_count", Arity::Exact(1), ReturnType::Fixed(Type::Int8)));
	result.push(FunctionDef::window("window_min", Arity::Exact(1), ReturnType::SameAsFirst));
	result.push(FunctionDef::window("window_max", Arity::Exact(1), ReturnType::SameAsFirst));
	result.push(FunctionDef::window("window_avg", Arity::Exact(1), ReturnType::Fixed(Type::Float8)));

	result.push(FunctionDef::table("generate_series", Arity::Between(2, 3), &[("value", Type::Int8)]));

	result
}
