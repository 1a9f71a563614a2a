// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Kernels of the builtin functions called by `Call` and `FilterJoin`
//! statements.

mod aggregate;
mod compare;
mod hash;
mod math;
mod series;
mod text;
mod window;

use std::{collections::HashMap, sync::Arc};

pub(crate) use aggregate::Accumulator;
use quarry_rql::expression::AggregateFunction;
use quarry_type::Value;
pub use window::WindowFrame;

use crate::column::Column;

/// Vectorized kernel: one result per row. Scalar operands repeat.
pub trait ScalarFunction: Send + Sync {
	fn scalar(&self, args: &[Column], rows: usize) -> crate::Result<Vec<Value>>;
}

/// Kernel evaluated over the rows of a window ordering. Results are
/// aligned with the input rows, not with the sorted positions.
pub trait WindowFunction: Send + Sync {
	fn window(&self, args: &[Column], frame: &WindowFrame) -> crate::Result<Vec<Value>>;
}

/// Kernel of a table-producing function: one column per result, rows
/// generated for each of the `rows` argument rows in turn.
pub trait TableFunction: Send + Sync {
	fn table(&self, args: &[Column], rows: usize) -> crate::Result<Vec<Vec<Value>>>;
}

/// A scalar kernel defined row by row.
pub struct RowFunction(pub fn(&[&Value]) -> crate::Result<Value>);

impl ScalarFunction for RowFunction {
	fn scalar(&self, args: &[Column], rows: usize) -> crate::Result<Vec<Value>> {
		let mut result = Vec::with_capacity(rows);
		let mut row_args = Vec::with_capacity(args.len());
		for row in 0..rows {
			row_args.clear();
			row_args.extend(args.iter().map(|a| a.get(row)));
			result.push((self.0)(&row_args)?);
		}
		Ok(result)
	}
}

#[derive(Clone)]
pub struct Functions {
	scalars: HashMap<String, Arc<dyn ScalarFunction>>,
	windows: HashMap<String, Arc<dyn WindowFunction>>,
	tables: HashMap<String, Arc<dyn TableFunction>>,
}

impl Functions {
	pub fn builder() -> FunctionsBuilder {
		FunctionsBuilder::default()
	}

	/// Every builtin kernel.
	pub fn builtins() -> Self {
		Self::builder()
			.register_scalar("eq", RowFunction(compare::eq))
			.register_scalar("ne", RowFunction(compare::ne))
			.register_scalar("lt", RowFunction(compare::lt))
			.register_scalar("le", RowFunction(compare::le))
			.register_scalar("gt", RowFunction(compare::gt))
			.register_scalar("ge", RowFunction(compare::ge))
			.register_scalar("and", RowFunction(compare::and))
			.register_scalar("or", RowFunction(compare::or))
			.register_scalar("not", RowFunction(compare::not))
			.register_scalar("isnull", RowFunction(compare::isnull))
			.register_scalar("coalesce", RowFunction(compare::coalesce))
			.register_scalar("ifthenelse", RowFunction(compare::ifthenelse))
			.register_scalar("add", RowFunction(math::add))
			.register_scalar("sub", RowFunction(math::sub))
			.register_scalar("mul", RowFunction(math::mul))
			.register_scalar("div", RowFunction(math::div))
			.register_scalar("neg", RowFunction(math::neg))
			.register_scalar("abs", RowFunction(math::abs))
			.register_scalar("sql_min", RowFunction(math::sql_min))
			.register_scalar("sql_max", RowFunction(math::sql_max))
			.register_scalar("upper", RowFunction(text::upper))
			.register_scalar("lower", RowFunction(text::lower))
			.register_scalar("length", RowFunction(text::length))
			.register_scalar("concat", RowFunction(text::concat))
			.register_scalar("like", RowFunction(text::like))
			.register_scalar("hash", RowFunction(hash::hash))
			.register_scalar("rotate_xor_hash", RowFunction(hash::rotate_xor_hash))
			.register_window("row_number", window::RowNumber)
			.register_window("rank", window::Rank)
			.register_window("dense_rank", window::DenseRank)
			.register_window("window_sum", window::Running(AggregateFunction::Sum))
			.register_window("window_count", window::Running(AggregateFunction::Count))
			.register_window("window_min", window::Running(AggregateFunction::Min))
			.register_window("window_max", window::Running(AggregateFunction::Max))
			.register_window("window_avg", window::Running(AggregateFunction::Avg))
			.register_table("generate_series", series::GenerateSeries)
			.build()
	}

	pub fn get_scalar(&self, name: &str) -> Option<Arc<dyn ScalarFunction>> {
		self.scalars.get(name).cloned()
	}

	pub fn get_window(&self, name: &str) -> Option<Arc<dyn WindowFunction>> {
		self.windows.get(name).cloned()
	}

	pub fn get_table(&self, name: &str) -> Option<Arc<dyn TableFunction>> {
		self.tables.get(name).cloned()
	}
}

impl Default for Functions {
	fn default() -> Self {
		Self::builtins()
	}
}

#[derive(Default)]
pub struct FunctionsBuilder {
	scalars: HashMap<String, Arc<dyn ScalarFunction>>,
	windows: HashMap<String, Arc<dyn WindowFunction>>,
	tables: HashMap<String, Arc<dyn TableFunction>>,
}

impl FunctionsBuilder {
	pub fn register_scalar<F: ScalarFunction + 'static>(mut self, name: &str, function: F) -> Self {
		self.scalars.insert(name.to_string(), Arc::new(function));
		self
	}

	pub fn register_window<F: WindowFunction + 'static>(mut self, name: &str, function: F) -> Self {
		self.windows.insert(name.to_string(), Arc::new(function));
		self
	}

	pub fn register_table<F: TableFunction + 'static>(mut self, name: &str, function: F) -> Self {
		self.tables.insert(name.to_string(), Arc::new(function));
		self
	}

	pub fn build(self) -> Functions {
		Functions {
			scalars: self.scalars,
			windows: self.windows,
			tables: self.tables,
		}
	}
}

#[cfg(test)]
mod tests {
	use quarry_catalog::function::builtins;
	use quarry_rql::interface::FunctionKind;

	use super::*;

	#[test]
	fn test_every_signature_has_a_kernel() {
		let functions = Functions::builtins();
		for def in builtins() {
			let found = match def.kind {
				FunctionKind::Window => functions.get_window(&def.name).is_some(),
				FunctionKind::Table => functions.get_table(&def.name).is_some(),
				_ => functions.get_scalar(&def.name).is_some(),
			};
			assert!(found, "no kernel for {}", def.name);
		}
	}

	#[test]
	fn test_row_function_repeats_scalars() {
		let values = vec![Value::int4(1), Value::int4(2), Value::Undefined];
		let one = Value::int4(1);
		let add = Functions::builtins().get_scalar("add").unwrap();
		let result = add.scalar(&[Column::Vector(&values), Column::Scalar(&one)], 3).unwrap();
		assert_eq!(result, vec![Value::int4(2), Value::int4(3), Value::Undefined]);
	}
}
