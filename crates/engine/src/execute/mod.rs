// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Reference executor for dataflow programs.
//!
//! Statements run in block order and every result is kept in a slot
//! indexed by statement id. Table writes go straight to the storage the
//! executor was handed; the engine runs programs against a staged copy.

mod group;
mod join;
mod order;
mod select;

use std::collections::HashMap;

use quarry_catalog::MaterializedCatalog;
use quarry_rql::{
	interface::{Catalog, ColumnId, TableDef, TableId},
	plan::dataflow::{Cardinality, Op, OutputColumn, Program, Stmt, StmtId},
};
use quarry_type::{
	Type, Value,
	error::diagnostic::{
		catalog::object_not_found,
		constraint::constraint_violation,
		runtime::{malformed_program, parameter_not_bound},
	},
	return_error,
};
use tracing::{instrument, trace};

use crate::{
	column::{Column, Slot, position},
	frame::{Frame, FrameColumn},
	function::{Functions, WindowFrame},
	params::Params,
	result::{CatalogOperation, ExecutionResult, TransactionEvent},
	storage::Storage,
};

enum Flow {
	Next,
	Return,
}

pub(crate) struct Executor<'a> {
	program: &'a Program,
	catalog: &'a MaterializedCatalog,
	storage: &'a mut Storage,
	functions: &'a Functions,
	params: &'a Params,
	slots: Vec<Slot>,
	variables: HashMap<String, Value>,
	result: ExecutionResult,
}

/// Statement result as a kernel operand. A multi-result statement reads
/// as its first result.
fn operand(slots: &[Slot], id: StmtId) -> Column<'_> {
	match &slots[id.0 as usize] {
		Slot::Scalar(value) => Column::Scalar(value),
		Slot::Column(values) => Column::Vector(values),
		Slot::Multi(results) => Column::Vector(results.first().map(Vec::as_slice).unwrap_or(&[])),
	}
}

/// Row count of an operation over `columns`: the longest vector, or one
/// row when all of them are scalars.
fn row_count(columns: &[Column]) -> usize {
	columns.iter().filter(|c| !c.is_scalar()).map(Column::len).max().unwrap_or(1)
}

/// The only value of a scalar or single row column; no rows read as NULL.
fn single(column: Column, what: &str) -> crate::Result<Value> {
	match column.len() {
		0 => Ok(Value::Undefined),
		1 => Ok(column.get(0).clone()),
		rows => return_error!(malformed_program(&format!("{} expects one row, got {}", what, rows))),
	}
}

fn shaped(stmt: &Stmt, values: Vec<Value>) -> Slot {
	match stmt.card {
		Cardinality::Scalar => Slot::Scalar(values.into_iter().next().unwrap_or(Value::Undefined)),
		Cardinality::Column => Slot::Column(values),
	}
}

fn is_true(column: Column) -> bool {
	column.values().iter().any(|v| *v == Value::Boolean(true))
}

impl<'a> Executor<'a> {
	pub(crate) fn new(
		program: &'a Program,
		catalog: &'a MaterializedCatalog,
		storage: &'a mut Storage,
		functions: &'a Functions,
		params: &'a Params,
	) -> Self {
		Self {
			program,
			catalog,
			storage,
			functions,
			params,
			slots: vec![Slot::none(); program.len()],
			variables: HashMap::new(),
			result: ExecutionResult::new(program.query_type),
		}
	}

	#[instrument(name = "engine::execute", level = "debug", skip_all, fields(statements = self.program.len()))]
	pub(crate) fn run(mut self) -> crate::Result<ExecutionResult> {
		let program = self.program;
		self.run_block(program.block())?;
		Ok(self.result)
	}

	fn run_block(&mut self, block: &[StmtId]) -> crate::Result<Flow> {
		for id in block {
			if let Flow::Return = self.execute(*id)? {
				return Ok(Flow::Return);
			}
		}
		Ok(Flow::Next)
	}

	fn table(&self, id: TableId) -> crate::Result<&'a TableDef> {
		let catalog = self.catalog;
		match catalog.table(id) {
			Some(table) => Ok(table),
			None => return_error!(object_not_found("table", &id.to_string())),
		}
	}

	fn column_position(&self, table: &TableDef, column: ColumnId) -> crate::Result<usize> {
		match table.position(column) {
			Some(position) => Ok(position),
			None => return_error!(object_not_found("column", &format!("{}.{}", table.name, column))),
		}
	}

	fn set(&mut self, id: StmtId, slot: Slot) {
		self.slots[id.0 as usize] = slot;
	}

	fn execute(&mut self, id: StmtId) -> crate::Result<Flow> {
		let program = self.program;
		let stmt = program.stmt(id);
		trace!(stmt = %id, op = stmt.op.name(), "execute");

		match &stmt.op {
			Op::Insert {
				table,
				columns,
			} => {
				let table = self.table(*table)?;
				let values: Vec<Column> = columns.iter().map(|c| operand(&self.slots, *c)).collect();
				let count = values.iter().map(Column::len).max().unwrap_or(0);
				let tids = self.storage.table_mut(table).insert(count, &values);
				self.set(id, Slot::Column(tids));
			}
			Op::UpdateColumn {
				table,
				column,
				tids,
				values,
			} => {
				let table = self.table(*table)?;
				let position = self.column_position(table, *column)?;
				let tids = operand(&self.slots, *tids);
				let values = operand(&self.slots, *values);
				self.storage.table_mut(table).update(position, tids.values(), values);
			}
			Op::Delete {
				table,
				tids,
			} => {
				let table = self.table(*table)?;
				let tids = operand(&self.slots, *tids);
				self.storage.table_mut(table).delete(tids.values());
			}
			Op::Clear {
				table,
			} => {
				let table = self.table(*table)?;
				self.storage.table_mut(table).clear();
			}
			Op::IndexWrite {
				table,
				index,
				tids,
				values,
			} => {
				let table = self.table(*table)?;
				let tids = operand(&self.slots, *tids);
				let values = operand(&self.slots, *values);
				self.storage.table_mut(table).write_index(*index, tids.values(), values);
			}
			Op::Exception {
				condition,
				message,
			} => {
				if is_true(operand(&self.slots, *condition)) {
					return_error!(constraint_violation(message));
				}
			}
			Op::AffectedRows {
				count,
			} => {
				let count: i64 =
					operand(&self.slots, *count).values().iter().filter_map(Value::as_i64).sum();
				self.result.affected += count.max(0) as u64;
			}
			Op::Declare {
				name,
				..
			} => {
				self.variables.insert(name.clone(), Value::Undefined);
			}
			Op::Assign {
				name,
				value,
			} => {
				let value = single(operand(&self.slots, *value), "assignment")?;
				self.variables.insert(name.clone(), value);
			}
			Op::If {
				condition,
				then,
				otherwise,
			} => {
				let block = if is_true(operand(&self.slots, *condition)) {
					then
				} else {
					otherwise
				};
				return self.run_block(block);
			}
			Op::While {
				prelude,
				condition,
				body,
			} => loop {
				if let Flow::Return = self.run_block(prelude)? {
					return Ok(Flow::Return);
				}
				if !is_true(operand(&self.slots, *condition)) {
					break;
				}
				if let Flow::Return = self.run_block(body)? {
					return Ok(Flow::Return);
				}
			},
			Op::Return {
				value,
			} => {
				let value = single(operand(&self.slots, *value), "return")?;
				self.result.returned = Some(value);
				return Ok(Flow::Return);
			}
			Op::Output {
				columns,
			} => {
				let frame = self.frame(columns);
				self.result.frames.push(frame);
			}
			Op::Export {
				columns,
				format,
			} => {
				let frame = self.frame(columns);
				let rows = frame.rows();
				let text = rows
					.iter()
					.map(|row| row.iter().map(|v| format.quote(v)).collect::<Vec<_>>().join(&format.column_separator))
					.collect::<Vec<_>>()
					.join(&format.row_separator);
				self.result.affected += rows.len() as u64;
				self.result.exports.push(text);
			}
			Op::Transaction {
				kind,
				chain,
				name,
			} => {
				self.result.transactions.push(TransactionEvent {
					kind: *kind,
					chain: *chain,
					name: name.clone(),
				});
			}
			Op::Catalog {
				operation,
				args,
			} => {
				let args = args.iter().flat_map(|a| operand(&self.slots, *a).values().to_vec()).collect();
				self.result.catalog.push(CatalogOperation {
					operation: operation.clone(),
					args,
				});
			}
			_ => {
				let slot = self.evaluate(stmt)?;
				self.set(id, slot);
			}
		}
		Ok(Flow::Next)
	}

	/// Output frame; scalar columns are broadcast to the row count.
	fn frame(&self, columns: &[OutputColumn]) -> Frame {
		let operands: Vec<Column> = columns.iter().map(|c| operand(&self.slots, c.stmt)).collect();
		let rows = row_count(&operands);
		Frame::new(
			columns.iter()
				.zip(operands)
				.map(|(column, values)| FrameColumn {
					relation: column.relation.clone(),
					name: column.name.clone(),
					values: (0..rows).map(|row| values.get(row).clone()).collect(),
				})
				.collect(),
		)
	}

	/// Side effect free statements.
	fn evaluate(&self, stmt: &Stmt) -> crate::Result<Slot> {
		let col = |id: StmtId| operand(&self.slots, id);
		let opt = |id: Option<StmtId>| id.map(|id| operand(&self.slots, id));

		Ok(match &stmt.op {
			Op::Const {
				value,
			} => Slot::Scalar(value.clone()),
			Op::Param {
				name,
			} => {
				let Some(value) = self.params.get(name) else {
					return_error!(parameter_not_bound(name));
				};
				if stmt.ty == Type::Undefined {
					Slot::Scalar(value.clone())
				} else {
					Slot::Scalar(value.cast(stmt.ty)?)
				}
			}
			Op::Var {
				name,
			} => Slot::Scalar(self.variables.get(name).cloned().unwrap_or(Value::Undefined)),
			Op::Values {
				values,
			} => Slot::Column(values.iter().map(|v| col(*v).get(0).clone()).collect()),
			Op::Tid {
				table,
			} => Slot::Column(self.storage.table(*table).map(|t| t.tids()).unwrap_or_default()),
			Op::Bind {
				table,
				column,
			} => {
				let def = self.table(*table)?;
				let position = self.column_position(def, *column)?;
				Slot::Column(self.storage.table(*table).map(|t| t.column(position).to_vec()).unwrap_or_default())
			}
			Op::BindIndex {
				table,
				index,
			} => Slot::Column(self.storage.table(*table).map(|t| t.index(*index)).unwrap_or_default()),
			Op::ConstColumn {
				value,
				like,
			} => Slot::Column(vec![col(*value).get(0).clone(); col(*like).len()]),
			Op::Mirror {
				input,
			} => Slot::Column(group::mirror(col(*input))),
			Op::Project {
				ids,
				column,
			} => {
				let column = col(*column);
				let values = col(*ids)
					.values()
					.iter()
					.map(|id| match position(id) {
						Some(row) => column.get(row).clone(),
						None => Value::Undefined,
					})
					.collect();
				shaped(stmt, values)
			}
			Op::Select {
				input,
				candidates,
				op,
				value,
			} => Slot::Column(select::select(col(*input), opt(*candidates), *op, col(*value))),
			Op::RangeSelect {
				input,
				candidates,
				low,
				high,
				low_inclusive,
				high_inclusive,
				anti,
			} => Slot::Column(select::range_select(
				col(*input),
				opt(*candidates),
				col(*low),
				col(*high),
				*low_inclusive,
				*high_inclusive,
				*anti,
			)),
			Op::SelectNull {
				input,
				candidates,
				anti,
			} => Slot::Column(select::select_null(col(*input), opt(*candidates), *anti)),
			Op::Join {
				left,
				right,
				op,
			} => {
				let (left, right) = join::join(col(*left), col(*right), *op);
				Slot::Multi(vec![left, right])
			}
			Op::RangeJoin {
				value,
				low,
				high,
				low_inclusive,
				high_inclusive,
				anti,
			} => {
				let (values, bounds) = join::range_join(
					col(*value),
					col(*low),
					col(*high),
					*low_inclusive,
					*high_inclusive,
					*anti,
				);
				Slot::Multi(vec![values, bounds])
			}
			Op::FilterJoin {
				function,
				left,
				right,
			} => {
				let Some(kernel) = self.functions.get_scalar(function) else {
					return_error!(malformed_program(&format!("no kernel for function '{}'", function)));
				};
				let left: Vec<Column> = left.iter().map(|c| col(*c)).collect();
				let right: Vec<Column> = right.iter().map(|c| col(*c)).collect();
				let (left, right) = join::filter_join(&kernel, &left, &right)?;
				Slot::Multi(vec![left, right])
			}
			Op::Result {
				input,
				index,
			} => match &self.slots[input.0 as usize] {
				Slot::Multi(results) => match results.get(*index as usize) {
					Some(values) => Slot::Column(values.clone()),
					None => return_error!(malformed_program(&format!("{} has no result {}", input, index))),
				},
				_ => return_error!(malformed_program(&format!("{} is not a multi-result statement", input))),
			},
			Op::Union {
				left,
				right,
			} => Slot::Column(select::union(col(*left), col(*right))),
			Op::Difference {
				left,
				right,
			} => Slot::Column(select::difference(col(*left), col(*right))),
			Op::Intersect {
				left,
				right,
			} => Slot::Column(select::intersect(col(*left), col(*right))),
			Op::Append {
				left,
				right,
			} => Slot::Column(select::append(col(*left), col(*right))),
			Op::Group {
				input,
				previous,
				..
			} => {
				let grouped = group::group(col(*input), opt(*previous));
				Slot::Multi(vec![grouped.ids, grouped.extent, grouped.counts])
			}
			Op::Aggregate {
				input,
				group,
				function,
			} => {
				let group = group.map(|g| (col(g.ids), col(g.extent)));
				shaped(stmt, group::aggregate(col(*input), group, *function)?)
			}
			Op::Replicate {
				ids,
				counts,
			} => Slot::Column(group::replicate(col(*ids), col(*counts))),
			Op::Order {
				input,
				sort,
			} => {
				let (permutation, groups) = order::order(col(*input), *sort);
				Slot::Multi(vec![permutation, groups])
			}
			Op::Reorder {
				input,
				sort,
				order,
				groups,
			} => {
				let (permutation, groups) = order::reorder(col(*input), *sort, col(*order), col(*groups))?;
				Slot::Multi(vec![permutation, groups])
			}
			Op::Limit {
				input,
				candidates,
				groups,
				bound,
				sort,
				inclusive,
				distinct,
			} => {
				let spec = order::LimitSpec {
					sort: *sort,
					inclusive: *inclusive,
					distinct: *distinct,
				};
				let (positions, ranks) =
					order::limit(col(*input), opt(*candidates), opt(*groups), col(*bound).get(0), spec);
				Slot::Multi(vec![positions, ranks])
			}
			Op::Slice {
				input,
				offset,
				limit,
			} => Slot::Column(order::slice(
				col(*input),
				opt(*offset).map(|c| c.get(0)),
				opt(*limit).map(|c| c.get(0)),
			)),
			Op::Sample {
				input,
				size,
				seed,
			} => Slot::Column(order::sample(col(*input), col(*size).get(0), *seed)),
			Op::Scatter {
				like,
				ids,
				values,
			} => {
				let values = col(*values);
				let mut out = vec![Value::Undefined; col(*like).len()];
				for (i, id) in col(*ids).values().iter().enumerate() {
					if let Some(slot) = position(id).and_then(|row| out.get_mut(row)) {
						*slot = values.get(i).clone();
					}
				}
				Slot::Column(out)
			}
			Op::Call {
				function,
				args,
			} => {
				let args: Vec<Column> = args.iter().map(|a| col(*a)).collect();
				if let Some(kernel) = self.functions.get_window(function) {
					let (values, frame) = WindowFrame::split(&args)?;
					Slot::Column(kernel.window(values, &frame)?)
				} else if let Some(kernel) = self.functions.get_scalar(function) {
					let rows = match stmt.card {
						Cardinality::Scalar => 1,
						Cardinality::Column => row_count(&args),
					};
					shaped(stmt, kernel.scalar(&args, rows)?)
				} else {
					return_error!(malformed_program(&format!("no kernel for function '{}'", function)));
				}
			}
			Op::TableCall {
				function,
				args,
			} => {
				let Some(kernel) = self.functions.get_table(function) else {
					return_error!(malformed_program(&format!("no kernel for table function '{}'", function)));
				};
				let args: Vec<Column> = args.iter().map(|a| col(*a)).collect();
				let results = kernel.table(&args, row_count(&args))?;
				if results.len() != stmt.results as usize {
					return_error!(malformed_program(&format!(
						"{} returned {} columns, expected {}",
						function,
						results.len(),
						stmt.results
					)));
				}
				Slot::Multi(results)
			}
			Op::Convert {
				input,
				to,
				..
			} => {
				let values = col(*input).values().iter().map(|v| v.cast(*to)).collect::<crate::Result<Vec<_>>>()?;
				shaped(stmt, values)
			}
			op => return_error!(malformed_program(&format!("{} is not a value statement", op.name()))),
		})
	}
}

#[cfg(test)]
mod tests {
	use quarry_rql::plan::dataflow::{CompareOp, SortSpec};

	use super::*;

	fn run(program: &Program, params: &Params) -> crate::Result<ExecutionResult> {
		let catalog = MaterializedCatalog::new();
		let mut storage = Storage::new();
		let functions = Functions::builtins();
		Executor::new(program, &catalog, &mut storage, &functions, params).run()
	}

	fn output(program: &mut Program, stmt: StmtId) {
		program.output(vec![OutputColumn {
			relation: String::new(),
			name: "x".to_string(),
			stmt,
		}]);
	}

	#[test]
	fn test_select_project_output() {
		let mut program = Program::new();
		let one = program.constant(Value::int4(1));
		let two = program.constant(Value::int4(2));
		let three = program.constant(Value::int4(3));
		let values = program.values(vec![three, one, two]);
		let selected = program.select(values, None, CompareOp::GreaterThan, one);
		let projected = program.project(selected, values);
		output(&mut program, projected);

		let result = run(&program, &Params::new()).unwrap();
		assert_eq!(result.rows(), vec![vec![Value::int4(3)], vec![Value::int4(2)]]);
	}

	#[test]
	fn test_order_results() {
		let mut program = Program::new();
		let a = program.constant(Value::utf8("b"));
		let b = program.constant(Value::utf8("a"));
		let values = program.values(vec![a, b]);
		let (permutation, _) = program.order(
			values,
			SortSpec {
				asc: true,
				nulls_first: true,
			},
		);
		let sorted = program.project(permutation, values);
		output(&mut program, sorted);

		let result = run(&program, &Params::new()).unwrap();
		assert_eq!(result.rows(), vec![vec![Value::utf8("a")], vec![Value::utf8("b")]]);
	}

	#[test]
	fn test_param_is_cast() {
		let mut program = Program::new();
		let param = program.param("p", Type::Int8);
		output(&mut program, param);

		let result = run(&program, &Params::new().with("p", Value::int4(7))).unwrap();
		assert_eq!(result.rows(), vec![vec![Value::int8(7)]]);

		let err = run(&program, &Params::new()).unwrap_err();
		assert_eq!(err.code, "RUNTIME_002");
	}

	#[test]
	fn test_exception_raises_on_true() {
		let mut program = Program::new();
		let yes = program.constant(Value::bool(true));
		program.exception(yes, "boom");

		let err = run(&program, &Params::new()).unwrap_err();
		assert!(err.message.contains("boom"));
	}

	#[test]
	fn test_while_loop_and_return() {
		let mut program = Program::new();
		program.declare("i", Type::Int8);
		let zero = program.constant(Value::int8(0));
		program.assign("i", zero);

		program.begin_block();
		let i = program.var("i", Type::Int8);
		let three = program.constant(Value::int8(3));
		let condition = program.call("lt", vec![i, three], Type::Boolean);
		let prelude = program.end_block();

		program.begin_block();
		let i = program.var("i", Type::Int8);
		let one = program.constant(Value::int8(1));
		let next = program.call("add", vec![i, one], Type::Int8);
		program.assign("i", next);
		let body = program.end_block();

		program.while_(prelude, condition, body);
		let i = program.var("i", Type::Int8);
		program.return_(i);

		let result = run(&program, &Params::new()).unwrap();
		assert_eq!(result.returned, Some(Value::int8(3)));
	}

	#[test]
	fn test_unknown_function_is_malformed() {
		let mut program = Program::new();
		let one = program.constant(Value::int4(1));
		let call = program.call("nope", vec![one], Type::Int4);
		output(&mut program, call);

		let err = run(&program, &Params::new()).unwrap_err();
		assert_eq!(err.code, "RUNTIME_005");
	}
}
