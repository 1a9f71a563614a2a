// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Typed statement constructors. Each computes the result arity,
//! cardinality and value type of the statement it adds.

use quarry_type::{Type, Value};

use crate::{
	interface::{ColumnId, IndexId, TableId},
	plan::dataflow::{
		AggregateFunction, Cardinality, CompareOp, GroupRef, JoinOp, Op, OutputColumn, Program, SortSpec, Stmt,
		StmtId,
	},
	plan::logical::{ExportFormat, TransactionKind},
};

impl Program {
	fn add(&mut self, op: Op, card: Cardinality, ty: Type) -> StmtId {
		self.add_multi(op, 1, card, ty)
	}

	fn add_multi(&mut self, op: Op, results: u8, card: Cardinality, ty: Type) -> StmtId {
		self.push(Stmt {
			op,
			results,
			card,
			ty,
		})
	}

	/// Scalar only if every operand is scalar.
	fn card_of(&self, operands: &[StmtId]) -> Cardinality {
		if !operands.is_empty() && operands.iter().all(|o| self.is_scalar(*o)) {
			Cardinality::Scalar
		} else {
			Cardinality::Column
		}
	}

	fn effect(&mut self, op: Op) -> StmtId {
		self.add(op, Cardinality::Scalar, Type::Undefined)
	}

	pub fn constant(&mut self, value: Value) -> StmtId {
		let ty = value.get_type();
		self.add(
			Op::Const {
				value,
			},
			Cardinality::Scalar,
			ty,
		)
	}

	/// A NULL constant carrying the type of the column it stands in for.
	pub fn null(&mut self, ty: Type) -> StmtId {
		self.add(
			Op::Const {
				value: Value::Undefined,
			},
			Cardinality::Scalar,
			ty,
		)
	}

	pub fn param(&mut self, name: impl Into<String>, ty: Type) -> StmtId {
		self.add(
			Op::Param {
				name: name.into(),
			},
			Cardinality::Scalar,
			ty,
		)
	}

	pub fn var(&mut self, name: impl Into<String>, ty: Type) -> StmtId {
		self.add(
			Op::Var {
				name: name.into(),
			},
			Cardinality::Scalar,
			ty,
		)
	}

	pub fn values(&mut self, values: Vec<StmtId>) -> StmtId {
		let ty = values.iter().fold(Type::Undefined, |acc, v| Type::common(acc, self.ty(*v)).unwrap_or(acc));
		self.add(
			Op::Values {
				values,
			},
			Cardinality::Column,
			ty,
		)
	}

	pub fn tid(&mut self, table: TableId) -> StmtId {
		self.add(
			Op::Tid {
				table,
			},
			Cardinality::Column,
			Type::RowId,
		)
	}

	pub fn bind(&mut self, table: TableId, column: ColumnId, ty: Type) -> StmtId {
		self.add(
			Op::Bind {
				table,
				column,
			},
			Cardinality::Column,
			ty,
		)
	}

	pub fn bind_index(&mut self, table: TableId, index: IndexId, ty: Type) -> StmtId {
		self.add(
			Op::BindIndex {
				table,
				index,
			},
			Cardinality::Column,
			ty,
		)
	}

	pub fn const_column(&mut self, value: StmtId, like: StmtId) -> StmtId {
		let ty = self.ty(value);
		self.add(
			Op::ConstColumn {
				value,
				like,
			},
			Cardinality::Column,
			ty,
		)
	}

	pub fn mirror(&mut self, input: StmtId) -> StmtId {
		self.add(
			Op::Mirror {
				input,
			},
			Cardinality::Column,
			Type::RowId,
		)
	}

	pub fn project(&mut self, ids: StmtId, column: StmtId) -> StmtId {
		let ty = self.ty(column);
		let card = self.card_of(&[ids, column]);
		self.add(
			Op::Project {
				ids,
				column,
			},
			card,
			ty,
		)
	}

	pub fn select(&mut self, input: StmtId, candidates: Option<StmtId>, op: CompareOp, value: StmtId) -> StmtId {
		self.add(
			Op::Select {
				input,
				candidates,
				op,
				value,
			},
			Cardinality::Column,
			Type::RowId,
		)
	}

	#[allow(clippy::too_many_arguments)]
	pub fn range_select(
		&mut self,
		input: StmtId,
		candidates: Option<StmtId>,
		low: StmtId,
		high: StmtId,
		low_inclusive: bool,
		high_inclusive: bool,
		anti: bool,
	) -> StmtId {
		self.add(
			Op::RangeSelect {
				input,
				candidates,
				low,
				high,
				low_inclusive,
				high_inclusive,
				anti,
			},
			Cardinality::Column,
			Type::RowId,
		)
	}

	pub fn select_null(&mut self, input: StmtId, candidates: Option<StmtId>, anti: bool) -> StmtId {
		self.add(
			Op::SelectNull {
				input,
				candidates,
				anti,
			},
			Cardinality::Column,
			Type::RowId,
		)
	}

	/// Equi or theta join; returns (left ids, right ids).
	pub fn join(&mut self, left: StmtId, right: StmtId, op: JoinOp) -> (StmtId, StmtId) {
		let join = self.add_multi(
			Op::Join {
				left,
				right,
				op,
			},
			2,
			Cardinality::Column,
			Type::RowId,
		);
		self.pair(join)
	}

	pub fn range_join(
		&mut self,
		value: StmtId,
		low: StmtId,
		high: StmtId,
		low_inclusive: bool,
		high_inclusive: bool,
		anti: bool,
	) -> (StmtId, StmtId) {
		let join = self.add_multi(
			Op::RangeJoin {
				value,
				low,
				high,
				low_inclusive,
				high_inclusive,
				anti,
			},
			2,
			Cardinality::Column,
			Type::RowId,
		);
		self.pair(join)
	}

	pub fn filter_join(&mut self, function: impl Into<String>, left: Vec<StmtId>, right: Vec<StmtId>) -> (StmtId, StmtId) {
		let join = self.add_multi(
			Op::FilterJoin {
				function: function.into(),
				left,
				right,
			},
			2,
			Cardinality::Column,
			Type::RowId,
		);
		self.pair(join)
	}

	fn pair(&mut self, input: StmtId) -> (StmtId, StmtId) {
		(self.result(input, 0, Type::RowId), self.result(input, 1, Type::RowId))
	}

	pub fn result(&mut self, input: StmtId, index: u8, ty: Type) -> StmtId {
		self.add(
			Op::Result {
				input,
				index,
			},
			Cardinality::Column,
			ty,
		)
	}

	pub fn union(&mut self, left: StmtId, right: StmtId) -> StmtId {
		self.add(
			Op::Union {
				left,
				right,
			},
			Cardinality::Column,
			Type::RowId,
		)
	}

	pub fn difference(&mut self, left: StmtId, right: StmtId) -> StmtId {
		let ty = self.ty(left);
		self.add(
			Op::Difference {
				left,
				right,
			},
			Cardinality::Column,
			ty,
		)
	}

	pub fn intersect(&mut self, left: StmtId, right: StmtId) -> StmtId {
		let ty = self.ty(left);
		self.add(
			Op::Intersect {
				left,
				right,
			},
			Cardinality::Column,
			ty,
		)
	}

	pub fn append(&mut self, left: StmtId, right: StmtId) -> StmtId {
		let ty = Type::common(self.ty(left), self.ty(right)).unwrap_or(self.ty(left));
		self.add(
			Op::Append {
				left,
				right,
			},
			Cardinality::Column,
			ty,
		)
	}

	/// Returns (group ids, extent, counts).
	pub fn group(&mut self, input: StmtId, previous: Option<StmtId>, closed: bool) -> (StmtId, StmtId, StmtId) {
		let group = self.add_multi(
			Op::Group {
				input,
				previous,
				closed,
			},
			3,
			Cardinality::Column,
			Type::RowId,
		);
		(self.result(group, 0, Type::RowId), self.result(group, 1, Type::RowId), self.result(group, 2, Type::Int8))
	}

	pub fn aggregate(&mut self, input: StmtId, group: Option<GroupRef>, function: AggregateFunction) -> StmtId {
		let ty = function.return_type(self.ty(input));
		let card = if group.is_some() {
			Cardinality::Column
		} else {
			Cardinality::Scalar
		};
		self.add(
			Op::Aggregate {
				input,
				group,
				function,
			},
			card,
			ty,
		)
	}

	pub fn replicate(&mut self, ids: StmtId, counts: StmtId) -> StmtId {
		let ty = self.ty(ids);
		self.add(
			Op::Replicate {
				ids,
				counts,
			},
			Cardinality::Column,
			ty,
		)
	}

	/// Returns (permutation, tie groups).
	pub fn order(&mut self, input: StmtId, sort: SortSpec) -> (StmtId, StmtId) {
		let order = self.add_multi(
			Op::Order {
				input,
				sort,
			},
			2,
			Cardinality::Column,
			Type::RowId,
		);
		self.pair(order)
	}

	pub fn reorder(&mut self, input: StmtId, sort: SortSpec, order: StmtId, groups: StmtId) -> (StmtId, StmtId) {
		let reorder = self.add_multi(
			Op::Reorder {
				input,
				sort,
				order,
				groups,
			},
			2,
			Cardinality::Column,
			Type::RowId,
		);
		self.pair(reorder)
	}

	#[allow(clippy::too_many_arguments)]
	pub fn limit(
		&mut self,
		input: StmtId,
		candidates: Option<StmtId>,
		groups: Option<StmtId>,
		bound: StmtId,
		sort: SortSpec,
		inclusive: bool,
		distinct: bool,
	) -> (StmtId, StmtId) {
		let limit = self.add_multi(
			Op::Limit {
				input,
				candidates,
				groups,
				bound,
				sort,
				inclusive,
				distinct,
			},
			2,
			Cardinality::Column,
			Type::RowId,
		);
		self.pair(limit)
	}

	pub fn slice(&mut self, input: StmtId, offset: Option<StmtId>, limit: Option<StmtId>) -> StmtId {
		let ty = self.ty(input);
		self.add(
			Op::Slice {
				input,
				offset,
				limit,
			},
			Cardinality::Column,
			ty,
		)
	}

	pub fn sample(&mut self, input: StmtId, size: StmtId, seed: u64) -> StmtId {
		self.add(
			Op::Sample {
				input,
				size,
				seed,
			},
			Cardinality::Column,
			Type::RowId,
		)
	}

	pub fn scatter(&mut self, like: StmtId, ids: StmtId, values: StmtId) -> StmtId {
		let ty = self.ty(values);
		self.add(
			Op::Scatter {
				like,
				ids,
				values,
			},
			Cardinality::Column,
			ty,
		)
	}

	pub fn call(&mut self, function: impl Into<String>, args: Vec<StmtId>, ty: Type) -> StmtId {
		let card = self.card_of(&args);
		self.add(
			Op::Call {
				function: function.into(),
				args,
			},
			card,
			ty,
		)
	}

	/// A table function call and one `Result` per output column.
	pub fn table_call(&mut self, function: impl Into<String>, args: Vec<StmtId>, columns: &[Type]) -> Vec<StmtId> {
		let call = self.add_multi(
			Op::TableCall {
				function: function.into(),
				args,
			},
			columns.len() as u8,
			Cardinality::Column,
			columns.first().copied().unwrap_or(Type::Undefined),
		);
		columns.iter().enumerate().map(|(index, ty)| self.result(call, index as u8, *ty)).collect()
	}

	pub fn convert(&mut self, input: StmtId, to: Type) -> StmtId {
		let from = self.ty(input);
		if from == to {
			return input;
		}
		let card = self.card_of(&[input]);
		self.add(
			Op::Convert {
				input,
				from,
				to,
			},
			card,
			to,
		)
	}

	pub fn insert(&mut self, table: TableId, columns: Vec<StmtId>) -> StmtId {
		self.add(
			Op::Insert {
				table,
				columns,
			},
			Cardinality::Column,
			Type::RowId,
		)
	}

	pub fn update_column(&mut self, table: TableId, column: ColumnId, tids: StmtId, values: StmtId) -> StmtId {
		self.effect(Op::UpdateColumn {
			table,
			column,
			tids,
			values,
		})
	}

	pub fn delete(&mut self, table: TableId, tids: StmtId) -> StmtId {
		self.effect(Op::Delete {
			table,
			tids,
		})
	}

	pub fn clear(&mut self, table: TableId) -> StmtId {
		self.effect(Op::Clear {
			table,
		})
	}

	pub fn index_write(&mut self, table: TableId, index: IndexId, tids: StmtId, values: StmtId) -> StmtId {
		self.effect(Op::IndexWrite {
			table,
			index,
			tids,
			values,
		})
	}

	pub fn exception(&mut self, condition: StmtId, message: impl Into<String>) -> StmtId {
		self.effect(Op::Exception {
			condition,
			message: message.into(),
		})
	}

	pub fn affected_rows(&mut self, count: StmtId) -> StmtId {
		self.effect(Op::AffectedRows {
			count,
		})
	}

	pub fn declare(&mut self, name: impl Into<String>, ty: Type) -> StmtId {
		self.effect(Op::Declare {
			name: name.into(),
			ty,
		})
	}

	pub fn assign(&mut self, name: impl Into<String>, value: StmtId) -> StmtId {
		self.effect(Op::Assign {
			name: name.into(),
			value,
		})
	}

	pub fn if_(&mut self, condition: StmtId, then: Vec<StmtId>, otherwise: Vec<StmtId>) -> StmtId {
		self.effect(Op::If {
			condition,
			then,
			otherwise,
		})
	}

	pub fn while_(&mut self, prelude: Vec<StmtId>, condition: StmtId, body: Vec<StmtId>) -> StmtId {
		self.effect(Op::While {
			prelude,
			condition,
			body,
		})
	}

	pub fn return_(&mut self, value: StmtId) -> StmtId {
		self.effect(Op::Return {
			value,
		})
	}

	pub fn output(&mut self, columns: Vec<OutputColumn>) -> StmtId {
		self.effect(Op::Output {
			columns,
		})
	}

	pub fn export(&mut self, columns: Vec<OutputColumn>, format: ExportFormat) -> StmtId {
		self.effect(Op::Export {
			columns,
			format,
		})
	}

	pub fn transaction(&mut self, kind: TransactionKind, chain: bool, name: Option<String>) -> StmtId {
		self.effect(Op::Transaction {
			kind,
			chain,
			name,
		})
	}

	pub fn catalog(&mut self, operation: impl Into<String>, args: Vec<StmtId>) -> StmtId {
		self.effect(Op::Catalog {
			operation: operation.into(),
			args,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::plan::dataflow::Cardinality::{Column, Scalar};

	#[test]
	fn test_call_is_scalar_only_when_all_operands_are() {
		let mut program = Program::new();
		let one = program.constant(Value::int8(1));
		let two = program.constant(Value::int8(2));
		let sum = program.call("add", vec![one, two], Type::Int8);
		assert_eq!(program.stmt(sum).card, Scalar);

		let column = program.bind(TableId(1), ColumnId(1), Type::Int8);
		let mixed = program.call("add", vec![one, column], Type::Int8);
		assert_eq!(program.stmt(mixed).card, Column);
	}

	#[test]
	fn test_join_has_two_results() {
		let mut program = Program::new();
		let l = program.tid(TableId(1));
		let r = program.tid(TableId(2));
		let (lids, rids) = program.join(l, r, JoinOp::Compare(CompareOp::Equal));
		let join = match program.stmt(lids).op {
			Op::Result {
				input,
				index: 0,
			} => input,
			_ => unreachable!(),
		};
		assert_eq!(program.stmt(join).results, 2);
		assert_ne!(lids, rids);
	}

	#[test]
	fn test_group_counts_are_int8() {
		let mut program = Program::new();
		let column = program.bind(TableId(1), ColumnId(1), Type::Utf8);
		let (ids, extent, counts) = program.group(column, None, true);
		assert_eq!(program.ty(ids), Type::RowId);
		assert_eq!(program.ty(extent), Type::RowId);
		assert_eq!(program.ty(counts), Type::Int8);
	}

	#[test]
	fn test_nested_blocks_collect_their_statements() {
		let mut program = Program::new();
		let condition = program.constant(Value::bool(true));
		program.begin_block();
		let inner = program.constant(Value::int8(1));
		let then = program.end_block();
		program.if_(condition, then, vec![]);

		assert_eq!(program.block().len(), 2);
		assert!(!program.block().contains(&inner));
	}

	#[test]
	fn test_convert_to_same_type_is_identity() {
		let mut program = Program::new();
		let column = program.bind(TableId(1), ColumnId(1), Type::Int4);
		assert_eq!(program.convert(column, Type::Int4), column);
		let wide = program.convert(column, Type::Int8);
		assert_ne!(wide, column);
		assert_eq!(program.ty(wide), Type::Int8);
	}
}
