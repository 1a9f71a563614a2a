// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Columnar dataflow programs.
//!
//! A [`Program`] is an arena of vectorized column statements. Its block
//! lists the statements in execution order: an executor runs the block
//! front to back, so every read observes the table state at the point the
//! statement was emitted. `If` and `While` carry nested blocks.

mod builder;
mod display;

use std::fmt::{Display, Formatter};

use quarry_type::{Type, Value};
use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};

pub use crate::expression::{AggregateFunction, CompareOp};
use crate::{
	interface::{ColumnId, IndexId, TableId},
	plan::logical::{ExportFormat, TransactionKind},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StmtId(pub u32);

impl Display for StmtId {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "X_{}", self.0)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cardinality {
	Scalar,
	Column,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueryType {
	Table,
	Update,
	Schema,
	Transaction,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
	pub op: Op,
	/// Number of result columns; above one for joins, groups and orders
	pub results: u8,
	pub card: Cardinality,
	pub ty: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
	stmts: Vec<Stmt>,
	block: Vec<StmtId>,
	open: Vec<Vec<StmtId>>,
	pub query_type: QueryType,
}

/// Group ids aligned with the input rows plus one representative row per
/// group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupRef {
	pub ids: StmtId,
	pub extent: StmtId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortSpec {
	pub asc: bool,
	pub nulls_first: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinOp {
	Compare(CompareOp),
	Cross,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputColumn {
	pub relation: String,
	pub name: String,
	pub stmt: StmtId,
}

/// Statement operators. Id columns hold row positions (`RowId` values)
/// into the column they select from; `Tid` yields physical row ids which
/// are positions into `Bind` columns.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
	Const {
		value: Value,
	},
	Param {
		name: String,
	},
	Var {
		name: String,
	},
	/// Column built from scalar statements
	Values {
		values: Vec<StmtId>,
	},
	/// Row ids of the live rows of a table
	Tid {
		table: TableId,
	},
	/// Physical column of a table, addressed by row id
	Bind {
		table: TableId,
		column: ColumnId,
	},
	BindIndex {
		table: TableId,
		index: IndexId,
	},
	/// Scalar `value` repeated once per row of `like`
	ConstColumn {
		value: StmtId,
		like: StmtId,
	},
	/// Positions `0..len(input)`
	Mirror {
		input: StmtId,
	},
	/// `column[ids[i]]` for each `i`
	Project {
		ids: StmtId,
		column: StmtId,
	},
	/// Positions of `input` (restricted to `candidates`) where
	/// `input op value` holds; `value` is a scalar or aligned with `input`
	Select {
		input: StmtId,
		candidates: Option<StmtId>,
		op: CompareOp,
		value: StmtId,
	},
	RangeSelect {
		input: StmtId,
		candidates: Option<StmtId>,
		low: StmtId,
		high: StmtId,
		low_inclusive: bool,
		high_inclusive: bool,
		anti: bool,
	},
	SelectNull {
		input: StmtId,
		candidates: Option<StmtId>,
		anti: bool,
	},
	/// Matching position pairs (left ids, right ids); NULL never matches
	Join {
		left: StmtId,
		right: StmtId,
		op: JoinOp,
	},
	/// Pairs (value ids, bound ids) with `low <= value <= high`
	RangeJoin {
		value: StmtId,
		low: StmtId,
		high: StmtId,
		low_inclusive: bool,
		high_inclusive: bool,
		anti: bool,
	},
	FilterJoin {
		function: String,
		left: Vec<StmtId>,
		right: Vec<StmtId>,
	},
	/// The `index`th result of a multi-result statement
	Result {
		input: StmtId,
		index: u8,
	},
	/// Sorted union of two candidate lists
	Union {
		left: StmtId,
		right: StmtId,
	},
	/// Values of `left` not present in `right`, in `left` order
	Difference {
		left: StmtId,
		right: StmtId,
	},
	/// Values of `left` present in `right`, in `left` order
	Intersect {
		left: StmtId,
		right: StmtId,
	},
	/// Concatenation
	Append {
		left: StmtId,
		right: StmtId,
	},
	/// Refines `previous` group ids by `input`: (group ids, extent, counts)
	Group {
		input: StmtId,
		previous: Option<StmtId>,
		closed: bool,
	},
	Aggregate {
		input: StmtId,
		group: Option<GroupRef>,
		function: AggregateFunction,
	},
	/// Each `ids[i]` repeated `counts[i]` times
	Replicate {
		ids: StmtId,
		counts: StmtId,
	},
	/// Stable sort: (permutation, tie group per sorted row)
	Order {
		input: StmtId,
		sort: SortSpec,
	},
	/// Refines `order` by `input` within the tie groups of `groups`
	Reorder {
		input: StmtId,
		sort: SortSpec,
		order: StmtId,
		groups: StmtId,
	},
	/// Bounded top-K pass: (surviving positions, rank group per survivor)
	Limit {
		input: StmtId,
		candidates: Option<StmtId>,
		groups: Option<StmtId>,
		bound: StmtId,
		sort: SortSpec,
		inclusive: bool,
		distinct: bool,
	},
	/// Positions `[offset, offset + limit)` of `input`
	Slice {
		input: StmtId,
		offset: Option<StmtId>,
		limit: Option<StmtId>,
	},
	Sample {
		input: StmtId,
		size: StmtId,
		seed: u64,
	},
	/// Column shaped like `like`, NULL except `out[ids[i]] = values[i]`
	Scatter {
		like: StmtId,
		ids: StmtId,
		values: StmtId,
	},
	Call {
		function: String,
		args: Vec<StmtId>,
	},
	/// Table function; one result per output column
	TableCall {
		function: String,
		args: Vec<StmtId>,
	},
	Convert {
		input: StmtId,
		from: Type,
		to: Type,
	},
	/// Appends rows; yields the new row ids
	Insert {
		table: TableId,
		columns: Vec<StmtId>,
	},
	UpdateColumn {
		table: TableId,
		column: ColumnId,
		tids: StmtId,
		values: StmtId,
	},
	Delete {
		table: TableId,
		tids: StmtId,
	},
	Clear {
		table: TableId,
	},
	IndexWrite {
		table: TableId,
		index: IndexId,
		tids: StmtId,
		values: StmtId,
	},
	/// Raises a constraint violation when the scalar `condition` is true
	Exception {
		condition: StmtId,
		message: String,
	},
	AffectedRows {
		count: StmtId,
	},
	Declare {
		name: String,
		ty: Type,
	},
	Assign {
		name: String,
		value: StmtId,
	},
	If {
		condition: StmtId,
		then: Vec<StmtId>,
		otherwise: Vec<StmtId>,
	},
	/// Runs `prelude`, tests `condition`, runs `body`, repeats
	While {
		prelude: Vec<StmtId>,
		condition: StmtId,
		body: Vec<StmtId>,
	},
	Return {
		value: StmtId,
	},
	Output {
		columns: Vec<OutputColumn>,
	},
	Export {
		columns: Vec<OutputColumn>,
		format: ExportFormat,
	},
	Transaction {
		kind: TransactionKind,
		chain: bool,
		name: Option<String>,
	},
	Catalog {
		operation: String,
		args: Vec<StmtId>,
	},
}

impl Op {
	/// Direct operands, excluding statements of nested blocks.
	pub fn operands(&self) -> SmallVec<[StmtId; 4]> {
		match self {
			Op::Const {
				..
			}
			| Op::Param {
				..
			}
			| Op::Var {
				..
			}
			| Op::Tid {
				..
			}
			| Op::Bind {
				..
			}
			| Op::BindIndex {
				..
			}
			| Op::Clear {
				..
			}
			| Op::Declare {
				..
			}
			| Op::Transaction {
				..
			} => smallvec![],
			Op::Values {
				values,
			} => values.iter().copied().collect(),
			Op::ConstColumn {
				value,
				like,
			} => smallvec![*value, *like],
			Op::Mirror {
				input,
			}
			| Op::Result {
				input,
				..
			}
			| Op::Convert {
				input,
				..
			}
			| Op::Order {
				input,
				..
			} => smallvec![*input],
			Op::Project {
				ids,
				column,
			} => smallvec![*ids, *column],
			Op::Select {
				input,
				candidates,
				value,
				..
			} => {
				let mut result: SmallVec<[StmtId; 4]> = smallvec![*input, *value];
				result.extend(*candidates);
				result
			}
			Op::RangeSelect {
				input,
				candidates,
				low,
				high,
				..
			} => {
				let mut result: SmallVec<[StmtId; 4]> = smallvec![*input, *low, *high];
				result.extend(*candidates);
				result
			}
			Op::SelectNull {
				input,
				candidates,
				..
			} => {
				let mut result: SmallVec<[StmtId; 4]> = smallvec![*input];
				result.extend(*candidates);
				result
			}
			Op::Join {
				left,
				right,
				..
			}
			| Op::Union {
				left,
				right,
			}
			| Op::Difference {
				left,
				right,
			}
			| Op::Intersect {
				left,
				right,
			}
			| Op::Append {
				left,
				right,
			} => smallvec![*left, *right],
			Op::RangeJoin {
				value,
				low,
				high,
				..
			} => smallvec![*value, *low, *high],
			Op::FilterJoin {
				left,
				right,
				..
			} => left.iter().chain(right.iter()).copied().collect(),
			Op::Group {
				input,
				previous,
				..
			} => {
				let mut result: SmallVec<[StmtId; 4]> = smallvec![*input];
				result.extend(*previous);
				result
			}
			Op::Aggregate {
				input,
				group,
				..
			} => {
				let mut result: SmallVec<[StmtId; 4]> = smallvec![*input];
				if let Some(group) = group {
					result.push(group.ids);
					result.push(group.extent);
				}
				result
			}
			Op::Replicate {
				ids,
				counts,
			} => smallvec![*ids, *counts],
			Op::Reorder {
				input,
				order,
				groups,
				..
			} => smallvec![*input, *order, *groups],
			Op::Limit {
				input,
				candidates,
				groups,
				bound,
				..
			} => {
				let mut result: SmallVec<[StmtId; 4]> = smallvec![*input, *bound];
				result.extend(*candidates);
				result.extend(*groups);
				result
			}
			Op::Slice {
				input,
				offset,
				limit,
			} => {
				let mut result: SmallVec<[StmtId; 4]> = smallvec![*input];
				result.extend(*offset);
				result.extend(*limit);
				result
			}
			Op::Sample {
				input,
				size,
				..
			} => smallvec![*input, *size],
			Op::Scatter {
				like,
				ids,
				values,
			} => smallvec![*like, *ids, *values],
			Op::Call {
				args,
				..
			}
			| Op::TableCall {
				args,
				..
			}
			| Op::Catalog {
				args,
				..
			}
			| Op::Insert {
				columns: args,
				..
			} => args.iter().copied().collect(),
			Op::UpdateColumn {
				tids,
				values,
				..
			}
			| Op::IndexWrite {
				tids,
				values,
				..
			} => smallvec![*tids, *values],
			Op::Delete {
				tids,
				..
			} => smallvec![*tids],
			Op::Exception {
				condition,
				..
			}
			| Op::If {
				condition,
				..
			}
			| Op::While {
				condition,
				..
			} => smallvec![*condition],
			Op::AffectedRows {
				count,
			} => smallvec![*count],
			Op::Assign {
				value,
				..
			}
			| Op::Return {
				value,
			} => smallvec![*value],
			Op::Output {
				columns,
			}
			| Op::Export {
				columns,
				..
			} => columns.iter().map(|c| c.stmt).collect(),
		}
	}

	/// Whether the statement changes tables, variables, control flow or
	/// the statement result.
	pub fn is_effectful(&self) -> bool {
		matches!(
			self,
			Op::Insert { .. }
				| Op::UpdateColumn { .. }
				| Op::Delete { .. } | Op::Clear { .. }
				| Op::IndexWrite { .. }
				| Op::Exception { .. }
				| Op::AffectedRows { .. }
				| Op::Declare { .. } | Op::Assign { .. }
				| Op::If { .. } | Op::While { .. }
				| Op::Return { .. } | Op::Output { .. }
				| Op::Export { .. } | Op::Transaction { .. }
				| Op::Catalog { .. }
		)
	}

	pub fn name(&self) -> &'static str {
		match self {
			Op::Const {
				..
			} => "const",
			Op::Param {
				..
			} => "param",
			Op::Var {
				..
			} => "var",
			Op::Values {
				..
			} => "values",
			Op::Tid {
				..
			} => "tid",
			Op::Bind {
				..
			} => "bind",
			Op::BindIndex {
				..
			} => "bind_index",
			Op::ConstColumn {
				..
			} => "const_column",
			Op::Mirror {
				..
			} => "mirror",
			Op::Project {
				..
			} => "project",
			Op::Select {
				..
			} => "select",
			Op::RangeSelect {
				..
			} => "range_select",
			Op::SelectNull {
				..
			} => "select_null",
			Op::Join {
				..
			} => "join",
			Op::RangeJoin {
				..
			} => "range_join",
			Op::FilterJoin {
				..
			} => "filter_join",
			Op::Result {
				..
			} => "result",
			Op::Union {
				..
			} => "union",
			Op::Difference {
				..
			} => "difference",
			Op::Intersect {
				..
			} => "intersect",
			Op::Append {
				..
			} => "append",
			Op::Group {
				..
			} => "group",
			Op::Aggregate {
				..
			} => "aggregate",
			Op::Replicate {
				..
			} => "replicate",
			Op::Order {
				..
			} => "order",
			Op::Reorder {
				..
			} => "reorder",
			Op::Limit {
				..
			} => "limit",
			Op::Slice {
				..
			} => "slice",
			Op::Sample {
				..
			} => "sample",
			Op::Scatter {
				..
			} => "scatter",
			Op::Call {
				..
			} => "call",
			Op::TableCall {
				..
			} => "table_call",
			Op::Convert {
				..
			} => "convert",
			Op::Insert {
				..
			} => "insert",
			Op::UpdateColumn {
				..
			} => "update_column",
			Op::Delete {
				..
			} => "delete",
			Op::Clear {
				..
			} => "clear",
			Op::IndexWrite {
				..
			} => "index_write",
			Op::Exception {
				..
			} => "exception",
			Op::AffectedRows {
				..
			} => "affected_rows",
			Op::Declare {
				..
			} => "declare",
			Op::Assign {
				..
			} => "assign",
			Op::If {
				..
			} => "if",
			Op::While {
				..
			} => "while",
			Op::Return {
				..
			} => "return",
			Op::Output {
				..
			} => "output",
			Op::Export {
				..
			} => "export",
			Op::Transaction {
				..
			} => "transaction",
			Op::Catalog {
				..
			} => "catalog",
		}
	}
}

impl Program {
	pub fn new() -> Self {
		Self {
			stmts: vec![],
			block: vec![],
			open: vec![],
			query_type: QueryType::Table,
		}
	}

	/// Appends a statement to the arena and to the innermost open block.
	pub fn push(&mut self, stmt: Stmt) -> StmtId {
		let id = StmtId(self.stmts.len() as u32);
		self.stmts.push(stmt);
		match self.open.last_mut() {
			Some(block) => block.push(id),
			None => self.block.push(id),
		}
		id
	}

	/// Opens a nested block; statements pushed until the matching
	/// [`Program::end_block`] belong to it.
	pub fn begin_block(&mut self) {
		self.open.push(vec![]);
	}

	pub fn end_block(&mut self) -> Vec<StmtId> {
		self.open.pop().unwrap_or_default()
	}

	pub fn stmt(&self, id: StmtId) -> &Stmt {
		&self.stmts[id.0 as usize]
	}

	pub fn ty(&self, id: StmtId) -> Type {
		self.stmt(id).ty
	}

	pub fn is_scalar(&self, id: StmtId) -> bool {
		self.stmt(id).card == Cardinality::Scalar
	}

	pub fn stmts(&self) -> &[Stmt] {
		&self.stmts
	}

	pub fn block(&self) -> &[StmtId] {
		&self.block
	}

	pub fn len(&self) -> usize {
		self.stmts.len()
	}

	pub fn is_empty(&self) -> bool {
		self.stmts.is_empty()
	}

	/// Number of statements matching `predicate`.
	pub fn count(&self, predicate: impl Fn(&Op) -> bool) -> usize {
		self.stmts.iter().filter(|s| predicate(&s.op)).count()
	}
}

impl Default for Program {
	fn default() -> Self {
		Self::new()
	}
}
