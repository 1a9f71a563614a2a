// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use quarry_type::{Type, Value};
use tracing::{instrument, trace};

use crate::{
	compile::{Bindings, Compiler, Relation},
	error::CompileError,
	expression::{AggregateExpression, AggregateFunction, AliasExpression, Expression},
	plan::dataflow::{GroupRef, Program, StmtId},
};

/// Grouping triple plus the key columns folded into it.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GroupState {
	/// Group id per input row
	pub ids: StmtId,
	/// Representative input row per group
	pub extent: StmtId,
	/// Rows per group
	pub counts: StmtId,
	pub keys: Vec<StmtId>,
}

/// Incremental grouping: `Empty`, then `Partial` while key columns are
/// folded in, then `Closed` for good.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Grouping {
	Empty,
	Partial(GroupState),
	Closed(GroupState),
}

impl GroupState {
	pub fn reference(&self) -> GroupRef {
		GroupRef {
			ids: self.ids,
			extent: self.extent,
		}
	}
}

impl Grouping {
	/// Folds one more key column; `close` makes it the last one.
	pub fn fold(self, program: &mut Program, column: StmtId, close: bool) -> crate::Result<Grouping> {
		let (previous, mut keys) = match self {
			Grouping::Empty => (None, vec![]),
			Grouping::Partial(state) => (Some(state.ids), state.keys),
			Grouping::Closed(_) => return Err(CompileError::unsupported("fold into a closed grouping")),
		};
		let (ids, extent, counts) = program.group(column, previous, close);
		keys.push(column);
		let state = GroupState {
			ids,
			extent,
			counts,
			keys,
		};
		Ok(if close {
			Grouping::Closed(state)
		} else {
			Grouping::Partial(state)
		})
	}

	pub fn into_state(self) -> Option<GroupState> {
		match self {
			Grouping::Empty => None,
			Grouping::Partial(state) | Grouping::Closed(state) => Some(state),
		}
	}
}

impl<'a> Compiler<'a> {
	/// Groups by the given vector columns, skipping scalars. Returns `None`
	/// when no vector column remains.
	pub(crate) fn group_columns(&mut self, columns: &[StmtId]) -> crate::Result<Option<GroupState>> {
		let vectors: Vec<StmtId> = columns.iter().copied().filter(|c| !self.program.is_scalar(*c)).collect();
		let mut grouping = Grouping::Empty;
		for (i, column) in vectors.iter().enumerate() {
			grouping = grouping.fold(&mut self.program, *column, i + 1 == vectors.len())?;
		}
		Ok(grouping.into_state())
	}

	/// Groups a relation over all its visible columns.
	pub(crate) fn group_relation(&mut self, relation: &Relation) -> crate::Result<Option<GroupState>> {
		let columns: Vec<StmtId> = relation.visible().map(|c| c.stmt).collect();
		self.group_columns(&columns)
	}

	/// One row per distinct combination of visible values; hidden columns
	/// follow the representative rows.
	pub(crate) fn distinct(&mut self, relation: Relation) -> crate::Result<Relation> {
		if relation.is_scalar(&self.program) {
			return Ok(relation);
		}
		match self.group_relation(&relation)? {
			Some(group) => Ok(relation.project(&mut self.program, group.extent)),
			None => Ok(relation),
		}
	}

	#[instrument(name = "rql::compile::group_by", level = "trace", skip_all)]
	pub(crate) fn compile_group_by(
		&mut self,
		input: &Relation,
		group_by: &[Expression],
		exprs: &[AliasExpression],
		alias: Option<&str>,
	) -> crate::Result<Relation> {
		let mut keys = Vec::with_capacity(group_by.len());
		for expr in group_by {
			keys.push(self.compile_expression(expr, &Bindings::left(input))?);
		}
		let group = self.group_columns(&keys)?;
		trace!(keys = keys.len(), grouped = group.is_some(), "grouping");

		let label = match alias {
			Some(alias) => alias.to_string(),
			None => self.label(),
		};
		let bindings = Bindings::grouped(input, group.as_ref());
		let mut result = Relation::new();
		for expr in exprs {
			let stmt = self.compile_expression(&expr.expression, &bindings)?;
			let relation = match (&expr.expression, alias) {
				(Expression::Column(column), None) if expr.alias.is_none() => {
					input.find(column.relation.as_deref(), &column.name)?.map(|c| c.relation.clone())
				}
				_ => None,
			};
			result.push(relation.unwrap_or_else(|| label.clone()), expr.name(), stmt, None);
		}
		// scalar outputs share the row count of the groups
		if let Some(group) = &group {
			for column in result.columns.iter_mut() {
				if self.program.is_scalar(column.stmt) {
					column.stmt = self.program.const_column(column.stmt, group.extent);
				}
			}
		}
		Ok(result)
	}

	#[instrument(name = "rql::compile::aggregate", level = "trace", skip_all, fields(function = aggregate.function.name()))]
	pub(crate) fn compile_aggregate(
		&mut self,
		aggregate: &AggregateExpression,
		bindings: &Bindings,
	) -> crate::Result<StmtId> {
		if aggregate.window.is_some() {
			return self.compile_window_aggregate(aggregate, bindings);
		}
		let group = bindings.group;
		let rows = bindings.ungrouped();
		let mut function = aggregate.function;

		let input = match aggregate.args.first() {
			Some(arg) => {
				let value = self.compile_expression(arg, &rows)?;
				let like = group.map(|g| g.ids).or_else(|| rows.anchor(&self.program));
				self.broadcast(value, like)
			}
			None => {
				function = AggregateFunction::CountAll;
				self.count_all_input(bindings)
			}
		};
		if function == AggregateFunction::Count && aggregate.args.is_empty() {
			function = AggregateFunction::CountAll;
		}

		if matches!(function, AggregateFunction::Sum | AggregateFunction::Avg) {
			let ty = self.program.ty(input);
			if ty != Type::Undefined && !ty.is_numeric() {
				return Err(CompileError::incompatible(function.name(), ty, ty));
			}
		}

		if !aggregate.distinct {
			return Ok(self.program.aggregate(input, group.map(GroupState::reference), function));
		}

		// distinct: one input row per distinct (group, value)
		match group {
			Some(group) => {
				let (_, extent, _) = self.program.group(input, Some(group.ids), true);
				let values = self.program.project(extent, input);
				let ids = self.program.project(extent, group.ids);
				Ok(self.program.aggregate(
					values,
					Some(GroupRef {
						ids,
						extent: group.extent,
					}),
					function,
				))
			}
			None => {
				if self.program.is_scalar(input) {
					return Ok(self.program.aggregate(input, None, function));
				}
				let (_, extent, _) = self.program.group(input, None, true);
				let values = self.program.project(extent, input);
				Ok(self.program.aggregate(values, None, function))
			}
		}
	}

	/// `count(*)` counts rows of: the first grouping column, else the first
	/// column of the input, else a single constant row.
	fn count_all_input(&mut self, bindings: &Bindings) -> StmtId {
		if let Some(group) = bindings.group {
			if let Some(first) = group.keys.first() {
				return *first;
			}
		}
		if let Some(left) = bindings.left {
			if let Some(anchor) = left.anchor(&self.program) {
				return anchor;
			}
		}
		self.program.constant(Value::Int8(0))
	}
}
