// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use quarry_type::Type;
use tracing::{debug, instrument};

use crate::{
	compile::{Bindings, Compiler, Relation},
	error::CompileError,
	expression::{AggregateExpression, AggregateFunction, AliasExpression, CallExpression, Expression, SortKey, WindowSpec},
	interface::FunctionDef,
	plan::dataflow::{SortSpec, StmtId},
};

const ASCENDING: SortSpec = SortSpec {
	asc: true,
	nulls_first: true,
};

fn sort_spec(key: &SortKey) -> SortSpec {
	SortSpec {
		asc: key.asc,
		nulls_first: key.nulls_first,
	}
}

impl<'a> Compiler<'a> {
	/// Folds sort columns left to right: the first yields a stable base
	/// order, each later one refines it within tie groups. A scalar key
	/// ends the fold. Returns (permutation, tie groups).
	pub(crate) fn order_columns(&mut self, keys: &[(StmtId, SortSpec)]) -> Option<(StmtId, StmtId)> {
		let mut state: Option<(StmtId, StmtId)> = None;
		for (column, sort) in keys {
			if self.program.is_scalar(*column) {
				break;
			}
			state = Some(match state {
				None => self.program.order(*column, *sort),
				Some((order, groups)) => self.program.reorder(*column, *sort, order, groups),
			});
		}
		state
	}

	/// Compiles a projection, optionally ordered and distinct. With a
	/// `bound` (offset + limit of an enclosing top-N) the ordering runs as
	/// bounded top-K passes before the survivors are sorted.
	#[instrument(name = "rql::compile::project", level = "trace", skip_all, fields(bounded = bound.is_some()))]
	pub(crate) fn compile_projection(
		&mut self,
		input: Option<&Relation>,
		exprs: &[AliasExpression],
		order_by: &[SortKey],
		distinct: bool,
		alias: Option<&str>,
		bound: Option<StmtId>,
	) -> crate::Result<Relation> {
		let empty = Relation::new();
		let input = input.unwrap_or(&empty);
		let label = match alias {
			Some(alias) => alias.to_string(),
			None => self.label(),
		};
		let bindings = Bindings::left(input);
		let anchor = input.anchor(&self.program);

		let mut output = Relation::new();
		for expr in exprs {
			let stmt = self.compile_expression(&expr.expression, &bindings)?;
			let stmt = self.broadcast(stmt, anchor);
			let (relation, source) = match (&expr.expression, alias) {
				(Expression::Column(column), None) if expr.alias.is_none() => input
					.find(column.relation.as_deref(), &column.name)?
					.map(|c| (c.relation.clone(), c.source))
					.unwrap_or((label.clone(), None)),
				_ => (label.clone(), None),
			};
			output.push(relation, expr.name(), stmt, source);
		}

		if order_by.is_empty() {
			return if distinct {
				self.distinct(output)
			} else {
				Ok(output)
			};
		}

		// sort keys travel as hidden columns so they survive DISTINCT
		let mut keys = Vec::with_capacity(order_by.len());
		for (i, key) in order_by.iter().enumerate() {
			let stmt = self.compile_expression(&key.expression, &Bindings::pair(input, &output))?;
			let stmt = self.broadcast(stmt, anchor);
			keys.push((format!("%sort{}", i), stmt, sort_spec(key)));
		}
		for (name, stmt, _) in &keys {
			output.push(label.clone(), name.clone(), *stmt, None);
		}

		if let Some(bound) = bound {
			let vector_keys: Vec<(StmtId, SortSpec)> = keys
				.iter()
				.map(|(_, stmt, sort)| (*stmt, *sort))
				.take_while(|(stmt, _)| !self.program.is_scalar(*stmt))
				.collect();
			let mut candidates = None;
			let mut groups = None;
			for (i, (column, sort)) in vector_keys.iter().enumerate() {
				let last = i + 1 == vector_keys.len();
				let (survivors, ranks) =
					self.program.limit(*column, candidates, groups, bound, *sort, !last || distinct, distinct);
				candidates = Some(survivors);
				groups = Some(ranks);
			}
			debug!(passes = vector_keys.len(), distinct, "bounded top-k ordering");
			if let Some(candidates) = candidates {
				output = output.project(&mut self.program, candidates);
			}
		}

		if distinct {
			output = self.distinct(output)?;
		}

		let sorted: Vec<(StmtId, SortSpec)> = keys
			.iter()
			.map(|(name, _, sort)| {
				let stmt = output.columns.iter().find(|c| &c.name == name).map(|c| c.stmt);
				(stmt, *sort)
			})
			.filter_map(|(stmt, sort)| stmt.map(|s| (s, sort)))
			.collect();
		if let Some((permutation, _)) = self.order_columns(&sorted) {
			output = output.project(&mut self.program, permutation);
		}
		output.columns.retain(|c| !c.name.starts_with("%sort"));
		Ok(output)
	}

	/// Keeps rows `[offset, offset + limit)`; a NULL limit is unbounded.
	pub(crate) fn slice(&mut self, relation: Relation, offset: Option<StmtId>, limit: Option<StmtId>) -> Relation {
		if offset.is_none() && limit.is_none() {
			return relation;
		}
		let Some(anchor) = relation.anchor(&self.program) else {
			return relation;
		};
		let rows = self.program.mirror(anchor);
		let ids = self.program.slice(rows, offset, limit);
		relation.project(&mut self.program, ids)
	}

	pub(crate) fn sample(&mut self, relation: Relation, size: StmtId, seed: u64) -> Relation {
		let Some(anchor) = relation.anchor(&self.program) else {
			return relation;
		};
		let ids = self.program.sample(anchor, size, seed);
		relation.project(&mut self.program, ids)
	}

	/// Compiles a scalar operand of TOP-N or SAMPLE.
	pub(crate) fn compile_scalar(&mut self, expr: &Expression) -> crate::Result<StmtId> {
		let stmt = self.compile_expression(expr, &Bindings::none())?;
		if !self.program.is_scalar(stmt) {
			return Err(CompileError::unsupported(format!("'{}' is not a scalar", expr)));
		}
		self.cast(stmt, Type::Int8)
	}

	pub(crate) fn compile_window_call(
		&mut self,
		call: &CallExpression,
		def: &FunctionDef,
		bindings: &Bindings,
	) -> crate::Result<StmtId> {
		if !def.accepts(call.args.len()) {
			return Err(CompileError::unsupported(format!(
				"{} called with {} arguments",
				call.function,
				call.args.len()
			)));
		}
		let mut args = Vec::with_capacity(call.args.len());
		for arg in &call.args {
			args.push(self.compile_expression(arg, bindings)?);
		}
		let types: Vec<Type> = args.iter().map(|a| self.program.ty(*a)).collect();
		let ty = def.return_type(&types).ok_or_else(|| {
			let first = types.first().copied().unwrap_or(Type::Undefined);
			CompileError::incompatible(&call.function, first, first)
		})?;
		let window = call.window.clone().unwrap_or_default();
		self.window(&call.function, args, &window, bindings, ty)
	}

	pub(crate) fn compile_window_aggregate(
		&mut self,
		aggregate: &AggregateExpression,
		bindings: &Bindings,
	) -> crate::Result<StmtId> {
		if aggregate.distinct {
			return Err(CompileError::unsupported("distinct window aggregate"));
		}
		let input = match aggregate.args.first() {
			Some(arg) => self.compile_expression(arg, bindings)?,
			None => self.int8(1),
		};
		let function = match (aggregate.function, aggregate.args.is_empty()) {
			(AggregateFunction::Count, true) => AggregateFunction::CountAll,
			(function, _) => function,
		};
		let ty = function.return_type(self.program.ty(input));
		let window = aggregate.window.clone().unwrap_or_default();
		self.window(function.window_name(), vec![input], &window, bindings, ty)
	}

	/// Window evaluation: partition keys then ordering keys are folded into
	/// one ordering; the permutation, the partition ids and the peer ids are
	/// appended as trailing arguments.
	fn window(
		&mut self,
		function: &str,
		args: Vec<StmtId>,
		window: &WindowSpec,
		bindings: &Bindings,
		ty: Type,
	) -> crate::Result<StmtId> {
		let anchor = bindings
			.anchor(&self.program)
			.ok_or_else(|| CompileError::unsupported(format!("window function {} without input rows", function)))?;

		let mut keys = Vec::with_capacity(window.partition_by.len() + window.order_by.len());
		for expr in &window.partition_by {
			let column = self.compile_expression(expr, bindings)?;
			if !self.program.is_scalar(column) {
				keys.push((column, ASCENDING));
			}
		}
		let partition = self.order_columns(&keys).map(|(_, groups)| groups);

		for key in &window.order_by {
			let column = self.compile_expression(&key.expression, bindings)?;
			keys.push((column, sort_spec(key)));
		}
		let ordered = self.order_columns(&keys);

		let (permutation, groups) = match ordered {
			Some(ordered) => ordered,
			None => {
				let permutation = self.program.mirror(anchor);
				let zero = self.int8(0);
				let groups = self.program.const_column(zero, permutation);
				(permutation, groups)
			}
		};
		let partition = match partition {
			Some(partition) => partition,
			None => {
				let zero = self.int8(0);
				self.program.const_column(zero, permutation)
			}
		};
		// without ordering keys every row of a partition is a peer
		let peers = if window.order_by.is_empty() {
			partition
		} else {
			groups
		};

		let mut call_args: Vec<StmtId> = args.into_iter().map(|a| self.broadcast(a, Some(anchor))).collect();
		call_args.extend([permutation, partition, peers]);
		Ok(self.program.call(function, call_args, ty))
	}
}
