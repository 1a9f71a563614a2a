// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use quarry_type::Type;
use tracing::{debug, instrument, trace};

use crate::{
	CompileError,
	compile::{
		Bindings, Compiler, Relation,
		relation::TID,
		set::SetOperation,
	},
	expression::Expression,
	interface::{FunctionKind, IndexKind, TableId},
	plan::{
		dataflow::StmtId,
		logical::{LogicalOp, LogicalPlan, NodeId},
	},
};

impl<'a> Compiler<'a> {
	/// Compiles one plan node. Nodes with several parents are compiled once;
	/// later references reuse the cached relation.
	#[instrument(name = "rql::compile::node", level = "trace", skip(self, plan), fields(op = plan.node(id).op.name()))]
	pub(crate) fn compile_node(&mut self, plan: &mut LogicalPlan, id: NodeId) -> crate::Result<Relation> {
		let shared = self.parents.get(id.0 as usize).copied().unwrap_or(0) > 1;
		if shared {
			if let Some(relation) = self.refs.get(&id) {
				trace!(node = %id, "reference cache hit");
				return Ok(relation.clone());
			}
		}
		let relation = self.descend(|c| c.dispatch(plan, id))?;
		if shared {
			self.refs.insert(id, relation.clone());
		}
		Ok(relation)
	}

	fn dispatch(&mut self, plan: &mut LogicalPlan, id: NodeId) -> crate::Result<Relation> {
		let node = plan.node(id).clone();
		let alias = node.alias.as_deref();
		let relation = match node.op {
			LogicalOp::Scan {
				table,
				alias: scan_alias,
			} => return self.compile_scan(table, alias.unwrap_or(&scan_alias)),
			LogicalOp::Select {
				input,
			} => {
				let input = self.compile_node(plan, input)?;
				self.compile_select(input, &node.exprs, &node.properties)?
			}
			LogicalOp::Project {
				input,
				order_by,
			} => {
				let input = match input {
					Some(input) => Some(self.compile_node(plan, input)?),
					None => None,
				};
				return self.compile_projection(input.as_ref(), &node.exprs, &order_by, node.distinct, alias, None);
			}
			LogicalOp::Join {
				kind,
				left,
				right,
			} => {
				let left = self.compile_node(plan, left)?;
				let right = self.compile_node(plan, right)?;
				self.compile_join(plan, id, kind, &left, &right)?
			}
			LogicalOp::GroupBy {
				input,
				group_by,
			} => {
				let input = self.compile_node(plan, input)?;
				let relation = self.compile_group_by(&input, &group_by, &node.exprs, alias)?;
				return if node.distinct {
					self.distinct(relation)
				} else {
					Ok(relation)
				};
			}
			LogicalOp::Union {
				left,
				right,
			} => return self.set(plan, SetOperation::Union, left, right, node.distinct, alias),
			LogicalOp::Intersect {
				left,
				right,
			} => return self.set(plan, SetOperation::Intersect, left, right, node.distinct, alias),
			LogicalOp::Except {
				left,
				right,
			} => return self.set(plan, SetOperation::Except, left, right, node.distinct, alias),
			LogicalOp::TopN {
				input,
				limit,
				offset,
			} => self.compile_top_n(plan, input, limit.as_ref(), offset.as_ref())?,
			LogicalOp::Sample {
				input,
				size,
				seed,
			} => {
				let input = self.compile_node(plan, input)?;
				let size = self.compile_scalar(&size)?;
				self.sample(input, size, seed.unwrap_or(0))
			}
			LogicalOp::TableFunction {
				input,
				function,
				args,
			} => {
				let input = match input {
					Some(input) => Some(self.compile_node(plan, input)?),
					None => None,
				};
				let relation = self.compile_table_function(input.as_ref(), &function, &args, alias)?;
				if node.exprs.is_empty() {
					return Ok(relation);
				}
				return self.compile_projection(Some(&relation), &node.exprs, &[], node.distinct, alias, None);
			}
			LogicalOp::Insert {
				table,
				input,
			} => {
				self.mark_update();
				let input = self.compile_node(plan, input)?;
				return self.compile_insert(table, input);
			}
			LogicalOp::Update {
				table,
				input,
			} => {
				self.mark_update();
				let input = self.compile_node(plan, input)?;
				return self.compile_update(table, input, &node.exprs);
			}
			LogicalOp::Delete {
				table,
				input,
			} => {
				self.mark_update();
				let input = match input {
					Some(input) => Some(self.compile_node(plan, input)?),
					None => None,
				};
				return self.compile_delete(table, input);
			}
			LogicalOp::Ddl(operation) => return self.compile_ddl(plan, operation),
		};
		Ok(match alias {
			Some(alias) => relation.aliased(alias),
			None => relation,
		})
	}

	/// Live rows of a table: their row ids, every column and every
	/// persisted index, all projected through the row ids.
	fn compile_scan(&mut self, table: TableId, alias: &str) -> crate::Result<Relation> {
		let table = self.table(table)?;
		let tid = self.program.tid(table.id);
		let mut relation = Relation::new();
		relation.push(alias, TID, tid, Some(table.id));
		for column in &table.columns {
			let bind = self.program.bind(table.id, column.id, column.ty);
			let stmt = self.program.project(tid, bind);
			relation.push(alias, column.name.clone(), stmt, Some(table.id));
		}
		let catalog = self.catalog;
		for index in catalog.indexes(table) {
			let ty = match index.kind {
				IndexKind::Hash => Type::Int8,
				IndexKind::Join {
					..
				} => Type::RowId,
			};
			let bind = self.program.bind_index(table.id, index.id, ty);
			let stmt = self.program.project(tid, bind);
			relation.push(alias, index.column_name(), stmt, Some(table.id));
		}
		trace!(table = %table.name, alias, columns = relation.columns.len(), "scan");
		Ok(relation)
	}

	/// Calls a table function with arguments evaluated over `input`. Its
	/// result columns form the relation, named after `alias` or the
	/// function.
	fn compile_table_function(
		&mut self,
		input: Option<&Relation>,
		function: &str,
		args: &[Expression],
		alias: Option<&str>,
	) -> crate::Result<Relation> {
		let def = self.function(function)?;
		if def.kind != FunctionKind::Table {
			return Err(CompileError::unsupported(format!("{} is not a table function", function)));
		}
		if !def.accepts(args.len()) {
			return Err(CompileError::unsupported(format!("{} called with {} arguments", function, args.len())));
		}
		let bindings = match input {
			Some(input) => Bindings::left(input),
			None => Bindings::none(),
		};
		let mut compiled = Vec::with_capacity(args.len());
		for arg in args {
			compiled.push(self.compile_expression(arg, &bindings)?);
		}
		let types: Vec<Type> = def.columns.iter().map(|c| c.ty).collect();
		let results = self.program.table_call(function, compiled, &types);

		let name = alias.unwrap_or(function);
		let mut relation = Relation::new();
		for (column, stmt) in def.columns.iter().zip(results) {
			relation.push(name, column.name.clone(), stmt, None);
		}
		trace!(function, columns = relation.columns.len(), "table function");
		Ok(relation)
	}

	fn set(
		&mut self,
		plan: &mut LogicalPlan,
		operation: SetOperation,
		left: NodeId,
		right: NodeId,
		distinct: bool,
		alias: Option<&str>,
	) -> crate::Result<Relation> {
		let left = self.compile_node(plan, left)?;
		let right = self.compile_node(plan, right)?;
		self.compile_set(operation, &left, &right, distinct, alias)
	}

	/// Keeps rows `[offset, offset + limit)`. An ordered projection that is
	/// not shared compiles its ordering as bounded top-K passes instead of a
	/// full sort.
	fn compile_top_n(
		&mut self,
		plan: &mut LogicalPlan,
		input: NodeId,
		limit: Option<&Expression>,
		offset: Option<&Expression>,
	) -> crate::Result<Relation> {
		let limit = limit.map(|l| self.compile_scalar(l)).transpose()?;
		let offset = offset.map(|o| self.compile_scalar(o)).transpose()?;

		let child = plan.node(input).clone();
		let shared = self.parents.get(input.0 as usize).copied().unwrap_or(0) > 1;
		let relation = match (&child.op, limit) {
			(
				LogicalOp::Project {
					input: child_input,
					order_by,
				},
				Some(limit),
			) if self.config.topn_pushdown && !order_by.is_empty() && !shared => {
				let bound: StmtId = match offset {
					Some(offset) => self.program.call("add", vec![limit, offset], Type::Int8),
					None => limit,
				};
				let projected = match child_input {
					Some(child_input) => Some(self.compile_node(plan, *child_input)?),
					None => None,
				};
				debug!(node = %input, "top-n pushed into ordering");
				self.descend(|c| {
					c.compile_projection(
						projected.as_ref(),
						&child.exprs,
						order_by,
						child.distinct,
						child.alias.as_deref(),
						Some(bound),
					)
				})?
			}
			_ => self.compile_node(plan, input)?,
		};
		Ok(self.slice(relation, offset, limit))
	}
}
