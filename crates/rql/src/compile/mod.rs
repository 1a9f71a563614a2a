// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Lowering of logical plans into dataflow programs.
//!
//! [`Compiler`] is the context threaded through every compilation step. It
//! owns the program under construction, the reference cache for plan nodes
//! with several parents, the scope stack for trigger pseudo-relations and
//! procedural variables, and the recursion depth counter.

mod config;
mod ddl;
mod dispatch;
mod dml;
mod expression;
mod group;
mod join;
mod order;
mod predicate;
mod procedural;
mod relation;
mod set;
#[cfg(test)]
mod testing;

use std::collections::HashMap;

pub use config::{CompilerBuilder, CompilerConfig};
use indexmap::IndexMap;
use quarry_type::{Type, Value};
pub use relation::{RelColumn, Relation};
use tracing::{debug, instrument};

use crate::{
	error::{BindErrorKind, CompileError},
	interface::{Catalog, FunctionDef, IndexDef, KeyDef, KeyId, TableDef, TableId},
	plan::{
		dataflow::{OutputColumn, Program, QueryType, StmtId},
		logical::{LogicalPlan, NodeId},
	},
};

pub(crate) use expression::Bindings;
pub(crate) use group::GroupState;

/// Compiles `plan` with the default configuration.
pub fn compile(catalog: &dyn Catalog, plan: &mut LogicalPlan) -> crate::Result<Program> {
	Compiler::new(catalog, CompilerConfig::default()).compile(plan)
}

pub struct Compiler<'a> {
	catalog: &'a dyn Catalog,
	config: CompilerConfig,
	program: Program,
	/// Compiled relations of nodes referenced by more than one parent
	refs: HashMap<NodeId, Relation>,
	parents: Vec<u32>,
	depth: usize,
	labels: usize,
	scopes: Vec<Scope>,
	/// Foreign keys whose referential actions are being expanded
	cascades: Vec<KeyId>,
	/// Depth of DML compiled on behalf of another statement
	nesting: usize,
}

/// Names visible to expressions besides the bound relations.
#[derive(Debug, Default)]
pub(crate) struct Scope {
	pub relation: Option<Relation>,
	pub variables: IndexMap<String, Type>,
}

impl<'a> Compiler<'a> {
	pub fn new(catalog: &'a dyn Catalog, config: CompilerConfig) -> Self {
		Self {
			catalog,
			config,
			program: Program::new(),
			refs: HashMap::new(),
			parents: vec![],
			depth: 0,
			labels: 0,
			scopes: vec![Scope::default()],
			cascades: vec![],
			nesting: 0,
		}
	}

	pub fn config(&self) -> &CompilerConfig {
		&self.config
	}

	#[instrument(name = "rql::compile", level = "debug", skip(self, plan))]
	pub fn compile(mut self, plan: &mut LogicalPlan) -> crate::Result<Program> {
		let Some(root) = plan.root() else {
			return Err(CompileError::unsupported("plan without root"));
		};
		self.parents = plan.reference_counts();
		self.compile_statement(plan, root)?;
		debug!(statements = self.program.len(), query_type = ?self.program.query_type, "compiled");
		Ok(self.program)
	}

	/// Compiles a node as a statement of its own: queries emit their result.
	pub(crate) fn compile_statement(&mut self, plan: &mut LogicalPlan, id: NodeId) -> crate::Result<Relation> {
		let node = plan.node(id);
		let is_query = !node.is_modification() && !node.is_ddl();
		let relation = self.compile_node(plan, id)?;
		if is_query && self.program.query_type == QueryType::Table {
			let columns = output_columns(&relation);
			self.program.output(columns);
		}
		Ok(relation)
	}

	/// Compiles a plan embedded in a procedural statement. It gets its own
	/// reference cache.
	pub(crate) fn compile_nested(&mut self, mut plan: LogicalPlan) -> crate::Result<Relation> {
		let Some(root) = plan.root() else {
			return Err(CompileError::unsupported("nested plan without root"));
		};
		let refs = std::mem::take(&mut self.refs);
		let parents = std::mem::replace(&mut self.parents, plan.reference_counts());
		self.nesting += 1;
		let result = self.compile_statement(&mut plan, root);
		self.nesting -= 1;
		self.parents = parents;
		self.refs = refs;
		result
	}

	/// Runs `f` one level deeper, failing once the configured depth is
	/// exceeded.
	pub(crate) fn descend<T>(&mut self, f: impl FnOnce(&mut Self) -> crate::Result<T>) -> crate::Result<T> {
		if self.depth >= self.config.max_depth {
			return Err(CompileError::RecursionLimitExceeded {
				limit: self.config.max_depth,
			});
		}
		self.depth += 1;
		let result = f(self);
		self.depth -= 1;
		result
	}

	pub(crate) fn label(&mut self) -> String {
		self.labels += 1;
		format!("L{}", self.labels)
	}

	pub(crate) fn push_scope(&mut self, relation: Option<Relation>) {
		self.scopes.push(Scope {
			relation,
			variables: IndexMap::new(),
		});
	}

	pub(crate) fn pop_scope(&mut self) {
		if self.scopes.len() > 1 {
			self.scopes.pop();
		}
	}

	pub(crate) fn declare_variable(&mut self, name: &str, ty: Type) {
		if let Some(scope) = self.scopes.last_mut() {
			scope.variables.insert(name.to_string(), ty);
		}
	}

	pub(crate) fn variable(&self, name: &str) -> Option<Type> {
		self.scopes.iter().rev().find_map(|s| s.variables.get(name).copied())
	}

	/// Upgrades a plain query to an update statement.
	pub(crate) fn mark_update(&mut self) {
		if self.program.query_type == QueryType::Table {
			self.program.query_type = QueryType::Update;
		}
	}

	pub(crate) fn table(&self, id: TableId) -> crate::Result<&'a TableDef> {
		self.catalog.table(id).ok_or_else(|| CompileError::bind(BindErrorKind::Table, id.to_string()))
	}

	pub(crate) fn key(&self, id: KeyId) -> crate::Result<&'a KeyDef> {
		self.catalog.key(id).ok_or_else(|| CompileError::bind(BindErrorKind::Index, format!("key {}", id)))
	}

	pub(crate) fn index(&self, id: crate::interface::IndexId) -> crate::Result<&'a IndexDef> {
		self.catalog.index(id).ok_or_else(|| CompileError::bind(BindErrorKind::Index, id.to_string()))
	}

	pub(crate) fn function(&self, name: &str) -> crate::Result<&'a FunctionDef> {
		self.catalog.function(name).ok_or_else(|| CompileError::bind(BindErrorKind::Function, name))
	}

	pub(crate) fn int8(&mut self, value: i64) -> StmtId {
		self.program.constant(Value::Int8(value))
	}

	pub(crate) fn boolean(&mut self, value: bool) -> StmtId {
		self.program.constant(Value::Boolean(value))
	}

	/// Number of values in `column` as a scalar.
	pub(crate) fn count(&mut self, column: StmtId) -> StmtId {
		self.program.aggregate(column, None, crate::expression::AggregateFunction::CountAll)
	}

	/// Scalar `true` when `column` has at least one value.
	pub(crate) fn not_empty(&mut self, column: StmtId) -> StmtId {
		let count = self.count(column);
		let zero = self.int8(0);
		self.program.call("gt", vec![count, zero], Type::Boolean)
	}

	/// Repeats scalar `value` once per row of `like`; vectors pass through.
	pub(crate) fn broadcast(&mut self, value: StmtId, like: Option<StmtId>) -> StmtId {
		match like {
			Some(like) if self.program.is_scalar(value) && !self.program.is_scalar(like) => {
				self.program.const_column(value, like)
			}
			_ => value,
		}
	}
}

pub(crate) fn output_columns(relation: &Relation) -> Vec<OutputColumn> {
	relation.visible()
		.map(|c| OutputColumn {
			relation: c.relation.clone(),
			name: c.name.clone(),
			stmt: c.stmt,
		})
		.collect()
}
