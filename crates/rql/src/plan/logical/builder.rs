// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Convenience constructors used by the analyzer and by tests.

use crate::{
	expression::{AliasExpression, Expression, SortKey},
	interface::TableId,
	plan::logical::{DdlOperation, ExportFormat, JoinKind, LogicalNode, LogicalOp, LogicalPlan, NodeId, TransactionKind},
};

fn unnamed(exprs: Vec<Expression>) -> Vec<AliasExpression> {
	exprs.into_iter().map(AliasExpression::unnamed).collect()
}

impl LogicalPlan {
	pub fn scan(&mut self, table: TableId, alias: impl Into<String>) -> NodeId {
		self.add(LogicalNode::new(LogicalOp::Scan {
			table,
			alias: alias.into(),
		}))
	}

	pub fn select(&mut self, input: NodeId, predicates: Vec<Expression>) -> NodeId {
		self.add(LogicalNode::new(LogicalOp::Select {
			input,
		})
		.with_exprs(unnamed(predicates)))
	}

	pub fn project(&mut self, input: Option<NodeId>, exprs: Vec<AliasExpression>) -> NodeId {
		self.add(LogicalNode::new(LogicalOp::Project {
			input,
			order_by: vec![],
		})
		.with_exprs(exprs))
	}

	pub fn project_ordered(&mut self, input: NodeId, exprs: Vec<AliasExpression>, order_by: Vec<SortKey>) -> NodeId {
		self.add(LogicalNode::new(LogicalOp::Project {
			input: Some(input),
			order_by,
		})
		.with_exprs(exprs))
	}

	pub fn table_function(
		&mut self,
		input: Option<NodeId>,
		function: impl Into<String>,
		args: Vec<Expression>,
		exprs: Vec<AliasExpression>,
	) -> NodeId {
		self.add(LogicalNode::new(LogicalOp::TableFunction {
			input,
			function: function.into(),
			args,
		})
		.with_exprs(exprs))
	}

	pub fn join(&mut self, kind: JoinKind, left: NodeId, right: NodeId, predicates: Vec<Expression>) -> NodeId {
		self.add(LogicalNode::new(LogicalOp::Join {
			kind,
			left,
			right,
		})
		.with_exprs(unnamed(predicates)))
	}

	pub fn group_by(&mut self, input: NodeId, group_by: Vec<Expression>, exprs: Vec<AliasExpression>) -> NodeId {
		self.add(LogicalNode::new(LogicalOp::GroupBy {
			input,
			group_by,
		})
		.with_exprs(exprs))
	}

	pub fn union(&mut self, left: NodeId, right: NodeId) -> NodeId {
		self.add(LogicalNode::new(LogicalOp::Union {
			left,
			right,
		}))
	}

	pub fn except(&mut self, left: NodeId, right: NodeId) -> NodeId {
		self.add(LogicalNode::new(LogicalOp::Except {
			left,
			right,
		}))
	}

	pub fn intersect(&mut self, left: NodeId, right: NodeId) -> NodeId {
		self.add(LogicalNode::new(LogicalOp::Intersect {
			left,
			right,
		}))
	}

	pub fn top_n(&mut self, input: NodeId, limit: Option<Expression>, offset: Option<Expression>) -> NodeId {
		self.add(LogicalNode::new(LogicalOp::TopN {
			input,
			limit,
			offset,
		}))
	}

	pub fn sample(&mut self, input: NodeId, size: Expression, seed: Option<u64>) -> NodeId {
		self.add(LogicalNode::new(LogicalOp::Sample {
			input,
			size,
			seed,
		}))
	}

	pub fn insert(&mut self, table: TableId, input: NodeId) -> NodeId {
		self.add(LogicalNode::new(LogicalOp::Insert {
			table,
			input,
		}))
	}

	/// `assignments` pairs a column name with its new value.
	pub fn update(&mut self, table: TableId, input: NodeId, assignments: Vec<(&str, Expression)>) -> NodeId {
		let exprs = assignments.into_iter().map(|(column, value)| AliasExpression::new(column, value)).collect();
		self.add(LogicalNode::new(LogicalOp::Update {
			table,
			input,
		})
		.with_exprs(exprs))
	}

	pub fn delete(&mut self, table: TableId, input: Option<NodeId>) -> NodeId {
		self.add(LogicalNode::new(LogicalOp::Delete {
			table,
			input,
		}))
	}

	pub fn psm(&mut self, statements: Vec<Expression>) -> NodeId {
		self.add(LogicalNode::new(LogicalOp::Ddl(DdlOperation::Psm {
			statements,
		})))
	}

	pub fn list(&mut self, left: NodeId, right: NodeId) -> NodeId {
		self.add(LogicalNode::new(LogicalOp::Ddl(DdlOperation::List {
			left,
			right,
		})))
	}

	pub fn output(&mut self, input: NodeId, format: ExportFormat) -> NodeId {
		self.add(LogicalNode::new(LogicalOp::Ddl(DdlOperation::Output {
			input,
			format,
		})))
	}

	pub fn transaction(&mut self, kind: TransactionKind, chain: bool, name: Option<String>) -> NodeId {
		self.add(LogicalNode::new(LogicalOp::Ddl(DdlOperation::Transaction {
			kind,
			chain,
			name,
		})))
	}

	pub fn catalog(&mut self, operation: impl Into<String>, args: Vec<Expression>) -> NodeId {
		self.add(LogicalNode::new(LogicalOp::Ddl(DdlOperation::Catalog {
			operation: operation.into(),
			args,
		})))
	}

	pub fn set_distinct(&mut self, id: NodeId) -> NodeId {
		self.node_mut(id).distinct = true;
		id
	}

	pub fn set_alias(&mut self, id: NodeId, alias: impl Into<String>) -> NodeId {
		self.node_mut(id).alias = Some(alias.into());
		id
	}

	/// Sets `root` as the plan root and returns the finished plan.
	pub fn build(mut self, root: NodeId) -> LogicalPlan {
		self.set_root(root);
		self
	}
}
