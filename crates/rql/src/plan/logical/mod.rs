// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Logical relational plans, as produced by the analyzer.
//!
//! Nodes live in an arena and are addressed by [`NodeId`]. A node may be
//! referenced by several parents, which makes the plan a DAG.

mod builder;

use std::fmt::{Display, Formatter};

use quarry_type::Value;
use smallvec::SmallVec;

use crate::{
	expression::{AliasExpression, Expression, SortKey},
	interface::{IndexId, TableId},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl Display for NodeId {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "#{}", self.0)
	}
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LogicalPlan {
	nodes: Vec<LogicalNode>,
	root: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogicalNode {
	pub op: LogicalOp,
	/// Output expressions, or the predicates of selects and joins, or the
	/// assignments of an update (aliased by column name).
	pub exprs: Vec<AliasExpression>,
	/// Relation name the node's output columns are exposed under
	pub alias: Option<String>,
	pub distinct: bool,
	pub properties: Vec<Property>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LogicalOp {
	Scan {
		table: TableId,
		alias: String,
	},
	Select {
		input: NodeId,
	},
	Project {
		input: Option<NodeId>,
		order_by: Vec<SortKey>,
	},
	Join {
		kind: JoinKind,
		left: NodeId,
		right: NodeId,
	},
	GroupBy {
		input: NodeId,
		group_by: Vec<Expression>,
	},
	Union {
		left: NodeId,
		right: NodeId,
	},
	Except {
		left: NodeId,
		right: NodeId,
	},
	Intersect {
		left: NodeId,
		right: NodeId,
	},
	TopN {
		input: NodeId,
		limit: Option<Expression>,
		offset: Option<Expression>,
	},
	Sample {
		input: NodeId,
		size: Expression,
		seed: Option<u64>,
	},
	/// A table-producing function. Its arguments are evaluated over
	/// `input` when present; the node's expressions are projected over the
	/// result columns, exposed under the node alias or the function name.
	TableFunction {
		input: Option<NodeId>,
		function: String,
		args: Vec<Expression>,
	},
	Insert {
		table: TableId,
		input: NodeId,
	},
	Update {
		table: TableId,
		input: NodeId,
	},
	Delete {
		table: TableId,
		input: Option<NodeId>,
	},
	Ddl(DdlOperation),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinKind {
	Inner,
	Left,
	Right,
	Full,
	Semi,
	Anti,
}

/// Annotations placed by the analyzer or optimizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Property {
	/// A persisted hash index covers the equality predicate at `predicate`
	HashIndex {
		predicate: usize,
		index: IndexId,
	},
	/// The predicate at `predicate` follows a foreign key with a join index
	JoinIndex {
		predicate: usize,
		index: IndexId,
	},
}

#[derive(Debug, Clone, PartialEq)]
pub enum DdlOperation {
	Psm {
		statements: Vec<Expression>,
	},
	List {
		left: NodeId,
		right: NodeId,
	},
	Output {
		input: NodeId,
		format: ExportFormat,
	},
	Transaction {
		kind: TransactionKind,
		chain: bool,
		name: Option<String>,
	},
	Catalog {
		operation: String,
		args: Vec<Expression>,
	},
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ExportFormat {
	pub column_separator: String,
	pub row_separator: String,
	pub quote: String,
	pub null: String,
}

impl Default for ExportFormat {
	fn default() -> Self {
		Self {
			column_separator: "|".to_string(),
			row_separator: "\n".to_string(),
			quote: "\"".to_string(),
			null: "null".to_string(),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum TransactionKind {
	Start,
	Commit,
	Rollback,
	Savepoint,
	Release,
}

impl LogicalPlan {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add(&mut self, node: LogicalNode) -> NodeId {
		let id = NodeId(self.nodes.len() as u32);
		self.nodes.push(node);
		id
	}

	pub fn node(&self, id: NodeId) -> &LogicalNode {
		&self.nodes[id.0 as usize]
	}

	pub fn node_mut(&mut self, id: NodeId) -> &mut LogicalNode {
		&mut self.nodes[id.0 as usize]
	}

	pub fn root(&self) -> Option<NodeId> {
		self.root
	}

	pub fn set_root(&mut self, root: NodeId) {
		self.root = Some(root);
	}

	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Number of parents referencing each node, indexed by node.
	pub fn reference_counts(&self) -> Vec<u32> {
		let mut counts = vec![0u32; self.nodes.len()];
		for node in &self.nodes {
			for child in node.op.children() {
				counts[child.0 as usize] += 1;
			}
		}
		counts
	}

	/// Moves the predicates accepted by `leading` to the front of the
	/// node's expression list, keeping the relative order on both sides.
	/// Property predicate positions follow their predicates. Returns the
	/// length of the leading run.
	pub fn reorder_predicates(&mut self, id: NodeId, leading: impl Fn(&Expression) -> bool) -> usize {
		let node = self.node_mut(id);
		let mut front = Vec::new();
		let mut back = Vec::new();
		for (position, expr) in node.exprs.iter().enumerate() {
			if leading(&expr.expression) {
				front.push(position);
			} else {
				back.push(position);
			}
		}
		let run = front.len();
		let order: Vec<usize> = front.into_iter().chain(back).collect();
		if order.iter().enumerate().all(|(i, p)| i == *p) {
			return run;
		}

		let mut taken: Vec<Option<AliasExpression>> = node.exprs.drain(..).map(Some).collect();
		node.exprs = order.iter().filter_map(|p| taken[*p].take()).collect();
		for property in node.properties.iter_mut() {
			let predicate = match property {
				Property::HashIndex {
					predicate,
					..
				}
				| Property::JoinIndex {
					predicate,
					..
				} => predicate,
			};
			if let Some(position) = order.iter().position(|p| *p == *predicate) {
				*predicate = position;
			}
		}
		run
	}
}

impl LogicalNode {
	pub fn new(op: LogicalOp) -> Self {
		Self {
			op,
			exprs: vec![],
			alias: None,
			distinct: false,
			properties: vec![],
		}
	}

	pub fn with_exprs(mut self, exprs: Vec<AliasExpression>) -> Self {
		self.exprs = exprs;
		self
	}

	pub fn is_modification(&self) -> bool {
		matches!(self.op, LogicalOp::Insert { .. } | LogicalOp::Update { .. } | LogicalOp::Delete { .. })
	}

	pub fn is_ddl(&self) -> bool {
		matches!(self.op, LogicalOp::Ddl(_))
	}
}

impl LogicalOp {
	pub fn children(&self) -> SmallVec<[NodeId; 2]> {
		let mut result = SmallVec::new();
		match self {
			LogicalOp::Scan {
				..
			} => {}
			LogicalOp::Select {
				input,
			}
			| LogicalOp::GroupBy {
				input,
				..
			}
			| LogicalOp::TopN {
				input,
				..
			}
			| LogicalOp::Sample {
				input,
				..
			}
			| LogicalOp::Insert {
				input,
				..
			}
			| LogicalOp::Update {
				input,
				..
			} => result.push(*input),
			LogicalOp::Project {
				input,
				..
			}
			| LogicalOp::TableFunction {
				input,
				..
			}
			| LogicalOp::Delete {
				input,
				..
			} => result.extend(*input),
			LogicalOp::Join {
				left,
				right,
				..
			}
			| LogicalOp::Union {
				left,
				right,
			}
			| LogicalOp::Except {
				left,
				right,
			}
			| LogicalOp::Intersect {
				left,
				right,
			} => {
				result.push(*left);
				result.push(*right);
			}
			LogicalOp::Ddl(ddl) => match ddl {
				DdlOperation::List {
					left,
					right,
				} => {
					result.push(*left);
					result.push(*right);
				}
				DdlOperation::Output {
					input,
					..
				} => result.push(*input),
				DdlOperation::Psm {
					..
				}
				| DdlOperation::Transaction {
					..
				}
				| DdlOperation::Catalog {
					..
				} => {}
			},
		}
		result
	}

	pub fn name(&self) -> &'static str {
		match self {
			LogicalOp::Scan {
				..
			} => "scan",
			LogicalOp::Select {
				..
			} => "select",
			LogicalOp::Project {
				..
			} => "project",
			LogicalOp::Join {
				..
			} => "join",
			LogicalOp::GroupBy {
				..
			} => "groupby",
			LogicalOp::Union {
				..
			} => "union",
			LogicalOp::Except {
				..
			} => "except",
			LogicalOp::Intersect {
				..
			} => "intersect",
			LogicalOp::TopN {
				..
			} => "topn",
			LogicalOp::Sample {
				..
			} => "sample",
			LogicalOp::TableFunction {
				..
			} => "table_function",
			LogicalOp::Insert {
				..
			} => "insert",
			LogicalOp::Update {
				..
			} => "update",
			LogicalOp::Delete {
				..
			} => "delete",
			LogicalOp::Ddl(_) => "ddl",
		}
	}
}

impl ExportFormat {
	pub fn quote(&self, value: &Value) -> String {
		match value {
			Value::Undefined => self.null.clone(),
			Value::Utf8(s) => format!("{}{}{}", self.quote, s, self.quote),
			value => value.to_string(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::expression::CompareOp;

	#[test]
	fn test_reference_counts_of_shared_node() {
		let mut plan = LogicalPlan::new();
		let scan = plan.scan(TableId(1), "t");
		let union = plan.union(scan, scan);
		plan.set_root(union);
		assert_eq!(plan.reference_counts(), vec![2, 0]);
	}

	#[test]
	fn test_reorder_predicates_is_stable_and_remaps_properties() {
		let mut plan = LogicalPlan::new();
		let l = plan.scan(TableId(1), "l");
		let r = plan.scan(TableId(2), "r");
		let join = plan.join(
			JoinKind::Inner,
			l,
			r,
			vec![
				Expression::compare(
					Expression::column("l", "x"),
					CompareOp::LessThan,
					Expression::column("r", "x"),
				),
				Expression::equal(Expression::column("l", "a"), Expression::column("r", "a")),
				Expression::equal(Expression::column("l", "b"), Expression::column("r", "b")),
			],
		);
		plan.node_mut(join).properties.push(Property::HashIndex {
			predicate: 2,
			index: IndexId(9),
		});

		let run = plan.reorder_predicates(join, |e| matches!(e, Expression::Compare(c) if c.as_column_equality().is_some()));
		assert_eq!(run, 2);

		let names: Vec<String> = plan.node(join).exprs.iter().map(|e| e.expression.to_string()).collect();
		assert_eq!(names, vec!["l.a = r.a", "l.b = r.b", "l.x < r.x"]);
		assert_eq!(
			plan.node(join).properties,
			vec![Property::HashIndex {
				predicate: 1,
				index: IndexId(9)
			}]
		);
	}

	#[test]
	fn test_export_quote() {
		let format = ExportFormat::default();
		assert_eq!(format.quote(&Value::Undefined), "null");
		assert_eq!(format.quote(&Value::utf8("x")), "\"x\"");
		assert_eq!(format.quote(&Value::int4(3)), "3");
	}
}
