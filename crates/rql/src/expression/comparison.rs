// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	cmp::Ordering,
	fmt::{Display, Formatter},
};

use serde::{Deserialize, Serialize};

use crate::expression::{ColumnExpression, Expression};

#[derive(Debug, Clone, PartialEq)]
pub struct CompareExpression {
	pub comparison: Comparison,
	/// Negates the comparison; NULL operands still yield no match
	pub anti: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Comparison {
	Binary {
		left: Box<Expression>,
		op: CompareOp,
		right: Box<Expression>,
	},
	Range {
		value: Box<Expression>,
		low: Box<Expression>,
		high: Box<Expression>,
		low_inclusive: bool,
		high_inclusive: bool,
	},
	In {
		value: Box<Expression>,
		list: Vec<Expression>,
	},
	/// Disjunction of two conjunctions
	Or {
		left: Vec<Expression>,
		right: Vec<Expression>,
	},
	/// A boolean filter function applied to arguments from both sides
	Filter {
		function: String,
		left: Vec<Expression>,
		right: Vec<Expression>,
	},
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOp {
	Equal,
	NotEqual,
	LessThan,
	LessThanEqual,
	GreaterThan,
	GreaterThanEqual,
}

impl CompareOp {
	pub fn function_name(&self) -> &'static str {
		match self {
			CompareOp::Equal => "eq",
			CompareOp::NotEqual => "ne",
			CompareOp::LessThan => "lt",
			CompareOp::LessThanEqual => "le",
			CompareOp::GreaterThan => "gt",
			CompareOp::GreaterThanEqual => "ge",
		}
	}

	pub fn negate(&self) -> CompareOp {
		match self {
			CompareOp::Equal => CompareOp::NotEqual,
			CompareOp::NotEqual => CompareOp::Equal,
			CompareOp::LessThan => CompareOp::GreaterThanEqual,
			CompareOp::LessThanEqual => CompareOp::GreaterThan,
			CompareOp::GreaterThan => CompareOp::LessThanEqual,
			CompareOp::GreaterThanEqual => CompareOp::LessThan,
		}
	}

	/// The operator that holds with the operands exchanged.
	pub fn swap(&self) -> CompareOp {
		match self {
			CompareOp::LessThan => CompareOp::GreaterThan,
			CompareOp::LessThanEqual => CompareOp::GreaterThanEqual,
			CompareOp::GreaterThan => CompareOp::LessThan,
			CompareOp::GreaterThanEqual => CompareOp::LessThanEqual,
			op => *op,
		}
	}

	pub fn symbol(&self) -> &'static str {
		match self {
			CompareOp::Equal => "=",
			CompareOp::NotEqual => "<>",
			CompareOp::LessThan => "<",
			CompareOp::LessThanEqual => "<=",
			CompareOp::GreaterThan => ">",
			CompareOp::GreaterThanEqual => ">=",
		}
	}

	/// Whether the operator accepts operands ordered as `ordering`.
	pub fn holds(&self, ordering: Ordering) -> bool {
		match self {
			CompareOp::Equal => ordering.is_eq(),
			CompareOp::NotEqual => ordering.is_ne(),
			CompareOp::LessThan => ordering.is_lt(),
			CompareOp::LessThanEqual => ordering.is_le(),
			CompareOp::GreaterThan => ordering.is_gt(),
			CompareOp::GreaterThanEqual => ordering.is_ge(),
		}
	}
}

impl Comparison {
	pub fn operands(&self) -> Vec<&Expression> {
		match self {
			Comparison::Binary {
				left,
				right,
				..
			} => vec![left.as_ref(), right.as_ref()],
			Comparison::Range {
				value,
				low,
				high,
				..
			} => vec![value.as_ref(), low.as_ref(), high.as_ref()],
			Comparison::In {
				value,
				list,
			} => std::iter::once(value.as_ref()).chain(list.iter()).collect(),
			Comparison::Or {
				left,
				right,
			} => left.iter().chain(right.iter()).collect(),
			Comparison::Filter {
				left,
				right,
				..
			} => left.iter().chain(right.iter()).collect(),
		}
	}

	pub(crate) fn collect_columns<'a>(&'a self, result: &mut Vec<&'a ColumnExpression>) {
		for operand in self.operands() {
			result.extend(operand.columns());
		}
	}
}

impl CompareExpression {
	/// A plain `=` between two column references.
	pub fn as_column_equality(&self) -> Option<(&ColumnExpression, &ColumnExpression)> {
		if self.anti {
			return None;
		}
		match &self.comparison {
			Comparison::Binary {
				left,
				op: CompareOp::Equal,
				right,
			} => Some((left.as_column()?, right.as_column()?)),
			_ => None,
		}
	}
}

impl Display for CompareExpression {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		if self.anti {
			f.write_str("not ")?;
		}
		match &self.comparison {
			Comparison::Binary {
				left,
				op,
				right,
			} => write!(f, "{} {} {}", left, op.symbol(), right),
			Comparison::Range {
				value,
				low,
				high,
				low_inclusive,
				high_inclusive,
			} => write!(
				f,
				"{} {} {} {} {}",
				low,
				if *low_inclusive { "<=" } else { "<" },
				value,
				if *high_inclusive { "<=" } else { "<" },
				high
			),
			Comparison::In {
				value,
				list,
			} => {
				write!(f, "{} in (", value)?;
				for (i, item) in list.iter().enumerate() {
					if i > 0 {
						f.write_str(", ")?;
					}
					Display::fmt(item, f)?;
				}
				f.write_str(")")
			}
			Comparison::Or {
				left,
				right,
			} => write!(f, "({} or {})", join(left), join(right)),
			Comparison::Filter {
				function,
				left,
				right,
			} => write!(f, "{}([{}], [{}])", function, join(left), join(right)),
		}
	}
}

fn join(items: &[Expression]) -> String {
	items.iter().map(|e| e.to_string()).collect::<Vec<_>>().join(" and ")
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_negate_and_swap() {
		assert_eq!(CompareOp::LessThan.negate(), CompareOp::GreaterThanEqual);
		assert_eq!(CompareOp::LessThan.swap(), CompareOp::GreaterThan);
		assert_eq!(CompareOp::Equal.swap(), CompareOp::Equal);
		for op in [
			CompareOp::Equal,
			CompareOp::NotEqual,
			CompareOp::LessThan,
			CompareOp::LessThanEqual,
			CompareOp::GreaterThan,
			CompareOp::GreaterThanEqual,
		] {
			assert_eq!(op.negate().negate(), op);
			assert_eq!(op.swap().swap(), op);
		}
	}

	#[test]
	fn test_column_equality() {
		let Expression::Compare(eq) = Expression::equal(Expression::column("l", "a"), Expression::column("r", "a"))
		else {
			unreachable!()
		};
		assert!(eq.as_column_equality().is_some());

		let Expression::Compare(lt) = Expression::compare(
			Expression::column("l", "a"),
			CompareOp::LessThan,
			Expression::column("r", "a"),
		) else {
			unreachable!()
		};
		assert!(lt.as_column_equality().is_none());
	}
}
