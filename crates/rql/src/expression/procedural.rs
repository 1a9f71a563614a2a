// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::fmt::{Display, Formatter};

use quarry_type::Type;

use crate::{expression::Expression, plan::logical::LogicalPlan};

/// Statements of trigger bodies and PSM blocks.
#[derive(Debug, Clone, PartialEq)]
pub enum ProceduralExpression {
	Declare {
		name: String,
		ty: Type,
	},
	Set {
		name: String,
		value: Box<Expression>,
	},
	Return {
		value: Box<Expression>,
	},
	If {
		condition: Box<Expression>,
		then: Vec<Expression>,
		otherwise: Vec<Expression>,
	},
	While {
		condition: Box<Expression>,
		body: Vec<Expression>,
	},
	/// A nested relational statement, compiled with its own reference cache
	Relation(Box<LogicalPlan>),
}

impl ProceduralExpression {
	pub fn declare(name: impl Into<String>, ty: Type) -> Expression {
		Expression::Procedural(ProceduralExpression::Declare {
			name: name.into(),
			ty,
		})
	}

	pub fn set(name: impl Into<String>, value: Expression) -> Expression {
		Expression::Procedural(ProceduralExpression::Set {
			name: name.into(),
			value: Box::new(value),
		})
	}

	pub fn ret(value: Expression) -> Expression {
		Expression::Procedural(ProceduralExpression::Return {
			value: Box::new(value),
		})
	}

	pub fn relation(plan: LogicalPlan) -> Expression {
		Expression::Procedural(ProceduralExpression::Relation(Box::new(plan)))
	}
}

impl Display for ProceduralExpression {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			ProceduralExpression::Declare {
				name,
				ty,
			} => write!(f, "declare {} {}", name, ty),
			ProceduralExpression::Set {
				name,
				value,
			} => write!(f, "set {} = {}", name, value),
			ProceduralExpression::Return {
				value,
			} => write!(f, "return {}", value),
			ProceduralExpression::If {
				condition,
				..
			} => write!(f, "if {} ..", condition),
			ProceduralExpression::While {
				condition,
				..
			} => write!(f, "while {} ..", condition),
			ProceduralExpression::Relation(_) => f.write_str("<relation>"),
		}
	}
}
