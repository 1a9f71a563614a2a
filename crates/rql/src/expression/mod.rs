// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

mod comparison;
mod procedural;

use std::fmt::{Display, Formatter};

pub use comparison::{CompareOp, Comparison, CompareExpression};
pub use procedural::ProceduralExpression;
use quarry_type::{Type, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct AliasExpression {
	pub alias: Option<String>,
	pub expression: Expression,
}

impl AliasExpression {
	pub fn new(alias: impl Into<String>, expression: Expression) -> Self {
		Self {
			alias: Some(alias.into()),
			expression,
		}
	}

	pub fn unnamed(expression: Expression) -> Self {
		Self {
			alias: None,
			expression,
		}
	}

	/// Output column name: the alias, else the referenced column name, else
	/// the rendered expression.
	pub fn name(&self) -> String {
		if let Some(alias) = &self.alias {
			return alias.clone();
		}
		match &self.expression {
			Expression::Column(column) => column.name.clone(),
			expression => expression.to_string(),
		}
	}
}

impl Display for AliasExpression {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		if let Some(alias) = &self.alias {
			Display::fmt(&alias, f)
		} else {
			Display::fmt(&self.expression, f)
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
	Procedural(ProceduralExpression),

	Constant(ConstantExpression),

	Parameter(ParameterExpression),

	Values(ValuesExpression),

	Cast(CastExpression),

	Call(CallExpression),

	Aggregate(AggregateExpression),

	Column(ColumnExpression),

	Compare(CompareExpression),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstantExpression {
	pub value: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterExpression {
	pub name: String,
	pub ty: Type,
}

/// A list of scalar expressions forming one column.
#[derive(Debug, Clone, PartialEq)]
pub struct ValuesExpression {
	pub values: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CastExpression {
	pub expression: Box<Expression>,
	pub to: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpression {
	pub function: String,
	pub args: Vec<Expression>,
	pub window: Option<WindowSpec>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregateExpression {
	pub function: AggregateFunction,
	/// Empty for `count(*)`
	pub args: Vec<Expression>,
	pub distinct: bool,
	pub window: Option<WindowSpec>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnExpression {
	pub relation: Option<String>,
	pub name: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct WindowSpec {
	pub partition_by: Vec<Expression>,
	pub order_by: Vec<SortKey>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortKey {
	pub expression: Expression,
	pub asc: bool,
	pub nulls_first: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateFunction {
	Count,
	CountAll,
	Sum,
	Min,
	Max,
	Avg,
}

impl AggregateFunction {
	pub fn name(&self) -> &'static str {
		match self {
			AggregateFunction::Count => "count",
			AggregateFunction::CountAll => "count_all",
			AggregateFunction::Sum => "sum",
			AggregateFunction::Min => "min",
			AggregateFunction::Max => "max",
			AggregateFunction::Avg => "avg",
		}
	}

	/// Name of the window function computing the running form.
	pub fn window_name(&self) -> &'static str {
		match self {
			AggregateFunction::Count | AggregateFunction::CountAll => "window_count",
			AggregateFunction::Sum => "window_sum",
			AggregateFunction::Min => "window_min",
			AggregateFunction::Max => "window_max",
			AggregateFunction::Avg => "window_avg",
		}
	}

	pub fn return_type(&self, input: Type) -> Type {
		match self {
			AggregateFunction::Count | AggregateFunction::CountAll => Type::Int8,
			AggregateFunction::Avg => Type::Float8,
			AggregateFunction::Sum if input.is_integer() => Type::Int8,
			AggregateFunction::Sum => Type::Float8,
			AggregateFunction::Min | AggregateFunction::Max => input,
		}
	}
}

impl SortKey {
	pub fn asc(expression: Expression) -> Self {
		Self {
			expression,
			asc: true,
			nulls_first: true,
		}
	}

	pub fn desc(expression: Expression) -> Self {
		Self {
			expression,
			asc: false,
			nulls_first: false,
		}
	}
}

impl Expression {
	pub fn constant(value: impl Into<Value>) -> Self {
		Expression::Constant(ConstantExpression {
			value: value.into(),
		})
	}

	pub fn null() -> Self {
		Expression::constant(Value::Undefined)
	}

	pub fn parameter(name: impl Into<String>, ty: Type) -> Self {
		Expression::Parameter(ParameterExpression {
			name: name.into(),
			ty,
		})
	}

	pub fn values(values: Vec<Expression>) -> Self {
		Expression::Values(ValuesExpression {
			values,
		})
	}

	pub fn cast(expression: Expression, to: Type) -> Self {
		Expression::Cast(CastExpression {
			expression: Box::new(expression),
			to,
		})
	}

	pub fn column(relation: impl Into<String>, name: impl Into<String>) -> Self {
		Expression::Column(ColumnExpression {
			relation: Some(relation.into()),
			name: name.into(),
		})
	}

	pub fn unqualified(name: impl Into<String>) -> Self {
		Expression::Column(ColumnExpression {
			relation: None,
			name: name.into(),
		})
	}

	pub fn call(function: impl Into<String>, args: Vec<Expression>) -> Self {
		Expression::Call(CallExpression {
			function: function.into(),
			args,
			window: None,
		})
	}

	pub fn window(function: impl Into<String>, args: Vec<Expression>, window: WindowSpec) -> Self {
		Expression::Call(CallExpression {
			function: function.into(),
			args,
			window: Some(window),
		})
	}

	pub fn aggregate(function: AggregateFunction, args: Vec<Expression>) -> Self {
		Expression::Aggregate(AggregateExpression {
			function,
			args,
			distinct: false,
			window: None,
		})
	}

	pub fn count_all() -> Self {
		Expression::aggregate(AggregateFunction::CountAll, vec![])
	}

	pub fn compare(left: Expression, op: CompareOp, right: Expression) -> Self {
		Expression::Compare(CompareExpression {
			comparison: Comparison::Binary {
				left: Box::new(left),
				op,
				right: Box::new(right),
			},
			anti: false,
		})
	}

	pub fn equal(left: Expression, right: Expression) -> Self {
		Expression::compare(left, CompareOp::Equal, right)
	}

	pub fn is_constant(&self) -> bool {
		matches!(self, Expression::Constant(_) | Expression::Parameter(_))
	}

	pub fn as_column(&self) -> Option<&ColumnExpression> {
		match self {
			Expression::Column(column) => Some(column),
			_ => None,
		}
	}

	/// Every column referenced by this expression, outside nested
	/// procedural blocks.
	pub fn columns(&self) -> Vec<&ColumnExpression> {
		let mut result = Vec::new();
		self.collect_columns(&mut result);
		result
	}

	fn collect_columns<'a>(&'a self, result: &mut Vec<&'a ColumnExpression>) {
		match self {
			Expression::Procedural(_) | Expression::Constant(_) | Expression::Parameter(_) => {}
			Expression::Values(values) => values.values.iter().for_each(|v| v.collect_columns(result)),
			Expression::Cast(cast) => cast.expression.collect_columns(result),
			Expression::Call(call) => {
				call.args.iter().for_each(|a| a.collect_columns(result));
				if let Some(window) = &call.window {
					window.collect_columns(result);
				}
			}
			Expression::Aggregate(aggregate) => {
				aggregate.args.iter().for_each(|a| a.collect_columns(result));
				if let Some(window) = &aggregate.window {
					window.collect_columns(result);
				}
			}
			Expression::Column(column) => result.push(column),
			Expression::Compare(compare) => compare.comparison.collect_columns(result),
		}
	}

	pub fn contains_aggregate(&self) -> bool {
		match self {
			Expression::Aggregate(aggregate) => aggregate.window.is_none(),
			Expression::Cast(cast) => cast.expression.contains_aggregate(),
			Expression::Call(call) => call.args.iter().any(Expression::contains_aggregate),
			Expression::Compare(compare) => {
				compare.comparison.operands().iter().any(|e| e.contains_aggregate())
			}
			_ => false,
		}
	}
}

impl WindowSpec {
	fn collect_columns<'a>(&'a self, result: &mut Vec<&'a ColumnExpression>) {
		self.partition_by.iter().for_each(|p| p.collect_columns(result));
		self.order_by.iter().for_each(|k| k.expression.collect_columns(result));
	}
}

impl Display for ColumnExpression {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match &self.relation {
			Some(relation) => write!(f, "{}.{}", relation, self.name),
			None => f.write_str(&self.name),
		}
	}
}

fn write_list(f: &mut Formatter<'_>, items: &[Expression]) -> std::fmt::Result {
	for (i, item) in items.iter().enumerate() {
		if i > 0 {
			f.write_str(", ")?;
		}
		Display::fmt(item, f)?;
	}
	Ok(())
}

impl Display for Expression {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Expression::Procedural(procedural) => Display::fmt(procedural, f),
			Expression::Constant(constant) => match &constant.value {
				Value::Utf8(s) => write!(f, "'{}'", s),
				value => Display::fmt(value, f),
			},
			Expression::Parameter(parameter) => write!(f, "${}", parameter.name),
			Expression::Values(values) => {
				f.write_str("(")?;
				write_list(f, &values.values)?;
				f.write_str(")")
			}
			Expression::Cast(cast) => write!(f, "cast({} as {})", cast.expression, cast.to),
			Expression::Call(call) => {
				write!(f, "{}(", call.function)?;
				write_list(f, &call.args)?;
				f.write_str(")")?;
				if call.window.is_some() {
					f.write_str(" over (..)")?;
				}
				Ok(())
			}
			Expression::Aggregate(aggregate) => {
				write!(f, "{}(", aggregate.function.name())?;
				if aggregate.distinct {
					f.write_str("distinct ")?;
				}
				if aggregate.args.is_empty() {
					f.write_str("*")?;
				}
				write_list(f, &aggregate.args)?;
				f.write_str(")")
			}
			Expression::Column(column) => Display::fmt(column, f),
			Expression::Compare(compare) => Display::fmt(compare, f),
		}
	}
}
