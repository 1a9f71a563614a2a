// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use quarry_type::Type;
use tracing::instrument;

use crate::{
	compile::{Compiler, GroupState, Relation},
	error::{BindErrorKind, CompileError, TypeErrorKind},
	expression::{CallExpression, ColumnExpression, CompareExpression, Comparison, Expression},
	interface::FunctionKind,
	plan::dataflow::{Program, StmtId},
};

/// What an expression is compiled against.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Bindings<'r> {
	pub left: Option<&'r Relation>,
	/// Searched before `left`
	pub right: Option<&'r Relation>,
	/// Active grouping; columns of `left` are re-projected through its
	/// extent
	pub group: Option<&'r GroupState>,
	/// Active selection over the bound relations; columns are projected
	/// through it
	pub sel: Option<StmtId>,
}

impl<'r> Bindings<'r> {
	pub fn none() -> Self {
		Self::default()
	}

	pub fn left(relation: &'r Relation) -> Self {
		Self {
			left: Some(relation),
			..Self::default()
		}
	}

	pub fn pair(left: &'r Relation, right: &'r Relation) -> Self {
		Self {
			left: Some(left),
			right: Some(right),
			..Self::default()
		}
	}

	pub fn grouped(relation: &'r Relation, group: Option<&'r GroupState>) -> Self {
		Self {
			left: Some(relation),
			group,
			..Self::default()
		}
	}

	pub fn selected(self, sel: Option<StmtId>) -> Self {
		Self {
			sel,
			..self
		}
	}

	pub fn ungrouped(self) -> Self {
		Self {
			group: None,
			..self
		}
	}

	/// A column with one entry per row the expression is evaluated for.
	pub fn anchor(&self, program: &Program) -> Option<StmtId> {
		if let Some(sel) = self.sel {
			return Some(sel);
		}
		if let Some(group) = self.group {
			return Some(group.extent);
		}
		self.right.and_then(|r| r.anchor(program)).or_else(|| self.left.and_then(|l| l.anchor(program)))
	}
}

enum Resolved {
	Stmt(StmtId),
	Variable(Type),
}

pub(crate) fn comparable(left: Type, right: Type) -> bool {
	left == right
		|| left == Type::Undefined
		|| right == Type::Undefined
		|| (left.is_numeric() && right.is_numeric())
		|| matches!((left, right), (Type::RowId, Type::Int8) | (Type::Int8, Type::RowId))
}

impl<'a> Compiler<'a> {
	/// Compiles `expr` into a statement yielding one value per bound row,
	/// or a scalar.
	pub(crate) fn compile_expression(&mut self, expr: &Expression, bindings: &Bindings) -> crate::Result<StmtId> {
		self.descend(|c| c.expression(expr, bindings))
	}

	fn expression(&mut self, expr: &Expression, bindings: &Bindings) -> crate::Result<StmtId> {
		match expr {
			Expression::Procedural(procedural) => {
				Err(CompileError::unsupported(format!("'{}' in value position", procedural)))
			}
			Expression::Constant(constant) => Ok(self.program.constant(constant.value.clone())),
			Expression::Parameter(parameter) => Ok(self.program.param(&parameter.name, parameter.ty)),
			Expression::Values(values) => {
				let mut result = Vec::with_capacity(values.values.len());
				for value in &values.values {
					let stmt = self.compile_expression(value, bindings)?;
					if !self.program.is_scalar(stmt) {
						return Err(CompileError::unsupported("values list with a vector element"));
					}
					result.push(stmt);
				}
				Ok(self.program.values(result))
			}
			Expression::Cast(cast) => {
				let input = self.compile_expression(&cast.expression, bindings)?;
				self.cast(input, cast.to)
			}
			Expression::Call(call) => self.compile_call(call, bindings),
			Expression::Aggregate(aggregate) => self.compile_aggregate(aggregate, bindings),
			Expression::Column(column) => self.resolve_column(column, bindings),
			Expression::Compare(compare) => self.compile_compare_value(compare, bindings),
		}
	}

	/// Checked conversion; impossible casts fail here, value-level failures
	/// when the program runs.
	pub(crate) fn cast(&mut self, input: StmtId, to: Type) -> crate::Result<StmtId> {
		let from = self.program.ty(input);
		if !Type::castable(from, to) {
			return Err(CompileError::Type {
				kind: TypeErrorKind::UnsupportedCast {
					from,
					to,
				},
				fragment: quarry_type::Fragment::None,
			});
		}
		Ok(self.program.convert(input, to))
	}

	pub(crate) fn check_comparable(&self, operator: &str, left: StmtId, right: StmtId) -> crate::Result<()> {
		let (l, r) = (self.program.ty(left), self.program.ty(right));
		if comparable(l, r) {
			Ok(())
		} else {
			Err(CompileError::incompatible(operator, l, r))
		}
	}

	#[instrument(name = "rql::compile::call", level = "trace", skip(self, call, bindings), fields(function = %call.function))]
	fn compile_call(&mut self, call: &CallExpression, bindings: &Bindings) -> crate::Result<StmtId> {
		let def = self.function(&call.function)?;
		if call.window.is_some() || def.kind == FunctionKind::Window {
			return self.compile_window_call(call, def, bindings);
		}
		if def.kind == FunctionKind::Table {
			return Err(CompileError::unsupported(format!("table function {} used as a value", call.function)));
		}
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
			let left = types.first().copied().unwrap_or(Type::Undefined);
			let right = types.iter().copied().find(|t| !t.is_numeric() && *t != Type::Undefined).unwrap_or(left);
			CompileError::incompatible(&call.function, left, right)
		})?;
		Ok(self.program.call(&call.function, args, ty))
	}

	/// Resolution order: right relation, left relation, then the scope stack
	/// innermost first (pseudo-relations, then variables).
	pub(crate) fn resolve_column(&mut self, column: &ColumnExpression, bindings: &Bindings) -> crate::Result<StmtId> {
		let relation = column.relation.as_deref();
		if let Some(right) = bindings.right {
			if let Some(found) = right.find(relation, &column.name)? {
				let stmt = found.stmt;
				return Ok(self.through_selection(stmt, bindings.sel));
			}
		}
		if let Some(left) = bindings.left {
			if let Some(found) = left.find(relation, &column.name)? {
				let mut stmt = found.stmt;
				if let Some(group) = bindings.group {
					stmt = self.program.project(group.extent, stmt);
				}
				return Ok(self.through_selection(stmt, bindings.sel));
			}
		}

		let mut resolved = None;
		for scope in self.scopes.iter().rev() {
			if let Some(scoped) = &scope.relation {
				if let Some(found) = scoped.find(relation, &column.name)? {
					resolved = Some(Resolved::Stmt(found.stmt));
					break;
				}
			}
			if relation.is_none() {
				if let Some(ty) = scope.variables.get(&column.name) {
					resolved = Some(Resolved::Variable(*ty));
					break;
				}
			}
		}
		match resolved {
			Some(Resolved::Stmt(stmt)) => Ok(stmt),
			Some(Resolved::Variable(ty)) => Ok(self.program.var(&column.name, ty)),
			None => Err(CompileError::bind(BindErrorKind::Column, column.to_string())),
		}
	}

	fn through_selection(&mut self, stmt: StmtId, sel: Option<StmtId>) -> StmtId {
		match sel {
			Some(sel) => self.program.project(sel, stmt),
			None => stmt,
		}
	}

	/// A comparison evaluated to a boolean value per row.
	fn compile_compare_value(&mut self, compare: &CompareExpression, bindings: &Bindings) -> crate::Result<StmtId> {
		let result = match &compare.comparison {
			Comparison::Binary {
				left,
				op,
				right,
			} => {
				let l = self.compile_expression(left, bindings)?;
				let r = self.compile_expression(right, bindings)?;
				self.check_comparable(op.symbol(), l, r)?;
				self.program.call(op.function_name(), vec![l, r], Type::Boolean)
			}
			Comparison::Range {
				value,
				low,
				high,
				low_inclusive,
				high_inclusive,
			} => {
				let v = self.compile_expression(value, bindings)?;
				let lo = self.compile_expression(low, bindings)?;
				let hi = self.compile_expression(high, bindings)?;
				self.check_comparable("between", v, lo)?;
				self.check_comparable("between", v, hi)?;
				let lower = self.program.call(if *low_inclusive { "ge" } else { "gt" }, vec![v, lo], Type::Boolean);
				let upper = self.program.call(if *high_inclusive { "le" } else { "lt" }, vec![v, hi], Type::Boolean);
				self.program.call("and", vec![lower, upper], Type::Boolean)
			}
			Comparison::In {
				value,
				list,
			} => {
				let v = self.compile_expression(value, bindings)?;
				let mut result = None;
				for item in list {
					let item = self.compile_expression(item, bindings)?;
					self.check_comparable("in", v, item)?;
					let eq = self.program.call("eq", vec![v, item], Type::Boolean);
					result = Some(match result {
						Some(previous) => self.program.call("or", vec![previous, eq], Type::Boolean),
						None => eq,
					});
				}
				match result {
					Some(result) => result,
					None => self.boolean(false),
				}
			}
			Comparison::Or {
				left,
				right,
			} => {
				let l = self.conjunction(left, bindings)?;
				let r = self.conjunction(right, bindings)?;
				self.program.call("or", vec![l, r], Type::Boolean)
			}
			Comparison::Filter {
				function,
				left,
				right,
			} => {
				self.function(function)?;
				let mut args = Vec::with_capacity(left.len() + right.len());
				for arg in left.iter().chain(right.iter()) {
					args.push(self.compile_expression(arg, bindings)?);
				}
				self.program.call(function, args, Type::Boolean)
			}
		};
		if compare.anti {
			Ok(self.program.call("not", vec![result], Type::Boolean))
		} else {
			Ok(result)
		}
	}

	fn conjunction(&mut self, exprs: &[Expression], bindings: &Bindings) -> crate::Result<StmtId> {
		let mut result = None;
		for expr in exprs {
			let value = self.compile_expression(expr, bindings)?;
			result = Some(match result {
				Some(previous) => self.program.call("and", vec![previous, value], Type::Boolean),
				None => value,
			});
		}
		Ok(match result {
			Some(result) => result,
			None => self.boolean(true),
		})
	}
}
