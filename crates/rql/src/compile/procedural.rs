// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use quarry_type::Type;
use tracing::{instrument, trace};

use crate::{
	compile::{Bindings, Compiler},
	error::{BindErrorKind, CompileError},
	expression::{Expression, ProceduralExpression},
	plan::dataflow::StmtId,
};

impl<'a> Compiler<'a> {
	/// Compiles a list of procedural statements into the current block.
	#[instrument(name = "rql::compile::statements", level = "trace", skip_all, fields(count = statements.len()))]
	pub(crate) fn compile_statements(&mut self, statements: &[Expression]) -> crate::Result<()> {
		for statement in statements {
			self.descend(|c| c.compile_procedural(statement))?;
		}
		Ok(())
	}

	fn compile_procedural(&mut self, statement: &Expression) -> crate::Result<()> {
		let Expression::Procedural(procedural) = statement else {
			// a bare expression is evaluated for its side effects
			self.compile_expression(statement, &Bindings::none())?;
			return Ok(());
		};
		match procedural {
			ProceduralExpression::Declare {
				name,
				ty,
			} => {
				self.declare_variable(name, *ty);
				self.program.declare(name, *ty);
			}
			ProceduralExpression::Set {
				name,
				value,
			} => {
				let ty = self.variable(name).ok_or_else(|| CompileError::bind(BindErrorKind::Variable, name))?;
				let value = self.compile_expression(value, &Bindings::none())?;
				let value = if ty == Type::Undefined {
					value
				} else {
					self.cast(value, ty)?
				};
				self.program.assign(name, value);
			}
			ProceduralExpression::Return {
				value,
			} => {
				let value = self.compile_expression(value, &Bindings::none())?;
				self.program.return_(value);
			}
			ProceduralExpression::If {
				condition,
				then,
				otherwise,
			} => {
				let condition = self.condition(condition)?;
				let then = self.block(then)?;
				let otherwise = self.block(otherwise)?;
				trace!(then = then.len(), otherwise = otherwise.len(), "if");
				self.program.if_(condition, then, otherwise);
			}
			ProceduralExpression::While {
				condition,
				body,
			} => {
				// the condition is re-evaluated before every iteration
				self.program.begin_block();
				let condition = self.condition(condition);
				let prelude = self.program.end_block();
				let condition = condition?;
				let body = self.block(body)?;
				self.program.while_(prelude, condition, body);
			}
			ProceduralExpression::Relation(plan) => {
				self.compile_nested(plan.as_ref().clone())?;
			}
		}
		Ok(())
	}

	fn condition(&mut self, condition: &Expression) -> crate::Result<StmtId> {
		let value = self.compile_expression(condition, &Bindings::none())?;
		if !self.program.is_scalar(value) {
			return Err(CompileError::unsupported(format!("condition '{}' is not a scalar", condition)));
		}
		Ok(value)
	}

	/// Compiles statements into a nested block with its own variable scope.
	fn block(&mut self, statements: &[Expression]) -> crate::Result<Vec<StmtId>> {
		self.program.begin_block();
		self.push_scope(None);
		let result = self.compile_statements(statements);
		self.pop_scope();
		let block = self.program.end_block();
		result.map(|_| block)
	}
}

#[cfg(test)]
mod tests {
	use quarry_type::Type;

	use crate::{
		CompileError,
		compile::{
			compile,
			testing::{TestCatalog, block_ops},
		},
		error::BindErrorKind,
		expression::{Expression, ProceduralExpression},
		plan::{dataflow::Op, logical::LogicalPlan},
	};

	fn psm(statements: Vec<Expression>) -> LogicalPlan {
		let mut plan = LogicalPlan::new();
		let root = plan.psm(statements);
		plan.build(root)
	}

	fn counter_loop() -> Vec<Expression> {
		vec![
			ProceduralExpression::declare("i", Type::Int4),
			ProceduralExpression::set("i", Expression::constant(0)),
			Expression::Procedural(ProceduralExpression::While {
				condition: Box::new(Expression::call(
					"lt",
					vec![Expression::unqualified("i"), Expression::constant(3)],
				)),
				body: vec![ProceduralExpression::set(
					"i",
					Expression::call("add", vec![Expression::unqualified("i"), Expression::constant(1)]),
				)],
			}),
		]
	}

	#[test]
	fn test_while_condition_lives_in_prelude() {
		let catalog = TestCatalog::new();
		let mut plan = psm(counter_loop());

		let program = compile(&catalog, &mut plan).unwrap();
		assert_eq!(block_ops(&program), vec!["declare", "const", "assign", "while"]);

		let (prelude, condition, body) = program
			.stmts()
			.iter()
			.find_map(|s| match &s.op {
				Op::While {
					prelude,
					condition,
					body,
				} => Some((prelude.clone(), *condition, body.clone())),
				_ => None,
			})
			.unwrap();
		assert!(prelude.contains(&condition));
		assert_eq!(program.stmt(*body.last().unwrap()).op.name(), "assign");
	}

	#[test]
	fn test_set_undeclared_variable() {
		let catalog = TestCatalog::new();
		let mut plan = psm(vec![ProceduralExpression::set("missing", Expression::constant(1))]);

		let err = compile(&catalog, &mut plan).unwrap_err();
		assert!(matches!(
			err,
			CompileError::Bind {
				kind: BindErrorKind::Variable,
				..
			}
		));
	}

	#[test]
	fn test_if_branch_scopes_its_variables() {
		let catalog = TestCatalog::new();
		let mut plan = psm(vec![
			Expression::Procedural(ProceduralExpression::If {
				condition: Box::new(Expression::constant(true)),
				then: vec![ProceduralExpression::declare("x", Type::Int4)],
				otherwise: vec![],
			}),
			ProceduralExpression::set("x", Expression::constant(1)),
		]);

		let err = compile(&catalog, &mut plan).unwrap_err();
		assert!(matches!(
			err,
			CompileError::Bind {
				kind: BindErrorKind::Variable,
				..
			}
		));
	}

	#[test]
	fn test_return_inside_branch() {
		let catalog = TestCatalog::new();
		let mut plan = psm(vec![
			ProceduralExpression::declare("x", Type::Int4),
			Expression::Procedural(ProceduralExpression::If {
				condition: Box::new(Expression::constant(true)),
				then: vec![ProceduralExpression::ret(Expression::unqualified("x"))],
				otherwise: vec![ProceduralExpression::set("x", Expression::constant(2))],
			}),
		]);

		let program = compile(&catalog, &mut plan).unwrap();
		let (then, otherwise) = program
			.stmts()
			.iter()
			.find_map(|s| match &s.op {
				Op::If {
					then,
					otherwise,
					..
				} => Some((then.clone(), otherwise.clone())),
				_ => None,
			})
			.unwrap();
		assert_eq!(program.stmt(*then.last().unwrap()).op.name(), "return");
		assert_eq!(program.stmt(*otherwise.last().unwrap()).op.name(), "assign");
	}
}
