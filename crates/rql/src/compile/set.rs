// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use quarry_type::{Fragment, Type};
use tracing::instrument;

use crate::{
	compile::{Compiler, Relation},
	error::{CompileError, TypeErrorKind},
	plan::dataflow::StmtId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SetOperation {
	Union,
	Intersect,
	Except,
}

impl SetOperation {
	fn name(self) -> &'static str {
		match self {
			SetOperation::Union => "UNION",
			SetOperation::Intersect => "INTERSECT",
			SetOperation::Except => "EXCEPT",
		}
	}
}

/// Both inputs of a set operation, converted to common column types.
struct Coerced {
	names: Vec<String>,
	left: Vec<StmtId>,
	right: Vec<StmtId>,
}

impl<'a> Compiler<'a> {
	#[instrument(name = "rql::compile::set", level = "trace", skip(self, left, right))]
	pub(crate) fn compile_set(
		&mut self,
		operation: SetOperation,
		left: &Relation,
		right: &Relation,
		distinct: bool,
		alias: Option<&str>,
	) -> crate::Result<Relation> {
		let coerced = self.coerce(operation, left, right)?;
		let label = match alias {
			Some(alias) => alias.to_string(),
			None => self.label(),
		};
		match operation {
			SetOperation::Union => {
				let mut result = Relation::new();
				for (i, name) in coerced.names.iter().enumerate() {
					let stmt = self.program.append(coerced.left[i], coerced.right[i]);
					result.push(label.clone(), name.clone(), stmt, None);
				}
				if distinct {
					self.distinct(result)
				} else {
					Ok(result)
				}
			}
			SetOperation::Intersect | SetOperation::Except => {
				let left = self.rows_as_columns(&coerced.left);
				let right = self.rows_as_columns(&coerced.right);
				let rows = self.match_groups(operation, &left, &right, distinct)?;
				let mut result = Relation::new();
				for (i, name) in coerced.names.iter().enumerate() {
					let stmt = self.program.project(rows, left[i]);
					result.push(label.clone(), name.clone(), stmt, None);
				}
				Ok(result)
			}
		}
	}

	/// Pairs visible columns positionally and converts each pair to the
	/// common type of its two sides.
	fn coerce(&mut self, operation: SetOperation, left: &Relation, right: &Relation) -> crate::Result<Coerced> {
		let l: Vec<_> = left.visible().cloned().collect();
		let r: Vec<_> = right.visible().cloned().collect();
		if l.len() != r.len() {
			return Err(CompileError::Type {
				kind: TypeErrorKind::SetArity {
					operation: operation.name().to_string(),
					left: l.len(),
					right: r.len(),
				},
				fragment: Fragment::None,
			});
		}

		let mut coerced = Coerced {
			names: Vec::with_capacity(l.len()),
			left: Vec::with_capacity(l.len()),
			right: Vec::with_capacity(l.len()),
		};
		for (lc, rc) in l.iter().zip(r.iter()) {
			let (lt, rt) = (self.program.ty(lc.stmt), self.program.ty(rc.stmt));
			let ty = Type::common(lt, rt).ok_or_else(|| CompileError::Type {
				kind: TypeErrorKind::SetColumnType {
					operation: operation.name().to_string(),
					column: lc.name.clone(),
					left: lt,
					right: rt,
				},
				fragment: Fragment::None,
			})?;
			coerced.names.push(lc.name.clone());
			coerced.left.push(self.cast(lc.stmt, ty)?);
			coerced.right.push(self.cast(rc.stmt, ty)?);
		}
		Ok(coerced)
	}

	/// A relation of scalars is a single row; turns its columns into
	/// one-row vectors.
	fn rows_as_columns(&mut self, columns: &[StmtId]) -> Vec<StmtId> {
		columns.iter()
			.map(|c| {
				if self.program.is_scalar(*c) {
					self.program.values(vec![*c])
				} else {
					*c
				}
			})
			.collect()
	}

	/// Row positions of `left` forming the result of INTERSECT or EXCEPT.
	///
	/// Both sides are grouped over all columns and the groups are joined on
	/// their keys. A matched left group contributes `min(l, r)` rows for
	/// INTERSECT and `max(l - r, 0)` for EXCEPT; unmatched left groups
	/// contribute all their rows to EXCEPT. With `distinct` every group
	/// contributes at most one row. NULL keys never match.
	fn match_groups(
		&mut self,
		operation: SetOperation,
		left: &[StmtId],
		right: &[StmtId],
		distinct: bool,
	) -> crate::Result<StmtId> {
		let (Some(lg), Some(rg)) = (self.group_columns(left)?, self.group_columns(right)?) else {
			return Err(CompileError::unsupported(format!("{} without columns", operation.name())));
		};
		let lkeys: Vec<StmtId> = left.iter().map(|c| self.program.project(lg.extent, *c)).collect();
		let rkeys: Vec<StmtId> = right.iter().map(|c| self.program.project(rg.extent, *c)).collect();
		let (li, ri) = self.equi_join(&lkeys, &rkeys);

		let all = self.program.mirror(lg.extent);
		match (operation, distinct) {
			(SetOperation::Intersect, true) => Ok(self.program.project(li, lg.extent)),
			(SetOperation::Except, true) => {
				let unmatched = self.program.difference(all, li);
				Ok(self.program.project(unmatched, lg.extent))
			}
			(SetOperation::Intersect, false) => {
				let lcounts = self.program.project(li, lg.counts);
				let rcounts = self.program.project(ri, rg.counts);
				let counts = self.program.call("sql_min", vec![lcounts, rcounts], Type::Int8);
				let rows = self.program.project(li, lg.extent);
				Ok(self.program.replicate(rows, counts))
			}
			(SetOperation::Except, false) => {
				let lcounts = self.program.project(li, lg.counts);
				let rcounts = self.program.project(ri, rg.counts);
				let remaining = self.program.call("sub", vec![lcounts, rcounts], Type::Int8);
				let zero = self.int8(0);
				let counts = self.program.call("sql_max", vec![remaining, zero], Type::Int8);
				let rows = self.program.project(li, lg.extent);
				let matched = self.program.replicate(rows, counts);

				let unmatched = self.program.difference(all, li);
				let rows = self.program.project(unmatched, lg.extent);
				let counts = self.program.project(unmatched, lg.counts);
				let unmatched = self.program.replicate(rows, counts);
				Ok(self.program.append(matched, unmatched))
			}
			(SetOperation::Union, _) => Err(CompileError::unsupported("UNION through group matching")),
		}
	}
}

#[cfg(test)]
mod tests {
	use crate::{
		CompileError,
		compile::{
			compile,
			testing::{P, T, TestCatalog, count_ops},
		},
		error::TypeErrorKind,
		expression::{AliasExpression, Expression},
		plan::{
			dataflow::{Op, Program},
			logical::{LogicalPlan, NodeId},
		},
	};

	fn calls(program: &Program, function: &str) -> usize {
		program.count(|op| matches!(op, Op::Call { function: f, .. } if f == function))
	}

	fn sides(plan: &mut LogicalPlan) -> (NodeId, NodeId) {
		let t = plan.scan(T, "t");
		let left = plan.project(Some(t), vec![AliasExpression::unnamed(Expression::column("t", "a"))]);
		let p = plan.scan(P, "p");
		let right = plan.project(Some(p), vec![AliasExpression::unnamed(Expression::column("p", "x"))]);
		(left, right)
	}

	#[test]
	fn test_union_all_appends() {
		let catalog = TestCatalog::new();
		let mut plan = LogicalPlan::new();
		let (left, right) = sides(&mut plan);
		let union = plan.union(left, right);
		let mut plan = plan.build(union);

		let program = compile(&catalog, &mut plan).unwrap();
		assert_eq!(count_ops(&program, "append"), 1);
		assert_eq!(count_ops(&program, "group"), 0);
	}

	#[test]
	fn test_union_distinct_groups() {
		let catalog = TestCatalog::new();
		let mut plan = LogicalPlan::new();
		let (left, right) = sides(&mut plan);
		let union = plan.union(left, right);
		plan.set_distinct(union);
		let mut plan = plan.build(union);

		let program = compile(&catalog, &mut plan).unwrap();
		assert_eq!(count_ops(&program, "group"), 1);
	}

	#[test]
	fn test_arity_mismatch() {
		let catalog = TestCatalog::new();
		let mut plan = LogicalPlan::new();
		let t = plan.scan(T, "t");
		let p = plan.scan(P, "p");
		let union = plan.union(t, p);
		let mut plan = plan.build(union);

		let err = compile(&catalog, &mut plan).unwrap_err();
		assert!(matches!(
			err,
			CompileError::Type {
				kind: TypeErrorKind::SetArity {
					left: 3,
					right: 2,
					..
				},
				..
			}
		));
	}

	#[test]
	fn test_column_type_mismatch() {
		let catalog = TestCatalog::new();
		let mut plan = LogicalPlan::new();
		let t = plan.scan(T, "t");
		let left = plan.project(Some(t), vec![AliasExpression::unnamed(Expression::column("t", "b"))]);
		let p = plan.scan(P, "p");
		let right = plan.project(Some(p), vec![AliasExpression::unnamed(Expression::column("p", "x"))]);
		let except = plan.except(left, right);
		let mut plan = plan.build(except);

		let err = compile(&catalog, &mut plan).unwrap_err();
		assert!(matches!(
			err,
			CompileError::Type {
				kind: TypeErrorKind::SetColumnType {
					..
				},
				..
			}
		));
	}

	#[test]
	fn test_intersect_all_replicates_minimum() {
		let catalog = TestCatalog::new();
		let mut plan = LogicalPlan::new();
		let (left, right) = sides(&mut plan);
		let intersect = plan.intersect(left, right);
		let mut plan = plan.build(intersect);

		let program = compile(&catalog, &mut plan).unwrap();
		assert_eq!(count_ops(&program, "group"), 2);
		assert_eq!(calls(&program, "sql_min"), 1);
		assert_eq!(count_ops(&program, "replicate"), 1);
	}

	#[test]
	fn test_except_all_keeps_unmatched_groups() {
		let catalog = TestCatalog::new();
		let mut plan = LogicalPlan::new();
		let (left, right) = sides(&mut plan);
		let except = plan.except(left, right);
		let mut plan = plan.build(except);

		let program = compile(&catalog, &mut plan).unwrap();
		assert_eq!(calls(&program, "sub"), 1);
		assert_eq!(calls(&program, "sql_max"), 1);
		assert_eq!(count_ops(&program, "replicate"), 2);
		assert_eq!(count_ops(&program, "difference"), 1);
	}

	#[test]
	fn test_except_distinct_takes_unmatched_groups() {
		let catalog = TestCatalog::new();
		let mut plan = LogicalPlan::new();
		let (left, right) = sides(&mut plan);
		let except = plan.except(left, right);
		plan.set_distinct(except);
		let mut plan = plan.build(except);

		let program = compile(&catalog, &mut plan).unwrap();
		assert_eq!(count_ops(&program, "replicate"), 0);
		assert_eq!(count_ops(&program, "difference"), 1);
	}
}
