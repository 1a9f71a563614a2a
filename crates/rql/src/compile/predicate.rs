// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use quarry_type::Type;
use tracing::{debug, instrument};

use crate::{
	compile::{Bindings, Compiler, Relation},
	expression::{AliasExpression, CallExpression, CompareExpression, CompareOp, Comparison, Expression},
	interface::IndexKind,
	plan::{
		dataflow::StmtId,
		logical::Property,
	},
};

fn lower_op(inclusive: bool) -> CompareOp {
	if inclusive {
		CompareOp::GreaterThanEqual
	} else {
		CompareOp::GreaterThan
	}
}

fn upper_op(inclusive: bool) -> CompareOp {
	if inclusive {
		CompareOp::LessThanEqual
	} else {
		CompareOp::LessThan
	}
}

fn single_arg<'e>(call: &'e CallExpression, function: &str) -> Option<&'e Expression> {
	if call.function == function && call.args.len() == 1 && call.window.is_none() {
		call.args.first()
	} else {
		None
	}
}

impl<'a> Compiler<'a> {
	/// Row count source of a relation; a relation without columns has
	/// exactly one row.
	pub(crate) fn rows(&mut self, relation: &Relation) -> StmtId {
		match relation.anchor(&self.program) {
			Some(anchor) => anchor,
			None => {
				let zero = self.int8(0);
				self.program.values(vec![zero])
			}
		}
	}

	/// Filters a relation by a selection node's predicates, each refining
	/// the running selection.
	#[instrument(name = "rql::compile::select", level = "trace", skip_all, fields(predicates = predicates.len()))]
	pub(crate) fn compile_select(
		&mut self,
		input: Relation,
		predicates: &[AliasExpression],
		properties: &[Property],
	) -> crate::Result<Relation> {
		let mut sel = if self.config.hash_index_shortcut {
			self.hash_index_seed(&input, predicates, properties)?
		} else {
			None
		};
		for predicate in predicates {
			sel = Some(self.compile_filter(&predicate.expression, &input, sel)?);
		}
		Ok(match sel {
			Some(sel) => input.project(&mut self.program, sel),
			None => input,
		})
	}

	/// Seeds a selection from a persisted hash index when constant
	/// equality predicates cover all of its columns: the combined hash of
	/// the constants is looked up in the index column.
	fn hash_index_seed(
		&mut self,
		input: &Relation,
		predicates: &[AliasExpression],
		properties: &[Property],
	) -> crate::Result<Option<StmtId>> {
		let mut candidates: Vec<_> = properties
			.iter()
			.filter_map(|p| match p {
				Property::HashIndex {
					predicate,
					index,
				} => Some((*predicate, *index)),
				Property::JoinIndex {
					..
				} => None,
			})
			.collect();
		candidates.sort_by_key(|(predicate, _)| *predicate);

		for (_, index) in candidates {
			let index = self.index(index)?;
			if index.kind != IndexKind::Hash {
				continue;
			}
			let table = self.table(index.table)?;

			let mut constants = Vec::with_capacity(index.columns.len());
			let mut relation_alias = None;
			for column_id in &index.columns {
				let Some(column) = table.column_by_id(*column_id) else {
					break;
				};
				let found = predicates.iter().find_map(|p| {
					let Expression::Compare(compare) = &p.expression else {
						return None;
					};
					let (column_expr, constant) = constant_equality(compare)?;
					let resolved = input.find(column_expr.relation.as_deref(), &column_expr.name).ok()??;
					if resolved.source == Some(table.id) && resolved.name == column.name {
						Some((resolved.relation.clone(), constant.clone()))
					} else {
						None
					}
				});
				let Some((relation, constant)) = found else {
					break;
				};
				relation_alias = Some(relation);
				constants.push(constant);
			}
			if constants.len() != index.columns.len() {
				continue;
			}
			let Some(index_column) = input.hidden(relation_alias.as_deref(), &index.column_name()) else {
				continue;
			};
			let index_column = index_column.stmt;

			let mut values = Vec::with_capacity(constants.len());
			for constant in &constants {
				values.push(self.compile_expression(constant, &Bindings::none())?);
			}
			let hash = self.combined_hash(&values);
			debug!(index = %index.name, "select seeded from hash index");
			return Ok(Some(self.program.select(index_column, None, CompareOp::Equal, hash)));
		}
		Ok(None)
	}

	/// Compiles a predicate into the positions of `relation` (restricted to
	/// `sel`) for which it holds.
	pub(crate) fn compile_filter(
		&mut self,
		expr: &Expression,
		relation: &Relation,
		sel: Option<StmtId>,
	) -> crate::Result<StmtId> {
		self.descend(|c| c.filter(expr, relation, sel))
	}

	fn filter(&mut self, expr: &Expression, relation: &Relation, sel: Option<StmtId>) -> crate::Result<StmtId> {
		let bindings = Bindings::left(relation);
		match expr {
			Expression::Compare(compare) => self.filter_compare(expr, compare, relation, sel),
			Expression::Call(call) => {
				if let Some(arg) = single_arg(call, "isnull") {
					return self.filter_null(arg, relation, sel, false);
				}
				if let Some(arg) = single_arg(call, "not") {
					if let Expression::Call(inner) = arg {
						if let Some(arg) = single_arg(inner, "isnull") {
							return self.filter_null(arg, relation, sel, true);
						}
					}
				}
				let value = self.compile_expression(expr, &bindings)?;
				self.select_true(value, relation, sel)
			}
			_ => {
				let value = self.compile_expression(expr, &bindings)?;
				self.select_true(value, relation, sel)
			}
		}
	}

	fn filter_null(
		&mut self,
		arg: &Expression,
		relation: &Relation,
		sel: Option<StmtId>,
		anti: bool,
	) -> crate::Result<StmtId> {
		let value = self.compile_expression(arg, &Bindings::left(relation))?;
		let value = if self.program.is_scalar(value) {
			let rows = self.rows(relation);
			self.program.const_column(value, rows)
		} else {
			value
		};
		Ok(self.program.select_null(value, sel, anti))
	}

	/// Positions where a boolean value is true; scalars select all rows or
	/// none.
	pub(crate) fn select_true(&mut self, value: StmtId, relation: &Relation, sel: Option<StmtId>) -> crate::Result<StmtId> {
		let value = if self.program.is_scalar(value) {
			let rows = self.rows(relation);
			self.program.const_column(value, rows)
		} else {
			value
		};
		let truth = self.boolean(true);
		Ok(self.program.select(value, sel, CompareOp::Equal, truth))
	}

	fn filter_compare(
		&mut self,
		expr: &Expression,
		compare: &CompareExpression,
		relation: &Relation,
		sel: Option<StmtId>,
	) -> crate::Result<StmtId> {
		let bindings = Bindings::left(relation);
		let anti = compare.anti;
		match &compare.comparison {
			Comparison::Binary {
				left,
				op,
				right,
			} => {
				let op = if anti {
					op.negate()
				} else {
					*op
				};
				let l = self.compile_expression(left, &bindings)?;
				let r = self.compile_expression(right, &bindings)?;
				self.check_comparable(op.symbol(), l, r)?;
				match (self.program.is_scalar(l), self.program.is_scalar(r)) {
					(false, _) => Ok(self.program.select(l, sel, op, r)),
					(true, false) => Ok(self.program.select(r, sel, op.swap(), l)),
					(true, true) => {
						let value = self.program.call(op.function_name(), vec![l, r], Type::Boolean);
						self.select_true(value, relation, sel)
					}
				}
			}
			Comparison::Range {
				value,
				low,
				high,
				low_inclusive,
				high_inclusive,
			} => {
				let v = self.compile_expression(value, &bindings)?;
				let lo = self.compile_expression(low, &bindings)?;
				let hi = self.compile_expression(high, &bindings)?;
				self.check_comparable("between", v, lo)?;
				self.check_comparable("between", v, hi)?;
				if self.program.is_scalar(v) {
					let value = self.compile_expression(expr, &bindings)?;
					return self.select_true(value, relation, sel);
				}
				if self.program.is_scalar(lo) && self.program.is_scalar(hi) {
					return Ok(self.program.range_select(
						v,
						sel,
						lo,
						hi,
						*low_inclusive,
						*high_inclusive,
						anti,
					));
				}
				if anti {
					let below = self.program.select(v, sel, lower_op(*low_inclusive).negate(), lo);
					let above = self.program.select(v, sel, upper_op(*high_inclusive).negate(), hi);
					Ok(self.program.union(below, above))
				} else {
					let lower = self.program.select(v, sel, lower_op(*low_inclusive), lo);
					Ok(self.program.select(v, Some(lower), upper_op(*high_inclusive), hi))
				}
			}
			Comparison::In {
				value,
				list,
			} => {
				let v = self.compile_expression(value, &bindings)?;
				if self.program.is_scalar(v) || list.is_empty() {
					let value = self.compile_expression(expr, &bindings)?;
					return self.select_true(value, relation, sel);
				}
				let mut result: Option<StmtId> = None;
				for item in list {
					let item = self.compile_expression(item, &bindings)?;
					self.check_comparable("in", v, item)?;
					result = Some(if anti {
						// chained: each item removes its matches
						self.program.select(v, result.or(sel), CompareOp::NotEqual, item)
					} else {
						let matches = self.program.select(v, sel, CompareOp::Equal, item);
						match result {
							Some(previous) => self.program.union(previous, matches),
							None => matches,
						}
					});
				}
				match result {
					Some(result) => Ok(result),
					None => {
						let value = self.compile_expression(expr, &bindings)?;
						self.select_true(value, relation, sel)
					}
				}
			}
			Comparison::Or {
				left,
				right,
			} => {
				if anti {
					// NOT (a OR b) drops rows where the disjunction is NULL
					let value = self.compile_expression(expr, &bindings)?;
					return self.select_true(value, relation, sel);
				}
				let mut l = sel;
				for expr in left {
					l = Some(self.compile_filter(expr, relation, l)?);
				}
				let mut r = sel;
				for expr in right {
					r = Some(self.compile_filter(expr, relation, r)?);
				}
				let all = match sel {
					Some(sel) => sel,
					None => {
						let rows = self.rows(relation);
						self.program.mirror(rows)
					}
				};
				Ok(self.program.union(l.unwrap_or(all), r.unwrap_or(all)))
			}
			Comparison::Filter {
				function,
				left,
				right,
			} => {
				self.function(function)?;
				let selected = bindings.selected(sel);
				let mut args = Vec::with_capacity(left.len() + right.len());
				for arg in left.iter().chain(right.iter()) {
					args.push(self.compile_expression(arg, &selected)?);
				}
				let value = self.program.call(function, args, Type::Boolean);
				let value = if self.program.is_scalar(value) {
					let rows = match sel {
						Some(sel) => sel,
						None => self.rows(relation),
					};
					self.program.const_column(value, rows)
				} else {
					value
				};
				let expected = self.boolean(!anti);
				let positions = self.program.select(value, None, CompareOp::Equal, expected);
				Ok(match sel {
					Some(sel) => self.program.project(positions, sel),
					None => positions,
				})
			}
		}
	}
}

/// `column = constant` in either orientation.
fn constant_equality(compare: &CompareExpression) -> Option<(&crate::expression::ColumnExpression, &Expression)> {
	if compare.anti {
		return None;
	}
	let Comparison::Binary {
		left,
		op: CompareOp::Equal,
		right,
	} = &compare.comparison
	else {
		return None;
	};
	match (left.as_ref(), right.as_ref()) {
		(Expression::Column(column), constant) if constant.is_constant() => Some((column, constant)),
		(constant, Expression::Column(column)) if constant.is_constant() => Some((column, constant)),
		_ => None,
	}
}
