// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use quarry_type::{Type, Value, hash::combine_bits};
use tracing::{debug, instrument, trace};

use crate::{
	compile::{Bindings, Compiler, RelColumn, Relation},
	expression::{CompareExpression, CompareOp, Comparison, Expression},
	interface::IndexKind,
	plan::{
		dataflow::{JoinOp, StmtId},
		logical::{JoinKind, LogicalPlan, NodeId, Property},
	},
};

/// Which input relation an expression's columns come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
	Left,
	Right,
	Both,
	Neither,
}

impl Side {
	fn merge(self, other: Side) -> Side {
		match (self, other) {
			(Side::Neither, side) | (side, Side::Neither) => side,
			(a, b) if a == b => a,
			_ => Side::Both,
		}
	}

	fn is_single(self) -> bool {
		matches!(self, Side::Left | Side::Right)
	}
}

fn side_of_column(relation: Option<&str>, name: &str, left: &Relation, right: &Relation) -> Side {
	let in_left = matches!(left.find(relation, name), Ok(Some(_)));
	let in_right = matches!(right.find(relation, name), Ok(Some(_)));
	match (in_left, in_right) {
		(true, false) => Side::Left,
		(false, true) => Side::Right,
		(true, true) => Side::Both,
		(false, false) => Side::Neither,
	}
}

fn side_of(expr: &Expression, left: &Relation, right: &Relation) -> Side {
	expr.columns()
		.iter()
		.map(|c| side_of_column(c.relation.as_deref(), &c.name, left, right))
		.fold(Side::Neither, Side::merge)
}

fn sides_of(exprs: &[Expression], left: &Relation, right: &Relation) -> Side {
	exprs.iter().map(|e| side_of(e, left, right)).fold(Side::Neither, Side::merge)
}

/// `column = column` with one column from each input, oriented as
/// (left column, right column).
fn equality<'r>(expr: &Expression, left: &'r Relation, right: &'r Relation) -> Option<(&'r RelColumn, &'r RelColumn)> {
	let Expression::Compare(compare) = expr else {
		return None;
	};
	let (a, b) = compare.as_column_equality()?;
	let a_side = side_of_column(a.relation.as_deref(), &a.name, left, right);
	let b_side = side_of_column(b.relation.as_deref(), &b.name, left, right);
	match (a_side, b_side) {
		(Side::Left, Side::Right) => Some((
			left.find(a.relation.as_deref(), &a.name).ok()??,
			right.find(b.relation.as_deref(), &b.name).ok()??,
		)),
		(Side::Right, Side::Left) => Some((
			left.find(b.relation.as_deref(), &b.name).ok()??,
			right.find(a.relation.as_deref(), &a.name).ok()??,
		)),
		_ => None,
	}
}

impl<'a> Compiler<'a> {
	/// Combined hash of aligned key columns: hash of the first, every
	/// further column rotated and xor'ed in.
	pub(crate) fn combined_hash(&mut self, columns: &[StmtId]) -> StmtId {
		let bits = self.program.constant(Value::Int4(combine_bits(columns.len()) as i32));
		let mut iter = columns.iter();
		let Some(first) = iter.next() else {
			return self.int8(0);
		};
		let mut hash = self.program.call("hash", vec![*first], Type::Int8);
		for column in iter {
			hash = self.program.call("rotate_xor_hash", vec![hash, bits, *column], Type::Int8);
		}
		hash
	}

	/// Equi-join on aligned key column lists. A single column joins
	/// directly; several join on their combined hash and every pair of key
	/// columns is then re-checked.
	pub(crate) fn equi_join(&mut self, left: &[StmtId], right: &[StmtId]) -> (StmtId, StmtId) {
		if left.len() == 1 {
			return self.program.join(left[0], right[0], JoinOp::Compare(CompareOp::Equal));
		}
		let l = self.combined_hash(left);
		let r = self.combined_hash(right);
		let (lids, rids) = self.program.join(l, r, JoinOp::Compare(CompareOp::Equal));
		self.refine(lids, rids, left, right)
	}

	/// Keeps the pairs whose key columns are pairwise equal.
	pub(crate) fn refine(&mut self, mut lids: StmtId, mut rids: StmtId, left: &[StmtId], right: &[StmtId]) -> (StmtId, StmtId) {
		for (l, r) in left.iter().zip(right.iter()) {
			let lv = self.program.project(lids, *l);
			let rv = self.program.project(rids, *r);
			let equal = self.program.call("eq", vec![lv, rv], Type::Boolean);
			let truth = self.boolean(true);
			let keep = self.program.select(equal, None, CompareOp::Equal, truth);
			lids = self.program.project(keep, lids);
			rids = self.program.project(keep, rids);
		}
		(lids, rids)
	}

	#[instrument(name = "rql::compile::join", level = "trace", skip(self, plan, left, right))]
	pub(crate) fn compile_join(
		&mut self,
		plan: &mut LogicalPlan,
		id: NodeId,
		kind: JoinKind,
		left: &Relation,
		right: &Relation,
	) -> crate::Result<Relation> {
		let run = plan.reorder_predicates(id, |e| equality(e, left, right).is_some());
		let node = plan.node(id);
		let predicates: Vec<Expression> = node.exprs.iter().map(|e| e.expression.clone()).collect();
		let properties = node.properties.clone();
		trace!(predicates = predicates.len(), equalities = run, "join predicates");

		let (lids, rids, residual) = match self.join_index(&properties, left, right)? {
			Some((lids, rids)) => (lids, rids, &predicates[..]),
			None => match run {
				0 => self.theta_join(&predicates, left, right)?,
				1 => {
					let (l, r) = equality(&predicates[0], left, right)
						.map(|(l, r)| (l.stmt, r.stmt))
						.ok_or_else(|| crate::CompileError::unsupported("join equality"))?;
					let (lids, rids) = self.program.join(l, r, JoinOp::Compare(CompareOp::Equal));
					(lids, rids, &predicates[1..])
				}
				_ => {
					let pairs: Vec<(RelColumn, RelColumn)> = predicates[..run]
						.iter()
						.filter_map(|p| equality(p, left, right))
						.map(|(l, r)| (l.clone(), r.clone()))
						.collect();
					let (lids, rids) = self.multi_column_join(&pairs, &properties, left, right)?;
					(lids, rids, &predicates[run..])
				}
			},
		};

		let (lids, rids) = self.residual(residual, left, right, lids, rids)?;
		Ok(self.complete_join(kind, left, right, lids, rids))
	}

	/// Joins along a foreign key's join index: the child's index column
	/// holds parent row ids.
	fn join_index(
		&mut self,
		properties: &[Property],
		left: &Relation,
		right: &Relation,
	) -> crate::Result<Option<(StmtId, StmtId)>> {
		for property in properties {
			let Property::JoinIndex {
				index,
				..
			} = property
			else {
				continue;
			};
			let index = self.index(*index)?;
			let IndexKind::Join {
				key,
			} = index.kind
			else {
				continue;
			};
			let Some(parent_key) = self.key(key)?.references() else {
				continue;
			};
			let parent = self.key(parent_key)?.table;
			let name = index.column_name();

			let hidden = |relation: &Relation| {
				relation.columns.iter().find(|c| c.name == name && c.source == Some(index.table)).map(|c| c.stmt)
			};
			if let (Some(column), Some(tid)) = (hidden(left), right.tid(parent)) {
				debug!(index = %index.name, "join through join index");
				return Ok(Some(self.program.join(column, tid, JoinOp::Compare(CompareOp::Equal))));
			}
			if let (Some(column), Some(tid)) = (hidden(right), left.tid(parent)) {
				debug!(index = %index.name, "join through join index");
				let (rids, lids) = self.program.join(column, tid, JoinOp::Compare(CompareOp::Equal));
				return Ok(Some((lids, rids)));
			}
		}
		Ok(None)
	}

	/// Several equalities: seeded from a persisted hash index when one is
	/// covered by them, else joined on the combined hash of both sides.
	fn multi_column_join(
		&mut self,
		pairs: &[(RelColumn, RelColumn)],
		properties: &[Property],
		left: &Relation,
		right: &Relation,
	) -> crate::Result<(StmtId, StmtId)> {
		let lcols: Vec<StmtId> = pairs.iter().map(|(l, _)| l.stmt).collect();
		let rcols: Vec<StmtId> = pairs.iter().map(|(_, r)| r.stmt).collect();

		if self.config.hash_index_shortcut {
			let mut candidates: Vec<_> = properties
				.iter()
				.filter_map(|p| match p {
					Property::HashIndex {
						predicate,
						index,
					} if *predicate < pairs.len() => Some((*predicate, *index)),
					_ => None,
				})
				.collect();
			candidates.sort_by_key(|(predicate, _)| *predicate);

			for (_, index) in candidates {
				let index = self.index(index)?;
				if !index.is_hash() {
					continue;
				}
				let table = self.table(index.table)?;
				let names: Vec<&str> = index
					.columns
					.iter()
					.filter_map(|c| table.column_by_id(*c).map(|c| c.name.as_str()))
					.collect();
				if names.len() != index.columns.len() {
					continue;
				}

				// the indexed side is whichever side supplies every index column
				for indexed_left in [true, false] {
					let (indexed, relation) = if indexed_left {
						(pairs.iter().map(|(l, r)| (l, r)).collect::<Vec<_>>(), left)
					} else {
						(pairs.iter().map(|(l, r)| (r, l)).collect::<Vec<_>>(), right)
					};
					let other: Option<Vec<StmtId>> = names
						.iter()
						.map(|name| {
							indexed.iter()
								.find(|(own, _)| own.source == Some(table.id) && own.name == *name)
								.map(|(_, other)| other.stmt)
						})
						.collect();
					let Some(other) = other else {
						continue;
					};
					let relation_alias = indexed
						.iter()
						.find(|(own, _)| own.source == Some(table.id))
						.map(|(own, _)| own.relation.clone());
					let Some(column) = relation.hidden(relation_alias.as_deref(), &index.column_name()) else {
						continue;
					};
					let column = column.stmt;
					let hash = self.combined_hash(&other);
					debug!(index = %index.name, "join seeded from hash index");
					let (lids, rids) = if indexed_left {
						self.program.join(column, hash, JoinOp::Compare(CompareOp::Equal))
					} else {
						let (rids, lids) = self.program.join(column, hash, JoinOp::Compare(CompareOp::Equal));
						(lids, rids)
					};
					return Ok(self.refine(lids, rids, &lcols, &rcols));
				}
			}
		}

		Ok(self.equi_join(&lcols, &rcols))
	}

	/// No usable equality: the first predicate that splits across the
	/// inputs drives a theta, range or filter join; otherwise a cross join.
	fn theta_join<'p>(
		&mut self,
		predicates: &'p [Expression],
		left: &Relation,
		right: &Relation,
	) -> crate::Result<(StmtId, StmtId, &'p [Expression])> {
		for predicate in predicates {
			let Expression::Compare(compare) = predicate else {
				continue;
			};
			// the driving predicate is re-applied with the others
			if let Some((lids, rids)) = self.split_join(compare, left, right)? {
				return Ok((lids, rids, predicates));
			}
		}
		let l = self.rows(left);
		let r = self.rows(right);
		let (lids, rids) = self.program.join(l, r, JoinOp::Cross);
		Ok((lids, rids, predicates))
	}

	fn split_join(
		&mut self,
		compare: &CompareExpression,
		left: &Relation,
		right: &Relation,
	) -> crate::Result<Option<(StmtId, StmtId)>> {
		match &compare.comparison {
			Comparison::Binary {
				left: a,
				op,
				right: b,
			} => {
				let op = if compare.anti {
					op.negate()
				} else {
					*op
				};
				let (a_side, b_side) = (side_of(a, left, right), side_of(b, left, right));
				if !a_side.is_single() || !b_side.is_single() || a_side == b_side {
					return Ok(None);
				}
				let (l_expr, r_expr, op) = if a_side == Side::Left {
					(a, b, op)
				} else {
					(b, a, op.swap())
				};
				let l = self.compile_expression(l_expr, &Bindings::left(left))?;
				let r = self.compile_expression(r_expr, &Bindings::left(right))?;
				self.check_comparable(op.symbol(), l, r)?;
				Ok(Some(self.program.join(l, r, JoinOp::Compare(op))))
			}
			Comparison::Range {
				value,
				low,
				high,
				low_inclusive,
				high_inclusive,
			} => {
				let value_side = side_of(value, left, right);
				let bound_side = side_of(low, left, right).merge(side_of(high, left, right));
				if !value_side.is_single() || !bound_side.is_single() || value_side == bound_side {
					return Ok(None);
				}
				let (value_rel, bound_rel) = if value_side == Side::Left {
					(left, right)
				} else {
					(right, left)
				};
				let v = self.compile_expression(value, &Bindings::left(value_rel))?;
				let lo = self.compile_expression(low, &Bindings::left(bound_rel))?;
				let hi = self.compile_expression(high, &Bindings::left(bound_rel))?;
				self.check_comparable("between", v, lo)?;
				self.check_comparable("between", v, hi)?;
				let anchor = bound_rel.anchor(&self.program);
				let lo = self.broadcast(lo, anchor);
				let hi = self.broadcast(hi, anchor);
				let (value_ids, bound_ids) =
					self.program.range_join(v, lo, hi, *low_inclusive, *high_inclusive, compare.anti);
				Ok(Some(if value_side == Side::Left {
					(value_ids, bound_ids)
				} else {
					(bound_ids, value_ids)
				}))
			}
			Comparison::Filter {
				function,
				left: largs,
				right: rargs,
			} => {
				if compare.anti {
					return Ok(None);
				}
				let (l_side, r_side) = (sides_of(largs, left, right), sides_of(rargs, left, right));
				if !l_side.is_single() || !r_side.is_single() || l_side == r_side {
					return Ok(None);
				}
				self.function(function)?;
				let (first_rel, second_rel) = if l_side == Side::Left {
					(left, right)
				} else {
					(right, left)
				};
				let mut first = Vec::with_capacity(largs.len());
				for arg in largs {
					let stmt = self.compile_expression(arg, &Bindings::left(first_rel))?;
					let anchor = first_rel.anchor(&self.program);
					first.push(self.broadcast(stmt, anchor));
				}
				let mut second = Vec::with_capacity(rargs.len());
				for arg in rargs {
					let stmt = self.compile_expression(arg, &Bindings::left(second_rel))?;
					let anchor = second_rel.anchor(&self.program);
					second.push(self.broadcast(stmt, anchor));
				}
				let (first_ids, second_ids) = self.program.filter_join(function, first, second);
				Ok(Some(if l_side == Side::Left {
					(first_ids, second_ids)
				} else {
					(second_ids, first_ids)
				}))
			}
			Comparison::In {
				..
			}
			| Comparison::Or {
				..
			} => Ok(None),
		}
	}

	/// Applies the remaining predicates as filters over the joined pairs.
	fn residual(
		&mut self,
		predicates: &[Expression],
		left: &Relation,
		right: &Relation,
		lids: StmtId,
		rids: StmtId,
	) -> crate::Result<(StmtId, StmtId)> {
		if predicates.is_empty() {
			return Ok((lids, rids));
		}
		let joined = left.project(&mut self.program, lids).concat(right.project(&mut self.program, rids));
		let mut sel = None;
		for predicate in predicates {
			sel = Some(self.compile_filter(predicate, &joined, sel)?);
		}
		Ok(match sel {
			Some(sel) => (self.program.project(sel, lids), self.program.project(sel, rids)),
			None => (lids, rids),
		})
	}

	/// Typed NULL columns shaped like `like` for every column of `relation`.
	fn nulls(&mut self, relation: &Relation, like: StmtId) -> Relation {
		let mut result = Relation::new();
		for column in &relation.columns {
			let ty = self.program.ty(column.stmt);
			let null = self.program.null(ty);
			let stmt = self.program.const_column(null, like);
			result.push(column.relation.clone(), column.name.clone(), stmt, None);
		}
		result
	}

	fn append(&mut self, first: Relation, second: Relation) -> Relation {
		let mut result = Relation::new();
		for (a, b) in first.columns.into_iter().zip(second.columns) {
			let stmt = self.program.append(a.stmt, b.stmt);
			result.push(a.relation, a.name, stmt, None);
		}
		result
	}

	fn complete_join(&mut self, kind: JoinKind, left: &Relation, right: &Relation, lids: StmtId, rids: StmtId) -> Relation {
		match kind {
			JoinKind::Inner => left.project(&mut self.program, lids).concat(right.project(&mut self.program, rids)),
			JoinKind::Left => {
				let unmatched = self.unmatched(left, lids);
				let l = left.project(&mut self.program, lids);
				let lu = left.project(&mut self.program, unmatched);
				let r = right.project(&mut self.program, rids);
				let ru = self.nulls(right, unmatched);
				let l = self.append(l, lu);
				let r = self.append(r, ru);
				l.concat(r)
			}
			JoinKind::Right => {
				let unmatched = self.unmatched(right, rids);
				let l = left.project(&mut self.program, lids);
				let lu = self.nulls(left, unmatched);
				let r = right.project(&mut self.program, rids);
				let ru = right.project(&mut self.program, unmatched);
				let l = self.append(l, lu);
				let r = self.append(r, ru);
				l.concat(r)
			}
			JoinKind::Full => {
				let left_unmatched = self.unmatched(left, lids);
				let right_unmatched = self.unmatched(right, rids);
				let l = left.project(&mut self.program, lids);
				let l_lu = left.project(&mut self.program, left_unmatched);
				let l_ru = self.nulls(left, right_unmatched);
				let r = right.project(&mut self.program, rids);
				let r_lu = self.nulls(right, left_unmatched);
				let r_ru = right.project(&mut self.program, right_unmatched);
				let l = self.append(l, l_lu);
				let l = self.append(l, l_ru);
				let r = self.append(r, r_lu);
				let r = self.append(r, r_ru);
				l.concat(r)
			}
			JoinKind::Semi => {
				let rows = self.rows(left);
				let all = self.program.mirror(rows);
				let matched = self.program.intersect(all, lids);
				left.project(&mut self.program, matched)
			}
			JoinKind::Anti => {
				let rows = self.rows(left);
				let all = self.program.mirror(rows);
				let unmatched = self.program.difference(all, lids);
				left.project(&mut self.program, unmatched)
			}
		}
	}

	/// Positions of `relation` that no pair references.
	fn unmatched(&mut self, relation: &Relation, ids: StmtId) -> StmtId {
		let rows = self.rows(relation);
		let all = self.program.mirror(rows);
		self.program.difference(all, ids)
	}
}
