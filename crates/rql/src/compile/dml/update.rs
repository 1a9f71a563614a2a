// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::collections::HashMap;

use quarry_type::Type;
use tracing::{debug, instrument};

use crate::{
	compile::{
		Bindings, Compiler, Relation,
		dml::{Statement, constraint::action},
	},
	error::{BindErrorKind, CompileError},
	expression::AliasExpression,
	interface::{ColumnId, IndexKind, KeyDef, KeyId, ReferentialAction, TableDef, TableId, TriggerEvent, TriggerTime},
	plan::dataflow::{CompareOp, StmtId},
};

impl<'a> Compiler<'a> {
	#[instrument(name = "rql::compile::update", level = "debug", skip(self, input, assignments))]
	pub(crate) fn compile_update(
		&mut self,
		table: TableId,
		input: Relation,
		assignments: &[AliasExpression],
	) -> crate::Result<Relation> {
		let table = self.table(table)?;
		let tids = input.tid(table.id).ok_or_else(|| {
			CompileError::bind(
				BindErrorKind::RowIds {
					relation: table.name.clone(),
				},
				crate::compile::relation::TID,
			)
		})?;

		let bindings = Bindings::left(&input);
		let mut values = Vec::with_capacity(assignments.len());
		for assignment in assignments {
			let name = assignment.name();
			let column = table
				.column(&name)
				.ok_or_else(|| CompileError::bind(BindErrorKind::Column, format!("{}.{}", table.name, name)))?;
			let value = self.compile_expression(&assignment.expression, &bindings)?;
			let value = self.assign_value(&column.name, column.ty, value)?;
			let value = self.broadcast(value, Some(tids));
			values.push((column.id, value));
		}

		let count = self.update_rows(Statement::Update, table, tids, &values, None)?;
		self.affected(count);
		Ok(Relation::new())
	}

	/// Updates the rows `tids` of `table`; `assignments` are aligned with
	/// `tids`. `origin` is the statement whose violations are reported.
	/// `skip_foreign` names a foreign key whose check is skipped because the
	/// update is the referential action it drives. Returns the number of
	/// updated rows.
	pub(super) fn update_rows(
		&mut self,
		origin: Statement,
		table: &'a TableDef,
		tids: StmtId,
		assignments: &[(ColumnId, StmtId)],
		skip_foreign: Option<KeyId>,
	) -> crate::Result<StmtId> {
		let assigned: Vec<ColumnId> = assignments.iter().map(|(c, _)| *c).collect();
		let touches = |columns: &[ColumnId]| columns.iter().any(|c| assigned.contains(c));

		// old values are read before any write of this statement
		let old = self.read_columns(table, tids);
		let mut new = old.clone();
		for (column, value) in assignments {
			if let Some(position) = table.position(*column) {
				new[position] = *value;
			}
		}

		self.check_not_null(origin, table, &new, Some(&assigned));
		let catalog = self.catalog;
		let mut parents: HashMap<KeyId, StmtId> = HashMap::new();
		for key in catalog.keys(table) {
			if !touches(&key.columns) {
				continue;
			}
			if key.is_unique() {
				self.check_unique(origin, table, key, &new, Some(tids))?;
			} else if key.is_foreign() {
				let ids = if skip_foreign == Some(key.id) {
					let child = self.select_columns(table, &key.columns, &new)?;
					self.lookup_parents(key, &child)?.ids
				} else {
					self.check_foreign_key(origin, table, key, &new)?
				};
				parents.insert(key.id, ids);
			}
		}

		// referenced keys whose values change on some rows
		let mut changes = Vec::new();
		for (key, referencing) in self.referenced_keys(table) {
			if !touches(&key.columns) {
				continue;
			}
			let old_key = self.select_columns(table, &key.columns, &old)?;
			let new_key = self.select_columns(table, &key.columns, &new)?;
			let mut changed = None;
			for (o, n) in old_key.iter().zip(new_key.iter()) {
				let differs = self.distinct_from(*o, *n);
				changed = Some(match changed {
					Some(previous) => self.program.call("or", vec![previous, differs], Type::Boolean),
					None => differs,
				});
			}
			let Some(changed) = changed else {
				continue;
			};
			let truth = self.boolean(true);
			let rows = self.program.select(changed, None, CompareOp::Equal, truth);
			let old_key: Vec<StmtId> = old_key.iter().map(|c| self.program.project(rows, *c)).collect();
			let new_key: Vec<StmtId> = new_key.iter().map(|c| self.program.project(rows, *c)).collect();
			self.check_restrict(Statement::Update, origin, &referencing, &old_key)?;
			changes.push((referencing, old_key, new_key));
		}

		self.fire_triggers(table, TriggerTime::Before, TriggerEvent::Update, Some(&old), Some(&new))?;
		for (column, value) in assignments {
			self.program.update_column(table.id, *column, tids, *value);
		}
		for index in catalog.indexes(table) {
			if !touches(&index.columns) {
				continue;
			}
			let stored = match index.kind {
				IndexKind::Hash => {
					let columns = self.select_columns(table, &index.columns, &new)?;
					self.combined_hash(&columns)
				}
				IndexKind::Join {
					key,
				} => match parents.get(&key) {
					Some(ids) => *ids,
					None => continue,
				},
			};
			self.program.index_write(table.id, index.id, tids, stored);
		}

		for (referencing, old_key, new_key) in changes {
			self.referential_actions(Statement::Update, origin, &referencing, &old_key, Some(&new_key))?;
		}
		self.fire_triggers(table, TriggerTime::After, TriggerEvent::Update, Some(&old), Some(&new))?;
		Ok(self.count(tids))
	}

	/// NULL-safe inequality: true when exactly one side is NULL or both are
	/// non-NULL and differ, false otherwise.
	fn distinct_from(&mut self, old: StmtId, new: StmtId) -> StmtId {
		let differs = self.program.call("ne", vec![old, new], Type::Boolean);
		let old_null = self.program.call("isnull", vec![old], Type::Boolean);
		let new_null = self.program.call("isnull", vec![new], Type::Boolean);
		let nullness = self.program.call("ne", vec![old_null, new_null], Type::Boolean);
		self.program.call("or", vec![differs, nullness], Type::Boolean)
	}

	/// Applies the CASCADE, SET NULL and SET DEFAULT actions of the
	/// foreign keys referencing changed or removed parent key values.
	/// `new` holds the replacement key values of an update.
	pub(super) fn referential_actions(
		&mut self,
		statement: Statement,
		origin: Statement,
		referencing: &[&'a KeyDef],
		old: &[StmtId],
		new: Option<&[StmtId]>,
	) -> crate::Result<()> {
		for foreign in referencing {
			let Some(action) = action(statement, foreign) else {
				continue;
			};
			if matches!(action, ReferentialAction::Restrict | ReferentialAction::NoAction) {
				continue;
			}
			if self.cascades.contains(&foreign.id) {
				debug!(key = %foreign.name, "referential action already expanding");
				continue;
			}
			let child = self.table(foreign.table)?;
			let (child_ids, positions) = self.dependent_rows(foreign, old)?;
			debug!(key = %foreign.name, %action, ?statement, "expanding referential action");

			self.cascades.push(foreign.id);
			self.nesting += 1;
			let result = self.apply_action(statement, origin, action, child, foreign, child_ids, positions, new);
			self.nesting -= 1;
			self.cascades.pop();
			result?;
		}
		Ok(())
	}

	#[allow(clippy::too_many_arguments)]
	fn apply_action(
		&mut self,
		statement: Statement,
		origin: Statement,
		action: ReferentialAction,
		child: &'a TableDef,
		foreign: &KeyDef,
		child_ids: StmtId,
		positions: StmtId,
		new: Option<&[StmtId]>,
	) -> crate::Result<()> {
		match (action, statement, new) {
			(ReferentialAction::Cascade, Statement::Delete, _) => {
				self.delete_rows(child, child_ids)?;
			}
			(ReferentialAction::Cascade, Statement::Update, Some(new)) => {
				let mut assignments = Vec::with_capacity(foreign.columns.len());
				for (id, value) in foreign.columns.iter().zip(new.iter()) {
					let column = child.column_by_id(*id).ok_or_else(|| {
						CompileError::bind(BindErrorKind::Column, format!("{}.{}", child.name, id))
					})?;
					let value = self.program.project(positions, *value);
					let value = self.assign_value(&column.name, column.ty, value)?;
					assignments.push((column.id, value));
				}
				self.update_rows(origin, child, child_ids, &assignments, Some(foreign.id))?;
			}
			(ReferentialAction::SetNull, _, _) | (ReferentialAction::SetDefault, _, _) => {
				let mut assignments = Vec::with_capacity(foreign.columns.len());
				for id in &foreign.columns {
					let column = child.column_by_id(*id).ok_or_else(|| {
						CompileError::bind(BindErrorKind::Column, format!("{}.{}", child.name, id))
					})?;
					let value = match (action, &column.default) {
						(ReferentialAction::SetDefault, Some(default)) => {
							let constant = self.program.constant(default.clone());
							self.assign_value(&column.name, column.ty, constant)?
						}
						_ => self.program.null(column.ty),
					};
					let value = self.program.const_column(value, child_ids);
					assignments.push((column.id, value));
				}
				// SET NULL can never violate the key; SET DEFAULT is checked
				let skip = (action == ReferentialAction::SetNull).then_some(foreign.id);
				self.update_rows(origin, child, child_ids, &assignments, skip)?;
			}
			_ => {}
		}
		Ok(())
	}
}
