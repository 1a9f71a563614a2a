// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use quarry_type::Type;
use tracing::{debug, trace};

use crate::{
	compile::{Compiler, dml::Statement},
	error::{BindErrorKind, CompileError},
	expression::AggregateFunction,
	interface::{ColumnId, IndexKind, KeyDef, ReferentialAction, TableDef},
	plan::dataflow::{CompareOp, JoinOp, StmtId},
};

/// Parent rows found for a set of child key values.
pub(crate) struct ParentLookup {
	/// Parent row id per child row; NULL where nothing was checked or
	/// found
	pub ids: StmtId,
	/// Number of child rows without NULL key columns
	pub checked: StmtId,
	/// Number of those rows that found a parent
	pub found: StmtId,
}

impl<'a> Compiler<'a> {
	/// Raises when any value of a NOT NULL column is NULL. With `only`,
	/// just those columns are checked.
	pub(super) fn check_not_null(
		&mut self,
		statement: Statement,
		table: &TableDef,
		values: &[StmtId],
		only: Option<&[ColumnId]>,
	) {
		for (column, value) in table.columns.iter().zip(values.iter()) {
			if column.nullable || only.is_some_and(|only| !only.contains(&column.id)) {
				continue;
			}
			let violated = if self.program.is_scalar(*value) {
				self.program.call("isnull", vec![*value], Type::Boolean)
			} else {
				let nulls = self.program.select_null(*value, None, false);
				self.not_empty(nulls)
			};
			self.program.exception(
				violated,
				format!(
					"{}: NOT NULL constraint violated for column {}.{}",
					statement.prefix(),
					table.name,
					column.name
				),
			);
		}
	}

	/// Matches `probe` values against the stored key columns of the rows
	/// `tids`. Returns (probe positions, positions into `tids`). Multi-column
	/// keys with a persisted hash index over exactly those columns join on
	/// the stored hashes.
	pub(super) fn probe_key(
		&mut self,
		table: &TableDef,
		columns: &[ColumnId],
		tids: StmtId,
		probe: &[StmtId],
	) -> crate::Result<(StmtId, StmtId)> {
		let mut stored = Vec::with_capacity(columns.len());
		for id in columns {
			let column = table
				.column_by_id(*id)
				.ok_or_else(|| CompileError::bind(BindErrorKind::Column, format!("{}.{}", table.name, id)))?;
			let bind = self.program.bind(table.id, column.id, column.ty);
			stored.push(self.program.project(tids, bind));
		}

		if columns.len() > 1 && self.config.hash_index_shortcut {
			let catalog = self.catalog;
			let index = catalog
				.indexes(table)
				.into_iter()
				.find(|index| index.kind == IndexKind::Hash && index.columns.as_slice() == columns);
			if let Some(index) = index {
				trace!(index = %index.name, "key probe through hash index");
				let bind = self.program.bind_index(table.id, index.id, Type::Int8);
				let hashes = self.program.project(tids, bind);
				let probe_hash = self.combined_hash(probe);
				let (probe_ids, stored_ids) =
					self.program.join(probe_hash, hashes, JoinOp::Compare(CompareOp::Equal));
				return Ok(self.refine(probe_ids, stored_ids, probe, &stored));
			}
		}
		Ok(self.equi_join(probe, &stored))
	}

	/// Raises when new key values collide with stored rows other than
	/// `touched`, or with each other.
	pub(super) fn check_unique(
		&mut self,
		statement: Statement,
		table: &TableDef,
		key: &KeyDef,
		values: &[StmtId],
		touched: Option<StmtId>,
	) -> crate::Result<()> {
		let message = format!("{}: {} constraint '{}.{}' violated", statement.prefix(), key.kind_name(), table.name, key.name);
		let tid = self.program.tid(table.id);
		let rows = match touched {
			Some(touched) => self.program.difference(tid, touched),
			None => tid,
		};
		let new = self.select_columns(table, &key.columns, values)?;
		let (conflicts, _) = self.probe_key(table, &key.columns, rows, &new)?;
		let violated = self.not_empty(conflicts);
		self.program.exception(violated, message.clone());

		if new.iter().all(|v| self.program.is_scalar(*v)) {
			return Ok(());
		}
		// duplicates among the new values themselves; NULL keys never collide
		let mut sel = None;
		for value in &new {
			sel = Some(self.program.select_null(*value, sel, true));
		}
		let Some(sel) = sel else {
			return Ok(());
		};
		let present: Vec<StmtId> = new.iter().map(|v| self.program.project(sel, *v)).collect();
		if let Some(group) = self.group_columns(&present)? {
			let largest = self.program.aggregate(group.counts, None, AggregateFunction::Max);
			let one = self.int8(1);
			let duplicated = self.program.call("gt", vec![largest, one], Type::Boolean);
			self.program.exception(duplicated, message);
		}
		Ok(())
	}

	/// Looks up the parent rows of child key values (MATCH SIMPLE: rows
	/// with a NULL key column are not checked).
	pub(super) fn lookup_parents(&mut self, foreign: &KeyDef, child: &[StmtId]) -> crate::Result<ParentLookup> {
		let referenced = foreign
			.references()
			.ok_or_else(|| CompileError::unsupported(format!("'{}' is not a foreign key", foreign.name)))?;
		let parent_key = self.key(referenced)?;
		let parent = self.table(parent_key.table)?;

		let like = child
			.first()
			.copied()
			.ok_or_else(|| CompileError::unsupported(format!("foreign key '{}' without columns", foreign.name)))?;
		let mut sel = None;
		for value in child {
			sel = Some(self.program.select_null(*value, sel, true));
		}
		let sel = sel.unwrap_or(like);
		let checked_values: Vec<StmtId> = child.iter().map(|v| self.program.project(sel, *v)).collect();

		let parent_tid = self.program.tid(parent.id);
		let (child_ids, parent_ids) = self.probe_key(parent, &parent_key.columns, parent_tid, &checked_values)?;

		let checked = self.count(sel);
		let found = self.count(child_ids);
		let positions = self.program.project(child_ids, sel);
		let row_ids = self.program.project(parent_ids, parent_tid);
		let ids = self.program.scatter(like, positions, row_ids);
		Ok(ParentLookup {
			ids,
			checked,
			found,
		})
	}

	/// Raises when a checked child row has no parent. Returns the parent
	/// row id per child row.
	pub(super) fn check_foreign_key(
		&mut self,
		statement: Statement,
		table: &TableDef,
		foreign: &KeyDef,
		values: &[StmtId],
	) -> crate::Result<StmtId> {
		let child = self.select_columns(table, &foreign.columns, values)?;
		let lookup = self.lookup_parents(foreign, &child)?;
		let violated = self.program.call("ne", vec![lookup.found, lookup.checked], Type::Boolean);
		self.program.exception(
			violated,
			format!("{}: FOREIGN KEY constraint '{}.{}' violated", statement.prefix(), table.name, foreign.name),
		);
		Ok(lookup.ids)
	}

	/// Rows of the child table of `foreign` whose key matches `old` parent
	/// key values. Returns (child row ids, positions into `old`).
	pub(super) fn dependent_rows(&mut self, foreign: &KeyDef, old: &[StmtId]) -> crate::Result<(StmtId, StmtId)> {
		let child = self.table(foreign.table)?;
		let tid = self.program.tid(child.id);
		let (parent_positions, child_positions) = self.probe_key(child, &foreign.columns, tid, old)?;
		let child_ids = self.program.project(child_positions, tid);
		Ok((child_ids, parent_positions))
	}

	/// RESTRICT and NO ACTION: raises when removed or changed parent key
	/// values are still referenced. `statement` selects the action,
	/// `origin` names the statement in the message.
	pub(super) fn check_restrict(
		&mut self,
		statement: Statement,
		origin: Statement,
		referencing: &[&KeyDef],
		old: &[StmtId],
	) -> crate::Result<()> {
		for foreign in referencing {
			if !matches!(action(statement, foreign), Some(ReferentialAction::Restrict | ReferentialAction::NoAction)) {
				continue;
			}
			let child = self.table(foreign.table)?;
			let (child_ids, _) = self.dependent_rows(foreign, old)?;
			let violated = self.not_empty(child_ids);
			debug!(key = %foreign.name, "restrict probe");
			self.program.exception(
				violated,
				format!("{}: FOREIGN KEY constraint '{}.{}' violated", origin.prefix(), child.name, foreign.name),
			);
		}
		Ok(())
	}
}

/// The referential action a parent statement triggers on `foreign`.
pub(super) fn action(statement: Statement, foreign: &KeyDef) -> Option<ReferentialAction> {
	match foreign.kind {
		crate::interface::KeyKind::Foreign {
			on_update,
			on_delete,
			..
		} => match statement {
			Statement::Update => Some(on_update),
			Statement::Delete => Some(on_delete),
			Statement::Insert => None,
		},
		_ => None,
	}
}
