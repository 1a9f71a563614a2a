// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use tracing::{debug, instrument};

use crate::{
	compile::{Compiler, Relation, dml::Statement, relation::TID},
	error::{BindErrorKind, CompileError},
	interface::{TableDef, TableId, TriggerEvent, TriggerTime},
	plan::dataflow::StmtId,
};

impl<'a> Compiler<'a> {
	#[instrument(name = "rql::compile::delete", level = "debug", skip(self, input))]
	pub(crate) fn compile_delete(&mut self, table: TableId, input: Option<Relation>) -> crate::Result<Relation> {
		let table = self.table(table)?;
		let catalog = self.catalog;
		let observed = !self.referenced_keys(table).is_empty()
			|| !catalog.triggers(table, TriggerTime::Before, TriggerEvent::Delete).is_empty()
			|| !catalog.triggers(table, TriggerTime::After, TriggerEvent::Delete).is_empty();

		let count = match input {
			None if !observed => {
				debug!(table = %table.name, "delete compiled to clear");
				let tid = self.program.tid(table.id);
				let count = self.count(tid);
				self.program.clear(table.id);
				count
			}
			None => {
				let tids = self.program.tid(table.id);
				self.delete_rows(table, tids)?
			}
			Some(input) => {
				let tids = input.tid(table.id).ok_or_else(|| {
					CompileError::bind(
						BindErrorKind::RowIds {
							relation: table.name.clone(),
						},
						TID,
					)
				})?;
				self.delete_rows(table, tids)?
			}
		};
		self.affected(count);
		Ok(Relation::new())
	}

	/// Deletes the rows `tids` of `table`. Returns the number of deleted
	/// rows.
	pub(super) fn delete_rows(&mut self, table: &'a TableDef, tids: StmtId) -> crate::Result<StmtId> {
		let old = self.read_columns(table, tids);

		let mut removed = Vec::new();
		for (key, referencing) in self.referenced_keys(table) {
			let old_key = self.select_columns(table, &key.columns, &old)?;
			self.check_restrict(Statement::Delete, Statement::Delete, &referencing, &old_key)?;
			removed.push((referencing, old_key));
		}

		self.fire_triggers(table, TriggerTime::Before, TriggerEvent::Delete, Some(&old), None)?;
		self.program.delete(table.id, tids);
		for (referencing, old_key) in removed {
			self.referential_actions(Statement::Delete, Statement::Delete, &referencing, &old_key, None)?;
		}
		self.fire_triggers(table, TriggerTime::After, TriggerEvent::Delete, Some(&old), None)?;
		Ok(self.count(tids))
	}
}
