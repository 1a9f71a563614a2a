// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use tracing::debug;

use crate::{
	compile::{Compiler, Relation},
	interface::{TableDef, TriggerEvent, TriggerTime},
	plan::dataflow::StmtId,
};

impl<'a> Compiler<'a> {
	/// Compiles the bodies of the triggers for `time` and `event` inline.
	/// The rows before and after the change (aligned with the table's
	/// columns) are visible under the trigger's old and new names.
	pub(super) fn fire_triggers(
		&mut self,
		table: &TableDef,
		time: TriggerTime,
		event: TriggerEvent,
		old: Option<&[StmtId]>,
		new: Option<&[StmtId]>,
	) -> crate::Result<()> {
		let catalog = self.catalog;
		for trigger in catalog.triggers(table, time, event) {
			let mut relation = Relation::new();
			if let Some(old) = old {
				for (column, stmt) in table.columns.iter().zip(old.iter()) {
					relation.push(trigger.old_name(), column.name.clone(), *stmt, None);
				}
			}
			if let Some(new) = new {
				for (column, stmt) in table.columns.iter().zip(new.iter()) {
					relation.push(trigger.new_name(), column.name.clone(), *stmt, None);
				}
			}
			debug!(trigger = %trigger.name, ?time, ?event, "compiling trigger");
			self.push_scope(Some(relation));
			let result = self.compile_statements(&trigger.body);
			self.pop_scope();
			result?;
		}
		Ok(())
	}
}
