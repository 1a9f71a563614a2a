// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::collections::HashMap;

use tracing::{debug, instrument};

use crate::{
	compile::{
		Compiler, Relation,
		dml::Statement,
	},
	interface::{IndexKind, KeyId, TableId, TriggerEvent, TriggerTime},
	plan::dataflow::StmtId,
};

impl<'a> Compiler<'a> {
	#[instrument(name = "rql::compile::insert", level = "debug", skip(self, input))]
	pub(crate) fn compile_insert(&mut self, table: TableId, input: Relation) -> crate::Result<Relation> {
		let table = self.table(table)?;
		let input = input.without_hidden();

		// input columns map to table columns by name
		let mut values = Vec::with_capacity(table.columns.len());
		for column in &table.columns {
			let value = match input.find(None, &column.name)? {
				Some(found) => {
					let stmt = found.stmt;
					self.assign_value(&column.name, column.ty, stmt)?
				}
				None => match &column.default {
					Some(default) => {
						let constant = self.program.constant(default.clone());
						self.assign_value(&column.name, column.ty, constant)?
					}
					None => self.program.null(column.ty),
				},
			};
			values.push(value);
		}

		// a row of scalars becomes a one-row column; otherwise scalars
		// repeat per input row
		let anchor = values.iter().copied().find(|v| !self.program.is_scalar(*v));
		let values: Vec<StmtId> = match anchor {
			None => values.into_iter().map(|v| self.program.values(vec![v])).collect(),
			Some(anchor) => values.into_iter().map(|v| self.broadcast(v, Some(anchor))).collect(),
		};

		self.check_not_null(Statement::Insert, table, &values, None);
		let catalog = self.catalog;
		let mut parents: HashMap<KeyId, StmtId> = HashMap::new();
		for key in catalog.keys(table) {
			if key.is_unique() {
				self.check_unique(Statement::Insert, table, key, &values, None)?;
			} else if key.is_foreign() {
				let ids = self.check_foreign_key(Statement::Insert, table, key, &values)?;
				parents.insert(key.id, ids);
			}
		}

		self.fire_triggers(table, TriggerTime::Before, TriggerEvent::Insert, None, Some(&values))?;
		let tids = self.program.insert(table.id, values.clone());
		for index in catalog.indexes(table) {
			let stored = match index.kind {
				IndexKind::Hash => {
					let columns = self.select_columns(table, &index.columns, &values)?;
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
		self.fire_triggers(table, TriggerTime::After, TriggerEvent::Insert, None, Some(&values))?;

		let count = self.count(tids);
		self.affected(count);
		debug!(table = %table.name, "insert compiled");
		Ok(Relation::new())
	}
}
