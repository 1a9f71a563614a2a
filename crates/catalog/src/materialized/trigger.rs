// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use quarry_rql::{
	expression::Expression,
	interface::{Catalog, TableId, TriggerDef, TriggerEvent, TriggerId, TriggerTime},
};
use quarry_type::{
	error::diagnostic::catalog::{object_already_exists, object_not_found},
	return_error,
};
use tracing::debug;

use crate::materialized::{MaterializedCatalog, next};

#[derive(Debug, Clone)]
pub struct TriggerToCreate {
	pub table: TableId,
	pub name: String,
	pub time: TriggerTime,
	pub event: TriggerEvent,
	pub old_name: Option<String>,
	pub new_name: Option<String>,
	pub body: Vec<Expression>,
}

impl MaterializedCatalog {
	pub fn create_trigger(&mut self, to_create: TriggerToCreate) -> crate::Result<TriggerId> {
		let Some(table) = self.table(to_create.table) else {
			return_error!(object_not_found("table", &to_create.table.to_string()));
		};
		if self.triggers.values().any(|t| t.table == table.id && t.name == to_create.name) {
			return_error!(object_already_exists("trigger", &format!("{}.{}", table.name, to_create.name)));
		}

		let id = TriggerId(next(&mut self.sequence.trigger));
		debug!(trigger = %to_create.name, time = ?to_create.time, event = ?to_create.event, "create trigger");
		let table = to_create.table;
		self.triggers.insert(
			id,
			TriggerDef {
				id,
				table,
				name: to_create.name,
				time: to_create.time,
				event: to_create.event,
				old_name: to_create.old_name,
				new_name: to_create.new_name,
				body: to_create.body,
			},
		);
		self.table_mut(table)?.triggers.push(id);
		Ok(id)
	}
}
