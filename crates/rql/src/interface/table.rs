// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use quarry_type::{Type, Value};
use serde::{Deserialize, Serialize};

use crate::interface::{ColumnId, IndexId, KeyId, TableId, TriggerId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDef {
	pub id: TableId,
	pub schema: String,
	pub name: String,
	pub columns: Vec<ColumnDef>,
	pub keys: Vec<KeyId>,
	pub indexes: Vec<IndexId>,
	pub triggers: Vec<TriggerId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
	pub id: ColumnId,
	pub name: String,
	pub ty: Type,
	pub nullable: bool,
	/// Value used when an INSERT does not provide the column, and by
	/// ON UPDATE/DELETE SET DEFAULT.
	pub default: Option<Value>,
}

impl TableDef {
	pub fn column(&self, name: &str) -> Option<&ColumnDef> {
		self.columns.iter().find(|c| c.name == name)
	}

	pub fn column_by_id(&self, id: ColumnId) -> Option<&ColumnDef> {
		self.columns.iter().find(|c| c.id == id)
	}

	pub fn position(&self, id: ColumnId) -> Option<usize> {
		self.columns.iter().position(|c| c.id == id)
	}
}

impl ColumnDef {
	pub fn default_value(&self) -> Value {
		self.default.clone().unwrap_or(Value::Undefined)
	}
}
