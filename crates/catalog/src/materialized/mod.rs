// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

mod index;
mod key;
mod table;
mod trigger;

use std::collections::HashMap;

use indexmap::IndexMap;
use quarry_rql::interface::{
	Catalog, FunctionDef, IndexDef, IndexId, KeyDef, KeyId, TableDef, TableId, TriggerDef, TriggerId,
};
use quarry_type::{error::diagnostic::catalog::object_not_found, return_error};

pub use key::ForeignKeyToCreate;
pub use table::{ColumnToCreate, TableToCreate};
pub use trigger::TriggerToCreate;

use crate::function::builtins;

/// Catalog objects held in memory, in creation order.
#[derive(Debug, Clone)]
pub struct MaterializedCatalog {
	tables: IndexMap<TableId, TableDef>,
	tables_by_name: HashMap<(String, String), TableId>,
	keys: IndexMap<KeyId, KeyDef>,
	indexes: IndexMap<IndexId, IndexDef>,
	triggers: IndexMap<TriggerId, TriggerDef>,
	functions: IndexMap<String, FunctionDef>,
	sequence: Sequence,
}

/// Next free id per object kind; ids are never reused.
#[derive(Debug, Clone)]
struct Sequence {
	table: u64,
	column: u64,
	key: u64,
	index: u64,
	trigger: u64,
}

impl Default for Sequence {
	fn default() -> Self {
		Self {
			table: 1,
			column: 1,
			key: 1,
			index: 1,
			trigger: 1,
		}
	}
}

fn next(counter: &mut u64) -> u64 {
	let id = *counter;
	*counter += 1;
	id
}

impl Default for MaterializedCatalog {
	fn default() -> Self {
		Self::new()
	}
}

impl MaterializedCatalog {
	/// An empty catalog with the builtin functions registered.
	pub fn new() -> Self {
		let mut result = Self {
			tables: IndexMap::new(),
			tables_by_name: HashMap::new(),
			keys: IndexMap::new(),
			indexes: IndexMap::new(),
			triggers: IndexMap::new(),
			functions: IndexMap::new(),
			sequence: Sequence::default(),
		};
		for function in builtins() {
			result.register_function(function);
		}
		result
	}

	/// Adds or replaces a function signature.
	pub fn register_function(&mut self, function: FunctionDef) {
		self.functions.insert(function.name.clone(), function);
	}

	pub fn tables(&self) -> impl Iterator<Item = &TableDef> {
		self.tables.values()
	}

	pub fn table_by_name(&self, schema: &str, name: &str) -> crate::Result<&TableDef> {
		match self.find_table(schema, name) {
			Some(table) => Ok(table),
			None => return_error!(object_not_found("table", &format!("{}.{}", schema, name))),
		}
	}

	/// A key of `table` by name.
	pub fn key_by_name(&self, table: TableId, name: &str) -> Option<&KeyDef> {
		self.keys.values().find(|k| k.table == table && k.name == name)
	}

	/// An index of `table` by name.
	pub fn index_by_name(&self, table: TableId, name: &str) -> Option<&IndexDef> {
		self.indexes.values().find(|i| i.table == table && i.name == name)
	}

	fn table_mut(&mut self, id: TableId) -> crate::Result<&mut TableDef> {
		match self.tables.get_mut(&id) {
			Some(table) => Ok(table),
			None => return_error!(object_not_found("table", &id.to_string())),
		}
	}
}

impl Catalog for MaterializedCatalog {
	fn table(&self, id: TableId) -> Option<&TableDef> {
		self.tables.get(&id)
	}

	fn find_table(&self, schema: &str, name: &str) -> Option<&TableDef> {
		self.tables_by_name.get(&(schema.to_string(), name.to_string())).and_then(|id| self.tables.get(id))
	}

	fn key(&self, id: KeyId) -> Option<&KeyDef> {
		self.keys.get(&id)
	}

	fn index(&self, id: IndexId) -> Option<&IndexDef> {
		self.indexes.get(&id)
	}

	fn trigger(&self, id: TriggerId) -> Option<&TriggerDef> {
		self.triggers.get(&id)
	}

	fn referencing_keys(&self, key: KeyId) -> Vec<&KeyDef> {
		self.keys.values().filter(|k| k.references() == Some(key)).collect()
	}

	fn function(&self, name: &str) -> Option<&FunctionDef> {
		self.functions.get(name)
	}
}
