// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use quarry_rql::interface::{ColumnDef, ColumnId, TableDef, TableId};
use quarry_type::{
	Type, Value,
	error::diagnostic::catalog::{object_already_exists, table_already_exists},
	return_error,
};
use tracing::debug;

use crate::materialized::{MaterializedCatalog, next};

#[derive(Debug, Clone)]
pub struct TableToCreate {
	pub schema: String,
	pub name: String,
	pub columns: Vec<ColumnToCreate>,
}

#[derive(Debug, Clone)]
pub struct ColumnToCreate {
	pub name: String,
	pub ty: Type,
	pub nullable: bool,
	pub default: Option<Value>,
}

impl ColumnToCreate {
	/// A nullable column without default.
	pub fn new(name: impl Into<String>, ty: Type) -> Self {
		Self {
			name: name.into(),
			ty,
			nullable: true,
			default: None,
		}
	}

	pub fn not_null(mut self) -> Self {
		self.nullable = false;
		self
	}

	pub fn default(mut self, value: impl Into<Value>) -> Self {
		self.default = Some(value.into());
		self
	}
}

impl MaterializedCatalog {
	pub fn create_table(&mut self, to_create: TableToCreate) -> crate::Result<TableId> {
		let key = (to_create.schema.clone(), to_create.name.clone());
		if self.tables_by_name.contains_key(&key) {
			return_error!(table_already_exists(&to_create.schema, &to_create.name));
		}
		for (i, column) in to_create.columns.iter().enumerate() {
			if to_create.columns[..i].iter().any(|c| c.name == column.name) {
				return_error!(object_already_exists(
					"column",
					&format!("{}.{}", to_create.name, column.name)
				));
			}
		}

		let id = TableId(next(&mut self.sequence.table));
		let columns = to_create
			.columns
			.into_iter()
			.map(|column| ColumnDef {
				id: ColumnId(next(&mut self.sequence.column)),
				name: column.name,
				ty: column.ty,
				nullable: column.nullable,
				default: column.default,
			})
			.collect();

		debug!(schema = %to_create.schema, name = %to_create.name, %id, "create table");
		self.tables.insert(
			id,
			TableDef {
				id,
				schema: to_create.schema,
				name: to_create.name,
				columns,
				keys: vec![],
				indexes: vec![],
				triggers: vec![],
			},
		);
		self.tables_by_name.insert(key, id);
		Ok(id)
	}
}
