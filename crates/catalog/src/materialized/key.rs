// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use quarry_rql::interface::{
	Catalog, ColumnId, IndexKind, KeyDef, KeyId, KeyKind, ReferentialAction, TableDef, TableId,
};
use quarry_type::{
	error::diagnostic::catalog::{column_not_in_table, foreign_key_mismatch, object_already_exists, object_not_found},
	return_error,
};
use tracing::debug;

use crate::materialized::{MaterializedCatalog, next};

#[derive(Debug, Clone)]
pub struct ForeignKeyToCreate {
	pub table: TableId,
	pub name: String,
	pub columns: Vec<String>,
	/// The primary or unique key referenced
	pub references: KeyId,
	pub on_update: ReferentialAction,
	pub on_delete: ReferentialAction,
}

/// Resolves column names of `table` to ids, in the given order.
pub(crate) fn column_ids(table: &TableDef, columns: &[impl AsRef<str>]) -> crate::Result<Vec<ColumnId>> {
	let mut result = Vec::with_capacity(columns.len());
	for name in columns {
		let name: &str = name.as_ref();
		match table.column(name) {
			Some(column) => result.push(column.id),
			None => return_error!(column_not_in_table(&table.name, name)),
		}
	}
	Ok(result)
}

impl MaterializedCatalog {
	/// Primary key columns become NOT NULL. A key over several columns
	/// gets a hash index of the same name.
	pub fn create_primary_key(&mut self, table: TableId, name: &str, columns: &[&str]) -> crate::Result<KeyId> {
		let existing = self.table_mut(table)?.keys.clone();
		if existing.iter().filter_map(|id| self.keys.get(id)).any(|k| k.kind == KeyKind::Primary) {
			return_error!(object_already_exists("primary key", name));
		}
		let id = self.create_key(table, name, columns, KeyKind::Primary)?;
		let ids = self.keys.get(&id).map(|k| k.columns.clone()).unwrap_or_default();
		for column in self.table_mut(table)?.columns.iter_mut() {
			if ids.contains(&column.id) {
				column.nullable = false;
			}
		}
		Ok(id)
	}

	pub fn create_unique_key(&mut self, table: TableId, name: &str, columns: &[&str]) -> crate::Result<KeyId> {
		self.create_key(table, name, columns, KeyKind::Unique)
	}

	/// Also creates a join index named after the key, holding the parent
	/// row id of every child row.
	pub fn create_foreign_key(&mut self, to_create: ForeignKeyToCreate) -> crate::Result<KeyId> {
		let referenced = match self.keys.get(&to_create.references) {
			Some(key) if key.is_unique() => key,
			_ => return_error!(object_not_found("referenced key", &to_create.references.to_string())),
		};
		if referenced.columns.len() != to_create.columns.len() {
			return_error!(foreign_key_mismatch(&to_create.name, to_create.columns.len(), referenced.columns.len()));
		}

		let id = self.create_key(
			to_create.table,
			&to_create.name,
			to_create.columns.as_slice(),
			KeyKind::Foreign {
				references: to_create.references,
				on_update: to_create.on_update,
				on_delete: to_create.on_delete,
			},
		)?;
		let columns: Vec<&str> = to_create.columns.iter().map(String::as_str).collect();
		self.create_index_of(
			to_create.table,
			&to_create.name,
			&columns,
			IndexKind::Join {
				key: id,
			},
		)?;
		Ok(id)
	}

	fn create_key(
		&mut self,
		table: TableId,
		name: &str,
		columns: &[impl AsRef<str>],
		kind: KeyKind,
	) -> crate::Result<KeyId> {
		let def = self.table(table).cloned();
		let Some(def) = def else {
			return_error!(object_not_found("table", &table.to_string()));
		};
		if self.key_by_name(table, name).is_some() {
			return_error!(object_already_exists("key", &format!("{}.{}", def.name, name)));
		}
		let column_ids = column_ids(&def, columns)?;

		let id = KeyId(next(&mut self.sequence.key));
		let multi_column_unique = column_ids.len() > 1 && matches!(kind, KeyKind::Primary | KeyKind::Unique);
		debug!(table = %def.name, key = name, ?kind, "create key");
		self.keys.insert(
			id,
			KeyDef {
				id,
				table,
				name: name.to_string(),
				kind,
				columns: column_ids,
			},
		);
		self.table_mut(table)?.keys.push(id);

		if multi_column_unique {
			let names: Vec<&str> = columns.iter().map(AsRef::as_ref).collect();
			self.create_index_of(table, name, &names, IndexKind::Hash)?;
		}
		Ok(id)
	}
}
