// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use quarry_rql::interface::{Catalog, IndexDef, IndexId, IndexKind, TableId};
use quarry_type::{
	error::diagnostic::catalog::{object_already_exists, object_not_found},
	return_error,
};
use tracing::debug;

use crate::materialized::{MaterializedCatalog, key::column_ids, next};

impl MaterializedCatalog {
	/// A hash index over `columns`, kept up to date by every write to the
	/// table.
	pub fn create_index(&mut self, table: TableId, name: &str, columns: &[&str]) -> crate::Result<IndexId> {
		self.create_index_of(table, name, columns, IndexKind::Hash)
	}

	pub(crate) fn create_index_of(
		&mut self,
		table: TableId,
		name: &str,
		columns: &[&str],
		kind: IndexKind,
	) -> crate::Result<IndexId> {
		let Some(def) = self.table(table) else {
			return_error!(object_not_found("table", &table.to_string()));
		};
		if self.index_by_name(table, name).is_some() {
			return_error!(object_already_exists("index", &format!("{}.{}", def.name, name)));
		}
		let columns = column_ids(def, columns)?;

		let id = IndexId(next(&mut self.sequence.index));
		debug!(table = %table, index = name, ?kind, "create index");
		self.indexes.insert(
			id,
			IndexDef {
				id,
				table,
				name: name.to_string(),
				kind,
				columns,
			},
		);
		self.table_mut(table)?.indexes.push(id);
		Ok(id)
	}
}

#[cfg(test)]
mod tests {
	use quarry_type::Type;

	use super::*;
	use crate::{ColumnToCreate, TableToCreate};

	fn catalog() -> (MaterializedCatalog, TableId) {
		let mut catalog = MaterializedCatalog::new();
		let table = catalog
			.create_table(TableToCreate {
				schema: "test".to_string(),
				name: "t".to_string(),
				columns: vec![ColumnToCreate::new("a", Type::Int4), ColumnToCreate::new("b", Type::Utf8)],
			})
			.unwrap();
		(catalog, table)
	}

	#[test]
	fn test_create_index() {
		let (mut catalog, table) = catalog();
		let id = catalog.create_index(table, "t_ab", &["b", "a"]).unwrap();

		let index = catalog.index(id).unwrap();
		assert!(index.is_hash());
		assert_eq!(index.column_name(), "%t_ab");
		let def = catalog.table(table).unwrap();
		assert_eq!(index.columns, vec![def.column("b").unwrap().id, def.column("a").unwrap().id]);
		assert_eq!(def.indexes, vec![id]);
	}

	#[test]
	fn test_index_already_exists() {
		let (mut catalog, table) = catalog();
		catalog.create_index(table, "t_a", &["a"]).unwrap();
		let err = catalog.create_index(table, "t_a", &["b"]).unwrap_err();
		assert_eq!(err.code, "CATALOG_003");
	}
}
