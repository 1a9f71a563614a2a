// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Catalog fixtures.
//!
//! - `test.t(id int4 not null, a int4, b utf8)`, primary key `t_pk(id)`
//! - `test.u(id int4, t_id int4)`, foreign key `u_fk(t_id) -> t_pk`
//! - `test.log(id int4, note utf8)` for trigger bodies to write into

use quarry_catalog::{ColumnToCreate, ForeignKeyToCreate, MaterializedCatalog, TableToCreate};
use quarry_rql::interface::{ReferentialAction, TableId};
use quarry_type::Type;

pub const SCHEMA: &str = "test";

pub fn create_table(catalog: &mut MaterializedCatalog, name: &str, columns: Vec<ColumnToCreate>) -> TableId {
	catalog.create_table(TableToCreate {
		schema: SCHEMA.to_string(),
		name: name.to_string(),
		columns,
	})
	.unwrap()
}

/// A single-column `int4` table.
pub fn single_column(catalog: &mut MaterializedCatalog, name: &str, column: &str) -> TableId {
	create_table(catalog, name, vec![ColumnToCreate::new(column, Type::Int4)])
}

pub struct Parent {
	pub catalog: MaterializedCatalog,
	pub t: TableId,
}

/// Only `t` with its primary key.
pub fn parent() -> Parent {
	let mut catalog = MaterializedCatalog::new();
	let t = create_parent(&mut catalog);
	Parent {
		catalog,
		t,
	}
}

fn create_parent(catalog: &mut MaterializedCatalog) -> TableId {
	let t = create_table(
		catalog,
		"t",
		vec![
			ColumnToCreate::new("id", Type::Int4).not_null(),
			ColumnToCreate::new("a", Type::Int4),
			ColumnToCreate::new("b", Type::Utf8),
		],
	);
	catalog.create_primary_key(t, "t_pk", &["id"]).unwrap();
	t
}

pub struct ParentChild {
	pub catalog: MaterializedCatalog,
	pub t: TableId,
	pub u: TableId,
	pub log: TableId,
}

/// `t`, `u` referencing it with the given actions, and `log`.
pub fn parent_child(on_update: ReferentialAction, on_delete: ReferentialAction) -> ParentChild {
	let mut catalog = MaterializedCatalog::new();
	let t = create_parent(&mut catalog);
	let u = create_table(
		&mut catalog,
		"u",
		vec![ColumnToCreate::new("id", Type::Int4), ColumnToCreate::new("t_id", Type::Int4)],
	);
	let pk = catalog.key_by_name(t, "t_pk").map(|k| k.id).unwrap();
	catalog.create_foreign_key(ForeignKeyToCreate {
		table: u,
		name: "u_fk".to_string(),
		columns: vec!["t_id".to_string()],
		references: pk,
		on_update,
		on_delete,
	})
	.unwrap();
	let log = create_table(
		&mut catalog,
		"log",
		vec![ColumnToCreate::new("id", Type::Int4), ColumnToCreate::new("note", Type::Utf8)],
	);
	ParentChild {
		catalog,
		t,
		u,
		log,
	}
}
