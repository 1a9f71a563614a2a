// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! A small fixed catalog for compiler unit tests.
//!
//! - `t(id int4 not null, a int4, b utf8)`, primary key `t_pk(id)`
//! - `u(id int4, t_id int4)`, foreign key `u_fk(t_id) -> t_pk` with a join
//!   index, ON DELETE CASCADE
//! - `p(x int4, y int4)`, unique key `p_uk(x, y)` with a hash index

use quarry_type::Type;

use crate::{
	interface::{
		Arity, Catalog, ColumnDef, ColumnId, FunctionDef, IndexDef, IndexId, IndexKind, KeyDef, KeyId, KeyKind,
		ReferentialAction, ReturnType, TableDef, TableId, TriggerDef, TriggerId,
	},
	plan::dataflow::{Op, Program},
};

pub(crate) const T: TableId = TableId(1);
pub(crate) const U: TableId = TableId(2);
pub(crate) const P: TableId = TableId(3);

pub(crate) struct TestCatalog {
	pub tables: Vec<TableDef>,
	pub keys: Vec<KeyDef>,
	pub indexes: Vec<IndexDef>,
	pub triggers: Vec<TriggerDef>,
	pub functions: Vec<FunctionDef>,
}

fn column(id: u64, name: &str, ty: Type, nullable: bool) -> ColumnDef {
	ColumnDef {
		id: ColumnId(id),
		name: name.to_string(),
		ty,
		nullable,
		default: None,
	}
}

impl TestCatalog {
	pub fn new() -> Self {
		let tables = vec![
			TableDef {
				id: T,
				schema: "test".to_string(),
				name: "t".to_string(),
				columns: vec![
					column(1, "id", Type::Int4, false),
					column(2, "a", Type::Int4, true),
					column(3, "b", Type::Utf8, true),
				],
				keys: vec![KeyId(1)],
				indexes: vec![],
				triggers: vec![],
			},
			TableDef {
				id: U,
				schema: "test".to_string(),
				name: "u".to_string(),
				columns: vec![column(4, "id", Type::Int4, true), column(5, "t_id", Type::Int4, true)],
				keys: vec![KeyId(2)],
				indexes: vec![IndexId(1)],
				triggers: vec![],
			},
			TableDef {
				id: P,
				schema: "test".to_string(),
				name: "p".to_string(),
				columns: vec![column(6, "x", Type::Int4, true), column(7, "y", Type::Int4, true)],
				keys: vec![KeyId(3)],
				indexes: vec![IndexId(2)],
				triggers: vec![],
			},
		];
		let keys = vec![
			KeyDef {
				id: KeyId(1),
				table: T,
				name: "t_pk".to_string(),
				kind: KeyKind::Primary,
				columns: vec![ColumnId(1)],
			},
			KeyDef {
				id: KeyId(2),
				table: U,
				name: "u_fk".to_string(),
				kind: KeyKind::Foreign {
					references: KeyId(1),
					on_update: ReferentialAction::Restrict,
					on_delete: ReferentialAction::Cascade,
				},
				columns: vec![ColumnId(5)],
			},
			KeyDef {
				id: KeyId(3),
				table: P,
				name: "p_uk".to_string(),
				kind: KeyKind::Unique,
				columns: vec![ColumnId(6), ColumnId(7)],
			},
		];
		let indexes = vec![
			IndexDef {
				id: IndexId(1),
				table: U,
				name: "u_fk".to_string(),
				kind: IndexKind::Join {
					key: KeyId(2),
				},
				columns: vec![ColumnId(5)],
			},
			IndexDef {
				id: IndexId(2),
				table: P,
				name: "p_uk".to_string(),
				kind: IndexKind::Hash,
				columns: vec![ColumnId(6), ColumnId(7)],
			},
		];

		let mut functions = Vec::new();
		for name in ["eq", "ne", "lt", "le", "gt", "ge", "and", "or", "isnull"] {
			functions.push(FunctionDef::scalar(name, Arity::Between(1, 2), ReturnType::Fixed(Type::Boolean)));
		}
		functions.push(FunctionDef::scalar("not", Arity::Exact(1), ReturnType::Fixed(Type::Boolean)));
		for name in ["add", "sub", "mul", "sql_min", "sql_max"] {
			functions.push(FunctionDef::scalar(name, Arity::Exact(2), ReturnType::Numeric));
		}
		functions.push(FunctionDef::scalar("upper", Arity::Exact(1), ReturnType::Fixed(Type::Utf8)));
		functions.push(FunctionDef::filter("like", Arity::Exact(2)));
		functions.push(FunctionDef::window("row_number", Arity::Exact(0), ReturnType::Fixed(Type::Int8)));
		functions.push(FunctionDef::table("generate_series", Arity::Between(2, 3), &[("value", Type::Int8)]));

		Self {
			tables,
			keys,
			indexes,
			triggers: vec![],
			functions,
		}
	}

	pub fn table_mut(&mut self, id: TableId) -> &mut TableDef {
		self.tables.iter_mut().find(|t| t.id == id).unwrap()
	}

	pub fn add_trigger(&mut self, trigger: TriggerDef) {
		let table = trigger.table;
		let id = trigger.id;
		self.triggers.push(trigger);
		self.table_mut(table).triggers.push(id);
	}
}

impl Catalog for TestCatalog {
	fn table(&self, id: TableId) -> Option<&TableDef> {
		self.tables.iter().find(|t| t.id == id)
	}

	fn find_table(&self, schema: &str, name: &str) -> Option<&TableDef> {
		self.tables.iter().find(|t| t.schema == schema && t.name == name)
	}

	fn key(&self, id: KeyId) -> Option<&KeyDef> {
		self.keys.iter().find(|k| k.id == id)
	}

	fn index(&self, id: IndexId) -> Option<&IndexDef> {
		self.indexes.iter().find(|i| i.id == id)
	}

	fn trigger(&self, id: TriggerId) -> Option<&TriggerDef> {
		self.triggers.iter().find(|t| t.id == id)
	}

	fn referencing_keys(&self, key: KeyId) -> Vec<&KeyDef> {
		self.keys.iter().filter(|k| k.references() == Some(key)).collect()
	}

	fn function(&self, name: &str) -> Option<&FunctionDef> {
		self.functions.iter().find(|f| f.name == name)
	}
}

/// Number of statements whose operator has the given name.
pub(crate) fn count_ops(program: &Program, name: &str) -> usize {
	program.count(|op| op.name() == name)
}

/// Messages of all exception statements, in emission order.
pub(crate) fn exceptions(program: &Program) -> Vec<String> {
	program.stmts()
		.iter()
		.filter_map(|s| match &s.op {
			Op::Exception {
				message,
				..
			} => Some(message.clone()),
			_ => None,
		})
		.collect()
}

/// Names of the block's statements in execution order.
pub(crate) fn block_ops(program: &Program) -> Vec<&'static str> {
	program.block().iter().map(|id| program.stmt(*id).op.name()).collect()
}
