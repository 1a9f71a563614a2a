// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Catalog objects the compiler reads and the lookup interface it reads
//! them through.

mod function;
mod id;
mod index;
mod key;
mod table;
mod trigger;

pub use function::{Arity, FunctionColumn, FunctionDef, FunctionKind, ReturnType};
pub use id::{ColumnId, IndexId, KeyId, TableId, TriggerId};
pub use index::{IndexDef, IndexKind};
pub use key::{KeyDef, KeyKind, ReferentialAction};
pub use table::{ColumnDef, TableDef};
pub use trigger::{TriggerDef, TriggerEvent, TriggerTime};

pub trait Catalog {
	fn table(&self, id: TableId) -> Option<&TableDef>;

	fn find_table(&self, schema: &str, name: &str) -> Option<&TableDef>;

	fn key(&self, id: KeyId) -> Option<&KeyDef>;

	fn index(&self, id: IndexId) -> Option<&IndexDef>;

	fn trigger(&self, id: TriggerId) -> Option<&TriggerDef>;

	/// Foreign keys whose referenced key is `key`.
	fn referencing_keys(&self, key: KeyId) -> Vec<&KeyDef>;

	fn function(&self, name: &str) -> Option<&FunctionDef>;

	fn keys(&self, table: &TableDef) -> Vec<&KeyDef> {
		table.keys.iter().filter_map(|id| self.key(*id)).collect()
	}

	fn indexes(&self, table: &TableDef) -> Vec<&IndexDef> {
		table.indexes.iter().filter_map(|id| self.index(*id)).collect()
	}

	fn triggers(&self, table: &TableDef, time: TriggerTime, event: TriggerEvent) -> Vec<&TriggerDef> {
		table.triggers
			.iter()
			.filter_map(|id| self.trigger(*id))
			.filter(|t| t.time == time && t.event == event)
			.collect()
	}
}
