// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! In-memory table storage for the reference executor.
//!
//! A table is a set of equally long value columns addressed by row id.
//! Deleted rows keep their slot and are only masked out, so row ids stay
//! stable for the lifetime of the storage. Every persisted index is one
//! more column aligned with the rows.

use std::collections::HashMap;

use quarry_catalog::MaterializedCatalog;
use quarry_rql::interface::{Catalog, IndexDef, IndexId, IndexKind, TableDef, TableId};
use quarry_type::{Value, hash::combined_hash};
use tracing::debug;

use crate::column::{Column, position, row_ids};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Storage {
	tables: HashMap<TableId, TableData>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableData {
	columns: Vec<Vec<Value>>,
	live: Vec<bool>,
	indexes: HashMap<IndexId, Vec<Value>>,
}

impl Storage {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn table(&self, id: TableId) -> Option<&TableData> {
		self.tables.get(&id)
	}

	/// The data of `table`, created empty on first use.
	pub fn table_mut(&mut self, table: &TableDef) -> &mut TableData {
		self.tables.entry(table.id).or_insert_with(|| TableData::new(table.columns.len()))
	}

	/// Live rows of a table in row id order.
	pub fn rows(&self, id: TableId) -> Vec<Vec<Value>> {
		self.table(id).map(TableData::rows).unwrap_or_default()
	}

	pub fn row_count(&self, id: TableId) -> usize {
		self.table(id).map(TableData::live_count).unwrap_or(0)
	}

	/// Fills indexes created after their table already held rows.
	pub fn backfill(&mut self, catalog: &MaterializedCatalog) {
		for table in catalog.tables() {
			let Some(data) = self.tables.get(&table.id) else {
				continue;
			};
			let missing: Vec<&IndexDef> = catalog
				.indexes(table)
				.into_iter()
				.filter(|index| !data.indexes.contains_key(&index.id))
				.collect();
			for index in missing {
				let values = self.index_values(catalog, table, index);
				debug!(table = %table.name, index = %index.name, rows = values.len(), "backfill index");
				if let Some(data) = self.tables.get_mut(&table.id) {
					data.indexes.insert(index.id, values);
				}
			}
		}
	}

	fn index_values(&self, catalog: &MaterializedCatalog, table: &TableDef, index: &IndexDef) -> Vec<Value> {
		let Some(data) = self.tables.get(&table.id) else {
			return vec![];
		};
		let positions: Vec<Option<usize>> = index.columns.iter().map(|c| table.position(*c)).collect();
		let key_of = |row: usize| -> Option<Vec<Value>> {
			positions.iter().map(|p| p.and_then(|p| data.columns.get(p)).and_then(|c| c.get(row)).cloned()).collect()
		};

		match &index.kind {
			IndexKind::Hash => (0..data.len())
				.map(|row| match key_of(row) {
					Some(key) if data.live[row] => Value::Int8(combined_hash(&key) as i64),
					_ => Value::Undefined,
				})
				.collect(),
			IndexKind::Join {
				key,
			} => {
				let parent = catalog
					.key(*key)
					.and_then(|k| k.references())
					.and_then(|id| catalog.key(id))
					.and_then(|k| catalog.table(k.table).map(|t| (k, t)));
				let Some((parent_key, parent)) = parent else {
					return vec![Value::Undefined; data.len()];
				};
				let parent_positions: Vec<Option<usize>> =
					parent_key.columns.iter().map(|c| parent.position(*c)).collect();
				let parent_data = self.tables.get(&parent.id);
				(0..data.len())
					.map(|row| {
						let Some(key) = key_of(row) else {
							return Value::Undefined;
						};
						if !data.live[row] || key.iter().any(Value::is_undefined) {
							return Value::Undefined;
						}
						parent_data
							.and_then(|p| p.find(&parent_positions, &key))
							.map(|r| Value::RowId(r as u64))
							.unwrap_or(Value::Undefined)
					})
					.collect()
			}
		}
	}
}

impl TableData {
	fn new(columns: usize) -> Self {
		Self {
			columns: vec![vec![]; columns],
			live: vec![],
			indexes: HashMap::new(),
		}
	}

	/// Number of physical rows, deleted ones included.
	pub fn len(&self) -> usize {
		self.live.len()
	}

	pub fn is_empty(&self) -> bool {
		self.live.is_empty()
	}

	pub fn live_count(&self) -> usize {
		self.live.iter().filter(|l| **l).count()
	}

	/// Row ids of the live rows.
	pub fn tids(&self) -> Vec<Value> {
		row_ids(self.live.iter().enumerate().filter(|(_, live)| **live).map(|(row, _)| row))
	}

	/// Physical column at `position`, deleted rows included.
	pub fn column(&self, position: usize) -> &[Value] {
		self.columns.get(position).map(Vec::as_slice).unwrap_or(&[])
	}

	/// Stored index values, one per physical row.
	pub fn index(&self, id: IndexId) -> Vec<Value> {
		let mut values = self.indexes.get(&id).cloned().unwrap_or_default();
		values.resize(self.len(), Value::Undefined);
		values
	}

	pub fn rows(&self) -> Vec<Vec<Value>> {
		(0..self.len())
			.filter(|row| self.live[*row])
			.map(|row| self.columns.iter().map(|c| c[row].clone()).collect())
			.collect()
	}

	/// Appends `count` rows; returns their row ids.
	pub fn insert(&mut self, count: usize, values: &[Column]) -> Vec<Value> {
		let first = self.len();
		for (position, column) in self.columns.iter_mut().enumerate() {
			let source = values.get(position);
			column.extend((0..count).map(|row| source.map(|c| c.get(row).clone()).unwrap_or(Value::Undefined)));
		}
		self.live.extend(std::iter::repeat_n(true, count));
		for index in self.indexes.values_mut() {
			index.resize(first + count, Value::Undefined);
		}
		row_ids(first..first + count)
	}

	/// Sets `values[i]` at row `tids[i]` of the column at `position`.
	pub fn update(&mut self, position: usize, tids: &[Value], values: Column) {
		let Some(column) = self.columns.get_mut(position) else {
			return;
		};
		for (i, tid) in tids.iter().enumerate() {
			if let Some(row) = self::position(tid).filter(|r| *r < column.len()) {
				column[row] = values.get(i).clone();
			}
		}
	}

	pub fn delete(&mut self, tids: &[Value]) {
		for row in tids.iter().filter_map(position) {
			if let Some(live) = self.live.get_mut(row) {
				*live = false;
			}
		}
	}

	pub fn clear(&mut self) {
		self.live.iter_mut().for_each(|live| *live = false);
	}

	pub fn write_index(&mut self, id: IndexId, tids: &[Value], values: Column) {
		let len = self.len();
		let index = self.indexes.entry(id).or_default();
		index.resize(len, Value::Undefined);
		for (i, tid) in tids.iter().enumerate() {
			if let Some(row) = self::position(tid).filter(|r| *r < len) {
				index[row] = values.get(i).clone();
			}
		}
	}

	/// First live row whose columns at `positions` equal `key`.
	fn find(&self, positions: &[Option<usize>], key: &[Value]) -> Option<usize> {
		(0..self.len()).find(|row| {
			self.live[*row]
				&& positions.iter().zip(key.iter()).all(|(p, v)| {
					p.and_then(|p| self.columns.get(p))
						.and_then(|c| c.get(*row))
						.and_then(|stored| stored.sql_eq(v))
						.unwrap_or(false)
				})
		})
	}
}

#[cfg(test)]
mod tests {
	use quarry_catalog::{ColumnToCreate, TableToCreate};
	use quarry_type::Type;

	use super::*;

	fn catalog() -> (MaterializedCatalog, TableId) {
		let mut catalog = MaterializedCatalog::new();
		let id = catalog
			.create_table(TableToCreate {
				schema: "test".to_string(),
				name: "t".to_string(),
				columns: vec![ColumnToCreate::new("a", Type::Int4), ColumnToCreate::new("b", Type::Utf8)],
			})
			.unwrap();
		(catalog, id)
	}

	#[test]
	fn test_insert_and_delete_keep_row_ids() {
		let (catalog, id) = catalog();
		let mut storage = Storage::new();
		let table = storage.table_mut(catalog.table(id).unwrap());

		let a = vec![Value::int4(1), Value::int4(2), Value::int4(3)];
		let b = Value::utf8("x");
		let tids = table.insert(3, &[Column::Vector(&a), Column::Scalar(&b)]);
		assert_eq!(tids, vec![Value::row_id(0), Value::row_id(1), Value::row_id(2)]);

		table.delete(&[Value::row_id(1)]);
		assert_eq!(table.tids(), vec![Value::row_id(0), Value::row_id(2)]);
		assert_eq!(table.len(), 3);
		assert_eq!(table.column(0)[1], Value::int4(2));

		let more = table.insert(1, &[Column::Scalar(&Value::int4(4))]);
		assert_eq!(more, vec![Value::row_id(3)]);
		assert_eq!(storage.rows(id), vec![
			vec![Value::int4(1), Value::utf8("x")],
			vec![Value::int4(3), Value::utf8("x")],
			vec![Value::int4(4), Value::Undefined],
		]);
	}

	#[test]
	fn test_update_and_clear() {
		let (catalog, id) = catalog();
		let mut storage = Storage::new();
		let table = storage.table_mut(catalog.table(id).unwrap());
		let a = vec![Value::int4(1), Value::int4(2)];
		table.insert(2, &[Column::Vector(&a)]);

		let value = Value::int4(9);
		table.update(0, &[Value::row_id(1)], Column::Scalar(&value));
		assert_eq!(table.column(0), &[Value::int4(1), Value::int4(9)]);

		table.clear();
		assert_eq!(storage.row_count(id), 0);
	}

	#[test]
	fn test_index_pads_with_null() {
		let (catalog, id) = catalog();
		let mut storage = Storage::new();
		let table = storage.table_mut(catalog.table(id).unwrap());
		table.insert(2, &[]);

		let hash = Value::int8(42);
		table.write_index(IndexId(1), &[Value::row_id(1)], Column::Scalar(&hash));
		table.insert(1, &[]);
		assert_eq!(table.index(IndexId(1)), vec![Value::Undefined, Value::int8(42), Value::Undefined]);
		assert_eq!(table.index(IndexId(7)).len(), 3);
	}

	#[test]
	fn test_backfill_hash_index() {
		let (mut catalog, id) = catalog();
		let mut storage = Storage::new();
		let a = vec![Value::int4(1), Value::int4(2)];
		let b = vec![Value::utf8("x"), Value::utf8("y")];
		storage.table_mut(catalog.table(id).unwrap()).insert(2, &[Column::Vector(&a), Column::Vector(&b)]);

		let index = catalog.create_index(id, "t_ab", &["a", "b"]).unwrap();
		storage.backfill(&catalog);

		let stored = storage.table(id).unwrap().index(index);
		assert_eq!(stored[0], Value::Int8(combined_hash(&[Value::int4(1), Value::utf8("x")]) as i64));
		assert_eq!(stored[1], Value::Int8(combined_hash(&[Value::int4(2), Value::utf8("y")]) as i64));
	}
}
