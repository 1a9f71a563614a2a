// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use crate::{
	error::{BindErrorKind, CompileError},
	interface::TableId,
	plan::dataflow::{Program, StmtId},
};

pub(crate) const TID: &str = "%tid";

/// One named column of a compiled relation.
#[derive(Debug, Clone, PartialEq)]
pub struct RelColumn {
	pub relation: String,
	pub name: String,
	pub stmt: StmtId,
	/// Base table the column was read from, while it still is a plain
	/// projection of that table
	pub source: Option<TableId>,
}

/// A compiled relation: equally long columns. Columns whose name starts
/// with `%` are hidden (row ids and persisted indexes).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Relation {
	pub columns: Vec<RelColumn>,
}

impl RelColumn {
	pub fn is_hidden(&self) -> bool {
		self.name.starts_with('%')
	}
}

impl Relation {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn push(&mut self, relation: impl Into<String>, name: impl Into<String>, stmt: StmtId, source: Option<TableId>) {
		self.columns.push(RelColumn {
			relation: relation.into(),
			name: name.into(),
			stmt,
			source,
		});
	}

	pub fn visible(&self) -> impl Iterator<Item = &RelColumn> {
		self.columns.iter().filter(|c| !c.is_hidden())
	}

	pub fn is_empty(&self) -> bool {
		self.columns.is_empty()
	}

	/// Resolves a possibly qualified column. Unqualified names must not
	/// match columns of two different relations.
	pub fn find(&self, relation: Option<&str>, name: &str) -> crate::Result<Option<&RelColumn>> {
		let mut found: Option<&RelColumn> = None;
		for column in &self.columns {
			if column.name != name {
				continue;
			}
			match relation {
				Some(relation) if column.relation != relation => continue,
				None if column.is_hidden() => continue,
				_ => {}
			}
			match found {
				None => found = Some(column),
				Some(previous) if previous.relation != column.relation => {
					let qualified = match relation {
						Some(relation) => format!("{}.{}", relation, name),
						None => name.to_string(),
					};
					return Err(CompileError::bind(BindErrorKind::AmbiguousColumn, qualified));
				}
				Some(_) => {}
			}
		}
		Ok(found)
	}

	/// Row ids of `table`, if the relation still carries them.
	pub fn tid(&self, table: TableId) -> Option<StmtId> {
		self.columns.iter().find(|c| c.name == TID && c.source == Some(table)).map(|c| c.stmt)
	}

	/// The hidden column exposing a persisted index, by column name.
	pub fn hidden(&self, relation: Option<&str>, name: &str) -> Option<&RelColumn> {
		self.columns.iter().find(|c| c.name == name && relation.is_none_or(|r| c.relation == r))
	}

	/// A column whose length is the relation's row count: the first vector
	/// column, else the first column.
	pub fn anchor(&self, program: &Program) -> Option<StmtId> {
		self.columns
			.iter()
			.find(|c| !program.is_scalar(c.stmt))
			.or_else(|| self.columns.first())
			.map(|c| c.stmt)
	}

	pub fn is_scalar(&self, program: &Program) -> bool {
		self.columns.iter().all(|c| program.is_scalar(c.stmt))
	}

	/// Every column re-projected through `ids`.
	pub fn project(&self, program: &mut Program, ids: StmtId) -> Relation {
		Relation {
			columns: self
				.columns
				.iter()
				.map(|c| RelColumn {
					relation: c.relation.clone(),
					name: c.name.clone(),
					stmt: program.project(ids, c.stmt),
					source: c.source,
				})
				.collect(),
		}
	}

	pub fn concat(mut self, other: Relation) -> Relation {
		self.columns.extend(other.columns);
		self
	}

	/// Exposes every column under `alias`.
	pub fn aliased(mut self, alias: &str) -> Relation {
		for column in self.columns.iter_mut() {
			column.relation = alias.to_string();
		}
		self
	}

	/// Keeps only the visible columns.
	pub fn without_hidden(mut self) -> Relation {
		self.columns.retain(|c| !c.is_hidden());
		self
	}
}

#[cfg(test)]
mod tests {
	use quarry_type::Type;

	use super::*;
	use crate::interface::ColumnId;

	fn relation(program: &mut Program) -> Relation {
		let mut result = Relation::new();
		let tid = program.tid(TableId(1));
		let a = program.bind(TableId(1), ColumnId(1), Type::Int4);
		let b = program.bind(TableId(2), ColumnId(1), Type::Int4);
		result.push("l", TID, tid, Some(TableId(1)));
		result.push("l", "a", a, Some(TableId(1)));
		result.push("r", "a", b, Some(TableId(2)));
		result
	}

	#[test]
	fn test_qualified_lookup() {
		let mut program = Program::new();
		let rel = relation(&mut program);
		assert_eq!(rel.find(Some("r"), "a").unwrap().unwrap().relation, "r");
		assert!(rel.find(Some("x"), "a").unwrap().is_none());
	}

	#[test]
	fn test_unqualified_lookup_is_ambiguous_across_relations() {
		let mut program = Program::new();
		let rel = relation(&mut program);
		let err = rel.find(None, "a").unwrap_err();
		assert!(matches!(
			err,
			CompileError::Bind {
				kind: BindErrorKind::AmbiguousColumn,
				..
			}
		));
	}

	#[test]
	fn test_hidden_columns() {
		let mut program = Program::new();
		let rel = relation(&mut program);
		assert!(rel.find(None, TID).unwrap().is_none());
		assert!(rel.tid(TableId(1)).is_some());
		assert!(rel.tid(TableId(2)).is_none());
		assert_eq!(rel.visible().count(), 2);
	}
}
