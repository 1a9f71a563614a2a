// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use serde::{Deserialize, Serialize};

use crate::interface::{ColumnId, IndexId, KeyId, TableId};

/// A persisted per-row lookup structure, stored as one extra column of the
/// table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDef {
	pub id: IndexId,
	pub table: TableId,
	pub name: String,
	pub kind: IndexKind,
	pub columns: Vec<ColumnId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IndexKind {
	/// Stores the combined hash of the index columns of every row
	Hash,
	/// Stores, per child row, the row id of the referenced parent row
	Join {
		key: KeyId,
	},
}

impl IndexDef {
	/// Name of the hidden relation column that exposes this index.
	pub fn column_name(&self) -> String {
		format!("%{}", self.name)
	}

	pub fn is_hash(&self) -> bool {
		matches!(self.kind, IndexKind::Hash)
	}
}
