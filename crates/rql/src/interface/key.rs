// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::interface::{ColumnId, KeyId, TableId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyDef {
	pub id: KeyId,
	pub table: TableId,
	pub name: String,
	pub kind: KeyKind,
	/// Key columns in key order
	pub columns: Vec<ColumnId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum KeyKind {
	Primary,
	Unique,
	Foreign {
		/// The primary or unique key this key references
		references: KeyId,
		on_update: ReferentialAction,
		on_delete: ReferentialAction,
	},
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferentialAction {
	Restrict,
	NoAction,
	Cascade,
	SetNull,
	SetDefault,
}

impl KeyDef {
	pub fn is_unique(&self) -> bool {
		matches!(self.kind, KeyKind::Primary | KeyKind::Unique)
	}

	pub fn is_foreign(&self) -> bool {
		matches!(self.kind, KeyKind::Foreign { .. })
	}

	pub fn references(&self) -> Option<KeyId> {
		match self.kind {
			KeyKind::Foreign {
				references,
				..
			} => Some(references),
			_ => None,
		}
	}

	/// The name used in constraint violation messages.
	pub fn kind_name(&self) -> &'static str {
		match self.kind {
			KeyKind::Primary => "PRIMARY KEY",
			KeyKind::Unique => "UNIQUE",
			KeyKind::Foreign {
				..
			} => "FOREIGN KEY",
		}
	}
}

impl Display for ReferentialAction {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			ReferentialAction::Restrict => f.write_str("RESTRICT"),
			ReferentialAction::NoAction => f.write_str("NO ACTION"),
			ReferentialAction::Cascade => f.write_str("CASCADE"),
			ReferentialAction::SetNull => f.write_str("SET NULL"),
			ReferentialAction::SetDefault => f.write_str("SET DEFAULT"),
		}
	}
}
