// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Piece of the original statement text a diagnostic points at.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Fragment {
	#[default]
	None,
	/// Text produced by the system itself (synthetic names, generated checks)
	Internal {
		text: String,
	},
	/// Text taken from the submitted statement
	Statement {
		text: String,
		line: u32,
		column: u32,
	},
}

impl Fragment {
	pub fn internal(text: impl Into<String>) -> Self {
		Fragment::Internal {
			text: text.into(),
		}
	}

	pub fn statement(text: impl Into<String>, line: u32, column: u32) -> Self {
		Fragment::Statement {
			text: text.into(),
			line,
			column,
		}
	}

	pub fn text(&self) -> &str {
		match self {
			Fragment::None => "",
			Fragment::Internal {
				text,
			}
			| Fragment::Statement {
				text,
				..
			} => text.as_str(),
		}
	}

	pub fn is_none(&self) -> bool {
		matches!(self, Fragment::None)
	}
}

impl Display for Fragment {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Fragment::None => Ok(()),
			Fragment::Internal {
				text,
			} => f.write_str(text),
			Fragment::Statement {
				text,
				line,
				column,
			} => write!(f, "{} (line {}, column {})", text, line, column),
		}
	}
}

impl From<&str> for Fragment {
	fn from(value: &str) -> Self {
		Fragment::internal(value)
	}
}

impl From<String> for Fragment {
	fn from(value: String) -> Self {
		Fragment::internal(value)
	}
}
