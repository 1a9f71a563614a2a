// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use crate::{error::diagnostic::Diagnostic, fragment::Fragment};

pub fn table_already_exists(schema: &str, table: &str) -> Diagnostic {
	Diagnostic {
		code: "CATALOG_001".to_string(),
		statement: None,
		message: format!("table '{}.{}' already exists", schema, table),
		fragment: Fragment::internal(table),
		label: None,
		help: Some("choose a different name or drop the existing table first".to_string()),
		notes: vec![],
		cause: None,
	}
}

pub fn column_not_in_table(table: &str, column: &str) -> Diagnostic {
	Diagnostic {
		code: "CATALOG_002".to_string(),
		statement: None,
		message: format!("table '{}' has no column '{}'", table, column),
		fragment: Fragment::internal(column),
		label: None,
		help: None,
		notes: vec![],
		cause: None,
	}
}

pub fn object_already_exists(kind: &str, name: &str) -> Diagnostic {
	Diagnostic {
		code: "CATALOG_003".to_string(),
		statement: None,
		message: format!("{} '{}' already exists", kind, name),
		fragment: Fragment::internal(name),
		label: None,
		help: None,
		notes: vec![],
		cause: None,
	}
}

pub fn object_not_found(kind: &str, name: &str) -> Diagnostic {
	Diagnostic {
		code: "CATALOG_004".to_string(),
		statement: None,
		message: format!("{} '{}' not found", kind, name),
		fragment: Fragment::internal(name),
		label: None,
		help: None,
		notes: vec![],
		cause: None,
	}
}

pub fn foreign_key_mismatch(name: &str, child: usize, parent: usize) -> Diagnostic {
	Diagnostic {
		code: "CATALOG_005".to_string(),
		statement: None,
		message: format!(
			"foreign key '{}' has {} columns but the referenced key has {}",
			name, child, parent
		),
		fragment: Fragment::internal(name),
		label: None,
		help: None,
		notes: vec![],
		cause: None,
	}
}
