// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use crate::{error::diagnostic::Diagnostic, fragment::Fragment};

pub fn column_not_found(fragment: Fragment, name: &str) -> Diagnostic {
	Diagnostic {
		code: "BIND_001".to_string(),
		statement: None,
		message: format!("column '{}' not found", name),
		fragment,
		label: Some("this column does not exist in the current context".to_string()),
		help: Some("check for typos or ensure the column is produced by the input".to_string()),
		notes: vec![],
		cause: None,
	}
}

pub fn ambiguous_column(fragment: Fragment, name: &str) -> Diagnostic {
	Diagnostic {
		code: "BIND_002".to_string(),
		statement: None,
		message: format!("column reference '{}' is ambiguous", name),
		fragment,
		label: Some("more than one input relation provides this column".to_string()),
		help: Some("qualify the column with its relation name".to_string()),
		notes: vec![],
		cause: None,
	}
}

pub fn table_not_found(fragment: Fragment, name: &str) -> Diagnostic {
	Diagnostic {
		code: "BIND_003".to_string(),
		statement: None,
		message: format!("table '{}' not found", name),
		fragment,
		label: Some("unknown table".to_string()),
		help: None,
		notes: vec![],
		cause: None,
	}
}

pub fn function_not_found(fragment: Fragment, name: &str) -> Diagnostic {
	Diagnostic {
		code: "BIND_004".to_string(),
		statement: None,
		message: format!("function '{}' not found", name),
		fragment,
		label: Some("unknown function".to_string()),
		help: Some("check the function name and the number of arguments".to_string()),
		notes: vec![],
		cause: None,
	}
}

pub fn variable_not_found(fragment: Fragment, name: &str) -> Diagnostic {
	Diagnostic {
		code: "BIND_005".to_string(),
		statement: None,
		message: format!("variable '{}' not declared", name),
		fragment,
		label: Some("assignment to an undeclared variable".to_string()),
		help: Some("declare the variable before assigning to it".to_string()),
		notes: vec![],
		cause: None,
	}
}

pub fn index_not_found(fragment: Fragment, name: &str) -> Diagnostic {
	Diagnostic {
		code: "BIND_006".to_string(),
		statement: None,
		message: format!("index '{}' not found", name),
		fragment,
		label: Some("the plan names an index the table does not have".to_string()),
		help: None,
		notes: vec![],
		cause: None,
	}
}

pub fn relation_column_missing(fragment: Fragment, relation: &str, name: &str) -> Diagnostic {
	Diagnostic {
		code: "BIND_007".to_string(),
		statement: None,
		message: format!("input relation does not provide '{}.{}'", relation, name),
		fragment,
		label: Some("data modification input must expose the target row ids".to_string()),
		help: Some("scan the target table below the UPDATE or DELETE".to_string()),
		notes: vec![],
		cause: None,
	}
}
