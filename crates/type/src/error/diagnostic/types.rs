// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use crate::{error::diagnostic::Diagnostic, fragment::Fragment, value::Type};

pub fn incompatible_operands(fragment: Fragment, operator: &str, left: Type, right: Type) -> Diagnostic {
	Diagnostic {
		code: "TYPE_001".to_string(),
		statement: None,
		message: format!("cannot apply '{}' to {} and {}", operator, left, right),
		fragment,
		label: Some("incompatible operand types".to_string()),
		help: Some("add an explicit CAST to make the operand types compatible".to_string()),
		notes: vec![],
		cause: None,
	}
}

pub fn unsupported_cast(fragment: Fragment, from: Type, to: Type) -> Diagnostic {
	Diagnostic {
		code: "TYPE_002".to_string(),
		statement: None,
		message: format!("cannot cast {} to {}", from, to),
		fragment,
		label: Some("no conversion exists between these types".to_string()),
		help: None,
		notes: vec![],
		cause: None,
	}
}

pub fn set_operation_arity(fragment: Fragment, operation: &str, left: usize, right: usize) -> Diagnostic {
	Diagnostic {
		code: "TYPE_003".to_string(),
		statement: None,
		message: format!(
			"{} requires both inputs to have the same number of columns, got {} and {}",
			operation, left, right
		),
		fragment,
		label: None,
		help: None,
		notes: vec![],
		cause: None,
	}
}

pub fn set_operation_type(fragment: Fragment, operation: &str, column: &str, left: Type, right: Type) -> Diagnostic {
	Diagnostic {
		code: "TYPE_004".to_string(),
		statement: None,
		message: format!("{}: column '{}' has incompatible types {} and {}", operation, column, left, right),
		fragment,
		label: None,
		help: Some("cast one side so both inputs share a type".to_string()),
		notes: vec![],
		cause: None,
	}
}

pub fn assignment_type(fragment: Fragment, column: &str, expected: Type, actual: Type) -> Diagnostic {
	Diagnostic {
		code: "TYPE_005".to_string(),
		statement: None,
		message: format!("column '{}' is of type {} but the value is of type {}", column, expected, actual),
		fragment,
		label: None,
		help: Some("cast the value to the column type".to_string()),
		notes: vec![],
		cause: None,
	}
}
