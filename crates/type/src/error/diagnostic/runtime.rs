// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use crate::{
	error::diagnostic::Diagnostic,
	fragment::Fragment,
	value::{Type, Value},
};

pub fn invalid_cast(value: &Value, to: Type) -> Diagnostic {
	Diagnostic {
		code: "RUNTIME_001".to_string(),
		statement: None,
		message: format!("cannot convert '{}' of type {} to {}", value, value.get_type(), to),
		fragment: Fragment::None,
		label: None,
		help: None,
		notes: vec![],
		cause: None,
	}
}

pub fn parameter_not_bound(name: &str) -> Diagnostic {
	Diagnostic {
		code: "RUNTIME_002".to_string(),
		statement: None,
		message: format!("no value bound for parameter '{}'", name),
		fragment: Fragment::internal(name),
		label: None,
		help: Some("pass a value for every placeholder".to_string()),
		notes: vec![],
		cause: None,
	}
}

pub fn division_by_zero() -> Diagnostic {
	Diagnostic {
		code: "RUNTIME_003".to_string(),
		statement: None,
		message: "division by zero".to_string(),
		fragment: Fragment::None,
		label: None,
		help: None,
		notes: vec![],
		cause: None,
	}
}

pub fn invalid_argument(function: &str, message: &str) -> Diagnostic {
	Diagnostic {
		code: "RUNTIME_004".to_string(),
		statement: None,
		message: format!("{}: {}", function, message),
		fragment: Fragment::internal(function),
		label: None,
		help: None,
		notes: vec![],
		cause: None,
	}
}

pub fn malformed_program(message: &str) -> Diagnostic {
	Diagnostic {
		code: "RUNTIME_005".to_string(),
		statement: None,
		message: format!("malformed dataflow program: {}", message),
		fragment: Fragment::None,
		label: None,
		help: None,
		notes: vec![],
		cause: None,
	}
}

pub fn arithmetic_overflow(function: &str) -> Diagnostic {
	Diagnostic {
		code: "RUNTIME_006".to_string(),
		statement: None,
		message: format!("{}: arithmetic overflow", function),
		fragment: Fragment::internal(function),
		label: None,
		help: None,
		notes: vec![],
		cause: None,
	}
}
