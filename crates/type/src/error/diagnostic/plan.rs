// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use crate::{error::diagnostic::Diagnostic, fragment::Fragment};

pub fn unsupported_shape(fragment: Fragment, shape: &str) -> Diagnostic {
	Diagnostic {
		code: "PLAN_001".to_string(),
		statement: None,
		message: format!("unsupported plan shape: {}", shape),
		fragment,
		label: Some("this operator combination cannot be lowered".to_string()),
		help: None,
		notes: vec![],
		cause: None,
	}
}

pub fn recursion_limit_exceeded(limit: usize) -> Diagnostic {
	Diagnostic {
		code: "PLAN_002".to_string(),
		statement: None,
		message: format!("plan nesting exceeds the recursion limit of {}", limit),
		fragment: Fragment::None,
		label: None,
		help: Some("simplify the statement or raise the compiler's max_depth".to_string()),
		notes: vec![],
		cause: None,
	}
}
