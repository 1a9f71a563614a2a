// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use crate::{error::diagnostic::Diagnostic, fragment::Fragment};

/// Raised by a check statement embedded in a compiled data modification.
/// The message names the operation, constraint and table.
pub fn constraint_violation(message: &str) -> Diagnostic {
	Diagnostic {
		code: "CONSTRAINT_001".to_string(),
		statement: None,
		message: message.to_string(),
		fragment: Fragment::None,
		label: Some("constraint violated".to_string()),
		help: None,
		notes: vec!["no changes were applied".to_string()],
		cause: None,
	}
}
