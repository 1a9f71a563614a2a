// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use serde::{Deserialize, Serialize};

use crate::fragment::Fragment;

pub mod bind;
pub mod catalog;
pub mod constraint;
pub mod plan;
pub mod render;
pub mod runtime;
pub mod types;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
	pub code: String,
	pub statement: Option<String>,
	pub message: String,
	pub fragment: Fragment,
	pub label: Option<String>,
	pub help: Option<String>,
	pub notes: Vec<String>,
	pub cause: Option<Box<Diagnostic>>,
}

impl Diagnostic {
	/// Attach the statement text the diagnostic was produced for, if not
	/// already set. Propagates into the cause chain.
	pub fn with_statement(&mut self, statement: String) {
		if let Some(cause) = self.cause.as_mut() {
			cause.with_statement(statement.clone());
		}
		if self.statement.is_none() {
			self.statement = Some(statement);
		}
	}
}

pub trait IntoDiagnostic {
	fn into_diagnostic(self) -> Diagnostic;
}

impl IntoDiagnostic for Diagnostic {
	fn into_diagnostic(self) -> Diagnostic {
		self
	}
}
