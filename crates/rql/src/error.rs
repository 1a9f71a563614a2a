// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Compilation error types.
//!
//! Constraint violations are not compile errors: the compiler embeds
//! exception statements that raise them when the program runs.

use std::fmt::{Display, Formatter};

use quarry_type::{
	Diagnostic, Fragment, IntoDiagnostic, Type,
	error::diagnostic::{bind, plan, types},
};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompileError {
	/// A referenced name could not be resolved. Always fatal.
	#[error("bind error: {kind} '{name}'")]
	Bind {
		kind: BindErrorKind,
		name: String,
		fragment: Fragment,
	},

	/// Operand types are incompatible and no conversion exists.
	#[error("type error: {kind}")]
	Type {
		kind: TypeErrorKind,
		fragment: Fragment,
	},

	/// The plan contains an operator combination that is not lowered.
	#[error("unsupported plan shape: {shape}")]
	UnsupportedShape {
		shape: String,
		fragment: Fragment,
	},

	#[error("recursion limit of {limit} exceeded")]
	RecursionLimitExceeded {
		limit: usize,
	},
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindErrorKind {
	Column,
	AmbiguousColumn,
	Table,
	Function,
	Variable,
	Index,
	/// The input of an UPDATE or DELETE does not expose the target row ids.
	RowIds {
		relation: String,
	},
}

impl Display for BindErrorKind {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			BindErrorKind::Column => f.write_str("unknown column"),
			BindErrorKind::AmbiguousColumn => f.write_str("ambiguous column"),
			BindErrorKind::Table => f.write_str("unknown table"),
			BindErrorKind::Function => f.write_str("unknown function"),
			BindErrorKind::Variable => f.write_str("undeclared variable"),
			BindErrorKind::Index => f.write_str("unknown index"),
			BindErrorKind::RowIds {
				relation,
			} => write!(f, "no row ids in {}", relation),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeErrorKind {
	IncompatibleOperands {
		operator: String,
		left: Type,
		right: Type,
	},
	UnsupportedCast {
		from: Type,
		to: Type,
	},
	SetArity {
		operation: String,
		left: usize,
		right: usize,
	},
	SetColumnType {
		operation: String,
		column: String,
		left: Type,
		right: Type,
	},
	Assignment {
		column: String,
		expected: Type,
		actual: Type,
	},
}

impl Display for TypeErrorKind {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			TypeErrorKind::IncompatibleOperands {
				operator,
				left,
				right,
			} => write!(f, "cannot apply '{}' to {} and {}", operator, left, right),
			TypeErrorKind::UnsupportedCast {
				from,
				to,
			} => write!(f, "cannot cast {} to {}", from, to),
			TypeErrorKind::SetArity {
				operation,
				left,
				right,
			} => write!(f, "{} column count mismatch ({} vs {})", operation, left, right),
			TypeErrorKind::SetColumnType {
				operation,
				column,
				left,
				right,
			} => write!(f, "{} column '{}' types {} and {} differ", operation, column, left, right),
			TypeErrorKind::Assignment {
				column,
				expected,
				actual,
			} => write!(f, "column '{}' expects {} but got {}", column, expected, actual),
		}
	}
}

impl CompileError {
	pub fn bind(kind: BindErrorKind, name: impl Into<String>) -> Self {
		let name = name.into();
		CompileError::Bind {
			kind,
			fragment: Fragment::internal(name.clone()),
			name,
		}
	}

	pub fn unsupported(shape: impl Into<String>) -> Self {
		CompileError::UnsupportedShape {
			shape: shape.into(),
			fragment: Fragment::None,
		}
	}

	pub fn incompatible(operator: impl Into<String>, left: Type, right: Type) -> Self {
		CompileError::Type {
			kind: TypeErrorKind::IncompatibleOperands {
				operator: operator.into(),
				left,
				right,
			},
			fragment: Fragment::None,
		}
	}

	/// Whether compilation may continue with a different strategy.
	pub fn is_recoverable(&self) -> bool {
		matches!(self, CompileError::UnsupportedShape { .. })
	}
}

impl IntoDiagnostic for CompileError {
	fn into_diagnostic(self) -> Diagnostic {
		match self {
			CompileError::Bind {
				kind,
				name,
				fragment,
			} => match kind {
				BindErrorKind::Column => bind::column_not_found(fragment, &name),
				BindErrorKind::AmbiguousColumn => bind::ambiguous_column(fragment, &name),
				BindErrorKind::Table => bind::table_not_found(fragment, &name),
				BindErrorKind::Function => bind::function_not_found(fragment, &name),
				BindErrorKind::Variable => bind::variable_not_found(fragment, &name),
				BindErrorKind::Index => bind::index_not_found(fragment, &name),
				BindErrorKind::RowIds {
					relation,
				} => bind::relation_column_missing(fragment, &relation, &name),
			},
			CompileError::Type {
				kind,
				fragment,
			} => match kind {
				TypeErrorKind::IncompatibleOperands {
					operator,
					left,
					right,
				} => types::incompatible_operands(fragment, &operator, left, right),
				TypeErrorKind::UnsupportedCast {
					from,
					to,
				} => types::unsupported_cast(fragment, from, to),
				TypeErrorKind::SetArity {
					operation,
					left,
					right,
				} => types::set_operation_arity(fragment, &operation, left, right),
				TypeErrorKind::SetColumnType {
					operation,
					column,
					left,
					right,
				} => types::set_operation_type(fragment, &operation, &column, left, right),
				TypeErrorKind::Assignment {
					column,
					expected,
					actual,
				} => types::assignment_type(fragment, &column, expected, actual),
			},
			CompileError::UnsupportedShape {
				shape,
				fragment,
			} => plan::unsupported_shape(fragment, &shape),
			CompileError::RecursionLimitExceeded {
				limit,
			} => plan::recursion_limit_exceeded(limit),
		}
	}
}

impl From<CompileError> for quarry_type::Error {
	fn from(err: CompileError) -> Self {
		quarry_type::Error(err.into_diagnostic())
	}
}
