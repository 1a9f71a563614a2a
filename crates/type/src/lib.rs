// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

pub mod error;
pub mod fragment;
pub mod hash;
pub mod value;

pub use error::{
	Error, Result,
	diagnostic::{Diagnostic, IntoDiagnostic},
};
pub use fragment::Fragment;
pub use value::{OrderedF64, Type, Value};
