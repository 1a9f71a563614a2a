// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Lowering of logical relational plans into columnar dataflow programs.
//!
//! The input is a [`LogicalPlan`](plan::logical::LogicalPlan) produced by an
//! analyzer; the output is a [`Program`](plan::dataflow::Program), an arena of
//! vectorized column statements plus the ordered block of effectful
//! statements an executor runs.

pub mod compile;
pub mod error;
pub mod expression;
pub mod interface;
pub mod plan;

pub use compile::{Compiler, CompilerBuilder, CompilerConfig, compile};
pub use error::CompileError;

pub type Result<T> = std::result::Result<T, CompileError>;
