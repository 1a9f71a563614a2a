// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use quarry_rql::plan::{dataflow::QueryType, logical::TransactionKind};
use quarry_type::Value;
use serde::Serialize;

use crate::frame::Frame;

/// Everything one executed program produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionResult {
	pub query_type: QueryType,
	/// One frame per `Output` statement, in execution order
	pub frames: Vec<Frame>,
	/// Rows changed by DML plus rows written by exports
	pub affected: u64,
	/// Rendered text of every `Export` statement
	pub exports: Vec<String>,
	/// Value of the `Return` that ended the program
	pub returned: Option<Value>,
	pub transactions: Vec<TransactionEvent>,
	pub catalog: Vec<CatalogOperation>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionEvent {
	pub kind: TransactionKind,
	pub chain: bool,
	pub name: Option<String>,
}

/// A catalog statement recorded for the caller; the engine does not
/// interpret it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogOperation {
	pub operation: String,
	pub args: Vec<Value>,
}

impl ExecutionResult {
	pub fn new(query_type: QueryType) -> Self {
		Self {
			query_type,
			frames: vec![],
			affected: 0,
			exports: vec![],
			returned: None,
			transactions: vec![],
			catalog: vec![],
		}
	}

	/// The frame of the last `Output`.
	pub fn frame(&self) -> Option<&Frame> {
		self.frames.last()
	}

	/// Rows of the last frame; empty without one.
	pub fn rows(&self) -> Vec<Vec<Value>> {
		self.frame().map(Frame::rows).unwrap_or_default()
	}
}
