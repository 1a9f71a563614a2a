// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Reference engine: compiles logical plans with `quarry-rql` and runs the
//! resulting dataflow programs over in-memory tables.

mod column;
mod engine;
mod execute;
pub mod frame;
pub mod function;
mod params;
mod result;
mod storage;

pub use column::Column;
pub use engine::{Engine, EngineBuilder, EngineInner};
pub use frame::{Frame, FrameColumn};
pub use function::{
	Functions, FunctionsBuilder, RowFunction, ScalarFunction, TableFunction, WindowFrame, WindowFunction,
};
pub use params::Params;
pub use quarry_type::Result;
pub use result::{CatalogOperation, ExecutionResult, TransactionEvent};
pub use storage::{Storage, TableData};
