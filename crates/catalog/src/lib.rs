// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! In-memory catalog: tables, keys, indexes, triggers and the builtin
//! function registry the compiler resolves calls against.

pub mod function;
mod materialized;

pub use materialized::{
	ColumnToCreate, ForeignKeyToCreate, MaterializedCatalog, TableToCreate, TriggerToCreate,
};
pub use quarry_type::Result;
