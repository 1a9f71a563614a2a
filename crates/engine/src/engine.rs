// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{ops::Deref, sync::Arc};

use parking_lot::RwLock;
use quarry_catalog::MaterializedCatalog;
use quarry_rql::{
	CompilerBuilder, CompilerConfig,
	interface::Catalog,
	plan::{dataflow::Program, logical::LogicalPlan},
};
use quarry_type::{Error, IntoDiagnostic, Value, error::diagnostic::catalog::object_not_found, return_error};
use tracing::{debug, instrument};

use crate::{execute::Executor, function::Functions, params::Params, result::ExecutionResult, storage::Storage};

/// Compiles logical plans and runs them against in-memory tables.
///
/// Every execution works on a staged copy of the tables which replaces the
/// live ones only when the whole program succeeded, so a failing statement
/// leaves no partial changes behind.
#[derive(Clone)]
pub struct Engine(Arc<EngineInner>);

pub struct EngineInner {
	catalog: RwLock<MaterializedCatalog>,
	storage: RwLock<Storage>,
	config: CompilerConfig,
	functions: Functions,
}

impl Deref for Engine {
	type Target = EngineInner;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

impl Engine {
	pub fn new(catalog: MaterializedCatalog) -> Self {
		EngineBuilder::new(catalog).build()
	}

	pub fn builder(catalog: MaterializedCatalog) -> EngineBuilder {
		EngineBuilder::new(catalog)
	}

	pub fn execute(&self, plan: &mut LogicalPlan) -> crate::Result<ExecutionResult> {
		self.execute_with_params(plan, &Params::new())
	}

	#[instrument(name = "engine::execute_with_params", level = "debug", skip_all, fields(params = params.len()))]
	pub fn execute_with_params(&self, plan: &mut LogicalPlan, params: &Params) -> crate::Result<ExecutionResult> {
		let catalog = self.catalog.read();
		let program = compile(&catalog, &self.config, plan)?;

		let mut storage = self.storage.write();
		let mut staged = storage.clone();
		let result = Executor::new(&program, &catalog, &mut staged, &self.functions, params).run()?;
		*storage = staged;

		debug!(query_type = ?result.query_type, affected = result.affected, frames = result.frames.len(), "executed");
		Ok(result)
	}

	/// Compiles without running.
	pub fn compile(&self, plan: &mut LogicalPlan) -> crate::Result<Program> {
		let catalog = self.catalog.read();
		compile(&catalog, &self.config, plan)
	}

	/// Runs `f` against the catalog, then fills indexes it created over
	/// existing rows.
	pub fn with_catalog<T>(&self, f: impl FnOnce(&mut MaterializedCatalog) -> T) -> T {
		let mut catalog = self.catalog.write();
		let result = f(&mut catalog);
		self.storage.write().backfill(&catalog);
		result
	}

	/// Live rows of a table in row id order.
	pub fn rows(&self, schema: &str, name: &str) -> crate::Result<Vec<Vec<Value>>> {
		let catalog = self.catalog.read();
		let Some(table) = catalog.find_table(schema, name) else {
			return_error!(object_not_found("table", &format!("{}.{}", schema, name)));
		};
		Ok(self.storage.read().rows(table.id))
	}

	pub fn config(&self) -> &CompilerConfig {
		&self.config
	}

	pub fn functions(&self) -> &Functions {
		&self.functions
	}
}

fn compile(catalog: &MaterializedCatalog, config: &CompilerConfig, plan: &mut LogicalPlan) -> crate::Result<Program> {
	CompilerBuilder::from_config(config.clone())
		.build(catalog)
		.compile(plan)
		.map_err(|err| Error(err.into_diagnostic()))
}

pub struct EngineBuilder {
	catalog: MaterializedCatalog,
	config: CompilerConfig,
	functions: Functions,
}

impl EngineBuilder {
	pub fn new(catalog: MaterializedCatalog) -> Self {
		Self {
			catalog,
			config: CompilerConfig::default(),
			functions: Functions::builtins(),
		}
	}

	pub fn config(mut self, config: CompilerConfig) -> Self {
		self.config = config;
		self
	}

	pub fn functions(mut self, functions: Functions) -> Self {
		self.functions = functions;
		self
	}

	pub fn build(self) -> Engine {
		let mut storage = Storage::new();
		storage.backfill(&self.catalog);
		Engine(Arc::new(EngineInner {
			catalog: RwLock::new(self.catalog),
			storage: RwLock::new(storage),
			config: self.config,
			functions: self.functions,
		}))
	}
}
