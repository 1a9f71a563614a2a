// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use tracing::{debug, instrument};

use crate::{
	compile::{Bindings, Compiler, Relation, output_columns},
	error::CompileError,
	plan::{
		dataflow::QueryType,
		logical::{DdlOperation, LogicalPlan},
	},
};

impl<'a> Compiler<'a> {
	#[instrument(name = "rql::compile::ddl", level = "debug", skip_all)]
	pub(crate) fn compile_ddl(&mut self, plan: &mut LogicalPlan, operation: DdlOperation) -> crate::Result<Relation> {
		match operation {
			DdlOperation::Psm {
				statements,
			} => {
				self.compile_statements(&statements)?;
				Ok(Relation::new())
			}
			DdlOperation::List {
				left,
				right,
			} => {
				self.compile_statement(plan, left)?;
				self.compile_statement(plan, right)
			}
			DdlOperation::Output {
				input,
				format,
			} => {
				let relation = self.compile_node(plan, input)?;
				self.program.export(output_columns(&relation), format);
				self.program.query_type = QueryType::Table;
				Ok(Relation::new())
			}
			DdlOperation::Transaction {
				kind,
				chain,
				name,
			} => {
				debug!(?kind, chain, "transaction statement");
				self.program.transaction(kind, chain, name);
				self.program.query_type = QueryType::Transaction;
				Ok(Relation::new())
			}
			DdlOperation::Catalog {
				operation,
				args,
			} => {
				let mut compiled = Vec::with_capacity(args.len());
				for arg in &args {
					let stmt = self.compile_expression(arg, &Bindings::none())?;
					if !self.program.is_scalar(stmt) {
						return Err(CompileError::unsupported(format!(
							"catalog argument '{}' is not a scalar",
							arg
						)));
					}
					compiled.push(stmt);
				}
				self.program.catalog(operation, compiled);
				self.program.query_type = QueryType::Schema;
				Ok(Relation::new())
			}
		}
	}
}
