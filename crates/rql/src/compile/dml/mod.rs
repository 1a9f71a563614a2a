// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! INSERT, UPDATE and DELETE with their constraint checks, index
//! maintenance, referential actions and triggers.
//!
//! Within one statement the emitted order is: checks, BEFORE triggers,
//! writes, index maintenance, referential actions, AFTER triggers and
//! finally the affected row count.

mod constraint;
mod delete;
mod insert;
mod trigger;
mod update;

use quarry_type::Type;

use crate::{
	compile::Compiler,
	error::{BindErrorKind, CompileError},
	interface::{ColumnId, KeyDef, TableDef},
	plan::dataflow::StmtId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Statement {
	Insert,
	Update,
	Delete,
}

impl Statement {
	/// Leading words of constraint violation messages.
	pub fn prefix(self) -> &'static str {
		match self {
			Statement::Insert => "INSERT INTO",
			Statement::Update => "UPDATE",
			Statement::Delete => "DELETE",
		}
	}
}

impl<'a> Compiler<'a> {
	/// Every column of `table` read at the row ids `tids`, in table order.
	fn read_columns(&mut self, table: &TableDef, tids: StmtId) -> Vec<StmtId> {
		table.columns
			.iter()
			.map(|column| {
				let bind = self.program.bind(table.id, column.id, column.ty);
				self.program.project(tids, bind)
			})
			.collect()
	}

	/// The entries of `values` (aligned with the table's columns) that
	/// belong to `columns`, in `columns` order.
	fn select_columns(&self, table: &TableDef, columns: &[ColumnId], values: &[StmtId]) -> crate::Result<Vec<StmtId>> {
		columns.iter()
			.map(|id| {
				table.position(*id)
					.and_then(|position| values.get(position).copied())
					.ok_or_else(|| CompileError::bind(BindErrorKind::Column, format!("{}.{}", table.name, id)))
			})
			.collect()
	}

	/// Keys of `table` referenced by at least one foreign key, with those
	/// foreign keys.
	fn referenced_keys(&self, table: &TableDef) -> Vec<(&'a KeyDef, Vec<&'a KeyDef>)> {
		let catalog = self.catalog;
		catalog.keys(table)
			.into_iter()
			.filter(|key| key.is_unique())
			.map(|key| (key, catalog.referencing_keys(key.id)))
			.filter(|(_, referencing)| !referencing.is_empty())
			.collect()
	}

	/// Reports the affected row count of a top-level statement.
	fn affected(&mut self, count: StmtId) {
		if self.nesting == 0 {
			self.program.affected_rows(count);
		}
	}

	fn assignment_error(column: &str, expected: Type, actual: Type) -> CompileError {
		CompileError::Type {
			kind: crate::error::TypeErrorKind::Assignment {
				column: column.to_string(),
				expected,
				actual,
			},
			fragment: quarry_type::Fragment::None,
		}
	}

	/// Converts a value to a column's type, rejecting impossible
	/// conversions.
	fn assign_value(&mut self, column: &str, ty: Type, value: StmtId) -> crate::Result<StmtId> {
		let actual = self.program.ty(value);
		if !Type::castable(actual, ty) {
			return Err(Self::assignment_error(column, ty, actual));
		}
		Ok(self.program.convert(value, ty))
	}
}

#[cfg(test)]
mod tests {
	use crate::{
		compile::{
			compile,
			testing::{P, T, TestCatalog, U, block_ops, count_ops, exceptions},
		},
		expression::{AliasExpression, Expression, ProceduralExpression},
		interface::{KeyId, KeyKind, ReferentialAction, TriggerDef, TriggerEvent, TriggerId, TriggerTime},
		plan::{
			dataflow::{Op, Program, QueryType},
			logical::LogicalPlan,
		},
	};

	fn row(columns: &[(&str, Expression)]) -> Vec<AliasExpression> {
		columns.iter().map(|(name, value)| AliasExpression::new(*name, value.clone())).collect()
	}

	fn insert(table: crate::interface::TableId, columns: &[(&str, Expression)]) -> LogicalPlan {
		let mut plan = LogicalPlan::new();
		let values = plan.project(None, row(columns));
		let insert = plan.insert(table, values);
		plan.build(insert)
	}

	fn hash_calls(program: &Program) -> usize {
		program.count(|op| matches!(op, Op::Call { function, .. } if function == "hash"))
	}

	fn position(ops: &[&str], name: &str) -> usize {
		ops.iter().position(|op| *op == name).unwrap()
	}

	#[test]
	fn test_insert_checks_before_writing() {
		let catalog = TestCatalog::new();
		let mut plan = insert(T, &[("id", Expression::constant(1)), ("a", Expression::constant(2))]);

		let program = compile(&catalog, &mut plan).unwrap();
		assert_eq!(program.query_type, QueryType::Update);

		let messages = exceptions(&program);
		assert_eq!(messages[0], "INSERT INTO: NOT NULL constraint violated for column t.id");
		assert!(messages.iter().any(|m| m == "INSERT INTO: PRIMARY KEY constraint 't.t_pk' violated"));

		let ops = block_ops(&program);
		assert!(position(&ops, "exception") < position(&ops, "insert"));
		assert!(position(&ops, "insert") < position(&ops, "affected_rows"));
		assert_eq!(count_ops(&program, "affected_rows"), 1);
	}

	#[test]
	fn test_insert_child_checks_parent() {
		let catalog = TestCatalog::new();
		let mut plan = insert(U, &[("id", Expression::constant(1)), ("t_id", Expression::constant(1))]);

		let program = compile(&catalog, &mut plan).unwrap();
		assert!(exceptions(&program).iter().any(|m| m == "INSERT INTO: FOREIGN KEY constraint 'u.u_fk' violated"));
		assert_eq!(count_ops(&program, "scatter"), 1);
		assert_eq!(count_ops(&program, "index_write"), 1);
	}

	#[test]
	fn test_insert_maintains_hash_index() {
		let catalog = TestCatalog::new();
		let mut plan = insert(P, &[("x", Expression::constant(1)), ("y", Expression::constant(2))]);

		let program = compile(&catalog, &mut plan).unwrap();
		// one hash for the unique probe, one for the stored index value
		assert_eq!(hash_calls(&program), 2);
		assert_eq!(count_ops(&program, "index_write"), 1);
		assert!(exceptions(&program).iter().any(|m| m == "INSERT INTO: UNIQUE constraint 'p.p_uk' violated"));
	}

	#[test]
	fn test_delete_all_without_observers_clears() {
		let catalog = TestCatalog::new();
		let mut plan = LogicalPlan::new();
		let delete = plan.delete(P, None);
		let mut plan = plan.build(delete);

		let program = compile(&catalog, &mut plan).unwrap();
		assert_eq!(count_ops(&program, "clear"), 1);
		assert_eq!(count_ops(&program, "delete"), 0);
		assert_eq!(count_ops(&program, "affected_rows"), 1);
	}

	#[test]
	fn test_delete_parent_cascades() {
		let catalog = TestCatalog::new();
		let mut plan = LogicalPlan::new();
		let delete = plan.delete(T, None);
		let mut plan = plan.build(delete);

		let program = compile(&catalog, &mut plan).unwrap();
		assert_eq!(count_ops(&program, "clear"), 0);
		assert_eq!(count_ops(&program, "delete"), 2);
		assert!(exceptions(&program).is_empty());
		assert_eq!(count_ops(&program, "affected_rows"), 1);
	}

	#[test]
	fn test_update_of_unkeyed_column_skips_key_checks() {
		let catalog = TestCatalog::new();
		let mut plan = LogicalPlan::new();
		let scan = plan.scan(T, "t");
		let update = plan.update(T, scan, vec![("a", Expression::constant(5))]);
		let mut plan = plan.build(update);

		let program = compile(&catalog, &mut plan).unwrap();
		assert!(exceptions(&program).is_empty());
		assert_eq!(count_ops(&program, "update_column"), 1);
	}

	#[test]
	fn test_update_of_referenced_key_restricts() {
		let catalog = TestCatalog::new();
		let mut plan = LogicalPlan::new();
		let scan = plan.scan(T, "t");
		let update = plan.update(T, scan, vec![("id", Expression::constant(7))]);
		let mut plan = plan.build(update);

		let program = compile(&catalog, &mut plan).unwrap();
		let messages = exceptions(&program);
		assert!(messages.iter().any(|m| m == "UPDATE: NOT NULL constraint violated for column t.id"));
		assert!(messages.iter().any(|m| m == "UPDATE: PRIMARY KEY constraint 't.t_pk' violated"));
		assert!(messages.iter().any(|m| m == "UPDATE: FOREIGN KEY constraint 'u.u_fk' violated"));
		assert_eq!(count_ops(&program, "update_column"), 1);
	}

	#[test]
	fn test_update_cascades_into_children() {
		let mut catalog = TestCatalog::new();
		let foreign = catalog.keys.iter_mut().find(|k| k.id == KeyId(2)).unwrap();
		foreign.kind = KeyKind::Foreign {
			references: KeyId(1),
			on_update: ReferentialAction::Cascade,
			on_delete: ReferentialAction::Cascade,
		};
		let mut plan = LogicalPlan::new();
		let scan = plan.scan(T, "t");
		let update = plan.update(T, scan, vec![("id", Expression::constant(7))]);
		let mut plan = plan.build(update);

		let program = compile(&catalog, &mut plan).unwrap();
		assert_eq!(count_ops(&program, "update_column"), 2);
		// the cascaded rows follow their parent and are not re-checked
		assert!(!exceptions(&program).iter().any(|m| m.contains("FOREIGN KEY")));
		assert_eq!(count_ops(&program, "index_write"), 1);
		assert_eq!(count_ops(&program, "affected_rows"), 1);
	}

	#[test]
	fn test_after_insert_trigger_sees_new_rows() {
		let mut catalog = TestCatalog::new();
		let body = {
			let mut plan = LogicalPlan::new();
			let values =
				plan.project(None, row(&[("id", Expression::column("new", "id")), ("t_id", Expression::column("new", "id"))]));
			let insert = plan.insert(U, values);
			plan.build(insert)
		};
		catalog.add_trigger(TriggerDef {
			id: TriggerId(1),
			table: T,
			name: "t_audit".to_string(),
			time: TriggerTime::After,
			event: TriggerEvent::Insert,
			old_name: None,
			new_name: None,
			body: vec![ProceduralExpression::relation(body)],
		});
		let mut plan = insert(T, &[("id", Expression::constant(1))]);

		let program = compile(&catalog, &mut plan).unwrap();
		assert_eq!(count_ops(&program, "insert"), 2);
		// only the triggering statement reports affected rows
		assert_eq!(count_ops(&program, "affected_rows"), 1);
		let ops = block_ops(&program);
		assert!(position(&ops, "insert") < position(&ops, "affected_rows"));
	}
}
