// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Builders for the logical plans tests run most often.

use quarry_rql::{
	expression::{AliasExpression, Expression},
	interface::TableId,
	plan::logical::LogicalPlan,
};
use quarry_type::Value;

fn literal(value: Value) -> Expression {
	match value {
		Value::Undefined => Expression::null(),
		value => Expression::constant(value),
	}
}

/// `INSERT INTO table (columns) VALUES rows`
pub fn insert_rows(table: TableId, columns: &[&str], rows: Vec<Vec<Value>>) -> LogicalPlan {
	let mut plan = LogicalPlan::new();
	let exprs = columns
		.iter()
		.enumerate()
		.map(|(i, name)| {
			let values = rows.iter().map(|row| literal(row[i].clone())).collect();
			AliasExpression::new(*name, Expression::values(values))
		})
		.collect();
	let values = plan.project(None, exprs);
	let insert = plan.insert(table, values);
	plan.build(insert)
}

/// `SELECT * FROM table`
pub fn scan_all(table: TableId, alias: &str) -> LogicalPlan {
	let mut plan = LogicalPlan::new();
	let scan = plan.scan(table, alias);
	plan.build(scan)
}

/// `SELECT columns FROM table`
pub fn project_columns(table: TableId, alias: &str, columns: &[&str]) -> LogicalPlan {
	let mut plan = LogicalPlan::new();
	let scan = plan.scan(table, alias);
	let project = plan.project(Some(scan), columns_of(alias, columns));
	plan.build(project)
}

pub fn columns_of(alias: &str, columns: &[&str]) -> Vec<AliasExpression> {
	columns.iter().map(|c| AliasExpression::unnamed(Expression::column(alias, *c))).collect()
}

/// `UPDATE table SET assignments WHERE column = value`
pub fn update_where(
	table: TableId,
	alias: &str,
	column: &str,
	value: impl Into<Value>,
	assignments: Vec<(&str, Expression)>,
) -> LogicalPlan {
	let mut plan = LogicalPlan::new();
	let scan = plan.scan(table, alias);
	let select = plan.select(scan, vec![Expression::equal(Expression::column(alias, column), Expression::constant(value))]);
	let update = plan.update(table, select, assignments);
	plan.build(update)
}

/// `DELETE FROM table WHERE column = value`
pub fn delete_where(table: TableId, alias: &str, column: &str, value: impl Into<Value>) -> LogicalPlan {
	let mut plan = LogicalPlan::new();
	let scan = plan.scan(table, alias);
	let select = plan.select(scan, vec![Expression::equal(Expression::column(alias, column), Expression::constant(value))]);
	let delete = plan.delete(table, Some(select));
	plan.build(delete)
}

/// `DELETE FROM table`
pub fn delete_all(table: TableId) -> LogicalPlan {
	let mut plan = LogicalPlan::new();
	let delete = plan.delete(table, None);
	plan.build(delete)
}

pub fn int4_rows(rows: &[&[i32]]) -> Vec<Vec<Value>> {
	rows.iter().map(|row| row.iter().map(|v| Value::Int4(*v)).collect()).collect()
}
