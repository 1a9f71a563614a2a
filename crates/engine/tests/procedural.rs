// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use quarry_engine::{CatalogOperation, Engine, TransactionEvent};
use quarry_rql::{
	expression::{Expression, ProceduralExpression},
	plan::{
		dataflow::QueryType,
		logical::{ExportFormat, LogicalPlan, TransactionKind},
	},
};
use quarry_testing::{
	fixture::{SCHEMA, parent},
	init_tracing,
	plan::{insert_rows, scan_all},
};
use quarry_type::{Type, Value};

fn psm(statements: Vec<Expression>) -> LogicalPlan {
	let mut plan = LogicalPlan::new();
	let root = plan.psm(statements);
	plan.build(root)
}

fn var(name: &str) -> Expression {
	Expression::unqualified(name)
}

#[test]
fn test_while_loop_returns_counter() {
	init_tracing();
	let engine = Engine::new(parent().catalog);

	let mut plan = psm(vec![
		ProceduralExpression::declare("i", Type::Int4),
		ProceduralExpression::set("i", Expression::constant(0)),
		Expression::Procedural(ProceduralExpression::While {
			condition: Box::new(Expression::call("lt", vec![var("i"), Expression::constant(5)])),
			body: vec![ProceduralExpression::set("i", Expression::call("add", vec![var("i"), Expression::constant(1)]))],
		}),
		ProceduralExpression::ret(var("i")),
	]);
	let result = engine.execute(&mut plan).unwrap();
	assert_eq!(result.returned, Some(Value::Int4(5)));
}

#[test]
fn test_if_picks_branch() {
	let engine = Engine::new(parent().catalog);

	let branch = |condition: bool| {
		psm(vec![Expression::Procedural(ProceduralExpression::If {
			condition: Box::new(Expression::constant(condition)),
			then: vec![ProceduralExpression::ret(Expression::constant("then"))],
			otherwise: vec![ProceduralExpression::ret(Expression::constant("otherwise"))],
		})])
	};
	assert_eq!(engine.execute(&mut branch(true)).unwrap().returned, Some(Value::utf8("then")));
	assert_eq!(engine.execute(&mut branch(false)).unwrap().returned, Some(Value::utf8("otherwise")));
}

#[test]
fn test_return_stops_the_block() {
	let fixture = parent();
	let t = fixture.t;
	let engine = Engine::new(fixture.catalog);

	let rows = vec![vec![Value::Int4(1), Value::Int4(1), Value::utf8("a")]];
	let mut plan = psm(vec![
		ProceduralExpression::ret(Expression::constant(1)),
		ProceduralExpression::relation(insert_rows(t, &["id", "a", "b"], rows)),
	]);
	engine.execute(&mut plan).unwrap();
	assert!(engine.rows(SCHEMA, "t").unwrap().is_empty());
}

#[test]
fn test_nested_relation_writes() {
	let fixture = parent();
	let t = fixture.t;
	let engine = Engine::new(fixture.catalog);

	let rows = vec![vec![Value::Int4(1), Value::Int4(1), Value::utf8("a")]];
	let mut plan = psm(vec![ProceduralExpression::relation(insert_rows(t, &["id", "a", "b"], rows.clone()))]);
	engine.execute(&mut plan).unwrap();
	assert_eq!(engine.rows(SCHEMA, "t").unwrap(), rows);
}

#[test]
fn test_export_renders_rows() {
	let fixture = parent();
	let t = fixture.t;
	let engine = Engine::new(fixture.catalog);
	let rows = vec![
		vec![Value::Int4(1), Value::Int4(10), Value::utf8("x")],
		vec![Value::Int4(2), Value::Undefined, Value::utf8("y")],
	];
	engine.execute(&mut insert_rows(t, &["id", "a", "b"], rows)).unwrap();

	let mut plan = LogicalPlan::new();
	let scan = plan.scan(t, "t");
	let output = plan.output(
		scan,
		ExportFormat {
			column_separator: ",".to_string(),
			..ExportFormat::default()
		},
	);
	let mut plan = plan.build(output);

	let result = engine.execute(&mut plan).unwrap();
	assert_eq!(result.exports, vec!["1,10,\"x\"\n2,null,\"y\"".to_string()]);
	assert_eq!(result.affected, 2);
	assert!(result.frames.is_empty());
}

#[test]
fn test_transaction_statement() {
	let engine = Engine::new(parent().catalog);

	let mut plan = LogicalPlan::new();
	let root = plan.transaction(TransactionKind::Savepoint, false, Some("sp".to_string()));
	let mut plan = plan.build(root);

	let result = engine.execute(&mut plan).unwrap();
	assert_eq!(result.query_type, QueryType::Transaction);
	assert_eq!(
		result.transactions,
		vec![TransactionEvent {
			kind: TransactionKind::Savepoint,
			chain: false,
			name: Some("sp".to_string()),
		}]
	);
}

#[test]
fn test_catalog_statement_is_recorded() {
	let engine = Engine::new(parent().catalog);

	let mut plan = LogicalPlan::new();
	let root = plan.catalog("drop_table", vec![Expression::constant("t"), Expression::constant(true)]);
	let mut plan = plan.build(root);

	let result = engine.execute(&mut plan).unwrap();
	assert_eq!(result.query_type, QueryType::Schema);
	assert_eq!(
		result.catalog,
		vec![CatalogOperation {
			operation: "drop_table".to_string(),
			args: vec![Value::utf8("t"), Value::Boolean(true)],
		}]
	);
}

#[test]
fn test_list_runs_both_statements() {
	let fixture = parent();
	let t = fixture.t;
	let engine = Engine::new(fixture.catalog);
	engine.execute(&mut insert_rows(t, &["id"], vec![vec![Value::Int4(1)]])).unwrap();

	let mut plan = LogicalPlan::new();
	let first = plan.scan(t, "t");
	let second = plan.scan(t, "t2");
	let list = plan.list(first, second);
	let mut plan = plan.build(list);

	let result = engine.execute(&mut plan).unwrap();
	assert_eq!(result.frames.len(), 2);
	assert_eq!(result.frames[0].rows(), result.frames[1].rows());
}

#[test]
fn test_result_serializes() {
	let fixture = parent();
	let t = fixture.t;
	let engine = Engine::new(fixture.catalog);
	engine.execute(&mut insert_rows(t, &["id"], vec![vec![Value::Int4(1)]])).unwrap();

	let result = engine.execute(&mut scan_all(t, "t")).unwrap();
	let json = serde_json::to_value(&result).unwrap();
	assert_eq!(json["query_type"], "Table");
	assert_eq!(json["frames"].as_array().map(Vec::len), Some(1));
}
