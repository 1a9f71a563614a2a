// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use quarry_catalog::{ColumnToCreate, MaterializedCatalog};
use quarry_engine::{Column, Engine, Functions, TableFunction};
use quarry_rql::{
	CompilerConfig,
	expression::{
		AggregateExpression, AggregateFunction, AliasExpression, CompareExpression, CompareOp, Comparison, Expression,
		SortKey, WindowSpec,
	},
	interface::{Arity, FunctionDef, TableId},
	plan::logical::{JoinKind, LogicalPlan, NodeId},
};
use quarry_testing::{
	fixture::{create_table, single_column},
	init_tracing,
	plan::{columns_of, insert_rows, int4_rows},
	sorted,
};
use quarry_type::{Type, Value};

fn ints(values: &[i32]) -> Vec<Vec<Value>> {
	values.iter().map(|v| vec![Value::Int4(*v)]).collect()
}

/// Engine over `l(v)` and `r(v)` holding the given values.
fn two_sets(left: &[i32], right: &[i32]) -> (Engine, TableId, TableId) {
	init_tracing();
	let mut catalog = MaterializedCatalog::new();
	let l = single_column(&mut catalog, "l", "v");
	let r = single_column(&mut catalog, "r", "v");
	let engine = Engine::new(catalog);
	for (table, values) in [(l, left), (r, right)] {
		if !values.is_empty() {
			engine.execute(&mut insert_rows(table, &["v"], ints(values))).unwrap();
		}
	}
	(engine, l, r)
}

fn sides(plan: &mut LogicalPlan, l: TableId, r: TableId) -> (NodeId, NodeId) {
	let ls = plan.scan(l, "l");
	let left = plan.project(Some(ls), columns_of("l", &["v"]));
	let rs = plan.scan(r, "r");
	let right = plan.project(Some(rs), columns_of("r", &["v"]));
	(left, right)
}

enum Set {
	Union,
	Intersect,
	Except,
}

fn set_operation(engine: &Engine, l: TableId, r: TableId, operation: Set, distinct: bool) -> Vec<Vec<Value>> {
	let mut plan = LogicalPlan::new();
	let (left, right) = sides(&mut plan, l, r);
	let root = match operation {
		Set::Union => plan.union(left, right),
		Set::Intersect => plan.intersect(left, right),
		Set::Except => plan.except(left, right),
	};
	if distinct {
		plan.set_distinct(root);
	}
	let mut plan = plan.build(root);
	sorted(engine.execute(&mut plan).unwrap().rows())
}

#[test]
fn test_intersect_all_keeps_minimum_multiplicity() {
	let (engine, l, r) = two_sets(&[1, 1, 2], &[1, 3]);
	assert_eq!(set_operation(&engine, l, r, Set::Intersect, false), ints(&[1]));

	let (engine, l, r) = two_sets(&[1, 1, 2, 2, 2], &[2, 2, 1, 4]);
	assert_eq!(set_operation(&engine, l, r, Set::Intersect, false), ints(&[1, 2, 2]));
}

#[test]
fn test_intersect_distinct() {
	let (engine, l, r) = two_sets(&[1, 1, 2], &[1, 1, 3]);
	assert_eq!(set_operation(&engine, l, r, Set::Intersect, true), ints(&[1]));
}

#[test]
fn test_union_all_and_distinct() {
	let (engine, l, r) = two_sets(&[1, 1, 2], &[1, 3]);
	assert_eq!(set_operation(&engine, l, r, Set::Union, false), ints(&[1, 1, 1, 2, 3]));
	assert_eq!(set_operation(&engine, l, r, Set::Union, true), ints(&[1, 2, 3]));
}

#[test]
fn test_except_all_subtracts_multiplicity() {
	let (engine, l, r) = two_sets(&[1, 1, 1, 2, 4], &[1, 3, 4, 4]);
	assert_eq!(set_operation(&engine, l, r, Set::Except, false), ints(&[1, 1, 2]));
}

#[test]
fn test_except_distinct() {
	let (engine, l, r) = two_sets(&[1, 1, 2, 5], &[1, 3]);
	assert_eq!(set_operation(&engine, l, r, Set::Except, true), ints(&[2, 5]));
}

#[test]
fn test_set_operations_against_empty_side() {
	let (engine, l, r) = two_sets(&[1, 2], &[]);
	assert_eq!(set_operation(&engine, l, r, Set::Intersect, false), Vec::<Vec<Value>>::new());
	assert_eq!(set_operation(&engine, l, r, Set::Except, false), ints(&[1, 2]));
	assert_eq!(set_operation(&engine, l, r, Set::Union, false), ints(&[1, 2]));
}

fn join(engine: &Engine, kind: JoinKind, l: TableId, r: TableId) -> Vec<Vec<Value>> {
	let mut plan = LogicalPlan::new();
	let ls = plan.scan(l, "l");
	let rs = plan.scan(r, "r");
	let join = plan.join(kind, ls, rs, vec![Expression::equal(Expression::column("l", "v"), Expression::column("r", "v"))]);
	let mut plan = plan.build(join);
	sorted(engine.execute(&mut plan).unwrap().rows())
}

#[test]
fn test_outer_joins_pad_with_null() {
	let (engine, l, r) = two_sets(&[1, 2, 3], &[2, 3, 3, 4]);
	let null = Value::Undefined;
	let pair = |a: Value, b: Value| vec![a, b];

	assert_eq!(
		join(&engine, JoinKind::Inner, l, r),
		vec![
			pair(Value::Int4(2), Value::Int4(2)),
			pair(Value::Int4(3), Value::Int4(3)),
			pair(Value::Int4(3), Value::Int4(3)),
		]
	);
	assert_eq!(
		join(&engine, JoinKind::Left, l, r),
		vec![
			pair(Value::Int4(1), null.clone()),
			pair(Value::Int4(2), Value::Int4(2)),
			pair(Value::Int4(3), Value::Int4(3)),
			pair(Value::Int4(3), Value::Int4(3)),
		]
	);
	assert_eq!(
		join(&engine, JoinKind::Full, l, r),
		vec![
			pair(null.clone(), Value::Int4(4)),
			pair(Value::Int4(1), null.clone()),
			pair(Value::Int4(2), Value::Int4(2)),
			pair(Value::Int4(3), Value::Int4(3)),
			pair(Value::Int4(3), Value::Int4(3)),
		]
	);
}

#[test]
fn test_semi_and_anti_join() {
	let (engine, l, r) = two_sets(&[1, 2, 3, 3], &[3, 2, 2]);
	assert_eq!(join(&engine, JoinKind::Semi, l, r), ints(&[2, 3, 3]));
	assert_eq!(join(&engine, JoinKind::Anti, l, r), ints(&[1]));
}

const COLUMNS: [&str; 5] = ["c1", "c2", "c3", "c4", "c5"];

/// A small grid with NULLs in every column.
fn grid(rows: usize, salt: usize) -> Vec<Vec<Value>> {
	(0..rows)
		.map(|i| {
			(0..COLUMNS.len())
				.map(|j| {
					let x = (i * 31 + j * 17 + salt * 7).pow(2) % 101;
					match x % 5 {
						0 => Value::Undefined,
						_ => Value::Int4(1 + (x % 2) as i32),
					}
				})
				.collect()
		})
		.collect()
}

fn nested_loop(left: &[Vec<Value>], right: &[Vec<Value>], k: usize) -> Vec<Vec<Value>> {
	let mut result = vec![];
	for l in left {
		for r in right {
			if (0..k).all(|j| l[j].sql_eq(&r[j]) == Some(true)) {
				result.push(l.iter().chain(r.iter()).cloned().collect());
			}
		}
	}
	result
}

#[test]
fn test_multi_column_join_matches_nested_loop() {
	init_tracing();
	let mut catalog = MaterializedCatalog::new();
	let columns = || -> Vec<ColumnToCreate> { COLUMNS.iter().map(|c| ColumnToCreate::new(*c, Type::Int4)).collect() };
	let l = create_table(&mut catalog, "l", columns());
	let r = create_table(&mut catalog, "r", columns());
	let engine = Engine::new(catalog);

	let left = grid(24, 0);
	let right = grid(20, 1);
	engine.execute(&mut insert_rows(l, &COLUMNS, left.clone())).unwrap();
	engine.execute(&mut insert_rows(r, &COLUMNS, right.clone())).unwrap();

	for k in 1..=COLUMNS.len() {
		let mut plan = LogicalPlan::new();
		let ls = plan.scan(l, "l");
		let rs = plan.scan(r, "r");
		let predicates = COLUMNS[..k]
			.iter()
			.map(|c| Expression::equal(Expression::column("l", *c), Expression::column("r", *c)))
			.collect();
		let join = plan.join(JoinKind::Inner, ls, rs, predicates);
		let mut plan = plan.build(join);

		let actual = sorted(engine.execute(&mut plan).unwrap().rows());
		assert_eq!(actual, sorted(nested_loop(&left, &right, k)), "k = {}", k);
	}
}

#[test]
fn test_range_predicate_join() {
	let (engine, l, r) = two_sets(&[1, 2, 3], &[2, 3]);
	let mut plan = LogicalPlan::new();
	let ls = plan.scan(l, "l");
	let rs = plan.scan(r, "r");
	let join = plan.join(
		JoinKind::Inner,
		ls,
		rs,
		vec![Expression::compare(Expression::column("l", "v"), CompareOp::LessThan, Expression::column("r", "v"))],
	);
	let mut plan = plan.build(join);

	let expected: Vec<Vec<Value>> = int4_rows(&[&[1, 2], &[1, 3], &[2, 3]]);
	assert_eq!(sorted(engine.execute(&mut plan).unwrap().rows()), expected);
}

/// `s(k1 int4, k2 int4, v utf8)` with ties on `k1`.
fn sortable() -> (Engine, TableId) {
	init_tracing();
	let mut catalog = MaterializedCatalog::new();
	let s = create_table(
		&mut catalog,
		"s",
		vec![
			ColumnToCreate::new("k1", Type::Int4),
			ColumnToCreate::new("k2", Type::Int4),
			ColumnToCreate::new("v", Type::Utf8),
		],
	);
	let engine = Engine::new(catalog);
	let rows = [(3, 1, "a"), (1, 5, "b"), (2, 2, "c"), (1, 7, "d"), (3, 9, "e"), (2, 4, "f"), (1, 6, "g")];
	let rows = rows.iter().map(|(k1, k2, v)| vec![Value::Int4(*k1), Value::Int4(*k2), Value::utf8(*v)]).collect();
	engine.execute(&mut insert_rows(s, &["k1", "k2", "v"], rows)).unwrap();
	(engine, s)
}

fn ordered(plan: &mut LogicalPlan, s: TableId) -> NodeId {
	let scan = plan.scan(s, "s");
	plan.project_ordered(
		scan,
		columns_of("s", &["k1", "k2", "v"]),
		vec![SortKey::asc(Expression::column("s", "k1")), SortKey::desc(Expression::column("s", "k2"))],
	)
}

fn labels(rows: Vec<Vec<Value>>) -> Vec<String> {
	rows.into_iter().map(|row| row[2].as_str().unwrap_or_default().to_string()).collect()
}

#[test]
fn test_order_by_two_keys() {
	let (engine, s) = sortable();
	let mut plan = LogicalPlan::new();
	let root = ordered(&mut plan, s);
	let mut plan = plan.build(root);

	let rows = engine.execute(&mut plan).unwrap().rows();
	assert_eq!(labels(rows), vec!["d", "g", "b", "f", "c", "e", "a"]);
}

fn top_n(engine: &Engine, s: TableId, limit: i64, offset: i32) -> Vec<String> {
	let mut plan = LogicalPlan::new();
	let root = ordered(&mut plan, s);
	let top = plan.top_n(root, Some(Expression::constant(Value::Int8(limit))), Some(Expression::constant(offset)));
	let mut plan = plan.build(top);
	labels(engine.execute(&mut plan).unwrap().rows())
}

#[test]
fn test_top_n_equals_sort_then_slice() {
	let (engine, s) = sortable();
	let sorted_labels = ["d", "g", "b", "f", "c", "e", "a"];

	for limit in 0..=8i64 {
		for offset in 0..=3i32 {
			let start = (offset as usize).min(sorted_labels.len());
			let end = (start + limit as usize).min(sorted_labels.len());
			assert_eq!(top_n(&engine, s, limit, offset), sorted_labels[start..end].to_vec(), "limit {} offset {}", limit, offset);
		}
	}
}

#[test]
fn test_top_n_without_pushdown() {
	let (engine, s) = sortable();
	let catalog = engine.with_catalog(|catalog| catalog.clone());
	let rows = engine.rows("test", "s").unwrap();

	let plain = Engine::builder(catalog)
		.config(CompilerConfig {
			topn_pushdown: false,
			..CompilerConfig::default()
		})
		.build();
	plain.execute(&mut insert_rows(s, &["k1", "k2", "v"], rows)).unwrap();

	assert_eq!(top_n(&plain, s, 3, 1), top_n(&engine, s, 3, 1));
	assert_eq!(top_n(&plain, s, 3, 1), vec!["g", "b", "f"]);
}

#[test]
fn test_group_by_with_aggregates() {
	let (engine, s) = sortable();
	let mut plan = LogicalPlan::new();
	let scan = plan.scan(s, "s");
	let group = plan.group_by(
		scan,
		vec![Expression::column("s", "k1")],
		vec![
			AliasExpression::unnamed(Expression::column("s", "k1")),
			AliasExpression::new("n", Expression::count_all()),
			AliasExpression::new("total", Expression::aggregate(AggregateFunction::Sum, vec![Expression::column("s", "k2")])),
		],
	);
	let mut plan = plan.build(group);

	let expected = vec![
		vec![Value::Int4(1), Value::Int8(3), Value::Int8(18)],
		vec![Value::Int4(2), Value::Int8(2), Value::Int8(6)],
		vec![Value::Int4(3), Value::Int8(2), Value::Int8(10)],
	];
	assert_eq!(sorted(engine.execute(&mut plan).unwrap().rows()), expected);
}

#[test]
fn test_select_with_parameter() {
	let (engine, s) = sortable();
	let mut plan = LogicalPlan::new();
	let scan = plan.scan(s, "s");
	let select = plan.select(
		scan,
		vec![Expression::compare(
			Expression::column("s", "k2"),
			CompareOp::GreaterThanEqual,
			Expression::parameter("min", Type::Int4),
		)],
	);
	let project = plan.project(Some(select), columns_of("s", &["v"]));
	let mut plan = plan.build(project);

	let params = quarry_engine::Params::new().with("min", 6);
	let rows = engine.execute_with_params(&mut plan, &params).unwrap().rows();
	assert_eq!(sorted(rows), vec![vec![Value::utf8("d")], vec![Value::utf8("e")], vec![Value::utf8("g")]]);
}

/// `w(a, b)` with rows (1, 10), (2, 20), (3, 10), (4, 20), (5, 20).
fn windowed() -> (Engine, TableId) {
	init_tracing();
	let mut catalog = MaterializedCatalog::new();
	let w = create_table(&mut catalog, "w", vec![ColumnToCreate::new("a", Type::Int4), ColumnToCreate::new("b", Type::Int4)]);
	let engine = Engine::new(catalog);
	engine.execute(&mut insert_rows(w, &["a", "b"], int4_rows(&[&[1, 10], &[2, 20], &[3, 10], &[4, 20], &[5, 20]])))
		.unwrap();
	(engine, w)
}

fn over_w(engine: &Engine, w: TableId, value: Expression) -> Vec<Vec<Value>> {
	let mut plan = LogicalPlan::new();
	let scan = plan.scan(w, "w");
	let project = plan.project(
		Some(scan),
		vec![AliasExpression::unnamed(Expression::column("w", "a")), AliasExpression::new("x", value)],
	);
	let mut plan = plan.build(project);
	sorted(engine.execute(&mut plan).unwrap().rows())
}

fn a_b(a: i32, x: i64) -> Vec<Value> {
	vec![Value::Int4(a), Value::Int8(x)]
}

#[test]
fn test_row_number_per_partition() {
	let (engine, w) = windowed();
	let spec = WindowSpec {
		partition_by: vec![Expression::column("w", "b")],
		order_by: vec![SortKey::asc(Expression::column("w", "a"))],
	};
	let rows = over_w(&engine, w, Expression::window("row_number", vec![], spec));
	assert_eq!(rows, vec![a_b(1, 1), a_b(2, 1), a_b(3, 2), a_b(4, 2), a_b(5, 3)]);
}

#[test]
fn test_rank_with_peers() {
	let (engine, w) = windowed();
	let spec = WindowSpec {
		partition_by: vec![],
		order_by: vec![SortKey::asc(Expression::column("w", "b"))],
	};
	let rank = over_w(&engine, w, Expression::window("rank", vec![], spec.clone()));
	assert_eq!(rank, vec![a_b(1, 1), a_b(2, 3), a_b(3, 1), a_b(4, 3), a_b(5, 3)]);
	let dense = over_w(&engine, w, Expression::window("dense_rank", vec![], spec));
	assert_eq!(dense, vec![a_b(1, 1), a_b(2, 2), a_b(3, 1), a_b(4, 2), a_b(5, 2)]);
}

fn windowed_sum(spec: WindowSpec) -> Expression {
	Expression::Aggregate(AggregateExpression {
		function: AggregateFunction::Sum,
		args: vec![Expression::column("w", "a")],
		distinct: false,
		window: Some(spec),
	})
}

#[test]
fn test_window_sum_totals_and_running() {
	let (engine, w) = windowed();

	let totals = over_w(
		&engine,
		w,
		windowed_sum(WindowSpec {
			partition_by: vec![Expression::column("w", "b")],
			order_by: vec![],
		}),
	);
	assert_eq!(totals, vec![a_b(1, 4), a_b(2, 11), a_b(3, 4), a_b(4, 11), a_b(5, 11)]);

	let running = over_w(
		&engine,
		w,
		windowed_sum(WindowSpec {
			partition_by: vec![Expression::column("w", "b")],
			order_by: vec![SortKey::asc(Expression::column("w", "a"))],
		}),
	);
	assert_eq!(running, vec![a_b(1, 1), a_b(2, 2), a_b(3, 4), a_b(4, 6), a_b(5, 11)]);
}

fn distinct(function: AggregateFunction, column: &str) -> Expression {
	Expression::Aggregate(AggregateExpression {
		function,
		args: vec![Expression::column("g", column)],
		distinct: true,
		window: None,
	})
}

#[test]
fn test_distinct_aggregates() {
	init_tracing();
	let mut catalog = MaterializedCatalog::new();
	let g = create_table(&mut catalog, "g", vec![ColumnToCreate::new("k", Type::Int4), ColumnToCreate::new("v", Type::Int4)]);
	let engine = Engine::new(catalog);
	let rows = vec![
		vec![Value::Int4(1), Value::Int4(5)],
		vec![Value::Int4(1), Value::Int4(5)],
		vec![Value::Int4(1), Value::Int4(6)],
		vec![Value::Int4(2), Value::Int4(7)],
		vec![Value::Int4(2), Value::Int4(7)],
		vec![Value::Int4(2), Value::Undefined],
	];
	engine.execute(&mut insert_rows(g, &["k", "v"], rows)).unwrap();

	let mut plan = LogicalPlan::new();
	let scan = plan.scan(g, "g");
	let group = plan.group_by(
		scan,
		vec![Expression::column("g", "k")],
		vec![
			AliasExpression::unnamed(Expression::column("g", "k")),
			AliasExpression::new("n", distinct(AggregateFunction::Count, "v")),
			AliasExpression::new("total", distinct(AggregateFunction::Sum, "v")),
		],
	);
	let mut plan = plan.build(group);
	assert_eq!(
		sorted(engine.execute(&mut plan).unwrap().rows()),
		vec![
			vec![Value::Int4(1), Value::Int8(2), Value::Int8(11)],
			vec![Value::Int4(2), Value::Int8(1), Value::Int8(7)],
		]
	);

	let mut plan = LogicalPlan::new();
	let scan = plan.scan(g, "g");
	let group = plan.group_by(
		scan,
		vec![],
		vec![
			AliasExpression::new("n", distinct(AggregateFunction::Count, "v")),
			AliasExpression::new("total", distinct(AggregateFunction::Sum, "v")),
		],
	);
	let mut plan = plan.build(group);
	assert_eq!(engine.execute(&mut plan).unwrap().rows(), vec![vec![Value::Int8(3), Value::Int8(18)]]);
}

fn int8s(values: &[i64]) -> Vec<Vec<Value>> {
	values.iter().map(|v| vec![Value::Int8(*v)]).collect()
}

#[test]
fn test_generate_series_without_input() {
	let (engine, _, _) = two_sets(&[], &[]);
	let mut plan = LogicalPlan::new();
	let series = plan.table_function(
		None,
		"generate_series",
		vec![Expression::constant(1), Expression::constant(4)],
		vec![AliasExpression::new("n", Expression::column("generate_series", "value"))],
	);
	let mut plan = plan.build(series);

	let result = engine.execute(&mut plan).unwrap();
	let frame = result.frame().unwrap();
	assert_eq!(frame.columns[0].name, "n");
	assert_eq!(result.rows(), int8s(&[1, 2, 3]));
}

#[test]
fn test_generate_series_over_input_rows() {
	let (engine, l, _) = two_sets(&[1, 3], &[]);
	let mut plan = LogicalPlan::new();
	let scan = plan.scan(l, "l");
	let series = plan.table_function(
		Some(scan),
		"generate_series",
		vec![Expression::constant(0), Expression::column("l", "v")],
		vec![],
	);
	plan.set_alias(series, "s");
	let project = plan.project(Some(series), columns_of("s", &["value"]));
	let mut plan = plan.build(project);

	assert_eq!(sorted(engine.execute(&mut plan).unwrap().rows()), int8s(&[0, 0, 1, 2]));
}

/// `squares(n)`: one row `(n, n * n)` per argument row.
struct Squares;

impl TableFunction for Squares {
	fn table(&self, args: &[Column], rows: usize) -> quarry_engine::Result<Vec<Vec<Value>>> {
		let mut n = Vec::with_capacity(rows);
		let mut square = Vec::with_capacity(rows);
		for row in 0..rows {
			let value = args[0].get(row).as_i64().unwrap_or(0);
			n.push(Value::Int8(value));
			square.push(Value::Int8(value * value));
		}
		Ok(vec![n, square])
	}
}

#[test]
fn test_registered_table_function_with_two_columns() {
	init_tracing();
	let mut catalog = MaterializedCatalog::new();
	let l = single_column(&mut catalog, "l", "v");
	catalog.register_function(FunctionDef::table("squares", Arity::Exact(1), &[("n", Type::Int8), ("square", Type::Int8)]));
	let engine = Engine::builder(catalog).functions(Functions::builder().register_table("squares", Squares).build()).build();
	engine.execute(&mut insert_rows(l, &["v"], ints(&[2, 3]))).unwrap();

	let mut plan = LogicalPlan::new();
	let scan = plan.scan(l, "l");
	let squares = plan.table_function(
		Some(scan),
		"squares",
		vec![Expression::column("l", "v")],
		columns_of("s", &["n", "square"]),
	);
	plan.set_alias(squares, "s");
	let mut plan = plan.build(squares);

	assert_eq!(
		sorted(engine.execute(&mut plan).unwrap().rows()),
		vec![vec![Value::Int8(2), Value::Int8(4)], vec![Value::Int8(3), Value::Int8(9)]]
	);
}

#[test]
fn test_negated_or_drops_unknown_rows() {
	init_tracing();
	let mut catalog = MaterializedCatalog::new();
	let n = create_table(&mut catalog, "n", vec![ColumnToCreate::new("a", Type::Int4), ColumnToCreate::new("b", Type::Int4)]);
	let engine = Engine::new(catalog);
	let rows = vec![
		vec![Value::Undefined, Value::Int4(3)],
		vec![Value::Int4(7), Value::Int4(3)],
		vec![Value::Int4(1), Value::Int4(3)],
	];
	engine.execute(&mut insert_rows(n, &["a", "b"], rows)).unwrap();

	// NOT (a = 1 OR b = 2): unknown for the NULL row, which is dropped
	let predicate = Expression::Compare(CompareExpression {
		comparison: Comparison::Or {
			left: vec![Expression::equal(Expression::column("n", "a"), Expression::constant(1))],
			right: vec![Expression::equal(Expression::column("n", "b"), Expression::constant(2))],
		},
		anti: true,
	});
	let mut plan = LogicalPlan::new();
	let scan = plan.scan(n, "n");
	let select = plan.select(scan, vec![predicate]);
	let project = plan.project(Some(select), columns_of("n", &["a"]));
	let mut plan = plan.build(project);

	assert_eq!(engine.execute(&mut plan).unwrap().rows(), ints(&[7]));
}
