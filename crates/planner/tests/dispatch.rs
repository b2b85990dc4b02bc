mod support;

use mq_common::{InternalError, MqError};
use mq_planner::{
    build_query_plan, CompiledExpr, LiteralValue, Plan, StatementKind, TableScanExec,
};
use mq_sql::{AstKind, AstNode, SelectBuilder, TokenKind};

use support::{panicking_planner, planner, repo, spied_planner};

fn call(symbol: &str, aggregate: bool, args: Vec<CompiledExpr>) -> CompiledExpr {
    CompiledExpr::Call {
        symbol: symbol.to_string(),
        aggregate,
        args,
    }
}

fn table_scan(plan: &Plan) -> &TableScanExec {
    match plan {
        Plan::TableScan(x) => x,
        other => panic!("expected TableScan, got {}", other.name()),
    }
}

#[test]
fn statement_kinds_follow_root_node() {
    assert_eq!(StatementKind::of(&AstNode::draw(TokenKind::Bar)), StatementKind::Draw);
    assert_eq!(
        StatementKind::of(&SelectBuilder::new().column("a").build()),
        StatementKind::Select
    );
    assert_eq!(
        StatementKind::of(&AstNode::column("a")),
        StatementKind::Other(AstKind::ColumnName)
    );
}

#[test]
fn plain_select_is_a_table_scan() {
    let planner = planner();
    let ast = SelectBuilder::new()
        .column("a")
        .column("b")
        .from("t")
        .filter(AstNode::binary(AstKind::Gt, AstNode::column("a"), AstNode::int(1)))
        .build();

    let plan = planner.build_query_plan(&ast, &repo()).expect("plan");
    let scan = table_scan(&plan);
    assert_eq!(scan.table, "t");
    assert_eq!(plan.output_columns(), ["a".to_string(), "b".to_string()]);
    assert_eq!(
        scan.select_expr.expr,
        CompiledExpr::List(vec![CompiledExpr::Column(0), CompiledExpr::Column(1)])
    );
    assert_eq!(
        scan.predicate.as_ref().map(|p| p.expr.clone()),
        Some(call(
            "gt",
            false,
            vec![
                CompiledExpr::Column(0),
                CompiledExpr::Literal(LiteralValue::Int64(1))
            ]
        ))
    );
}

#[test]
fn ungrouped_selects_never_reach_the_group_by_rewriter() {
    let planner = planner();
    let statements = vec![
        SelectBuilder::new().column("a").from("t").build(),
        SelectBuilder::new()
            .expr(AstNode::call("round", vec![AstNode::column("x")]))
            .from("t")
            .build(),
        SelectBuilder::new()
            .expr(AstNode::binary(AstKind::Add, AstNode::int(1), AstNode::int(2)))
            .build(),
        SelectBuilder::new().all().from("cpu").limit(3).build(),
    ];
    for ast in &statements {
        planner.build_query_plan(ast, &repo()).expect("plan");
    }
    assert_eq!(planner.metrics().builder_invocations("group_by"), 0);
    assert_eq!(planner.metrics().builder_invocations("table_scan"), 3);
    assert_eq!(planner.metrics().builder_invocations("tableless_select"), 1);
}

#[test]
fn limit_takes_precedence_over_group_by() {
    let (planner, spies) = spied_planner();
    let ast = SelectBuilder::new()
        .expr(AstNode::call("count", vec![AstNode::column("x")]))
        .from("t")
        .group_by(AstNode::column("y"))
        .limit(10)
        .build();

    let plan = planner.build_query_plan(&ast, &repo()).expect("plan");
    let Plan::Limit(limit) = &plan else {
        panic!("expected Limit at the root, got {}", plan.name());
    };
    assert_eq!(limit.limit, 10);
    assert_eq!(limit.offset, 0);
    assert_eq!(limit.input.name(), "GroupBy");

    // the limit builder is consulted first, with the untouched statement
    let seen = spies.limit.seen();
    assert_eq!(seen[0], ast);
    assert!(seen[1..].iter().all(|s| !s.has_child(AstKind::Limit)));
    assert_eq!(planner.metrics().builder_invocations("limit"), 1);
    assert_eq!(planner.metrics().builder_invocations("group_by"), 1);
}

#[test]
fn limit_with_offset_keeps_input_columns() {
    let ast = SelectBuilder::new()
        .column("host")
        .from("cpu")
        .limit_offset(5, 2)
        .build();
    let plan = planner().build_query_plan(&ast, &repo()).expect("plan");
    let Plan::Limit(limit) = &plan else {
        panic!("expected Limit, got {}", plan.name());
    };
    assert_eq!((limit.limit, limit.offset), (5, 2));
    assert_eq!(plan.output_columns(), ["host".to_string()]);
}

#[test]
fn declined_table_scan_falls_back_to_tableless_select() {
    let (planner, spies) = spied_planner();
    let ast = SelectBuilder::new().expr_as(AstNode::int(1), "one").build();

    let plan = planner.build_query_plan(&ast, &repo()).expect("plan");
    assert_eq!(plan.name(), "TablelessSelect");
    assert_eq!(plan.output_columns(), ["one".to_string()]);
    assert_eq!(spies.table_scan.seen(), vec![ast.clone()]);
    assert_eq!(spies.tableless_select.seen(), vec![ast]);
    assert_eq!(planner.metrics().builder_invocations("table_scan"), 0);
}

#[test]
fn wildcard_expands_to_table_columns() {
    let ast = SelectBuilder::new().all().from("cpu").build();
    let plan = planner().build_query_plan(&ast, &repo()).expect("plan");
    assert_eq!(
        plan.output_columns(),
        ["time".to_string(), "host".to_string(), "value".to_string()]
    );
    assert_eq!(
        table_scan(&plan).select_expr.expr,
        CompiledExpr::List(vec![
            CompiledExpr::Column(0),
            CompiledExpr::Column(1),
            CompiledExpr::Column(2)
        ])
    );
}

#[test]
fn planning_never_modifies_the_input_tree() {
    let ast = AstNode::series_from(
        AstNode::column("y"),
        SelectBuilder::new()
            .column("y")
            .expr(AstNode::call("sum", vec![AstNode::column("x")]))
            .from("t")
            .group_by(AstNode::column("y"))
            .limit(100)
            .build(),
    );
    let before = ast.deep_copy();
    planner().build_query_plan(&ast, &repo()).expect("plan");
    assert_eq!(ast, before);
}

#[test]
fn user_errors_are_planning_errors() {
    let planner = planner();
    let unknown_table = SelectBuilder::new().column("a").from("disk").build();
    let unknown_column = SelectBuilder::new().column("nope").from("t").build();
    let aggregate_in_where = SelectBuilder::new()
        .column("a")
        .from("t")
        .filter(AstNode::binary(
            AstKind::Gt,
            AstNode::call("count", vec![AstNode::column("a")]),
            AstNode::int(1),
        ))
        .build();
    let column_without_table = SelectBuilder::new().column("a").build();

    for ast in [
        unknown_table,
        unknown_column,
        aggregate_in_where,
        column_without_table,
    ] {
        let err = planner.build_query_plan(&ast, &repo()).unwrap_err();
        assert!(matches!(err, MqError::Planning(_)), "got {err:?}");
    }
    assert_eq!(planner.metrics().internal_errors("no_builder_matched"), 0);
}

#[test]
fn unsupported_clauses_are_reported() {
    let ast = SelectBuilder::new()
        .column("a")
        .from("t")
        .order_by(AstNode::column("a"), true)
        .build();
    let err = planner().build_query_plan(&ast, &repo()).unwrap_err();
    assert!(matches!(err, MqError::Unsupported(ref m) if m == "ORDER BY"));
}

#[test]
fn unplannable_statement_is_an_internal_error() {
    let planner = planner();
    let err = planner
        .build_query_plan(&AstNode::column("a"), &repo())
        .unwrap_err();
    assert!(matches!(
        err,
        MqError::Internal(InternalError::NoBuilderMatched { ref kind }) if kind == "COLUMN_NAME"
    ));
    assert_eq!(planner.metrics().internal_errors("no_builder_matched"), 1);
}

#[test]
fn unknown_symbol_is_an_internal_error() {
    let ast = SelectBuilder::new()
        .expr(AstNode::call("frobnicate", vec![AstNode::column("a")]))
        .from("t")
        .build();
    let err = planner().build_query_plan(&ast, &repo()).unwrap_err();
    assert!(matches!(
        err,
        MqError::Internal(InternalError::UnknownSymbol { ref name }) if name == "frobnicate"
    ));
}

#[test]
#[should_panic(expected = "internal planner error")]
fn panic_policy_aborts_on_internal_errors() {
    let _ = panicking_planner().build_query_plan(&AstNode::column("a"), &repo());
}

#[test]
fn default_entry_point_plans_valid_statements() {
    let ast = SelectBuilder::new().column("value").from("cpu").build();
    let plan = build_query_plan(&ast, &repo()).expect("plan");
    assert_eq!(plan.output_columns(), ["value".to_string()]);
}

#[test]
fn one_planner_serves_concurrent_queries() {
    let planner = planner();
    let repo = repo();
    std::thread::scope(|s| {
        for i in 0..4u64 {
            let planner = &planner;
            let repo = &repo;
            s.spawn(move || {
                let ast = SelectBuilder::new()
                    .column("host")
                    .expr(AstNode::call("max", vec![AstNode::column("value")]))
                    .from("cpu")
                    .group_by(AstNode::column("host"))
                    .limit(i + 1)
                    .build();
                let plan = planner.build_query_plan(&ast, repo).expect("plan");
                assert_eq!(plan.output_columns(), ["host".to_string(), "unnamed".to_string()]);
            });
        }
    });
    assert_eq!(planner.metrics().builder_invocations("group_by"), 4);
}
