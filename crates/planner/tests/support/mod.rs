#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use arrow_schema::{DataType, Field, Schema};
use mq_common::{InternalErrorPolicy, PlannerConfig};
use mq_planner::{
    InMemoryTableRepository, LeafBuilders, LeafPlanBuilder, Plan, QueryPlanner, TableRepository,
};
use mq_sql::AstNode;

/// `t(a, b, x, y, time)` and `cpu(time, host, value)`.
pub fn repo() -> InMemoryTableRepository {
    InMemoryTableRepository::new()
        .with_table(
            "t",
            Schema::new(vec![
                Field::new("a", DataType::Int64, false),
                Field::new("b", DataType::Int64, false),
                Field::new("x", DataType::Float64, true),
                Field::new("y", DataType::Utf8, true),
                Field::new("time", DataType::Int64, false),
            ]),
        )
        .with_table(
            "cpu",
            Schema::new(vec![
                Field::new("time", DataType::Int64, false),
                Field::new("host", DataType::Utf8, false),
                Field::new("value", DataType::Float64, true),
            ]),
        )
}

/// Planner that reports internal failures instead of panicking.
pub fn planner() -> QueryPlanner {
    QueryPlanner::new(PlannerConfig::reporting())
}

pub fn planner_with(f: impl FnOnce(&mut PlannerConfig)) -> QueryPlanner {
    let mut config = PlannerConfig::reporting();
    f(&mut config);
    QueryPlanner::new(config)
}

pub fn panicking_planner() -> QueryPlanner {
    planner_with(|c| c.internal_error_policy = InternalErrorPolicy::Panic)
}

/// Leaf builder that records every statement offered to it, then delegates.
pub struct SpyBuilder {
    inner: Arc<dyn LeafPlanBuilder>,
    seen: Mutex<Vec<AstNode>>,
}

impl SpyBuilder {
    pub fn wrap(inner: Arc<dyn LeafPlanBuilder>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            seen: Mutex::new(vec![]),
        })
    }

    pub fn seen(&self) -> Vec<AstNode> {
        self.seen.lock().expect("spy lock poisoned").clone()
    }
}

impl LeafPlanBuilder for SpyBuilder {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn build(
        &self,
        ast: &AstNode,
        planner: &QueryPlanner,
        repo: &dyn TableRepository,
    ) -> mq_common::Result<Option<Plan>> {
        self.seen
            .lock()
            .expect("spy lock poisoned")
            .push(ast.clone());
        self.inner.build(ast, planner, repo)
    }
}

pub struct Spies {
    pub limit: Arc<SpyBuilder>,
    pub table_scan: Arc<SpyBuilder>,
    pub tableless_select: Arc<SpyBuilder>,
}

/// Reporting planner whose leaf builders are wrapped in spies.
pub fn spied_planner() -> (QueryPlanner, Spies) {
    let defaults = LeafBuilders::default();
    let spies = Spies {
        limit: SpyBuilder::wrap(defaults.limit),
        table_scan: SpyBuilder::wrap(defaults.table_scan),
        tableless_select: SpyBuilder::wrap(defaults.tableless_select),
    };
    let planner = planner().with_leaf_builders(LeafBuilders {
        limit: spies.limit.clone(),
        table_scan: spies.table_scan.clone(),
        tableless_select: spies.tableless_select.clone(),
    });
    (planner, spies)
}
