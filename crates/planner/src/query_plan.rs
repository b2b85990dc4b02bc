//! Plan dispatcher: the planner's entry point.

use std::sync::Arc;

use mq_common::{
    InternalError, InternalErrorPolicy, MetricsRegistry, MqError, PlannerConfig, Result,
};
use mq_sql::{AstKind, AstNode};
use tracing::{debug, error};

use crate::classify::{has_aggregation_in_select_list, has_group_by_clause};
use crate::compiler::{AstCompiler, ExpressionCompiler};
use crate::draw::build_draw;
use crate::group_by::build_group_by;
use crate::leaf::{LeafBuilders, LeafPlanBuilder};
use crate::plan::Plan;
use crate::repository::TableRepository;
use crate::series::build_series;
use crate::symbols::{SymbolRegistry, SymbolTable};

/// Top-level statement classes, checked in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Series,
    Draw,
    Select,
    /// Anything the parser may emit that the planner has no builder for.
    Other(AstKind),
}

impl StatementKind {
    pub fn of(ast: &AstNode) -> Self {
        match ast.kind() {
            AstKind::Series => StatementKind::Series,
            AstKind::Draw => StatementKind::Draw,
            AstKind::Select => StatementKind::Select,
            other => StatementKind::Other(other),
        }
    }
}

/// Compiles query trees into [`Plan`]s.
///
/// Holds no per-query state: one planner can serve any number of independent
/// `build_query_plan` calls, each owning its input tree and output plan.
pub struct QueryPlanner {
    config: PlannerConfig,
    symbols: Arc<dyn SymbolTable>,
    compiler: Arc<dyn ExpressionCompiler>,
    leaves: LeafBuilders,
    metrics: MetricsRegistry,
}

impl std::fmt::Debug for QueryPlanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryPlanner")
            .field("config", &self.config)
            .field("leaves", &self.leaves)
            .finish_non_exhaustive()
    }
}

impl Default for QueryPlanner {
    fn default() -> Self {
        Self::new(PlannerConfig::default())
    }
}

impl QueryPlanner {
    /// Planner with the built-in symbols, compiler and leaf builders.
    pub fn new(config: PlannerConfig) -> Self {
        let symbols: Arc<dyn SymbolTable> = Arc::new(SymbolRegistry::with_builtins());
        Self {
            config,
            compiler: Arc::new(AstCompiler::new(Arc::clone(&symbols))),
            symbols,
            leaves: LeafBuilders::default(),
            metrics: MetricsRegistry::new(),
        }
    }

    /// Replace the symbol table; the default compiler is rebuilt on top of it.
    pub fn with_symbols(mut self, symbols: Arc<dyn SymbolTable>) -> Self {
        self.compiler = Arc::new(AstCompiler::new(Arc::clone(&symbols)));
        self.symbols = symbols;
        self
    }

    pub fn with_compiler(mut self, compiler: Arc<dyn ExpressionCompiler>) -> Self {
        self.compiler = compiler;
        self
    }

    pub fn with_leaf_builders(mut self, leaves: LeafBuilders) -> Self {
        self.leaves = leaves;
        self
    }

    pub fn with_metrics(mut self, metrics: MetricsRegistry) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn symbols(&self) -> &dyn SymbolTable {
        self.symbols.as_ref()
    }

    pub fn compiler(&self) -> &dyn ExpressionCompiler {
        self.compiler.as_ref()
    }

    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    /// Build the plan for a complete statement.
    ///
    /// Internal-consistency failures are counted, logged, and then either
    /// returned or turned into a panic according to
    /// [`PlannerConfig::internal_error_policy`]. The input tree is never modified.
    pub fn build_query_plan(&self, ast: &AstNode, repo: &dyn TableRepository) -> Result<Plan> {
        match self.plan(ast, repo) {
            Err(MqError::Internal(e)) => Err(self.internal_failure(e)),
            other => other,
        }
    }

    fn internal_failure(&self, e: InternalError) -> MqError {
        self.metrics.record_internal_error(e.label());
        error!(kind = e.label(), "internal planner error: {e}");
        match self.config.internal_error_policy {
            InternalErrorPolicy::Panic => panic!("internal planner error: {e}"),
            InternalErrorPolicy::Report => MqError::Internal(e),
        }
    }

    /// Recursive dispatch used by builders for nested statements.
    ///
    /// First match wins: series, draw, limit, group-by/aggregation, table
    /// scan, tableless select. Errors are returned raw; the failure policy is
    /// only applied by [`QueryPlanner::build_query_plan`].
    pub fn plan(&self, ast: &AstNode, repo: &dyn TableRepository) -> Result<Plan> {
        match StatementKind::of(ast) {
            StatementKind::Series => {
                debug!("planning SERIES statement");
                build_series(self, ast, repo)
            }
            StatementKind::Draw => {
                debug!("planning DRAW statement");
                build_draw(self, ast)
            }
            StatementKind::Select => self.plan_select(ast, repo),
            StatementKind::Other(kind) => Err(InternalError::NoBuilderMatched {
                kind: kind.to_string(),
            }
            .into()),
        }
    }

    fn plan_select(&self, ast: &AstNode, repo: &dyn TableRepository) -> Result<Plan> {
        if let Some(plan) = self.try_leaf(self.leaves.limit.as_ref(), ast, repo)? {
            return Ok(plan);
        }

        if has_group_by_clause(ast) || has_aggregation_in_select_list(ast, self.symbols())? {
            debug!("planning grouped SELECT");
            return build_group_by(self, ast, repo);
        }

        if let Some(plan) = self.try_leaf(self.leaves.table_scan.as_ref(), ast, repo)? {
            return Ok(plan);
        }
        if let Some(plan) = self.try_leaf(self.leaves.tableless_select.as_ref(), ast, repo)? {
            return Ok(plan);
        }

        Err(InternalError::NoBuilderMatched {
            kind: AstKind::Select.to_string(),
        }
        .into())
    }

    fn try_leaf(
        &self,
        builder: &dyn LeafPlanBuilder,
        ast: &AstNode,
        repo: &dyn TableRepository,
    ) -> Result<Option<Plan>> {
        let plan = builder.build(ast, self, repo)?;
        if plan.is_some() {
            debug!(builder = builder.name(), "leaf builder accepted statement");
            self.metrics.record_builder(builder.name());
        }
        Ok(plan)
    }
}

/// Plan `ast` with a default [`QueryPlanner`].
pub fn build_query_plan(ast: &AstNode, repo: &dyn TableRepository) -> Result<Plan> {
    QueryPlanner::default().build_query_plan(ast, repo)
}
