//! Query plan builder for the metricq query language.
//!
//! Architecture role:
//! - takes a parsed [`mq_sql::AstNode`] (SELECT, SERIES or DRAW statement)
//! - splits grouped selects into a per-row projection under an aggregation node
//! - returns a [`Plan`] tree for the execution engine
//!
//! Key modules:
//! - [`query_plan`]: dispatcher and [`QueryPlanner`]
//! - [`classify`]: aggregation detection
//! - [`group_by`]: group-by rewriting and column push-down
//! - [`leaf`]: limit / table scan / tableless select builders
//! - [`compiler`], [`symbols`], [`repository`]: collaborator contracts and defaults

pub mod classify;
pub mod compiler;
mod draw;
pub mod explain;
pub mod group_by;
pub mod leaf;
pub mod plan;
pub mod query_plan;
pub mod repository;
mod series;
pub mod symbols;

pub use classify::{
    has_aggregation_expression, has_aggregation_in_select_list, has_group_by_clause,
};
pub use compiler::{
    AstCompiler, CompiledExpr, CompiledExpression, ExpressionCompiler, LiteralValue,
};
pub use explain::explain_plan;
pub use group_by::{push_down, PushDown};
pub use leaf::{
    LeafBuilders, LeafPlanBuilder, LimitClauseBuilder, TableScanBuilder, TablelessSelectBuilder,
};
pub use plan::{
    ChartType, DrawExec, GroupByExec, LimitExec, Plan, SeriesExec, TableScanExec,
    TablelessSelectExec, UNNAMED_COLUMN,
};
pub use query_plan::{build_query_plan, QueryPlanner, StatementKind};
pub use repository::{InMemoryTableRepository, TableRepository};
pub use symbols::{Symbol, SymbolRegistry, SymbolTable};
