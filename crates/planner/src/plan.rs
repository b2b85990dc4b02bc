use mq_sql::{AstKind, AstNode};
use serde::{Deserialize, Serialize};

use crate::compiler::{CompiledExpr, CompiledExpression};

/// Name given to output columns that have neither an alias nor a plain
/// column reference to borrow a name from.
pub const UNNAMED_COLUMN: &str = "unnamed";

/// The executable operator tree produced by the planner.
///
/// Composite operators own their inputs; the tree mirrors, but never shares
/// nodes with, the query tree it was built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Plan {
    /// Projection (and optional filter) over one table.
    TableScan(TableScanExec),
    /// Constant select without FROM; yields a single row.
    TablelessSelect(TablelessSelectExec),
    /// Row limit / offset.
    Limit(LimitExec),
    /// Grouping and aggregation over a per-row projection.
    GroupBy(GroupByExec),
    /// Labels each row of a nested select with a series name.
    Series(SeriesExec),
    /// Chart declaration.
    Draw(DrawExec),
}

impl Plan {
    /// Output column names, in order.
    pub fn output_columns(&self) -> &[String] {
        match self {
            Plan::TableScan(x) => &x.column_names,
            Plan::TablelessSelect(x) => &x.column_names,
            Plan::Limit(x) => x.input.output_columns(),
            Plan::GroupBy(x) => &x.column_names,
            Plan::Series(x) => &x.column_names,
            Plan::Draw(_) => &[],
        }
    }

    /// Returns direct child operators.
    pub fn children(&self) -> Vec<&Plan> {
        match self {
            Plan::TableScan(_) | Plan::TablelessSelect(_) | Plan::Draw(_) => vec![],
            Plan::Limit(x) => vec![x.input.as_ref()],
            Plan::GroupBy(x) => vec![x.input.as_ref()],
            Plan::Series(x) => vec![x.input.as_ref()],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Plan::TableScan(_) => "TableScan",
            Plan::TablelessSelect(_) => "TablelessSelect",
            Plan::Limit(_) => "Limit",
            Plan::GroupBy(_) => "GroupBy",
            Plan::Series(_) => "Series",
            Plan::Draw(_) => "Draw",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableScanExec {
    pub table: String,
    pub column_names: Vec<String>,
    /// Select list over the table's columns (positions follow the table schema).
    pub select_expr: CompiledExpression,
    pub predicate: Option<CompiledExpression>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TablelessSelectExec {
    pub column_names: Vec<String>,
    pub select_expr: CompiledExpression,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitExec {
    pub limit: usize,
    pub offset: usize,
    pub input: Box<Plan>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupByExec {
    pub column_names: Vec<String>,
    /// External select list; column positions index into `input`'s output.
    pub select_expr: CompiledExpr,
    /// Grouping keys; column positions index into `input`'s output.
    pub group_expr: CompiledExpr,
    /// Scratch bytes needed per group to evaluate `select_expr`.
    pub scratchpad_size: usize,
    pub input: Box<Plan>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesExec {
    /// `"series"` followed by one name per axis of the nested select.
    pub column_names: Vec<String>,
    pub name_expr: CompiledExpr,
    pub input: Box<Plan>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartType {
    BarChart,
    LineChart,
    AreaChart,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawExec {
    pub chart: ChartType,
}

/// Output name for one select-list entry: its alias, else the referenced
/// column's name, else [`UNNAMED_COLUMN`].
pub(crate) fn output_column_name(item: &AstNode) -> String {
    if let Some(alias) = item.find_child(AstKind::ColumnAlias) {
        if let Some(name) = alias.token_text() {
            return name.to_string();
        }
    }
    match item.child(0) {
        Some(expr) if expr.kind() == AstKind::ColumnName => expr
            .token_text()
            .unwrap_or(UNNAMED_COLUMN)
            .to_string(),
        _ => UNNAMED_COLUMN.to_string(),
    }
}
