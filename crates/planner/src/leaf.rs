//! Leaf and near-leaf operator builders consulted by the dispatcher.
//!
//! Each builder either claims a statement (`Ok(Some(plan))`), declines it
//! (`Ok(None)`), or claims it and finds it invalid (`Err`). Declining is not an
//! error; the dispatcher simply moves on to the next builder.

use std::sync::Arc;

use mq_common::{InternalError, MqError, Result};
use mq_sql::{AstKind, AstNode, Token};

use crate::plan::{output_column_name, LimitExec, Plan, TableScanExec, TablelessSelectExec};
use crate::query_plan::QueryPlanner;
use crate::repository::TableRepository;

pub trait LeafPlanBuilder: Send + Sync {
    /// Stable builder name, used in logs and metrics.
    fn name(&self) -> &'static str;

    /// Build a plan for `ast`, or return `Ok(None)` if the shape is not this
    /// builder's. Builders needing a child plan recurse through `planner`.
    fn build(
        &self,
        ast: &AstNode,
        planner: &QueryPlanner,
        repo: &dyn TableRepository,
    ) -> Result<Option<Plan>>;
}

/// The three builders the dispatcher consults, in precedence order
/// limit → table scan → tableless select.
#[derive(Clone)]
pub struct LeafBuilders {
    pub limit: Arc<dyn LeafPlanBuilder>,
    pub table_scan: Arc<dyn LeafPlanBuilder>,
    pub tableless_select: Arc<dyn LeafPlanBuilder>,
}

impl Default for LeafBuilders {
    fn default() -> Self {
        Self {
            limit: Arc::new(LimitClauseBuilder),
            table_scan: Arc::new(TableScanBuilder),
            tableless_select: Arc::new(TablelessSelectBuilder),
        }
    }
}

impl std::fmt::Debug for LeafBuilders {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeafBuilders")
            .field("limit", &self.limit.name())
            .field("table_scan", &self.table_scan.name())
            .field("tableless_select", &self.tableless_select.name())
            .finish()
    }
}

/// `SELECT ... LIMIT n [OFFSET m]`: strips the clause and plans the rest.
#[derive(Debug, Default, Clone, Copy)]
pub struct LimitClauseBuilder;

impl LeafPlanBuilder for LimitClauseBuilder {
    fn name(&self) -> &'static str {
        "limit"
    }

    fn build(
        &self,
        ast: &AstNode,
        planner: &QueryPlanner,
        repo: &dyn TableRepository,
    ) -> Result<Option<Plan>> {
        if ast.kind() != AstKind::Select {
            return Ok(None);
        }
        let Some(pos) = ast.position_of(AstKind::Limit) else {
            return Ok(None);
        };

        let mut child = ast.deep_copy();
        let clause = child.remove_child(pos);
        let limit = parse_count(clause.token(), "LIMIT")?;
        let offset = match clause.find_child(AstKind::Offset) {
            Some(o) => parse_count(o.token(), "OFFSET")?,
            None => 0,
        };

        let input = planner.plan(&child, repo)?;
        Ok(Some(Plan::Limit(LimitExec {
            limit,
            offset,
            input: Box::new(input),
        })))
    }
}

fn parse_count(token: Option<&Token>, clause: &str) -> Result<usize> {
    let token = token
        .ok_or_else(|| InternalError::MalformedTree(format!("{clause} without a count")))?;
    token
        .text()
        .parse::<usize>()
        .map_err(|_| MqError::Planning(format!("invalid {clause} count: {}", token.text())))
}

/// `SELECT ... FROM table [WHERE ...]`: binds column names to the table schema.
#[derive(Debug, Default, Clone, Copy)]
pub struct TableScanBuilder;

impl LeafPlanBuilder for TableScanBuilder {
    fn name(&self) -> &'static str {
        "table_scan"
    }

    fn build(
        &self,
        ast: &AstNode,
        planner: &QueryPlanner,
        repo: &dyn TableRepository,
    ) -> Result<Option<Plan>> {
        if ast.kind() != AstKind::Select {
            return Ok(None);
        }
        let Some(from) = ast.find_child(AstKind::From) else {
            return Ok(None);
        };
        reject_unplanned_clauses(ast)?;

        let table = from
            .find_child(AstKind::TableName)
            .and_then(AstNode::token_text)
            .ok_or_else(|| InternalError::MalformedTree("FROM without table name".to_string()))?;
        let schema = repo.table_schema(table)?;
        let columns: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();

        let mut select_list = AstNode::new(AstKind::SelectList);
        let mut column_names = vec![];
        for item in select_list_of(ast)?.children() {
            match item.kind() {
                AstKind::All => {
                    for (i, name) in columns.iter().enumerate() {
                        let mut col = AstNode::column(*name);
                        col.resolve_to(i);
                        select_list.append_child(AstNode::derived(col));
                        column_names.push(name.to_string());
                    }
                }
                AstKind::DerivedColumn => {
                    let mut resolved = item.deep_copy();
                    bind_columns(&mut resolved, table, &columns)?;
                    column_names.push(output_column_name(item));
                    select_list.append_child(resolved);
                }
                other => {
                    return Err(InternalError::MalformedTree(format!(
                        "{other} node in select list"
                    ))
                    .into())
                }
            }
        }

        let select_expr = planner.compiler().compile(&select_list)?;
        if select_expr.scratchpad_size != 0 {
            // aggregates are routed to the group-by rewriter before we get here
            return Err(InternalError::NonZeroScratchpad {
                context: "table scan select list",
                size: select_expr.scratchpad_size,
            }
            .into());
        }

        let predicate = match ast.find_child(AstKind::Where).and_then(|w| w.child(0)) {
            Some(p) => {
                let mut p = p.deep_copy();
                bind_columns(&mut p, table, &columns)?;
                let compiled = planner.compiler().compile(&p)?;
                if compiled.scratchpad_size != 0 {
                    return Err(MqError::Planning(
                        "aggregate functions are not allowed in WHERE".to_string(),
                    ));
                }
                Some(compiled)
            }
            None => None,
        };

        Ok(Some(Plan::TableScan(TableScanExec {
            table: table.to_string(),
            column_names,
            select_expr,
            predicate,
        })))
    }
}

/// `SELECT <constants>` without FROM; produces one row.
#[derive(Debug, Default, Clone, Copy)]
pub struct TablelessSelectBuilder;

impl LeafPlanBuilder for TablelessSelectBuilder {
    fn name(&self) -> &'static str {
        "tableless_select"
    }

    fn build(
        &self,
        ast: &AstNode,
        planner: &QueryPlanner,
        _repo: &dyn TableRepository,
    ) -> Result<Option<Plan>> {
        if ast.kind() != AstKind::Select || ast.has_child(AstKind::From) {
            return Ok(None);
        }
        reject_unplanned_clauses(ast)?;
        if ast.has_child(AstKind::Where) {
            return Err(MqError::Unsupported("WHERE without FROM".to_string()));
        }

        let select_list = select_list_of(ast)?;
        if select_list.has_child(AstKind::All) {
            return Err(MqError::Planning(
                "SELECT * requires a FROM clause".to_string(),
            ));
        }
        let column_names = select_list
            .children()
            .iter()
            .map(output_column_name)
            .collect();

        let select_expr = planner.compiler().compile(select_list)?;
        if select_expr.scratchpad_size != 0 {
            return Err(MqError::Planning(
                "aggregate functions require a FROM clause".to_string(),
            ));
        }
        Ok(Some(Plan::TablelessSelect(TablelessSelectExec {
            column_names,
            select_expr,
        })))
    }
}

fn select_list_of(ast: &AstNode) -> Result<&AstNode> {
    match ast.child(0) {
        Some(list) if list.kind() == AstKind::SelectList => Ok(list),
        _ => Err(InternalError::MalformedTree("SELECT without select list".to_string()).into()),
    }
}

fn reject_unplanned_clauses(ast: &AstNode) -> Result<()> {
    for (kind, clause) in [(AstKind::Having, "HAVING"), (AstKind::OrderBy, "ORDER BY")] {
        if ast.has_child(kind) {
            return Err(MqError::Unsupported(clause.to_string()));
        }
    }
    Ok(())
}

/// Rewrite `ColumnName` nodes into positions of the table's columns.
fn bind_columns(node: &mut AstNode, table: &str, columns: &[&str]) -> Result<()> {
    if node.kind() == AstKind::ColumnName {
        let name = node.token_text().unwrap_or_default();
        let index = columns
            .iter()
            .position(|c| *c == name)
            .or_else(|| columns.iter().position(|c| c.eq_ignore_ascii_case(name)))
            .ok_or_else(|| {
                MqError::Planning(format!("unknown column '{name}' in table '{table}'"))
            })?;
        node.resolve_to(index);
        return Ok(());
    }
    for child in node.children_mut() {
        bind_columns(child, table, columns)?;
    }
    Ok(())
}
