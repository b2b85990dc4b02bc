use mq_common::{InternalError, MqError, Result};
use mq_sql::{AstKind, AstNode};
use tracing::debug;

use crate::group_by::PushDown;
use crate::plan::{Plan, SeriesExec};
use crate::query_plan::QueryPlanner;
use crate::repository::TableRepository;

/// Builds `SERIES <name> <select>`.
///
/// A literal name is copied as a constant. A computed name has its column
/// references pushed into the nested select list (on a copy of the nested
/// select), so it is evaluated over the same rows the select produces.
pub(crate) fn build_series(
    planner: &QueryPlanner,
    ast: &AstNode,
    repo: &dyn TableRepository,
) -> Result<Plan> {
    planner.metrics().record_builder("series");

    let (name_node, select_ast) = match ast.children() {
        [name, select] => (name, select),
        _ => {
            return Err(InternalError::MalformedTree(format!(
                "SERIES expects a name and a select, got {} children",
                ast.children().len()
            ))
            .into())
        }
    };
    let num_axes = match select_ast.child(0) {
        Some(list) if list.kind() == AstKind::SelectList => list.children().len(),
        _ => {
            return Err(
                InternalError::MalformedTree("SERIES select without select list".into()).into(),
            )
        }
    };

    let mut select = select_ast.deep_copy();
    let name = if name_node.kind() == AstKind::SeriesName {
        let token = name_node.token().cloned().ok_or_else(|| {
            InternalError::MalformedTree("series name without token".to_string())
        })?;
        AstNode::with_token(AstKind::Literal, token)
    } else {
        // slots are numbered before `*` is expanded against the table schema
        if select_ast.child(0).is_some_and(|list| list.has_child(AstKind::All)) {
            return Err(MqError::Unsupported(
                "SELECT * together with a computed series name".to_string(),
            ));
        }
        let mut name = name_node.deep_copy();
        let mut pushdown = PushDown::new(planner.config().dedup_pushdown);
        let pushed = match select.child_mut(0) {
            Some(list) => pushdown.apply(&mut name, list),
            None => false,
        };
        if !pushed {
            return Err(InternalError::MalformedTree(
                "push-down target is not a select list".into(),
            )
            .into());
        }
        planner
            .metrics()
            .record_pushdown(pushdown.inserted(), pushdown.reused());
        name
    };

    let input = planner.plan(&select, repo)?;

    let name_expr = planner.compiler().compile(&name)?;
    if name_expr.scratchpad_size != 0 {
        return Err(InternalError::NonZeroScratchpad {
            context: "series name expression",
            size: name_expr.scratchpad_size,
        }
        .into());
    }

    let mut column_names = vec!["series".to_string()];
    column_names.extend(input.output_columns().iter().take(num_axes).cloned());
    debug!(axes = num_axes, columns = ?column_names, "built series statement");

    Ok(Plan::Series(SeriesExec {
        column_names,
        name_expr: name_expr.expr,
        input: Box::new(input),
    }))
}
