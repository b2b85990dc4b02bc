//! GROUP BY / aggregation rewriting.
//!
//! A grouped SELECT is split into two operators:
//!
//! ```text
//! GroupBy  (external select list + group keys, columns as #positions)
//!   └── child plan  (internal select list: one derived column per raw column reference)
//! ```
//!
//! Column references are moved ("pushed down") from the external expressions
//! into the internal select list and replaced by positional references, so
//! the parent never evaluates a raw column name.

use mq_common::{InternalError, MqError, Result};
use mq_sql::{AstKind, AstNode};
use tracing::debug;

use crate::plan::{output_column_name, GroupByExec, Plan, UNNAMED_COLUMN};
use crate::query_plan::QueryPlanner;
use crate::repository::TableRepository;

/// Column push-down into a target select list.
///
/// With `dedup` on, a column reference structurally equal to one already
/// pushed into the target reuses that slot; otherwise every reference gets a
/// fresh slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushDown {
    dedup: bool,
    inserted: usize,
    reused: usize,
}

impl PushDown {
    pub fn new(dedup: bool) -> Self {
        Self {
            dedup,
            inserted: 0,
            reused: 0,
        }
    }

    /// Rewrite every `ColumnName` in `node` into a `ResolvedColumn` pointing at
    /// a derived column of `target`, appending derived columns as needed.
    ///
    /// Mutates `node`; callers holding a tree they must preserve pass a copy.
    /// Returns `false` if `target` is not a select list.
    pub fn apply(&mut self, node: &mut AstNode, target: &mut AstNode) -> bool {
        if node.kind() != AstKind::ColumnName {
            return node
                .children_mut()
                .iter_mut()
                .all(|child| self.apply(child, target));
        }
        if target.kind() != AstKind::SelectList {
            return false;
        }

        let existing = if self.dedup {
            target.children().iter().position(|candidate| {
                candidate.kind() == AstKind::DerivedColumn && candidate.child(0) == Some(&*node)
            })
        } else {
            None
        };

        let index = match existing {
            Some(i) => {
                self.reused += 1;
                i
            }
            None => {
                target.append_child(AstNode::derived(node.deep_copy()));
                self.inserted += 1;
                target.children().len() - 1
            }
        };
        node.resolve_to(index);
        true
    }

    /// References that were given a new slot.
    pub fn inserted(&self) -> usize {
        self.inserted
    }

    /// References that shared an existing slot.
    pub fn reused(&self) -> usize {
        self.reused
    }
}

/// One-shot push-down; see [`PushDown::apply`].
pub fn push_down(node: &mut AstNode, target: &mut AstNode, dedup: bool) -> bool {
    PushDown::new(dedup).apply(node, target)
}

pub(crate) fn build_group_by(
    planner: &QueryPlanner,
    ast: &AstNode,
    repo: &dyn TableRepository,
) -> Result<Plan> {
    planner.metrics().record_builder("group_by");

    let source_list = match ast.child(0) {
        Some(list) if list.kind() == AstKind::SelectList => list,
        _ => {
            return Err(InternalError::MalformedTree(
                "grouped SELECT without select list".to_string(),
            )
            .into())
        }
    };
    if source_list.has_child(AstKind::All) {
        return Err(MqError::Unsupported(
            "SELECT * together with GROUP BY or aggregate functions".to_string(),
        ));
    }

    let mut pushdown = PushDown::new(planner.config().dedup_pushdown);

    // external select list, rewritten against the internal one
    let mut select_list = source_list.deep_copy();
    let mut child_list = AstNode::new(AstKind::SelectList);
    if !pushdown.apply(&mut select_list, &mut child_list) {
        return Err(
            InternalError::MalformedTree("push-down target is not a select list".into()).into(),
        );
    }

    // group keys name table columns; select-list aliases are not resolved here
    let mut group_exprs = AstNode::new(AstKind::GroupBy);
    for clause in ast.children().iter().filter(|c| c.kind() == AstKind::GroupBy) {
        for expr in clause.children() {
            let mut e = expr.deep_copy();
            if !pushdown.apply(&mut e, &mut child_list) {
                return Err(InternalError::MalformedTree(
                    "push-down target is not a select list".into(),
                )
                .into());
            }
            group_exprs.append_child(e);
        }
    }

    planner
        .metrics()
        .record_pushdown(pushdown.inserted(), pushdown.reused());
    debug!(
        internal_columns = child_list.children().len(),
        group_exprs = group_exprs.children().len(),
        reused = pushdown.reused(),
        "rewrote grouped select"
    );

    // child: same statement, internal select list, no grouping
    let mut child_ast = ast.deep_copy();
    child_ast.replace_child(0, child_list);
    while let Some(i) = child_ast.position_of(AstKind::GroupBy) {
        child_ast.remove_child(i);
    }

    let select = planner.compiler().compile(&select_list)?;
    let group = planner.compiler().compile(&group_exprs)?;
    if group.scratchpad_size != 0 {
        return Err(InternalError::NonZeroScratchpad {
            context: "group expression",
            size: group.scratchpad_size,
        }
        .into());
    }

    let column_names = if planner.config().resolve_output_names {
        source_list
            .children()
            .iter()
            .map(output_column_name)
            .collect()
    } else {
        vec![UNNAMED_COLUMN.to_string(); source_list.children().len()]
    };

    let input = planner.plan(&child_ast, repo)?;

    Ok(Plan::GroupBy(GroupByExec {
        column_names,
        select_expr: select.expr,
        group_expr: group.expr,
        scratchpad_size: select.scratchpad_size,
        input: Box::new(input),
    }))
}
