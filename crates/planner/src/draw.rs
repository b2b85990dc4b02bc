use mq_common::{InternalError, Result};
use mq_sql::{AstNode, TokenKind};

use crate::plan::{ChartType, DrawExec, Plan};
use crate::query_plan::QueryPlanner;

/// Maps the DRAW token to a chart type. Data binding happens later, so the
/// plan node has no inputs and no columns.
pub(crate) fn build_draw(planner: &QueryPlanner, ast: &AstNode) -> Result<Plan> {
    planner.metrics().record_builder("draw");

    let chart = match ast.token().map(|t| t.kind()) {
        Some(TokenKind::Bar) => ChartType::BarChart,
        Some(TokenKind::Line) => ChartType::LineChart,
        Some(TokenKind::Area) => ChartType::AreaChart,
        other => {
            return Err(InternalError::UnknownDrawKind {
                kind: other.map_or_else(|| "<none>".to_string(), |k| k.to_string()),
            }
            .into())
        }
    };
    Ok(Plan::Draw(DrawExec { chart }))
}
