use crate::compiler::{CompiledExpr, LiteralValue};
use crate::plan::{ChartType, Plan};

/// Render a plan as human-readable multiline text.
pub fn explain_plan(plan: &Plan) -> String {
    let mut s = String::new();
    fmt_plan(plan, 0, &mut s);
    s
}

fn fmt_plan(plan: &Plan, indent: usize, out: &mut String) {
    let pad = "  ".repeat(indent);
    match plan {
        Plan::TableScan(x) => {
            out.push_str(&format!(
                "{pad}TableScan table={} columns={}\n",
                x.table,
                fmt_names(&x.column_names)
            ));
            out.push_str(&format!("{pad}  select={}\n", fmt_expr(&x.select_expr.expr)));
            if let Some(p) = &x.predicate {
                out.push_str(&format!("{pad}  where={}\n", fmt_expr(&p.expr)));
            }
        }
        Plan::TablelessSelect(x) => {
            out.push_str(&format!(
                "{pad}TablelessSelect columns={}\n",
                fmt_names(&x.column_names)
            ));
            out.push_str(&format!("{pad}  select={}\n", fmt_expr(&x.select_expr.expr)));
        }
        Plan::Limit(x) => {
            out.push_str(&format!("{pad}Limit n={} offset={}\n", x.limit, x.offset));
            fmt_plan(&x.input, indent + 1, out);
        }
        Plan::GroupBy(x) => {
            out.push_str(&format!(
                "{pad}GroupBy columns={} scratchpad={}\n",
                fmt_names(&x.column_names),
                x.scratchpad_size
            ));
            out.push_str(&format!("{pad}  select={}\n", fmt_expr(&x.select_expr)));
            out.push_str(&format!("{pad}  group={}\n", fmt_expr(&x.group_expr)));
            fmt_plan(&x.input, indent + 1, out);
        }
        Plan::Series(x) => {
            out.push_str(&format!(
                "{pad}Series columns={}\n",
                fmt_names(&x.column_names)
            ));
            out.push_str(&format!("{pad}  name={}\n", fmt_expr(&x.name_expr)));
            fmt_plan(&x.input, indent + 1, out);
        }
        Plan::Draw(x) => {
            out.push_str(&format!("{pad}Draw chart={}\n", fmt_chart(x.chart)));
        }
    }
}

fn fmt_chart(c: ChartType) -> &'static str {
    match c {
        ChartType::BarChart => "bar",
        ChartType::LineChart => "line",
        ChartType::AreaChart => "area",
    }
}

fn fmt_names(names: &[String]) -> String {
    format!("[{}]", names.join(", "))
}

fn fmt_expr(e: &CompiledExpr) -> String {
    match e {
        CompiledExpr::Column(i) => format!("#{i}"),
        CompiledExpr::Literal(v) => match v {
            LiteralValue::Int64(i) => i.to_string(),
            LiteralValue::Float64(f) => f.to_string(),
            LiteralValue::Utf8(s) => format!("{s:?}"),
            LiteralValue::Boolean(b) => b.to_string(),
            LiteralValue::Null => "null".to_string(),
        },
        CompiledExpr::Call { symbol, args, .. } => format!(
            "{}({})",
            symbol,
            args.iter().map(fmt_expr).collect::<Vec<_>>().join(", ")
        ),
        CompiledExpr::List(items) => format!(
            "[{}]",
            items.iter().map(fmt_expr).collect::<Vec<_>>().join(", ")
        ),
    }
}
