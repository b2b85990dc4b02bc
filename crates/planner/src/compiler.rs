//! Expression compilation.
//!
//! Input contract:
//! - column references have been rewritten to `ResolvedColumn` positions by
//!   push-down or by a leaf builder;
//! - every method call names a symbol known to the [`SymbolTable`].
//!
//! Output contract:
//! - a [`CompiledExpr`] tree that never refers back to the query tree, plus the
//!   scratch memory its aggregates need per evaluation.

use std::sync::Arc;

use mq_common::{InternalError, MqError, Result};
use mq_sql::{AstKind, AstNode, TokenKind};
use serde::{Deserialize, Serialize};

use crate::symbols::SymbolTable;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LiteralValue {
    Int64(i64),
    Float64(f64),
    Utf8(String),
    Boolean(bool),
    Null,
}

/// Evaluable expression produced from a query subtree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CompiledExpr {
    Literal(LiteralValue),
    /// Value at this position of the input row.
    Column(usize),
    Call {
        symbol: String,
        aggregate: bool,
        args: Vec<CompiledExpr>,
    },
    /// One value per entry, e.g. a select list or a list of grouping keys.
    List(Vec<CompiledExpr>),
}

impl CompiledExpr {
    /// Every resolved column position referenced by this expression, in visit order.
    pub fn referenced_columns(&self) -> Vec<usize> {
        let mut out = vec![];
        self.collect_columns(&mut out);
        out
    }

    fn collect_columns(&self, out: &mut Vec<usize>) {
        match self {
            CompiledExpr::Column(i) => out.push(*i),
            CompiledExpr::Literal(_) => {}
            CompiledExpr::Call { args, .. } | CompiledExpr::List(args) => {
                for a in args {
                    a.collect_columns(out);
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledExpression {
    pub expr: CompiledExpr,
    /// Bytes of temporary storage one evaluation needs.
    pub scratchpad_size: usize,
}

/// Turns a fully column-resolved subtree into an evaluable expression.
pub trait ExpressionCompiler: Send + Sync {
    fn compile(&self, ast: &AstNode) -> Result<CompiledExpression>;
}

/// Default compiler backed by a symbol table.
pub struct AstCompiler {
    symbols: Arc<dyn SymbolTable>,
}

impl AstCompiler {
    pub fn new(symbols: Arc<dyn SymbolTable>) -> Self {
        Self { symbols }
    }

    fn compile_node(&self, node: &AstNode, scratchpad: &mut usize) -> Result<CompiledExpr> {
        match node.kind() {
            AstKind::SelectList | AstKind::GroupBy => {
                let items = node
                    .children()
                    .iter()
                    .map(|c| self.compile_node(c, scratchpad))
                    .collect::<Result<Vec<_>>>()?;
                Ok(CompiledExpr::List(items))
            }
            AstKind::DerivedColumn => {
                let expr = node.child(0).ok_or_else(|| {
                    InternalError::MalformedTree("derived column without expression".to_string())
                })?;
                self.compile_node(expr, scratchpad)
            }
            AstKind::ResolvedColumn => {
                let id = node.id().ok_or_else(|| {
                    InternalError::MalformedTree("resolved column without index".to_string())
                })?;
                Ok(CompiledExpr::Column(id))
            }
            AstKind::ColumnName => Err(MqError::Planning(format!(
                "unresolved column reference: {}",
                node.token_text().unwrap_or("?")
            ))),
            AstKind::Literal => Ok(CompiledExpr::Literal(literal_value(node)?)),
            AstKind::MethodCall => {
                let name = node.token_text().ok_or_else(|| {
                    InternalError::MalformedTree("method call without name".to_string())
                })?;
                self.compile_call(name, node.children(), scratchpad)
            }
            AstKind::All => Err(MqError::Unsupported(
                "* is only supported in the select list of a table scan".to_string(),
            )),
            kind => match kind.operator_symbol() {
                Some(name) => self.compile_call(name, node.children(), scratchpad),
                None => Err(MqError::Unsupported(format!(
                    "cannot compile {kind} node into an expression"
                ))),
            },
        }
    }

    fn compile_call(
        &self,
        name: &str,
        args: &[AstNode],
        scratchpad: &mut usize,
    ) -> Result<CompiledExpr> {
        let symbol = self
            .symbols
            .lookup(name)
            .ok_or_else(|| InternalError::UnknownSymbol {
                name: name.to_string(),
            })?;
        let args = args
            .iter()
            .map(|a| self.compile_node(a, scratchpad))
            .collect::<Result<Vec<_>>>()?;
        *scratchpad += symbol.scratchpad_size();
        Ok(CompiledExpr::Call {
            symbol: symbol.name().to_string(),
            aggregate: symbol.is_aggregate(),
            args,
        })
    }
}

impl ExpressionCompiler for AstCompiler {
    fn compile(&self, ast: &AstNode) -> Result<CompiledExpression> {
        let mut scratchpad_size = 0;
        let expr = self.compile_node(ast, &mut scratchpad_size)?;
        Ok(CompiledExpression {
            expr,
            scratchpad_size,
        })
    }
}

fn literal_value(node: &AstNode) -> Result<LiteralValue> {
    let token = node
        .token()
        .ok_or_else(|| InternalError::MalformedTree("literal without token".to_string()))?;
    match token.kind() {
        TokenKind::Numeric => {
            let text = token.text();
            if let Ok(v) = text.parse::<i64>() {
                return Ok(LiteralValue::Int64(v));
            }
            text.parse::<f64>()
                .map(LiteralValue::Float64)
                .map_err(|_| MqError::Planning(format!("invalid numeric literal: {text}")))
        }
        TokenKind::String => Ok(LiteralValue::Utf8(token.text().to_string())),
        TokenKind::True => Ok(LiteralValue::Boolean(true)),
        TokenKind::False => Ok(LiteralValue::Boolean(false)),
        TokenKind::Null => Ok(LiteralValue::Null),
        other => Err(InternalError::MalformedTree(format!("literal with {other} token")).into()),
    }
}
