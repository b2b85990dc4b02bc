//! Predicates deciding whether a SELECT needs grouping.

use mq_common::{InternalError, Result};
use mq_sql::{AstKind, AstNode};

use crate::symbols::SymbolTable;

/// True iff `ast` is a SELECT with at least two children, one of them a GROUP BY.
pub fn has_group_by_clause(ast: &AstNode) -> bool {
    if ast.kind() != AstKind::Select || ast.children().len() < 2 {
        return false;
    }
    ast.has_child(AstKind::GroupBy)
}

/// True iff `ast` is a SELECT with at least two children whose select list
/// calls an aggregate function anywhere.
pub fn has_aggregation_in_select_list(ast: &AstNode, symbols: &dyn SymbolTable) -> Result<bool> {
    if ast.kind() != AstKind::Select || ast.children().len() < 2 {
        return Ok(false);
    }
    let select_list = &ast.children()[0];
    if select_list.kind() != AstKind::SelectList {
        return Err(InternalError::MalformedTree(format!(
            "SELECT starts with {} instead of a select list",
            select_list.kind()
        ))
        .into());
    }
    has_aggregation_expression(select_list, symbols)
}

/// Recursive search for a method call whose symbol is an aggregate.
///
/// Fails with [`InternalError::UnknownSymbol`] when a visited method call names
/// a function the symbol table does not know.
pub fn has_aggregation_expression(node: &AstNode, symbols: &dyn SymbolTable) -> Result<bool> {
    if node.kind() == AstKind::MethodCall {
        let name = node.token_text().ok_or_else(|| {
            InternalError::MalformedTree("method call without name".to_string())
        })?;
        let symbol = symbols
            .lookup(name)
            .ok_or_else(|| InternalError::UnknownSymbol {
                name: name.to_string(),
            })?;
        if symbol.is_aggregate() {
            return Ok(true);
        }
    }

    for child in node.children() {
        if has_aggregation_expression(child, symbols)? {
            return Ok(true);
        }
    }
    Ok(false)
}
