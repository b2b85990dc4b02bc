use crate::ast::{AstKind, AstNode};
use crate::token::{Token, TokenKind};

/// Assembles SELECT trees in the canonical child order
/// `[SelectList, From?, Where?, GroupBy?, Having?, OrderBy?, Limit?]`.
///
/// ```
/// use mq_sql::{AstKind, AstNode, SelectBuilder};
///
/// let select = SelectBuilder::new()
///     .expr(AstNode::call("count", vec![AstNode::column("x")]))
///     .from("t")
///     .group_by(AstNode::column("y"))
///     .build();
/// assert_eq!(select.kind(), AstKind::Select);
/// assert_eq!(select.children().len(), 3);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SelectBuilder {
    items: Vec<AstNode>,
    from: Option<String>,
    predicate: Option<AstNode>,
    group_exprs: Vec<AstNode>,
    having: Option<AstNode>,
    order_by: Vec<(AstNode, bool)>,
    limit: Option<(u64, Option<u64>)>,
}

impl SelectBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plain column reference item.
    pub fn column(self, name: &str) -> Self {
        self.expr(AstNode::column(name))
    }

    pub fn expr(mut self, expr: AstNode) -> Self {
        self.items.push(AstNode::derived(expr));
        self
    }

    pub fn expr_as(mut self, expr: AstNode, alias: &str) -> Self {
        self.items.push(AstNode::derived_as(expr, alias));
        self
    }

    /// `*`
    pub fn all(mut self) -> Self {
        self.items.push(AstNode::new(AstKind::All));
        self
    }

    pub fn from(mut self, table: &str) -> Self {
        self.from = Some(table.to_string());
        self
    }

    pub fn filter(mut self, predicate: AstNode) -> Self {
        self.predicate = Some(predicate);
        self
    }

    pub fn group_by(mut self, expr: AstNode) -> Self {
        self.group_exprs.push(expr);
        self
    }

    pub fn having(mut self, predicate: AstNode) -> Self {
        self.having = Some(predicate);
        self
    }

    pub fn order_by(mut self, expr: AstNode, descending: bool) -> Self {
        self.order_by.push((expr, descending));
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some((limit, None));
        self
    }

    pub fn limit_offset(mut self, limit: u64, offset: u64) -> Self {
        self.limit = Some((limit, Some(offset)));
        self
    }

    pub fn build(self) -> AstNode {
        let mut select =
            AstNode::new(AstKind::Select).push(AstNode::with_children(AstKind::SelectList, self.items));

        if let Some(table) = self.from {
            select.append_child(AstNode::new(AstKind::From).push(AstNode::with_token(
                AstKind::TableName,
                Token::identifier(table),
            )));
        }
        if let Some(predicate) = self.predicate {
            select.append_child(AstNode::new(AstKind::Where).push(predicate));
        }
        if !self.group_exprs.is_empty() {
            select.append_child(AstNode::with_children(AstKind::GroupBy, self.group_exprs));
        }
        if let Some(predicate) = self.having {
            select.append_child(AstNode::new(AstKind::Having).push(predicate));
        }
        if !self.order_by.is_empty() {
            let specs = self
                .order_by
                .into_iter()
                .map(|(expr, descending)| {
                    let dir = if descending {
                        TokenKind::Desc
                    } else {
                        TokenKind::Asc
                    };
                    AstNode::with_token(AstKind::SortSpec, Token::keyword(dir)).push(expr)
                })
                .collect();
            select.append_child(AstNode::with_children(AstKind::OrderBy, specs));
        }
        if let Some((limit, offset)) = self.limit {
            let mut node = AstNode::with_token(AstKind::Limit, Token::numeric(limit.to_string()));
            if let Some(offset) = offset {
                node.append_child(AstNode::with_token(
                    AstKind::Offset,
                    Token::numeric(offset.to_string()),
                ));
            }
            select.append_child(node);
        }
        select
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clauses_follow_canonical_order() {
        let select = SelectBuilder::new()
            .column("a")
            .limit_offset(10, 5)
            .group_by(AstNode::column("a"))
            .filter(AstNode::binary(AstKind::Gt, AstNode::column("a"), AstNode::int(1)))
            .from("t")
            .build();
        let kinds: Vec<AstKind> = select.children().iter().map(AstNode::kind).collect();
        assert_eq!(
            kinds,
            vec![
                AstKind::SelectList,
                AstKind::From,
                AstKind::Where,
                AstKind::GroupBy,
                AstKind::Limit,
            ]
        );
        let limit = select.find_child(AstKind::Limit).expect("limit");
        assert_eq!(limit.token_text(), Some("10"));
        assert_eq!(
            limit.find_child(AstKind::Offset).and_then(AstNode::token_text),
            Some("5")
        );
    }

    #[test]
    fn bare_select_has_only_select_list() {
        let select = SelectBuilder::new().expr(AstNode::int(1)).build();
        assert_eq!(select.children().len(), 1);
        assert_eq!(select.children()[0].children()[0].kind(), AstKind::DerivedColumn);
    }
}
