use std::fmt;

use serde::{Deserialize, Serialize};

use crate::token::{Token, TokenKind};

/// Node kinds of the query tree.
///
/// A node's kind fixes the arity and kinds of its children; see the
/// constructors on [`AstNode`] and [`crate::SelectBuilder`] for the shapes the
/// parser produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AstKind {
    /// `[SelectList, From?, Where?, GroupBy?, Having?, OrderBy?, Limit?]`
    Select,
    /// Ordered `DerivedColumn` / `All` entries.
    SelectList,
    /// `*` in a select list.
    All,
    /// `[expr, ColumnAlias?]`
    DerivedColumn,
    /// Positional reference into a select list; only produced by rewriting.
    ResolvedColumn,
    ColumnName,
    ColumnAlias,
    TableName,
    /// `[TableName]`
    From,
    /// `[predicate]`
    Where,
    /// `[expr, ...]`
    GroupBy,
    Having,
    OrderBy,
    SortSpec,
    /// Numeric token with the row count, optional `Offset` child.
    Limit,
    Offset,
    /// Token names the function; children are the arguments.
    MethodCall,
    Literal,
    /// `[name, Select]`
    Series,
    /// Literal series name carried in the token.
    SeriesName,
    /// Token selects the chart type.
    Draw,
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    And,
    Or,
    Not,
    Negate,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

impl AstKind {
    /// Function symbol implementing an operator kind, if this is one.
    pub fn operator_symbol(self) -> Option<&'static str> {
        let name = match self {
            AstKind::Eq => "eq",
            AstKind::Neq => "neq",
            AstKind::Lt => "lt",
            AstKind::Lte => "lte",
            AstKind::Gt => "gt",
            AstKind::Gte => "gte",
            AstKind::And => "and",
            AstKind::Or => "or",
            AstKind::Not => "not",
            AstKind::Negate => "neg",
            AstKind::Add => "add",
            AstKind::Sub => "sub",
            AstKind::Mul => "mul",
            AstKind::Div => "div",
            AstKind::Mod => "mod",
            AstKind::Pow => "pow",
            _ => return None,
        };
        Some(name)
    }
}

impl fmt::Display for AstKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AstKind::Select => "SELECT",
            AstKind::SelectList => "SELECT_LIST",
            AstKind::All => "ALL",
            AstKind::DerivedColumn => "DERIVED_COLUMN",
            AstKind::ResolvedColumn => "RESOLVED_COLUMN",
            AstKind::ColumnName => "COLUMN_NAME",
            AstKind::ColumnAlias => "COLUMN_ALIAS",
            AstKind::TableName => "TABLE_NAME",
            AstKind::From => "FROM",
            AstKind::Where => "WHERE",
            AstKind::GroupBy => "GROUP_BY",
            AstKind::Having => "HAVING",
            AstKind::OrderBy => "ORDER_BY",
            AstKind::SortSpec => "SORT_SPEC",
            AstKind::Limit => "LIMIT",
            AstKind::Offset => "OFFSET",
            AstKind::MethodCall => "METHOD_CALL",
            AstKind::Literal => "LITERAL",
            AstKind::Series => "SERIES",
            AstKind::SeriesName => "SERIES_NAME",
            AstKind::Draw => "DRAW",
            AstKind::Eq => "EQ_EXPR",
            AstKind::Neq => "NEQ_EXPR",
            AstKind::Lt => "LT_EXPR",
            AstKind::Lte => "LTE_EXPR",
            AstKind::Gt => "GT_EXPR",
            AstKind::Gte => "GTE_EXPR",
            AstKind::And => "AND_EXPR",
            AstKind::Or => "OR_EXPR",
            AstKind::Not => "NOT_EXPR",
            AstKind::Negate => "NEGATE_EXPR",
            AstKind::Add => "ADD_EXPR",
            AstKind::Sub => "SUB_EXPR",
            AstKind::Mul => "MUL_EXPR",
            AstKind::Div => "DIV_EXPR",
            AstKind::Mod => "MOD_EXPR",
            AstKind::Pow => "POW_EXPR",
        };
        f.write_str(s)
    }
}

/// One node of the query tree.
///
/// Children are owned, so `clone()` (and its alias [`AstNode::deep_copy`])
/// yields a fully independent tree: rewriting a copy never touches the
/// original. Derived `PartialEq` is structural equality over kind, token,
/// id and children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AstNode {
    kind: AstKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<Token>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<AstNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<usize>,
}

impl AstNode {
    pub fn new(kind: AstKind) -> Self {
        Self {
            kind,
            token: None,
            children: Vec::new(),
            id: None,
        }
    }

    pub fn with_token(kind: AstKind, token: Token) -> Self {
        Self {
            token: Some(token),
            ..Self::new(kind)
        }
    }

    pub fn with_children(kind: AstKind, children: Vec<AstNode>) -> Self {
        Self {
            children,
            ..Self::new(kind)
        }
    }

    pub fn kind(&self) -> AstKind {
        self.kind
    }

    pub fn token(&self) -> Option<&Token> {
        self.token.as_ref()
    }

    pub fn id(&self) -> Option<usize> {
        self.id
    }

    pub fn children(&self) -> &[AstNode] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut [AstNode] {
        &mut self.children
    }

    pub fn child(&self, index: usize) -> Option<&AstNode> {
        self.children.get(index)
    }

    pub fn child_mut(&mut self, index: usize) -> Option<&mut AstNode> {
        self.children.get_mut(index)
    }

    pub fn append_child(&mut self, child: AstNode) {
        self.children.push(child);
    }

    /// Builder-style [`AstNode::append_child`].
    pub fn push(mut self, child: AstNode) -> Self {
        self.children.push(child);
        self
    }

    /// Panics if `index > len`, like [`Vec::insert`].
    pub fn insert_child(&mut self, index: usize, child: AstNode) {
        self.children.insert(index, child);
    }

    /// Panics if `index` is out of bounds, like [`Vec::remove`].
    pub fn remove_child(&mut self, index: usize) -> AstNode {
        self.children.remove(index)
    }

    /// Swap in `child` at `index`, returning the previous child.
    pub fn replace_child(&mut self, index: usize, child: AstNode) -> AstNode {
        std::mem::replace(&mut self.children[index], child)
    }

    pub fn find_child(&self, kind: AstKind) -> Option<&AstNode> {
        self.children.iter().find(|c| c.kind == kind)
    }

    pub fn position_of(&self, kind: AstKind) -> Option<usize> {
        self.children.iter().position(|c| c.kind == kind)
    }

    pub fn has_child(&self, kind: AstKind) -> bool {
        self.position_of(kind).is_some()
    }

    /// Fully independent copy of this subtree.
    pub fn deep_copy(&self) -> AstNode {
        self.clone()
    }

    /// Turn this node into a positional reference to slot `index` of a select list.
    pub fn resolve_to(&mut self, index: usize) {
        self.kind = AstKind::ResolvedColumn;
        self.id = Some(index);
    }

    /// Pre-order search: true if `pred` holds for this node or any descendant.
    pub fn contains(&self, pred: &dyn Fn(&AstNode) -> bool) -> bool {
        pred(self) || self.children.iter().any(|c| c.contains(pred))
    }

    /// Text of the token, if any.
    pub fn token_text(&self) -> Option<&str> {
        self.token.as_ref().map(Token::text)
    }

    /// Indented dump of the subtree, one node per line.
    pub fn render_tree(&self) -> String {
        let mut out = String::new();
        self.render_into(0, &mut out);
        out
    }

    fn render_into(&self, indent: usize, out: &mut String) {
        let pad = "  ".repeat(indent);
        out.push_str(&format!("{pad}{}", self.kind));
        if let Some(token) = &self.token {
            out.push_str(&format!(" {token}"));
        }
        if let Some(id) = self.id {
            out.push_str(&format!(" #{id}"));
        }
        out.push('\n');
        for c in &self.children {
            c.render_into(indent + 1, out);
        }
    }

    // -------------------------
    // Constructors for common shapes
    // -------------------------

    pub fn column(name: impl Into<String>) -> Self {
        Self::with_token(AstKind::ColumnName, Token::identifier(name))
    }

    pub fn int(value: i64) -> Self {
        Self::with_token(AstKind::Literal, Token::numeric(value.to_string()))
    }

    pub fn float(value: f64) -> Self {
        Self::with_token(AstKind::Literal, Token::numeric(value.to_string()))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::with_token(AstKind::Literal, Token::string(value))
    }

    pub fn boolean(value: bool) -> Self {
        let kind = if value { TokenKind::True } else { TokenKind::False };
        Self::with_token(AstKind::Literal, Token::keyword(kind))
    }

    pub fn call(name: impl Into<String>, args: Vec<AstNode>) -> Self {
        Self {
            token: Some(Token::identifier(name)),
            children: args,
            ..Self::new(AstKind::MethodCall)
        }
    }

    pub fn binary(kind: AstKind, left: AstNode, right: AstNode) -> Self {
        Self::with_children(kind, vec![left, right])
    }

    pub fn derived(expr: AstNode) -> Self {
        Self::with_children(AstKind::DerivedColumn, vec![expr])
    }

    pub fn derived_as(expr: AstNode, alias: impl Into<String>) -> Self {
        Self::with_children(
            AstKind::DerivedColumn,
            vec![
                expr,
                Self::with_token(AstKind::ColumnAlias, Token::identifier(alias)),
            ],
        )
    }

    /// `SERIES "name" <select>`
    pub fn series_named(name: impl Into<String>, select: AstNode) -> Self {
        Self::with_children(
            AstKind::Series,
            vec![
                Self::with_token(AstKind::SeriesName, Token::string(name)),
                select,
            ],
        )
    }

    /// `SERIES FROM <expr> <select>`
    pub fn series_from(name_expr: AstNode, select: AstNode) -> Self {
        Self::with_children(AstKind::Series, vec![name_expr, select])
    }

    pub fn draw(chart: TokenKind) -> Self {
        Self::with_token(AstKind::Draw, Token::keyword(chart))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deep_copy_is_independent() {
        let original = AstNode::call(
            "sum",
            vec![AstNode::binary(
                AstKind::Add,
                AstNode::column("a"),
                AstNode::int(1),
            )],
        );
        let mut copy = original.deep_copy();
        copy.child_mut(0)
            .and_then(|add| add.child_mut(0))
            .expect("column")
            .resolve_to(3);
        copy.append_child(AstNode::column("b"));

        let col = &original.children()[0].children()[0];
        assert_eq!(col.kind(), AstKind::ColumnName);
        assert_eq!(col.id(), None);
        assert_eq!(original.children().len(), 1);
        assert_ne!(original, copy);
    }

    #[test]
    fn structural_equality_ignores_identity() {
        assert_eq!(AstNode::column("x"), AstNode::column("x"));
        assert_ne!(AstNode::column("x"), AstNode::column("y"));
        let mut resolved = AstNode::column("x");
        resolved.resolve_to(0);
        assert_ne!(resolved, AstNode::column("x"));
    }

    #[test]
    fn child_editing() {
        let mut node = AstNode::with_children(
            AstKind::Select,
            vec![AstNode::new(AstKind::SelectList), AstNode::new(AstKind::GroupBy)],
        );
        assert_eq!(node.position_of(AstKind::GroupBy), Some(1));
        let removed = node.remove_child(1);
        assert_eq!(removed.kind(), AstKind::GroupBy);
        assert!(!node.has_child(AstKind::GroupBy));

        let old = node.replace_child(0, AstNode::new(AstKind::All));
        assert_eq!(old.kind(), AstKind::SelectList);
        node.insert_child(0, old);
        assert_eq!(node.children()[0].kind(), AstKind::SelectList);
        assert_eq!(node.children()[1].kind(), AstKind::All);
    }

    #[test]
    fn renders_indented_tree() {
        let mut col = AstNode::column("x");
        col.resolve_to(2);
        let node = AstNode::call("count", vec![col]);
        assert_eq!(
            node.render_tree(),
            "METHOD_CALL count\n  RESOLVED_COLUMN x #2\n"
        );
    }

    #[test]
    fn contains_searches_descendants() {
        let node = AstNode::binary(AstKind::Mul, AstNode::int(2), AstNode::call("max", vec![]));
        assert!(node.contains(&|n| n.kind() == AstKind::MethodCall));
        assert!(!node.contains(&|n| n.kind() == AstKind::ColumnName));
    }

    #[test]
    fn serde_skips_empty_fields() {
        let json = serde_json::to_string(&AstNode::column("x")).expect("serialize");
        assert_eq!(
            json,
            r#"{"kind":"ColumnName","token":{"kind":"Identifier","text":"x"}}"#
        );
        let back: AstNode = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, AstNode::column("x"));
    }
}
