use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    Identifier,
    String,
    Numeric,
    True,
    False,
    Null,
    Bar,
    Line,
    Area,
    Asc,
    Desc,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenKind::Identifier => "IDENTIFIER",
            TokenKind::String => "STRING",
            TokenKind::Numeric => "NUMERIC",
            TokenKind::True => "TRUE",
            TokenKind::False => "FALSE",
            TokenKind::Null => "NULL",
            TokenKind::Bar => "BAR",
            TokenKind::Line => "LINE",
            TokenKind::Area => "AREA",
            TokenKind::Asc => "ASC",
            TokenKind::Desc => "DESC",
        };
        f.write_str(s)
    }
}

/// A lexical token attached to a tree node: identifier, literal text, or a
/// keyword selecting a statement sub-kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    kind: TokenKind,
    text: String,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn identifier(name: impl Into<String>) -> Self {
        Self::new(TokenKind::Identifier, name)
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::new(TokenKind::String, value)
    }

    pub fn numeric(value: impl Into<String>) -> Self {
        Self::new(TokenKind::Numeric, value)
    }

    /// Keyword token; the text is the keyword's canonical spelling.
    pub fn keyword(kind: TokenKind) -> Self {
        Self::new(kind, kind.to_string())
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::String => write!(f, "\"{}\"", self.text),
            _ => f.write_str(&self.text),
        }
    }
}
