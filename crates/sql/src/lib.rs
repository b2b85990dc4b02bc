//! Query tree shared by the metricq parser and planner.
//!
//! The parser produces [`AstNode`] trees; the planner reads them, deep-copies
//! the parts it rewrites, and never mutates a tree it does not own.
//! [`SelectBuilder`] and the constructors on [`AstNode`] assemble the shapes
//! the parser emits.

mod ast;
mod builder;
mod token;

pub use ast::{AstKind, AstNode};
pub use builder::SelectBuilder;
pub use token::{Token, TokenKind};
