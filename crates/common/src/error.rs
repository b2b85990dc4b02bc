use thiserror::Error;

/// Canonical metricq error taxonomy used across crates.
///
/// Classification guidance:
/// - [`MqError::Planning`]: query shape/name issues reachable from user input
/// - [`MqError::Unsupported`]: well-formed trees the planner intentionally does not handle
/// - [`MqError::InvalidConfig`]: planner configuration contract violations
/// - [`MqError::Internal`]: planner/parser/symbol-table inconsistencies (bugs, not user errors)
#[derive(Debug, Error)]
pub enum MqError {
    /// Invalid or inconsistent configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Query planning failures caused by the query itself.
    ///
    /// Examples:
    /// - unknown table or column
    /// - aggregate call inside a WHERE predicate
    /// - column reference in a select without FROM
    #[error("planning error: {0}")]
    Planning(String),

    /// Valid tree shape for a clause that is not implemented in this version.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Internal-consistency failure.
    ///
    /// Reaching one of these means the parser, the symbol table and the planner
    /// disagree about the language; hosting code decides whether to crash or
    /// report (see [`crate::InternalErrorPolicy`]).
    #[error("internal planner error: {0}")]
    Internal(#[from] InternalError),
}

impl MqError {
    /// Returns `true` for internal-consistency failures.
    pub fn is_internal(&self) -> bool {
        matches!(self, MqError::Internal(_))
    }
}

/// Internal-consistency failures raised by the planner.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InternalError {
    /// A method call names a function the symbol table does not know.
    #[error("no symbol registered for method call '{name}'")]
    UnknownSymbol { name: String },

    /// A DRAW statement carries a chart token the planner does not recognize.
    #[error("unrecognized draw statement kind: {kind}")]
    UnknownDrawKind { kind: String },

    /// An expression that must be evaluated without scratch memory needs some.
    #[error("{context} must compile to zero scratchpad, got {size} bytes")]
    NonZeroScratchpad { context: &'static str, size: usize },

    /// Every builder declined the statement.
    #[error("no plan builder accepted {kind} statement")]
    NoBuilderMatched { kind: String },

    /// The tree violates a structural invariant (e.g. SELECT without select list).
    #[error("malformed tree: {0}")]
    MalformedTree(String),
}

impl InternalError {
    /// Stable short label, used as a metrics label value.
    pub fn label(&self) -> &'static str {
        match self {
            InternalError::UnknownSymbol { .. } => "unknown_symbol",
            InternalError::UnknownDrawKind { .. } => "unknown_draw_kind",
            InternalError::NonZeroScratchpad { .. } => "nonzero_scratchpad",
            InternalError::NoBuilderMatched { .. } => "no_builder_matched",
            InternalError::MalformedTree(_) => "malformed_tree",
        }
    }
}

/// Standard metricq result alias.
pub type Result<T> = std::result::Result<T, MqError>;
