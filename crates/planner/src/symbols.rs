//! Function symbols referenced by method calls and operators.

use std::collections::HashMap;
use std::sync::RwLock;

/// A named function descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    name: String,
    aggregate: bool,
    scratchpad_size: usize,
}

impl Symbol {
    /// Row-at-a-time function; needs no scratch memory.
    pub fn scalar(name: impl Into<String>) -> Self {
        Self {
            name: name.into().to_ascii_lowercase(),
            aggregate: false,
            scratchpad_size: 0,
        }
    }

    /// Aggregate function keeping `scratchpad_size` bytes of state per group.
    pub fn aggregate(name: impl Into<String>, scratchpad_size: usize) -> Self {
        Self {
            name: name.into().to_ascii_lowercase(),
            aggregate: true,
            scratchpad_size,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_aggregate(&self) -> bool {
        self.aggregate
    }

    pub fn scratchpad_size(&self) -> usize {
        self.scratchpad_size
    }
}

/// Symbol lookup used by the planner. Names are matched case-insensitively.
pub trait SymbolTable: Send + Sync {
    fn lookup(&self, name: &str) -> Option<Symbol>;
}

/// Default in-memory symbol table.
#[derive(Debug, Default)]
pub struct SymbolRegistry {
    symbols: RwLock<HashMap<String, Symbol>>,
}

const SCALAR_BUILTINS: &[&str] = &[
    "add",
    "sub",
    "mul",
    "div",
    "mod",
    "pow",
    "neg",
    "eq",
    "neq",
    "lt",
    "lte",
    "gt",
    "gte",
    "and",
    "or",
    "not",
    "round",
    "truncate",
    "from_timestamp",
];

impl SymbolRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the operator functions and the standard
    /// aggregates (`count`, `sum`, `min`, `max`, `mean`, `avg`).
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        for name in SCALAR_BUILTINS {
            registry.register(Symbol::scalar(*name));
        }
        registry.register(Symbol::aggregate("count", 8));
        registry.register(Symbol::aggregate("sum", 8));
        registry.register(Symbol::aggregate("min", 16));
        registry.register(Symbol::aggregate("max", 16));
        registry.register(Symbol::aggregate("mean", 16));
        registry.register(Symbol::aggregate("avg", 16));
        registry
    }

    /// Register or replace a symbol.
    ///
    /// Returns `true` when an existing symbol with the same name was replaced.
    pub fn register(&self, symbol: Symbol) -> bool {
        self.symbols
            .write()
            .expect("symbol registry lock poisoned")
            .insert(symbol.name.clone(), symbol)
            .is_some()
    }

    /// Returns `true` when an existing symbol was removed.
    pub fn deregister(&self, name: &str) -> bool {
        self.symbols
            .write()
            .expect("symbol registry lock poisoned")
            .remove(&name.to_ascii_lowercase())
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.symbols
            .read()
            .expect("symbol registry lock poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SymbolTable for SymbolRegistry {
    fn lookup(&self, name: &str) -> Option<Symbol> {
        self.symbols
            .read()
            .expect("symbol registry lock poisoned")
            .get(&name.to_ascii_lowercase())
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_flag_aggregates() {
        let symbols = SymbolRegistry::with_builtins();
        let count = symbols.lookup("COUNT").expect("count");
        assert!(count.is_aggregate());
        assert_eq!(count.scratchpad_size(), 8);

        let add = symbols.lookup("add").expect("add");
        assert!(!add.is_aggregate());
        assert_eq!(add.scratchpad_size(), 0);

        assert!(symbols.lookup("frobnicate").is_none());
    }

    #[test]
    fn register_replaces_and_deregisters() {
        let symbols = SymbolRegistry::new();
        assert!(symbols.is_empty());
        assert!(!symbols.register(Symbol::scalar("Double")));
        assert!(symbols.register(Symbol::aggregate("double", 4)));
        assert!(symbols.lookup("DOUBLE").expect("double").is_aggregate());
        assert!(symbols.deregister("double"));
        assert!(!symbols.deregister("double"));
    }
}
