use std::collections::HashMap;
use std::sync::Arc;

use arrow_schema::{Schema, SchemaRef};
use mq_common::{MqError, Result};

/// Table lookup used by the table-scan builder.
/// The hosting metric store provides this from its own catalog.
pub trait TableRepository {
    /// Return schema for a table by name.
    fn table_schema(&self, table: &str) -> Result<SchemaRef>;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryTableRepository {
    tables: HashMap<String, SchemaRef>,
}

impl InMemoryTableRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a table, returning the previous schema if any.
    pub fn register_table(&mut self, name: impl Into<String>, schema: Schema) -> Option<SchemaRef> {
        self.tables.insert(name.into(), Arc::new(schema))
    }

    pub fn with_table(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.register_table(name, schema);
        self
    }

    /// Registered table names, sorted.
    pub fn tables(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.keys().cloned().collect();
        names.sort();
        names
    }
}

impl TableRepository for InMemoryTableRepository {
    fn table_schema(&self, table: &str) -> Result<SchemaRef> {
        self.tables
            .get(table)
            .map(Arc::clone)
            .ok_or_else(|| MqError::Planning(format!("unknown table: {table}")))
    }
}
