//! Relationship lookup behind the graph builder.
//!
//! The sorter never talks to a metadata source directly; it goes through
//! [`RelationshipProvider`] so the same ordering logic works whether the
//! relationships come from parsed DDL or from live catalog queries.

use indexmap::IndexMap;

use crate::ir::{ForeignKey, SchemaModel, Table, TableRef};

/// Errors from a relationship lookup.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    #[error("table '{0}' is not known to the metadata source")]
    UnknownTable(TableRef),

    #[error("metadata query failed for '{table}': {message}")]
    Metadata { table: TableRef, message: String },
}

/// Source of foreign key relationships for a set of tables.
///
/// Lookups are issued sequentially on the caller's thread; implementations
/// backed by a single connection need no internal synchronization.
pub trait RelationshipProvider {
    /// FK constraints declared on `table` (the tables it references).
    fn referenced_tables(&self, table: &TableRef) -> Result<Vec<ForeignKey>, ProviderError>;

    /// FK constraints on other tables that reference `table`, paired with
    /// the owning (child) table.
    fn referencing_tables(
        &self,
        table: &TableRef,
    ) -> Result<Vec<(TableRef, ForeignKey)>, ProviderError>;
}

/// Provider backed by a parsed [`SchemaModel`].
pub struct SchemaProvider<'a> {
    model: &'a SchemaModel,
}

impl<'a> SchemaProvider<'a> {
    pub fn new(model: &'a SchemaModel) -> Self {
        Self { model }
    }

    fn find(&self, table: &TableRef) -> Option<&'a Table> {
        self.model.tables.iter().find(|t| refs_match(&t.name, table))
    }
}

/// Two table references denote the same table when names match and neither
/// side carries a contradicting qualifier. An unqualified reference matches
/// any schema.
fn refs_match(entry: &TableRef, query: &TableRef) -> bool {
    if entry.name != query.name {
        return false;
    }
    match (&entry.schema, &query.schema) {
        (Some(a), Some(b)) => a == b,
        _ => true,
    }
}

impl RelationshipProvider for SchemaProvider<'_> {
    fn referenced_tables(&self, table: &TableRef) -> Result<Vec<ForeignKey>, ProviderError> {
        match self.find(table) {
            Some(t) => Ok(t.foreign_keys.clone()),
            None => Err(ProviderError::UnknownTable(table.clone())),
        }
    }

    fn referencing_tables(
        &self,
        table: &TableRef,
    ) -> Result<Vec<(TableRef, ForeignKey)>, ProviderError> {
        if self.find(table).is_none() {
            return Err(ProviderError::UnknownTable(table.clone()));
        }

        let mut referencing = Vec::new();
        for t in &self.model.tables {
            for fk in &t.foreign_keys {
                if refs_match(&fk.ref_table, table) {
                    referencing.push((t.name.clone(), fk.clone()));
                }
            }
        }
        Ok(referencing)
    }
}

/// Memoizes provider responses for the duration of one graph build.
///
/// Owned by a single build and dropped with it; there is no cross-invocation
/// state.
pub struct RelationCache<'a> {
    provider: &'a dyn RelationshipProvider,
    referenced: IndexMap<TableRef, Result<Vec<ForeignKey>, ProviderError>>,
}

impl<'a> RelationCache<'a> {
    pub fn new(provider: &'a dyn RelationshipProvider) -> Self {
        Self {
            provider,
            referenced: IndexMap::new(),
        }
    }

    pub fn referenced_tables(&mut self, table: &TableRef) -> Result<Vec<ForeignKey>, ProviderError> {
        if let Some(cached) = self.referenced.get(table) {
            return cached.clone();
        }
        let result = self.provider.referenced_tables(table);
        self.referenced.insert(table.clone(), result.clone());
        result
    }
}
