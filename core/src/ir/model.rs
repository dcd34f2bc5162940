/// Schema model types for the relationship-bearing slice of parsed DDL.
use super::ident::{Ident, TableRef};

/// The top-level schema model containing all parsed relationship objects.
#[derive(Debug, Clone, Default)]
pub struct SchemaModel {
    pub tables: Vec<Table>,
    pub alter_constraints: Vec<AlterConstraint>,
}

impl SchemaModel {
    /// Table identities in declaration order.
    pub fn table_refs(&self) -> Vec<TableRef> {
        self.tables.iter().map(|t| t.name.clone()).collect()
    }
}

/// A parsed CREATE TABLE statement, reduced to its FK relationships.
#[derive(Debug, Clone)]
pub struct Table {
    pub name: TableRef,
    pub foreign_keys: Vec<ForeignKey>,
}

/// A foreign key constraint: this table references `ref_table`.
#[derive(Debug, Clone)]
pub struct ForeignKey {
    pub name: Option<Ident>,
    pub columns: Vec<Ident>,
    pub ref_table: TableRef,
    pub ref_columns: Vec<Ident>,
    pub on_delete: Option<FkAction>,
    pub on_update: Option<FkAction>,
    pub deferrable: bool,
}

impl ForeignKey {
    /// Constraint name for diagnostics; anonymous constraints are described
    /// by their column list.
    pub fn describe(&self) -> String {
        match &self.name {
            Some(name) => name.normalized.clone(),
            None => {
                let cols: Vec<&str> = self.columns.iter().map(|c| c.normalized.as_str()).collect();
                format!("<anonymous fk ({})>", cols.join(", "))
            }
        }
    }
}

/// An ALTER TABLE ... ADD CONSTRAINT ... FOREIGN KEY pending a merge into
/// its owning table.
#[derive(Debug, Clone)]
pub struct AlterConstraint {
    pub table: TableRef,
    pub constraint: ForeignKey,
}

/// Foreign key referential action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FkAction {
    Cascade,
    SetNull,
    SetDefault,
    Restrict,
    NoAction,
}

impl std::fmt::Display for FkAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FkAction::Cascade => write!(f, "CASCADE"),
            FkAction::SetNull => write!(f, "SET NULL"),
            FkAction::SetDefault => write!(f, "SET DEFAULT"),
            FkAction::Restrict => write!(f, "RESTRICT"),
            FkAction::NoAction => write!(f, "NO ACTION"),
        }
    }
}
