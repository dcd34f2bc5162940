/// PostgreSQL DDL parser using sqlparser-rs.
///
/// Extracts the relationship-bearing slice of a DDL script: table names and
/// foreign key constraints. Everything else (types, defaults, indexes) is
/// irrelevant to ordering and skipped.
use sqlparser::ast::{
    self, AlterTableOperation, ColumnDef, ColumnOption, ConstraintCharacteristics, ObjectName,
    ReferentialAction, Statement, TableConstraint as SqlConstraint,
};
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;

use crate::diagnostics::warning::{self, Severity, Warning};
use crate::ir::{AlterConstraint, FkAction, ForeignKey, Ident, SchemaModel, Table, TableRef};

/// Parse PostgreSQL DDL text into a SchemaModel.
pub fn parse(input: &str) -> (SchemaModel, Vec<Warning>) {
    let dialect = PostgreSqlDialect {};
    let mut model = SchemaModel::default();
    let mut warnings = Vec::new();

    let statements = match Parser::parse_sql(&dialect, input) {
        Ok(stmts) => stmts,
        Err(e) => {
            warnings.push(Warning::new(
                warning::PARSE_SKIPPED,
                Severity::Error,
                format!("Failed to parse DDL: {e}"),
            ));
            return (model, warnings);
        }
    };

    for stmt in statements {
        match stmt {
            Statement::CreateTable(ct) => {
                model.tables.push(parse_create_table(&ct));
            }
            Statement::AlterTable {
                name, operations, ..
            } => {
                let table = convert_object_name(&name);
                for op in operations {
                    if let Some(constraint) = parse_alter_table_op(&table, &op) {
                        model.alter_constraints.push(constraint);
                    }
                }
            }
            // Skip statements without relationship content silently
            _ => {}
        }
    }

    (model, warnings)
}

fn parse_create_table(ct: &ast::CreateTable) -> Table {
    let name = convert_object_name(&ct.name);
    let mut foreign_keys = Vec::new();

    for col_def in &ct.columns {
        foreign_keys.extend(parse_column_references(col_def));
    }

    for constraint in &ct.constraints {
        if let Some(fk) = parse_foreign_key(constraint) {
            foreign_keys.push(fk);
        }
    }

    Table { name, foreign_keys }
}

/// Column-level REFERENCES clauses, e.g. `user_id INTEGER REFERENCES users(id)`.
fn parse_column_references(col_def: &ColumnDef) -> Vec<ForeignKey> {
    let mut fks = Vec::new();

    for opt in &col_def.options {
        if let ColumnOption::ForeignKey {
            foreign_table,
            referred_columns,
            on_delete,
            on_update,
            characteristics,
        } = &opt.option
        {
            fks.push(ForeignKey {
                name: opt.name.as_ref().map(convert_ident),
                columns: vec![convert_ident(&col_def.name)],
                ref_table: convert_object_name(foreign_table),
                ref_columns: referred_columns.iter().map(convert_ident).collect(),
                on_delete: on_delete.as_ref().and_then(convert_referential_action),
                on_update: on_update.as_ref().and_then(convert_referential_action),
                deferrable: is_deferrable(characteristics),
            });
        }
    }

    fks
}

/// Table-level FOREIGN KEY constraints.
fn parse_foreign_key(constraint: &SqlConstraint) -> Option<ForeignKey> {
    match constraint {
        SqlConstraint::ForeignKey {
            name,
            columns,
            foreign_table,
            referred_columns,
            on_delete,
            on_update,
            characteristics,
            ..
        } => Some(ForeignKey {
            name: name.as_ref().map(convert_ident),
            columns: columns.iter().map(convert_ident).collect(),
            ref_table: convert_object_name(foreign_table),
            ref_columns: referred_columns.iter().map(convert_ident).collect(),
            on_delete: on_delete.as_ref().and_then(convert_referential_action),
            on_update: on_update.as_ref().and_then(convert_referential_action),
            deferrable: is_deferrable(characteristics),
        }),
        _ => None,
    }
}

fn parse_alter_table_op(table: &TableRef, op: &AlterTableOperation) -> Option<AlterConstraint> {
    match op {
        AlterTableOperation::AddConstraint(constraint) => {
            parse_foreign_key(constraint).map(|fk| AlterConstraint {
                table: table.clone(),
                constraint: fk,
            })
        }
        _ => None,
    }
}

fn is_deferrable(characteristics: &Option<ConstraintCharacteristics>) -> bool {
    characteristics
        .as_ref()
        .and_then(|c| c.deferrable)
        .unwrap_or(false)
}

/// Convert a sqlparser identifier, preserving case for quoted names.
fn convert_ident(ident: &ast::Ident) -> Ident {
    if ident.quote_style.is_some() {
        Ident::quoted(&ident.value)
    } else {
        Ident::new(&ident.value)
    }
}

/// Convert sqlparser ObjectName to our TableRef.
fn convert_object_name(name: &ObjectName) -> TableRef {
    let parts = &name.0;
    match parts.len() {
        1 => TableRef::new(convert_ident(&parts[0])),
        2 => TableRef::with_schema(convert_ident(&parts[0]), convert_ident(&parts[1])),
        _ => {
            // Take the last three parts as catalog.schema.table
            let len = parts.len();
            TableRef::with_catalog(
                convert_ident(&parts[len - 3]),
                convert_ident(&parts[len - 2]),
                convert_ident(&parts[len - 1]),
            )
        }
    }
}

fn convert_referential_action(action: &ReferentialAction) -> Option<FkAction> {
    match action {
        ReferentialAction::Cascade => Some(FkAction::Cascade),
        ReferentialAction::SetNull => Some(FkAction::SetNull),
        ReferentialAction::SetDefault => Some(FkAction::SetDefault),
        ReferentialAction::Restrict => Some(FkAction::Restrict),
        ReferentialAction::NoAction => Some(FkAction::NoAction),
    }
}
