/// Schema filtering and ALTER TABLE constraint merging for parsed DDL.
use crate::diagnostics::warning::{self, Severity, Warning};
use crate::ir::SchemaModel;

/// Options for schema normalization.
pub struct NormalizeOptions {
    /// Schema to include (default: "public").
    pub schema: Option<String>,
    /// If true, include all schemas (bypass schema filtering).
    pub include_all_schemas: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            schema: Some("public".to_string()),
            include_all_schemas: false,
        }
    }
}

/// Filter the schema model by target schema, then fold ALTER TABLE
/// constraints into their owning tables.
pub fn normalize(model: &mut SchemaModel, opts: &NormalizeOptions, warnings: &mut Vec<Warning>) {
    filter_schemas(model, opts);
    merge_alter_constraints(model, warnings);
}

fn filter_schemas(model: &mut SchemaModel, opts: &NormalizeOptions) {
    if opts.include_all_schemas {
        return;
    }

    let target_schema = opts.schema.as_deref().unwrap_or("public");

    // Unqualified names are assumed to be in the target schema
    model.tables.retain(|t| match &t.name.schema {
        Some(s) => s.normalized == target_schema,
        None => true,
    });

    model.alter_constraints.retain(|ac| match &ac.table.schema {
        Some(s) => s.normalized == target_schema,
        None => true,
    });
}

/// Merge ALTER TABLE ADD CONSTRAINT statements into the corresponding table.
fn merge_alter_constraints(model: &mut SchemaModel, warnings: &mut Vec<Warning>) {
    let alters = std::mem::take(&mut model.alter_constraints);

    for alter in alters {
        // Match by table name only; after filtering, all tables share a schema
        let target_table = model
            .tables
            .iter_mut()
            .find(|t| t.name.name == alter.table.name);

        match target_table {
            Some(table) => {
                table.foreign_keys.push(alter.constraint);
            }
            None => {
                warnings.push(
                    Warning::new(
                        warning::ALTER_TARGET_MISSING,
                        Severity::Warning,
                        format!(
                            "ALTER TABLE target '{}' not found; constraint {} skipped",
                            alter.table.name.normalized,
                            alter.constraint.describe()
                        ),
                    )
                    .with_object(&alter.table.name.normalized),
                );
            }
        }
    }
}
