//! fkorder-core: foreign-key aware table ordering for batch INSERT/DELETE
//! script generation.
//!
//! Given a set of tables and their foreign key relationships, produces a
//! total order placing every table after the tables it references (insert
//! order) and its reverse (delete order). Cycles are detected, reported and
//! broken deterministically instead of failing the sort.

pub mod diagnostics;
pub mod ir;
pub mod monitor;
pub mod pg;
pub mod provider;
pub mod sort;

use std::path::PathBuf;

use serde::Serialize;

use diagnostics::warning::Warning;
use diagnostics::{StrictViolation, check_strict};
use ir::TableRef;
use monitor::{CancelToken, ProgressListener};
use provider::SchemaProvider;
use sort::{Cycle, ExternalReference, TableSorter};

/// Options for the DDL ordering pipeline.
#[derive(Debug, Clone)]
pub struct OrderOptions {
    /// Schema to filter by (default: "public").
    pub schema: Option<String>,
    /// If true, include all schemas (bypass schema filtering).
    pub include_all_schemas: bool,
    /// Restrict the sorted batch to these table names (dotted, possibly
    /// quoted). None sorts every parsed table in declaration order.
    pub tables: Option<Vec<String>>,
    /// Flag self-referencing tables for row-level cleanup in the delete order.
    pub single_table_cleanup: bool,
    /// If true, fail on ordering hazards (cycles, retrieval failures).
    pub strict: bool,
    /// Path for warning output (None = stderr).
    pub emit_warnings: Option<PathBuf>,
}

impl Default for OrderOptions {
    fn default() -> Self {
        Self {
            schema: Some("public".to_string()),
            include_all_schemas: false,
            tables: None,
            single_table_cleanup: false,
            strict: false,
            emit_warnings: None,
        }
    }
}

/// Result of a successful ordering run.
#[derive(Debug, Serialize)]
pub struct OrderResult {
    /// Dependencies-first order: safe for INSERT outside reported cycles.
    pub insert_order: Vec<TableRef>,
    /// Dependents-first order: the exact reverse of `insert_order`.
    pub delete_order: Vec<TableRef>,
    pub cycles: Vec<Cycle>,
    pub self_referencing: Vec<TableRef>,
    pub single_table_cleanup: Vec<TableRef>,
    pub external_references: Vec<ExternalReference>,
    pub cancelled: bool,
    /// Warnings emitted during parsing and sorting.
    pub warnings: Vec<Warning>,
}

/// Errors that can abort the ordering pipeline.
#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Strict mode violation:\n{0}")]
    StrictViolation(#[from] StrictViolation),
}

/// Compute FK-safe insert and delete orders from PostgreSQL DDL text.
///
/// This is the primary public API for the library.
pub fn order_tables_from_ddl(
    input: &str,
    opts: &OrderOptions,
) -> Result<OrderResult, OrderError> {
    order_tables_from_ddl_with(input, opts, &CancelToken::new(), None)
}

/// Like [`order_tables_from_ddl`], with caller-supplied cancellation and
/// progress collaborators.
pub fn order_tables_from_ddl_with(
    input: &str,
    opts: &OrderOptions,
    cancel: &CancelToken,
    progress: Option<&mut dyn ProgressListener>,
) -> Result<OrderResult, OrderError> {
    let mut warnings = Vec::new();

    // 1. Parse DDL → schema model
    let (mut model, parse_warnings) = pg::parser::parse(input);
    warnings.extend(parse_warnings);

    // 2. Normalize (schema filtering, ALTER merge)
    let normalize_opts = pg::normalize::NormalizeOptions {
        schema: opts.schema.clone(),
        include_all_schemas: opts.include_all_schemas,
    };
    pg::normalize::normalize(&mut model, &normalize_opts, &mut warnings);

    // 3. Select the batch
    let batch: Vec<TableRef> = match &opts.tables {
        Some(names) => names.iter().map(|n| TableRef::parse(n)).collect(),
        None => model.table_refs(),
    };

    // 4. Sort once; the delete order is the reverse of the insert order
    let provider = SchemaProvider::new(&model);
    let mut sorter = TableSorter::new(&provider).with_cancel_token(cancel.clone());
    if let Some(listener) = progress {
        sorter = sorter.with_progress(listener);
    }
    let outcome = sorter.sort_for_insert(&batch);
    warnings.extend(outcome.warnings);

    let mut delete_order = outcome.order.clone();
    delete_order.reverse();

    let single_table_cleanup = if opts.single_table_cleanup {
        outcome.self_referencing.clone()
    } else {
        Vec::new()
    };

    // 5. Check strict mode
    if opts.strict {
        check_strict(&warnings)?;
    }

    Ok(OrderResult {
        insert_order: outcome.order,
        delete_order,
        cycles: outcome.cycles,
        self_referencing: outcome.self_referencing,
        single_table_cleanup,
        external_references: outcome.external_references,
        cancelled: outcome.cancelled,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(order: &[TableRef]) -> Vec<&str> {
        order.iter().map(|t| t.name.normalized.as_str()).collect()
    }

    #[test]
    fn test_basic_ordering() {
        let input = r#"
            CREATE TABLE orders (id INTEGER PRIMARY KEY, user_id INTEGER REFERENCES users(id));
            CREATE TABLE users (id INTEGER PRIMARY KEY);
        "#;
        let result = order_tables_from_ddl(input, &OrderOptions::default()).unwrap();
        assert_eq!(names(&result.insert_order), vec!["users", "orders"]);
        assert_eq!(names(&result.delete_order), vec!["orders", "users"]);
        assert!(result.cycles.is_empty());
        assert!(!result.cancelled);
    }

    #[test]
    fn test_schema_filtering() {
        let input = r#"
            CREATE TABLE public.users (id INTEGER);
            CREATE TABLE other.accounts (id INTEGER);
        "#;
        let result = order_tables_from_ddl(input, &OrderOptions::default()).unwrap();
        assert_eq!(names(&result.insert_order), vec!["users"]);
    }

    #[test]
    fn test_include_all_schemas() {
        let input = r#"
            CREATE TABLE public.users (id INTEGER);
            CREATE TABLE other.accounts (id INTEGER);
        "#;
        let opts = OrderOptions {
            include_all_schemas: true,
            ..Default::default()
        };
        let result = order_tables_from_ddl(input, &opts).unwrap();
        assert_eq!(result.insert_order.len(), 2);
    }

    #[test]
    fn test_alter_constraint_affects_order() {
        let input = r#"
            CREATE TABLE orders (id INTEGER PRIMARY KEY, user_id INTEGER);
            CREATE TABLE users (id INTEGER PRIMARY KEY);
            ALTER TABLE orders ADD CONSTRAINT fk_user FOREIGN KEY (user_id) REFERENCES users (id);
        "#;
        let result = order_tables_from_ddl(input, &OrderOptions::default()).unwrap();
        assert_eq!(names(&result.insert_order), vec!["users", "orders"]);
    }

    #[test]
    fn test_table_subset() {
        let input = r#"
            CREATE TABLE users (id INTEGER PRIMARY KEY);
            CREATE TABLE orders (id INTEGER PRIMARY KEY, user_id INTEGER REFERENCES users(id));
            CREATE TABLE audit_log (id INTEGER PRIMARY KEY);
        "#;
        let opts = OrderOptions {
            tables: Some(vec!["orders".to_string(), "users".to_string()]),
            ..Default::default()
        };
        let result = order_tables_from_ddl(input, &opts).unwrap();
        assert_eq!(names(&result.insert_order), vec!["users", "orders"]);
    }

    #[test]
    fn test_strict_mode_fails_on_cycle() {
        let input = r#"
            CREATE TABLE a (id INTEGER PRIMARY KEY, b_id INTEGER REFERENCES b(id));
            CREATE TABLE b (id INTEGER PRIMARY KEY, a_id INTEGER REFERENCES a(id));
        "#;
        let opts = OrderOptions {
            strict: true,
            ..Default::default()
        };
        let result = order_tables_from_ddl(input, &opts);
        assert!(matches!(result, Err(OrderError::StrictViolation(_))));
    }

    #[test]
    fn test_cycle_reported_not_fatal() {
        let input = r#"
            CREATE TABLE a (id INTEGER PRIMARY KEY, b_id INTEGER REFERENCES b(id));
            CREATE TABLE b (id INTEGER PRIMARY KEY, a_id INTEGER REFERENCES a(id));
        "#;
        let result = order_tables_from_ddl(input, &OrderOptions::default()).unwrap();
        assert_eq!(result.insert_order.len(), 2);
        assert_eq!(result.cycles.len(), 1);
    }

    #[test]
    fn test_delete_is_reverse_of_insert() {
        let input = r#"
            CREATE TABLE categories (id INTEGER PRIMARY KEY);
            CREATE TABLE products (id INTEGER PRIMARY KEY, category_id INTEGER REFERENCES categories(id));
            CREATE TABLE reviews (id INTEGER PRIMARY KEY, product_id INTEGER REFERENCES products(id));
        "#;
        let result = order_tables_from_ddl(input, &OrderOptions::default()).unwrap();
        let mut reversed = result.insert_order.clone();
        reversed.reverse();
        assert_eq!(names(&result.delete_order), names(&reversed));
    }
}
