// Ordering guarantees exercised through the public API.

use fkorder_core::ir::{Ident, TableRef};
use fkorder_core::monitor::{CancelToken, ProgressListener};
use fkorder_core::pg::parser;
use fkorder_core::provider::{ProviderError, RelationshipProvider, SchemaProvider};
use fkorder_core::sort::TableSorter;
use fkorder_core::{OrderOptions, order_tables_from_ddl};

fn refs(names: &[&str]) -> Vec<TableRef> {
    names.iter().map(|n| TableRef::new(Ident::new(n))).collect()
}

fn names(order: &[TableRef]) -> Vec<&str> {
    order.iter().map(|t| t.name.normalized.as_str()).collect()
}

fn position(order: &[TableRef], name: &str) -> usize {
    order
        .iter()
        .position(|t| t.name.normalized == name)
        .unwrap_or_else(|| panic!("{name} missing from order {:?}", names(order)))
}

#[test]
fn parents_precede_children_in_insert_order() {
    let input = r#"
        CREATE TABLE order_items (id INTEGER PRIMARY KEY, order_id INTEGER REFERENCES orders(id));
        CREATE TABLE orders (id INTEGER PRIMARY KEY, customer_id INTEGER REFERENCES customers(id));
        CREATE TABLE customers (id INTEGER PRIMARY KEY);
        CREATE TABLE shipments (id INTEGER PRIMARY KEY, order_id INTEGER REFERENCES orders(id));
    "#;
    let result = order_tables_from_ddl(input, &OrderOptions::default()).unwrap();

    let order = &result.insert_order;
    assert!(position(order, "customers") < position(order, "orders"));
    assert!(position(order, "orders") < position(order, "order_items"));
    assert!(position(order, "orders") < position(order, "shipments"));
}

#[test]
fn orders_customers_order_items_example() {
    let input = r#"
        CREATE TABLE orders (id INTEGER PRIMARY KEY, customer_id INTEGER REFERENCES customers(id));
        CREATE TABLE customers (id INTEGER PRIMARY KEY);
        CREATE TABLE order_items (id INTEGER PRIMARY KEY, order_id INTEGER REFERENCES orders(id));
    "#;
    let result = order_tables_from_ddl(input, &OrderOptions::default()).unwrap();
    assert_eq!(
        names(&result.insert_order),
        vec!["customers", "orders", "order_items"]
    );
    assert_eq!(
        names(&result.delete_order),
        vec!["order_items", "orders", "customers"]
    );
}

#[test]
fn delete_order_is_exact_reverse() {
    let input = r#"
        CREATE TABLE a (id INTEGER PRIMARY KEY);
        CREATE TABLE b (id INTEGER PRIMARY KEY, a_id INTEGER REFERENCES a(id));
        CREATE TABLE c (id INTEGER PRIMARY KEY, b_id INTEGER REFERENCES b(id));
        CREATE TABLE d (id INTEGER PRIMARY KEY);
    "#;
    let result = order_tables_from_ddl(input, &OrderOptions::default()).unwrap();
    let mut reversed = result.insert_order.clone();
    reversed.reverse();
    assert_eq!(names(&result.delete_order), names(&reversed));
}

#[test]
fn repeated_runs_are_identical() {
    let input = r#"
        CREATE TABLE t3 (id INTEGER PRIMARY KEY, t1_id INTEGER REFERENCES t1(id));
        CREATE TABLE t1 (id INTEGER PRIMARY KEY);
        CREATE TABLE t4 (id INTEGER PRIMARY KEY);
        CREATE TABLE t2 (id INTEGER PRIMARY KEY, t1_id INTEGER REFERENCES t1(id));
    "#;
    let first = order_tables_from_ddl(input, &OrderOptions::default()).unwrap();
    let second = order_tables_from_ddl(input, &OrderOptions::default()).unwrap();
    assert_eq!(names(&first.insert_order), names(&second.insert_order));
    assert_eq!(names(&first.delete_order), names(&second.delete_order));
}

#[test]
fn three_table_cycle_terminates_with_one_report() {
    let input = r#"
        CREATE TABLE a (id INTEGER PRIMARY KEY, b_id INTEGER REFERENCES b(id));
        CREATE TABLE b (id INTEGER PRIMARY KEY, c_id INTEGER REFERENCES c(id));
        CREATE TABLE c (id INTEGER PRIMARY KEY, a_id INTEGER REFERENCES a(id));
    "#;
    let result = order_tables_from_ddl(input, &OrderOptions::default()).unwrap();

    assert_eq!(result.insert_order.len(), 3);
    assert_eq!(result.cycles.len(), 1);
    let mut cycle_names = names(&result.cycles[0].tables);
    cycle_names.sort_unstable();
    assert_eq!(cycle_names, vec!["a", "b", "c"]);
}

#[test]
fn two_table_cycle_returns_total_order() {
    let input = r#"
        CREATE TABLE a (id INTEGER PRIMARY KEY, b_id INTEGER REFERENCES b(id));
        CREATE TABLE b (id INTEGER PRIMARY KEY, a_id INTEGER REFERENCES a(id));
    "#;
    let result = order_tables_from_ddl(input, &OrderOptions::default()).unwrap();

    assert_eq!(result.insert_order.len(), 2);
    assert_eq!(result.cycles.len(), 1);
    let mut cycle_names = names(&result.cycles[0].tables);
    cycle_names.sort_unstable();
    assert_eq!(cycle_names, vec!["a", "b"]);
}

#[test]
fn self_reference_is_not_a_cycle() {
    let input = r#"
        CREATE TABLE employees (
            id INTEGER PRIMARY KEY,
            manager_id INTEGER REFERENCES employees(id)
        );
    "#;
    let result = order_tables_from_ddl(input, &OrderOptions::default()).unwrap();

    assert_eq!(names(&result.insert_order), vec!["employees"]);
    assert!(result.cycles.is_empty());
    assert_eq!(names(&result.self_referencing), vec!["employees"]);
}

#[test]
fn disconnected_tables_keep_input_order() {
    let input = r#"
        CREATE TABLE zebra (id INTEGER PRIMARY KEY);
        CREATE TABLE apple (id INTEGER PRIMARY KEY);
        CREATE TABLE mango (id INTEGER PRIMARY KEY);
    "#;
    let result = order_tables_from_ddl(input, &OrderOptions::default()).unwrap();
    assert_eq!(names(&result.insert_order), vec!["zebra", "apple", "mango"]);
}

#[test]
fn out_of_set_reference_imposes_no_constraint() {
    let input = r#"
        CREATE TABLE users (id INTEGER PRIMARY KEY);
        CREATE TABLE orders (id INTEGER PRIMARY KEY, user_id INTEGER REFERENCES users(id));
    "#;
    let opts = OrderOptions {
        tables: Some(vec!["orders".to_string()]),
        ..Default::default()
    };
    let result = order_tables_from_ddl(input, &opts).unwrap();

    assert_eq!(names(&result.insert_order), vec!["orders"]);
    assert_eq!(result.external_references.len(), 1);
    assert_eq!(
        result.external_references[0].target.name.normalized,
        "users"
    );
}

#[test]
fn failing_provider_degrades_to_warning() {
    struct FailingProvider;
    impl RelationshipProvider for FailingProvider {
        fn referenced_tables(
            &self,
            table: &TableRef,
        ) -> Result<Vec<fkorder_core::ir::ForeignKey>, ProviderError> {
            Err(ProviderError::Metadata {
                table: table.clone(),
                message: "connection reset".to_string(),
            })
        }

        fn referencing_tables(
            &self,
            table: &TableRef,
        ) -> Result<Vec<(TableRef, fkorder_core::ir::ForeignKey)>, ProviderError> {
            Err(ProviderError::Metadata {
                table: table.clone(),
                message: "connection reset".to_string(),
            })
        }
    }

    let mut sorter = TableSorter::new(&FailingProvider);
    let outcome = sorter.sort_for_insert(&refs(&["a", "b"]));

    assert_eq!(names(&outcome.order), vec!["a", "b"]);
    assert_eq!(
        outcome
            .warnings
            .iter()
            .filter(|w| w.code == "RELATIONSHIP_RETRIEVAL_FAILED")
            .count(),
        2
    );
}

#[test]
fn cancellation_mid_sort_returns_flagged_partial() {
    struct CancelAfterFirst {
        token: CancelToken,
    }
    impl ProgressListener for CancelAfterFirst {
        fn table_processed(&mut self, current: usize, _total: usize, _table: &TableRef) {
            if current == 1 {
                self.token.cancel();
            }
        }
    }

    let (model, _) = parser::parse(
        r#"
        CREATE TABLE a (id INTEGER PRIMARY KEY);
        CREATE TABLE b (id INTEGER PRIMARY KEY);
        CREATE TABLE c (id INTEGER PRIMARY KEY);
    "#,
    );
    let provider = SchemaProvider::new(&model);
    let token = CancelToken::new();
    let mut listener = CancelAfterFirst {
        token: token.clone(),
    };
    let mut sorter = TableSorter::new(&provider)
        .with_cancel_token(token)
        .with_progress(&mut listener);

    let outcome = sorter.sort_for_insert(&refs(&["a", "b", "c"]));
    assert!(outcome.cancelled);
    assert!(outcome.order.len() < 3, "partial order expected");
    assert_eq!(names(&outcome.order), vec!["a"]);
}

#[test]
fn case_insensitive_table_identity() {
    let input = r#"
        CREATE TABLE Users (id INTEGER PRIMARY KEY);
        CREATE TABLE Orders (id INTEGER PRIMARY KEY, user_id INTEGER REFERENCES USERS(id));
    "#;
    let result = order_tables_from_ddl(input, &OrderOptions::default()).unwrap();
    assert_eq!(names(&result.insert_order), vec!["users", "orders"]);
}

#[test]
fn multiple_constraints_single_dependency() {
    let input = r#"
        CREATE TABLE users (id INTEGER PRIMARY KEY);
        CREATE TABLE transfers (
            id INTEGER PRIMARY KEY,
            sender_id INTEGER,
            receiver_id INTEGER,
            CONSTRAINT fk_sender FOREIGN KEY (sender_id) REFERENCES users (id),
            CONSTRAINT fk_receiver FOREIGN KEY (receiver_id) REFERENCES users (id)
        );
    "#;
    let result = order_tables_from_ddl(input, &OrderOptions::default()).unwrap();
    assert_eq!(names(&result.insert_order), vec!["users", "transfers"]);
    assert!(result.cycles.is_empty());
}
