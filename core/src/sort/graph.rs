/// Dependency graph construction from foreign key relationships.
use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

use crate::diagnostics::warning::{self, Severity, Warning};
use crate::ir::TableRef;
use crate::provider::{RelationCache, RelationshipProvider};

/// A coalesced directed edge: `child` carries one or more foreign keys
/// referencing `parent`. Indices point into the graph's node list.
#[derive(Debug, Clone)]
pub struct DependencyEdge {
    pub child: usize,
    pub parent: usize,
    /// Names of the constraints that contributed to this edge.
    pub constraints: Vec<String>,
}

/// A foreign key whose target is not part of the sorted batch.
///
/// Recorded for reporting only; such references impose no ordering
/// constraint since the target is not being inserted or deleted here.
#[derive(Debug, Clone, Serialize)]
pub struct ExternalReference {
    pub child: TableRef,
    pub target: TableRef,
    pub constraints: Vec<String>,
}

/// Directed dependency graph over one batch of tables.
///
/// Vertices are the input tables in input order; an edge child→parent means
/// the child references the parent. Built fresh per sort invocation and
/// discarded with it.
#[derive(Debug)]
pub struct DependencyGraph {
    nodes: Vec<TableRef>,
    edges: Vec<DependencyEdge>,
    /// For each node, indices into `edges` of its outgoing edges, in
    /// constraint declaration order.
    outgoing: Vec<Vec<usize>>,
    /// For each node, the nodes that depend on it.
    dependents: Vec<Vec<usize>>,
    self_referencing: Vec<usize>,
    external: Vec<ExternalReference>,
}

impl DependencyGraph {
    /// Build the graph for `tables`, querying `provider` once per table.
    ///
    /// Provider failures are downgraded to warnings and leave the affected
    /// table with no known dependencies.
    pub fn build(
        tables: &[TableRef],
        provider: &dyn RelationshipProvider,
        warnings: &mut Vec<Warning>,
    ) -> Self {
        let mut nodes: Vec<TableRef> = Vec::with_capacity(tables.len());
        let mut index: IndexMap<TableRef, usize> = IndexMap::with_capacity(tables.len());

        for table in tables {
            if index.contains_key(table) {
                warnings.push(
                    Warning::new(
                        warning::DUPLICATE_TABLE,
                        Severity::Info,
                        "table listed more than once; later occurrences ignored",
                    )
                    .with_object(table.to_string()),
                );
                continue;
            }
            index.insert(table.clone(), nodes.len());
            nodes.push(table.clone());
        }

        let mut graph = Self {
            outgoing: vec![Vec::new(); nodes.len()],
            dependents: vec![Vec::new(); nodes.len()],
            edges: Vec::new(),
            self_referencing: Vec::new(),
            external: Vec::new(),
            nodes,
        };

        let mut cache = RelationCache::new(provider);
        let mut edge_index: IndexMap<(usize, usize), usize> = IndexMap::new();

        for child in 0..graph.nodes.len() {
            let table = graph.nodes[child].clone();
            let fks = match cache.referenced_tables(&table) {
                Ok(fks) => fks,
                Err(e) => {
                    warnings.push(
                        Warning::new(
                            warning::RELATIONSHIP_RETRIEVAL_FAILED,
                            Severity::Warning,
                            format!("could not retrieve relationships: {e}; assuming no dependencies"),
                        )
                        .with_object(table.to_string()),
                    );
                    continue;
                }
            };

            for fk in &fks {
                let constraint = fk.describe();
                match graph.resolve(&index, &fk.ref_table) {
                    Some(parent) if parent == child => {
                        if !graph.self_referencing.contains(&child) {
                            graph.self_referencing.push(child);
                        }
                        warnings.push(
                            Warning::new(
                                warning::SELF_REFERENCE,
                                Severity::Info,
                                format!(
                                    "constraint {constraint} references its own table; excluded from ordering"
                                ),
                            )
                            .with_object(table.to_string()),
                        );
                    }
                    Some(parent) => {
                        let edge = *edge_index.entry((child, parent)).or_insert_with(|| {
                            let idx = graph.edges.len();
                            graph.edges.push(DependencyEdge {
                                child,
                                parent,
                                constraints: Vec::new(),
                            });
                            graph.outgoing[child].push(idx);
                            graph.dependents[parent].push(child);
                            idx
                        });
                        graph.edges[edge].constraints.push(constraint);
                    }
                    None => {
                        warnings.push(
                            Warning::new(
                                warning::FK_TARGET_EXTERNAL,
                                Severity::Info,
                                format!(
                                    "constraint {constraint} references '{}' outside the sorted set; treated as satisfied",
                                    fk.ref_table
                                ),
                            )
                            .with_object(table.to_string()),
                        );
                        graph.external.push(ExternalReference {
                            child: table.clone(),
                            target: fk.ref_table.clone(),
                            constraints: vec![constraint.clone()],
                        });
                    }
                }
            }
        }

        debug!(
            tables = graph.nodes.len(),
            edges = graph.edges.len(),
            self_referencing = graph.self_referencing.len(),
            external = graph.external.len(),
            "dependency graph built"
        );

        graph
    }

    /// Resolve a foreign key target against the batch. Exact qualified match
    /// first; an unqualified target matches the earliest compatible node.
    fn resolve(&self, index: &IndexMap<TableRef, usize>, target: &TableRef) -> Option<usize> {
        if let Some(&idx) = index.get(target) {
            return Some(idx);
        }
        self.nodes.iter().position(|node| {
            node.name == target.name
                && match (&node.schema, &target.schema) {
                    (Some(a), Some(b)) => a == b,
                    _ => true,
                }
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, idx: usize) -> &TableRef {
        &self.nodes[idx]
    }

    /// Outgoing edges of `child` (the tables it depends on), declaration order.
    pub fn parents_of(&self, child: usize) -> impl Iterator<Item = &DependencyEdge> {
        self.outgoing[child].iter().map(|&e| &self.edges[e])
    }

    /// Nodes that depend on `parent`.
    pub fn dependents_of(&self, parent: usize) -> &[usize] {
        &self.dependents[parent]
    }

    pub fn self_referencing(&self) -> &[usize] {
        &self.self_referencing
    }

    pub fn external(&self) -> &[ExternalReference] {
        &self.external
    }
}
