/// Cycle-tolerant depth-first topological sort.
///
/// Post-order placement yields parents before children: a node is placed
/// only once everything it depends on is placed. Back edges found during the
/// walk are cycles; each is recorded and skipped so the sort always
/// terminates with a total order.
use tracing::debug;

use serde::Serialize;

use crate::diagnostics::warning::{self, Severity, Warning};
use crate::ir::TableRef;
use crate::monitor::{CancelToken, ProgressListener};

use super::graph::{DependencyEdge, DependencyGraph};

/// One detected dependency cycle.
///
/// Each table in `tables` references the next, and the last references the
/// first. The ignored edge is the back edge (last → first) that was skipped
/// to linearize the loop; the relative order of the loop's tables is
/// best-effort and does not satisfy that constraint.
#[derive(Debug, Clone, Serialize)]
pub struct Cycle {
    pub tables: Vec<TableRef>,
    pub ignored_child: TableRef,
    pub ignored_parent: TableRef,
    /// Constraint names on the ignored edge.
    pub constraints: Vec<String>,
}

impl Cycle {
    /// Loop rendered as `a -> b -> c -> a`.
    pub fn describe(&self) -> String {
        let mut parts: Vec<&str> = self
            .tables
            .iter()
            .map(|t| t.name.normalized.as_str())
            .collect();
        if let Some(first) = parts.first().copied() {
            parts.push(first);
        }
        parts.join(" -> ")
    }
}

/// Walk state per node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnStack,
    Finished,
}

pub(crate) struct SortedIndices {
    pub order: Vec<usize>,
    pub cycles: Vec<Cycle>,
    pub cancelled: bool,
}

/// Sort the graph's nodes dependencies-first.
///
/// Nodes are visited in input order and adjacency lists preserve declaration
/// order, so equal inputs produce identical output. The cancellation token
/// is polled at every node visit; a cancelled sort returns the partial order
/// computed so far.
pub(crate) fn sort(
    graph: &DependencyGraph,
    cancel: &CancelToken,
    progress: &mut dyn ProgressListener,
    warnings: &mut Vec<Warning>,
) -> SortedIndices {
    let mut walk = Walk {
        graph,
        cancel,
        progress,
        warnings,
        marks: vec![Mark::Unvisited; graph.len()],
        path: Vec::new(),
        order: Vec::with_capacity(graph.len()),
        cycles: Vec::new(),
        cancelled: false,
    };

    for node in 0..graph.len() {
        if walk.cancelled {
            break;
        }
        if walk.marks[node] == Mark::Unvisited {
            walk.visit(node);
        }
    }

    debug!(
        placed = walk.order.len(),
        total = graph.len(),
        cycles = walk.cycles.len(),
        cancelled = walk.cancelled,
        "topological sort finished"
    );

    SortedIndices {
        order: walk.order,
        cycles: walk.cycles,
        cancelled: walk.cancelled,
    }
}

struct Walk<'a> {
    graph: &'a DependencyGraph,
    cancel: &'a CancelToken,
    progress: &'a mut dyn ProgressListener,
    warnings: &'a mut Vec<Warning>,
    marks: Vec<Mark>,
    path: Vec<usize>,
    order: Vec<usize>,
    cycles: Vec<Cycle>,
    cancelled: bool,
}

impl Walk<'_> {
    fn visit(&mut self, node: usize) {
        if self.cancel.is_cancelled() {
            self.cancelled = true;
            return;
        }

        self.marks[node] = Mark::OnStack;
        self.path.push(node);

        let edges: Vec<&DependencyEdge> = self.graph.parents_of(node).collect();
        for edge in edges {
            if self.cancelled {
                break;
            }
            match self.marks[edge.parent] {
                Mark::Finished => {}
                Mark::OnStack => self.record_cycle(edge),
                Mark::Unvisited => self.visit(edge.parent),
            }
        }

        self.path.pop();
        if self.cancelled {
            return;
        }

        self.marks[node] = Mark::Finished;
        self.order.push(node);
        self.progress
            .table_processed(self.order.len(), self.graph.len(), self.graph.node(node));
    }

    /// A back edge closes a loop running from the parent (already on the
    /// stack) down to the current child. Record it and skip the edge.
    fn record_cycle(&mut self, edge: &DependencyEdge) {
        let start = self
            .path
            .iter()
            .position(|&n| n == edge.parent)
            .unwrap_or(0);
        let tables: Vec<TableRef> = self.path[start..]
            .iter()
            .map(|&n| self.graph.node(n).clone())
            .collect();

        let cycle = Cycle {
            tables,
            ignored_child: self.graph.node(edge.child).clone(),
            ignored_parent: self.graph.node(edge.parent).clone(),
            constraints: edge.constraints.clone(),
        };

        self.warnings.push(
            Warning::new(
                warning::CYCLE_DETECTED,
                Severity::Warning,
                format!(
                    "circular foreign key dependency {}; ignoring constraint(s) {} to produce a total order",
                    cycle.describe(),
                    cycle.constraints.join(", "),
                ),
            )
            .with_object(cycle.ignored_child.to_string()),
        );
        self.cycles.push(cycle);
    }
}
