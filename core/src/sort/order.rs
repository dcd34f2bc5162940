/// Insert/delete order production over one batch of tables.
use serde::Serialize;

use crate::diagnostics::warning::Warning;
use crate::ir::TableRef;
use crate::monitor::{CancelToken, NullProgress, ProgressListener};
use crate::provider::RelationshipProvider;

use super::graph::{DependencyGraph, ExternalReference};
use super::topo::{self, Cycle};

/// Result of one sort: the ordering plus everything observed computing it.
///
/// Ordering guarantees hold only for tables outside `cycles`; check
/// `cancelled` before acting on the order.
#[derive(Debug, Clone, Serialize)]
pub struct SortOutcome {
    /// Tables in the requested order (dependencies first for insert,
    /// dependents first for delete).
    pub order: Vec<TableRef>,
    pub cycles: Vec<Cycle>,
    /// Tables carrying a foreign key to themselves. Not cycles; listed once
    /// in `order` like any other table.
    pub self_referencing: Vec<TableRef>,
    /// Self-referencing tables the caller should clean up row-by-row before
    /// the batch delete. Populated only by [`TableSorter::sort_for_delete`]
    /// when requested.
    pub single_table_cleanup: Vec<TableRef>,
    pub external_references: Vec<ExternalReference>,
    /// True when the sort was cancelled; `order` then holds the partial
    /// order computed before the cancellation was observed.
    pub cancelled: bool,
    pub warnings: Vec<Warning>,
}

/// Produces FK-safe table orderings from a relationship provider.
///
/// Builds a fresh dependency graph per call; nothing is shared across calls
/// and the underlying database is never mutated.
pub struct TableSorter<'a> {
    provider: &'a dyn RelationshipProvider,
    cancel: CancelToken,
    progress: Option<&'a mut dyn ProgressListener>,
}

impl<'a> TableSorter<'a> {
    pub fn new(provider: &'a dyn RelationshipProvider) -> Self {
        Self {
            provider,
            cancel: CancelToken::new(),
            progress: None,
        }
    }

    /// Use an externally owned token so another thread can cancel the sort.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn with_progress(mut self, listener: &'a mut dyn ProgressListener) -> Self {
        self.progress = Some(listener);
        self
    }

    /// A clone of the token polled by this sorter.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Order `tables` so that every table follows the tables it references
    /// (safe INSERT order for acyclic inputs).
    pub fn sort_for_insert(&mut self, tables: &[TableRef]) -> SortOutcome {
        self.sort(tables)
    }

    /// Order `tables` so that every table precedes the tables it references
    /// (safe DELETE order): the exact reverse of the insert order. With
    /// `single_table_cleanup` set, self-referencing tables are additionally
    /// flagged for row-level cleanup; the ordering itself is unchanged.
    pub fn sort_for_delete(&mut self, tables: &[TableRef], single_table_cleanup: bool) -> SortOutcome {
        let mut outcome = self.sort(tables);
        outcome.order.reverse();
        if single_table_cleanup {
            outcome.single_table_cleanup = outcome.self_referencing.clone();
        }
        outcome
    }

    fn sort(&mut self, tables: &[TableRef]) -> SortOutcome {
        let mut warnings = Vec::new();
        let graph = DependencyGraph::build(tables, self.provider, &mut warnings);

        let mut null = NullProgress;
        let progress: &mut dyn ProgressListener = match self.progress.as_deref_mut() {
            Some(p) => p,
            None => &mut null,
        };

        let sorted = topo::sort(&graph, &self.cancel, progress, &mut warnings);

        SortOutcome {
            order: sorted
                .order
                .iter()
                .map(|&i| graph.node(i).clone())
                .collect(),
            cycles: sorted.cycles,
            self_referencing: graph
                .self_referencing()
                .iter()
                .map(|&i| graph.node(i).clone())
                .collect(),
            single_table_cleanup: Vec::new(),
            external_references: graph.external().to_vec(),
            cancelled: sorted.cancelled,
            warnings,
        }
    }
}
