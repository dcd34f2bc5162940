pub mod graph;
pub mod order;
pub mod topo;

pub use graph::{DependencyEdge, DependencyGraph, ExternalReference};
pub use order::{SortOutcome, TableSorter};
pub use topo::Cycle;
