//! A solver for [cluster editing](https://en.wikipedia.org/wiki/Cluster_graph):
//! insert and delete as few edges as possible so that the graph becomes a
//! disjoint union of cliques.
//!
//! Equivalently, find a partition of the vertices minimizing the number of
//! edges between parts plus the number of missing edges inside parts. With
//! vertex weights, a pair `u, v` costs `w(u) * w(v)`.
//!
//! The search is a local search over partitions. Several kinds of moves
//! propose relocations of vertices together with their exact cost change, and
//! the best improving one is applied. A local optimum is left by
//! perturbation. Before the search, vertices with identical closed
//! neighborhoods are contracted. An optional branch and bound on conflict
//! triples improves the local search result.
//!
//! # Examples
//!
//! Two triangles joined by an edge need a single deletion.
//! ```rust
//! # use std::error::Error;
//! #
//! # fn main() -> Result<(), Box<dyn Error>> {
//! use petgraph::graph::UnGraph;
//! use cluster_editing::{Config, Graph, Solver};
//!
//! let graph = UnGraph::<(), ()>::from_edges([(0, 1), (0, 2), (1, 2), (2, 3), (3, 4), (3, 5), (4, 5)]);
//! let graph = Graph::from_petgraph(&graph);
//!
//! let mut solver = Solver::new(&graph, Config { max_recursion_depth: 8, ..Default::default() })?;
//! assert_eq!(solver.run_recursive(), 1);
//! assert_eq!(solver.best_partition(), [0, 0, 0, 1, 1, 1]);
//! assert_eq!(solver.modifications().len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! # Generics
//!
//! [`Graph::from_petgraph`] accepts structs that implement the `petgraph`
//! traits `NodeCompactIndexable`, `IntoNeighbors`, and `GraphProp<EdgeType =
//! Undirected>`.

#![forbid(unsafe_code)]
#![doc(test(attr(deny(warnings, rust_2018_idioms), allow(dead_code))))]
#![warn(missing_debug_implementations, rust_2018_idioms)]

mod index;

pub mod branching;
pub mod cluster_graph;
pub mod config;
pub mod context;
pub mod generators;
pub mod graph;
pub mod kernel;
pub mod moves;
pub mod neg;
pub mod partition;
pub mod solver;
pub mod state;
pub mod stats;
pub mod union_find;

pub use branching::{BranchAndBound, BranchOutcome};
pub use cluster_graph::{partition_cost, ClusterGraph};
pub use config::{Config, ConfigError, PerturbMode, TieBreak};
pub use context::{Counters, RunContext};
pub use graph::{Graph, VertexIndex};
pub use kernel::Kernel;
pub use moves::{Candidate, MoveKind, ParseMoveKindError, Selector, Target};
pub use neg::{Neg, NegOutcome, NegStatus};
pub use partition::{ClusterIndex, Partition};
pub use solver::Solver;
pub use state::State;
pub use stats::{modifications, Edit, EditKind, EditStats};
