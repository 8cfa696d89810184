use std::collections::VecDeque;

use tracing::trace;

use crate::cluster_graph::ClusterGraph;
use crate::graph::{Graph, VertexIndex};
use crate::moves::{Candidate, MoveKind, Target};
use crate::partition::{ClusterIndex, Partition};

const UNDO_CAPACITY: usize = 4096;

#[derive(Clone, Debug)]
struct MoveRecord {
    /// `None` for perturbations.
    kind: Option<MoveKind>,
    previous: Vec<(VertexIndex, ClusterIndex)>,
    delta: i64,
}

/// The search state of one local search run.
///
/// Applies candidates reversibly and remembers the best partition seen so far.
/// The best partition is only copied when the search is about to leave it
/// through a worsening move, so long improving runs never copy.
#[derive(Clone, Debug)]
pub struct State<'g> {
    cluster_graph: ClusterGraph<'g>,
    best_cost: i64,
    /// Valid whenever `at_best` is false.
    best: Option<Partition>,
    at_best: bool,
    log: VecDeque<MoveRecord>,
}

impl<'g> State<'g> {
    pub fn new(cluster_graph: ClusterGraph<'g>) -> Self {
        let best_cost = cluster_graph.cost();
        Self { cluster_graph, best_cost, best: None, at_best: true, log: VecDeque::new() }
    }

    #[inline(always)]
    pub fn cluster_graph(&self) -> &ClusterGraph<'g> {
        &self.cluster_graph
    }

    #[inline(always)]
    pub fn graph(&self) -> &'g Graph {
        self.cluster_graph.graph()
    }

    #[inline(always)]
    pub fn partition(&self) -> &Partition {
        self.cluster_graph.partition()
    }

    #[inline(always)]
    pub fn cost(&self) -> i64 {
        self.cluster_graph.cost()
    }

    pub fn best_cost(&self) -> i64 {
        self.best_cost
    }

    /// Number of moves that can currently be undone.
    pub fn undo_depth(&self) -> usize {
        self.log.len()
    }

    /// Applies `candidate` and returns the actual cost change.
    pub fn apply(&mut self, candidate: &Candidate) -> i64 {
        let delta = self.relocate(Some(candidate.kind), &candidate.relocations, candidate.delta);
        debug_assert_eq!(delta, candidate.delta, "declared delta of {} move differs", candidate.kind);
        delta
    }

    /// Applies an arbitrary relocation that did not come from a generator.
    pub(crate) fn perturb(&mut self, relocations: &[(VertexIndex, Target)]) -> i64 {
        let declared = self.cluster_graph.relocation_delta(relocations);
        self.relocate(None, relocations, declared)
    }

    fn relocate(&mut self, kind: Option<MoveKind>, relocations: &[(VertexIndex, Target)], declared: i64) -> i64 {
        self.before_change(declared);

        // Fresh labels take empty slots in order of first use.
        let mut fresh: Vec<(u8, ClusterIndex)> = vec![];
        let mut resolved = Vec::with_capacity(relocations.len());
        for &(v, target) in relocations {
            let c = match target {
                Target::Cluster(c) => c,
                Target::Fresh(label) => match fresh.iter().find(|(l, _)| *l == label) {
                    Some(&(_, c)) => c,
                    None => {
                        let slot = self.partition().empty_clusters()[fresh.len()];
                        fresh.push((label, slot));
                        slot
                    }
                },
            };
            resolved.push((v, c));
        }

        let mut previous = Vec::with_capacity(relocations.len());
        let mut delta = 0;
        for (v, target) in resolved {
            previous.push((v, self.cluster_graph.cluster_of(v)));
            delta += self.cluster_graph.move_vertex(v, target);
        }
        trace!(?kind, delta, cost = self.cost(), "applied");

        if self.log.len() == UNDO_CAPACITY {
            self.log.pop_front();
        }
        self.log.push_back(MoveRecord { kind, previous, delta });
        self.after_change();
        delta
    }

    /// Reverts the most recent move. Returns its cost change negated.
    pub fn undo(&mut self) -> Option<i64> {
        let record = self.log.pop_back()?;
        self.before_change(-record.delta);
        let delta = record.previous.iter().rev().map(|&(v, c)| self.cluster_graph.move_vertex(v, c)).sum();
        debug_assert_eq!(delta, -record.delta);
        trace!(kind = ?record.kind, delta, cost = self.cost(), "undone");
        self.after_change();
        Some(delta)
    }

    fn before_change(&mut self, declared: i64) {
        if self.at_best && declared > 0 {
            self.best = Some(self.cluster_graph.partition().clone());
            self.at_best = false;
        }
    }

    fn after_change(&mut self) {
        let cost = self.cost();
        if cost < self.best_cost || (cost == self.best_cost && !self.at_best) {
            self.best_cost = cost;
            self.at_best = true;
        }
    }

    /// Makes the best partition the current one again. Clears the undo log.
    pub fn restore_best(&mut self) {
        self.log.clear();
        if self.at_best {
            return;
        }
        if let Some(best) = self.best.take() {
            let graph = self.cluster_graph.graph();
            let with_map = self.cluster_graph.uses_crossing_map();
            self.cluster_graph = ClusterGraph::new(graph, best, with_map);
            self.at_best = true;
        }
        debug_assert_eq!(self.cost(), self.best_cost);
    }

    /// Normalized labels of the best partition.
    pub fn best_partition(&self) -> Vec<usize> {
        match (&self.best, self.at_best) {
            (Some(best), false) => best.assignment(),
            _ => self.partition().assignment(),
        }
    }
}
