use rand::Rng;

use crate::cluster_graph::{ClusterGraph, NeighborClusters};
use crate::config::Config;
use crate::graph::VertexIndex;
use crate::moves::{MoveKind, Selector, Target};
use crate::partition::ClusterIndex;
use crate::state::State;

/// Moves both endpoints of an edge together.
#[derive(Debug)]
pub struct EdgeMoves {
    first: NeighborClusters,
    second: NeighborClusters,
}

impl EdgeMoves {
    pub fn new(cluster_bound: usize) -> Self {
        Self { first: NeighborClusters::new(cluster_bound), second: NeighborClusters::new(cluster_bound) }
    }

    pub fn generate<R: Rng>(&mut self, state: &State<'_>, _config: &Config, rng: &mut R, selector: &mut Selector) {
        let cg = state.cluster_graph();
        for (u, v) in cg.graph().edges() {
            self.first.collect(cg, u);
            self.second.collect(cg, v);
            let (a, b) = (cg.cluster_of(u), cg.cluster_of(v));

            // Third cluster with the largest edge weight to the pair, the edge itself excluded.
            let mut best_overlap: Option<(i64, ClusterIndex)> = None;
            for (c, _) in self.first.iter().chain(self.second.iter()) {
                if c == a || c == b {
                    continue;
                }
                let overlap = self.first.get(c) + self.second.get(c);
                if best_overlap.map_or(true, |(o, _)| overlap > o) {
                    best_overlap = Some((overlap, c));
                }
            }

            let mut targets = vec![Target::Fresh(0), Target::Cluster(a)];
            if b != a {
                targets.push(Target::Cluster(b));
            }
            if let Some((_, x)) = best_overlap {
                targets.push(Target::Cluster(x));
            }

            for target in targets {
                if a == b && target == Target::Cluster(a) {
                    continue;
                }
                let delta = self.pair_delta(cg, u, v, target);
                selector.offer(MoveKind::Edge, delta, rng, || vec![(u, target), (v, target)]);
            }
        }
    }

    /// Cost change of moving the adjacent vertices `u` and `v` to `target`.
    fn pair_delta(&self, cg: &ClusterGraph<'_>, u: VertexIndex, v: VertexIndex, target: Target) -> i64 {
        let graph = cg.graph();
        let (a, b) = (cg.cluster_of(u), cg.cluster_of(v));
        let p = graph.pair_weight(u, v);
        let remaining = |c: ClusterIndex| {
            cg.cluster_weight(c) - if a == c { graph.weight(u) } else { 0 } - if b == c { graph.weight(v) } else { 0 }
        };
        // Edge weight from one endpoint into `c`, ignoring the other endpoint.
        let outside = |scratch: &NeighborClusters, other: ClusterIndex, c: ClusterIndex| {
            scratch.get(c) - if other == c { p } else { 0 }
        };
        let term = |w: i64, scratch: &NeighborClusters, own: ClusterIndex, other: ClusterIndex| {
            let (to_weight, to_edges) = match target {
                Target::Cluster(t) => (remaining(t), outside(scratch, other, t)),
                Target::Fresh(_) => (0, 0),
            };
            w * to_weight - 2 * to_edges - w * remaining(own) + 2 * outside(scratch, other, own)
        };
        let split = if a != b { p } else { 0 };
        term(graph.weight(u), &self.first, a, b) + term(graph.weight(v), &self.second, b, a) - split
    }
}
