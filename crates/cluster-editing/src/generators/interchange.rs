use std::collections::BTreeMap;

use rand::Rng;

use crate::cluster_graph::NeighborClusters;
use crate::config::Config;
use crate::graph::VertexIndex;
use crate::moves::{MoveKind, Selector, Target};
use crate::partition::ClusterIndex;
use crate::state::State;

/// Swaps two vertices between adjacent clusters.
///
/// For every ordered pair of clusters `(A, X)` the vertex of `A` that would
/// profit most from moving to `X` is kept. The leavers `A -> X` and `X -> A`
/// are then exchanged.
#[derive(Debug)]
pub struct InterchangeMoves {
    scratch: NeighborClusters,
    leavers: BTreeMap<(ClusterIndex, ClusterIndex), (i64, VertexIndex)>,
}

impl InterchangeMoves {
    pub fn new(cluster_bound: usize) -> Self {
        Self { scratch: NeighborClusters::new(cluster_bound), leavers: BTreeMap::new() }
    }

    pub fn generate<R: Rng>(&mut self, state: &State<'_>, _config: &Config, rng: &mut R, selector: &mut Selector) {
        let cg = state.cluster_graph();
        let graph = cg.graph();
        self.leavers.clear();
        for v in graph.vertices() {
            let from = cg.cluster_of(v);
            self.scratch.collect(cg, v);
            let e_from = self.scratch.get(from);
            for (x, e_to) in self.scratch.iter() {
                if x == from {
                    continue;
                }
                let delta = cg.move_delta_with(v, e_from, Some(x), e_to);
                let entry = self.leavers.entry((from, x)).or_insert((delta, v));
                if delta < entry.0 {
                    *entry = (delta, v);
                }
            }
        }

        for (&(a, x), &(d_u, u)) in self.leavers.iter() {
            if a > x {
                continue;
            }
            let Some(&(d_v, v)) = self.leavers.get(&(x, a)) else { continue };
            let p = graph.pair_weight(u, v);
            let adjacent = if graph.has_edge(u, v) { 4 * p } else { 0 };
            let delta = d_u + d_v - 2 * p + adjacent;
            selector.offer(MoveKind::Interchange, delta, rng, || vec![(u, Target::Cluster(x)), (v, Target::Cluster(a))]);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cluster_graph::ClusterGraph;
    use crate::config::TieBreak;
    use crate::graph::Graph;
    use crate::partition::Partition;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn swaps_misplaced_pair() {
        // cliques {0, 1, 2} and {3, 4, 5} with 2 and 5 exchanged
        let graph = Graph::from_edges(6, [(0, 1), (0, 2), (1, 2), (3, 4), (3, 5), (4, 5)]);
        let state = State::new(ClusterGraph::new(&graph, Partition::from_assignment(&[0, 0, 1, 1, 1, 0]), false));
        assert_eq!(state.cost(), 8);
        let mut selector = Selector::recording(TieBreak::First);
        InterchangeMoves::new(8).generate(&state, &Config::default(), &mut StdRng::seed_from_u64(0), &mut selector);
        for candidate in selector.recorded() {
            assert_eq!(candidate.delta, state.cluster_graph().relocation_delta(&candidate.relocations));
        }
        let best = selector.take().unwrap();
        assert_eq!(best.delta, -8);
    }
}
