use rand::Rng;

use crate::cluster_graph::NeighborClusters;
use crate::config::Config;
use crate::moves::{MoveKind, Selector, Target};
use crate::state::State;

/// Moves a single vertex to an adjacent cluster or into a new singleton.
#[derive(Debug)]
pub struct NodeMoves {
    scratch: NeighborClusters,
}

impl NodeMoves {
    pub fn new(cluster_bound: usize) -> Self {
        Self { scratch: NeighborClusters::new(cluster_bound) }
    }

    pub fn generate<R: Rng>(&mut self, state: &State<'_>, config: &Config, rng: &mut R, selector: &mut Selector) {
        let cg = state.cluster_graph();
        for v in cg.graph().vertices() {
            let from = cg.cluster_of(v);
            self.scratch.collect(cg, v);
            let e_from = self.scratch.get(from);

            // (delta, size of target, target)
            let mut best: Option<(i64, usize, Target)> = None;
            let mut consider = |delta: i64, size: usize, target: Target| {
                let better = match best {
                    None => true,
                    Some((d, s, _)) => delta < d || (delta == d && config.prefer_smaller_clusters && size < s),
                };
                if better {
                    best = Some((delta, size, target));
                }
            };

            if cg.partition().size(from) > 1 {
                consider(cg.move_delta_with(v, e_from, None, 0), 0, Target::Fresh(0));
            }
            for (c, e_to) in self.scratch.iter() {
                if c != from {
                    consider(cg.move_delta_with(v, e_from, Some(c), e_to), cg.partition().size(c), Target::Cluster(c));
                }
            }

            if let Some((delta, _, target)) = best {
                selector.offer(MoveKind::Node, delta, rng, || vec![(v, target)]);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cluster_graph::ClusterGraph;
    use crate::config::TieBreak;
    use crate::graph::{Graph, VertexIndex};
    use crate::partition::Partition;
    use common::instances;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn offers_one_candidate_per_movable_vertex() {
        let graph = Graph::from_petgraph(&instances::star_graph(3));
        let state = State::new(ClusterGraph::singletons(&graph, false));
        let mut selector = Selector::recording(TieBreak::First);
        let mut rng = StdRng::seed_from_u64(0);
        NodeMoves::new(6).generate(&state, &Config::default(), &mut rng, &mut selector);
        assert_eq!(selector.recorded().len(), 4);
        for candidate in selector.recorded() {
            assert_eq!(candidate.delta, -1);
            assert_eq!(candidate.delta, state.cluster_graph().relocation_delta(&candidate.relocations));
        }
    }

    #[test]
    fn prefers_smaller_cluster_on_ties() {
        // joining the triangle {1, 2, 4} or the singleton {3} both save one edit for vertex 0
        let graph = Graph::from_edges(5, [(0, 1), (0, 2), (1, 2), (1, 4), (2, 4), (0, 3)]);
        let state = State::new(ClusterGraph::new(&graph, Partition::from_assignment(&[0, 1, 1, 2, 1]), false));
        let mut selector = Selector::recording(TieBreak::First);
        let mut rng = StdRng::seed_from_u64(0);
        NodeMoves::new(7).generate(&state, &Config::default(), &mut rng, &mut selector);
        let moves_of_0: Vec<_> = selector.recorded().iter().filter(|c| c.relocations[0].0 == VertexIndex::new(0)).collect();
        assert_eq!(moves_of_0.len(), 1);
        let target = Target::Cluster(state.cluster_graph().cluster_of(VertexIndex::new(3)));
        assert_eq!(moves_of_0[0].relocations, [(VertexIndex::new(0), target)]);
        assert_eq!(moves_of_0[0].delta, -1);
    }
}
