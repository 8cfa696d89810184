use rand::Rng;

use crate::config::Config;
use crate::moves::{MoveKind, Selector, Target};
use crate::state::State;

/// Merges two adjacent clusters.
#[derive(Debug, Default)]
pub struct JoinMoves;

impl JoinMoves {
    pub fn generate<R: Rng>(&mut self, state: &State<'_>, _config: &Config, rng: &mut R, selector: &mut Selector) {
        let cg = state.cluster_graph();
        for a in cg.partition().clusters() {
            for (b, crossing) in cg.adjacent_clusters(a) {
                if b < a {
                    continue;
                }
                let delta = cg.cluster_weight(a) * cg.cluster_weight(b) - 2 * crossing;
                let (keep, drop) = if cg.cluster_weight(a) >= cg.cluster_weight(b) { (a, b) } else { (b, a) };
                selector.offer(MoveKind::Join, delta, rng, || {
                    cg.partition().members(drop).iter().map(|&v| (v, Target::Cluster(keep))).collect()
                });
            }
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
    use common::instances;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn joins_split_clique() {
        let graph = Graph::from_petgraph(&instances::complete_graph(5));
        for map in [false, true] {
            let state = State::new(ClusterGraph::new(&graph, Partition::from_assignment(&[0, 0, 1, 1, 1]), map));
            let mut selector = Selector::recording(TieBreak::First);
            JoinMoves.generate(&state, &Config::default(), &mut StdRng::seed_from_u64(0), &mut selector);
            assert_eq!(selector.recorded().len(), 1);
            let best = selector.take().unwrap();
            assert_eq!(best.delta, -6);
            assert_eq!(best.delta, state.cluster_graph().relocation_delta(&best.relocations));
            assert_eq!(best.relocations.len(), 2);
        }
    }
}
