use rand::Rng;

use crate::cluster_graph::{ClusterGraph, NeighborClusters};
use crate::config::Config;
use crate::graph::VertexIndex;
use crate::moves::{MoveKind, Selector, Target};
use crate::partition::ClusterIndex;
use crate::state::State;

const SAMPLES: usize = 3;

/// A node move that does not pay off on its own, followed by a second move
/// that depends on it: a neighbor follows the vertex into its new cluster, or
/// a member of the new cluster is ejected to where it fits best.
#[derive(Debug)]
pub struct ChainMoves {
    first: NeighborClusters,
    second: NeighborClusters,
}

impl ChainMoves {
    pub fn new(cluster_bound: usize) -> Self {
        Self { first: NeighborClusters::new(cluster_bound), second: NeighborClusters::new(cluster_bound) }
    }

    pub fn generate<R: Rng>(&mut self, state: &State<'_>, _config: &Config, rng: &mut R, selector: &mut Selector) {
        let cg = state.cluster_graph();
        let graph = cg.graph();
        for u in graph.vertices() {
            let a = cg.cluster_of(u);
            self.first.collect(cg, u);
            let e_from = self.first.get(a);
            let mut best: Option<(i64, ClusterIndex)> = None;
            for (c, e_to) in self.first.iter() {
                if c == a {
                    continue;
                }
                let delta = cg.move_delta_with(u, e_from, Some(c), e_to);
                if best.map_or(true, |(d, _)| delta < d) {
                    best = Some((delta, c));
                }
            }
            let Some((delta, b)) = best else { continue };
            if delta < 0 {
                continue;
            }

            let followers: Vec<VertexIndex> = graph.neighbors(u).iter().copied().filter(|&y| cg.cluster_of(y) == a).collect();
            for y in sample(&followers, rng) {
                offer(cg, vec![(u, Target::Cluster(b)), (y, Target::Cluster(b))], rng, selector);
            }

            for z in sample(cg.partition().members(b), rng) {
                let target = self.best_target_except(cg, z, b);
                offer(cg, vec![(u, Target::Cluster(b)), (z, target)], rng, selector);
            }
        }
    }

    /// Best place for `z` other than its own cluster `b`, a fresh cluster if nothing is better.
    fn best_target_except(&mut self, cg: &ClusterGraph<'_>, z: VertexIndex, b: ClusterIndex) -> Target {
        self.second.collect(cg, z);
        let e_from = self.second.get(b);
        let mut best = (cg.move_delta_with(z, e_from, None, 0), Target::Fresh(0));
        for (c, e_to) in self.second.iter() {
            if c == b {
                continue;
            }
            let delta = cg.move_delta_with(z, e_from, Some(c), e_to);
            if delta < best.0 {
                best = (delta, Target::Cluster(c));
            }
        }
        best.1
    }
}

/// All of `items` if there are few, otherwise `SAMPLES` random picks.
fn sample<R: Rng>(items: &[VertexIndex], rng: &mut R) -> Vec<VertexIndex> {
    if items.len() <= SAMPLES {
        return items.to_vec();
    }
    (0..SAMPLES).map(|_| items[rng.gen_range(0..items.len())]).collect()
}

fn offer<R: Rng>(cg: &ClusterGraph<'_>, relocations: Vec<(VertexIndex, Target)>, rng: &mut R, selector: &mut Selector) {
    let delta = cg.relocation_delta(&relocations);
    selector.offer(MoveKind::Chain2, delta, rng, || relocations);
}
