use rand::Rng;

use crate::cluster_graph::NeighborClusters;
use crate::config::Config;
use crate::moves::{MoveKind, Selector, Target};
use crate::partition::ClusterIndex;
use crate::state::State;

const SAMPLES_PER_VERTEX: usize = 3;

/// Moves a vertex and two of its neighbors together.
#[derive(Debug)]
pub struct TriangleMoves {
    scratch: NeighborClusters,
}

impl TriangleMoves {
    pub fn new(cluster_bound: usize) -> Self {
        Self { scratch: NeighborClusters::new(cluster_bound) }
    }

    pub fn generate<R: Rng>(&mut self, state: &State<'_>, _config: &Config, rng: &mut R, selector: &mut Selector) {
        let cg = state.cluster_graph();
        let graph = cg.graph();
        for center in graph.vertices() {
            let neighbors = graph.neighbors(center);
            if neighbors.len() < 2 {
                continue;
            }
            for _ in 0..SAMPLES_PER_VERTEX {
                let i = rng.gen_range(0..neighbors.len());
                let j = (i + rng.gen_range(1..neighbors.len())) % neighbors.len();
                let group = [center, neighbors[i], neighbors[j]];

                self.scratch.clear();
                for &x in &group {
                    let w = graph.weight(x);
                    for &y in graph.neighbors(x) {
                        if !group.contains(&y) {
                            self.scratch.add(cg.cluster_of(y), w * graph.weight(y));
                        }
                    }
                }
                let mut targets: Vec<ClusterIndex> = group.iter().map(|&x| cg.cluster_of(x)).collect();
                let best_overlap = self.scratch.iter().fold(None, |best: Option<(i64, ClusterIndex)>, (c, x)| match best {
                    Some((y, _)) if y >= x => best,
                    _ => Some((x, c)),
                });
                if let Some((_, c)) = best_overlap {
                    targets.push(c);
                }
                targets.sort_unstable();
                targets.dedup();

                let relocations = |target: Target| group.iter().map(|&x| (x, target)).collect::<Vec<_>>();
                for target in targets.into_iter().map(Target::Cluster).chain([Target::Fresh(0)]) {
                    if group.iter().all(|&x| target == Target::Cluster(cg.cluster_of(x))) {
                        continue;
                    }
                    let moves = relocations(target);
                    let delta = cg.relocation_delta(&moves);
                    selector.offer(MoveKind::Triangle, delta, rng, || moves);
                }
            }
        }
    }
}
