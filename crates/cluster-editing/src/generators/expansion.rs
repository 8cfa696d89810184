use std::collections::BinaryHeap;

use rand::Rng;

use crate::cluster_graph::ClusterGraph;
use crate::config::Config;
use crate::graph::{Graph, VertexIndex};
use crate::moves::{MoveKind, Selector, Target};
use crate::partition::ClusterIndex;
use crate::state::State;

/// One vertex of an expansion order.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Step {
    pub(crate) vertex: VertexIndex,
    /// Edge weight to the vertices placed before.
    pub(crate) attach: i64,
    /// Edge weight to the whole region.
    pub(crate) inner: i64,
}

/// Grows an order over a vertex region from a seed pair, always taking the
/// unplaced vertex with the largest edge weight to the placed prefix. Ties
/// are broken by a random key drawn per order.
#[derive(Debug)]
pub(crate) struct ExpansionOrder {
    region: Vec<u32>,
    placed: Vec<u32>,
    generation: u32,
    key: Vec<u32>,
    attach: Vec<i64>,
    heap: BinaryHeap<(i64, u32, VertexIndex)>,
    steps: Vec<Step>,
}

impl ExpansionOrder {
    pub(crate) fn new(n: usize) -> Self {
        Self {
            region: vec![0; n],
            placed: vec![0; n],
            generation: 0,
            key: vec![0; n],
            attach: vec![0; n],
            heap: BinaryHeap::new(),
            steps: vec![],
        }
    }

    /// Computes the order of `region`, starting with `seed.0` and `seed.1`.
    pub(crate) fn compute<R: Rng>(
        &mut self,
        graph: &Graph,
        region: &[VertexIndex],
        seed: (VertexIndex, VertexIndex),
        rng: &mut R,
    ) -> &[Step] {
        self.generation = self.generation.wrapping_add(1);
        if self.generation == 0 {
            self.region.fill(0);
            self.placed.fill(0);
            self.generation = 1;
        }
        let generation = self.generation;
        for &v in region {
            self.region[v.index()] = generation;
            self.key[v.index()] = rng.gen();
            self.attach[v.index()] = 0;
        }
        debug_assert!(self.in_region(seed.0) && self.in_region(seed.1) && seed.0 != seed.1);
        self.heap.clear();
        self.steps.clear();

        self.place(graph, seed.0);
        self.place(graph, seed.1);
        let mut cursor = 0;
        while self.steps.len() < region.len() {
            let next = loop {
                match self.heap.pop() {
                    Some((attach, _, v)) if !self.is_placed(v) && attach == self.attach[v.index()] => break v,
                    Some(_) => continue,
                    None => {
                        while self.is_placed(region[cursor]) {
                            cursor += 1;
                        }
                        break region[cursor];
                    }
                }
            };
            self.place(graph, next);
        }
        &self.steps
    }

    fn in_region(&self, v: VertexIndex) -> bool {
        self.region[v.index()] == self.generation
    }

    fn is_placed(&self, v: VertexIndex) -> bool {
        self.placed[v.index()] == self.generation
    }

    fn place(&mut self, graph: &Graph, v: VertexIndex) {
        self.placed[v.index()] = self.generation;
        let mut inner = 0;
        for &u in graph.neighbors(v) {
            if !self.in_region(u) {
                continue;
            }
            let x = graph.pair_weight(u, v);
            inner += x;
            if !self.is_placed(u) {
                self.attach[u.index()] += x;
                self.heap.push((self.attach[u.index()], self.key[u.index()], u));
            }
        }
        self.steps.push(Step { vertex: v, attach: self.attach[v.index()], inner });
    }
}

/// Number of seed pairs tried for a region of `size` vertices.
pub(crate) fn seed_count(config: &Config, size: usize) -> usize {
    config.expansion_order_factor * (size as f64).sqrt().ceil() as usize
}

/// A random member of `c` and, if it has one, a random neighbor of it in `c`.
/// Otherwise a random other member.
pub(crate) fn internal_seed<R: Rng>(cg: &ClusterGraph<'_>, c: ClusterIndex, rng: &mut R) -> (VertexIndex, VertexIndex) {
    let members = cg.partition().members(c);
    debug_assert!(members.len() >= 2);
    let a = members[rng.gen_range(0..members.len())];
    let inside: Vec<VertexIndex> = cg.graph().neighbors(a).iter().copied().filter(|&u| cg.cluster_of(u) == c).collect();
    if !inside.is_empty() {
        return (a, inside[rng.gen_range(0..inside.len())]);
    }
    let i = members.iter().position(|&v| v == a).unwrap_or(0);
    let j = (i + rng.gen_range(1..members.len())) % members.len();
    (a, members[j])
}

/// Splits one cluster into a prefix and a suffix of an expansion order.
#[derive(Debug)]
pub struct Repulsion {
    order: ExpansionOrder,
}

impl Repulsion {
    pub fn new(n: usize) -> Self {
        Self { order: ExpansionOrder::new(n) }
    }

    pub fn generate<R: Rng>(&mut self, state: &State<'_>, config: &Config, rng: &mut R, selector: &mut Selector) {
        let cg = state.cluster_graph();
        let graph = cg.graph();
        for c in cg.partition().clusters() {
            let members = cg.partition().members(c);
            if members.len() < 2 {
                continue;
            }
            let total = cg.cluster_weight(c);
            for _ in 0..seed_count(config, members.len()) {
                let seed = internal_seed(cg, c, rng);
                let steps = self.order.compute(graph, members, seed, rng);

                let (mut cut, mut prefix_weight) = (0, 0);
                let mut best: Option<(i64, usize)> = None;
                for (k, step) in steps[..steps.len() - 1].iter().enumerate() {
                    cut += step.inner - 2 * step.attach;
                    prefix_weight += graph.weight(step.vertex);
                    let delta = 2 * cut - prefix_weight * (total - prefix_weight);
                    if best.map_or(true, |(d, _)| delta < d) {
                        best = Some((delta, k + 1));
                    }
                }
                let Some((delta, k)) = best else { continue };

                let prefix_weight: i64 = steps[..k].iter().map(|s| graph.weight(s.vertex)).sum();
                let moving = if 2 * prefix_weight <= total { &steps[..k] } else { &steps[k..] };
                selector.offer(MoveKind::Repulsion, delta, rng, || {
                    moving.iter().map(|s| (s.vertex, Target::Fresh(0))).collect()
                });
            }
        }
    }
}

/// Re-splits the union of two adjacent clusters along an expansion order
/// started from an edge between them.
#[derive(Debug)]
pub struct Attraction {
    order: ExpansionOrder,
    region: Vec<VertexIndex>,
}

impl Attraction {
    pub fn new(n: usize) -> Self {
        Self { order: ExpansionOrder::new(n), region: vec![] }
    }

    pub fn generate<R: Rng>(&mut self, state: &State<'_>, config: &Config, rng: &mut R, selector: &mut Selector) {
        let cg = state.cluster_graph();
        let graph = cg.graph();
        for a in cg.partition().clusters() {
            for (b, crossing) in cg.adjacent_clusters(a) {
                if b < a {
                    continue;
                }
                self.region.clear();
                self.region.extend_from_slice(cg.partition().members(a));
                self.region.extend_from_slice(cg.partition().members(b));
                let union_internal = cg.internal_weight(a) + cg.internal_weight(b) + crossing;
                let before = cg.missing_weight(a) + cg.missing_weight(b) + crossing;

                let crossing_edges: Vec<(VertexIndex, VertexIndex)> = cg
                    .partition()
                    .members(a)
                    .iter()
                    .flat_map(|&u| graph.neighbors(u).iter().filter(|&&x| cg.cluster_of(x) == b).map(move |&x| (u, x)))
                    .collect();

                for _ in 0..seed_count(config, self.region.len()) {
                    let seed = crossing_edges[rng.gen_range(0..crossing_edges.len())];
                    let steps = self.order.compute(graph, &self.region, seed, rng);
                    let Some((delta, k)) = best_resplit(graph, steps, union_internal, before) else { continue };

                    let (prefix, suffix) = steps.split_at(k);
                    let leaving = |steps: &[Step], c: ClusterIndex| -> i64 {
                        steps.iter().filter(|s| cg.cluster_of(s.vertex) != c).map(|s| graph.weight(s.vertex)).sum()
                    };
                    let moved = |to_a: &[Step], to_b: &[Step]| leaving(to_a, a) + leaving(to_b, b);
                    let (to_a, to_b) = if moved(prefix, suffix) <= moved(suffix, prefix) { (prefix, suffix) } else { (suffix, prefix) };
                    let relocations: Vec<(VertexIndex, Target)> = to_a
                        .iter()
                        .filter(|s| cg.cluster_of(s.vertex) != a)
                        .map(|s| (s.vertex, Target::Cluster(a)))
                        .chain(to_b.iter().filter(|s| cg.cluster_of(s.vertex) != b).map(|s| (s.vertex, Target::Cluster(b))))
                        .collect();
                    if relocations.is_empty() {
                        continue;
                    }
                    selector.offer(MoveKind::Attraction, delta, rng, || relocations);
                }
            }
        }
    }
}

/// Best split of an ordered region into a non-empty prefix and suffix, as
/// `(cost change, prefix length)`. `before` is the cost of the pairs inside
/// the region as currently clustered.
fn best_resplit(graph: &Graph, steps: &[Step], union_internal: i64, before: i64) -> Option<(i64, usize)> {
    let pairs = |w: i64, s: i64| (w * w - s) / 2;
    let (total, total_square) =
        steps.iter().map(|s| graph.weight(s.vertex)).fold((0, 0), |(w, s), x| (w + x, s + x * x));
    let (mut weight, mut square, mut internal, mut cut) = (0, 0, 0, 0);
    let mut best: Option<(i64, usize)> = None;
    for (k, step) in steps[..steps.len() - 1].iter().enumerate() {
        let w = graph.weight(step.vertex);
        weight += w;
        square += w * w;
        internal += step.attach;
        cut += step.inner - 2 * step.attach;
        let suffix_internal = union_internal - internal - cut;
        let after = pairs(weight, square) - internal + pairs(total - weight, total_square - square) - suffix_internal + cut;
        let delta = after - before;
        if best.map_or(true, |(d, _)| delta < d) {
            best = Some((delta, k + 1));
        }
    }
    best
}
