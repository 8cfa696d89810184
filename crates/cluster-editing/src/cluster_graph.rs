use std::collections::HashMap;

use crate::graph::{Graph, VertexIndex};
use crate::moves::Target;
use crate::partition::{ClusterIndex, Partition};

/// A graph together with a partition of its vertices and the cached values
/// needed to price moves.
///
/// For every cluster `C` we keep its weight `W(C)`, the sum of squared vertex
/// weights `S(C)` and the weight of the edges inside it `E(C)`. With the pair
/// weight `P(C) = (W(C)² - S(C)) / 2` and the total edge weight `M` the
/// editing cost of the partition is
///
/// ```text
/// cost = Σ_C (P(C) - E(C)) + (M - Σ_C E(C))
/// ```
///
/// i.e. missing edges inside clusters plus present edges between clusters.
/// Relocating a vertex `v` only needs the edge weights from `v` into its old
/// and new cluster, so every update is `O(deg(v))`.
///
/// Optionally, the crossing weights between each pair of adjacent clusters
/// are kept in a map. They are computed on demand otherwise.
#[derive(Clone, Debug)]
pub struct ClusterGraph<'g> {
    graph: &'g Graph,
    partition: Partition,
    weight: Vec<i64>,
    square: Vec<i64>,
    internal: Vec<i64>,
    crossing: Option<CrossingMap>,
    cost: i64,
}

#[derive(Clone, Debug)]
struct CrossingMap {
    maps: Vec<HashMap<ClusterIndex, i64>>,
}

impl CrossingMap {
    fn new(bound: usize) -> Self {
        Self { maps: vec![HashMap::new(); bound] }
    }

    fn add(&mut self, a: ClusterIndex, b: ClusterIndex, x: i64) {
        debug_assert_ne!(a, b);
        for (p, q) in [(a, b), (b, a)] {
            let entry = self.maps[p.index()].entry(q).or_insert(0);
            *entry += x;
            debug_assert!(*entry >= 0);
            if *entry == 0 {
                self.maps[p.index()].remove(&q);
            }
        }
    }

    fn get(&self, a: ClusterIndex, b: ClusterIndex) -> i64 {
        self.maps[a.index()].get(&b).copied().unwrap_or(0)
    }
}

#[inline(always)]
fn pair_weight(weight: i64, square: i64) -> i64 {
    (weight * weight - square) / 2
}

impl<'g> ClusterGraph<'g> {
    /// Builds the caches for `partition` in `O(n + m)`.
    pub fn new(graph: &'g Graph, partition: Partition, with_crossing_map: bool) -> Self {
        assert_eq!(graph.node_count(), partition.vertex_count());
        let bound = partition.cluster_bound();
        let mut weight = vec![0; bound];
        let mut square = vec![0; bound];
        let mut internal = vec![0; bound];
        let mut crossing = with_crossing_map.then(|| CrossingMap::new(bound));

        for v in graph.vertices() {
            let c = partition.cluster_of(v).index();
            weight[c] += graph.weight(v);
            square[c] += graph.weight(v) * graph.weight(v);
        }
        for (u, v) in graph.edges() {
            let (cu, cv) = (partition.cluster_of(u), partition.cluster_of(v));
            if cu == cv {
                internal[cu.index()] += graph.pair_weight(u, v);
            } else if let Some(map) = crossing.as_mut() {
                map.add(cu, cv, graph.pair_weight(u, v));
            }
        }

        let pairs: i64 = weight.iter().zip(&square).map(|(&w, &s)| pair_weight(w, s)).sum();
        let cost = pairs + graph.total_edge_weight() - 2 * internal.iter().sum::<i64>();
        Self { graph, partition, weight, square, internal, crossing, cost }
    }

    /// Every vertex in its own cluster.
    pub fn singletons(graph: &'g Graph, with_crossing_map: bool) -> Self {
        Self::new(graph, Partition::singletons(graph.node_count()), with_crossing_map)
    }

    #[inline(always)]
    pub fn graph(&self) -> &'g Graph {
        self.graph
    }

    #[inline(always)]
    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    /// Current editing cost.
    #[inline(always)]
    pub fn cost(&self) -> i64 {
        self.cost
    }

    #[inline(always)]
    pub fn cluster_of(&self, v: VertexIndex) -> ClusterIndex {
        self.partition.cluster_of(v)
    }

    #[inline(always)]
    pub fn cluster_weight(&self, c: ClusterIndex) -> i64 {
        self.weight[c.index()]
    }

    /// Weight of the edges with both endpoints in `c`.
    #[inline(always)]
    pub fn internal_weight(&self, c: ClusterIndex) -> i64 {
        self.internal[c.index()]
    }

    /// Weight of the vertex pairs inside `c`, present or not.
    #[inline(always)]
    pub fn pair_weight(&self, c: ClusterIndex) -> i64 {
        pair_weight(self.weight[c.index()], self.square[c.index()])
    }

    /// Weight of the edges missing inside `c`.
    #[inline(always)]
    pub fn missing_weight(&self, c: ClusterIndex) -> i64 {
        self.pair_weight(c) - self.internal[c.index()]
    }

    pub fn uses_crossing_map(&self) -> bool {
        self.crossing.is_some()
    }

    /// Weight of the edges from `v` into `c`.
    pub fn weight_to(&self, v: VertexIndex, c: ClusterIndex) -> i64 {
        let w = self.graph.weight(v);
        self.graph.neighbors(v).iter().filter(|u| self.cluster_of(**u) == c).map(|u| w * self.graph.weight(*u)).sum()
    }

    /// Weight of the edges between the distinct clusters `a` and `b`.
    pub fn crossing(&self, a: ClusterIndex, b: ClusterIndex) -> i64 {
        debug_assert_ne!(a, b);
        if let Some(map) = &self.crossing {
            return map.get(a, b);
        }
        let (small, other) = if self.partition.size(a) <= self.partition.size(b) { (a, b) } else { (b, a) };
        self.partition.members(small).iter().map(|&v| self.weight_to(v, other)).sum()
    }

    /// Clusters adjacent to `c` with the crossing weight to each, ordered by cluster index.
    pub fn adjacent_clusters(&self, c: ClusterIndex) -> Vec<(ClusterIndex, i64)> {
        let mut adjacent: Vec<(ClusterIndex, i64)> = match &self.crossing {
            Some(map) => map.maps[c.index()].iter().map(|(&d, &x)| (d, x)).collect(),
            None => {
                let mut sums: HashMap<ClusterIndex, i64> = HashMap::new();
                for &v in self.partition.members(c) {
                    for &u in self.graph.neighbors(v) {
                        let d = self.cluster_of(u);
                        if d != c {
                            *sums.entry(d).or_insert(0) += self.graph.pair_weight(u, v);
                        }
                    }
                }
                sums.into_iter().collect()
            }
        };
        adjacent.sort_unstable();
        adjacent
    }

    /// Cost change of moving `v` given the edge weights from `v` into its own
    /// cluster (`e_from`) and into `target` (`e_to`). `None` stands for a fresh
    /// cluster.
    #[inline]
    pub(crate) fn move_delta_with(
        &self,
        v: VertexIndex,
        e_from: i64,
        target: Option<ClusterIndex>,
        e_to: i64,
    ) -> i64 {
        let from = self.cluster_of(v);
        if target == Some(from) {
            return 0;
        }
        let w = self.graph.weight(v);
        let target_weight = target.map_or(0, |t| self.weight[t.index()]);
        w * target_weight - 2 * e_to - w * (self.weight[from.index()] - w) + 2 * e_from
    }

    /// Cost change of moving `v` to `target` without applying it.
    pub fn move_delta(&self, v: VertexIndex, target: Target) -> i64 {
        let from = self.cluster_of(v);
        let target = match target {
            Target::Cluster(t) => Some(t),
            Target::Fresh(_) => None,
        };
        let e_from = self.weight_to(v, from);
        let e_to = target.map_or(0, |t| if t == from { e_from } else { self.weight_to(v, t) });
        self.move_delta_with(v, e_from, target, e_to)
    }

    /// Moves `v` into `target` and returns the cost change.
    ///
    /// Panics if `target` is not a valid cluster index.
    pub fn move_vertex(&mut self, v: VertexIndex, target: ClusterIndex) -> i64 {
        assert!(target.index() < self.partition.cluster_bound(), "invalid cluster {target}");
        let from = self.cluster_of(v);
        if from == target {
            return 0;
        }
        let graph = self.graph;
        let w = graph.weight(v);
        let (mut e_from, mut e_to) = (0, 0);
        for &u in graph.neighbors(v) {
            let cu = self.partition.cluster_of(u);
            let x = w * graph.weight(u);
            if cu == from {
                e_from += x;
            } else if cu == target {
                e_to += x;
            }
            if let Some(map) = self.crossing.as_mut() {
                if cu != from {
                    map.add(from, cu, -x);
                }
                if cu != target {
                    map.add(target, cu, x);
                }
            }
        }

        let delta = self.move_delta_with(v, e_from, Some(target), e_to);
        self.weight[from.index()] -= w;
        self.square[from.index()] -= w * w;
        self.internal[from.index()] -= e_from;
        self.weight[target.index()] += w;
        self.square[target.index()] += w * w;
        self.internal[target.index()] += e_to;
        self.partition.relocate(v, target);
        self.cost += delta;
        delta
    }

    /// Merges the clusters `a` and `b` by moving the lighter one into the
    /// heavier one. Returns the surviving cluster and the cost change.
    pub fn merge_clusters(&mut self, a: ClusterIndex, b: ClusterIndex) -> (ClusterIndex, i64) {
        if a == b {
            return (a, 0);
        }
        let (keep, drop) = if self.weight[a.index()] >= self.weight[b.index()] { (a, b) } else { (b, a) };
        let moving = self.partition.members(drop).to_vec();
        let delta = moving.into_iter().map(|v| self.move_vertex(v, keep)).sum();
        (keep, delta)
    }

    /// Moves `subset` out of `c` into an empty cluster. Returns that cluster and the cost change.
    ///
    /// Panics if a vertex of `subset` is not in `c`.
    pub fn split_cluster(&mut self, c: ClusterIndex, subset: &[VertexIndex]) -> (ClusterIndex, i64) {
        assert!(subset.iter().all(|&v| self.cluster_of(v) == c), "subset is not contained in cluster {c}");
        let target = self.partition.empty_clusters()[0];
        let delta = subset.iter().map(|&v| self.move_vertex(v, target)).sum();
        (target, delta)
    }

    /// Exact cost change of relocating all given vertices simultaneously.
    ///
    /// Vertices with the same [`Target::Fresh`] label end up together in an
    /// otherwise empty cluster. Each vertex may appear at most once.
    pub fn relocation_delta(&self, relocations: &[(VertexIndex, Target)]) -> i64 {
        let moved: HashMap<VertexIndex, usize> =
            relocations.iter().enumerate().map(|(i, &(v, _))| (v, i)).collect();
        assert_eq!(moved.len(), relocations.len(), "vertex relocated twice");

        let mut leaving: HashMap<ClusterIndex, (i64, i64)> = HashMap::new();
        let mut arriving: HashMap<Target, (i64, i64)> = HashMap::new();
        for &(v, t) in relocations {
            let w = self.graph.weight(v);
            let source = leaving.entry(self.cluster_of(v)).or_insert((0, 0));
            source.0 += w;
            source.1 += w * w;
            let target = arriving.entry(t).or_insert((0, 0));
            target.0 += w;
            target.1 += w * w;
        }
        let remaining = |c: ClusterIndex| self.weight[c.index()] - leaving.get(&c).map_or(0, |s| s.0);

        let mut delta = 0;
        for (i, &(v, t)) in relocations.iter().enumerate() {
            let w = self.graph.weight(v);
            let from = self.cluster_of(v);
            let (mut e_from, mut e_to) = (0, 0);
            for &u in self.graph.neighbors(v) {
                let x = w * self.graph.weight(u);
                if let Some(&j) = moved.get(&u) {
                    // Edges inside the moved set are counted once, from the lower index.
                    if j > i {
                        let now = (t == relocations[j].1) as i64;
                        let before = (from == self.cluster_of(u)) as i64;
                        delta -= 2 * x * (now - before);
                    }
                    continue;
                }
                let cu = self.cluster_of(u);
                if cu == from {
                    e_from += x;
                }
                if t == Target::Cluster(cu) {
                    e_to += x;
                }
            }
            let target_weight = match t {
                Target::Cluster(c) => remaining(c),
                Target::Fresh(_) => 0,
            };
            delta += w * target_weight - 2 * e_to - w * remaining(from) + 2 * e_from;
        }

        let pairs = |&(w, s): &(i64, i64)| pair_weight(w, s);
        delta + arriving.values().map(pairs).sum::<i64>() - leaving.values().map(pairs).sum::<i64>()
    }

    /// Recomputes the cost from the graph and the cluster assignment alone.
    pub fn recompute_cost(&self) -> i64 {
        partition_cost(self.graph, &self.partition.assignment())
    }

    /// Compares all caches against a recomputation from scratch.
    pub fn check_consistency(&self) -> bool {
        let fresh = ClusterGraph::new(self.graph, self.partition.clone(), self.crossing.is_some());
        let caches_ok = ClusterIndex::range(self.partition.cluster_bound()).all(|c| {
            let i = c.index();
            self.weight[i] == fresh.weight[i] && self.square[i] == fresh.square[i] && self.internal[i] == fresh.internal[i]
        });
        let crossing_ok = match (&self.crossing, &fresh.crossing) {
            (Some(a), Some(b)) => a.maps == b.maps,
            (None, None) => true,
            _ => false,
        };
        self.partition.check_invariants() && caches_ok && crossing_ok && self.cost == self.recompute_cost()
    }
}

/// Editing cost of the clustering given by `assignment` (arbitrary labels).
pub fn partition_cost(graph: &Graph, assignment: &[usize]) -> i64 {
    assert_eq!(graph.node_count(), assignment.len());
    let mut sums: HashMap<usize, (i64, i64)> = HashMap::new();
    for v in graph.vertices() {
        let w = graph.weight(v);
        let entry = sums.entry(assignment[v.index()]).or_insert((0, 0));
        entry.0 += w;
        entry.1 += w * w;
    }
    let pairs: i64 = sums.values().map(|&(w, s)| pair_weight(w, s)).sum();
    let inside: i64 = graph
        .edges()
        .filter(|(u, v)| assignment[u.index()] == assignment[v.index()])
        .map(|(u, v)| graph.pair_weight(u, v))
        .sum();
    pairs + graph.total_edge_weight() - 2 * inside
}

/// Scratch space collecting the edge weights from one vertex into each
/// adjacent cluster. Clusters are reported in order of first occurrence in
/// the adjacency list.
#[derive(Clone, Debug)]
pub(crate) struct NeighborClusters {
    weight: Vec<i64>,
    touched: Vec<ClusterIndex>,
}

impl NeighborClusters {
    pub(crate) fn new(bound: usize) -> Self {
        Self { weight: vec![0; bound], touched: vec![] }
    }

    pub(crate) fn clear(&mut self) {
        for c in self.touched.drain(..) {
            self.weight[c.index()] = 0;
        }
    }

    pub(crate) fn add(&mut self, c: ClusterIndex, x: i64) {
        debug_assert!(x > 0);
        if self.weight[c.index()] == 0 {
            self.touched.push(c);
        }
        self.weight[c.index()] += x;
    }

    /// Replaces the contents by the edge weights from `v`.
    pub(crate) fn collect(&mut self, cg: &ClusterGraph<'_>, v: VertexIndex) {
        self.clear();
        let graph = cg.graph();
        let w = graph.weight(v);
        for &u in graph.neighbors(v) {
            self.add(cg.cluster_of(u), w * graph.weight(u));
        }
    }

    #[inline(always)]
    pub(crate) fn get(&self, c: ClusterIndex) -> i64 {
        self.weight[c.index()]
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (ClusterIndex, i64)> + '_ {
        self.touched.iter().map(|&c| (c, self.weight[c.index()]))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use common::instances;
    use proptest::prelude::*;

    fn v(i: usize) -> VertexIndex {
        VertexIndex::new(i)
    }

    fn two_triangles_with_bridge() -> Graph {
        Graph::from_petgraph(&instances::bridged_cliques(3, 3))
    }

    #[test]
    fn singleton_cost_is_edge_count() {
        let graph = two_triangles_with_bridge();
        let cg = ClusterGraph::singletons(&graph, false);
        assert_eq!(cg.cost(), 7);
        assert!(cg.check_consistency());
    }

    #[test]
    fn optimal_clustering_of_bridged_triangles() {
        let graph = two_triangles_with_bridge();
        let cg = ClusterGraph::new(&graph, Partition::from_assignment(&[0, 0, 0, 1, 1, 1]), true);
        assert_eq!(cg.cost(), 1);
        let (a, b) = (cg.cluster_of(v(0)), cg.cluster_of(v(3)));
        assert_eq!(cg.crossing(a, b), 1);
        assert_eq!(cg.internal_weight(a), 3);
        assert_eq!(cg.missing_weight(a), 0);
        assert_eq!(cg.adjacent_clusters(a), [(b, 1)]);
    }

    #[test]
    fn move_vertex_matches_delta() {
        let graph = two_triangles_with_bridge();
        for map in [false, true] {
            let mut cg = ClusterGraph::singletons(&graph, map);
            let target = cg.cluster_of(v(0));
            let predicted = cg.move_delta(v(1), Target::Cluster(target));
            let delta = cg.move_vertex(v(1), target);
            assert_eq!(predicted, delta);
            assert_eq!(delta, -1);
            assert_eq!(cg.cost(), 6);
            assert!(cg.check_consistency());
        }
    }

    #[test]
    fn merge_and_split() {
        let graph = two_triangles_with_bridge();
        let mut cg = ClusterGraph::new(&graph, Partition::from_assignment(&[0, 0, 0, 1, 1, 1]), true);
        let (a, b) = (cg.cluster_of(v(0)), cg.cluster_of(v(3)));
        let (keep, delta) = cg.merge_clusters(a, b);
        assert_eq!(delta, 9 - 2);
        assert_eq!(cg.partition().size(keep), 6);
        assert_eq!(cg.cost(), 8);
        assert!(cg.check_consistency());

        let (_, delta) = cg.split_cluster(keep, &[v(3), v(4), v(5)]);
        assert_eq!(delta, -7);
        assert_eq!(cg.cost(), 1);
        assert!(cg.check_consistency());
    }

    #[test]
    fn weighted_costs() {
        let graph = Graph::from_weighted_edges(vec![2, 3, 1], [(0, 1), (1, 2)]);
        let mut cg = ClusterGraph::singletons(&graph, false);
        assert_eq!(cg.cost(), 9);
        let c0 = cg.cluster_of(v(0));
        assert_eq!(cg.move_vertex(v(1), c0), -6);
        let c2 = cg.cluster_of(v(2));
        assert_eq!(cg.move_delta(v(2), Target::Cluster(c0)), -1);
        assert_eq!(cg.move_vertex(v(0), c2), 6 + 2);
        assert!(cg.check_consistency());
        assert_eq!(cg.cost(), partition_cost(&graph, &cg.partition().assignment()));
    }

    #[test]
    fn relocation_delta_of_swap() {
        // a = {0, 1}, b = {2, 3}; edges 0-3, 2-1, 0-2
        let graph = Graph::from_edges(4, [(0, 3), (1, 2), (0, 2)]);
        let cg = ClusterGraph::new(&graph, Partition::from_assignment(&[0, 0, 1, 1]), false);
        assert_eq!(cg.cost(), 5);
        let (a, b) = (cg.cluster_of(v(0)), cg.cluster_of(v(2)));
        let delta = cg.relocation_delta(&[(v(0), Target::Cluster(b)), (v(2), Target::Cluster(a))]);
        assert_eq!(delta, -4);

        let mut moved = cg.clone();
        moved.move_vertex(v(0), b);
        moved.move_vertex(v(2), a);
        assert_eq!(moved.cost(), 1);
    }

    #[test]
    fn relocation_delta_with_fresh_targets() {
        let graph = two_triangles_with_bridge();
        let cg = ClusterGraph::new(&graph, Partition::from_assignment(&[0; 6]), false);
        let relocations: Vec<_> = (3..6).map(|i| (v(i), Target::Fresh(0))).collect();
        assert_eq!(cg.relocation_delta(&relocations), -7);
        let relocations = [(v(0), Target::Fresh(0)), (v(3), Target::Fresh(1))];
        assert_eq!(cg.relocation_delta(&relocations), partition_cost(&graph, &[0, 1, 1, 2, 1, 1]) - cg.cost());
    }

    #[test]
    fn neighbor_clusters() {
        let graph = two_triangles_with_bridge();
        let cg = ClusterGraph::new(&graph, Partition::from_assignment(&[0, 0, 1, 2, 2, 2]), false);
        let mut scratch = NeighborClusters::new(cg.partition().cluster_bound());
        scratch.collect(&cg, v(2));
        let collected: Vec<_> = scratch.iter().collect();
        assert_eq!(collected, [(cg.cluster_of(v(0)), 2), (cg.cluster_of(v(3)), 1)]);
        scratch.collect(&cg, v(4));
        assert_eq!(scratch.get(cg.cluster_of(v(0))), 0);
        assert_eq!(scratch.get(cg.cluster_of(v(3))), 2);
    }

    #[derive(Clone, Debug)]
    enum Op {
        Move(usize, usize),
        Merge(usize, usize),
        Split(usize, usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0..12usize, 0..14usize).prop_map(|(v, c)| Op::Move(v, c)),
            (0..12usize, 0..12usize).prop_map(|(a, b)| Op::Merge(a, b)),
            (0..12usize, 1..4usize).prop_map(|(v, k)| Op::Split(v, k)),
        ]
    }

    proptest! {
        #[test]
        fn incremental_cost_matches_recomputation(
            edges in prop::collection::btree_set((0..12usize, 0..12usize), 0..40),
            ops in prop::collection::vec(op(), 0..60),
            map in any::<bool>(),
        ) {
            let edges: std::collections::BTreeSet<_> =
                edges.into_iter().filter(|(a, b)| a != b).map(|(a, b)| (a.min(b), a.max(b))).collect();
            let graph = Graph::from_edges(12, edges);
            let mut cg = ClusterGraph::singletons(&graph, map);
            for op in ops {
                let before = cg.cost();
                let delta = match op {
                    Op::Move(v, c) => cg.move_vertex(VertexIndex::new(v), ClusterIndex::new(c)),
                    Op::Merge(a, b) => {
                        let (a, b) = (cg.cluster_of(VertexIndex::new(a)), cg.cluster_of(VertexIndex::new(b)));
                        cg.merge_clusters(a, b).1
                    }
                    Op::Split(v, k) => {
                        let c = cg.cluster_of(VertexIndex::new(v));
                        let subset: Vec<_> = cg.partition().members(c).iter().copied().step_by(k).collect();
                        cg.split_cluster(c, &subset).1
                    }
                };
                prop_assert_eq!(cg.cost(), before + delta);
                prop_assert_eq!(cg.cost(), cg.recompute_cost());
                prop_assert!(cg.partition().check_invariants());
                prop_assert_eq!(cg.partition().assignment().len(), 12);
            }
            prop_assert!(cg.check_consistency());
        }
    }
}
