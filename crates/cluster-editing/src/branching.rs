//! Exact search over conflict triples.
//!
//! A conflict is an induced path `u - v - w`. Every solution resolves it in
//! one of three ways: delete `uv`, keep `uv` and delete `vw`, or keep both
//! and insert `uw`. Decided pairs are marked so that no branch edits a pair
//! twice, which makes the branches disjoint.

use std::collections::{HashMap, HashSet};

use tracing::{info, instrument, trace};

use crate::cluster_graph::partition_cost;
use crate::config::Config;
use crate::context::RunContext;
use crate::graph::{Graph, VertexIndex};
use crate::neg::Neg;
use crate::partition::Partition;
use crate::union_find::UnionFind;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Mark {
    /// Edge that must stay.
    Permanent,
    /// Non-edge that must stay.
    Forbidden,
}

type Pair = (VertexIndex, VertexIndex);

fn pair(u: VertexIndex, v: VertexIndex) -> Pair {
    if u < v {
        (u, v)
    } else {
        (v, u)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BranchOutcome {
    /// Cost of the best solution, or the initial upper bound if nothing better was found.
    pub best_cost: i64,
    /// Normalized labels of a solution better than the upper bound.
    pub best_partition: Option<Vec<usize>>,
    pub nodes: u64,
    pub pruned: u64,
    pub depth_limit_hits: u64,
    /// Neither the depth limit nor the time budget cut the search short.
    pub exact: bool,
}

#[derive(Debug)]
pub struct BranchAndBound<'g, 'c> {
    graph: &'g Graph,
    config: &'c Config,
    adj: Vec<Vec<VertexIndex>>,
    marks: HashMap<Pair, Mark>,
    best_cost: i64,
    best: Option<Vec<usize>>,
    nodes: u64,
    pruned: u64,
    depth_limit_hits: u64,
    exact: bool,
}

impl<'g, 'c> BranchAndBound<'g, 'c> {
    /// Searches for solutions strictly cheaper than `upper_bound`.
    pub fn new(graph: &'g Graph, config: &'c Config, upper_bound: i64) -> Self {
        let adj = graph.vertices().map(|u| graph.neighbors(u).to_vec()).collect();
        Self {
            graph,
            config,
            adj,
            marks: HashMap::new(),
            best_cost: upper_bound,
            best: None,
            nodes: 0,
            pruned: 0,
            depth_limit_hits: 0,
            exact: true,
        }
    }

    #[instrument(skip_all)]
    pub fn run(mut self, ctx: &mut RunContext) -> BranchOutcome {
        self.search(ctx, 0, 0);

        let counters = ctx.counters_mut();
        counters.add("bnb_nodes", self.nodes as i64);
        counters.add("bnb_pruned", self.pruned as i64);
        counters.add("bnb_depth_limit_hits", self.depth_limit_hits as i64);
        counters.set("bnb_exact", self.exact as i64);
        info!(
            best_cost = self.best_cost,
            improved = self.best.is_some(),
            nodes = self.nodes,
            pruned = self.pruned,
            depth_limit_hits = self.depth_limit_hits,
            exact = self.exact
        );
        BranchOutcome {
            best_cost: self.best_cost,
            best_partition: self.best,
            nodes: self.nodes,
            pruned: self.pruned,
            depth_limit_hits: self.depth_limit_hits,
            exact: self.exact,
        }
    }

    fn search(&mut self, ctx: &mut RunContext, cost: i64, depth: usize) {
        self.nodes += 1;
        if ctx.time_exceeded() {
            self.exact = false;
            return;
        }
        if cost >= self.best_cost {
            self.pruned += 1;
            return;
        }
        match self.lower_bound() {
            Some(bound) if cost + bound < self.best_cost => {}
            _ => {
                self.pruned += 1;
                return;
            }
        }

        let Some((u, v, w)) = self.find_conflict() else {
            self.record_components(cost);
            return;
        };
        if depth >= self.config.max_recursion_depth {
            self.depth_limit_hits += 1;
            self.exact = false;
            self.descend(ctx);
            return;
        }
        trace!(depth, cost, u = u.index(), v = v.index(), w = w.index(), "branch");

        if self.mark(u, v) != Some(Mark::Permanent) {
            let previous = self.set_mark(u, v, Some(Mark::Forbidden));
            self.remove_edge(u, v);
            self.search(ctx, cost + self.graph.pair_weight(u, v), depth + 1);
            self.add_edge(u, v);
            self.set_mark(u, v, previous);
        }

        let previous_uv = self.set_mark(u, v, Some(Mark::Permanent));
        if self.mark(v, w) != Some(Mark::Permanent) {
            let previous = self.set_mark(v, w, Some(Mark::Forbidden));
            self.remove_edge(v, w);
            self.search(ctx, cost + self.graph.pair_weight(v, w), depth + 1);
            self.add_edge(v, w);
            self.set_mark(v, w, previous);
        }

        let previous_vw = self.set_mark(v, w, Some(Mark::Permanent));
        if self.mark(u, w) != Some(Mark::Forbidden) {
            let previous = self.set_mark(u, w, Some(Mark::Permanent));
            self.add_edge(u, w);
            self.search(ctx, cost + self.graph.pair_weight(u, w), depth + 1);
            self.remove_edge(u, w);
            self.set_mark(u, w, previous);
        }
        self.set_mark(v, w, previous_vw);
        self.set_mark(u, v, previous_uv);
    }

    fn mark(&self, u: VertexIndex, v: VertexIndex) -> Option<Mark> {
        self.marks.get(&pair(u, v)).copied()
    }

    /// Returns the previous mark. `None` clears the mark.
    fn set_mark(&mut self, u: VertexIndex, v: VertexIndex, mark: Option<Mark>) -> Option<Mark> {
        match mark {
            Some(mark) => self.marks.insert(pair(u, v), mark),
            None => self.marks.remove(&pair(u, v)),
        }
    }

    fn adjacent(&self, u: VertexIndex, v: VertexIndex) -> bool {
        self.adj[u.index()].binary_search(&v).is_ok()
    }

    fn add_edge(&mut self, u: VertexIndex, v: VertexIndex) {
        for (a, b) in [(u, v), (v, u)] {
            let list = &mut self.adj[a.index()];
            if let Err(pos) = list.binary_search(&b) {
                list.insert(pos, b);
            }
        }
    }

    fn remove_edge(&mut self, u: VertexIndex, v: VertexIndex) {
        for (a, b) in [(u, v), (v, u)] {
            let list = &mut self.adj[a.index()];
            if let Ok(pos) = list.binary_search(&b) {
                list.remove(pos);
            }
        }
    }

    /// Calls `f` with every conflict `(u, v, w)`, `v` the middle vertex and `u < w`,
    /// until it returns `false`.
    fn for_each_conflict(&self, mut f: impl FnMut(VertexIndex, VertexIndex, VertexIndex) -> bool) {
        for v in self.graph.vertices() {
            let neighbors = &self.adj[v.index()];
            for (i, &u) in neighbors.iter().enumerate() {
                for &w in &neighbors[i + 1..] {
                    if !self.adjacent(u, w) && !f(u, v, w) {
                        return;
                    }
                }
            }
        }
    }

    fn find_conflict(&self) -> Option<(VertexIndex, VertexIndex, VertexIndex)> {
        let mut found = None;
        self.for_each_conflict(|u, v, w| {
            found = Some((u, v, w));
            false
        });
        found
    }

    /// Greedy packing of conflicts that share no pair. Each needs at least its
    /// cheapest editable pair. `None` if some conflict cannot be resolved at all.
    fn lower_bound(&self) -> Option<i64> {
        let mut used: HashSet<Pair> = HashSet::new();
        let mut bound = 0;
        let mut feasible = true;
        self.for_each_conflict(|u, v, w| {
            let options = [
                (pair(u, v), self.mark(u, v) != Some(Mark::Permanent)),
                (pair(v, w), self.mark(v, w) != Some(Mark::Permanent)),
                (pair(u, w), self.mark(u, w) != Some(Mark::Forbidden)),
            ];
            let cheapest = options.iter().filter(|(_, editable)| *editable).map(|&((a, b), _)| self.graph.pair_weight(a, b)).min();
            let Some(cheapest) = cheapest else {
                feasible = false;
                return false;
            };
            if options.iter().all(|(p, _)| !used.contains(p)) {
                used.extend(options.iter().map(|(p, _)| *p));
                bound += cheapest;
            }
            true
        });
        feasible.then_some(bound)
    }

    /// The edited graph is a disjoint union of cliques.
    fn record_components(&mut self, cost: i64) {
        let mut uf = UnionFind::new(self.graph.node_count());
        for (u, neighbors) in self.adj.iter().enumerate() {
            for v in neighbors {
                uf.union(u, v.index());
            }
        }
        let labels = uf.labels();
        debug_assert_eq!(partition_cost(self.graph, &labels), cost);
        if cost < self.best_cost {
            info!(cost, nodes = self.nodes, "improved");
            self.best_cost = cost;
            self.best = Some(labels);
        }
    }

    /// Replaces the rest of the subtree by a local search on the edited graph.
    fn descend(&mut self, ctx: &mut RunContext) {
        let edited = Graph::from_adjacency(self.graph.weights().to_vec(), self.adj.clone());
        let seed = self.config.seed.wrapping_add(self.nodes);
        let outcome =
            Neg::with_seed(&edited, Partition::singletons(edited.node_count()), self.config, seed).descent_only().run(ctx);
        let cost = partition_cost(self.graph, &outcome.best_partition);
        if cost < self.best_cost {
            info!(cost, nodes = self.nodes, "improved by local search");
            self.best_cost = cost;
            self.best = Some(outcome.best_partition);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use common::instances;
    use std::time::Duration;

    fn exhaustive() -> Config {
        Config { max_recursion_depth: usize::MAX, ..Default::default() }
    }

    fn ctx() -> RunContext {
        RunContext::new(Duration::from_secs(60))
    }

    /// Cheapest clustering over all set partitions.
    fn brute_force(graph: &Graph) -> i64 {
        fn visit(graph: &Graph, labels: &mut Vec<usize>, blocks: usize, best: &mut i64) {
            if labels.len() == graph.node_count() {
                *best = (*best).min(partition_cost(graph, labels));
                return;
            }
            for label in 0..=blocks {
                labels.push(label);
                visit(graph, labels, blocks.max(label + 1), best);
                labels.pop();
            }
        }
        let mut best = i64::MAX;
        visit(graph, &mut vec![], 0, &mut best);
        best
    }

    #[test]
    fn bridged_triangles() {
        let graph = Graph::from_petgraph(&instances::bridged_cliques(3, 3));
        let config = exhaustive();
        let mut ctx = ctx();
        let outcome = BranchAndBound::new(&graph, &config, i64::MAX).run(&mut ctx);
        assert_eq!(outcome.best_cost, 1);
        assert_eq!(outcome.best_partition.as_deref(), Some(&[0, 0, 0, 1, 1, 1][..]));
        assert!(outcome.exact);
        assert_eq!(ctx.counters().get("bnb_nodes"), outcome.nodes as i64);
        assert_eq!(ctx.counters().get("bnb_exact"), 1);
    }

    #[test]
    fn star_keeps_one_leaf() {
        let graph = Graph::from_petgraph(&instances::star_graph(3));
        let config = exhaustive();
        let outcome = BranchAndBound::new(&graph, &config, i64::MAX).run(&mut ctx());
        assert_eq!(outcome.best_cost, 2);
        let partition = outcome.best_partition.unwrap();
        assert_eq!(partition_cost(&graph, &partition), 2);
    }

    #[test]
    fn matches_brute_force() {
        for seed in 0..8 {
            let graph = Graph::from_petgraph(&instances::random_clustered_graph(7, 2, 0.7, 0.3, seed));
            let config = exhaustive();
            let outcome = BranchAndBound::new(&graph, &config, i64::MAX).run(&mut ctx());
            assert_eq!(outcome.best_cost, brute_force(&graph), "seed {seed}");
            assert!(outcome.exact);
        }
    }

    #[test]
    fn weighted_matches_brute_force() {
        let graph = Graph::from_weighted_edges(vec![2, 1, 3, 1, 2], [(0, 1), (1, 2), (2, 3), (3, 4), (0, 2)]);
        let config = exhaustive();
        let outcome = BranchAndBound::new(&graph, &config, i64::MAX).run(&mut ctx());
        assert_eq!(outcome.best_cost, brute_force(&graph));
        assert_eq!(partition_cost(&graph, &outcome.best_partition.unwrap()), outcome.best_cost);
    }

    #[test]
    fn tight_upper_bound_finds_nothing() {
        let graph = Graph::from_petgraph(&instances::bridged_cliques(3, 3));
        let config = exhaustive();
        let outcome = BranchAndBound::new(&graph, &config, 1).run(&mut ctx());
        assert_eq!(outcome.best_cost, 1);
        assert_eq!(outcome.best_partition, None);
        assert!(outcome.exact);
        assert_eq!(outcome.nodes, 1);
        assert_eq!(outcome.pruned, 1);
    }

    #[test]
    fn depth_limit_falls_back_to_local_search() {
        let graph = Graph::from_petgraph(&instances::path_graph(4));
        let config = Config { max_recursion_depth: 0, ..Default::default() };
        let mut ctx = ctx();
        let outcome = BranchAndBound::new(&graph, &config, i64::MAX).run(&mut ctx);
        assert_eq!(outcome.depth_limit_hits, 1);
        assert!(!outcome.exact);
        let partition = outcome.best_partition.unwrap();
        assert_eq!(partition_cost(&graph, &partition), outcome.best_cost);
        assert!(outcome.best_cost >= 1);
        assert_eq!(ctx.counters().get("neg_runs"), 1);
    }

    #[test]
    fn zero_budget_is_not_exact() {
        let graph = Graph::from_petgraph(&instances::path_graph(4));
        let config = exhaustive();
        let outcome = BranchAndBound::new(&graph, &config, i64::MAX).run(&mut RunContext::new(Duration::ZERO));
        assert!(!outcome.exact);
        assert_eq!(outcome.best_partition, None);
    }

    #[test]
    fn cluster_graph_needs_no_branching() {
        let graph = Graph::from_petgraph(&instances::disjoint_cliques(&[3, 2, 1]));
        let config = Config::default();
        let outcome = BranchAndBound::new(&graph, &config, i64::MAX).run(&mut ctx());
        assert_eq!(outcome.best_cost, 0);
        assert_eq!(outcome.best_partition.as_deref(), Some(&[0, 0, 0, 1, 1, 2][..]));
        assert_eq!(outcome.depth_limit_hits, 0);
    }
}
