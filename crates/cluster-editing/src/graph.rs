use petgraph::visit::{GraphProp, IntoNeighbors, NodeCompactIndexable};
use petgraph::Undirected;

use crate::index::make_index;

make_index!(pub VertexIndex);

/// An immutable, simple, undirected graph with positive vertex weights.
///
/// Adjacency is stored in compressed sparse row form with sorted neighbor
/// slices. Editing the pair `{u, v}` costs `weight(u) * weight(v)`, so
/// unweighted inputs have unit weights everywhere and kernelized graphs carry
/// the sizes of the contracted vertex groups.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Graph {
    offsets: Vec<u32>,
    targets: Vec<VertexIndex>,
    weights: Vec<i64>,
    total_weight: i64,
    total_edge_weight: i64,
}

impl Graph {
    /// Creates a graph with unit vertex weights from an edge list.
    ///
    /// Panics if an edge is a self-loop, appears twice, or refers to a vertex
    /// `>= n`.
    pub fn from_edges(n: usize, edges: impl IntoIterator<Item = (usize, usize)>) -> Self {
        Self::from_weighted_edges(vec![1; n], edges)
    }

    /// Creates a graph with the given vertex weights from an edge list.
    ///
    /// Panics on self-loops, duplicate edges, out of range endpoints and
    /// non-positive weights.
    pub fn from_weighted_edges(weights: Vec<i64>, edges: impl IntoIterator<Item = (usize, usize)>) -> Self {
        let n = weights.len();
        assert!(weights.iter().all(|&w| w > 0), "vertex weights must be positive");
        let mut adj: Vec<Vec<VertexIndex>> = vec![vec![]; n];
        for (u, v) in edges {
            assert!(u < n && v < n, "edge ({u}, {v}) out of range for {n} vertices");
            assert_ne!(u, v, "self-loop at {u}");
            adj[u].push(VertexIndex::new(v));
            adj[v].push(VertexIndex::new(u));
        }
        Self::from_adjacency(weights, adj)
    }

    /// Converts a petgraph graph. All vertex weights are one.
    ///
    /// Panics if the graph has self-loops or parallel edges.
    pub fn from_petgraph<G>(graph: G) -> Self
    where
        G: NodeCompactIndexable + IntoNeighbors + GraphProp<EdgeType = Undirected>,
    {
        let n = graph.node_bound();
        let adj = (0..n)
            .map(|i| graph.neighbors(graph.from_index(i)).map(|v| VertexIndex::new(graph.to_index(v))).collect())
            .collect();
        Self::from_adjacency(vec![1; n], adj)
    }

    pub(crate) fn from_adjacency(weights: Vec<i64>, mut adj: Vec<Vec<VertexIndex>>) -> Self {
        assert_eq!(weights.len(), adj.len());
        let mut offsets = Vec::with_capacity(adj.len() + 1);
        let mut targets = Vec::with_capacity(adj.iter().map(Vec::len).sum());
        let mut total_edge_weight = 0;
        offsets.push(0);
        for (u, neighbors) in adj.iter_mut().enumerate() {
            neighbors.sort_unstable();
            assert!(neighbors.windows(2).all(|w| w[0] != w[1]), "parallel edges at vertex {u}");
            assert!(neighbors.iter().all(|v| v.index() != u), "self-loop at {u}");
            for v in neighbors.iter() {
                if u < v.index() {
                    total_edge_weight += weights[u] * weights[v.index()];
                }
            }
            targets.extend_from_slice(&neighbors[..]);
            offsets.push(targets.len() as u32);
        }
        let total_weight = weights.iter().sum();
        Self { offsets, targets, weights, total_weight, total_edge_weight }
    }

    /// Number of vertices.
    #[inline(always)]
    pub fn node_count(&self) -> usize {
        self.weights.len()
    }

    /// Number of edges.
    #[inline(always)]
    pub fn edge_count(&self) -> usize {
        self.targets.len() / 2
    }

    /// Sorted neighbors of `u`.
    #[inline(always)]
    pub fn neighbors(&self, u: VertexIndex) -> &[VertexIndex] {
        let (start, end) = (self.offsets[u.index()], self.offsets[u.index() + 1]);
        &self.targets[start as usize..end as usize]
    }

    #[inline(always)]
    pub fn degree(&self, u: VertexIndex) -> usize {
        self.neighbors(u).len()
    }

    #[inline(always)]
    pub fn weight(&self, u: VertexIndex) -> i64 {
        self.weights[u.index()]
    }

    pub fn weights(&self) -> &[i64] {
        &self.weights
    }

    /// Sum of all vertex weights, i.e. the number of original vertices for kernelized graphs.
    pub fn total_weight(&self) -> i64 {
        self.total_weight
    }

    /// Sum of `weight(u) * weight(v)` over all edges.
    pub fn total_edge_weight(&self) -> i64 {
        self.total_edge_weight
    }

    /// Cost of editing the pair `{u, v}`.
    #[inline(always)]
    pub fn pair_weight(&self, u: VertexIndex, v: VertexIndex) -> i64 {
        self.weight(u) * self.weight(v)
    }

    pub fn has_edge(&self, u: VertexIndex, v: VertexIndex) -> bool {
        let (a, b) = if self.degree(u) <= self.degree(v) { (u, v) } else { (v, u) };
        self.neighbors(a).binary_search(&b).is_ok()
    }

    pub fn is_unweighted(&self) -> bool {
        self.weights.iter().all(|&w| w == 1)
    }

    pub fn vertices(&self) -> impl DoubleEndedIterator<Item = VertexIndex> + ExactSizeIterator {
        VertexIndex::range(self.node_count())
    }

    /// All edges `(u, v)` with `u < v`, ordered lexicographically.
    pub fn edges(&self) -> impl Iterator<Item = (VertexIndex, VertexIndex)> + '_ {
        self.vertices().flat_map(move |u| self.neighbors(u).iter().filter(move |v| u < **v).map(move |v| (u, *v)))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use common::instances;

    #[test]
    fn csr_layout() {
        let graph = Graph::from_edges(4, [(2, 0), (0, 1), (3, 2)]);
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(graph.neighbors(VertexIndex::new(0)), [VertexIndex::new(1), VertexIndex::new(2)]);
        assert_eq!(graph.neighbors(VertexIndex::new(2)), [VertexIndex::new(0), VertexIndex::new(3)]);
        assert!(graph.has_edge(VertexIndex::new(3), VertexIndex::new(2)));
        assert!(!graph.has_edge(VertexIndex::new(3), VertexIndex::new(0)));
        let edges: Vec<_> = graph.edges().map(|(u, v)| (u.index(), v.index())).collect();
        assert_eq!(edges, [(0, 1), (0, 2), (2, 3)]);
        assert_eq!(graph.total_edge_weight(), 3);
        assert!(graph.is_unweighted());
    }

    #[test]
    fn weighted() {
        let graph = Graph::from_weighted_edges(vec![2, 3, 1], [(0, 1), (1, 2)]);
        assert_eq!(graph.total_weight(), 6);
        assert_eq!(graph.total_edge_weight(), 6 + 3);
        assert_eq!(graph.pair_weight(VertexIndex::new(0), VertexIndex::new(2)), 2);
        assert!(!graph.is_unweighted());
    }

    #[test]
    fn from_petgraph() {
        let graph = Graph::from_petgraph(&instances::path_graph(5));
        assert_eq!(graph.node_count(), 5);
        assert_eq!(graph.edge_count(), 4);
        assert_eq!(graph.degree(VertexIndex::new(2)), 2);
    }

    #[test]
    fn empty() {
        let graph = Graph::from_edges(0, Vec::<(usize, usize)>::new());
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.edges().count(), 0);
    }

    #[test]
    #[should_panic]
    fn self_loop() {
        Graph::from_edges(2, [(1, 1)]);
    }

    #[test]
    #[should_panic]
    fn parallel_edge() {
        Graph::from_edges(2, [(0, 1), (1, 0)]);
    }
}
