//! Small graphs with known structure.

use petgraph::graph::{NodeIndex, UnGraph};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn with_edges(n: usize, edges: impl IntoIterator<Item = (usize, usize)>) -> UnGraph<(), ()> {
    let mut graph = UnGraph::default();
    for _ in 0..n {
        graph.add_node(());
    }
    for (u, v) in edges {
        graph.add_edge(NodeIndex::new(u), NodeIndex::new(v), ());
    }
    graph
}

fn clique_edges(range: std::ops::Range<usize>) -> impl Iterator<Item = (usize, usize)> {
    range.clone().flat_map(move |u| (u + 1..range.end).map(move |v| (u, v)))
}

pub fn empty_graph(n: usize) -> UnGraph<(), ()> {
    with_edges(n, std::iter::empty())
}

pub fn path_graph(n: usize) -> UnGraph<(), ()> {
    with_edges(n, (1..n).map(|v| (v - 1, v)))
}

pub fn complete_graph(n: usize) -> UnGraph<(), ()> {
    with_edges(n, clique_edges(0..n))
}

/// Center `0` and leaves `1..=k`.
pub fn star_graph(k: usize) -> UnGraph<(), ()> {
    with_edges(k + 1, (1..=k).map(|v| (0, v)))
}

/// Cliques on `0..a` and `a..a + b`, joined by the edge `(a - 1, a)`.
pub fn bridged_cliques(a: usize, b: usize) -> UnGraph<(), ()> {
    assert!(a > 0 && b > 0);
    with_edges(a + b, clique_edges(0..a).chain(clique_edges(a..a + b)).chain([(a - 1, a)]))
}

/// Cliques of the given sizes on consecutive vertices.
pub fn disjoint_cliques(sizes: &[usize]) -> UnGraph<(), ()> {
    let mut edges = vec![];
    let mut start = 0;
    for &size in sizes {
        edges.extend(clique_edges(start..start + size));
        start += size;
    }
    with_edges(start, edges)
}

/// Vertex `v` belongs to planted cluster `v % k`. Pairs inside a cluster are
/// adjacent with probability `p_in`, other pairs with `p_out`.
pub fn random_clustered_graph(n: usize, k: usize, p_in: f64, p_out: f64, seed: u64) -> UnGraph<(), ()> {
    assert!(k > 0);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut edges = vec![];
    for u in 0..n {
        for v in u + 1..n {
            let p = if u % k == v % k { p_in } else { p_out };
            if rng.gen_bool(p) {
                edges.push((u, v));
            }
        }
    }
    with_edges(n, edges)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn sizes() {
        assert_eq!((empty_graph(3).node_count(), empty_graph(3).edge_count()), (3, 0));
        assert_eq!(path_graph(0).node_count(), 0);
        assert_eq!(path_graph(4).edge_count(), 3);
        assert_eq!(complete_graph(4).edge_count(), 6);
        assert_eq!(star_graph(3).edge_count(), 3);
        assert_eq!(bridged_cliques(3, 4).edge_count(), 3 + 6 + 1);
        let graph = disjoint_cliques(&[3, 1, 2]);
        assert_eq!((graph.node_count(), graph.edge_count()), (6, 4));
    }

    #[test]
    fn random_graph_is_reproducible() {
        let a = random_clustered_graph(20, 3, 0.8, 0.1, 7);
        let b = random_clustered_graph(20, 3, 0.8, 0.1, 7);
        let edges = |g: &UnGraph<(), ()>| -> Vec<_> { g.edge_indices().filter_map(|e| g.edge_endpoints(e)).collect() };
        assert_eq!(edges(&a), edges(&b));
        assert_eq!(random_clustered_graph(5, 5, 1.0, 0.0, 1).edge_count(), 0);
        assert_eq!(random_clustered_graph(5, 1, 1.0, 0.0, 1).edge_count(), 10);
    }
}
