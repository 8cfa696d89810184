use std::collections::{BTreeMap, HashSet};

use crate::graph::{Graph, VertexIndex};
use crate::partition::groups;
use crate::union_find::UnionFind;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EditKind {
    Insertion,
    Deletion,
}

/// A single edge insertion or deletion with `u < v`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Edit {
    pub u: VertexIndex,
    pub v: VertexIndex,
    pub kind: EditKind,
}

/// The edits that turn `graph` into the disjoint union of cliques given by
/// `assignment`, ordered by endpoints.
pub fn modifications(graph: &Graph, assignment: &[usize]) -> Vec<Edit> {
    assert_eq!(graph.node_count(), assignment.len());
    let mut edits: Vec<Edit> = graph
        .edges()
        .filter(|(u, v)| assignment[u.index()] != assignment[v.index()])
        .map(|(u, v)| Edit { u, v, kind: EditKind::Deletion })
        .collect();
    for group in groups(assignment) {
        for (i, &u) in group.iter().enumerate() {
            for &v in &group[i + 1..] {
                if !graph.has_edge(u, v) {
                    edits.push(Edit { u, v, kind: EditKind::Insertion });
                }
            }
        }
    }
    edits.sort_unstable();
    edits
}

/// Summary of a solution: cluster sizes and edit counts.
#[derive(Clone, Debug, PartialEq)]
pub struct EditStats {
    pub clusters: usize,
    pub min_cluster_size: usize,
    pub max_cluster_size: usize,
    pub avg_cluster_size: f64,
    pub stddev_cluster_size: f64,
    pub insertions: usize,
    pub deletions: usize,
    pub modifications: usize,
    /// Cluster size to number of clusters of that size.
    pub size_distribution: BTreeMap<usize, usize>,
}

impl EditStats {
    pub fn from_partition(graph: &Graph, assignment: &[usize]) -> Self {
        let sizes: Vec<usize> = groups(assignment).iter().map(Vec::len).collect();
        Self::new(&sizes, &modifications(graph, assignment))
    }

    /// Applies `edits` to `graph` and reads the clusters off the connected
    /// components of the result.
    pub fn from_edits(graph: &Graph, edits: &[Edit]) -> Self {
        let mut edges: HashSet<(VertexIndex, VertexIndex)> = graph.edges().collect();
        for edit in edits {
            let pair = (edit.u.min(edit.v), edit.u.max(edit.v));
            match edit.kind {
                EditKind::Insertion => edges.insert(pair),
                EditKind::Deletion => edges.remove(&pair),
            };
        }
        let mut uf = UnionFind::new(graph.node_count());
        for (u, v) in edges {
            uf.union(u.index(), v.index());
        }
        let sizes: Vec<usize> = groups(&uf.labels()).iter().map(Vec::len).collect();
        Self::new(&sizes, edits)
    }

    fn new(sizes: &[usize], edits: &[Edit]) -> Self {
        let mut sizes = sizes.to_vec();
        sizes.sort_unstable();
        let insertions = edits.iter().filter(|e| e.kind == EditKind::Insertion).count();
        let deletions = edits.len() - insertions;
        let clusters = sizes.len();
        let avg = if clusters == 0 { 0.0 } else { sizes.iter().sum::<usize>() as f64 / clusters as f64 };
        let variance = if clusters == 0 {
            0.0
        } else {
            sizes.iter().map(|&s| (s as f64 - avg).powi(2)).sum::<f64>() / clusters as f64
        };
        let mut size_distribution = BTreeMap::new();
        for &s in &sizes {
            *size_distribution.entry(s).or_insert(0) += 1;
        }
        Self {
            clusters,
            min_cluster_size: sizes.iter().copied().min().unwrap_or(0),
            max_cluster_size: sizes.iter().copied().max().unwrap_or(0),
            avg_cluster_size: avg,
            stddev_cluster_size: variance.sqrt(),
            insertions,
            deletions,
            modifications: edits.len(),
            size_distribution,
        }
    }
}
