use std::collections::HashMap;

use tracing::{info, instrument};

use crate::graph::{Graph, VertexIndex};
use crate::partition::normalize;

/// A contracted graph together with the mapping back to the original vertices.
///
/// Each kernel vertex stands for a group of original vertices and carries the
/// total weight of the group. A partition of the kernel expands to a partition
/// of the original graph whose cost is the kernel cost plus [`Kernel::offset`].
#[derive(Clone, Debug)]
pub struct Kernel {
    graph: Graph,
    groups: Vec<Vec<VertexIndex>>,
    offset: i64,
    original_count: usize,
}

impl Kernel {
    /// The graph itself, every vertex its own group.
    pub fn identity(graph: &Graph) -> Self {
        Self {
            graph: graph.clone(),
            groups: graph.vertices().map(|v| vec![v]).collect(),
            offset: 0,
            original_count: graph.node_count(),
        }
    }

    /// Contracts critical cliques, i.e. classes of vertices with identical
    /// closed neighborhoods. Some optimal solution keeps every such class
    /// together, so the optimum is preserved.
    ///
    /// With `false_twins`, vertices that are alone in their class and share
    /// their open neighborhood with others are contracted as well. Their
    /// missing internal pairs become the offset. This forces them into one
    /// cluster and may lose optimality.
    #[instrument(skip_all)]
    pub fn critical_cliques(graph: &Graph, false_twins: bool) -> Self {
        let n = graph.node_count();
        let mut class_of = vec![usize::MAX; n];
        let mut groups: Vec<Vec<VertexIndex>> = vec![];

        let mut closed: HashMap<Vec<VertexIndex>, usize> = HashMap::new();
        for v in graph.vertices() {
            let mut key = graph.neighbors(v).to_vec();
            let pos = key.partition_point(|&u| u < v);
            key.insert(pos, v);
            let class = *closed.entry(key).or_insert_with(|| {
                groups.push(vec![]);
                groups.len() - 1
            });
            groups[class].push(v);
            class_of[v.index()] = class;
        }

        let mut offset = 0;
        if false_twins {
            let mut open: HashMap<&[VertexIndex], usize> = HashMap::new();
            let mut merged: Vec<Vec<VertexIndex>> = vec![];
            let mut target = vec![usize::MAX; groups.len()];
            for (class, group) in groups.iter().enumerate() {
                let v = group[0];
                if group.len() > 1 || graph.degree(v) == 0 {
                    target[class] = merged.len();
                    merged.push(group.clone());
                    continue;
                }
                let t = *open.entry(graph.neighbors(v)).or_insert_with(|| {
                    merged.push(vec![]);
                    merged.len() - 1
                });
                merged[t].push(v);
                target[class] = t;
            }
            // True-twin classes are cliques; only contracted false twins miss pairs.
            for &t in open.values() {
                let group = &merged[t];
                if group.len() > 1 {
                    let (w, s) = group.iter().fold((0, 0), |(w, s), &v| (w + graph.weight(v), s + graph.weight(v).pow(2)));
                    offset += (w * w - s) / 2;
                }
            }
            for class in class_of.iter_mut() {
                *class = target[*class];
            }
            groups = merged;
        }

        let weights: Vec<i64> = groups.iter().map(|g| g.iter().map(|&v| graph.weight(v)).sum()).collect();
        let adjacency: Vec<Vec<VertexIndex>> = groups
            .iter()
            .enumerate()
            .map(|(class, group)| {
                let mut adj: Vec<VertexIndex> = graph
                    .neighbors(group[0])
                    .iter()
                    .map(|u| class_of[u.index()])
                    .filter(|&c| c != class)
                    .map(VertexIndex::new)
                    .collect();
                adj.sort_unstable();
                adj.dedup();
                adj
            })
            .collect();
        let kernel = Graph::from_adjacency(weights, adjacency);
        info!(
            vertices = n,
            edges = graph.edge_count(),
            kernel_vertices = kernel.node_count(),
            kernel_edges = kernel.edge_count(),
            offset
        );
        Self { graph: kernel, groups, offset, original_count: n }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Original vertices of each kernel vertex.
    pub fn groups(&self) -> &[Vec<VertexIndex>] {
        &self.groups
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }

    /// Maps labels of kernel vertices to normalized labels of the original vertices.
    pub fn expand(&self, assignment: &[usize]) -> Vec<usize> {
        assert_eq!(assignment.len(), self.groups.len());
        let mut labels = vec![0; self.original_count];
        for (group, &label) in self.groups.iter().zip(assignment) {
            for &v in group {
                labels[v.index()] = label;
            }
        }
        normalize(labels.into_iter())
    }

    /// Labels of the kernel vertices, if `assignment` never separates a group.
    pub fn restrict(&self, assignment: &[usize]) -> Option<Vec<usize>> {
        assert_eq!(assignment.len(), self.original_count);
        self.groups
            .iter()
            .map(|group| {
                let label = assignment[group[0].index()];
                group.iter().all(|v| assignment[v.index()] == label).then_some(label)
            })
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cluster_graph::partition_cost;
    use common::instances;

    #[test]
    fn clique_contracts_to_one_vertex() {
        let graph = Graph::from_petgraph(&instances::complete_graph(5));
        let kernel = Kernel::critical_cliques(&graph, false);
        assert_eq!(kernel.graph().node_count(), 1);
        assert_eq!(kernel.graph().weights(), [5]);
        assert_eq!(kernel.expand(&[0]), [0; 5]);
    }

    #[test]
    fn bridged_cliques() {
        let graph = Graph::from_petgraph(&instances::bridged_cliques(3, 4));
        let kernel = Kernel::critical_cliques(&graph, false);
        // {0, 1}, {2}, {3}, {4, 5, 6}
        assert_eq!(kernel.graph().node_count(), 4);
        assert_eq!(kernel.graph().weights(), [2, 1, 1, 3]);
        assert_eq!(kernel.graph().edge_count(), 3);
        assert_eq!(kernel.offset(), 0);
        let kernel_assignment = [0, 0, 1, 1];
        let expanded = kernel.expand(&kernel_assignment);
        assert_eq!(expanded, [0, 0, 0, 1, 1, 1, 1]);
        assert_eq!(partition_cost(kernel.graph(), &kernel_assignment), partition_cost(&graph, &expanded));

        assert_eq!(kernel.restrict(&expanded), Some(vec![0, 0, 1, 1]));
        assert_eq!(kernel.restrict(&[0, 1, 0, 0, 1, 1, 1]), None);
    }

    #[test]
    fn isolated_vertices_stay_apart() {
        let graph = Graph::from_edges(4, [(0, 1)]);
        let kernel = Kernel::critical_cliques(&graph, true);
        assert_eq!(kernel.graph().node_count(), 3);
        assert_eq!(kernel.expand(&[0, 1, 2]), [0, 0, 1, 2]);
    }

    #[test]
    fn false_twins_of_star() {
        let graph = Graph::from_petgraph(&instances::star_graph(3));
        assert_eq!(Kernel::critical_cliques(&graph, false).graph().node_count(), 4);

        let kernel = Kernel::critical_cliques(&graph, true);
        assert_eq!(kernel.graph().node_count(), 2);
        assert_eq!(kernel.graph().weights(), [1, 3]);
        assert_eq!(kernel.offset(), 3);
        let expanded = kernel.expand(&[0, 1]);
        assert_eq!(expanded, [0, 1, 1, 1]);
        assert_eq!(partition_cost(kernel.graph(), &[0, 1]) + kernel.offset(), partition_cost(&graph, &expanded));
    }

    #[test]
    fn true_twins_add_no_offset() {
        let graph = Graph::from_petgraph(&instances::bridged_cliques(3, 4));
        let kernel = Kernel::critical_cliques(&graph, true);
        assert_eq!(kernel.graph().node_count(), 4);
        assert_eq!(kernel.offset(), 0);

        // leaves 1, 2, 3 are false twins, {4, 5, 6} a clique hanging off the center
        let graph = Graph::from_edges(7, [(0, 1), (0, 2), (0, 3), (0, 4), (0, 5), (0, 6), (4, 5), (4, 6), (5, 6)]);
        let kernel = Kernel::critical_cliques(&graph, true);
        assert_eq!(kernel.graph().weights(), [1, 3, 3]);
        assert_eq!(kernel.offset(), 3);
        for assignment in [[0, 1, 2], [0, 0, 0], [0, 1, 0], [0, 0, 1]] {
            let expanded = kernel.expand(&assignment);
            assert_eq!(partition_cost(kernel.graph(), &assignment) + kernel.offset(), partition_cost(&graph, &expanded));
        }
        assert_eq!(partition_cost(&graph, &kernel.expand(&[0, 1, 0])), 6);
    }

    #[test]
    fn expansion_covers_every_vertex_once() {
        let graph = Graph::from_petgraph(&instances::random_clustered_graph(50, 7, 0.9, 0.02, 5));
        for false_twins in [false, true] {
            let kernel = Kernel::critical_cliques(&graph, false_twins);
            let mut seen = vec![0; graph.node_count()];
            for group in kernel.groups() {
                for v in group {
                    seen[v.index()] += 1;
                }
            }
            assert!(seen.iter().all(|&count| count == 1));
            let total: i64 = kernel.graph().weights().iter().sum();
            assert_eq!(total, graph.total_weight());

            let assignment: Vec<usize> = (0..kernel.graph().node_count()).map(|i| i % 3).collect();
            let expanded = kernel.expand(&assignment);
            assert_eq!(
                partition_cost(kernel.graph(), &assignment) + kernel.offset(),
                partition_cost(&graph, &expanded)
            );
        }
    }
}
