use crate::graph::VertexIndex;
use crate::index::make_index;

make_index!(pub ClusterIndex);

/// A total assignment of vertices to clusters.
///
/// Every vertex belongs to exactly one cluster. There are `n + SPARE_CLUSTERS`
/// cluster slots, so at least [`Partition::SPARE_CLUSTERS`] slots are empty at
/// any time and a move can always open that many fresh clusters.
///
/// Members of a cluster are kept in an unordered list with back-pointers, the
/// empty slots in an indexed set. Relocating a vertex is `O(1)`.
#[derive(Clone, Debug)]
pub struct Partition {
    cluster_of: Vec<ClusterIndex>,
    position: Vec<u32>,
    members: Vec<Vec<VertexIndex>>,
    empty: Vec<ClusterIndex>,
    empty_position: Vec<u32>,
}

const NOT_EMPTY: u32 = u32::MAX;

impl Partition {
    /// Number of cluster slots beyond the number of vertices.
    pub const SPARE_CLUSTERS: usize = 2;

    /// Every vertex in its own cluster.
    pub fn singletons(n: usize) -> Self {
        let assignment: Vec<usize> = (0..n).collect();
        Self::from_assignment(&assignment)
    }

    /// Creates a partition from arbitrary cluster labels. Vertex `v` is put
    /// into the cluster labeled `assignment[v]`. Labels are compacted in order
    /// of first appearance.
    pub fn from_assignment(assignment: &[usize]) -> Self {
        let n = assignment.len();
        let labels = normalize(assignment.iter().copied());
        let bound = n + Self::SPARE_CLUSTERS;

        let mut cluster_of = Vec::with_capacity(n);
        let mut position = Vec::with_capacity(n);
        let mut members: Vec<Vec<VertexIndex>> = vec![vec![]; bound];
        for (v, &label) in labels.iter().enumerate() {
            cluster_of.push(ClusterIndex::new(label));
            position.push(members[label].len() as u32);
            members[label].push(VertexIndex::new(v));
        }

        let mut empty = vec![];
        let mut empty_position = vec![NOT_EMPTY; bound];
        for (c, m) in members.iter().enumerate() {
            if m.is_empty() {
                empty_position[c] = empty.len() as u32;
                empty.push(ClusterIndex::new(c));
            }
        }
        Self { cluster_of, position, members, empty, empty_position }
    }

    #[inline(always)]
    pub fn vertex_count(&self) -> usize {
        self.cluster_of.len()
    }

    /// Upper bound on cluster indices.
    #[inline(always)]
    pub fn cluster_bound(&self) -> usize {
        self.members.len()
    }

    /// Number of non-empty clusters.
    #[inline(always)]
    pub fn cluster_count(&self) -> usize {
        self.members.len() - self.empty.len()
    }

    #[inline(always)]
    pub fn cluster_of(&self, v: VertexIndex) -> ClusterIndex {
        self.cluster_of[v.index()]
    }

    #[inline(always)]
    pub fn members(&self, c: ClusterIndex) -> &[VertexIndex] {
        &self.members[c.index()]
    }

    #[inline(always)]
    pub fn size(&self, c: ClusterIndex) -> usize {
        self.members[c.index()].len()
    }

    #[inline(always)]
    pub fn is_empty_cluster(&self, c: ClusterIndex) -> bool {
        self.members[c.index()].is_empty()
    }

    /// Non-empty clusters in increasing index order.
    pub fn clusters(&self) -> impl Iterator<Item = ClusterIndex> + '_ {
        ClusterIndex::range(self.cluster_bound()).filter(|c| !self.is_empty_cluster(*c))
    }

    /// Currently empty cluster slots. Never has fewer than `SPARE_CLUSTERS` entries.
    pub fn empty_clusters(&self) -> &[ClusterIndex] {
        &self.empty
    }

    /// Moves `v` into `target` and returns its previous cluster.
    pub(crate) fn relocate(&mut self, v: VertexIndex, target: ClusterIndex) -> ClusterIndex {
        assert!(target.index() < self.cluster_bound(), "invalid cluster {target}");
        let source = self.cluster_of[v.index()];
        if source == target {
            return source;
        }

        let pos = self.position[v.index()] as usize;
        let list = &mut self.members[source.index()];
        list.swap_remove(pos);
        if let Some(&moved) = list.get(pos) {
            self.position[moved.index()] = pos as u32;
        }
        if list.is_empty() {
            self.mark_empty(source);
        }

        if self.members[target.index()].is_empty() {
            self.unmark_empty(target);
        }
        self.position[v.index()] = self.members[target.index()].len() as u32;
        self.members[target.index()].push(v);
        self.cluster_of[v.index()] = target;
        source
    }

    fn mark_empty(&mut self, c: ClusterIndex) {
        debug_assert_eq!(self.empty_position[c.index()], NOT_EMPTY);
        self.empty_position[c.index()] = self.empty.len() as u32;
        self.empty.push(c);
    }

    fn unmark_empty(&mut self, c: ClusterIndex) {
        let pos = self.empty_position[c.index()] as usize;
        debug_assert_ne!(pos as u32, NOT_EMPTY);
        self.empty.swap_remove(pos);
        if let Some(&moved) = self.empty.get(pos) {
            self.empty_position[moved.index()] = pos as u32;
        }
        self.empty_position[c.index()] = NOT_EMPTY;
    }

    /// Cluster labels `0..k`, numbered in order of their smallest vertex.
    ///
    /// Two partitions that group the vertices the same way have equal
    /// assignments.
    pub fn assignment(&self) -> Vec<usize> {
        normalize(self.cluster_of.iter().map(|c| c.index()))
    }

    /// Checks the internal bookkeeping. Used by tests and debug assertions.
    pub fn check_invariants(&self) -> bool {
        let members_ok = self.cluster_of.iter().enumerate().all(|(v, c)| {
            self.members[c.index()].get(self.position[v] as usize) == Some(&VertexIndex::new(v))
        });
        let total: usize = self.members.iter().map(Vec::len).sum();
        let empty_ok = ClusterIndex::range(self.cluster_bound()).all(|c| {
            let marked = self.empty_position[c.index()] != NOT_EMPTY;
            marked == self.is_empty_cluster(c)
                && (!marked || self.empty[self.empty_position[c.index()] as usize] == c)
        });
        members_ok && total == self.vertex_count() && empty_ok && self.empty.len() >= Self::SPARE_CLUSTERS
    }
}

/// Relabels arbitrary labels to `0..k` in order of first appearance.
pub(crate) fn normalize(labels: impl Iterator<Item = usize>) -> Vec<usize> {
    let mut map = std::collections::HashMap::new();
    labels
        .map(|label| {
            let next = map.len();
            *map.entry(label).or_insert(next)
        })
        .collect()
}

/// Groups vertices by label. Groups are ordered by label, vertices within a
/// group increasingly.
pub fn groups(assignment: &[usize]) -> Vec<Vec<VertexIndex>> {
    let k = assignment.iter().map(|&c| c + 1).max().unwrap_or(0);
    let mut groups = vec![vec![]; k];
    for (v, &c) in assignment.iter().enumerate() {
        groups[c].push(VertexIndex::new(v));
    }
    groups.retain(|g| !g.is_empty());
    groups
}

#[cfg(test)]
mod test {
    use super::*;

    fn v(i: usize) -> VertexIndex {
        VertexIndex::new(i)
    }

    #[test]
    fn singletons() {
        let p = Partition::singletons(4);
        assert_eq!(p.cluster_count(), 4);
        assert_eq!(p.cluster_bound(), 6);
        assert_eq!(p.empty_clusters().len(), 2);
        assert_eq!(p.assignment(), [0, 1, 2, 3]);
        assert!(p.check_invariants());
    }

    #[test]
    fn empty_partition() {
        let p = Partition::singletons(0);
        assert_eq!(p.cluster_count(), 0);
        assert_eq!(p.assignment(), Vec::<usize>::new());
        assert!(p.check_invariants());
    }

    #[test]
    fn from_assignment_compacts_labels() {
        let p = Partition::from_assignment(&[7, 3, 7, 100]);
        assert_eq!(p.cluster_count(), 3);
        assert_eq!(p.assignment(), [0, 1, 0, 2]);
        assert_eq!(p.members(p.cluster_of(v(0))), [v(0), v(2)]);
    }

    #[test]
    fn relocate() {
        let mut p = Partition::singletons(3);
        let c0 = p.cluster_of(v(0));
        let c1 = p.cluster_of(v(1));
        assert_eq!(p.relocate(v(1), c0), c1);
        assert!(p.is_empty_cluster(c1));
        assert_eq!(p.size(c0), 2);
        assert_eq!(p.assignment(), [0, 0, 1]);
        assert!(p.check_invariants());

        let fresh = p.empty_clusters()[0];
        p.relocate(v(0), fresh);
        assert_eq!(p.assignment(), [0, 1, 2]);
        assert_eq!(p.clusters().count(), 3);
        assert!(p.check_invariants());
    }

    #[test]
    fn groups_by_label() {
        let groups = groups(&[1, 0, 1, 2]);
        assert_eq!(groups, [vec![v(1)], vec![v(0), v(2)], vec![v(3)]]);
    }
}
