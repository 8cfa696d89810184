/// Disjoint sets over `0..n` with union by size and path halving.
#[derive(Clone, Debug)]
pub struct UnionFind {
    parent: Vec<u32>,
    size: Vec<u32>,
    sets: usize,
}

impl UnionFind {
    pub fn new(n: usize) -> Self {
        Self { parent: (0..n as u32).collect(), size: vec![1; n], sets: n }
    }

    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Number of disjoint sets.
    pub fn set_count(&self) -> usize {
        self.sets
    }

    pub fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] as usize != x {
            let grandparent = self.parent[self.parent[x] as usize];
            self.parent[x] = grandparent;
            x = grandparent as usize;
        }
        x
    }

    /// Merges the sets of `a` and `b`. Returns `false` if they were already joined.
    pub fn union(&mut self, a: usize, b: usize) -> bool {
        let (mut a, mut b) = (self.find(a), self.find(b));
        if a == b {
            return false;
        }
        if self.size[a] < self.size[b] {
            std::mem::swap(&mut a, &mut b);
        }
        self.parent[b] = a as u32;
        self.size[a] += self.size[b];
        self.sets -= 1;
        true
    }

    pub fn same(&mut self, a: usize, b: usize) -> bool {
        self.find(a) == self.find(b)
    }

    /// Size of the set containing `x`.
    pub fn set_size(&mut self, x: usize) -> usize {
        let root = self.find(x);
        self.size[root] as usize
    }

    /// Set labels `0..k`, numbered in order of their smallest element.
    pub fn labels(&mut self) -> Vec<usize> {
        let roots: Vec<usize> = (0..self.len()).map(|x| self.find(x)).collect();
        crate::partition::normalize(roots.into_iter())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn union_and_find() {
        let mut uf = UnionFind::new(6);
        assert_eq!(uf.set_count(), 6);
        assert!(uf.union(0, 3));
        assert!(uf.union(4, 3));
        assert!(!uf.union(0, 4));
        assert!(uf.union(1, 2));
        assert!(uf.same(0, 4));
        assert!(!uf.same(0, 1));
        assert_eq!(uf.set_count(), 3);
        assert_eq!(uf.set_size(4), 3);
        assert_eq!(uf.labels(), [0, 1, 1, 0, 0, 2]);
    }

    #[test]
    fn find_halves_paths() {
        let mut uf = UnionFind::new(5);
        // chain 0 -> 1 -> 2 -> 3 -> 4
        uf.parent = vec![1, 2, 3, 4, 4];
        assert_eq!(uf.find(0), 4);
        assert_eq!(uf.parent, [2, 2, 4, 4, 4]);
        assert_eq!(uf.find(0), 4);
        assert_eq!(uf.parent, [4, 2, 4, 4, 4]);
    }

    #[test]
    fn empty() {
        let mut uf = UnionFind::new(0);
        assert!(uf.is_empty());
        assert_eq!(uf.labels(), Vec::<usize>::new());
    }
}
