use crate::Id;

/// The result of unioning two ids.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UnionResult {
    /// The ids were already in the same set, led by this root.
    SameSet(Id),
    /// Two distinct sets were unioned.
    Unioned {
        /// The surviving root.
        to: Id,
        /// The root that was absorbed.
        from: Id,
    },
}

/// A disjoint-set over [`Id`]s with union-by-rank and path compression.
///
/// Only the equivalence relation lives here; class payloads are kept by
/// the [`EGraph`](crate::EGraph).
#[derive(Debug, Clone, Default)]
pub struct UnionFind {
    parents: Vec<Id>,
    ranks: Vec<u8>,
}

impl UnionFind {
    /// Creates a new set with a single element, returning its id.
    pub fn make_set(&mut self) -> Id {
        let id = Id::from(self.parents.len());
        self.parents.push(id);
        self.ranks.push(0);
        id
    }

    /// Returns the number of elements in the union-find.
    pub fn size(&self) -> usize {
        self.parents.len()
    }

    fn parent(&self, query: Id) -> Id {
        self.parents[usize::from(query)]
    }

    fn parent_mut(&mut self, query: Id) -> &mut Id {
        &mut self.parents[usize::from(query)]
    }

    /// Finds the leader of the set that `current` is in.
    pub fn find(&self, mut current: Id) -> Id {
        while current != self.parent(current) {
            current = self.parent(current)
        }
        current
    }

    /// Finds the leader of the set that `current` is in,
    /// compressing the path along the way.
    pub fn find_mut(&mut self, mut current: Id) -> Id {
        let mut collected = vec![];
        while current != self.parent(current) {
            collected.push(current);
            current = self.parent(current);
        }
        for c in collected {
            *self.parent_mut(c) = current;
        }
        current
    }

    /// Unions the sets containing the two given ids, choosing the
    /// surviving root by rank.
    pub fn union(&mut self, a: Id, b: Id) -> UnionResult {
        let root_a = self.find_mut(a);
        let root_b = self.find_mut(b);
        if root_a == root_b {
            return UnionResult::SameSet(root_a);
        }

        let rank_a = self.ranks[usize::from(root_a)];
        let rank_b = self.ranks[usize::from(root_b)];
        let (to, from) = if rank_a < rank_b {
            (root_b, root_a)
        } else {
            (root_a, root_b)
        };

        *self.parent_mut(from) = to;
        if rank_a == rank_b {
            self.ranks[usize::from(to)] += 1;
        }
        UnionResult::Unioned { to, from }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_find() {
        let n = 10;
        let id = Id::from;

        let mut uf = UnionFind::default();
        for _ in 0..n {
            uf.make_set();
        }

        // test the initial condition of everyone in their own set
        assert_eq!(uf.parents, (0..n).map(id).collect::<Vec<_>>());

        // build up one set
        assert_eq!(
            uf.union(id(0), id(1)),
            UnionResult::Unioned {
                to: id(0),
                from: id(1)
            }
        );
        uf.union(id(0), id(2));
        uf.union(id(0), id(3));

        // build up another set
        uf.union(id(6), id(7));
        uf.union(id(8), id(9));
        uf.union(id(6), id(8));

        // unioning within a set is a no-op
        assert_eq!(uf.union(id(0), id(3)), UnionResult::SameSet(id(0)));

        // this should compress all paths
        for i in 0..n {
            uf.find_mut(id(i));
        }

        // indexes:         0, 1, 2, 3, 4, 5, 6, 7, 8, 9
        let expected = [0, 0, 0, 0, 4, 5, 6, 6, 6, 6];
        let expected: Vec<Id> = expected.iter().map(|&i| id(i)).collect();
        assert_eq!(uf.parents, expected);

        for i in 0..n {
            assert_eq!(uf.find(id(i)), uf.parents[i]);
        }
    }

    #[test]
    fn rank_picks_survivor() {
        let id = Id::from;
        let mut uf = UnionFind::default();
        for _ in 0..4 {
            uf.make_set();
        }

        // 0 gains rank 1, so it survives the union with the fresh root 2
        uf.union(id(0), id(1));
        assert_eq!(
            uf.union(id(2), id(0)),
            UnionResult::Unioned {
                to: id(0),
                from: id(2)
            }
        );
        assert_eq!(uf.find(id(2)), id(0));
    }
}
