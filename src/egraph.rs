use std::borrow::BorrowMut;
use std::fmt::{self, Debug};

use log::*;

use crate::{
    util::{concat_vecs, HashMap, IndexMap, Instant},
    Analysis, EClass, Id, Language, UnionFind, UnionResult,
};

/** A data structure to keep track of equalities between terms.

An e-graph is a set of eclasses ([`EClass`]), each of which contains
equivalent enodes. An enode is a node of a user-defined [`Language`]
whose operands are eclass ids rather than other nodes.

# Invariants and Rebuilding

An egraph has two core operations that modify it: [`add`], which adds
enodes, and [`merge`], which merges two eclasses. These operations
maintain two related invariants:

1. **Uniqueness of enodes**

   There do not exist two distinct enodes with equal discriminants and
   equal canonical operands, either in the same eclass or different
   eclasses. This is maintained in part by the hashconsing performed by
   [`add`], and by deduplication performed by [`rebuild`].

2. **Congruence closure**

   The egraph maintains not just an equivalence relation over terms,
   but a congruence relation. So as the user calls [`merge`], many
   eclasses other than the given two may need to merge to maintain
   congruence.

`eqsat` takes a delayed approach to maintaining these invariants: the
effects of calling [`merge`] may not be reflected immediately, and the
user *must* call [`rebuild`] to restore them. Between a [`merge`] and
the next [`rebuild`], [`find`] is authoritative for union membership,
but two congruent classes may still be distinct.

The same holds for the per-class [`Analysis`] data: [`rebuild`]
propagates data changes upward through the parent index until a fixed
point, after which every class's data is the join of
[`make`](Analysis::make) over its members.

[`add`]: EGraph::add
[`merge`]: EGraph::merge
[`find`]: EGraph::find
[`rebuild`]: EGraph::rebuild
**/
pub struct EGraph<L: Language, N: Analysis<L>> {
    /// The `Analysis` given when creating this `EGraph`.
    pub analysis: N,
    memo: HashMap<L, Id>,
    unionfind: UnionFind,
    classes: SparseVec<EClass<L, N::Data>>,
    /// Worklist of class ids whose parents need repair.
    dirty_unions: Vec<Id>,
    repairs_since_rebuild: usize,
}

type SparseVec<T> = Vec<Option<Box<T>>>;

impl<L: Language, N: Analysis<L> + Default> Default for EGraph<L, N> {
    fn default() -> Self {
        Self::new(N::default())
    }
}

// manual debug impl to avoid bounds on the analysis itself
impl<L: Language, N: Analysis<L>> Debug for EGraph<L, N> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("EGraph")
            .field("memo", &self.memo)
            .field("classes", &self.classes)
            .finish()
    }
}

impl<L: Language, N: Analysis<L>> EGraph<L, N> {
    /// Creates a new, empty `EGraph` with the given `Analysis`.
    pub fn new(analysis: N) -> Self {
        Self {
            analysis,
            memo: Default::default(),
            unionfind: Default::default(),
            classes: Default::default(),
            dirty_unions: Default::default(),
            repairs_since_rebuild: 0,
        }
    }

    /// Returns an iterator over the canonical eclasses in the egraph.
    pub fn classes(&self) -> impl Iterator<Item = &EClass<L, N::Data>> {
        self.classes
            .iter()
            .filter_map(Option::as_ref)
            .map(AsRef::as_ref)
    }

    /// Returns a mutating iterator over the canonical eclasses in the
    /// egraph.
    pub fn classes_mut(&mut self) -> impl Iterator<Item = &mut EClass<L, N::Data>> {
        self.classes
            .iter_mut()
            .filter_map(Option::as_mut)
            .map(AsMut::as_mut)
    }

    /// Returns `true` if the egraph is empty.
    ///
    /// # Example
    /// ```
    /// use eqsat::*;
    ///
    /// define_atom! { pub struct Sym(pub Symbol); }
    /// define_language! { pub enum Lang { Sym(Sym), } }
    ///
    /// let mut egraph = EGraph::<Lang, ()>::default();
    /// assert!(egraph.is_empty());
    /// egraph.add(Sym(Symbol::from("foo")).into());
    /// assert!(!egraph.is_empty());
    /// ```
    pub fn is_empty(&self) -> bool {
        self.memo.is_empty()
    }

    /// Returns the number of canonical eclasses in the egraph.
    pub fn size(&self) -> usize {
        self.classes().count()
    }

    /// Returns the number of enodes in the `EGraph`.
    ///
    /// Actually returns the size of the hashcons index.
    ///
    /// # Example
    /// ```
    /// use eqsat::*;
    ///
    /// define_atom! { pub struct Sym(pub Symbol); }
    /// define_language! { pub enum Lang { Sym(Sym), } }
    ///
    /// let mut egraph = EGraph::<Lang, ()>::default();
    /// let x = egraph.add(Sym(Symbol::from("x")).into());
    /// let y = egraph.add(Sym(Symbol::from("y")).into());
    /// // only one eclass after the merge, but both enodes remain
    /// egraph.merge(x, y);
    /// egraph.rebuild();
    ///
    /// assert_eq!(egraph.total_size(), 2);
    /// assert_eq!(egraph.size(), 1);
    /// ```
    pub fn total_size(&self) -> usize {
        self.memo.len()
    }

    /// Iterates over the classes, returning the total number of nodes.
    pub fn total_number_of_nodes(&self) -> usize {
        self.classes().map(|c| c.len()).sum()
    }

    /// Canonicalizes an eclass id.
    ///
    /// This corresponds to the `find` operation on the egraph's
    /// underlying unionfind data structure. Non-canonical ids remain
    /// valid handles forever; `find` resolves them to the current
    /// canonical id.
    pub fn find(&self, id: Id) -> Id {
        self.unionfind.find(id)
    }

    /// Lookup the eclass of the given enode.
    ///
    /// You can pass in either an owned enode or a `&mut` enode, in
    /// which case the enode's operands will be canonicalized.
    pub fn lookup<B>(&self, mut enode: B) -> Option<Id>
    where
        B: BorrowMut<L>,
    {
        let enode = enode.borrow_mut();
        enode.update_operands(|id| self.find(id));
        self.memo.get(enode).map(|&id| self.find(id))
    }

    /// Returns a more debug-able representation of the egraph.
    ///
    /// [`EGraph`]s implement [`Debug`], but it ain't pretty. It prints
    /// a lot of stuff you probably don't care about. This method
    /// returns a wrapper that implements [`Debug`] in a slightly nicer
    /// way, just dumping enodes in each eclass.
    pub fn dump(&self) -> impl Debug + '_ {
        EGraphDump(self)
    }
}

impl<L: Language, N: Analysis<L>> std::ops::Index<Id> for EGraph<L, N> {
    type Output = EClass<L, N::Data>;
    fn index(&self, id: Id) -> &Self::Output {
        let id = self.find(id);
        self.classes[usize::from(id)]
            .as_ref()
            .unwrap_or_else(|| panic!("Invalid id {}", id))
    }
}

impl<L: Language, N: Analysis<L>> std::ops::IndexMut<Id> for EGraph<L, N> {
    fn index_mut(&mut self, id: Id) -> &mut Self::Output {
        let id = self.find(id);
        self.classes[usize::from(id)]
            .as_mut()
            .unwrap_or_else(|| panic!("Invalid id {}", id))
    }
}

impl<L: Language, N: Analysis<L>> EGraph<L, N> {
    /// Adds an enode to the [`EGraph`].
    ///
    /// When adding an enode, [`add`] performs _hashconsing_ (sometimes
    /// called interning in other contexts): if a structurally equal
    /// enode (modulo [`find`] on the operands) is already present,
    /// [`add`] simply returns the id of the eclass in which it was
    /// found. Otherwise a fresh single-member class is created, its
    /// analysis data is [`make`](Analysis::make)d, and the enode is
    /// registered in the parent list of each operand's class.
    ///
    /// Operand ids must come from this egraph; an out-of-range id is a
    /// programming error and aborts.
    ///
    /// [`add`]: EGraph::add
    /// [`find`]: EGraph::find
    pub fn add(&mut self, mut enode: L) -> Id {
        debug_assert!(
            enode.all(|id| usize::from(id) < self.unionfind.size()),
            "enode {:?} has operands not in this egraph",
            enode
        );

        if let Some(existing) = self.lookup(&mut enode) {
            trace!("Adding *{:4}: {:?}", existing, enode);
            return existing;
        }

        let id = self.unionfind.make_set();
        trace!("Adding  {:4}: {:?}", id, enode);

        let class = Box::new(EClass {
            id,
            nodes: vec![enode.clone()],
            data: N::make(self, &enode),
            parents: Default::default(),
        });

        // add this enode to the parent lists of its operands
        enode.for_each(|operand| {
            let tup = (enode.clone(), id);
            self[operand].parents.push(tup);
        });

        debug_assert_eq!(self.classes.len(), usize::from(id));
        self.classes.push(Some(class));
        let old = self.memo.insert(enode, id);
        debug_assert!(old.is_none());

        id
    }

    /// Merges two eclasses given their ids, returning the id of the
    /// surviving class.
    ///
    /// The given ids need not be canonical. Merging already-equal
    /// classes is a silent no-op. The merge does **not** eagerly
    /// re-canonicalize the hashcons; congruence is only restored by the
    /// next [`rebuild`](EGraph::rebuild).
    pub fn merge(&mut self, id1: Id, id2: Id) -> Id {
        let (to, from) = match self.unionfind.union(id1, id2) {
            UnionResult::SameSet(id) => return id,
            UnionResult::Unioned { to, from } => (to, from),
        };
        trace!("Merging {} into {}", from, to);

        let from_class = self.classes[usize::from(from)].take().unwrap();
        let to_class = self.classes[usize::from(to)].as_mut().unwrap();
        debug_assert_eq!(to, to_class.id);

        let data_changed = self.analysis.join(&mut to_class.data, from_class.data);
        let parents_grew = !from_class.parents.is_empty();
        concat_vecs(&mut to_class.nodes, from_class.nodes);
        concat_vecs(&mut to_class.parents, from_class.parents);

        // Only enqueue repair work when something upward-facing moved:
        // nodes referencing the absorbed id live in its parent list, and
        // a data change has to reach the parents' `make` results.
        if data_changed || parents_grew {
            self.dirty_unions.push(to);
        }

        to
    }
}

// All the rebuilding stuff
impl<L: Language, N: Analysis<L>> EGraph<L, N> {
    /// Restores the egraph invariants of congruence, enode uniqueness,
    /// and analysis saturation.
    ///
    /// As mentioned [above](EGraph#invariants-and-rebuilding), `eqsat`
    /// takes a lazy approach to maintaining the egraph invariants. The
    /// `rebuild` method allows the user to restore those invariants at
    /// a time of their choosing. It's a reasonably fast, linear-ish
    /// traversal through the egraph.
    ///
    /// # Example
    /// ```
    /// use eqsat::*;
    ///
    /// define_atom! { pub struct Sym(pub Symbol); }
    /// define_field! { pub struct Fst; pub struct Snd; }
    /// define_node! { pub struct Pair(Fst, Snd); }
    /// define_language! {
    ///     pub enum Lang { Sym(Sym), Pair(Pair), }
    /// }
    ///
    /// let mut egraph = EGraph::<Lang, ()>::default();
    /// let x = egraph.add(Sym(Symbol::from("x")).into());
    /// let y = egraph.add(Sym(Symbol::from("y")).into());
    /// let a = egraph.add(Sym(Symbol::from("a")).into());
    /// let ax = egraph.add(Pair::new([a, x]).into());
    /// let ay = egraph.add(Pair::new([a, y]).into());
    ///
    /// // The effects of this merge aren't yet visible; ax and ay
    /// // should be equivalent by congruence since x = y.
    /// egraph.merge(x, y);
    /// // Classes: [x y] [ax] [ay] [a]
    /// assert_eq!(egraph.size(), 4);
    /// assert_ne!(egraph.find(ax), egraph.find(ay));
    ///
    /// // Rebuilding restores the invariants, finding the "missing"
    /// // equivalence
    /// egraph.rebuild();
    /// // Classes: [x y] [ax ay] [a]
    /// assert_eq!(egraph.size(), 3);
    /// assert_eq!(egraph.find(ax), egraph.find(ay));
    /// ```
    pub fn rebuild(&mut self) {
        if self.dirty_unions.is_empty() {
            debug!("Skipping rebuild: no pending unions");
            return;
        }

        let old_hc_size = self.memo.len();
        let old_n_eclasses = self.size();

        let start = Instant::now();

        self.process_unions();
        let n_repairs = std::mem::take(&mut self.repairs_since_rebuild);
        let trimmed_nodes = self.rebuild_classes();

        let elapsed = start.elapsed();
        info!(
            concat!(
                "REBUILT! in {}.{:03}s\n",
                "  Old: hc size {}, eclasses: {}\n",
                "  New: hc size {}, eclasses: {}\n",
                "  repairs: {}, trimmed nodes: {}"
            ),
            elapsed.as_secs(),
            elapsed.subsec_millis(),
            old_hc_size,
            old_n_eclasses,
            self.memo.len(),
            self.size(),
            n_repairs,
            trimmed_nodes,
        );

        debug_assert!(self.check_memo());
    }

    #[inline(never)]
    fn process_unions(&mut self) {
        let mut to_union = vec![];

        while !self.dirty_unions.is_empty() {
            // take the worklist, we'll get the stuff that's added the
            // next time around; deduplicate to avoid extra work
            let mut todo = std::mem::take(&mut self.dirty_unions);
            todo.iter_mut()
                .for_each(|id| *id = self.unionfind.find_mut(*id));
            todo.sort_unstable();
            todo.dedup();
            debug_assert!(!todo.is_empty());

            for id in todo {
                self.repairs_since_rebuild += 1;
                let mut parents = std::mem::take(&mut self[id].parents);

                // the parents' hashcons entries were keyed on stale
                // operand ids
                for (n, _) in &parents {
                    self.memo.remove(n);
                }

                parents.iter_mut().for_each(|(n, parent_id)| {
                    n.update_operands(|operand| self.unionfind.find(operand));
                    *parent_id = self.unionfind.find(*parent_id);
                });
                parents.sort_unstable();
                parents.dedup_by(|(n1, e1), (n2, e2)| {
                    n1 == n2 && {
                        to_union.push((*e1, *e2));
                        true
                    }
                });

                for (n, e) in &parents {
                    if let Some(old) = self.memo.insert(n.clone(), *e) {
                        to_union.push((old, *e));
                    }
                }

                self.propagate_data(&parents);
                self[id].parents = parents;
            }

            for (id1, id2) in to_union.drain(..) {
                self.merge(id1, id2);
            }
        }

        debug_assert!(self.dirty_unions.is_empty());
        debug_assert!(to_union.is_empty());
    }

    /// Re-`make`s each parent enode and joins the result into the class
    /// containing it. Classes whose data changed go back on the
    /// worklist so the change keeps flowing upward.
    #[inline(never)]
    fn propagate_data(&mut self, parents: &[(L, Id)]) {
        for (node, id) in parents {
            let id = self.find(*id);
            let node_data = N::make(self, node);
            let class = self.classes[usize::from(id)].as_mut().unwrap();
            if self.analysis.join(&mut class.data, node_data) {
                self.dirty_unions.push(id);
            }
        }
    }

    #[inline(never)]
    fn rebuild_classes(&mut self) -> usize {
        let mut trimmed = 0;

        let uf = &mut self.unionfind;
        for class in self.classes.iter_mut().filter_map(Option::as_mut) {
            let old_len = class.nodes.len();
            class
                .nodes
                .iter_mut()
                .for_each(|n| n.update_operands(|id| uf.find_mut(id)));
            class.nodes.sort_unstable();
            class.nodes.dedup();

            trimmed += old_len - class.nodes.len();
        }

        trimmed
    }

    #[inline(never)]
    fn check_memo(&self) -> bool {
        let mut test_memo = IndexMap::default();

        for (id, class) in self.classes.iter().enumerate() {
            let id = Id::from(id);
            let class = match class.as_ref() {
                Some(class) => class,
                None => continue,
            };
            assert_eq!(class.id, id);
            for node in &class.nodes {
                if let Some(old) = test_memo.insert(node, id) {
                    assert_eq!(
                        self.find(old),
                        self.find(id),
                        "Found unexpected equivalence for {:?}\n{:?}\nvs\n{:?}",
                        node,
                        self[self.find(id)].nodes,
                        self[self.find(old)].nodes,
                    );
                }
            }
        }

        for (n, e) in test_memo {
            assert_eq!(e, self.find(e));
            assert_eq!(
                Some(e),
                self.memo.get(n).map(|id| self.find(*id)),
                "Entry for {:?} at {} in test_memo was incorrect",
                n,
                e
            );
        }

        true
    }
}

struct EGraphDump<'a, L: Language, N: Analysis<L>>(&'a EGraph<L, N>);

impl<'a, L: Language, N: Analysis<L>> Debug for EGraphDump<'a, L, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<Id> = self.0.classes().map(|c| c.id).collect();
        ids.sort();
        for id in ids {
            let mut nodes = self.0[id].nodes.clone();
            nodes.sort();
            writeln!(f, "{}: {:?}", id, nodes)?
        }
        Ok(())
    }
}
