use std::fmt::{self, Debug};
use std::iter::ExactSizeIterator;

use crate::{Id, Language};

/// An equivalence class of e-nodes.
///
/// An [`EClass`] is a set of member nodes known to represent equal
/// terms, the analysis [`data`](EClass::data) for the class, and the
/// parent index used to repair congruence upward on merges.
#[non_exhaustive]
#[derive(Clone)]
pub struct EClass<L, D> {
    /// This eclass's id.
    pub id: Id,
    /// The equivalent enodes in this equivalence class.
    pub nodes: Vec<L>,
    /// The analysis data associated with this eclass.
    pub data: D,
    /// The enodes mentioning this eclass among their operands, paired
    /// with the id of the class containing them. Entries may be stale
    /// between rebuilds; repair deduplicates them.
    pub(crate) parents: Vec<(L, Id)>,
}

impl<L: Debug, D: Debug> Debug for EClass<L, D> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("EClass")
            .field("id", &self.id)
            .field("nodes", &self.nodes)
            .field("data", &self.data)
            .field("parents", &self.parents)
            .finish()
    }
}

impl<L, D> EClass<L, D> {
    /// Returns `true` if the `eclass` is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the number of enodes in this eclass.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Iterates over the enodes in this eclass.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &L> {
        self.nodes.iter()
    }

    /// Iterates over the parent enodes and the classes containing them.
    pub fn parents(&self) -> impl ExactSizeIterator<Item = (&L, Id)> {
        self.parents.iter().map(|(node, id)| (node, *id))
    }
}

impl<L: Language, D> EClass<L, D> {
    /// Iterates over the childless enodes in this eclass.
    pub fn leaves(&self) -> impl Iterator<Item = &L> {
        self.nodes.iter().filter(|&n| n.is_leaf())
    }

    /// Asserts that the childless enodes in this eclass are unique.
    pub fn assert_unique_leaves(&self) {
        let mut leaves = self.leaves();
        if let Some(first) = leaves.next() {
            assert!(
                leaves.all(|l| l == first),
                "Different leaves in eclass {}: {:?}",
                self.id,
                self.leaves().collect::<indexmap::IndexSet<_>>()
            );
        }
    }
}
