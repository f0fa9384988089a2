use std::fmt::Debug;
use std::hash::Hash;

use crate::{EGraph, Id};

/// A node type usable as a variant of a [`Language`].
///
/// The macros [`define_atom!`](crate::define_atom),
/// [`define_node!`](crate::define_node), and
/// [`define_vector!`](crate::define_vector) implement this for you:
/// atoms have no operands, fielded nodes a fixed number, and vector
/// nodes an arbitrary ordered number.
pub trait Operands: Debug + Clone + Eq + Ord + Hash {
    /// Returns the operand class ids of this node in position order.
    fn operands(&self) -> &[Id];

    /// Returns in-place handles to the operand class ids so they can be
    /// canonicalized. This is the only mutation of a node payload the
    /// language surface permits.
    fn operands_mut(&mut self) -> &mut [Id];
}

/// A field tag naming an operand position of a fixed-arity node.
///
/// Tags are zero-sized types declared with
/// [`define_field!`](crate::define_field); binding a tag to a position
/// happens in [`define_node!`](crate::define_node), so the tag-to-position
/// lookup is closed-world and resolved at compile time.
pub trait FieldOf<N> {
    /// The operand position this tag is bound to in `N`.
    const POSITION: usize;
}

/// Fixed-arity nodes whose operand positions carry field tags.
pub trait Fielded: Operands + Sized {
    /// Returns the operand bound to the field tag `F`.
    fn field<F: FieldOf<Self>>(&self) -> Id {
        self.operands()[F::POSITION]
    }
}

/// A member of a [`Language`]'s closed variant set.
///
/// Implemented by [`define_language!`](crate::define_language) for every
/// variant, along with the matching `From` impl for construction.
pub trait Variant<L: Language>: Operands {
    /// The dense index of this variant within `L`.
    const DISCRIMINANT: usize;

    /// Projects a language value onto this variant.
    fn get(lang: &L) -> Option<&Self>;
}

/// Trait that defines a Language whose terms will be in the
/// [`EGraph`].
///
/// Use [`define_language!`](crate::define_language) to generate an
/// implementation from a closed set of node types. Value equality and
/// hashing combine the variant discriminant with the payload and the
/// operand ids, and nothing else.
#[allow(clippy::len_without_is_empty)]
pub trait Language: Debug + Clone + Eq + Ord + Hash {
    /// Returns the dense index identifying this node's variant.
    fn discriminant(&self) -> usize;

    /// Returns the operand class ids of this e-node.
    fn operands(&self) -> &[Id];

    /// Returns a mutable slice of the operand class ids of this e-node.
    fn operands_mut(&mut self) -> &mut [Id];

    /// Downcasts to a variant, returning `Some` iff the node currently
    /// holds a `T`.
    fn get<T: Variant<Self>>(&self) -> Option<&T> {
        T::get(self)
    }

    /// Runs a given function on each operand `Id`.
    fn for_each<F: FnMut(Id)>(&self, f: F) {
        self.operands().iter().copied().for_each(f)
    }

    /// Runs a given function on each operand `Id`, allowing mutation of
    /// that `Id`.
    fn for_each_mut<F: FnMut(&mut Id)>(&mut self, f: F) {
        self.operands_mut().iter_mut().for_each(f)
    }

    /// Runs a given function to replace the operands.
    fn update_operands<F: FnMut(Id) -> Id>(&mut self, mut f: F) {
        self.for_each_mut(|id| *id = f(*id))
    }

    /// Returns true if the predicate is true on all operands.
    fn all<F: FnMut(Id) -> bool>(&self, f: F) -> bool {
        self.operands().iter().copied().all(f)
    }

    /// Returns the number of operands this enode has.
    fn len(&self) -> usize {
        self.operands().len()
    }

    /// Returns true if this enode has no operands.
    fn is_leaf(&self) -> bool {
        self.operands().is_empty()
    }
}

/// Arbitrary data associated with an [`EClass`](crate::EClass).
///
/// `eqsat` allows you to associate arbitrary data with each eclass; the
/// [`Analysis`] keeps that data consistent across eclass merges. A
/// common use is constant folding, where the data is an
/// `Option<Constant>` holding the constant value (if any) equivalent to
/// the enodes in the eclass. See `tests/prop.rs` for a worked example.
///
/// If you don't care about [`Analysis`], `()` implements it trivially,
/// just use that.
pub trait Analysis<L: Language>: Sized {
    /// The per-[`EClass`](crate::EClass) data for this analysis.
    type Data: Debug;

    /// Makes a new [`Analysis`] data for a given e-node.
    ///
    /// It is *not* `make`'s responsibility to insert the e-node; the
    /// e-node is "being inserted" when this function is called.
    fn make(egraph: &EGraph<L, Self>, enode: &L) -> Self::Data;

    /// Joins two [`Data`](Analysis::Data) when their containing eclasses
    /// merge, returning whether `to` changed.
    ///
    /// `join` must be commutative, associative, and idempotent, and may
    /// only move the data upward in a well-founded order. The engine
    /// does not check this; a violation makes
    /// [`rebuild`](EGraph::rebuild) loop forever.
    fn join(&mut self, to: &mut Self::Data, from: Self::Data) -> bool;
}

impl<L: Language> Analysis<L> for () {
    type Data = ();
    fn make(_egraph: &EGraph<L, Self>, _enode: &L) {}
    fn join(&mut self, _to: &mut (), _from: ()) -> bool {
        false
    }
}

/// Replaces `to` with `new`, returning whether anything changed.
///
/// Useful for implementing [`Analysis::join`] on data with equality.
pub fn join_if_different<D: PartialEq>(to: &mut D, new: D) -> bool {
    if *to == new {
        false
    } else {
        *to = new;
        true
    }
}
