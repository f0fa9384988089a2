#[allow(unused_imports)]
use crate::*;

/// An interned string.
///
/// This is provided by the [`symbol_table`](https://crates.io/crates/symbol_table) crate.
///
/// Internally, `eqsat` frequently compares and hashes elements of
/// [`Language`]s. To keep those operations fast, `eqsat` re-exports
/// [`Symbol`], a simple wrapper providing interned strings.
///
/// You may wish to use [`Symbol`] as the payload of your atoms to
/// increase performance and keep node sizes down (a [`Symbol`] is only
/// 4 bytes, compared to 24 for a `String`).
///
/// The internal symbol cache leaks the strings, which should be
/// fine if you only put in things like variable names and identifiers.
///
/// # Example
/// ```rust
/// use eqsat::Symbol;
///
/// assert_eq!(Symbol::from("foo"), Symbol::from("foo"));
/// assert_ne!(Symbol::from("foo"), Symbol::from("bar"));
/// ```
pub use symbol_table::GlobalSymbol as Symbol;

pub(crate) type BuildHasher = fxhash::FxBuildHasher;

pub(crate) use hashmap::*;

#[cfg(feature = "deterministic")]
mod hashmap {
    pub(crate) type HashMap<K, V> = super::IndexMap<K, V>;
}
#[cfg(not(feature = "deterministic"))]
mod hashmap {
    use super::BuildHasher;
    pub(crate) type HashMap<K, V> = hashbrown::HashMap<K, V, BuildHasher>;
}

pub(crate) type IndexMap<K, V> = indexmap::IndexMap<K, V, BuildHasher>;

pub(crate) type Instant = instant::Instant;

pub(crate) fn concat_vecs<T>(to: &mut Vec<T>, mut from: Vec<T>) {
    if to.len() < from.len() {
        std::mem::swap(to, &mut from)
    }
    to.extend(from);
}
