#![warn(missing_docs)]
/*!

`eqsat` is an e-graph core for building equality-saturation tooling.

An e-graph compactly represents a large set of equivalent terms from a
user-defined language. This crate provides the substrate only: a
closed-world term language built from the [`define_language!`] macro
family, hash-consing of nodes, merging of equivalence classes with
deferred congruence repair via [`EGraph::rebuild`], and per-class
[`Analysis`] data kept consistent across merges. Rewrite rules,
extraction, and pattern matching are left to layers built on top.

## Logging

Many parts of `eqsat` dump useful logging info using the
[`log`](https://docs.rs/log/) crate. The easiest way to see this info is
to use the [`env_logger`](https://docs.rs/env_logger/) crate in your
binary or test. The simplest way to enable `env_logger` is to put the
following line near the top of your `main`: `env_logger::init();`.
Then, set the environment variable `RUST_LOG=eqsat=info`, or use `warn`
or `debug` instead of info for less or more logging.

*/

mod macros;

mod bump;
mod eclass;
mod egraph;
mod language;
mod unionfind;
mod util;

/// A key to identify [`EClass`]es within an
/// [`EGraph`].
#[derive(Clone, Copy, Default, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub struct Id(u32);

impl From<usize> for Id {
    fn from(n: usize) -> Id {
        Id(n as u32)
    }
}

impl From<Id> for usize {
    fn from(id: Id) -> usize {
        id.0 as usize
    }
}

impl std::fmt::Debug for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub(crate) use unionfind::{UnionFind, UnionResult};

pub use {
    bump::{BumpAllocator, BumpError, MAX_TYPES},
    eclass::EClass,
    egraph::EGraph,
    language::*,
    util::*,
};

#[cfg(test)]
fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
