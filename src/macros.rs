#[allow(unused_imports)]
use crate::*;

/** A macro to define an atom: a payload-carrying node with no operands.

The payload type must implement `Debug`, `Clone`, `Eq`, `Ord`, and
`Hash`; the atom's equality and hash are those of its payload. The
generated struct is a tuple struct, so `Num(3)` constructs a value, and
[`value`](#method.value) borrows the payload back.

# Example
```
use eqsat::*;

define_atom! {
    /// A 32-bit integer constant.
    pub struct Num(pub i32);
}

assert_eq!(Num(3), Num(3));
assert_ne!(Num(3), Num(4));
assert_eq!(*Num(3).value(), 3);
```
**/
#[macro_export]
macro_rules! define_atom {
    ($(#[$meta:meta])* $vis:vis struct $Name:ident($pvis:vis $Value:ty);) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        $vis struct $Name($pvis $Value);

        impl $Name {
            /// Returns the payload carried by this atom.
            pub fn value(&self) -> &$Value {
                &self.0
            }
        }

        impl $crate::Operands for $Name {
            fn operands(&self) -> &[$crate::Id] {
                &[]
            }
            fn operands_mut(&mut self) -> &mut [$crate::Id] {
                &mut []
            }
        }
    };
}

/** A macro to define field tags: zero-sized types naming the operand
positions of fixed-arity nodes.

A tag may be bound by any number of nodes (see
[`define_node!`]); the binding itself determines the position.

# Example
```
use eqsat::*;

define_field! {
    /// The left-hand operand.
    pub struct Left;
    pub struct Right;
}
```
**/
#[macro_export]
macro_rules! define_field {
    ($($(#[$meta:meta])* $vis:vis struct $Name:ident;)+) => {$(
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        $vis struct $Name;
    )+};
}

/** A macro to define a fixed-arity node whose operand positions are
bound to field tags.

The node stores an `[Id; N]` with one position per listed tag, in
order. [`Fielded::field`] resolves a tag back to its operand at compile
time.

# Example
```
use eqsat::*;

define_field! {
    pub struct Base;
    pub struct Exp;
}

define_node! {
    /// Exponentiation.
    pub struct Pow(Base, Exp);
}

let pow = Pow::new([Id::from(0), Id::from(1)]);
assert_eq!(pow.field::<Base>(), Id::from(0));
assert_eq!(pow.field::<Exp>(), Id::from(1));
assert_eq!(Operands::operands(&pow), &[Id::from(0), Id::from(1)][..]);
```
**/
#[macro_export]
macro_rules! define_node {
    ($(#[$meta:meta])* $vis:vis struct $Name:ident($($Field:ident),+ $(,)?);) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        $vis struct $Name([$crate::Id; $crate::__count!($($Field)+)]);

        impl $Name {
            /// Creates a node from its operands, one per field tag in
            /// declaration order.
            pub fn new(operands: [$crate::Id; $crate::__count!($($Field)+)]) -> Self {
                Self(operands)
            }
        }

        impl $crate::Operands for $Name {
            fn operands(&self) -> &[$crate::Id] {
                &self.0
            }
            fn operands_mut(&mut self) -> &mut [$crate::Id] {
                &mut self.0
            }
        }

        impl $crate::Fielded for $Name {}

        $crate::__node_fields!($Name, 0usize, $($Field),+);
    };
}

/** A macro to define a variable-arity node holding an ordered sequence
of operands.

# Example
```
use eqsat::*;

define_vector! {
    /// An argument list.
    pub struct Args;
}

let args = Args::new([Id::from(0), Id::from(1), Id::from(2)]);
assert_eq!(Operands::operands(&args).len(), 3);
```
**/
#[macro_export]
macro_rules! define_vector {
    ($(#[$meta:meta])* $vis:vis struct $Name:ident;) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        $vis struct $Name(::std::vec::Vec<$crate::Id>);

        impl $Name {
            /// Creates a node over the given operands, preserving order.
            pub fn new(operands: impl ::std::iter::IntoIterator<Item = $crate::Id>) -> Self {
                Self(operands.into_iter().collect())
            }
        }

        impl $crate::Operands for $Name {
            fn operands(&self) -> &[$crate::Id] {
                &self.0
            }
            fn operands_mut(&mut self) -> &mut [$crate::Id] {
                &mut self.0
            }
        }
    };
}

/** A macro to define a [`Language`]: the closed union of a set of node
types declared with [`define_atom!`], [`define_node!`], and
[`define_vector!`].

Each variant holds exactly one node type, which must be distinct across
variants. The macro derives value equality, ordering, and hashing
(discriminant plus payload and operand ids), implements [`Language`],
and generates a `From` impl and a [`Variant`] impl per node type, so
node values convert into the language with `.into()` and project back
out with [`Language::get`].

# Example
```
use eqsat::*;

define_atom! { pub struct Var(pub Symbol); }
define_atom! { pub struct Lit(pub bool); }

define_field! {
    pub struct Left;
    pub struct Right;
}

define_node! { pub struct And(Left, Right); }

define_vector! { pub struct All; }

define_language! {
    /// A little boolean language.
    pub enum Logic {
        Var(Var),
        Lit(Lit),
        And(And),
        All(All),
    }
}

let mut egraph = EGraph::<Logic, ()>::default();
let t = egraph.add(Lit(true).into());
let x = egraph.add(Var(Symbol::from("x")).into());
let tx = egraph.add(And::new([t, x]).into());

// hash-consing: re-adding yields the same id
assert_eq!(egraph.add(And::new([t, x]).into()), tx);

let node = &egraph[tx].nodes[0];
assert!(node.get::<Lit>().is_none());
let and = node.get::<And>().unwrap();
assert_eq!(and.field::<Left>(), t);
assert_eq!(and.field::<Right>(), x);
```
**/
#[macro_export]
macro_rules! define_language {
    ($(#[$meta:meta])* $vis:vis enum $Lang:ident {
        $($(#[$vmeta:meta])* $VarName:ident($Inner:ty)),+ $(,)?
    }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        $vis enum $Lang {
            $($(#[$vmeta])* $VarName($Inner)),+
        }

        impl $crate::Language for $Lang {
            fn discriminant(&self) -> usize {
                match self {
                    $($Lang::$VarName(_) =>
                        <$Inner as $crate::Variant<$Lang>>::DISCRIMINANT,)+
                }
            }

            fn operands(&self) -> &[$crate::Id] {
                match self {
                    $($Lang::$VarName(node) => $crate::Operands::operands(node),)+
                }
            }

            fn operands_mut(&mut self) -> &mut [$crate::Id] {
                match self {
                    $($Lang::$VarName(node) => $crate::Operands::operands_mut(node),)+
                }
            }
        }

        $crate::__language_variants!($Lang, 0usize, $($VarName($Inner)),+);
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __count {
    () => (0usize);
    ($head:ident $($tail:ident)*) => (1usize + $crate::__count!($($tail)*));
}

#[doc(hidden)]
#[macro_export]
macro_rules! __node_fields {
    ($Node:ident, $pos:expr,) => {};
    ($Node:ident, $pos:expr, $Field:ident $(, $rest:ident)*) => {
        impl $crate::FieldOf<$Node> for $Field {
            const POSITION: usize = $pos;
        }
        $crate::__node_fields!($Node, $pos + 1usize, $($rest),*);
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __language_variants {
    ($Lang:ident, $disc:expr,) => {};
    ($Lang:ident, $disc:expr, $VarName:ident($Inner:ty) $(, $rest_name:ident($rest_ty:ty))*) => {
        impl ::std::convert::From<$Inner> for $Lang {
            fn from(node: $Inner) -> Self {
                $Lang::$VarName(node)
            }
        }

        impl $crate::Variant<$Lang> for $Inner {
            const DISCRIMINANT: usize = $disc;

            fn get(lang: &$Lang) -> ::std::option::Option<&Self> {
                match lang {
                    $Lang::$VarName(node) => ::std::option::Option::Some(node),
                    #[allow(unreachable_patterns)]
                    _ => ::std::option::Option::None,
                }
            }
        }

        $crate::__language_variants!($Lang, $disc + 1usize, $($rest_name($rest_ty)),*);
    };
}
