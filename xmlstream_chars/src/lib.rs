/*!
# Character-class tables for XML 1.0

This is a supplementary crate for [`xmlstream`](https://docs.rs/xmlstream). It
is factored out of the main crate so that the character-class tables (and
whatever else ends up keying off the same productions, e.g. a future
compile-time name-literal checker) do not have to pull in the parser itself.
*/

pub mod selectors;

#[doc(inline)]
pub use selectors::*;
