//! Store-agnostic query descriptions and the anchored range walk.

pub mod predicate;
pub mod range;
