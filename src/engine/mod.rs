//! The matching engine.
//!
//! - [`Matches`] holds the confirmed one-to-one relation that compatibility checks consult.
//! - [`rank`] runs one scoring round: it scores every compatible pair with a classifier and
//!   keeps a maximum-weight one-to-one selection ([`max_weight_matching`]), deferring ties.
//! - [`NodeMappings`] accumulates votes for candidate pairs over all phases and resolves
//!   conflicts globally with [`NodeMappings::reduce`].

mod assign;
mod mapping;
mod matches;
mod rank;

pub use assign::{max_weight_matching, Edge};
pub use mapping::{Mapping, NodeMappings};
pub use matches::Matches;
pub use rank::{rank, RankOptions, RankedMatch};
