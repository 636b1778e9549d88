//! Similarity primitives shared by every classifier.
//!
//! All comparisons return a score in `[0, 1]`. Value comparisons ([`compare_counts`],
//! [`compare_sets`], [`compare_ranges`], [`compare_positions`]) look only at data.
//! Entity comparisons go through a [`MatchContext`]: a confirmed match always decides, and
//! otherwise two entities are compatible when their names and descriptor shapes allow them to
//! be the same declaration.
//!
//! Names that carry no information ([`is_obfuscated_name`]) never count as evidence against a
//! pairing.

mod code;
mod context;
mod names;
mod sets;

pub use code::{compare_instructions, compare_lists, compare_positions};
pub use context::MatchContext;
pub use names::{is_obfuscated_name, names_compatible};
pub(crate) use names::simple_name;
pub use sets::{compare_counts, compare_node_sets, compare_ranges, compare_sets};
