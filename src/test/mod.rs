//! Test support: a classfile assembler used by unit tests across the crate.

pub mod builder;
