// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(clippy::too_many_arguments)]
// - 'file/physical.rs' uses mmap to map a file into memory

//! # remapper
//!
//! Carries names across re-obfuscated builds of a JVM program.
//!
//! Given an old and a new build of the same program, both with renamed and reordered
//! identifiers, `remapper` decides which class, method and field of the old build corresponds to
//! which declaration of the new one. It only produces that correspondence: nothing is
//! decompiled, verified or rewritten.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use remapper::prelude::*;
//!
//! let config = MapperConfig::default();
//! let old = Program::from_path("client-old.jar", &config.ignore_patterns)?;
//! let new = Program::from_path("client-new.jar", &config.ignore_patterns)?;
//!
//! let result = Mapper::run(&old, &new, &config, &Classifiers::new());
//! MappingWriter::new(&old, &new, &result).write_to("mappings")?;
//! # Ok::<(), remapper::Error>(())
//! ```
//!
//! ## Architecture
//!
//! Leaves first:
//!
//! - [`file`] and [`classfile`] - container access and the JVM classfile reader
//! - [`program`] - the program model: an arena of classes, methods and fields with the derived
//!   inheritance, call, field-access and constant relations
//! - [`similarity`] - set, count, name and instruction-sequence comparisons, and the
//!   compatibility predicates that consult already confirmed matches
//! - [`classifier`] - weighted feature tables per entity kind, organized in refinement levels
//! - [`engine`] - one scoring round ([`engine::rank`]) with optimal bipartite assignment, and
//!   the vote table ([`engine::NodeMappings`]) with its global conflict resolution
//! - [`pipeline`] - the phase sequence that turns scores into an injective mapping
//! - [`writer`] - the mapping text format
//!
//! ## Ambiguity
//!
//! When two candidates score the same, a round refuses to choose. The pair is retried once more
//! context is available, and stays unmatched if it never resolves.
//!
//! ## Error Handling
//!
//! Only loading can fail. A malformed classfile aborts the load and names its entry:
//!
//! ```rust,no_run
//! use remapper::{program::Program, Error};
//!
//! match Program::from_path("client.jar", &[]) {
//!     Ok(program) => println!("{} classes", program.classes().len()),
//!     Err(Error::ClassFile { name, source }) => println!("{name}: {source}"),
//!     Err(e) => println!("Error: {e}"),
//! }
//! ```
//!
//! References to classes or members outside both programs, such as platform types, are not
//! errors; they are dropped while the graph is built.
//!
//! ## Fuzzing
//!
//! ```bash
//! cargo +nightly fuzz run classfile --release
//! ```

#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types.
///
/// # Example
///
/// ```rust,no_run
/// use remapper::prelude::*;
///
/// let program = Program::from_path("client.jar", &[])?;
/// println!("Found {} methods", program.methods().len());
/// # Ok::<(), remapper::Error>(())
/// ```
pub mod prelude;

/// Container access: memory-mapped and in-memory inputs, the big-endian parser, and archive
/// enumeration.
pub mod file;

/// JVM classfile reader.
///
/// Parses the constant pool, access flags, descriptors and the attributes the program model
/// consumes, and decodes bytecode into [`classfile::Instruction`]s with pool operands resolved.
///
/// # Examples
///
/// ```rust,no_run
/// use remapper::classfile::ClassFile;
///
/// let bytes = std::fs::read("Foo.class")?;
/// let class = ClassFile::parse(&bytes)?;
/// println!("{} has {} methods", class.name, class.methods.len());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub mod classfile;

/// The program model.
///
/// See [`program::Program`].
pub mod program;

/// Similarity primitives and compatibility predicates.
pub mod similarity;

/// Per-kind classifiers.
pub mod classifier;

/// Matching engine.
pub mod engine;

/// Phase orchestration.
///
/// See [`pipeline::Mapper`].
pub mod pipeline;

/// Mapping text output.
pub mod writer;

/// `remapper` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `remapper` Error type
///
/// The main error type for all fallible operations in this crate: container access and
/// classfile parsing.
///
/// # Examples
///
/// ```rust,no_run
/// use remapper::{program::Program, Error};
///
/// match Program::from_path("client.jar", &[]) {
///     Ok(_) => println!("Loaded successfully"),
///     Err(Error::Malformed { message, .. }) => println!("Malformed: {}", message),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
pub use error::Error;

/// Big-endian cursor over classfile bytes.
///
/// # Example
///
/// ```rust
/// use remapper::Parser;
///
/// let data = [0xCA, 0xFE, 0xBA, 0xBE];
/// let mut parser = Parser::new(&data);
/// assert_eq!(parser.read_be::<u32>()?, 0xCAFE_BABE);
/// # Ok::<(), remapper::Error>(())
/// ```
pub use file::{parser::Parser, File};
