//! # remapper Prelude
//!
//! This module provides a convenient prelude for the most commonly used types from the
//! remapper library. Import it to get quick access to loading, matching and writing.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all remapper operations
pub use crate::Error;

/// The result type used throughout remapper
pub use crate::Result;

// ================================================================================================
// Program Model
// ================================================================================================

/// The loaded program and its entities
pub use crate::program::{
    ClassEntity, ClassId, EntityRef, FieldEntity, FieldId, MethodEntity, MethodId, Program,
};

/// Parsed classfiles
pub use crate::classfile::ClassFile;

// ================================================================================================
// Matching
// ================================================================================================

/// Classifier tables and refinement levels
pub use crate::classifier::{Classifier, Classifiers, Level};

/// Confirmed matches and the vote table
pub use crate::engine::{Mapping, Matches, NodeMappings};

/// Comparison context
pub use crate::similarity::MatchContext;

/// Phase orchestration
pub use crate::pipeline::{MapperConfig, Mapper, MatchResult};

// ================================================================================================
// Output
// ================================================================================================

/// Mapping text writer
pub use crate::writer::MappingWriter;
