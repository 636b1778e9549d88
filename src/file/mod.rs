//! Container access and low-level binary parsing.
//!
//! This module abstracts over where program bytes come from (a file on disk or a memory
//! buffer) and provides the cursor-based [`crate::file::parser::Parser`] the classfile reader
//! is built on.
//!
//! # Key Components
//!
//! ## Core Types
//! - [`crate::file::File`] - A loaded input with format sniffing
//! - [`crate::file::Backend`] - Trait for different data sources (disk files, memory buffers)
//!
//! ## Parsing Infrastructure
//! - [`crate::file::parser::Parser`] - Big-endian cursor used by the classfile reader
//! - [`crate::file::io`] - Low-level endian-aware read helpers
//!
//! ## Containers
//! - [`crate::file::archive`] - Enumerates the `.class` entries of a jar, a directory tree or
//!   a single classfile
//!
//! # Examples
//!
//! ```rust,no_run
//! use remapper::file::{File, FileKind};
//! use std::path::Path;
//!
//! let file = File::from_file(Path::new("client.jar"))?;
//! assert_eq!(file.kind(), FileKind::Archive);
//! # Ok::<(), remapper::Error>(())
//! ```

pub mod archive;
pub mod io;
pub mod parser;

mod memory;
mod physical;

use std::path::Path;

use crate::{
    Error::{Empty, NotSupported},
    Result,
};
use memory::Memory;
use physical::Physical;

/// Backend trait for file data sources.
///
/// This trait abstracts over the source of input data, allowing for both in-memory and on-disk
/// representations. All implementations must be thread-safe.
pub trait Backend: Send + Sync {
    /// Returns a slice of the data at the given offset and length.
    ///
    /// # Arguments
    ///
    /// * `offset` - The starting offset within the data.
    /// * `len` - The length of the slice in bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the requested range is out of bounds.
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]>;

    /// Returns the entire data buffer.
    fn data(&self) -> &[u8];

    /// Returns the total length of the data buffer.
    fn len(&self) -> usize;
}

/// Format of a loaded input, determined from its leading magic bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// A single JVM classfile (`CA FE BA BE`)
    Class,
    /// A zip container such as a jar (`PK`)
    Archive,
}

/// A loaded input file.
///
/// Wraps a [`Backend`] and sniffs whether the bytes are a classfile or a zip container.
pub struct File {
    data: Box<dyn Backend>,
    kind: FileKind,
}

impl File {
    /// Loads and memory maps a file from disk.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be read, [`crate::Error::Empty`]
    /// for an empty file and [`crate::Error::NotSupported`] if it is neither a classfile nor
    /// a zip container.
    pub fn from_file(file: &Path) -> Result<File> {
        let input = Physical::new(file)?;

        Self::load(input)
    }

    /// Loads a file from a memory buffer.
    ///
    /// # Errors
    /// Same as [`File::from_file`], minus the I/O failures.
    pub fn from_mem(data: Vec<u8>) -> Result<File> {
        let input = Memory::new(data);

        Self::load(input)
    }

    fn load<T: Backend + 'static>(data: T) -> Result<File> {
        if data.len() == 0 {
            return Err(Empty);
        }

        let kind = match data.data_slice(0, 4) {
            Ok([0xCA, 0xFE, 0xBA, 0xBE]) => FileKind::Class,
            Ok([b'P', b'K', 0x03, 0x04] | [b'P', b'K', 0x05, 0x06]) => FileKind::Archive,
            _ => return Err(NotSupported),
        };

        Ok(File {
            data: Box::new(data),
            kind,
        })
    }

    /// Returns the detected format.
    #[must_use]
    pub fn kind(&self) -> FileKind {
        self.kind
    }

    /// Returns the total size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the file holds no data. Loading rejects empty input, so this only
    /// exists for API symmetry with [`File::len`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the complete file data.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.data.data()
    }

    /// Returns a bounds-checked slice of the file.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the range exceeds the file.
    pub fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        self.data.data_slice(offset, len)
    }
}
