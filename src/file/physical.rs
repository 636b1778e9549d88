//! Physical file backend for memory-mapped I/O.
//!
//! This module provides the [`crate::file::physical::Physical`] backend that implements the
//! [`crate::file::Backend`] trait for accessing files from disk using memory-mapped I/O.
//! Jars of large programs run to tens of megabytes, and the archive reader seeks around the
//! central directory, so mapping the file avoids reading it up front while still allowing fast
//! random access.
//!
//! # Usage Examples
//!
//! ```rust,ignore
//! use remapper::file::{Physical, Backend};
//! use std::path::Path;
//!
//! let physical = Physical::new(Path::new("client.jar"))?;
//! let header = physical.data_slice(0, 2)?;
//! assert_eq!(header, b"PK");
//! # Ok::<(), remapper::Error>(())
//! ```

use super::Backend;
use crate::{Error::Error, Result};

use memmap2::Mmap;
use std::{fs, path::Path};

/// A file backend that uses memory-mapped I/O for efficient access to files on disk.
///
/// All access operations include bounds checking to ensure memory safety.
#[derive(Debug)]
pub struct Physical {
    /// Memory-mapped file data
    data: Mmap,
}

impl Physical {
    /// Create a new physical file backend by memory-mapping the specified file.
    ///
    /// The file is mapped read-only.
    ///
    /// # Arguments
    /// * `path` - Path to the file on disk. Accepts `&Path`, `&str`, `String`, or `PathBuf`.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be opened or
    /// [`crate::Error::Error`] if memory mapping fails.
    pub fn new(path: impl AsRef<Path>) -> Result<Physical> {
        let file = fs::File::open(path)?;
        // the mapping is never written through and jars are not modified while a run holds them
        let data = unsafe { Mmap::map(&file) }.map_err(|error| Error(error.to_string()))?;
        Ok(Physical { data })
    }
}

impl Backend for Physical {
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        offset
            .checked_add(len)
            .and_then(|end| self.data.get(offset..end))
            .ok_or(out_of_bounds_error!())
    }

    fn data(&self) -> &[u8] {
        self.data.as_ref()
    }

    fn len(&self) -> usize {
        self.data.len()
    }
}
