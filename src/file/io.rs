//! Low-level byte order and safe reading utilities for classfile parsing.
//!
//! The JVM classfile format stores every multi-byte quantity in big-endian order. This module
//! provides the [`crate::file::io::JvmIO`] trait, implemented for all primitive integer and
//! floating point types, together with bounds-checked helpers that read those types
//! at a cursor position.
//!
//! # Key Components
//!
//! - [`crate::file::io::JvmIO`] - Trait defining big-endian conversion for primitive types
//! - [`crate::file::io::read_be`] - Read a value from the start of a buffer
//! - [`crate::file::io::read_be_at`] - Read a value at an offset and advance the offset
//!
//! # Usage Examples
//!
//! ```rust,ignore
//! use remapper::file::io::{read_be, read_be_at};
//!
//! let data = [0xCA, 0xFE, 0xBA, 0xBE, 0x00, 0x34];
//! let magic: u32 = read_be(&data)?;
//! assert_eq!(magic, 0xCAFEBABE);
//!
//! let mut offset = 4;
//! let major: u16 = read_be_at(&data, &mut offset)?;
//! assert_eq!(major, 52);
//! assert_eq!(offset, 6);
//! # Ok::<(), remapper::Error>(())
//! ```

use crate::{Error::OutOfBounds, Result};

/// Trait for implementing type specific safe big-endian conversion.
///
/// Implemented for `u8`, `i8`, `u16`, `i16`, `u32`, `i32`, `u64`, `i64`, `f32` and `f64`.
pub trait JvmIO: Sized {
    /// Fixed-size byte array of the type
    type Bytes: Sized + for<'a> TryFrom<&'a [u8]>;

    /// Read T from a big-endian byte array
    fn from_be_bytes(bytes: Self::Bytes) -> Self;
}

// Implement JvmIO support for u64
impl JvmIO for u64 {
    type Bytes = [u8; 8];

    fn from_be_bytes(bytes: Self::Bytes) -> Self {
        u64::from_be_bytes(bytes)
    }
}

// Implement JvmIO support for i64
impl JvmIO for i64 {
    type Bytes = [u8; 8];

    fn from_be_bytes(bytes: Self::Bytes) -> Self {
        i64::from_be_bytes(bytes)
    }
}

// Implement JvmIO support for u32
impl JvmIO for u32 {
    type Bytes = [u8; 4];

    fn from_be_bytes(bytes: Self::Bytes) -> Self {
        u32::from_be_bytes(bytes)
    }
}

// Implement JvmIO support for i32
impl JvmIO for i32 {
    type Bytes = [u8; 4];

    fn from_be_bytes(bytes: Self::Bytes) -> Self {
        i32::from_be_bytes(bytes)
    }
}

// Implement JvmIO support for u16
impl JvmIO for u16 {
    type Bytes = [u8; 2];

    fn from_be_bytes(bytes: Self::Bytes) -> Self {
        u16::from_be_bytes(bytes)
    }
}

// Implement JvmIO support for i16
impl JvmIO for i16 {
    type Bytes = [u8; 2];

    fn from_be_bytes(bytes: Self::Bytes) -> Self {
        i16::from_be_bytes(bytes)
    }
}

// Implement JvmIO support for u8
impl JvmIO for u8 {
    type Bytes = [u8; 1];

    fn from_be_bytes(bytes: Self::Bytes) -> Self {
        u8::from_be_bytes(bytes)
    }
}

// Implement JvmIO support for i8
impl JvmIO for i8 {
    type Bytes = [u8; 1];

    fn from_be_bytes(bytes: Self::Bytes) -> Self {
        i8::from_be_bytes(bytes)
    }
}

// Implement JvmIO support for f32
impl JvmIO for f32 {
    type Bytes = [u8; 4];

    fn from_be_bytes(bytes: Self::Bytes) -> Self {
        f32::from_be_bytes(bytes)
    }
}

// Implement JvmIO support for f64
impl JvmIO for f64 {
    type Bytes = [u8; 8];

    fn from_be_bytes(bytes: Self::Bytes) -> Self {
        f64::from_be_bytes(bytes)
    }
}

/// Safely reads a value of type `T` in big-endian byte order from the start of a buffer.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the buffer is shorter than `T`.
pub fn read_be<T: JvmIO>(data: &[u8]) -> Result<T> {
    let mut offset = 0_usize;
    read_be_at(data, &mut offset)
}

/// Safely reads a value of type `T` in big-endian byte order at `offset`, advancing it.
///
/// # Arguments
/// * `data` - The byte buffer to read from
/// * `offset` - Mutable reference to the read position, advanced by `size_of::<T>()`
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if there are not enough bytes left.
pub fn read_be_at<T: JvmIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let type_len = std::mem::size_of::<T>();
    let Some(end) = offset.checked_add(type_len) else {
        return Err(OutOfBounds);
    };
    if end > data.len() {
        return Err(OutOfBounds);
    }

    let Ok(read) = data[*offset..end].try_into() else {
        return Err(OutOfBounds);
    };

    *offset = end;

    Ok(T::from_be_bytes(read))
}
