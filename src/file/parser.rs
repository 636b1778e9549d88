//! Low-level byte stream parser for classfile and bytecode decoding.
//!
//! This module provides the [`crate::file::parser::Parser`] type, a cursor-based binary data
//! parser designed for reading JVM classfile structures and method bytecode. It offers
//! bounds-checked access to binary data in the big-endian order the classfile format uses,
//! plus the modified UTF-8 string encoding of the constant pool.
//!
//! # Architecture
//!
//! The parser is built around a simple cursor-based model that maintains a position within
//! a byte slice:
//!
//! - **Position tracking** - Maintains current offset for sequential parsing operations
//! - **Bounds checking** - All operations validate data availability before reading
//! - **Type-safe reading** - Strongly typed reads through [`crate::file::io::JvmIO`]
//!
//! # Key Components
//!
//! ## Navigation Methods
//! - [`crate::file::parser::Parser::advance_by`] - Move forward by specified bytes
//! - [`crate::file::parser::Parser::pos`] - Get current position
//! - [`crate::file::parser::Parser::align`] - Align to byte boundaries (switch padding)
//!
//! ## Data Access Methods
//! - [`crate::file::parser::Parser::read_be`] - Read primitive types (big-endian)
//! - [`crate::file::parser::Parser::read_bytes`] - Borrow a raw chunk
//! - [`crate::file::parser::Parser::read_modified_utf8`] - Decode a constant pool string
//!
//! # Usage Examples
//!
//! ```rust
//! use remapper::Parser;
//!
//! let data = [0xCA, 0xFE, 0xBA, 0xBE, 0x00, 0x00, 0x00, 0x34];
//! let mut parser = Parser::new(&data);
//!
//! assert_eq!(parser.read_be::<u32>()?, 0xCAFE_BABE);
//! assert_eq!(parser.read_be::<u16>()?, 0);
//! assert_eq!(parser.read_be::<u16>()?, 52);
//! assert!(!parser.has_more_data());
//! # Ok::<(), remapper::Error>(())
//! ```

use crate::{
    file::io::{read_be_at, JvmIO},
    Result,
};

/// A generic binary data parser for reading classfile structures.
///
/// `Parser` provides a cursor-based interface for reading binary data in the big-endian
/// format used throughout classfiles. It maintains an internal position and provides
/// methods for reading primitives, raw byte ranges and modified UTF-8 strings.
///
/// # Thread Safety
///
/// `Parser` is not thread-safe as it maintains mutable state (the current position).
/// Create separate instances for concurrent parsing operations.
pub struct Parser<'a> {
    /// The binary data being parsed
    data: &'a [u8],
    /// Current position within the data buffer
    position: usize,
}

impl<'a> Parser<'a> {
    /// Create a new [`crate::file::parser::Parser`] from a byte slice.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use remapper::Parser;
    /// let data = [0x01, 0x02, 0x03, 0x04];
    /// let parser = Parser::new(&data);
    /// assert_eq!(parser.len(), 4);
    /// ```
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Parser { data, position: 0 }
    }

    /// Returns the length of the underlying data buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the parser has no data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns `true` if there is more data available to parse.
    #[must_use]
    pub fn has_more_data(&self) -> bool {
        self.position < self.data.len()
    }

    /// Move the position forward by the specified number of bytes.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if advancing by step would exceed the data length.
    pub fn advance_by(&mut self, step: usize) -> Result<()> {
        let end = self.calc_end_position(step)?;
        self.position = end;
        Ok(())
    }

    /// Get the current position of the parser within the data buffer.
    #[must_use]
    pub fn pos(&self) -> usize {
        self.position
    }

    /// Align the position to a specific boundary.
    ///
    /// `tableswitch` and `lookupswitch` pad their operands to a 4-byte boundary relative to
    /// the start of the method's code array, which is where a bytecode parser starts.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if aligning would exceed the data length.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use remapper::Parser;
    /// let data = [0xAA, 0x00, 0x00, 0x00, 0x05];
    /// let mut parser = Parser::new(&data);
    ///
    /// parser.advance_by(1)?;
    /// parser.align(4)?;
    /// assert_eq!(parser.pos(), 4);
    /// # Ok::<(), remapper::Error>(())
    /// ```
    pub fn align(&mut self, alignment: usize) -> Result<()> {
        let padding = (alignment - (self.position % alignment)) % alignment;
        self.advance_by(padding)
    }

    /// Read a type `T` from the current position in big-endian format and advance the position.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if reading would exceed the data length.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use remapper::Parser;
    /// let data = [0x01, 0x02, 0x03, 0x04];
    /// let mut parser = Parser::new(&data);
    ///
    /// let value: u16 = parser.read_be()?;
    /// assert_eq!(value, 0x0102);
    /// assert_eq!(parser.pos(), 2);
    /// # Ok::<(), remapper::Error>(())
    /// ```
    pub fn read_be<T: JvmIO>(&mut self) -> Result<T> {
        read_be_at::<T>(self.data, &mut self.position)
    }

    /// Returns the number of bytes remaining from the current position.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Calculates an end position safely with overflow checking.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the calculation would overflow
    /// or if the resulting position exceeds the data length.
    pub fn calc_end_position(&self, length: usize) -> Result<usize> {
        let end = self
            .position
            .checked_add(length)
            .ok_or(out_of_bounds_error!())?;

        if end > self.data.len() {
            return Err(out_of_bounds_error!());
        }

        Ok(end)
    }

    /// Reads a slice of bytes of the specified length from the current position.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if reading `length` bytes would exceed the data.
    pub fn read_bytes(&mut self, length: usize) -> Result<&'a [u8]> {
        let end = self.calc_end_position(length)?;
        let bytes = &self.data[self.position..end];
        self.position = end;
        Ok(bytes)
    }

    /// Read `length` bytes of the JVM's modified UTF-8 encoding.
    ///
    /// Modified UTF-8 differs from standard UTF-8 in two ways: `NUL` is written as the two
    /// byte sequence `C0 80`, and supplementary characters are written as two separately
    /// encoded UTF-16 surrogates. Lone surrogates, which obfuscators like to put in string
    /// constants, decode to `U+FFFD`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the string runs past the data and
    /// [`crate::Error::Malformed`] for an invalid byte sequence.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use remapper::Parser;
    /// let data = [b'a', 0xC0, 0x80, b'b'];
    /// let mut parser = Parser::new(&data);
    /// assert_eq!(parser.read_modified_utf8(4)?, "a\0b");
    /// # Ok::<(), remapper::Error>(())
    /// ```
    pub fn read_modified_utf8(&mut self, length: usize) -> Result<String> {
        let bytes = self.read_bytes(length)?;
        if bytes.iter().all(|b| *b != 0 && *b < 0x80) {
            // ASCII subset is identical in both encodings
            return String::from_utf8(bytes.to_vec())
                .map_err(|_| malformed_error!("Invalid ASCII constant"));
        }

        let mut units = Vec::with_capacity(bytes.len());
        let mut i = 0;
        while i < bytes.len() {
            let b = bytes[i];
            let unit = if b & 0x80 == 0 {
                i += 1;
                u16::from(b)
            } else if b & 0xE0 == 0xC0 {
                let b2 = continuation(bytes, i + 1)?;
                i += 2;
                (u16::from(b & 0x1F) << 6) | b2
            } else if b & 0xF0 == 0xE0 {
                let b2 = continuation(bytes, i + 1)?;
                let b3 = continuation(bytes, i + 2)?;
                i += 3;
                (u16::from(b & 0x0F) << 12) | (b2 << 6) | b3
            } else {
                return Err(malformed_error!(
                    "Invalid modified UTF-8 lead byte 0x{:02X} at {}",
                    b,
                    i
                ));
            };
            units.push(unit);
        }

        Ok(char::decode_utf16(units)
            .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect())
    }
}

fn continuation(bytes: &[u8], index: usize) -> Result<u16> {
    match bytes.get(index) {
        Some(b) if b & 0xC0 == 0x80 => Ok(u16::from(b & 0x3F)),
        Some(b) => Err(malformed_error!(
            "Invalid modified UTF-8 continuation byte 0x{:02X} at {}",
            b,
            index
        )),
        None => Err(malformed_error!("Truncated modified UTF-8 sequence")),
    }
}
