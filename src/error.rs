use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! out_of_bounds_error {
    () => {
        crate::Error::OutOfBounds
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Errors only ever surface while loading a container. Once a [`crate::program::Program`] is
/// built, the matching pipeline itself is infallible: unresolved references are dropped and
/// ambiguous candidates stay unmatched.
///
/// # Error Categories
///
/// ## Classfile Parsing Errors
/// - [`Error::Malformed`] - Corrupted or invalid classfile structure
/// - [`Error::OutOfBounds`] - Attempted to read beyond the end of the input
/// - [`Error::NotSupported`] - Input is not a classfile, jar or directory
/// - [`Error::Empty`] - Empty input provided
/// - [`Error::ClassFile`] - A parse error, tagged with the container entry it came from
///
/// ## Container Errors
/// - [`Error::FileError`] - Filesystem I/O errors
/// - [`Error::Archive`] - Jar/zip decoding errors from the `zip` crate
///
/// # Examples
///
/// ```rust,no_run
/// use remapper::{Error, program::Program};
///
/// match Program::from_path("client.jar", &[]) {
///     Ok(program) => println!("Loaded {} classes", program.classes().len()),
///     Err(Error::ClassFile { name, source }) => eprintln!("{name}: {source}"),
///     Err(e) => eprintln!("Other error: {e}"),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The classfile is damaged and could not be parsed.
    ///
    /// The error includes the source location where the malformation was detected for
    /// debugging purposes.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while parsing the file.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// This file type is not supported.
    #[error("This file type is not supported")]
    NotSupported,

    /// Provided input was empty.
    #[error("Provided input was empty")]
    Empty,

    /// File I/O error.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// The jar/zip container could not be decoded.
    #[error("{0}")]
    Archive(#[from] zip::result::ZipError),

    /// A container entry failed to parse.
    ///
    /// Wraps the underlying parse error with the entry name, so a failed load
    /// reports which class broke it.
    #[error("{name}: {source}")]
    ClassFile {
        /// Entry name inside the container
        name: String,
        /// The parse error
        #[source]
        source: Box<Error>,
    },

    /// Generic error for miscellaneous failures.
    #[error("{0}")]
    Error(String),
}
