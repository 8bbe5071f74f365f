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

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Errors are only ever produced while a structure tree is being built: decoding a heap,
/// constructing a record, assembling files. Looking up structures and fields by position
/// never fails, an absent structure is reported as `None` or as an empty highlight list.
///
/// # Error Categories
///
/// ## Construction Errors
/// - [`Error::Malformed`] - A record or heap violates its layout invariants
/// - [`Error::InvalidSpan`] - A span was requested with `start > end`
/// - [`Error::OutOfBounds`] - A span reaches past the end of the buffer
/// - [`Error::Empty`] - Empty input provided
///
/// ## I/O Errors
/// - [`Error::FileError`] - Filesystem I/O errors
///
/// # Examples
///
/// ```rust
/// use heapscope::{Error, metadata::streams::{GuidRecord, HeapInfo, HeapKind}, Span};
/// use std::sync::Arc;
///
/// let heap = Arc::new(HeapInfo::new(HeapKind::Guid, Span::new(0, 16)));
/// match GuidRecord::new(heap, &[0u8; 16], Span::new(0, 16), 0) {
///     Ok(_) => println!("record created"),
///     Err(Error::Malformed { message, file, line }) => {
///         eprintln!("Malformed record: {} ({}:{})", message, file, line);
///     }
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The data is damaged or violates the layout of the structure being built.
    ///
    /// The error includes the source location where the malformation was detected
    /// for debugging purposes.
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

    /// An out of bound access was attempted while decoding a structure.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// A span was requested whose start lies after its end.
    #[error("Invalid span - start {start} is after end {end}")]
    InvalidSpan {
        /// Requested start position
        start: u64,
        /// Requested end position
        end: u64,
    },

    /// Provided input was empty.
    #[error("Provided input was empty")]
    Empty,

    /// File I/O error.
    ///
    /// Wraps standard I/O errors that can occur while opening or mapping a file.
    #[error("{0}")]
    FileError(#[from] std::io::Error),
}
