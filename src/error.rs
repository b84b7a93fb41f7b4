use std::error;
use std::fmt;
use std::io;
use std::result;

/// A type alias for `Result<T, csv_textfield::Error>`.
pub type Result<T> = result::Result<T, Error>;

/// An error that can occur when reading or writing delimited text.
///
/// Only `MalformedLine` is recoverable: the reader has already skipped past
/// the offending line, so calling `read_record` again picks up with the next
/// one.
#[derive(Debug)]
pub enum Error {
    /// An I/O error from the underlying source or sink.
    Io(io::Error),
    /// An invalid configuration value, such as an empty delimiter or a
    /// quote character that is a line terminator.
    Argument(String),
    /// A logical line that violates the quoting grammar.
    MalformedLine {
        /// The physical line number on which the logical line started.
        line: u64,
        /// The raw text of the logical line, without its terminator.
        text: String,
    },
    /// The current configuration cannot be used to parse anything, e.g.,
    /// the quote character is part of the delimiter.
    InvalidOperation(String),
    /// The reader or writer was used after it was closed.
    Closed,
}

impl Error {
    /// Returns true if this error is a malformed line error.
    pub fn is_malformed_line(&self) -> bool {
        match *self {
            Error::MalformedLine { .. } => true,
            _ => false,
        }
    }

    /// Returns true if this error occurred because the reader or writer was
    /// already closed.
    pub fn is_closed(&self) -> bool {
        match *self {
            Error::Closed => true,
            _ => false,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::Io(ref err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Io(ref err) => err.fmt(f),
            Error::Argument(ref msg) => write!(f, "invalid argument: {}", msg),
            Error::MalformedLine { line, ref text } => write!(
                f,
                "line {} cannot be parsed with the current delimiters \
                 and quoting: {:?}",
                line, text
            ),
            Error::InvalidOperation(ref msg) => {
                write!(f, "invalid operation: {}", msg)
            }
            Error::Closed => write!(f, "cannot access a closed reader or writer"),
        }
    }
}
