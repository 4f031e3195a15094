use std::{fmt, io};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug)]
pub enum Error {
    /// Occurs when writing to, seeking, or adding values to a sink or file that has already been
    /// closed.
    ResourceClosed(&'static str),
    /// Failure at the OS boundary: opening the output, a short write, or a failed seek.
    Io(io::Error),
    /// The deflate backend couldn't be configured, or it reported an internal stream error.
    CodecInit(String),
    /// The product of a matrix's dimensions doesn't match the number of elements it was given.
    ShapeMismatch { dims: Vec<usize>, elements: usize },
    /// A payload, element, or compressed block doesn't fit in a 32-bit length field.
    LengthTooLong { max: u64, actual: u64 },
    /// Tried to tell, seek, or install a filter while a compression filter is installed.
    FilterActive(&'static str),
    /// The compressed format needs to back-patch lengths, but the sink can't seek.
    Unseekable,
    /// The requested format version isn't supported by this writer.
    Unsupported(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::ResourceClosed(what) => write!(f, "Cannot {} a closed file", what),
            Error::Io(ref err) => write!(f, "I/O failure: {}", err),
            Error::CodecInit(ref err) => write!(f, "Compression failure: {}", err),
            Error::ShapeMismatch { ref dims, elements } => write!(
                f,
                "Matrix dimensions {:?} must be commensurate with number of elements ({})",
                dims, elements
            ),
            Error::LengthTooLong { max, actual } => write!(
                f,
                "Data too long: was {} bytes, maximum allowed is {}",
                actual, max
            ),
            Error::FilterActive(what) => {
                write!(f, "Cannot {} while a compression filter is active", what)
            }
            Error::Unseekable => f.write_str("Compressed output requires a seekable sink"),
            Error::Unsupported(what) => write!(f, "Unsupported: {}", what),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            Error::Io(ref err) => Some(err),
            _ => None,
        }
    }
}

impl std::convert::From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}
