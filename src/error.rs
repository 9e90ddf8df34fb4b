//! Error types for zero-pgcopy.

use thiserror::Error;

/// Result type for zero-pgcopy operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Error type for zero-pgcopy.
#[derive(Debug, Error)]
pub enum Error {
    /// The stream does not start with the COPY binary signature
    #[error("Malformed COPY header: {0}")]
    MalformedHeader(String),

    /// Protocol error (malformed wire data)
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// A row carries more fields than the column mapping describes
    #[error("Column mismatch: row has {field_count} fields but mapping has {columns} columns")]
    ColumnMismatch {
        /// Field count announced by the row
        field_count: usize,
        /// Number of columns in the mapping
        columns: usize,
    },

    /// Value conversion failed
    #[error("Decode error: {0}")]
    Decode(String),

    /// Input ended before the trailer was received
    #[error("Unexpected end of COPY stream ({buffered} bytes buffered)")]
    UnexpectedEof {
        /// Bytes held in the remainder when input ended
        buffered: usize,
    },

    /// The decoder hit a structural error earlier and cannot be reused
    #[error("COPY decoder is broken")]
    Broken,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Unsupported feature
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

impl Error {
    /// Returns true if the decoder that produced this error cannot continue.
    ///
    /// Row-level failures (conversion, column mismatch) leave the decoder usable;
    /// the failing row is consumed and decoding may resume with the next chunk.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::MalformedHeader(_)
                | Error::Protocol(_)
                | Error::Unsupported(_)
                | Error::Broken
                | Error::UnexpectedEof { .. }
                | Error::Io(_)
        )
    }

    /// Attach the column key to a conversion failure.
    pub(crate) fn in_column(self, key: &str) -> Self {
        match self {
            Error::Decode(msg) => Error::Decode(format!("column {key:?}: {msg}")),
            other => other,
        }
    }
}

impl<Src: std::fmt::Debug, Dst: std::fmt::Debug + ?Sized>
    From<zerocopy::error::CastError<Src, Dst>> for Error
{
    fn from(err: zerocopy::error::CastError<Src, Dst>) -> Self {
        Error::Protocol(format!("zerocopy cast error: {err:?}"))
    }
}
