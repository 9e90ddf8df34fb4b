//! Incremental decoder for PostgreSQL `COPY ... TO STDOUT (FORMAT binary)` streams.
//!
//! # Features
//!
//! - **Chunk-agnostic**: Bytes can arrive split at any boundary; incomplete rows
//!   are carried over to the next chunk
//! - **Zero-copy rows**: Positional rows borrow directly from the input buffer
//! - **Sans-I/O core**: [`CopyOutDecoder`] is fed by the caller, with blocking and
//!   tokio-based reader adapters on top
//! - **Column mapping**: Fields can be converted by column type through an
//!   injected [`Converter`]
//!
//! # Example
//!
//! ```
//! use zero_pgcopy::{CollectHandler, CopyOutDecoder, OwnedRecord};
//!
//! // Header, one row of ("ABC", NULL), trailer
//! let mut stream = b"PGCOPY\n\xff\r\n\0".to_vec();
//! stream.extend_from_slice(&[0; 8]);
//! stream.extend_from_slice(&[0, 2, 0, 0, 0, 3, b'A', b'B', b'C', 0xff, 0xff, 0xff, 0xff]);
//! stream.extend_from_slice(&[0xff, 0xff]);
//!
//! let mut decoder = CopyOutDecoder::new();
//! let mut handler = CollectHandler::new();
//! for chunk in stream.chunks(5) {
//!     decoder.feed(chunk, &mut handler)?;
//! }
//! decoder.finish(&mut handler)?;
//!
//! assert_eq!(
//!     handler.records(),
//!     &[OwnedRecord::Positional(vec![Some(b"ABC".to_vec()), None])]
//! );
//! # Ok::<(), zero_pgcopy::Error>(())
//! ```

pub mod conversion;
pub mod decoder;
pub mod error;
pub mod handler;
pub mod mapper;
pub mod opts;
pub mod protocol;
pub mod record;

#[cfg(feature = "sync")]
pub mod sync;

#[cfg(feature = "tokio")]
pub mod tokio;

pub use conversion::{Converter, FnConverter, FromRow, FromWireValue, Value, WireConverter};
pub use decoder::{CopyOutDecoder, Progress};
pub use error::{Error, Result};
pub use handler::{CollectHandler, CopyHandler, CountHandler};
pub use mapper::{Column, FieldMapper};
pub use opts::{CopyOptions, HeaderPolicy, RowsPerPass};
pub use protocol::types::Oid;
pub use protocol::{CopyHeader, CopyRow};
pub use record::{MappedRow, OwnedRecord, Record};
