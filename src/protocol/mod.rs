//! PostgreSQL COPY binary format.
//!
//! # Structure
//!
//! - `copy`: Header signature, row framing and trailer detection
//! - `codec`: Low-level big-endian encoding/decoding primitives
//! - `types`: Common protocol types (Oid, big-endian integer wrappers)

pub mod codec;
pub mod copy;
pub mod types;

// Re-export commonly used types
pub use copy::{CopyHeader, CopyRow, CopyRowIter, RowFrame};
pub use types::Oid;
