//! Decoder options.

use no_panic::no_panic;

/// What to do when the stream does not start with the COPY signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderPolicy {
    /// Fail as soon as an available byte disagrees with the signature, and
    /// reject non-zero flags or header extensions.
    #[default]
    Strict,
    /// Never fail; keep buffering until the exact 19-byte header is seen.
    ///
    /// A stream with a bad header is then never decoded. Kept for
    /// compatibility with decoders that behaved this way.
    Lenient,
}

/// How many rows one call to `feed` may emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowsPerPass {
    /// Emit every complete row in the buffer.
    #[default]
    All,
    /// Emit at most one row per delivered chunk; later complete rows wait for
    /// the next chunk.
    One,
}

impl RowsPerPass {
    pub(crate) fn allows(self, emitted: usize) -> bool {
        match self {
            RowsPerPass::All => true,
            RowsPerPass::One => emitted == 0,
        }
    }
}

/// Options for a COPY binary decoder.
#[derive(Debug, Clone)]
pub struct CopyOptions {
    /// Handling of a stream that does not start with a valid header.
    ///
    /// Default: `HeaderPolicy::Strict`
    pub header: HeaderPolicy,

    /// Number of rows decoded per delivered chunk.
    ///
    /// Default: `RowsPerPass::All`
    pub rows_per_pass: RowsPerPass,

    /// Size of the chunks pulled by the reader adapters.
    ///
    /// Default: `8192`
    pub read_buffer_size: usize,

    /// Capacity reserved up front for bytes carried between chunks.
    ///
    /// Default: `0`
    pub remainder_capacity: usize,
}

impl Default for CopyOptions {
    #[no_panic]
    fn default() -> Self {
        Self {
            header: HeaderPolicy::Strict,
            rows_per_pass: RowsPerPass::All,
            read_buffer_size: 8192,
            remainder_capacity: 0,
        }
    }
}

impl CopyOptions {
    /// Options that reproduce the lenient legacy behaviour: silent header
    /// mismatch and one row per chunk.
    pub fn legacy() -> Self {
        Self {
            header: HeaderPolicy::Lenient,
            rows_per_pass: RowsPerPass::One,
            ..Self::default()
        }
    }
}
