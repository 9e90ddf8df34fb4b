//! COPY binary stream layout.
//!
//! ```text
//! header:  "PGCOPY\n\xff\r\n\0" | flags: u32 | extension length: u32
//! row:     field count: u16 | (length: u32 | bytes)*   (length 0xFFFFFFFF = NULL)
//! trailer: field count 0xFFFF
//! ```
//!
//! Functions here look at a byte slice and report what it contains. They never
//! hold state between calls; the decoder decides what to keep.

use std::mem::size_of;

use zerocopy::{FromBytes, Immutable, KnownLayout};

use crate::error::{Error, Result};
use crate::protocol::codec::{read_u16, read_u32};
use crate::protocol::types::U32BE;

/// 11-byte signature that opens every COPY binary stream.
pub const SIGNATURE: [u8; 11] = *b"PGCOPY\n\xff\r\n\0";

/// Field count value that marks the end of the stream.
pub const TRAILER: u16 = 0xFFFF;

/// Field length value that marks a NULL field.
pub const NULL_LENGTH: u32 = 0xFFFF_FFFF;

/// Size of the field count prefix.
pub const FIELD_COUNT_LEN: usize = 2;

/// Size of a field length prefix.
pub const FIELD_LENGTH_LEN: usize = 4;

/// Fixed header: signature, flags and header extension length (19 bytes).
#[derive(Debug, Clone, Copy, FromBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct CopyHeaderRaw {
    /// `PGCOPY\n\377\r\n\0`
    pub signature: [u8; 11],
    /// Flags field (bit 16 = OIDs included)
    pub flags: U32BE,
    /// Length of the header extension area that follows
    pub extension_len: U32BE,
}

/// Total header length.
pub const HEADER_LEN: usize = size_of::<CopyHeaderRaw>();

/// Parsed COPY binary header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CopyHeader {
    /// Flags field
    pub flags: u32,
    /// Header extension length
    pub extension_len: u32,
}

/// Result of looking for the header at the start of a buffer.
#[derive(Debug)]
pub enum HeaderScan {
    /// Fewer than [`HEADER_LEN`] bytes are available and none of them disagree
    /// with the signature.
    Incomplete,
    /// The header is present and valid.
    Matched(CopyHeader),
    /// The bytes cannot be a supported header.
    Mismatch(Error),
}

/// Look for the COPY header at the start of `buf`.
///
/// A signature mismatch is reported as soon as any available byte disagrees,
/// even if fewer than [`HEADER_LEN`] bytes have arrived.
pub fn scan_header(buf: &[u8]) -> HeaderScan {
    let n = buf.len().min(SIGNATURE.len());
    if buf[..n] != SIGNATURE[..n] {
        return HeaderScan::Mismatch(Error::MalformedHeader(format!(
            "expected PGCOPY signature, got {:02x?}",
            &buf[..n]
        )));
    }

    let Ok((raw, _)) = CopyHeaderRaw::ref_from_prefix(buf) else {
        return HeaderScan::Incomplete;
    };

    let header = CopyHeader {
        flags: raw.flags.get(),
        extension_len: raw.extension_len.get(),
    };
    if header.flags != 0 {
        return HeaderScan::Mismatch(Error::Unsupported(format!(
            "COPY header flags {:#010x}",
            header.flags
        )));
    }
    if header.extension_len != 0 {
        return HeaderScan::Mismatch(Error::Unsupported(format!(
            "COPY header extension of {} bytes",
            header.extension_len
        )));
    }
    HeaderScan::Matched(header)
}

/// Result of looking for one row at the start of a buffer.
#[derive(Debug)]
pub enum RowFrame<'a> {
    /// Part of the row has not arrived yet.
    Incomplete,
    /// The trailer marker (occupies [`FIELD_COUNT_LEN`] bytes).
    Trailer,
    /// A complete row occupying the first `len` bytes of the buffer.
    Row {
        /// The framed row
        row: CopyRow<'a>,
        /// Bytes consumed, including the field count prefix
        len: usize,
    },
}

/// Frame one row (or the trailer) at the start of `buf`.
///
/// Only complete rows are returned; the caller keeps the bytes of an
/// incomplete row until more data arrives.
pub fn frame_row(buf: &[u8]) -> Result<RowFrame<'_>> {
    if buf.len() < FIELD_COUNT_LEN {
        return Ok(RowFrame::Incomplete);
    }
    let (field_count, mut rest) = read_u16(buf)?;
    if field_count == TRAILER {
        return Ok(RowFrame::Trailer);
    }

    for _ in 0..field_count {
        if rest.len() < FIELD_LENGTH_LEN {
            return Ok(RowFrame::Incomplete);
        }
        let len;
        (len, rest) = read_u32(rest)?;
        if len == NULL_LENGTH {
            continue;
        }
        let Some((_, remaining)) = rest.split_at_checked(len as usize) else {
            return Ok(RowFrame::Incomplete);
        };
        rest = remaining;
    }

    let len = buf.len() - rest.len();
    Ok(RowFrame::Row {
        row: CopyRow {
            num_fields: field_count,
            fields_data: &buf[FIELD_COUNT_LEN..len],
        },
        len,
    })
}

/// One framed row of a COPY binary stream.
///
/// Field values borrow from the decoder's working buffer.
#[derive(Debug, Clone, Copy)]
pub struct CopyRow<'a> {
    /// Number of fields
    num_fields: u16,
    /// Field data (after the field count)
    fields_data: &'a [u8],
}

impl<'a> CopyRow<'a> {
    /// Get the number of fields.
    pub fn len(&self) -> usize {
        self.num_fields as usize
    }

    /// Check if there are no fields.
    pub fn is_empty(&self) -> bool {
        self.num_fields == 0
    }

    /// Create an iterator over field values.
    ///
    /// Each item is `Option<&[u8]>` where `None` represents NULL.
    pub fn iter(&self) -> CopyRowIter<'a> {
        CopyRowIter {
            remaining: self.fields_data,
        }
    }

    /// Get a field value by index.
    ///
    /// Returns `None` if the index is out of range, `Some(None)` for NULL.
    pub fn get(&self, index: usize) -> Option<Option<&'a [u8]>> {
        self.iter().nth(index)
    }

    /// Copy the field values into owned buffers.
    pub fn to_vec(&self) -> Vec<Option<Vec<u8>>> {
        self.iter().map(|v| v.map(<[u8]>::to_vec)).collect()
    }
}

/// Iterator over field values in a [`CopyRow`].
#[derive(Debug, Clone)]
pub struct CopyRowIter<'a> {
    remaining: &'a [u8],
}

impl<'a> Iterator for CopyRowIter<'a> {
    type Item = Option<&'a [u8]>;

    fn next(&mut self) -> Option<Self::Item> {
        let len;
        (len, self.remaining) = self.remaining.split_at_checked(FIELD_LENGTH_LEN)?;
        let len = u32::from_be_bytes([len[0], len[1], len[2], len[3]]);

        if len == NULL_LENGTH {
            Some(None)
        } else {
            let value;
            (value, self.remaining) = self.remaining.split_at_checked(len as usize)?;
            Some(Some(value))
        }
    }
}
