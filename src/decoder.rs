//! Incremental COPY binary decoder.
//!
//! The decoder is push-driven: the transport hands it each chunk as it arrives
//! and the decoder emits whatever rows the bytes seen so far complete. Chunk
//! boundaries carry no meaning; a header, row or trailer may be split anywhere.
//!
//! ```text
//! chunk ─► remainder ++ chunk ─► header (once) ─► rows ─► trailer
//!                 ▲                                   │
//!                 └──────── unconsumed suffix ◄───────┘
//! ```

use crate::conversion::{Converter, WireConverter};
use crate::error::{Error, Result};
use crate::handler::CopyHandler;
use crate::mapper::{Column, FieldMapper};
use crate::opts::{CopyOptions, HeaderPolicy};
use crate::protocol::copy::{
    CopyHeader, FIELD_COUNT_LEN, HEADER_LEN, HeaderScan, RowFrame, frame_row, scan_header,
};
use crate::protocol::types::Oid;
use crate::record::Record;

/// Decoder state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    AwaitingHeader,
    Rows,
    Finished,
    Failed,
}

/// Where the stream stands after a call to [`CopyOutDecoder::feed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// The trailer has not been seen; more input is expected.
    NeedMore,
    /// The trailer has been seen and the handler's `end` was called.
    Finished,
}

/// Decoder for one COPY binary stream (copy-out direction).
///
/// Without a column mapping rows are emitted as [`Record::Positional`] raw
/// fields. With a mapping every non-NULL field is converted by `C` and rows are
/// emitted as [`Record::Mapped`].
///
/// A decoder is used for exactly one stream.
///
/// # Example
///
/// ```
/// use zero_pgcopy::{CollectHandler, Column, CopyOutDecoder, Progress, Value};
/// use zero_pgcopy::protocol::types::oid;
///
/// let mut stream = b"PGCOPY\n\xff\r\n\0".to_vec();
/// stream.extend_from_slice(&[0; 8]);
/// stream.extend_from_slice(&[0, 1, 0, 0, 0, 3, b'A', b'B', b'C']);
/// stream.extend_from_slice(&[0xff, 0xff]);
///
/// let mut decoder = CopyOutDecoder::with_mapping(vec![Column::new("name", oid::TEXT)]);
/// let mut handler = CollectHandler::new();
/// let (head, tail) = stream.split_at(12);
/// assert_eq!(decoder.feed(head, &mut handler)?, Progress::NeedMore);
/// assert_eq!(decoder.feed(tail, &mut handler)?, Progress::Finished);
///
/// let name = handler.records()[0].get("name");
/// assert_eq!(name, Some(Some(&Value::Text("ABC".into()))));
/// # Ok::<(), zero_pgcopy::Error>(())
/// ```
pub struct CopyOutDecoder<C: Converter = WireConverter> {
    options: CopyOptions,
    mapper: Option<FieldMapper<C>>,
    state: State,
    header: Option<CopyHeader>,
    /// Bytes of an incomplete header or row carried to the next chunk
    remainder: Vec<u8>,
    rows_emitted: u64,
    mismatch_logged: bool,
}

impl CopyOutDecoder<WireConverter> {
    /// Create a decoder that emits positional rows of raw bytes.
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Create a decoder that converts fields by PostgreSQL type OID.
    pub fn with_mapping(columns: Vec<Column<Oid>>) -> Self {
        Self::with_converter(columns, WireConverter)
    }
}

impl Default for CopyOutDecoder<WireConverter> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Converter> CopyOutDecoder<C> {
    /// Create a decoder that converts fields with `converter`.
    ///
    /// Field `i` of each row is converted with the type of `columns[i]`.
    pub fn with_converter(columns: Vec<Column<C::Type>>, converter: C) -> Self {
        Self::build(Some(FieldMapper::new(columns, converter)))
    }

    fn build(mapper: Option<FieldMapper<C>>) -> Self {
        Self {
            options: CopyOptions::default(),
            mapper,
            state: State::AwaitingHeader,
            header: None,
            remainder: Vec::new(),
            rows_emitted: 0,
            mismatch_logged: false,
        }
    }

    /// Replace the decoder options.
    pub fn with_options(mut self, options: CopyOptions) -> Self {
        self.remainder.reserve(options.remainder_capacity);
        self.options = options;
        self
    }

    /// The decoder options.
    pub fn options(&self) -> &CopyOptions {
        &self.options
    }

    /// The column mapping, if configured.
    pub fn columns(&self) -> Option<&[Column<C::Type>]> {
        self.mapper.as_ref().map(FieldMapper::columns)
    }

    /// The stream header, once received.
    pub fn header(&self) -> Option<CopyHeader> {
        self.header
    }

    /// Whether the header has been recognized.
    pub fn is_header_received(&self) -> bool {
        self.header.is_some()
    }

    /// Whether the trailer has been recognized.
    pub fn is_finished(&self) -> bool {
        self.state == State::Finished
    }

    /// Number of rows delivered to handlers.
    pub fn rows_emitted(&self) -> u64 {
        self.rows_emitted
    }

    /// Number of bytes held for the next chunk.
    pub fn buffered(&self) -> usize {
        self.remainder.len()
    }

    /// Decode one delivered chunk.
    ///
    /// Emits every row the chunk completes (or at most one, with
    /// [`RowsPerPass::One`](crate::RowsPerPass::One)) and keeps any incomplete
    /// tail for the next call. Input after the trailer is ignored.
    ///
    /// A row that fails to convert, or that the handler rejects, is consumed
    /// and the error returned; later bytes stay buffered. Header errors are
    /// fatal and every later call fails with [`Error::Broken`].
    pub fn feed<H: CopyHandler<C::Value>>(
        &mut self,
        chunk: &[u8],
        handler: &mut H,
    ) -> Result<Progress> {
        match self.state {
            State::Finished => {
                if !chunk.is_empty() {
                    tracing::debug!(len = chunk.len(), "ignoring COPY data after trailer");
                }
                return Ok(Progress::Finished);
            }
            State::Failed => return Err(Error::Broken),
            State::AwaitingHeader | State::Rows => {}
        }
        tracing::trace!(
            chunk = chunk.len(),
            buffered = self.remainder.len(),
            "COPY chunk"
        );

        let mut offset = 0;
        let result = if self.remainder.is_empty() {
            // Nothing carried over: decode in place and copy only the tail.
            let result = self.decode_pass(chunk, &mut offset, handler);
            self.remainder.extend_from_slice(&chunk[offset..]);
            result
        } else {
            let mut working = std::mem::take(&mut self.remainder);
            working.extend_from_slice(chunk);
            let result = self.decode_pass(&working, &mut offset, handler);
            working.drain(..offset);
            self.remainder = working;
            result
        };

        if self.state == State::Finished {
            self.remainder.clear();
        }
        result
    }

    /// Signal that no more input will arrive.
    ///
    /// Rows still buffered because of [`RowsPerPass::One`](crate::RowsPerPass::One)
    /// are emitted first. Fails with [`Error::UnexpectedEof`] if the trailer
    /// was never received.
    pub fn finish<H: CopyHandler<C::Value>>(&mut self, handler: &mut H) -> Result<()> {
        while self.state == State::Rows && !self.remainder.is_empty() {
            let before = (self.remainder.len(), self.rows_emitted);
            self.feed(&[], handler)?;
            if (self.remainder.len(), self.rows_emitted) == before {
                break;
            }
        }

        match self.state {
            State::Finished => Ok(()),
            State::Failed => Err(Error::Broken),
            State::AwaitingHeader | State::Rows => Err(Error::UnexpectedEof {
                buffered: self.remainder.len(),
            }),
        }
    }

    /// Run one decode pass over `buf`, advancing `offset` past consumed bytes.
    fn decode_pass<H: CopyHandler<C::Value>>(
        &mut self,
        buf: &[u8],
        offset: &mut usize,
        handler: &mut H,
    ) -> Result<Progress> {
        if self.state == State::AwaitingHeader {
            match scan_header(buf) {
                HeaderScan::Incomplete => return Ok(Progress::NeedMore),
                HeaderScan::Matched(header) => {
                    tracing::trace!("COPY binary header received");
                    *offset += HEADER_LEN;
                    self.state = State::Rows;
                    self.header = Some(header);
                    handler.header(header)?;
                }
                HeaderScan::Mismatch(err) => match self.options.header {
                    HeaderPolicy::Strict => {
                        self.state = State::Failed;
                        return Err(err);
                    }
                    HeaderPolicy::Lenient => {
                        if buf.len() >= HEADER_LEN && !self.mismatch_logged {
                            tracing::warn!("{err}; waiting for a valid COPY header");
                            self.mismatch_logged = true;
                        }
                        return Ok(Progress::NeedMore);
                    }
                },
            }
        }

        let mut emitted = 0;
        while self.options.rows_per_pass.allows(emitted) {
            let frame = match frame_row(&buf[*offset..]) {
                Ok(frame) => frame,
                Err(err) => {
                    self.state = State::Failed;
                    return Err(err);
                }
            };
            match frame {
                RowFrame::Incomplete => break,
                RowFrame::Trailer => {
                    *offset += FIELD_COUNT_LEN;
                    self.state = State::Finished;
                    tracing::debug!(rows = self.rows_emitted, "COPY binary trailer received");
                    handler.end()?;
                    return Ok(Progress::Finished);
                }
                RowFrame::Row { row, len } => {
                    *offset += len;
                    emitted += 1;
                    let record = match &self.mapper {
                        None => Record::Positional(row),
                        Some(mapper) => Record::Mapped(mapper.map_row(row)?),
                    };
                    handler.row(record)?;
                    self.rows_emitted += 1;
                }
            }
        }
        Ok(Progress::NeedMore)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversion::{FnConverter, Value};
    use crate::handler::CollectHandler;
    use crate::opts::RowsPerPass;
    use crate::protocol::copy::SIGNATURE;
    use crate::protocol::types::oid;
    use crate::record::OwnedRecord;

    fn header() -> Vec<u8> {
        let mut buf = SIGNATURE.to_vec();
        buf.extend_from_slice(&[0; 8]);
        buf
    }

    fn row(fields: &[Option<&[u8]>]) -> Vec<u8> {
        let mut buf = (fields.len() as u16).to_be_bytes().to_vec();
        for field in fields {
            match field {
                Some(bytes) => {
                    buf.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
                    buf.extend_from_slice(bytes);
                }
                None => buf.extend_from_slice(&u32::MAX.to_be_bytes()),
            }
        }
        buf
    }

    fn scenario() -> Vec<u8> {
        let mut buf = header();
        buf.extend(row(&[Some(b"ABC"), None]));
        buf.extend_from_slice(&[0xFF, 0xFF]);
        buf
    }

    #[test]
    fn test_scenario_single_chunk() {
        let mut decoder = CopyOutDecoder::new();
        let mut handler = CollectHandler::new();
        assert_eq!(
            decoder.feed(&scenario(), &mut handler).unwrap(),
            Progress::Finished
        );
        assert_eq!(
            handler.records(),
            &[OwnedRecord::Positional(vec![Some(b"ABC".to_vec()), None])]
        );
        assert!(handler.is_ended());
        assert_eq!(decoder.buffered(), 0);
        decoder.finish(&mut handler).unwrap();
    }

    #[test]
    fn test_header_split_is_buffered() {
        let stream = scenario();
        let mut decoder = CopyOutDecoder::new();
        let mut handler = CollectHandler::new();
        decoder.feed(&stream[..7], &mut handler).unwrap();
        assert!(!decoder.is_header_received());
        assert_eq!(decoder.buffered(), 7);
        decoder.feed(&stream[7..20], &mut handler).unwrap();
        assert!(decoder.is_header_received());
        // 19 header bytes consumed, one byte of the field count held
        assert_eq!(decoder.buffered(), 1);
        assert!(handler.is_empty());
        decoder.feed(&stream[20..], &mut handler).unwrap();
        assert_eq!(handler.len(), 1);
        assert!(decoder.is_finished());
    }

    #[test]
    fn test_every_split_point() {
        let stream = scenario();
        for split in 0..=stream.len() {
            let mut decoder = CopyOutDecoder::new();
            let mut handler = CollectHandler::new();
            decoder.feed(&stream[..split], &mut handler).unwrap();
            decoder.feed(&stream[split..], &mut handler).unwrap();
            assert!(handler.is_ended(), "split at {split}");
            assert_eq!(
                handler.into_records(),
                vec![OwnedRecord::Positional(vec![Some(b"ABC".to_vec()), None])]
            );
        }
    }

    #[test]
    fn test_byte_at_a_time() {
        let mut stream = header();
        for i in 0..50u32 {
            stream.extend(row(&[Some(&i.to_be_bytes()), None, Some(b"")]));
        }
        stream.extend_from_slice(&[0xFF, 0xFF]);

        let mut decoder = CopyOutDecoder::new();
        let mut handler = CollectHandler::new();
        for byte in &stream {
            decoder.feed(std::slice::from_ref(byte), &mut handler).unwrap();
            assert!(decoder.buffered() < 19 + 2 + 4 + 4 + 4 + 4);
        }
        assert!(decoder.is_finished());
        assert_eq!(decoder.rows_emitted(), 50);
        let records = handler.into_records();
        assert_eq!(
            records[49].as_positional().unwrap(),
            &[Some(49u32.to_be_bytes().to_vec()), None, Some(Vec::new())]
        );
    }

    /// Counts every callback so duplicates show up.
    #[derive(Default)]
    struct Calls {
        headers: usize,
        rows: usize,
        ends: usize,
    }

    impl<V> CopyHandler<V> for Calls {
        fn header(&mut self, _header: CopyHeader) -> Result<()> {
            self.headers += 1;
            Ok(())
        }

        fn row(&mut self, _record: Record<'_, V>) -> Result<()> {
            self.rows += 1;
            Ok(())
        }

        fn end(&mut self) -> Result<()> {
            self.ends += 1;
            Ok(())
        }
    }

    #[test]
    fn test_many_rows_one_chunk() {
        let mut stream = header();
        for _ in 0..100 {
            stream.extend(row(&[Some(b"x")]));
        }
        stream.extend_from_slice(&[0xFF, 0xFF]);

        let mut decoder = CopyOutDecoder::new();
        let mut calls = Calls::default();
        assert_eq!(decoder.feed(&stream, &mut calls).unwrap(), Progress::Finished);
        assert_eq!(decoder.feed(&[0xFF, 0xFF], &mut calls).unwrap(), Progress::Finished);
        decoder.finish(&mut calls).unwrap();
        assert_eq!(calls.headers, 1);
        assert_eq!(calls.rows, 100);
        assert_eq!(calls.ends, 1);
    }


    #[test]
    fn test_incomplete_row_kept_whole() {
        let stream = scenario();
        let mut decoder = CopyOutDecoder::new();
        let mut handler = CollectHandler::new();
        // header + count + first length + "AB"
        decoder.feed(&stream[..19 + 2 + 4 + 2], &mut handler).unwrap();
        assert!(handler.is_empty());
        assert_eq!(decoder.buffered(), 8);
        decoder.feed(&stream[27..], &mut handler).unwrap();
        assert_eq!(handler.len(), 1);
    }

    #[test]
    fn test_rows_per_pass_one() {
        let mut stream = header();
        stream.extend(row(&[Some(b"1")]));
        stream.extend(row(&[Some(b"2")]));
        stream.extend_from_slice(&[0xFF, 0xFF]);

        let mut decoder = CopyOutDecoder::new().with_options(CopyOptions {
            rows_per_pass: RowsPerPass::One,
            ..CopyOptions::default()
        });
        let mut handler = CollectHandler::new();
        assert_eq!(decoder.feed(&stream, &mut handler).unwrap(), Progress::NeedMore);
        assert_eq!(handler.len(), 1);
        // The second row waits for the next delivery, even an empty one.
        assert_eq!(decoder.feed(&[], &mut handler).unwrap(), Progress::NeedMore);
        assert_eq!(handler.len(), 2);
        assert_eq!(decoder.feed(&[], &mut handler).unwrap(), Progress::Finished);
        assert!(handler.is_ended());
    }

    #[test]
    fn test_finish_drains_one_per_pass() {
        let mut stream = header();
        for _ in 0..3 {
            stream.extend(row(&[None]));
        }
        stream.extend_from_slice(&[0xFF, 0xFF]);

        let mut decoder = CopyOutDecoder::new().with_options(CopyOptions::legacy());
        let mut handler = CollectHandler::new();
        decoder.feed(&stream, &mut handler).unwrap();
        assert_eq!(handler.len(), 1);
        decoder.finish(&mut handler).unwrap();
        assert_eq!(handler.len(), 3);
        assert!(handler.is_ended());
    }

    #[test]
    fn test_finish_without_trailer() {
        let mut stream = header();
        stream.extend(row(&[Some(b"x")]));
        let mut decoder = CopyOutDecoder::new();
        let mut handler = CollectHandler::new();
        decoder.feed(&stream[..stream.len() - 1], &mut handler).unwrap();
        assert_eq!(handler.len(), 0);
        assert!(matches!(
            decoder.finish(&mut handler),
            Err(Error::UnexpectedEof { buffered: 6 })
        ));

        let mut decoder = CopyOutDecoder::new();
        decoder.feed(&stream, &mut handler).unwrap();
        assert_eq!(handler.len(), 1);
        assert!(matches!(
            decoder.finish(&mut handler),
            Err(Error::UnexpectedEof { buffered: 0 })
        ));
    }

    #[test]
    fn test_strict_header_mismatch_is_fatal() {
        let mut decoder = CopyOutDecoder::new();
        let mut handler = CollectHandler::new();
        let err = decoder.feed(b"COPY", &mut handler).unwrap_err();
        assert!(matches!(err, Error::MalformedHeader(_)));
        assert!(matches!(
            decoder.feed(&scenario(), &mut handler),
            Err(Error::Broken)
        ));
    }

    #[test]
    fn test_lenient_header_mismatch_waits() {
        let mut bad = scenario();
        bad[0] = b'X';
        let mut decoder = CopyOutDecoder::new().with_options(CopyOptions {
            header: HeaderPolicy::Lenient,
            ..CopyOptions::default()
        });
        let mut handler = CollectHandler::new();
        assert_eq!(decoder.feed(&bad, &mut handler).unwrap(), Progress::NeedMore);
        assert_eq!(decoder.feed(&bad, &mut handler).unwrap(), Progress::NeedMore);
        assert!(handler.is_empty());
        assert!(!decoder.is_header_received());
        assert_eq!(decoder.buffered(), bad.len() * 2);
    }

    #[test]
    fn test_input_after_trailer_ignored() {
        let mut decoder = CopyOutDecoder::new();
        let mut handler = CollectHandler::new();
        let mut stream = scenario();
        stream.extend(row(&[Some(b"late")]));
        decoder.feed(&stream, &mut handler).unwrap();
        assert_eq!(
            decoder.feed(&row(&[None]), &mut handler).unwrap(),
            Progress::Finished
        );
        assert_eq!(handler.len(), 1);
        assert_eq!(decoder.buffered(), 0);
    }

    #[test]
    fn test_mapped_scenario() {
        let calls = std::cell::Cell::new(0);
        let converter = FnConverter::new(|bytes: &[u8], ty: &u8| {
            calls.set(calls.get() + 1);
            Ok((*ty, bytes.to_vec()))
        });
        let mut decoder =
            CopyOutDecoder::with_converter(vec![Column::new("a", 1), Column::new("b", 2)], converter);
        let mut handler = CollectHandler::new();
        decoder.feed(&scenario(), &mut handler).unwrap();
        assert_eq!(
            handler.records(),
            &[OwnedRecord::Mapped(vec![
                ("a".to_string(), Some((1, b"ABC".to_vec()))),
                ("b".to_string(), None),
            ])]
        );
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_conversion_error_consumes_row() {
        let mut stream = header();
        stream.extend(row(&[Some(b"not an int")]));
        stream.extend(row(&[Some(&7_i32.to_be_bytes())]));
        stream.extend_from_slice(&[0xFF, 0xFF]);

        let mut decoder = CopyOutDecoder::with_mapping(vec![Column::new("n", oid::INT4)]);
        let mut handler = CollectHandler::new();
        let err = decoder.feed(&stream, &mut handler).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
        assert!(handler.is_empty());
        assert_eq!(decoder.rows_emitted(), 0);

        // The failed row is gone; the rest decodes on the next delivery.
        assert_eq!(decoder.feed(&[], &mut handler).unwrap(), Progress::Finished);
        assert_eq!(handler.records()[0].get("n"), Some(Some(&Value::Int4(7))));
    }

    #[test]
    fn test_column_mismatch() {
        let mut decoder = CopyOutDecoder::with_mapping(vec![Column::new("a", oid::TEXT)]);
        let mut handler = CollectHandler::new();
        assert!(matches!(
            decoder.feed(&scenario(), &mut handler),
            Err(Error::ColumnMismatch {
                field_count: 2,
                columns: 1
            })
        ));
        assert!(handler.is_empty());
    }

    #[test]
    fn test_high_bit_field_length_waits() {
        let mut stream = header();
        stream.extend_from_slice(&[0x00, 0x01, 0x80, 0x00, 0x00, 0x00, b'x']);
        let mut decoder = CopyOutDecoder::new();
        let mut handler = CollectHandler::new();
        assert_eq!(decoder.feed(&stream, &mut handler).unwrap(), Progress::NeedMore);
        assert_eq!(decoder.buffered(), 7);
        assert!(handler.is_empty());
        assert!(matches!(
            decoder.finish(&mut handler),
            Err(Error::UnexpectedEof { buffered: 7 })
        ));
    }

    #[test]
    fn test_lenient_header_with_flags_waits() {
        let mut stream = header();
        stream[14] = 1;
        stream.extend(row(&[Some(b"x")]));
        stream.extend_from_slice(&[0xFF, 0xFF]);
        let mut decoder = CopyOutDecoder::new().with_options(CopyOptions {
            header: HeaderPolicy::Lenient,
            ..CopyOptions::default()
        });
        let mut handler = CollectHandler::new();
        assert_eq!(decoder.feed(&stream, &mut handler).unwrap(), Progress::NeedMore);
        assert_eq!(decoder.feed(&[0; 4], &mut handler).unwrap(), Progress::NeedMore);
        assert!(!decoder.is_header_received());
        assert!(handler.is_empty());
        assert_eq!(decoder.buffered(), stream.len() + 4);

        let mut extended = header();
        extended[18] = 8;
        let mut decoder = CopyOutDecoder::new().with_options(CopyOptions::legacy());
        assert_eq!(decoder.feed(&extended, &mut handler).unwrap(), Progress::NeedMore);
        assert!(!decoder.is_header_received());
    }
}
