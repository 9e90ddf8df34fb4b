use std::collections::VecDeque;
use std::io::{ErrorKind, Read};

use crate::conversion::{Converter, WireConverter};
use crate::decoder::{CopyOutDecoder, Progress};
use crate::error::{Error, Result};
use crate::handler::{CopyHandler, QueueHandler};
use crate::record::OwnedRecord;

/// Pulls COPY binary data from a reader and feeds it to a decoder.
///
/// Each `read` is delivered to the decoder as one chunk, so records are
/// emitted as soon as the bytes completing them arrive.
///
/// # Example
///
/// ```
/// use std::io::Cursor;
/// use zero_pgcopy::sync::CopyOutReader;
///
/// let mut stream = b"PGCOPY\n\xff\r\n\0".to_vec();
/// stream.extend_from_slice(&[0; 8]);
/// stream.extend_from_slice(&[0, 1, 0xff, 0xff, 0xff, 0xff]);
/// stream.extend_from_slice(&[0xff, 0xff]);
///
/// let records = CopyOutReader::new(Cursor::new(stream)).collect::<Result<Vec<_>, _>>()?;
/// assert_eq!(records[0].as_positional(), Some(&[None][..]));
/// # Ok::<(), zero_pgcopy::Error>(())
/// ```
pub struct CopyOutReader<R, C: Converter = WireConverter> {
    reader: R,
    decoder: CopyOutDecoder<C>,
    read_buffer: Vec<u8>,
    pending: VecDeque<OwnedRecord<C::Value>>,
    deferred: Option<Error>,
    done: bool,
}

impl<R: Read> CopyOutReader<R, WireConverter> {
    /// Read positional records with default options.
    pub fn new(reader: R) -> Self {
        Self::with_decoder(reader, CopyOutDecoder::new())
    }
}

impl<R: Read, C: Converter> CopyOutReader<R, C> {
    /// Read through a configured decoder.
    pub fn with_decoder(reader: R, decoder: CopyOutDecoder<C>) -> Self {
        let read_buffer = vec![0; decoder.options().read_buffer_size.max(1)];
        Self {
            reader,
            decoder,
            read_buffer,
            pending: VecDeque::new(),
            deferred: None,
            done: false,
        }
    }

    /// The underlying decoder.
    pub fn decoder(&self) -> &CopyOutDecoder<C> {
        &self.decoder
    }

    /// Unwrap the underlying reader.
    pub fn into_inner(self) -> R {
        self.reader
    }

    fn read_chunk(&mut self) -> Result<usize> {
        loop {
            match self.reader.read(&mut self.read_buffer) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Decode the whole stream into `handler`.
    ///
    /// Returns once the trailer has been decoded. Fails with
    /// [`Error::UnexpectedEof`](crate::Error::UnexpectedEof) if the reader
    /// ends first.
    pub fn read_to<H: CopyHandler<C::Value>>(&mut self, handler: &mut H) -> Result<()> {
        loop {
            let n = self.read_chunk()?;
            if n == 0 {
                return self.decoder.finish(handler);
            }
            if self.decoder.feed(&self.read_buffer[..n], handler)? == Progress::Finished {
                tracing::debug!(rows = self.decoder.rows_emitted(), "COPY stream decoded");
                return Ok(());
            }
        }
    }

    /// Read the next record.
    ///
    /// Returns `Ok(None)` after the trailer, or after a fatal error has been
    /// returned once. A conversion error only skips the failing row.
    pub fn next_record(&mut self) -> Result<Option<OwnedRecord<C::Value>>> {
        loop {
            if let Some(record) = self.pending.pop_front() {
                return Ok(Some(record));
            }
            if let Some(err) = self.deferred.take() {
                return Err(err);
            }
            if self.done {
                return Ok(None);
            }

            let result = match self.read_chunk() {
                Ok(0) => {
                    let mut queue = QueueHandler(&mut self.pending);
                    self.decoder.finish(&mut queue).map(|()| Progress::Finished)
                }
                Ok(n) => {
                    let mut queue = QueueHandler(&mut self.pending);
                    self.decoder.feed(&self.read_buffer[..n], &mut queue)
                }
                Err(e) => Err(e),
            };
            match result {
                Ok(Progress::Finished) => self.done = true,
                Ok(Progress::NeedMore) => {}
                Err(e) => {
                    self.done = e.is_fatal();
                    // Rows decoded before the failure come out first.
                    self.deferred = Some(e);
                }
            }
        }
    }
}

impl<R: Read, C: Converter> Iterator for CopyOutReader<R, C> {
    type Item = Result<OwnedRecord<C::Value>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}
