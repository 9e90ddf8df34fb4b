use std::collections::VecDeque;

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::conversion::{Converter, WireConverter};
use crate::decoder::{CopyOutDecoder, Progress};
use crate::error::{Error, Result};
use crate::handler::{CopyHandler, QueueHandler};
use crate::record::OwnedRecord;

/// Pulls COPY binary data from an async reader and feeds it to a decoder.
pub struct CopyOutReader<R, C: Converter = WireConverter> {
    reader: R,
    decoder: CopyOutDecoder<C>,
    read_buffer: Vec<u8>,
    pending: VecDeque<OwnedRecord<C::Value>>,
    deferred: Option<Error>,
    done: bool,
}

impl<R: AsyncRead + Unpin> CopyOutReader<R, WireConverter> {
    /// Read positional records with default options.
    pub fn new(reader: R) -> Self {
        Self::with_decoder(reader, CopyOutDecoder::new())
    }
}

impl<R: AsyncRead + Unpin, C: Converter> CopyOutReader<R, C> {
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

    /// Decode the whole stream into `handler`.
    pub async fn read_to<H: CopyHandler<C::Value>>(&mut self, handler: &mut H) -> Result<()> {
        loop {
            let n = self.reader.read(&mut self.read_buffer).await?;
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
    pub async fn next_record(&mut self) -> Result<Option<OwnedRecord<C::Value>>> {
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

            let result = match self.reader.read(&mut self.read_buffer).await {
                Ok(0) => {
                    let mut queue = QueueHandler(&mut self.pending);
                    self.decoder.finish(&mut queue).map(|()| Progress::Finished)
                }
                Ok(n) => {
                    let mut queue = QueueHandler(&mut self.pending);
                    self.decoder.feed(&self.read_buffer[..n], &mut queue)
                }
                Err(e) => Err(e.into()),
            };
            match result {
                Ok(Progress::Finished) => self.done = true,
                Ok(Progress::NeedMore) => {}
                Err(e) => {
                    self.done = e.is_fatal();
                    self.deferred = Some(e);
                }
            }
        }
    }
}
