//! Record sinks.

#[cfg(any(feature = "sync", feature = "tokio"))]
use std::collections::VecDeque;

use crate::error::Result;
use crate::protocol::copy::CopyHeader;
use crate::record::{OwnedRecord, Record};

/// Receives the output of a COPY decoder.
///
/// Callback pattern for one stream:
/// ```text
/// header → row* → end
/// ```
///
/// `V` is the converted value type when a column mapping is configured.
pub trait CopyHandler<V> {
    /// Called once when the header has been recognized.
    fn header(&mut self, header: CopyHeader) -> Result<()> {
        let _ = header;
        Ok(())
    }

    /// Called for each decoded row.
    fn row(&mut self, record: Record<'_, V>) -> Result<()>;

    /// Called once when the trailer has been recognized.
    fn end(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<V, H: CopyHandler<V> + ?Sized> CopyHandler<V> for &mut H {
    fn header(&mut self, header: CopyHeader) -> Result<()> {
        (**self).header(header)
    }

    fn row(&mut self, record: Record<'_, V>) -> Result<()> {
        (**self).row(record)
    }

    fn end(&mut self) -> Result<()> {
        (**self).end()
    }
}

/// A handler that only counts rows.
#[derive(Debug, Default)]
pub struct CountHandler {
    rows: u64,
    ended: bool,
}

impl CountHandler {
    /// Create a new count handler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows seen.
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Whether the end of the stream was signalled.
    pub fn is_ended(&self) -> bool {
        self.ended
    }
}

impl<V> CopyHandler<V> for CountHandler {
    fn row(&mut self, _record: Record<'_, V>) -> Result<()> {
        self.rows += 1;
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.ended = true;
        Ok(())
    }
}

/// Handler that collects owned records.
///
/// # Example
///
/// ```
/// use zero_pgcopy::{CollectHandler, CopyOutDecoder};
///
/// let mut decoder = CopyOutDecoder::new();
/// let mut handler = CollectHandler::new();
/// decoder.feed(b"PGCOPY\n\xff\r\n\0\0\0\0\0\0\0\0\0\xff\xff", &mut handler)?;
/// assert!(handler.is_ended());
/// assert!(handler.is_empty());
/// # Ok::<(), zero_pgcopy::Error>(())
/// ```
#[derive(Debug)]
pub struct CollectHandler<V> {
    header: Option<CopyHeader>,
    records: Vec<OwnedRecord<V>>,
    ended: bool,
}

impl<V> Default for CollectHandler<V> {
    fn default() -> Self {
        Self {
            header: None,
            records: Vec::new(),
            ended: false,
        }
    }
}

impl<V> CollectHandler<V> {
    /// Create a new collect handler.
    pub fn new() -> Self {
        Self::default()
    }

    /// The header, once received.
    pub fn header(&self) -> Option<CopyHeader> {
        self.header
    }

    /// Get collected records.
    pub fn records(&self) -> &[OwnedRecord<V>] {
        &self.records
    }

    /// Take collected records.
    pub fn into_records(self) -> Vec<OwnedRecord<V>> {
        self.records
    }

    /// Remove and return the records collected so far.
    pub fn drain(&mut self) -> std::vec::Drain<'_, OwnedRecord<V>> {
        self.records.drain(..)
    }

    /// Get the number of collected records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if no records were collected.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether the end of the stream was signalled.
    pub fn is_ended(&self) -> bool {
        self.ended
    }
}

impl<V> CopyHandler<V> for CollectHandler<V> {
    fn header(&mut self, header: CopyHeader) -> Result<()> {
        self.header = Some(header);
        Ok(())
    }

    fn row(&mut self, record: Record<'_, V>) -> Result<()> {
        self.records.push(record.into_owned());
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.ended = true;
        Ok(())
    }
}

/// Appends owned records to a queue drained by the reader adapters.
#[cfg(any(feature = "sync", feature = "tokio"))]
pub(crate) struct QueueHandler<'a, V>(pub(crate) &'a mut VecDeque<OwnedRecord<V>>);

#[cfg(any(feature = "sync", feature = "tokio"))]
impl<V> CopyHandler<V> for QueueHandler<'_, V> {
    fn row(&mut self, record: Record<'_, V>) -> Result<()> {
        self.0.push_back(record.into_owned());
        Ok(())
    }
}
