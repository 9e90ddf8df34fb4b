//! Decoded COPY records.

use crate::protocol::copy::CopyRow;

/// One decoded row, in the shape fixed by the decoder configuration.
///
/// Without a column mapping rows are positional raw bytes that borrow from the
/// decoder's buffer. With a mapping every field has been converted and is
/// keyed by its column.
#[derive(Debug)]
pub enum Record<'a, V> {
    /// Raw field values in wire order
    Positional(CopyRow<'a>),
    /// Converted field values keyed by column
    Mapped(MappedRow<'a, V>),
}

impl<'a, V> Record<'a, V> {
    /// Number of fields in the row.
    pub fn len(&self) -> usize {
        match self {
            Record::Positional(row) => row.len(),
            Record::Mapped(row) => row.len(),
        }
    }

    /// Check if the row has no fields.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy the record out of the decoder's buffer.
    pub fn into_owned(self) -> OwnedRecord<V> {
        match self {
            Record::Positional(row) => OwnedRecord::Positional(row.to_vec()),
            Record::Mapped(row) => OwnedRecord::Mapped(
                row.fields
                    .into_iter()
                    .map(|(key, value)| (key.to_owned(), value))
                    .collect(),
            ),
        }
    }
}

/// A row whose fields were converted through the column mapping.
///
/// Fields keep the order of the mapping. Keys borrow from the mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedRow<'a, V> {
    pub(crate) fields: Vec<(&'a str, Option<V>)>,
}

impl<'a, V> MappedRow<'a, V> {
    /// Get a field by column key.
    ///
    /// Returns `None` if the row has no such column, `Some(None)` for NULL.
    pub fn get(&self, key: &str) -> Option<Option<&V>> {
        self.fields
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_ref())
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if there are no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over `(key, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, Option<&V>)> + '_ {
        self.fields.iter().map(|(k, v)| (*k, v.as_ref()))
    }

    /// Take the `(key, value)` pairs.
    pub fn into_fields(self) -> Vec<(&'a str, Option<V>)> {
        self.fields
    }
}

/// An owned copy of a [`Record`].
#[derive(Debug, Clone, PartialEq)]
pub enum OwnedRecord<V> {
    /// Raw field values in wire order; `None` is NULL
    Positional(Vec<Option<Vec<u8>>>),
    /// Converted field values keyed by column
    Mapped(Vec<(String, Option<V>)>),
}

impl<V> OwnedRecord<V> {
    /// Raw field values, if the record is positional.
    pub fn as_positional(&self) -> Option<&[Option<Vec<u8>>]> {
        match self {
            OwnedRecord::Positional(fields) => Some(fields),
            OwnedRecord::Mapped(_) => None,
        }
    }

    /// Get a field by column key, if the record is mapped.
    pub fn get(&self, key: &str) -> Option<Option<&V>> {
        match self {
            OwnedRecord::Mapped(fields) => fields
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_ref()),
            OwnedRecord::Positional(_) => None,
        }
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        match self {
            OwnedRecord::Positional(fields) => fields.len(),
            OwnedRecord::Mapped(fields) => fields.len(),
        }
    }

    /// Check if there are no fields.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
