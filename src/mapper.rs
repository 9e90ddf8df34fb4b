//! Column mapping: converts positional raw fields into keyed values.

use crate::conversion::Converter;
use crate::error::{Error, Result};
use crate::protocol::copy::CopyRow;
use crate::record::MappedRow;

/// One column of a mapping.
///
/// `ty` is never interpreted by the decoder; it is passed to the converter
/// together with the field bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column<T> {
    /// Key the converted value is stored under
    pub key: String,
    /// Declared column type
    pub ty: T,
}

impl<T> Column<T> {
    /// Create a column.
    pub fn new(key: impl Into<String>, ty: T) -> Self {
        Self {
            key: key.into(),
            ty,
        }
    }
}

/// Converts the fields of a row through a [`Converter`] by position.
///
/// Field `i` of a row uses column `i` of the mapping. NULL fields are never
/// passed to the converter.
#[derive(Debug)]
pub struct FieldMapper<C: Converter> {
    columns: Vec<Column<C::Type>>,
    converter: C,
}

impl<C: Converter> FieldMapper<C> {
    /// Create a mapper over the given columns.
    pub fn new(columns: Vec<Column<C::Type>>, converter: C) -> Self {
        Self { columns, converter }
    }

    /// The configured columns.
    pub fn columns(&self) -> &[Column<C::Type>] {
        &self.columns
    }

    /// Convert every field of `row`.
    ///
    /// Fails if the row has more fields than there are columns, or if any field
    /// fails to convert. Nothing is returned for a failed row. A row with fewer
    /// fields than columns yields only the keys it has values for.
    pub fn map_row(&self, row: CopyRow<'_>) -> Result<MappedRow<'_, C::Value>> {
        if row.len() > self.columns.len() {
            return Err(Error::ColumnMismatch {
                field_count: row.len(),
                columns: self.columns.len(),
            });
        }

        let mut fields = Vec::with_capacity(row.len());
        for (column, value) in self.columns.iter().zip(row.iter()) {
            let value = match value {
                None => None,
                Some(bytes) => Some(
                    self.converter
                        .convert(bytes, &column.ty)
                        .map_err(|e| e.in_column(&column.key))?,
                ),
            };
            fields.push((column.key.as_str(), value));
        }
        Ok(MappedRow { fields })
    }
}
