//! Typed decoding of positional COPY rows.

use crate::conversion::FromWireValue;
use crate::error::{Error, Result};
use crate::protocol::copy::CopyRow;
use crate::protocol::types::Oid;

/// Trait for decoding a COPY row into a Rust type.
///
/// COPY binary output carries no column descriptions, so the caller supplies
/// the type OID of each column. The row must have exactly as many fields as
/// the tuple, matching how column mappings reject wider rows.
pub trait FromRow<'a>: Sized {
    /// Decode a row given the type OID of every column.
    fn from_row(types: &[Oid], row: CopyRow<'a>) -> Result<Self>;
}

/// Decode a single field value.
fn decode_field<'a, T: FromWireValue<'a>>(type_oid: Oid, value: Option<&'a [u8]>) -> Result<T> {
    match value {
        None => T::from_null(),
        Some(bytes) => T::from_binary(type_oid, bytes),
    }
}

macro_rules! impl_from_row_tuple {
    ($count:literal: $($idx:tt => $T:ident),+) => {
        impl<'a, $($T: FromWireValue<'a>),+> FromRow<'a> for ($($T,)+) {
            fn from_row(types: &[Oid], row: CopyRow<'a>) -> Result<Self> {
                if types.len() < $count || row.len() != $count {
                    return Err(Error::ColumnMismatch {
                        field_count: row.len(),
                        columns: types.len().min($count),
                    });
                }
                let mut iter = row.iter();
                Ok(($(
                    decode_field(types[$idx], iter.next().flatten())?,
                )+))
            }
        }
    };
}

impl_from_row_tuple!(1: 0 => T1);
impl_from_row_tuple!(2: 0 => T1, 1 => T2);
impl_from_row_tuple!(3: 0 => T1, 1 => T2, 2 => T3);
impl_from_row_tuple!(4: 0 => T1, 1 => T2, 2 => T3, 3 => T4);
impl_from_row_tuple!(5: 0 => T1, 1 => T2, 2 => T3, 3 => T4, 4 => T5);
impl_from_row_tuple!(6: 0 => T1, 1 => T2, 2 => T3, 3 => T4, 4 => T5, 5 => T6);
impl_from_row_tuple!(7: 0 => T1, 1 => T2, 2 => T3, 3 => T4, 4 => T5, 5 => T6, 6 => T7);
impl_from_row_tuple!(8: 0 => T1, 1 => T2, 2 => T3, 3 => T4, 4 => T5, 5 => T6, 6 => T7, 7 => T8);
