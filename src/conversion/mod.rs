//! Column value conversion for COPY binary fields.
//!
//! The decoder never interprets field bytes itself. When a column mapping is
//! configured it hands each non-NULL field to a [`Converter`] together with the
//! column's declared type. [`WireConverter`] is the stock implementation keyed
//! by PostgreSQL type OID; any other converter can be injected instead.

mod array;
mod bytes;
mod numeric;
mod primitives;
mod row;
mod string;

#[cfg(feature = "with-chrono")]
mod chrono;
#[cfg(feature = "with-uuid")]
mod uuid;

use std::marker::PhantomData;

use crate::error::{Error, Result};
use crate::protocol::types::{Oid, oid};

pub use numeric::numeric_to_string;
pub use row::FromRow;

/// Converts raw field bytes into a native value given the column's declared type.
pub trait Converter {
    /// Declared column type, opaque to the decoder.
    type Type;

    /// Converted value.
    type Value;

    /// Convert one non-NULL field.
    fn convert(&self, bytes: &[u8], ty: &Self::Type) -> Result<Self::Value>;
}

impl<C: Converter + ?Sized> Converter for &C {
    type Type = C::Type;
    type Value = C::Value;

    fn convert(&self, bytes: &[u8], ty: &Self::Type) -> Result<Self::Value> {
        (*self).convert(bytes, ty)
    }
}

/// A [`Converter`] backed by a closure.
///
/// ```
/// use zero_pgcopy::conversion::{Converter, FnConverter};
///
/// let upper = FnConverter::new(|bytes: &[u8], _ty: &()| {
///     Ok(String::from_utf8_lossy(bytes).to_uppercase())
/// });
/// assert_eq!(upper.convert(b"abc", &()).unwrap(), "ABC");
/// ```
pub struct FnConverter<T, V, F> {
    f: F,
    _marker: PhantomData<fn(&T) -> V>,
}

impl<T, V, F> FnConverter<T, V, F>
where
    F: Fn(&[u8], &T) -> Result<V>,
{
    /// Wrap a closure.
    pub fn new(f: F) -> Self {
        Self {
            f,
            _marker: PhantomData,
        }
    }
}

impl<T, V, F> Converter for FnConverter<T, V, F>
where
    F: Fn(&[u8], &T) -> Result<V>,
{
    type Type = T;
    type Value = V;

    fn convert(&self, bytes: &[u8], ty: &T) -> Result<V> {
        (self.f)(bytes, ty)
    }
}

/// Trait for decoding PostgreSQL binary field values into Rust types.
///
/// The OID parameter allows implementations to check the PostgreSQL type
/// and reject incompatible types with clear error messages.
pub trait FromWireValue<'a>: Sized {
    /// Decode from NULL value.
    ///
    /// Default implementation returns an error. Override for types that can
    /// represent NULL (like `Option<T>`).
    fn from_null() -> Result<Self> {
        Err(Error::Decode("unexpected NULL value".into()))
    }

    /// Decode from binary format bytes.
    ///
    /// Binary format uses PostgreSQL's internal representation. Integers are
    /// big-endian, floats are IEEE 754, etc.
    fn from_binary(oid: Oid, bytes: &'a [u8]) -> Result<Self>;
}

// === Option<T> - NULL handling ===

impl<'a, T: FromWireValue<'a>> FromWireValue<'a> for Option<T> {
    fn from_null() -> Result<Self> {
        Ok(None)
    }

    fn from_binary(oid: Oid, bytes: &'a [u8]) -> Result<Self> {
        T::from_binary(oid, bytes).map(Some)
    }
}

/// Dynamically typed field value produced by [`WireConverter`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    /// `"char"` (single byte)
    Char(i8),
    Int2(i16),
    Int4(i32),
    Int8(i64),
    Oid(Oid),
    Float4(f32),
    Float8(f64),
    /// NUMERIC in its canonical text form (`"12.50"`, `"NaN"`, `"Infinity"`)
    Numeric(String),
    /// text, varchar, bpchar, name
    Text(String),
    /// json and jsonb documents as text
    Json(String),
    Bytea(Vec<u8>),
    /// One-dimensional array; `None` elements are NULL
    Array(Vec<Option<Value>>),
    #[cfg(feature = "with-uuid")]
    Uuid(::uuid::Uuid),
    #[cfg(feature = "with-chrono")]
    Date(::chrono::NaiveDate),
    #[cfg(feature = "with-chrono")]
    Time(::chrono::NaiveTime),
    #[cfg(feature = "with-chrono")]
    Timestamp(::chrono::NaiveDateTime),
    #[cfg(feature = "with-chrono")]
    TimestampTz(::chrono::DateTime<::chrono::Utc>),
    /// A type this converter does not know; bytes are passed through
    Other { oid: Oid, bytes: Vec<u8> },
}

impl Value {
    /// Get the value as a string slice for textual variants.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) | Value::Json(s) | Value::Numeric(s) => Some(s),
            _ => None,
        }
    }

    /// Get an integer value widened to i64.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Int2(v) => Some(v as i64),
            Value::Int4(v) => Some(v as i64),
            Value::Int8(v) => Some(v),
            Value::Oid(v) => Some(v as i64),
            _ => None,
        }
    }
}

/// Stock converter keyed by PostgreSQL type OID.
#[derive(Debug, Clone, Copy, Default)]
pub struct WireConverter;

impl WireConverter {
    /// Convert the bytes of a value of type `type_oid`.
    pub fn to_value(type_oid: Oid, bytes: &[u8]) -> Result<Value> {
        let value = match type_oid {
            oid::BOOL => Value::Bool(bool::from_binary(type_oid, bytes)?),
            oid::CHAR => Value::Char(i8::from_binary(type_oid, bytes)?),
            oid::INT2 => Value::Int2(i16::from_binary(type_oid, bytes)?),
            oid::INT4 => Value::Int4(i32::from_binary(type_oid, bytes)?),
            oid::INT8 => Value::Int8(i64::from_binary(type_oid, bytes)?),
            oid::OID => Value::Oid(u32::from_binary(type_oid, bytes)?),
            oid::FLOAT4 => Value::Float4(f32::from_binary(type_oid, bytes)?),
            oid::FLOAT8 => Value::Float8(f64::from_binary(type_oid, bytes)?),
            oid::NUMERIC => Value::Numeric(numeric_to_string(bytes)?),
            oid::TEXT | oid::VARCHAR | oid::BPCHAR | oid::NAME => {
                Value::Text(String::from_binary(type_oid, bytes)?)
            }
            oid::JSON | oid::JSONB => Value::Json(string::json_from_binary(type_oid, bytes)?),
            oid::BYTEA => Value::Bytea(Vec::<u8>::from_binary(type_oid, bytes)?),
            #[cfg(feature = "with-uuid")]
            oid::UUID => Value::Uuid(::uuid::Uuid::from_binary(type_oid, bytes)?),
            #[cfg(feature = "with-chrono")]
            oid::DATE => Value::Date(::chrono::NaiveDate::from_binary(type_oid, bytes)?),
            #[cfg(feature = "with-chrono")]
            oid::TIME => Value::Time(::chrono::NaiveTime::from_binary(type_oid, bytes)?),
            #[cfg(feature = "with-chrono")]
            oid::TIMESTAMP => {
                Value::Timestamp(::chrono::NaiveDateTime::from_binary(type_oid, bytes)?)
            }
            #[cfg(feature = "with-chrono")]
            oid::TIMESTAMPTZ => Value::TimestampTz(
                ::chrono::DateTime::<::chrono::Utc>::from_binary(type_oid, bytes)?,
            ),
            _ => match oid::array_element(type_oid) {
                Some(element_oid) => Value::Array(array::array_from_binary(element_oid, bytes)?),
                None => Value::Other {
                    oid: type_oid,
                    bytes: bytes.to_vec(),
                },
            },
        };
        Ok(value)
    }
}

impl Converter for WireConverter {
    type Type = Oid;
    type Value = Value;

    fn convert(&self, bytes: &[u8], ty: &Oid) -> Result<Value> {
        Self::to_value(*ty, bytes)
    }
}
