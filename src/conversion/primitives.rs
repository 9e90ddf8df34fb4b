//! Primitive type implementations (bool, integers, floats).

use crate::error::{Error, Result};
use crate::protocol::types::{Oid, oid};

use super::FromWireValue;

fn fixed<const N: usize>(bytes: &[u8], what: &str) -> Result<[u8; N]> {
    bytes
        .try_into()
        .map_err(|_| Error::Decode(format!("invalid {} length: {}", what, bytes.len())))
}

// === Boolean ===

impl FromWireValue<'_> for bool {
    fn from_binary(oid: Oid, bytes: &[u8]) -> Result<Self> {
        if oid != oid::BOOL {
            return Err(Error::Decode(format!("cannot decode oid {} as bool", oid)));
        }
        let [b] = fixed::<1>(bytes, "boolean")?;
        Ok(b != 0)
    }
}

// === "char" ===

impl FromWireValue<'_> for i8 {
    fn from_binary(oid: Oid, bytes: &[u8]) -> Result<Self> {
        if oid != oid::CHAR {
            return Err(Error::Decode(format!("cannot decode oid {} as i8", oid)));
        }
        Ok(i8::from_be_bytes(fixed(bytes, "char")?))
    }
}

// === Integer types ===

impl FromWireValue<'_> for i16 {
    fn from_binary(oid: Oid, bytes: &[u8]) -> Result<Self> {
        if oid != oid::INT2 {
            return Err(Error::Decode(format!("cannot decode oid {} as i16", oid)));
        }
        Ok(i16::from_be_bytes(fixed(bytes, "i16")?))
    }
}

impl FromWireValue<'_> for i32 {
    fn from_binary(oid: Oid, bytes: &[u8]) -> Result<Self> {
        match oid {
            oid::INT2 => Ok(i16::from_be_bytes(fixed(bytes, "i16")?) as i32),
            oid::INT4 => Ok(i32::from_be_bytes(fixed(bytes, "i32")?)),
            _ => Err(Error::Decode(format!("cannot decode oid {} as i32", oid))),
        }
    }
}

impl FromWireValue<'_> for i64 {
    fn from_binary(oid: Oid, bytes: &[u8]) -> Result<Self> {
        match oid {
            oid::INT2 => Ok(i16::from_be_bytes(fixed(bytes, "i16")?) as i64),
            oid::INT4 => Ok(i32::from_be_bytes(fixed(bytes, "i32")?) as i64),
            oid::INT8 => Ok(i64::from_be_bytes(fixed(bytes, "i64")?)),
            _ => Err(Error::Decode(format!("cannot decode oid {} as i64", oid))),
        }
    }
}

impl FromWireValue<'_> for u32 {
    fn from_binary(oid: Oid, bytes: &[u8]) -> Result<Self> {
        if oid != oid::OID {
            return Err(Error::Decode(format!("cannot decode oid {} as u32", oid)));
        }
        Ok(u32::from_be_bytes(fixed(bytes, "oid")?))
    }
}

// === Float types ===

impl FromWireValue<'_> for f32 {
    fn from_binary(oid: Oid, bytes: &[u8]) -> Result<Self> {
        if oid != oid::FLOAT4 {
            return Err(Error::Decode(format!("cannot decode oid {} as f32", oid)));
        }
        Ok(f32::from_be_bytes(fixed(bytes, "f32")?))
    }
}

impl FromWireValue<'_> for f64 {
    fn from_binary(oid: Oid, bytes: &[u8]) -> Result<Self> {
        match oid {
            oid::FLOAT4 => Ok(f32::from_be_bytes(fixed(bytes, "f32")?) as f64),
            oid::FLOAT8 => Ok(f64::from_be_bytes(fixed(bytes, "f64")?)),
            _ => Err(Error::Decode(format!("cannot decode oid {} as f64", oid))),
        }
    }
}
