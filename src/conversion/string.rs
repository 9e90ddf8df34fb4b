//! String type implementations (&str, String) and JSON documents.

use crate::error::{Error, Result};
use crate::protocol::types::{Oid, oid};

use super::FromWireValue;

/// First byte of every binary jsonb value.
const JSONB_VERSION: u8 = 1;

fn utf8(bytes: &[u8]) -> Result<&str> {
    simdutf8::compat::from_utf8(bytes).map_err(|e| Error::Decode(format!("invalid UTF-8: {}", e)))
}

impl<'a> FromWireValue<'a> for &'a str {
    fn from_binary(oid: Oid, bytes: &'a [u8]) -> Result<Self> {
        if !matches!(oid, oid::TEXT | oid::VARCHAR | oid::BPCHAR | oid::NAME) {
            return Err(Error::Decode(format!("cannot decode oid {} as str", oid)));
        }
        utf8(bytes)
    }
}

impl FromWireValue<'_> for String {
    fn from_binary(oid: Oid, bytes: &[u8]) -> Result<Self> {
        match oid {
            oid::TEXT | oid::VARCHAR | oid::BPCHAR | oid::NAME => utf8(bytes).map(str::to_owned),
            oid::JSON | oid::JSONB => json_from_binary(oid, bytes),
            _ => Err(Error::Decode(format!(
                "cannot decode oid {} as String",
                oid
            ))),
        }
    }
}

/// Decode a json or jsonb value to its text.
///
/// Binary jsonb is a version byte followed by the document text.
pub(crate) fn json_from_binary(oid: Oid, bytes: &[u8]) -> Result<String> {
    let text = match oid {
        oid::JSON => bytes,
        oid::JSONB => match bytes.split_first() {
            Some((&JSONB_VERSION, rest)) => rest,
            Some((version, _)) => {
                return Err(Error::Decode(format!(
                    "unsupported jsonb version: {}",
                    version
                )));
            }
            None => return Err(Error::Decode("empty jsonb value".into())),
        },
        _ => return Err(Error::Decode(format!("cannot decode oid {} as json", oid))),
    };
    utf8(text).map(str::to_owned)
}
