//! One-dimensional array values.
//!
//! Binary layout:
//! - 4 bytes: number of dimensions
//! - 4 bytes: flags (1 = has NULLs)
//! - 4 bytes: element type OID
//! - per dimension: 4 bytes length, 4 bytes lower bound
//! - per element: 4 bytes length (-1 = NULL) followed by the element bytes

use crate::error::{Error, Result};
use crate::protocol::codec::{read_bytes, read_i32, read_u32};
use crate::protocol::types::Oid;

use super::{Value, WireConverter};

pub(super) fn array_from_binary(element_oid: Oid, bytes: &[u8]) -> Result<Vec<Option<Value>>> {
    let (ndim, rest) = read_i32(bytes).map_err(to_decode)?;
    let (_flags, rest) = read_i32(rest).map_err(to_decode)?;
    let (wire_oid, mut rest) = read_u32(rest).map_err(to_decode)?;

    if wire_oid != element_oid {
        return Err(Error::Decode(format!(
            "array element oid {} does not match declared {}",
            wire_oid, element_oid
        )));
    }

    let len = match ndim {
        0 => return Ok(Vec::new()),
        1 => {
            let (len, after) = read_i32(rest).map_err(to_decode)?;
            let (_lower_bound, after) = read_i32(after).map_err(to_decode)?;
            rest = after;
            usize::try_from(len)
                .map_err(|_| Error::Decode(format!("invalid array length: {}", len)))?
        }
        _ => {
            return Err(Error::Decode(format!(
                "{}-dimensional arrays are not supported",
                ndim
            )));
        }
    };

    let mut elements = Vec::with_capacity(len.min(rest.len() / 4));
    for _ in 0..len {
        let elem_len;
        (elem_len, rest) = read_i32(rest).map_err(to_decode)?;
        if elem_len == -1 {
            elements.push(None);
            continue;
        }
        let elem_len = usize::try_from(elem_len)
            .map_err(|_| Error::Decode(format!("invalid array element length: {}", elem_len)))?;
        let elem;
        (elem, rest) = read_bytes(rest, elem_len).map_err(to_decode)?;
        elements.push(Some(WireConverter::to_value(element_oid, elem)?));
    }

    if !rest.is_empty() {
        return Err(Error::Decode(format!(
            "{} trailing bytes after array elements",
            rest.len()
        )));
    }
    Ok(elements)
}

/// Short reads inside a field are bad values, not a broken stream.
fn to_decode(err: Error) -> Error {
    match err {
        Error::Protocol(msg) => Error::Decode(format!("truncated array: {}", msg)),
        other => other,
    }
}
