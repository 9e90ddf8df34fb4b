//! UUID type implementation (uuid crate).

use crate::error::{Error, Result};
use crate::protocol::types::{Oid, oid};

use super::FromWireValue;

impl FromWireValue<'_> for uuid::Uuid {
    fn from_binary(oid: Oid, bytes: &[u8]) -> Result<Self> {
        if oid != oid::UUID {
            return Err(Error::Decode(format!("cannot decode oid {} as UUID", oid)));
        }
        uuid::Uuid::from_slice(bytes).map_err(|e| Error::Decode(format!("invalid UUID: {}", e)))
    }
}
