// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

pub mod error;
pub mod header;
pub mod transaction;
pub mod utils;

use error::CodecError;

pub const ADDRESS_LENGTH: usize = 20;

/// A 20-byte account address on the destination ledger.
#[derive(Default, Debug, Clone, PartialEq, Eq, Hash, Copy)]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    pub const ZERO: Self = Self([0u8; ADDRESS_LENGTH]);

    pub const fn new(address: [u8; ADDRESS_LENGTH]) -> Self {
        Self(address)
    }

    /// The zero address marks the native asset in fungible transfers and
    /// a failed signature recovery.
    pub fn is_zero(&self) -> bool {
        self == &Self::ZERO
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        let address =
            <[u8; ADDRESS_LENGTH]>::try_from(bytes).map_err(|_| CodecError::LengthMismatch {
                structure: String::from("Address"),
                expected: ADDRESS_LENGTH,
                actual: bytes.len(),
            })?;
        Ok(Self(address))
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::LowerHex for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            write!(f, "0x")?;
        }
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:x}")
    }
}

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_newtype_struct("Address", &self.0)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // In order to preserve the Serde data model and help analysis tools,
        // make sure to wrap our value in a container with the same name
        // as the original type.
        #[derive(::serde::Deserialize)]
        #[serde(rename = "Address")]
        struct Value([u8; ADDRESS_LENGTH]);

        let value = Value::deserialize(deserializer)?;
        Ok(Address::new(value.0))
    }
}
