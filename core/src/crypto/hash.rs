// SPDX-License-Identifier: Apache-2.0

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use tiny_keccak::{Hasher, Keccak};

pub const HASH_LENGTH: usize = 32;

/// Computes the keccak256 digest of the given bytes.
pub fn keccak256(data: &[u8]) -> HashValue {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut output = [0u8; HASH_LENGTH];
    hasher.finalize(&mut output);
    HashValue::new(output)
}

/// Computes the keccak256 digest of `left ‖ right`. This is the node
/// combiner for the commit Merkle tree.
pub fn hash_inner(left: &[u8], right: &[u8]) -> HashValue {
    let mut hasher = Keccak::v256();
    hasher.update(left);
    hasher.update(right);
    let mut output = [0u8; HASH_LENGTH];
    hasher.finalize(&mut output);
    HashValue::new(output)
}

#[derive(Debug, Default, PartialEq, Eq, Deserialize, Serialize, Clone, Copy, Hash)]
pub struct HashValue {
    hash: [u8; HASH_LENGTH],
}

impl HashValue {
    pub const fn new(hash: [u8; HASH_LENGTH]) -> Self {
        HashValue { hash }
    }

    /// Create from a slice (e.g. retrieved from storage).
    pub fn from_slice<T: AsRef<[u8]>>(bytes: T) -> Result<Self> {
        <[u8; HASH_LENGTH]>::try_from(bytes.as_ref())
            .map_err(|e| anyhow!("Invalid length: {}", e))
            .map(Self::new)
    }

    /// Dumps into a vector.
    pub fn to_vec(&self) -> Vec<u8> {
        self.hash.to_vec()
    }
}

impl AsRef<[u8; HASH_LENGTH]> for HashValue {
    fn as_ref(&self) -> &[u8; HASH_LENGTH] {
        &self.hash
    }
}

impl fmt::LowerHex for HashValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            write!(f, "0x")?;
        }
        for byte in &self.hash {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Display for HashValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:x}")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_keccak256_empty_input() {
        // keccak256 of the empty string, a fixed point of the algorithm.
        let expected =
            hex::decode("c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470")
                .unwrap();

        assert_eq!(keccak256(&[]).to_vec(), expected);
    }

    #[test]
    fn test_hash_inner_matches_concatenation() {
        let left = [1u8; 32];
        let right = [2u8; 32];

        let concatenated = [left.as_slice(), right.as_slice()].concat();

        assert_eq!(hash_inner(&left, &right), keccak256(&concatenated));
    }

    #[test]
    fn test_from_slice_rejects_wrong_length() {
        assert!(HashValue::from_slice([0u8; 31]).is_err());
        assert!(HashValue::from_slice([0u8; 33]).is_err());
        assert!(HashValue::from_slice([0u8; 32]).is_ok());
    }
}
