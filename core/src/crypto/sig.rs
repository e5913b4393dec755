// SPDX-License-Identifier: Apache-2.0

//! # Signature Module
//!
//! Recoverable secp256k1 signatures and uncompressed public keys as carried
//! by the upstream consensus wire formats.
//!
//! Signatures are recovered against the raw header digest, without any
//! signed-message prefix. The upstream consensus signs the raw keccak256
//! digest directly.

use crate::crypto::error::CryptoError;
use crate::crypto::hash::{keccak256, HashValue, HASH_LENGTH};
use crate::types::{Address, ADDRESS_LENGTH};
use k256::ecdsa::{RecoveryId, Signature as EcdsaSignature, VerifyingKey};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Length in bytes of a recoverable signature, `r ‖ s ‖ v`.
pub const SIGNATURE_LENGTH: usize = 65;

/// Length in bytes of an uncompressed public key with the `0x04` tag
/// already stripped, `X ‖ Y`.
pub const PUB_KEY_LENGTH: usize = 64;

const RECOVERY_ID_LOWER: u8 = 27;
const RECOVERY_ID_UPPER: u8 = 28;

/// A 65-byte recoverable ECDSA signature over the secp256k1 curve.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Signature([u8; SIGNATURE_LENGTH]);

impl Signature {
    pub const fn new(bytes: [u8; SIGNATURE_LENGTH]) -> Self {
        Self(bytes)
    }

    /// The `r ‖ s` component.
    pub fn r_s(&self) -> &[u8] {
        &self.0[..SIGNATURE_LENGTH - 1]
    }

    /// The recovery byte, `27` or `28` for a well-formed signature.
    pub const fn v(&self) -> u8 {
        self.0[SIGNATURE_LENGTH - 1]
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let bytes =
            <[u8; SIGNATURE_LENGTH]>::try_from(bytes).map_err(|_| CryptoError::InvalidLength {
                structure: String::from("Signature"),
                expected: SIGNATURE_LENGTH,
                actual: bytes.len(),
            })?;
        Ok(Self(bytes))
    }
}

impl Serialize for Signature {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0[..].serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bytes = Vec::<u8>::deserialize(deserializer)?;
        Signature::from_bytes(&bytes).map_err(serde::de::Error::custom)
    }
}

/// A 64-byte uncompressed secp256k1 public key, `X ‖ Y`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PublicKey([u8; PUB_KEY_LENGTH]);

impl PublicKey {
    pub const fn new(bytes: [u8; PUB_KEY_LENGTH]) -> Self {
        Self(bytes)
    }

    /// keccak256 of the 64-byte key. Validator-set membership compares
    /// keys through this digest.
    pub fn hash(&self) -> HashValue {
        keccak256(&self.0)
    }

    /// The low 20 bytes of the keccak256 of the 64-byte key.
    pub fn to_address(&self) -> Address {
        let digest = self.hash();
        let mut address = [0u8; ADDRESS_LENGTH];
        address.copy_from_slice(&digest.as_ref()[HASH_LENGTH - ADDRESS_LENGTH..]);
        Address::new(address)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let bytes =
            <[u8; PUB_KEY_LENGTH]>::try_from(bytes).map_err(|_| CryptoError::InvalidLength {
                structure: String::from("PublicKey"),
                expected: PUB_KEY_LENGTH,
                actual: bytes.len(),
            })?;
        Ok(Self(bytes))
    }
}

impl AsRef<[u8]> for PublicKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for PublicKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0[..].serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bytes = Vec::<u8>::deserialize(deserializer)?;
        PublicKey::from_bytes(&bytes).map_err(serde::de::Error::custom)
    }
}

/// Recovers the signing address for `signature` over the raw `digest`.
///
/// Any failure path resolves to the zero address, which callers treat as
/// "this signer did not contribute". `v` must be 27 or 28.
pub fn recover_address(digest: &HashValue, signature: &Signature) -> Address {
    let v = signature.v();
    if !(RECOVERY_ID_LOWER..=RECOVERY_ID_UPPER).contains(&v) {
        return Address::ZERO;
    }
    let Some(recovery_id) = RecoveryId::from_byte(v - RECOVERY_ID_LOWER) else {
        return Address::ZERO;
    };
    let Ok(sig) = EcdsaSignature::from_slice(signature.r_s()) else {
        return Address::ZERO;
    };
    let Ok(key) = VerifyingKey::recover_from_prehash(digest.as_ref(), &sig, recovery_id) else {
        return Address::ZERO;
    };

    let point = key.to_encoded_point(false);
    let uncompressed: [u8; PUB_KEY_LENGTH] = point.as_bytes()[1..]
        .try_into()
        .expect("Uncompressed point is 65 bytes");
    PublicKey::new(uncompressed).to_address()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_utils::ValidatorKey;

    #[test]
    fn test_recover_matches_signer_address() {
        let key = ValidatorKey::from_seed(7);
        let digest = keccak256(b"finalize me");

        let signature = key.sign(&digest);

        assert_eq!(
            recover_address(&digest, signature.signature()),
            key.address()
        );
    }

    #[test]
    fn test_recover_wrong_digest_yields_other_address() {
        let key = ValidatorKey::from_seed(7);
        let digest = keccak256(b"finalize me");
        let other = keccak256(b"something else");

        let signature = key.sign(&digest);

        assert_ne!(recover_address(&other, signature.signature()), key.address());
    }

    #[test]
    fn test_recover_invalid_v_is_zero_address() {
        let key = ValidatorKey::from_seed(7);
        let digest = keccak256(b"finalize me");

        let mut bytes = key.sign(&digest).signature().to_bytes();
        bytes[SIGNATURE_LENGTH - 1] = 99;
        let mangled = Signature::from_bytes(&bytes).unwrap();

        assert_eq!(recover_address(&digest, &mangled), Address::ZERO);
    }

    #[test]
    fn test_recover_garbage_signature_is_zero_address() {
        let digest = keccak256(b"finalize me");
        let garbage = Signature::new([0xFF; SIGNATURE_LENGTH]);

        assert_eq!(recover_address(&digest, &garbage), Address::ZERO);
    }

    #[test]
    fn test_signature_from_bytes_rejects_wrong_length() {
        assert!(Signature::from_bytes(&[0u8; 64]).is_err());
        assert!(PublicKey::from_bytes(&[0u8; 65]).is_err());
    }
}
