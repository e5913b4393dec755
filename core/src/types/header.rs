// SPDX-License-Identifier: Apache-2.0

//! # Header Module
//!
//! This module provides the structures carried by the upstream consensus
//! header and its finalization proof, together with the validation rules
//! for a header transition.
//!
//! The wire layout is fixed little-endian. Variable-length sequences are
//! preceded by an 8-byte little-endian count. Public keys travel with a
//! one-byte compression prefix that is discarded on decode.

use crate::codec_error;
use crate::crypto::hash::{HashValue, HASH_LENGTH};
use crate::crypto::sig::{
    recover_address, PublicKey, Signature, PUB_KEY_LENGTH, SIGNATURE_LENGTH,
};
use crate::types::error::{CodecError, ValidationError};
use crate::types::utils::{KEY_PREFIX_SIZE, U64_SIZE, VERSION_SIZE};
use bytes::{BufMut, BytesMut};
use getset::{CopyGetters, Getters};
use serde::{Deserialize, Serialize};

/// Size in bytes of a serialized `TypedSignature`.
pub const TYPED_SIGNATURE_SIZE: usize = SIGNATURE_LENGTH + KEY_PREFIX_SIZE + PUB_KEY_LENGTH;

/// Size in bytes of a serialized `ValidatorInfo`.
pub const VALIDATOR_INFO_SIZE: usize = KEY_PREFIX_SIZE + PUB_KEY_LENGTH + U64_SIZE;

// Written in place of the discarded compression prefix when re-encoding.
const KEY_PREFIX: u8 = 0x04;

fn take<'a>(bytes: &mut &'a [u8], len: usize, structure: &str) -> Result<&'a [u8], CodecError> {
    if bytes.len() < len {
        return Err(CodecError::Truncated {
            structure: String::from(structure),
        });
    }
    let (head, rest) = bytes.split_at(len);
    *bytes = rest;
    Ok(head)
}

fn take_u64_le(bytes: &mut &[u8], structure: &str) -> Result<u64, CodecError> {
    let head = take(bytes, U64_SIZE, structure)?;
    Ok(u64::from_le_bytes(
        head.try_into().expect("Slice is 8 bytes"),
    ))
}

fn take_i64_le(bytes: &mut &[u8], structure: &str) -> Result<i64, CodecError> {
    let head = take(bytes, U64_SIZE, structure)?;
    Ok(i64::from_le_bytes(
        head.try_into().expect("Slice is 8 bytes"),
    ))
}

/// A signature over a header digest together with the public key that
/// claims to have produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Getters, Serialize, Deserialize)]
#[getset(get = "pub")]
pub struct TypedSignature {
    signature: Signature,
    signer: PublicKey,
}

impl TypedSignature {
    pub const fn new(signature: Signature, signer: PublicKey) -> Self {
        Self { signature, signer }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = BytesMut::new();
        bytes.put_slice(&self.signature.to_bytes());
        bytes.put_u8(KEY_PREFIX);
        bytes.put_slice(&self.signer.to_bytes());
        bytes.to_vec()
    }

    pub fn from_bytes(mut bytes: &[u8]) -> Result<Self, CodecError> {
        if bytes.len() != TYPED_SIGNATURE_SIZE {
            return Err(CodecError::LengthMismatch {
                structure: String::from("TypedSignature"),
                expected: TYPED_SIGNATURE_SIZE,
                actual: bytes.len(),
            });
        }
        let signature = Signature::from_bytes(take(&mut bytes, SIGNATURE_LENGTH, "TypedSignature")?)
            .map_err(|e| codec_error!("TypedSignature", e))?;
        take(&mut bytes, KEY_PREFIX_SIZE, "TypedSignature")?;
        let signer = PublicKey::from_bytes(take(&mut bytes, PUB_KEY_LENGTH, "TypedSignature")?)
            .map_err(|e| codec_error!("TypedSignature", e))?;
        Ok(Self { signature, signer })
    }
}

/// The ordered multi-signature attesting finality of a header digest.
#[derive(Clone, Debug, Default, PartialEq, Eq, Getters, Serialize, Deserialize)]
#[getset(get = "pub")]
pub struct BlockFinalizationProof {
    signatures: Vec<TypedSignature>,
}

impl BlockFinalizationProof {
    pub const fn new(signatures: Vec<TypedSignature>) -> Self {
        Self { signatures }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = BytesMut::new();
        bytes.put_u64_le(self.signatures.len() as u64);
        for signature in &self.signatures {
            bytes.put_slice(&signature.to_bytes());
        }
        bytes.to_vec()
    }

    pub fn from_bytes(mut bytes: &[u8]) -> Result<Self, CodecError> {
        let count = take_u64_le(&mut bytes, "BlockFinalizationProof")?;
        let expected = (count as usize).saturating_mul(TYPED_SIGNATURE_SIZE);
        if bytes.len() != expected {
            return Err(CodecError::LengthMismatch {
                structure: String::from("BlockFinalizationProof"),
                expected,
                actual: bytes.len(),
            });
        }
        let mut signatures = Vec::with_capacity(count as usize);
        for _ in 0..count {
            signatures.push(TypedSignature::from_bytes(take(
                &mut bytes,
                TYPED_SIGNATURE_SIZE,
                "BlockFinalizationProof",
            )?)?);
        }
        Ok(Self { signatures })
    }
}

/// A validator's public key and its voting power.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Getters, CopyGetters, Serialize, Deserialize)]
pub struct ValidatorInfo {
    #[getset(get = "pub")]
    public_key: PublicKey,
    #[getset(get_copy = "pub")]
    voting_power: u64,
}

impl ValidatorInfo {
    pub const fn new(public_key: PublicKey, voting_power: u64) -> Self {
        Self {
            public_key,
            voting_power,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = BytesMut::new();
        bytes.put_u8(KEY_PREFIX);
        bytes.put_slice(&self.public_key.to_bytes());
        bytes.put_u64_le(self.voting_power);
        bytes.to_vec()
    }

    pub fn from_bytes(mut bytes: &[u8]) -> Result<Self, CodecError> {
        if bytes.len() != VALIDATOR_INFO_SIZE {
            return Err(CodecError::LengthMismatch {
                structure: String::from("ValidatorInfo"),
                expected: VALIDATOR_INFO_SIZE,
                actual: bytes.len(),
            });
        }
        take(&mut bytes, KEY_PREFIX_SIZE, "ValidatorInfo")?;
        let public_key = PublicKey::from_bytes(take(&mut bytes, PUB_KEY_LENGTH, "ValidatorInfo")?)
            .map_err(|e| codec_error!("ValidatorInfo", e))?;
        let voting_power = take_u64_le(&mut bytes, "ValidatorInfo")?;
        Ok(Self {
            public_key,
            voting_power,
        })
    }
}

/// The full upstream consensus header.
///
/// The 32-byte repository Merkle root present on the wire is not tracked by
/// the light client; it is skipped on decode and zeroed on encode.
#[derive(Clone, Debug, PartialEq, Eq, Getters, CopyGetters, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Uncompressed public key of the block author.
    #[getset(get = "pub")]
    author: PublicKey,
    /// The quorum that finalized the previous header.
    #[getset(get = "pub")]
    prev_block_finalization_proof: BlockFinalizationProof,
    /// keccak256 of the previous header's raw bytes.
    #[getset(get_copy = "pub")]
    previous_hash: HashValue,
    #[getset(get_copy = "pub")]
    block_height: u64,
    /// Epoch-like timestamp. Only monotonicity matters to the light client.
    #[getset(get_copy = "pub")]
    timestamp: i64,
    /// Root over the block's committed transactions.
    #[getset(get_copy = "pub")]
    commit_merkle_root: HashValue,
    /// The set that will finalize this block.
    #[getset(get = "pub")]
    validators: Vec<ValidatorInfo>,
    /// 5-byte protocol version. Carried, not interpreted.
    #[getset(get = "pub")]
    version: String,
}

impl BlockHeader {
    #[allow(clippy::too_many_arguments)]
    pub const fn new(
        author: PublicKey,
        prev_block_finalization_proof: BlockFinalizationProof,
        previous_hash: HashValue,
        block_height: u64,
        timestamp: i64,
        commit_merkle_root: HashValue,
        validators: Vec<ValidatorInfo>,
        version: String,
    ) -> Self {
        Self {
            author,
            prev_block_finalization_proof,
            previous_hash,
            block_height,
            timestamp,
            commit_merkle_root,
            validators,
            version,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = BytesMut::new();
        bytes.put_u8(KEY_PREFIX);
        bytes.put_slice(&self.author.to_bytes());
        bytes.put_slice(&self.prev_block_finalization_proof.to_bytes());
        bytes.put_slice(self.previous_hash.as_ref());
        bytes.put_u64_le(self.block_height);
        bytes.put_i64_le(self.timestamp);
        bytes.put_slice(self.commit_merkle_root.as_ref());
        bytes.put_slice(&[0u8; HASH_LENGTH]); // repository Merkle root, untracked
        bytes.put_u64_le(self.validators.len() as u64);
        for validator in &self.validators {
            bytes.put_slice(&validator.to_bytes());
        }
        bytes.put_u64_le(self.version.len() as u64);
        bytes.put_slice(self.version.as_bytes());
        bytes.to_vec()
    }

    pub fn from_bytes(mut bytes: &[u8]) -> Result<Self, CodecError> {
        let total = bytes.len();

        take(&mut bytes, KEY_PREFIX_SIZE, "BlockHeader")?;
        let author = PublicKey::from_bytes(take(&mut bytes, PUB_KEY_LENGTH, "BlockHeader")?)
            .map_err(|e| codec_error!("BlockHeader", e))?;

        let proof_count = take_u64_le(&mut bytes, "BlockHeader")?;
        if bytes.len() < (proof_count as usize).saturating_mul(TYPED_SIGNATURE_SIZE) {
            return Err(CodecError::Truncated {
                structure: String::from("BlockHeader"),
            });
        }
        let mut signatures = Vec::with_capacity(proof_count as usize);
        for _ in 0..proof_count {
            signatures.push(TypedSignature::from_bytes(take(
                &mut bytes,
                TYPED_SIGNATURE_SIZE,
                "BlockHeader",
            )?)?);
        }
        let prev_block_finalization_proof = BlockFinalizationProof::new(signatures);

        let previous_hash = HashValue::from_slice(take(&mut bytes, HASH_LENGTH, "BlockHeader")?)
            .map_err(|e| codec_error!("BlockHeader", e))?;
        let block_height = take_u64_le(&mut bytes, "BlockHeader")?;
        let timestamp = take_i64_le(&mut bytes, "BlockHeader")?;
        let commit_merkle_root =
            HashValue::from_slice(take(&mut bytes, HASH_LENGTH, "BlockHeader")?)
                .map_err(|e| codec_error!("BlockHeader", e))?;
        take(&mut bytes, HASH_LENGTH, "BlockHeader")?; // repository Merkle root

        let validator_count = take_u64_le(&mut bytes, "BlockHeader")?;
        if bytes.len() < (validator_count as usize).saturating_mul(VALIDATOR_INFO_SIZE) {
            return Err(CodecError::Truncated {
                structure: String::from("BlockHeader"),
            });
        }
        let mut validators = Vec::with_capacity(validator_count as usize);
        for _ in 0..validator_count {
            validators.push(ValidatorInfo::from_bytes(take(
                &mut bytes,
                VALIDATOR_INFO_SIZE,
                "BlockHeader",
            )?)?);
        }

        // The version length is carried on the wire but the field is fixed.
        take_u64_le(&mut bytes, "BlockHeader")?;
        let version = String::from_utf8(take(&mut bytes, VERSION_SIZE, "BlockHeader")?.to_vec())
            .map_err(|e| codec_error!("BlockHeader", e))?;

        if !bytes.is_empty() {
            return Err(CodecError::LengthMismatch {
                structure: String::from("BlockHeader"),
                expected: total - bytes.len(),
                actual: total,
            });
        }

        Ok(Self {
            author,
            prev_block_finalization_proof,
            previous_hash,
            block_height,
            timestamp,
            commit_merkle_root,
            validators,
            version,
        })
    }

    /// Sum of the voting power of this header's validator set.
    pub fn total_voting_power(&self) -> u128 {
        self.validators.iter().fold(0u128, |sum, validator| {
            sum.checked_add(u128::from(validator.voting_power()))
                .expect("Sum of all voting power exceeds u128::MAX")
        })
    }

    /// Checks that `next` is a valid direct successor of this header:
    /// height advances by exactly one, the previous-hash linkage commits to
    /// the last accepted raw header, time does not go backwards, and the
    /// author belongs to this header's validator set.
    pub fn verify_successor(
        &self,
        next: &BlockHeader,
        last_header_hash: HashValue,
    ) -> Result<(), ValidationError> {
        if next.block_height != self.block_height + 1 {
            return Err(ValidationError::HeightGap {
                expected: self.block_height + 1,
                actual: next.block_height,
            });
        }
        if next.previous_hash != last_header_hash {
            return Err(ValidationError::BrokenChain {
                expected: last_header_hash,
                actual: next.previous_hash,
            });
        }
        if next.timestamp < self.timestamp {
            return Err(ValidationError::NonMonotoneTime {
                previous: self.timestamp,
                next: next.timestamp,
            });
        }

        // Membership by key digest, declaration order, first match wins.
        let author_hash = next.author.hash();
        if !self
            .validators
            .iter()
            .any(|validator| validator.public_key().hash() == author_hash)
        {
            return Err(ValidationError::UnknownAuthor);
        }

        Ok(())
    }

    /// Verifies that `proof` carries a strict two-thirds quorum of this
    /// header's validator set over `digest`.
    ///
    /// The pairing is positional: the j-th signature is credited to the
    /// j-th validator, so out-of-order proofs do not accumulate power.
    /// Surplus signatures beyond the validator list are ignored.
    pub fn verify_finalization_quorum(
        &self,
        digest: HashValue,
        proof: &BlockFinalizationProof,
    ) -> Result<u128, ValidationError> {
        let total = self.total_voting_power();

        let mut voted = 0u128;
        for (typed, validator) in proof.signatures().iter().zip(self.validators.iter()) {
            let recovered = recover_address(&digest, typed.signature());
            if !recovered.is_zero() && recovered == typed.signer().to_address() {
                voted += u128::from(validator.voting_power());
            }
        }

        if voted * 3 > total * 2 {
            Ok(voted)
        } else {
            Err(ValidationError::InsufficientQuorum { voted, total })
        }
    }
}
