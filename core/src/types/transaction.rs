// SPDX-License-Identifier: Apache-2.0

//! # Transaction Module
//!
//! Decoding for the execution payload carried by a committed transaction,
//! and accessors for the two envelope fields the dispatcher reads out of
//! the raw transaction bytes: the payload-kind tag and the execution-hash
//! tail.
//!
//! The payload layout is `chainLen:8 ‖ chain ‖ contractSequence:16 ‖
//! enumTag:4 ‖ address:20 ‖ amountOrTokenId:16 ‖ address:20`, all
//! little-endian. The enum tag is discarded on decode; the payload kind is
//! discriminated by the envelope tag instead.

use crate::codec_error;
use crate::crypto::hash::HashValue;
use crate::types::error::CodecError;
use crate::types::utils::{ENUM_TAG_SIZE, U128_SIZE, U64_SIZE};
use crate::types::{Address, ADDRESS_LENGTH};
use bytes::{BufMut, BytesMut};
use getset::{CopyGetters, Getters};
use serde::{Deserialize, Serialize};

/// Offset in the transaction of the 8-byte little-endian length of the
/// envelope's header field, doubling as the payload-kind discriminator.
pub const PAYLOAD_KIND_OFFSET: usize = 73;

/// Envelope tag marking a fungible-transfer payload.
pub const FUNGIBLE_KIND_TAG: u64 = 25;

/// Envelope tag marking a non-fungible-transfer payload.
pub const NON_FUNGIBLE_KIND_TAG: u64 = 26;

/// Size in bytes of the execution-hash envelope at the transaction tail:
/// the payload's keccak256 as 64 hex characters plus framing.
pub const EXECUTION_HASH_ENVELOPE_LENGTH: usize = 68;

const EXECUTION_HASH_HEX_OFFSET: usize = 2;
const EXECUTION_HASH_HEX_LENGTH: usize = 64;

/// The payload kind named by the envelope tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PayloadKind {
    Fungible,
    NonFungible,
}

impl PayloadKind {
    /// Maps an envelope tag to a payload kind. Unknown tags are the
    /// caller's error to surface.
    pub const fn from_tag(tag: u64) -> Option<Self> {
        match tag {
            FUNGIBLE_KIND_TAG => Some(Self::Fungible),
            NON_FUNGIBLE_KIND_TAG => Some(Self::NonFungible),
            _ => None,
        }
    }
}

/// A directive to release fungible tokens out of custody.
#[derive(Clone, Debug, PartialEq, Eq, Getters, CopyGetters, Serialize, Deserialize)]
pub struct FungibleTransfer {
    #[getset(get_copy = "pub")]
    contract_sequence: u128,
    #[getset(get_copy = "pub")]
    amount: u128,
    /// Name of the destination chain this directive targets.
    #[getset(get = "pub")]
    chain: Vec<u8>,
    /// Zero address marks the ledger's native asset.
    #[getset(get_copy = "pub")]
    token_address: Address,
    #[getset(get_copy = "pub")]
    receiver_address: Address,
}

impl FungibleTransfer {
    pub const fn new(
        contract_sequence: u128,
        amount: u128,
        chain: Vec<u8>,
        token_address: Address,
        receiver_address: Address,
    ) -> Self {
        Self {
            contract_sequence,
            amount,
            chain,
            token_address,
            receiver_address,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        encode_transfer_fields(
            &self.chain,
            self.contract_sequence,
            0,
            self.token_address,
            self.amount,
            self.receiver_address,
        )
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        let fields = decode_transfer_fields(bytes, "FungibleTransfer")?;
        Ok(Self {
            contract_sequence: fields.sequence,
            amount: fields.scalar,
            chain: fields.chain,
            token_address: fields.asset_address,
            receiver_address: fields.receiver_address,
        })
    }
}

/// A directive to release a non-fungible token out of custody.
#[derive(Clone, Debug, PartialEq, Eq, Getters, CopyGetters, Serialize, Deserialize)]
pub struct NonFungibleTransfer {
    #[getset(get_copy = "pub")]
    contract_sequence: u128,
    #[getset(get_copy = "pub")]
    token_id: u128,
    #[getset(get = "pub")]
    chain: Vec<u8>,
    #[getset(get_copy = "pub")]
    collection_address: Address,
    #[getset(get_copy = "pub")]
    receiver_address: Address,
}

impl NonFungibleTransfer {
    pub const fn new(
        contract_sequence: u128,
        token_id: u128,
        chain: Vec<u8>,
        collection_address: Address,
        receiver_address: Address,
    ) -> Self {
        Self {
            contract_sequence,
            token_id,
            chain,
            collection_address,
            receiver_address,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        encode_transfer_fields(
            &self.chain,
            self.contract_sequence,
            1,
            self.collection_address,
            self.token_id,
            self.receiver_address,
        )
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        let fields = decode_transfer_fields(bytes, "NonFungibleTransfer")?;
        Ok(Self {
            contract_sequence: fields.sequence,
            token_id: fields.scalar,
            chain: fields.chain,
            collection_address: fields.asset_address,
            receiver_address: fields.receiver_address,
        })
    }
}

/// The decoded intent carried by a committed transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionPayload {
    Fungible(FungibleTransfer),
    NonFungible(NonFungibleTransfer),
}

impl ExecutionPayload {
    pub fn from_bytes(kind: PayloadKind, bytes: &[u8]) -> Result<Self, CodecError> {
        match kind {
            PayloadKind::Fungible => FungibleTransfer::from_bytes(bytes).map(Self::Fungible),
            PayloadKind::NonFungible => {
                NonFungibleTransfer::from_bytes(bytes).map(Self::NonFungible)
            }
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Fungible(transfer) => transfer.to_bytes(),
            Self::NonFungible(transfer) => transfer.to_bytes(),
        }
    }

    pub fn contract_sequence(&self) -> u128 {
        match self {
            Self::Fungible(transfer) => transfer.contract_sequence(),
            Self::NonFungible(transfer) => transfer.contract_sequence(),
        }
    }

    pub fn chain(&self) -> &[u8] {
        match self {
            Self::Fungible(transfer) => transfer.chain(),
            Self::NonFungible(transfer) => transfer.chain(),
        }
    }
}

struct TransferFields {
    chain: Vec<u8>,
    sequence: u128,
    asset_address: Address,
    scalar: u128,
    receiver_address: Address,
}

fn encode_transfer_fields(
    chain: &[u8],
    sequence: u128,
    enum_tag: u32,
    asset_address: Address,
    scalar: u128,
    receiver_address: Address,
) -> Vec<u8> {
    let mut bytes = BytesMut::new();
    bytes.put_u64_le(chain.len() as u64);
    bytes.put_slice(chain);
    bytes.put_u128_le(sequence);
    bytes.put_u32_le(enum_tag);
    bytes.put_slice(asset_address.as_ref());
    bytes.put_u128_le(scalar);
    bytes.put_slice(receiver_address.as_ref());
    bytes.to_vec()
}

fn decode_transfer_fields(bytes: &[u8], structure: &str) -> Result<TransferFields, CodecError> {
    let truncated = || CodecError::Truncated {
        structure: String::from(structure),
    };

    let chain_len = u64::from_le_bytes(
        bytes
            .get(..U64_SIZE)
            .ok_or_else(truncated)?
            .try_into()
            .expect("Slice is 8 bytes"),
    ) as usize;
    let mut offset = U64_SIZE;

    let chain_end = offset.checked_add(chain_len).ok_or_else(truncated)?;
    let chain = bytes.get(offset..chain_end).ok_or_else(truncated)?.to_vec();
    offset = chain_end;

    let fixed_tail = U128_SIZE + ENUM_TAG_SIZE + ADDRESS_LENGTH + U128_SIZE + ADDRESS_LENGTH;
    if bytes.len() < offset + fixed_tail {
        return Err(truncated());
    }
    if bytes.len() != offset + fixed_tail {
        return Err(CodecError::LengthMismatch {
            structure: String::from(structure),
            expected: offset + fixed_tail,
            actual: bytes.len(),
        });
    }

    let sequence = u128::from_le_bytes(
        bytes[offset..offset + U128_SIZE]
            .try_into()
            .expect("Slice is 16 bytes"),
    );
    offset += U128_SIZE;

    // The enum tag duplicates the envelope discriminator and is discarded.
    offset += ENUM_TAG_SIZE;

    let asset_address = Address::from_bytes(&bytes[offset..offset + ADDRESS_LENGTH])?;
    offset += ADDRESS_LENGTH;

    let scalar = u128::from_le_bytes(
        bytes[offset..offset + U128_SIZE]
            .try_into()
            .expect("Slice is 16 bytes"),
    );
    offset += U128_SIZE;

    let receiver_address = Address::from_bytes(&bytes[offset..offset + ADDRESS_LENGTH])?;

    Ok(TransferFields {
        chain,
        sequence,
        asset_address,
        scalar,
        receiver_address,
    })
}

/// Reads the payload-kind tag out of the raw transaction: the 8-byte
/// little-endian header-field length at offset 73.
pub fn payload_kind_tag(transaction: &[u8]) -> Result<u64, CodecError> {
    let bytes = transaction
        .get(PAYLOAD_KIND_OFFSET..PAYLOAD_KIND_OFFSET + U64_SIZE)
        .ok_or_else(|| CodecError::Truncated {
            structure: String::from("Transaction"),
        })?;
    Ok(u64::from_le_bytes(
        bytes.try_into().expect("Slice is 8 bytes"),
    ))
}

/// Parses the execution hash out of the envelope at the transaction tail.
///
/// The last 68 bytes frame the payload's keccak256 as 64 hex characters;
/// the framing bytes themselves are opaque to the engine.
pub fn execution_hash(transaction: &[u8]) -> Result<HashValue, CodecError> {
    if transaction.len() < EXECUTION_HASH_ENVELOPE_LENGTH {
        return Err(CodecError::Truncated {
            structure: String::from("ExecutionHashEnvelope"),
        });
    }
    let envelope = &transaction[transaction.len() - EXECUTION_HASH_ENVELOPE_LENGTH..];
    let hex_chars =
        &envelope[EXECUTION_HASH_HEX_OFFSET..EXECUTION_HASH_HEX_OFFSET + EXECUTION_HASH_HEX_LENGTH];
    let decoded =
        hex::decode(hex_chars).map_err(|e| codec_error!("ExecutionHashEnvelope", e))?;
    HashValue::from_slice(decoded).map_err(|e| codec_error!("ExecutionHashEnvelope", e))
}

/// Builds the 68-byte tail envelope for `digest`. Inverse of
/// [`execution_hash`], used when assembling transactions.
pub fn execution_hash_envelope(digest: &HashValue) -> Vec<u8> {
    let mut envelope = Vec::with_capacity(EXECUTION_HASH_ENVELOPE_LENGTH);
    envelope.extend_from_slice(b":\"");
    envelope.extend_from_slice(hex::encode(digest.as_ref()).as_bytes());
    envelope.extend_from_slice(b"\"}");
    envelope
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::crypto::hash::keccak256;
    use crate::test_utils::make_transaction;

    fn sample_fungible() -> FungibleTransfer {
        FungibleTransfer::new(
            0,
            500_000_000_000_000_000_000,
            b"settlement-main".to_vec(),
            Address::new([0x11; ADDRESS_LENGTH]),
            Address::new([0x22; ADDRESS_LENGTH]),
        )
    }

    #[test]
    fn test_bytes_conversion_fungible_transfer() {
        let transfer = sample_fungible();
        let bytes = transfer.to_bytes();

        assert_eq!(FungibleTransfer::from_bytes(&bytes).unwrap(), transfer);
    }

    #[test]
    fn test_bytes_conversion_non_fungible_transfer() {
        let transfer = NonFungibleTransfer::new(
            0,
            77,
            b"settlement-main".to_vec(),
            Address::new([0x33; ADDRESS_LENGTH]),
            Address::new([0x44; ADDRESS_LENGTH]),
        );
        let bytes = transfer.to_bytes();

        assert_eq!(NonFungibleTransfer::from_bytes(&bytes).unwrap(), transfer);
    }

    #[test]
    fn test_payload_decode_rejects_truncation_and_surplus() {
        let bytes = sample_fungible().to_bytes();

        assert!(matches!(
            FungibleTransfer::from_bytes(&bytes[..bytes.len() - 1]),
            Err(CodecError::Truncated { .. })
        ));

        let mut padded = bytes;
        padded.push(0);
        assert!(matches!(
            FungibleTransfer::from_bytes(&padded),
            Err(CodecError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_payload_decode_rejects_overlong_chain_length() {
        let mut bytes = sample_fungible().to_bytes();
        // Declare a chain longer than the input.
        bytes[..8].copy_from_slice(&u64::MAX.to_le_bytes());

        assert!(matches!(
            FungibleTransfer::from_bytes(&bytes),
            Err(CodecError::Truncated { .. })
        ));
    }

    #[test]
    fn test_payload_kind_tags() {
        assert_eq!(
            PayloadKind::from_tag(FUNGIBLE_KIND_TAG),
            Some(PayloadKind::Fungible)
        );
        assert_eq!(
            PayloadKind::from_tag(NON_FUNGIBLE_KIND_TAG),
            Some(PayloadKind::NonFungible)
        );
        assert_eq!(PayloadKind::from_tag(99), None);
    }

    #[test]
    fn test_envelope_round_trip() {
        let payload = sample_fungible().to_bytes();
        let transaction = make_transaction(FUNGIBLE_KIND_TAG, &payload);

        assert_eq!(
            payload_kind_tag(&transaction).unwrap(),
            FUNGIBLE_KIND_TAG
        );
        assert_eq!(execution_hash(&transaction).unwrap(), keccak256(&payload));
    }

    #[test]
    fn test_execution_hash_rejects_bad_hex() {
        let payload = sample_fungible().to_bytes();
        let mut transaction = make_transaction(FUNGIBLE_KIND_TAG, &payload);
        let tail = transaction.len() - 10;
        transaction[tail] = b'z';

        assert!(matches!(
            execution_hash(&transaction),
            Err(CodecError::Malformed { .. })
        ));
    }

    #[test]
    fn test_envelope_accessors_reject_short_transaction() {
        assert!(matches!(
            payload_kind_tag(&[0u8; 80]),
            Err(CodecError::Truncated { .. })
        ));
        assert!(matches!(
            execution_hash(&[0u8; 67]),
            Err(CodecError::Truncated { .. })
        ));
    }
}
