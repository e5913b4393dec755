// SPDX-License-Identifier: Apache-2.0

use settlement_lc_core::crypto::hash::HashValue;
use settlement_lc_core::crypto::U256;
use settlement_lc_core::types::error::{CodecError, MerkleError, ValidationError};
use settlement_lc_core::types::Address;
use thiserror::Error;

/// Errors possible while advancing the light client by one header.
#[derive(Debug, Error)]
pub enum UpdateError {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Errors surfaced by the asset ledger capability.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AssetError {
    #[error("Not enough balance in custody: required {required}, available {available}")]
    InsufficientBalance { required: U256, available: U256 },
    #[error("Token {token_id} of collection {collection} is not held in custody")]
    NotOwned { collection: Address, token_id: u128 },
    #[error("Ledger backend failure: {reason}")]
    Backend { reason: String },
}

/// Errors possible while executing a withdrawal.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Execution hash envelope does not match the payload. Carried {carried}, computed {computed}")]
    HashMismatch {
        carried: HashValue,
        computed: HashValue,
    },
    #[error("Unknown payload kind tag {tag}")]
    UnknownPayloadKind { tag: u64 },
    #[error("Payload targets chain {actual}, this engine settles {expected}")]
    WrongChain { expected: String, actual: String },
    #[error("Contract sequence is reserved and must be 0, got {actual}")]
    WrongSequence { actual: u128 },
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Merkle(#[from] MerkleError),
    #[error(transparent)]
    Asset(#[from] AssetError),
}
