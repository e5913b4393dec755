// SPDX-License-Identifier: Apache-2.0

use crate::crypto::hash::HashValue;
use thiserror::Error;

/// Errors possible while decoding the upstream wire formats.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Ran past the end of input while decoding {structure}")]
    Truncated { structure: String },
    #[error("Declared length inconsistent for {structure}. Expected {expected} bytes, got {actual}.")]
    LengthMismatch {
        structure: String,
        expected: usize,
        actual: usize,
    },
    #[error("Failed to decode {structure}: {source}")]
    Malformed {
        structure: String,
        #[source]
        source: Box<dyn std::error::Error + Sync + Send>,
    },
}

/// Macro to create a `CodecError::Malformed` with the given structure and source.
#[macro_export]
macro_rules! codec_error {
    ($structure:expr, $source:expr) => {
        CodecError::Malformed {
            structure: String::from($structure),
            source: $source.into(),
        }
    };
}

/// Errors possible while validating a header transition.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Expected block height {expected}, got {actual}")]
    HeightGap { expected: u64, actual: u64 },
    #[error("Previous hash does not commit to the last accepted header. Expected {expected}, got {actual}")]
    BrokenChain {
        expected: HashValue,
        actual: HashValue,
    },
    #[error("Timestamp went backwards: previous {previous}, next {next}")]
    NonMonotoneTime { previous: i64, next: i64 },
    #[error("Author is not part of the signing validator set")]
    UnknownAuthor,
    #[error("The voted power ({voted}) does not exceed two thirds of the total ({total})")]
    InsufficientQuorum { voted: u128, total: u128 },
}

/// Errors possible while verifying a commit Merkle proof.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MerkleError {
    #[error("Block height {height} outside the tracked range [{offset}, {offset} + {count})")]
    HeightOutOfRange {
        height: u64,
        offset: u64,
        count: usize,
    },
    #[error("Direction tag must be 0 or 1, got {value}")]
    BadDirection { value: u32 },
    #[error("Root hash mismatch. Computed {computed}, stored {stored}")]
    RootMismatch {
        computed: HashValue,
        stored: HashValue,
    },
}
