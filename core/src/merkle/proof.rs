// SPDX-License-Identifier: Apache-2.0

use crate::crypto::hash::{hash_inner, HashValue, HASH_LENGTH};
use crate::types::error::{CodecError, MerkleError};
use crate::types::utils::{ENUM_TAG_SIZE, U64_SIZE};
use bytes::{BufMut, BytesMut};
use getset::{CopyGetters, Getters};
use serde::{Deserialize, Serialize};

/// Size in bytes of a serialized proof step, `dir:4 ‖ sibling:32`.
pub const PROOF_STEP_SIZE: usize = ENUM_TAG_SIZE + HASH_LENGTH;

/// Direction tag: the sibling is the left child at this level.
pub const LEFT_SIBLING: u32 = 0;

/// Direction tag: the sibling is the right child at this level.
pub const RIGHT_SIBLING: u32 = 1;

/// One level of a commit Merkle proof: a sibling hash and the side it
/// sits on relative to the accumulator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, CopyGetters, Serialize, Deserialize)]
#[getset(get_copy = "pub")]
pub struct ProofStep {
    direction: u32,
    sibling: HashValue,
}

impl ProofStep {
    pub const fn new(direction: u32, sibling: HashValue) -> Self {
        Self { direction, sibling }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = BytesMut::new();
        bytes.put_u32_le(self.direction);
        bytes.put_slice(self.sibling.as_ref());
        bytes.to_vec()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        if bytes.len() != PROOF_STEP_SIZE {
            return Err(CodecError::LengthMismatch {
                structure: String::from("ProofStep"),
                expected: PROOF_STEP_SIZE,
                actual: bytes.len(),
            });
        }
        let direction = u32::from_le_bytes(
            bytes[..ENUM_TAG_SIZE]
                .try_into()
                .expect("Slice is 4 bytes"),
        );
        let sibling = HashValue::from_slice(&bytes[ENUM_TAG_SIZE..])
            .expect("Slice is 32 bytes");
        Ok(Self { direction, sibling })
    }
}

/// A directional Merkle path from a transaction leaf up to a commit root.
#[derive(Clone, Debug, Default, PartialEq, Eq, Getters, Serialize, Deserialize)]
#[getset(get = "pub")]
pub struct CommitProof {
    steps: Vec<ProofStep>,
}

impl CommitProof {
    pub const fn new(steps: Vec<ProofStep>) -> Self {
        Self { steps }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = BytesMut::new();
        bytes.put_u64_le(self.steps.len() as u64);
        for step in &self.steps {
            bytes.put_slice(&step.to_bytes());
        }
        bytes.to_vec()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        if bytes.len() < U64_SIZE {
            return Err(CodecError::Truncated {
                structure: String::from("CommitProof"),
            });
        }
        let path_len = u64::from_le_bytes(
            bytes[..U64_SIZE].try_into().expect("Slice is 8 bytes"),
        );
        let rest = &bytes[U64_SIZE..];

        let expected = (path_len as usize).saturating_mul(PROOF_STEP_SIZE);
        if rest.len() != expected {
            return Err(CodecError::LengthMismatch {
                structure: String::from("CommitProof"),
                expected,
                actual: rest.len(),
            });
        }

        let mut steps = Vec::with_capacity(path_len as usize);
        for chunk in rest.chunks(PROOF_STEP_SIZE) {
            steps.push(ProofStep::from_bytes(chunk)?);
        }
        Ok(Self { steps })
    }

    /// Folds the directed siblings over `leaf` and compares the result
    /// against `expected_root`.
    pub fn verify(&self, leaf: HashValue, expected_root: HashValue) -> Result<(), MerkleError> {
        let mut accumulator = leaf;
        for step in &self.steps {
            accumulator = match step.direction() {
                LEFT_SIBLING => hash_inner(step.sibling().as_ref(), accumulator.as_ref()),
                RIGHT_SIBLING => hash_inner(accumulator.as_ref(), step.sibling().as_ref()),
                value => return Err(MerkleError::BadDirection { value }),
            };
        }

        if accumulator == expected_root {
            Ok(())
        } else {
            Err(MerkleError::RootMismatch {
                computed: accumulator,
                stored: expected_root,
            })
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::crypto::hash::keccak256;
    use crate::test_utils::{build_commit_tree, random_hash};

    #[test]
    fn test_bytes_conversion_commit_proof() {
        let proof = CommitProof::new(vec![
            ProofStep::new(RIGHT_SIBLING, random_hash()),
            ProofStep::new(LEFT_SIBLING, random_hash()),
        ]);

        let bytes = proof.to_bytes();

        assert_eq!(CommitProof::from_bytes(&bytes).unwrap(), proof);
    }

    #[test]
    fn test_commit_proof_rejects_length_mismatch() {
        let proof = CommitProof::new(vec![ProofStep::new(LEFT_SIBLING, random_hash())]);
        let mut bytes = proof.to_bytes();
        bytes.pop();

        assert!(matches!(
            CommitProof::from_bytes(&bytes),
            Err(CodecError::LengthMismatch { .. })
        ));
        assert!(matches!(
            CommitProof::from_bytes(&bytes[..4]),
            Err(CodecError::Truncated { .. })
        ));
    }

    #[test]
    fn test_verify_two_level_tree() {
        // Hand-built tree over four leaves; leaf "c" sits at index 2.
        let leaves = [b"a".as_slice(), b"b", b"c", b"d"]
            .map(keccak256);
        let ab = hash_inner(leaves[0].as_ref(), leaves[1].as_ref());
        let cd = hash_inner(leaves[2].as_ref(), leaves[3].as_ref());
        let root = hash_inner(ab.as_ref(), cd.as_ref());

        let proof = CommitProof::new(vec![
            ProofStep::new(RIGHT_SIBLING, leaves[3]),
            ProofStep::new(LEFT_SIBLING, ab),
        ]);

        proof.verify(leaves[2], root).unwrap();
        assert!(matches!(
            proof.verify(leaves[1], root),
            Err(MerkleError::RootMismatch { .. })
        ));
    }

    #[test]
    fn test_verify_rejects_bad_direction() {
        let proof = CommitProof::new(vec![ProofStep::new(2, random_hash())]);

        assert_eq!(
            proof.verify(random_hash(), random_hash()),
            Err(MerkleError::BadDirection { value: 2 })
        );
    }

    #[test]
    fn test_empty_proof_is_identity() {
        let leaf = keccak256(b"only transaction");

        CommitProof::default().verify(leaf, leaf).unwrap();
        assert!(matches!(
            CommitProof::default().verify(leaf, random_hash()),
            Err(MerkleError::RootMismatch { .. })
        ));
    }

    #[test]
    fn test_tree_builder_proofs_verify_for_every_leaf() {
        let transactions: Vec<Vec<u8>> = (0..5u8).map(|i| vec![i; 10]).collect();
        let tree = build_commit_tree(&transactions);

        for (index, transaction) in transactions.iter().enumerate() {
            tree.proof(index)
                .verify(keccak256(transaction), tree.root())
                .unwrap();
        }
    }
}
