// SPDX-License-Identifier: Apache-2.0

//! # Merkle Module
//!
//! Commit Merkle-proof verification: recomputes a commit root from a
//! transaction and its directional proof path, and binds the result to the
//! root stored for an already accepted height.

pub mod proof;

use crate::crypto::hash::{keccak256, HashValue};
use crate::types::error::MerkleError;
use proof::CommitProof;

/// Verifies that `transaction` is committed at `block_height`.
///
/// The leaf pre-image is the whole transaction bytes: the transaction binds
/// chain id, sequence and the payload's own keccak into one committed blob.
/// `commit_roots` is indexed by `block_height - height_offset`.
pub fn verify_commitment(
    transaction: &[u8],
    commit_roots: &[HashValue],
    proof: &CommitProof,
    block_height: u64,
    height_offset: u64,
) -> Result<(), MerkleError> {
    let count = commit_roots.len();
    if block_height < height_offset || block_height - height_offset >= count as u64 {
        return Err(MerkleError::HeightOutOfRange {
            height: block_height,
            offset: height_offset,
            count,
        });
    }

    let root = commit_roots[(block_height - height_offset) as usize];
    proof.verify(keccak256(transaction), root)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_utils::build_commit_tree;

    #[test]
    fn test_verify_commitment_selects_root_by_offset() {
        let transactions = vec![b"tx a".to_vec(), b"tx b".to_vec(), b"tx c".to_vec()];
        let tree = build_commit_tree(&transactions);

        let roots = vec![HashValue::default(), tree.root()];

        verify_commitment(&transactions[1], &roots, &tree.proof(1), 11, 10).unwrap();
    }

    #[test]
    fn test_verify_commitment_out_of_range() {
        let tree = build_commit_tree(&[b"tx".to_vec()]);
        let roots = vec![tree.root()];

        for height in [9, 11, u64::MAX] {
            assert!(matches!(
                verify_commitment(b"tx", &roots, &tree.proof(0), height, 10),
                Err(MerkleError::HeightOutOfRange { .. })
            ));
        }

        verify_commitment(b"tx", &roots, &tree.proof(0), 10, 10).unwrap();
    }

    #[test]
    fn test_verify_commitment_wrong_transaction() {
        let transactions = vec![b"tx a".to_vec(), b"tx b".to_vec()];
        let tree = build_commit_tree(&transactions);
        let roots = vec![tree.root()];

        assert!(matches!(
            verify_commitment(b"tx mangled", &roots, &tree.proof(0), 0, 0),
            Err(MerkleError::RootMismatch { .. })
        ));
    }
}
