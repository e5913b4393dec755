// SPDX-License-Identifier: Apache-2.0

//! Deterministic fixture builders shared by the unit and end-to-end tests:
//! seeded validator keys, header and finalization-proof construction, a
//! pairwise keccak commit tree, and transaction-envelope assembly.

use crate::crypto::hash::{hash_inner, keccak256, HashValue};
use crate::crypto::sig::{PublicKey, Signature, SIGNATURE_LENGTH};
use crate::merkle::proof::{CommitProof, ProofStep, LEFT_SIBLING, RIGHT_SIBLING};
use crate::types::header::{BlockFinalizationProof, BlockHeader, TypedSignature, ValidatorInfo};
use crate::types::transaction::{execution_hash_envelope, PAYLOAD_KIND_OFFSET};
use crate::types::Address;
use k256::ecdsa::SigningKey;

pub const TEST_VERSION: &str = "0.1.0";

/// A validator identity derived from a one-byte seed, able to sign header
/// digests the way the upstream consensus does.
pub struct ValidatorKey {
    signing_key: SigningKey,
}

impl ValidatorKey {
    /// Derives a key from `seed`. The seed must be non-zero so the scalar
    /// is on the curve.
    pub fn from_seed(seed: u8) -> Self {
        assert_ne!(seed, 0, "the zero scalar is not a valid secret key");
        let mut bytes = [0u8; 32];
        bytes[31] = seed;
        Self {
            signing_key: SigningKey::from_bytes(&bytes.into())
                .expect("a small non-zero scalar is a valid secret key"),
        }
    }

    /// The 64-byte uncompressed public key, compression tag stripped.
    pub fn public_key(&self) -> PublicKey {
        let point = self.signing_key.verifying_key().to_encoded_point(false);
        PublicKey::new(
            point.as_bytes()[1..]
                .try_into()
                .expect("uncompressed point is 65 bytes"),
        )
    }

    pub fn address(&self) -> Address {
        self.public_key().to_address()
    }

    /// Signs the raw digest, producing a `TypedSignature` with the
    /// Ethereum-style recovery byte.
    pub fn sign(&self, digest: &HashValue) -> TypedSignature {
        let (signature, recovery_id) = self
            .signing_key
            .sign_prehash_recoverable(digest.as_ref())
            .expect("signing a 32-byte digest does not fail");
        let mut bytes = [0u8; SIGNATURE_LENGTH];
        bytes[..SIGNATURE_LENGTH - 1].copy_from_slice(&signature.to_bytes());
        bytes[SIGNATURE_LENGTH - 1] = 27 + recovery_id.to_byte();
        TypedSignature::new(Signature::new(bytes), self.public_key())
    }
}

/// Pairs `keys` and `powers` into a validator set, preserving order.
pub fn make_validators(keys: &[&ValidatorKey], powers: &[u64]) -> Vec<ValidatorInfo> {
    assert_eq!(keys.len(), powers.len());
    keys.iter()
        .zip(powers)
        .map(|(key, power)| ValidatorInfo::new(key.public_key(), *power))
        .collect()
}

/// Builds a header authored by `author` over the given chain position.
pub fn make_header(
    author: &ValidatorKey,
    previous_hash: HashValue,
    block_height: u64,
    timestamp: i64,
    commit_merkle_root: HashValue,
    validators: Vec<ValidatorInfo>,
    prev_block_finalization_proof: BlockFinalizationProof,
) -> BlockHeader {
    BlockHeader::new(
        author.public_key(),
        prev_block_finalization_proof,
        previous_hash,
        block_height,
        timestamp,
        commit_merkle_root,
        validators,
        String::from(TEST_VERSION),
    )
}

/// Signs `digest` with every key, in order.
pub fn finalize(keys: &[&ValidatorKey], digest: &HashValue) -> BlockFinalizationProof {
    BlockFinalizationProof::new(keys.iter().map(|key| key.sign(digest)).collect())
}

/// A pairwise keccak Merkle tree over transaction leaves. An unpaired
/// node is promoted to the next level unchanged.
#[derive(Debug)]
pub struct CommitTree {
    levels: Vec<Vec<HashValue>>,
}

impl CommitTree {
    pub fn root(&self) -> HashValue {
        self.levels[self.levels.len() - 1][0]
    }

    /// The directional proof for the leaf at `index`.
    pub fn proof(&self, index: usize) -> CommitProof {
        let mut steps = Vec::new();
        let mut position = index;
        for level in &self.levels[..self.levels.len() - 1] {
            let sibling = position ^ 1;
            if sibling < level.len() {
                let direction = if position % 2 == 0 {
                    RIGHT_SIBLING
                } else {
                    LEFT_SIBLING
                };
                steps.push(ProofStep::new(direction, level[sibling]));
            }
            position /= 2;
        }
        CommitProof::new(steps)
    }
}

/// Builds the commit tree over the given transactions. The leaf pre-image
/// is the whole transaction bytes.
pub fn build_commit_tree(transactions: &[Vec<u8>]) -> CommitTree {
    assert!(!transactions.is_empty());

    let mut levels = vec![transactions
        .iter()
        .map(|transaction| keccak256(transaction))
        .collect::<Vec<_>>()];

    while levels[levels.len() - 1].len() > 1 {
        let previous = &levels[levels.len() - 1];
        let mut next = Vec::with_capacity(previous.len().div_ceil(2));
        for pair in previous.chunks(2) {
            next.push(match pair {
                [left, right] => hash_inner(left.as_ref(), right.as_ref()),
                [lone] => *lone,
                _ => unreachable!(),
            });
        }
        levels.push(next);
    }

    CommitTree { levels }
}

/// Assembles a transaction envelope: an opaque head, the payload-kind tag
/// at the fixed offset, the payload itself and the execution-hash tail.
pub fn make_transaction(kind_tag: u64, payload: &[u8]) -> Vec<u8> {
    let mut transaction = vec![0u8; PAYLOAD_KIND_OFFSET];
    transaction.extend_from_slice(&kind_tag.to_le_bytes());
    transaction.extend_from_slice(payload);
    transaction.extend_from_slice(&execution_hash_envelope(&keccak256(payload)));
    transaction
}

pub fn random_hash() -> HashValue {
    use rand::Rng;

    let mut rng = rand::thread_rng();
    let mut arr = [0u8; 32];
    rng.fill(&mut arr);
    HashValue::new(arr)
}
