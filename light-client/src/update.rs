// SPDX-License-Identifier: Apache-2.0

//! # Update Module
//!
//! The header-chain advance: verifies that a submitted header is the valid
//! direct successor of the last accepted one and that a strict two-thirds
//! quorum of the previous validator set finalized the linkage digest.

use crate::error::UpdateError;
use crate::state::LightClientState;
use settlement_lc_core::crypto::hash::keccak256;
use settlement_lc_core::types::header::{BlockFinalizationProof, BlockHeader};

/// Advances `state` by exactly one height.
///
/// Checks run in order: decode, height, linkage, monotone time, authorship,
/// quorum. Every failure is fatal to the call and leaves the state
/// untouched; on success the new raw header replaces the tracked one and
/// its commit root is appended.
pub fn advance(
    state: &mut LightClientState,
    header_bytes: &[u8],
    proof_bytes: &[u8],
) -> Result<(), UpdateError> {
    let prev = BlockHeader::from_bytes(state.last_header())?;
    let next = BlockHeader::from_bytes(header_bytes)?;

    prev.verify_successor(&next, keccak256(state.last_header()))?;

    let proof = BlockFinalizationProof::from_bytes(proof_bytes)?;
    prev.verify_finalization_quorum(next.previous_hash(), &proof)?;

    state.commit(header_bytes.to_vec(), next.commit_merkle_root());
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use settlement_lc_core::crypto::hash::HashValue;
    use settlement_lc_core::test_utils::{
        finalize, make_header, make_validators, ValidatorKey,
    };
    use settlement_lc_core::types::error::ValidationError;
    use settlement_lc_core::types::header::ValidatorInfo;

    struct Chain {
        keys: Vec<ValidatorKey>,
        powers: Vec<u64>,
        state: LightClientState,
    }

    impl Chain {
        /// A chain rooted at height 0 with one validator set reused by
        /// every header.
        fn bootstrap(seeds: &[u8], powers: &[u64]) -> Self {
            let keys: Vec<ValidatorKey> =
                seeds.iter().map(|seed| ValidatorKey::from_seed(*seed)).collect();
            let validators = Self::validators(&keys, powers);
            let genesis = make_header(
                &keys[0],
                HashValue::default(),
                0,
                1_700_000_000,
                keccak256(b"commit root 0"),
                validators,
                BlockFinalizationProof::default(),
            );
            let state = LightClientState::new(&genesis.to_bytes()).unwrap();
            Self {
                keys,
                powers: powers.to_vec(),
                state,
            }
        }

        fn validators(keys: &[ValidatorKey], powers: &[u64]) -> Vec<ValidatorInfo> {
            make_validators(&keys.iter().collect::<Vec<_>>(), powers)
        }

        /// The next header in sequence, finalized by every validator.
        fn next_header(&self) -> (Vec<u8>, Vec<u8>) {
            let digest = keccak256(self.state.last_header());
            let height = self.state.current_height() + 1;
            let header = make_header(
                &self.keys[0],
                digest,
                height,
                1_700_000_000 + height as i64,
                keccak256(format!("commit root {height}").as_bytes()),
                Self::validators(&self.keys, &self.powers),
                finalize(&self.keys.iter().collect::<Vec<_>>(), &digest),
            );
            let proof = finalize(&self.keys.iter().collect::<Vec<_>>(), &digest);
            (header.to_bytes(), proof.to_bytes())
        }
    }

    #[test]
    fn test_advance_accepts_finalized_successor() {
        let mut chain = Chain::bootstrap(&[1, 2, 3], &[100, 100, 100]);
        let (header, proof) = chain.next_header();

        advance(&mut chain.state, &header, &proof).unwrap();

        assert_eq!(chain.state.current_height(), 1);
        assert_eq!(chain.state.commit_roots().len(), 2);
        assert_eq!(chain.state.last_header(), header.as_slice());
    }

    #[test]
    fn test_advance_chains_multiple_heights() {
        let mut chain = Chain::bootstrap(&[1, 2, 3], &[100, 100, 100]);

        for expected_height in 1..=5 {
            let (header, proof) = chain.next_header();
            advance(&mut chain.state, &header, &proof).unwrap();
            assert_eq!(chain.state.current_height(), expected_height);
            assert_eq!(
                chain.state.commit_roots().len() as u64,
                expected_height + 1
            );
        }
    }

    #[test]
    fn test_advance_rejects_replay() {
        let mut chain = Chain::bootstrap(&[1, 2, 3], &[100, 100, 100]);
        let genesis = chain.state.last_header().to_vec();
        let (header, proof) = chain.next_header();
        advance(&mut chain.state, &header, &proof).unwrap();

        // Resubmitting the accepted header is a height gap, as is the
        // genesis itself.
        let before = chain.state.clone();
        assert!(matches!(
            advance(&mut chain.state, &header, &proof),
            Err(UpdateError::Validation(ValidationError::HeightGap {
                expected: 2,
                actual: 1
            }))
        ));
        assert!(matches!(
            advance(&mut chain.state, &genesis, &proof),
            Err(UpdateError::Validation(ValidationError::HeightGap {
                expected: 2,
                actual: 0
            }))
        ));
        assert_eq!(chain.state, before);
    }

    #[test]
    fn test_advance_rejects_insufficient_quorum() {
        let mut chain = Chain::bootstrap(&[1, 2, 3], &[100, 100, 100]);
        let before = chain.state.clone();

        let digest = keccak256(chain.state.last_header());
        let header = make_header(
            &chain.keys[0],
            digest,
            1,
            1_700_000_001,
            keccak256(b"commit root 1"),
            Chain::validators(&chain.keys, &chain.powers),
            finalize(&[&chain.keys[0]], &digest),
        );
        // Only the first validator signs: 100 of 300.
        let proof = finalize(&[&chain.keys[0]], &digest);

        assert!(matches!(
            advance(&mut chain.state, &header.to_bytes(), &proof.to_bytes()),
            Err(UpdateError::Validation(
                ValidationError::InsufficientQuorum {
                    voted: 100,
                    total: 300
                }
            ))
        ));
        assert_eq!(chain.state, before);
    }

    #[test]
    fn test_advance_rejects_undecodable_inputs() {
        let mut chain = Chain::bootstrap(&[1], &[100]);
        let before = chain.state.clone();
        let (header, proof) = chain.next_header();

        assert!(matches!(
            advance(&mut chain.state, &header[..10], &proof),
            Err(UpdateError::Codec(_))
        ));
        assert!(matches!(
            advance(&mut chain.state, &header, &proof[..5]),
            Err(UpdateError::Codec(_))
        ));
        assert_eq!(chain.state, before);
    }
}
