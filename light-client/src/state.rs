// SPDX-License-Identifier: Apache-2.0

//! # State Module
//!
//! The light-client state: the most recently accepted raw header and the
//! append-only vector of commit roots, indexed by `height - height_offset`.
//!
//! The following invariants hold after every successful mutation:
//!
//! 1. `commit_roots.len() >= 1` and equals
//!    `current_height - height_offset + 1`.
//! 2. `keccak256(last_header)` matched the incoming header's previous-hash
//!    linkage at the moment `last_header` became current.
//! 3. The last accepted header's height equals
//!    `height_offset + commit_roots.len() - 1`.
//! 4. `commit_roots[i]` is the commit Merkle root of the header accepted
//!    at height `height_offset + i`.

use getset::CopyGetters;
use settlement_lc_core::crypto::hash::HashValue;
use settlement_lc_core::types::error::CodecError;
use settlement_lc_core::types::header::BlockHeader;

/// The light-client state for one tracked upstream chain.
///
/// Created once from a genesis header; only the header-chain advance
/// mutates it afterwards.
#[derive(Debug, Clone, PartialEq, Eq, CopyGetters)]
pub struct LightClientState {
    /// Block height of the genesis header installed at construction.
    #[getset(get_copy = "pub")]
    height_offset: u64,
    last_header: Vec<u8>,
    commit_roots: Vec<HashValue>,
}

impl LightClientState {
    /// Installs `genesis_header` as the trust anchor.
    pub fn new(genesis_header: &[u8]) -> Result<Self, CodecError> {
        let genesis = BlockHeader::from_bytes(genesis_header)?;
        Ok(Self {
            height_offset: genesis.block_height(),
            last_header: genesis_header.to_vec(),
            commit_roots: vec![genesis.commit_merkle_root()],
        })
    }

    /// The most recently accepted header, kept raw so its keccak256 can be
    /// recomputed deterministically.
    pub fn last_header(&self) -> &[u8] {
        &self.last_header
    }

    /// Commit roots of every accepted header, in height order, genesis
    /// first.
    pub fn commit_roots(&self) -> &[HashValue] {
        &self.commit_roots
    }

    /// Height of the most recently accepted header.
    pub fn current_height(&self) -> u64 {
        self.height_offset + self.commit_roots.len() as u64 - 1
    }

    /// The commit root stored for `height`, if that height has been
    /// accepted.
    pub fn commit_root_at(&self, height: u64) -> Option<HashValue> {
        let index = height.checked_sub(self.height_offset)?;
        self.commit_roots.get(index as usize).copied()
    }

    /// Replaces the tracked header and appends its commit root. Only the
    /// header-chain advance may call this, after all checks have passed.
    pub(crate) fn commit(&mut self, raw_header: Vec<u8>, commit_root: HashValue) {
        self.last_header = raw_header;
        self.commit_roots.push(commit_root);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use settlement_lc_core::crypto::hash::keccak256;
    use settlement_lc_core::test_utils::{make_header, make_validators, ValidatorKey};
    use settlement_lc_core::types::header::BlockFinalizationProof;

    #[test]
    fn test_new_installs_genesis() {
        let key = ValidatorKey::from_seed(1);
        let root = keccak256(b"genesis commit root");
        let genesis = make_header(
            &key,
            HashValue::default(),
            21,
            1_700_000_000,
            root,
            make_validators(&[&key], &[100]),
            BlockFinalizationProof::default(),
        );
        let bytes = genesis.to_bytes();

        let state = LightClientState::new(&bytes).unwrap();

        assert_eq!(state.height_offset(), 21);
        assert_eq!(state.current_height(), 21);
        assert_eq!(state.last_header(), bytes.as_slice());
        assert_eq!(state.commit_roots(), &[root]);
        assert_eq!(state.commit_root_at(21), Some(root));
        assert_eq!(state.commit_root_at(20), None);
        assert_eq!(state.commit_root_at(22), None);
    }

    #[test]
    fn test_new_rejects_malformed_genesis() {
        assert!(LightClientState::new(&[0u8; 40]).is_err());
    }

    #[test]
    fn test_commit_appends_in_height_order() {
        let key = ValidatorKey::from_seed(1);
        let genesis = make_header(
            &key,
            HashValue::default(),
            0,
            1_700_000_000,
            keccak256(b"root 0"),
            make_validators(&[&key], &[100]),
            BlockFinalizationProof::default(),
        );
        let mut state = LightClientState::new(&genesis.to_bytes()).unwrap();

        let next_root = keccak256(b"root 1");
        state.commit(b"next header".to_vec(), next_root);

        assert_eq!(state.current_height(), 1);
        assert_eq!(state.commit_roots().len(), 2);
        assert_eq!(state.commit_root_at(1), Some(next_root));
        assert_eq!(state.last_header(), b"next header");
    }
}
