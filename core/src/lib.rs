// SPDX-License-Identifier: Apache-2.0

//! Verification engine for the settlement-side light client: binary codecs
//! for the upstream consensus wire formats, keccak/secp256k1 primitives,
//! header transition validation and commit Merkle-proof verification.
//!
//! Everything in this crate is deterministic and side-effect free; state
//! and asset effects live in the `settlement-lc` crate.

pub mod crypto;
pub mod merkle;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod types;
