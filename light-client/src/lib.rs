// SPDX-License-Identifier: Apache-2.0

//! Settlement-side light client for a BFT-finalized upstream chain.
//!
//! The light client tracks the upstream chain's finalized headers by
//! verifying a chain of finalization proofs, and the treasury releases
//! custodied assets only for transactions Merkle-proven to lie in a
//! finalized upstream block.
//!
//! ## Sub-modules
//!
//! - `state`: the light-client state, one accepted raw header and the
//!   append-only vector of commit roots.
//! - `update`: the header-chain advance operation.
//! - `treasury`: the withdrawal dispatcher and its host capabilities.
//! - `error`: the error types surfaced by the two entry points.

pub mod error;
pub mod state;
pub mod treasury;
pub mod update;
