// SPDX-License-Identifier: Apache-2.0

//! # Cryptographic Utilities
//!
//! This module contains the cryptographic primitives used by the light client.
//!
//! ## Sub-modules
//!
//! - `hash`: keccak256 hashing and the `HashValue` structure.
//! - `sig`: 65-byte recoverable signatures, 64-byte uncompressed public keys
//!   and address derivation.
//! - `error`: the `CryptoError` type used throughout the `crypto` module.

pub mod error;
pub mod hash;
pub mod sig;

use uint::construct_uint;

pub const U256_BYTES_LENGTH: usize = 32;

construct_uint! {
    pub struct U256(4);
}
