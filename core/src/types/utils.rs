// SPDX-License-Identifier: Apache-2.0

/// Size of a u64 representation in bytes.
pub const U64_SIZE: usize = 8;

/// Size of a u128 representation in bytes.
pub const U128_SIZE: usize = 16;

/// Size in bytes of the enum tag carried by an execution payload.
pub const ENUM_TAG_SIZE: usize = 4;

/// Size in bytes of the compression prefix preceding each public key on
/// the wire. The prefix is discarded on decode.
pub const KEY_PREFIX_SIZE: usize = 1;

/// Size in bytes of the version string carried by a block header.
pub const VERSION_SIZE: usize = 5;
