// SPDX-License-Identifier: Apache-2.0

use crate::error::AssetError;
use settlement_lc_core::crypto::U256;
use settlement_lc_core::types::Address;

/// The destination ledger's custody primitives.
///
/// Each release either succeeds or fails atomically; a failing release
/// aborts the withdrawal that requested it.
pub trait AssetLedger {
    /// Balance of the native asset held in custody.
    fn native_balance(&self) -> U256;

    fn release_native(&mut self, to: Address, amount: U256) -> Result<(), AssetError>;

    /// Balance of a fungible token held in custody.
    fn fungible_balance(&self, token: Address) -> U256;

    fn release_fungible(
        &mut self,
        token: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), AssetError>;

    /// Current owner of a token, if the collection knows it.
    fn owner_of(&self, collection: Address, token_id: u128) -> Result<Address, AssetError>;

    fn release_non_fungible(
        &mut self,
        collection: Address,
        to: Address,
        token_id: u128,
    ) -> Result<(), AssetError>;
}
