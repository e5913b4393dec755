// SPDX-License-Identifier: Apache-2.0

use settlement_lc_core::types::Address;

/// Success events emitted through the host. The engine performs no logging
/// of its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    TransferFungibleToken {
        token_address: Address,
        amount: u128,
        receiver: Address,
        contract_sequence: u128,
    },
    TransferNonFungibleToken {
        collection_address: Address,
        token_id: u128,
        receiver: Address,
        contract_sequence: u128,
    },
    UpdateLightClient {
        block_height: u64,
        last_header: Vec<u8>,
    },
}

/// Host-supplied execution hooks.
///
/// The engine is a single-threaded state machine; the host is responsible
/// for mutual exclusion around updates, reentrancy protection around
/// withdrawals and the transport of emitted events. The guard hooks mark
/// the scopes the host must protect.
pub trait HostHooks {
    /// Entered before a light-client update mutates state.
    fn mutex_guard(&mut self);

    /// Entered before a withdrawal can reach the asset ledger.
    fn reentrancy_guard(&mut self);

    fn emit_event(&mut self, event: Event);
}
