// SPDX-License-Identifier: Apache-2.0

//! # Treasury Module
//!
//! The withdrawal dispatcher. Gates every asset release on a verified
//! commit Merkle proof against the light-client state, decodes the
//! execution intent and invokes exactly one `AssetLedger` effect.

pub mod events;
pub mod ledger;

use crate::error::{AssetError, ExecutionError, UpdateError};
use crate::state::LightClientState;
use crate::update;
use events::{Event, HostHooks};
use ledger::AssetLedger;
use settlement_lc_core::crypto::hash::keccak256;
use settlement_lc_core::crypto::U256;
use settlement_lc_core::merkle::proof::CommitProof;
use settlement_lc_core::merkle::verify_commitment;
use settlement_lc_core::types::error::CodecError;
use settlement_lc_core::types::transaction::{
    execution_hash, payload_kind_tag, ExecutionPayload, FungibleTransfer, NonFungibleTransfer,
    PayloadKind,
};

/// The custody authority bound to one upstream chain.
///
/// Holds the light-client state and the chain name baked in at
/// construction, and reaches the destination ledger only through the
/// `AssetLedger` capability.
pub struct Treasury<L, H> {
    state: LightClientState,
    chain_name: Vec<u8>,
    ledger: L,
    hooks: H,
}

impl<L: AssetLedger, H: HostHooks> Treasury<L, H> {
    /// Installs `genesis_header` as the trust anchor. `chain_name` is the
    /// destination-chain identifier withdrawal payloads must carry.
    pub fn new(
        genesis_header: &[u8],
        chain_name: Vec<u8>,
        ledger: L,
        hooks: H,
    ) -> Result<Self, CodecError> {
        Ok(Self {
            state: LightClientState::new(genesis_header)?,
            chain_name,
            ledger,
            hooks,
        })
    }

    pub fn state(&self) -> &LightClientState {
        &self.state
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    /// Advances the light client by one header and announces the new
    /// position. Fails atomically; see [`update::advance`].
    pub fn update_light_client(
        &mut self,
        header_bytes: &[u8],
        proof_bytes: &[u8],
    ) -> Result<(), UpdateError> {
        self.hooks.mutex_guard();

        update::advance(&mut self.state, header_bytes, proof_bytes)?;

        self.hooks.emit_event(Event::UpdateLightClient {
            block_height: self.state.current_height(),
            last_header: self.state.last_header().to_vec(),
        });
        Ok(())
    }

    /// Executes a withdrawal proven to be committed at `block_height`.
    ///
    /// The engine does not deduplicate executions; replay protection
    /// across identical transactions is the host's responsibility.
    pub fn execute(
        &mut self,
        transaction: &[u8],
        execution_payload: &[u8],
        block_height: u64,
        merkle_proof: &[u8],
    ) -> Result<(), ExecutionError> {
        self.hooks.reentrancy_guard();

        let carried = execution_hash(transaction)?;
        let computed = keccak256(execution_payload);
        if carried != computed {
            return Err(ExecutionError::HashMismatch { carried, computed });
        }

        let tag = payload_kind_tag(transaction)?;
        let kind = PayloadKind::from_tag(tag).ok_or(ExecutionError::UnknownPayloadKind { tag })?;
        let payload = ExecutionPayload::from_bytes(kind, execution_payload)?;

        // The engine is single-instance; the sequence is reserved for
        // future fan-out.
        if payload.contract_sequence() != 0 {
            return Err(ExecutionError::WrongSequence {
                actual: payload.contract_sequence(),
            });
        }
        if payload.chain() != self.chain_name.as_slice() {
            return Err(ExecutionError::WrongChain {
                expected: String::from_utf8_lossy(&self.chain_name).into_owned(),
                actual: String::from_utf8_lossy(payload.chain()).into_owned(),
            });
        }

        let proof = CommitProof::from_bytes(merkle_proof)?;
        verify_commitment(
            transaction,
            self.state.commit_roots(),
            &proof,
            block_height,
            self.state.height_offset(),
        )?;

        match payload {
            ExecutionPayload::Fungible(transfer) => self.release_fungible(&transfer)?,
            ExecutionPayload::NonFungible(transfer) => self.release_non_fungible(&transfer)?,
        }
        Ok(())
    }

    fn release_fungible(&mut self, transfer: &FungibleTransfer) -> Result<(), ExecutionError> {
        let amount = U256::from(transfer.amount());

        if transfer.token_address().is_zero() {
            let available = self.ledger.native_balance();
            if available < amount {
                return Err(AssetError::InsufficientBalance {
                    required: amount,
                    available,
                }
                .into());
            }
            self.ledger.release_native(transfer.receiver_address(), amount)?;
        } else {
            let available = self.ledger.fungible_balance(transfer.token_address());
            if available < amount {
                return Err(AssetError::InsufficientBalance {
                    required: amount,
                    available,
                }
                .into());
            }
            self.ledger
                .release_fungible(transfer.token_address(), transfer.receiver_address(), amount)?;
        }

        self.hooks.emit_event(Event::TransferFungibleToken {
            token_address: transfer.token_address(),
            amount: transfer.amount(),
            receiver: transfer.receiver_address(),
            contract_sequence: transfer.contract_sequence(),
        });
        Ok(())
    }

    fn release_non_fungible(
        &mut self,
        transfer: &NonFungibleTransfer,
    ) -> Result<(), ExecutionError> {
        self.ledger.release_non_fungible(
            transfer.collection_address(),
            transfer.receiver_address(),
            transfer.token_id(),
        )?;

        self.hooks.emit_event(Event::TransferNonFungibleToken {
            collection_address: transfer.collection_address(),
            token_id: transfer.token_id(),
            receiver: transfer.receiver_address(),
            contract_sequence: transfer.contract_sequence(),
        });
        Ok(())
    }
}
