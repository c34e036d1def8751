//! The capability set every backend adapter implements. Calling code programs against these
//! traits, never against a concrete adapter.

pub mod cache;
pub mod domain;
pub mod events;
pub mod resolver;
pub mod submission;

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;

pub use self::events::HeadEventHandler;
use crate::{
    config::Backend,
    errors::Result,
    types::{
        Attestation, AttestationData, AttesterDuty, BeaconBlock, BeaconCommittee,
        BeaconCommitteeSubscription, ChainHead, CommitteeIndex, Domain, Epoch, Finality, Fork,
        Genesis, Gwei, ProposerDuty, Root, Signature, SignedAggregateAndProof, SignedBeaconBlock,
        SignedVoluntaryExit, Slot, StateId, SyncState, Validator, ValidatorIndex,
    },
    utils,
};

#[async_trait]
pub trait NodeProvider: Send + Sync {
    fn backend(&self) -> Backend;

    async fn node_version(&self) -> Result<String>;

    async fn sync_state(&self) -> Result<SyncState>;
}

/// Chain-wide constants. Fetched once per connection and cached for its lifetime.
#[async_trait]
pub trait ChainConstantsProvider: Send + Sync {
    async fn genesis(&self) -> Result<Genesis>;

    async fn slots_per_epoch(&self) -> Result<u64>;

    async fn far_future_epoch(&self) -> Result<Epoch>;

    /// Sorted ascending by epoch.
    async fn fork_schedule(&self) -> Result<Vec<Fork>>;

    /// The 32-byte signing domain for `domain_type` at `epoch`.
    async fn signature_domain(&self, domain_type: &[u8], epoch: Epoch) -> Result<Domain> {
        domain::signature_domain(self, domain_type, epoch).await
    }

    async fn epoch_at_slot(&self, slot: Slot) -> Result<Epoch> {
        Ok(utils::epoch_at_slot(slot, self.slots_per_epoch().await?))
    }
}

#[async_trait]
pub trait ChainHeadProvider: Send + Sync {
    /// A fresh snapshot on every call.
    async fn chain_head(&self) -> Result<ChainHead>;

    async fn slot_for_block_root(&self, root: Root) -> Result<Slot>;
}

#[async_trait]
impl<T: ChainHeadProvider + ?Sized> ChainHeadProvider for Arc<T> {
    async fn chain_head(&self) -> Result<ChainHead> {
        (**self).chain_head().await
    }

    async fn slot_for_block_root(&self, root: Root) -> Result<Slot> {
        (**self).slot_for_block_root(root).await
    }
}

#[async_trait]
pub trait StateProvider: ChainHeadProvider + ChainConstantsProvider {
    async fn slot_from_state_id(&self, state_id: StateId) -> Result<Slot> {
        resolver::resolve_slot(self, state_id).await
    }

    async fn epoch_from_state_id(&self, state_id: StateId) -> Result<Epoch> {
        resolver::resolve_epoch(self, state_id).await
    }

    async fn state_root(&self, state_id: StateId) -> Result<Root>;

    async fn fork(&self, state_id: StateId) -> Result<Fork>;

    async fn finality(&self, state_id: StateId) -> Result<Finality>;

    async fn beacon_committees(&self, state_id: StateId) -> Result<Vec<BeaconCommittee>>;

    /// An empty `indices` slice returns every validator.
    async fn validators(
        &self,
        state_id: StateId,
        indices: &[ValidatorIndex],
    ) -> Result<HashMap<ValidatorIndex, Validator>>;

    async fn validator_balances(
        &self,
        state_id: StateId,
        indices: &[ValidatorIndex],
    ) -> Result<HashMap<ValidatorIndex, Gwei>>;

    /// `None` when the slot has no block, including when the backend answers with an earlier one.
    async fn signed_beacon_block_by_slot(&self, slot: Slot) -> Result<Option<SignedBeaconBlock>>;
}

/// An empty `indices` slice means every validator.
#[async_trait]
pub trait DutiesProvider: Send + Sync {
    async fn attester_duties(
        &self,
        epoch: Epoch,
        indices: &[ValidatorIndex],
    ) -> Result<Vec<AttesterDuty>>;

    async fn proposer_duties(
        &self,
        epoch: Epoch,
        indices: &[ValidatorIndex],
    ) -> Result<Vec<ProposerDuty>>;
}

#[async_trait]
pub trait ValidatorApi: Send + Sync {
    async fn attestation_data(
        &self,
        slot: Slot,
        committee_index: CommitteeIndex,
    ) -> Result<AttestationData>;

    async fn aggregate_attestation(
        &self,
        slot: Slot,
        attestation_data_root: Root,
    ) -> Result<Attestation>;

    async fn beacon_block_proposal(
        &self,
        slot: Slot,
        randao_reveal: Signature,
        graffiti: Root,
    ) -> Result<BeaconBlock>;
}

#[async_trait]
pub trait Submitter: Send + Sync {
    async fn submit_attestation(&self, attestation: &Attestation) -> Result<()>;

    async fn submit_aggregate_attestations(
        &self,
        aggregates: &[SignedAggregateAndProof],
    ) -> Result<()>;

    async fn submit_beacon_block(&self, block: &SignedBeaconBlock) -> Result<()>;

    async fn submit_voluntary_exit(&self, exit: &SignedVoluntaryExit) -> Result<()>;

    async fn submit_beacon_committee_subscriptions(
        &self,
        subscriptions: &[BeaconCommitteeSubscription],
    ) -> Result<()>;
}

#[async_trait]
pub trait HeadEventsProvider: Send + Sync {
    /// Registers `handler` for every future head update. The first registration starts the
    /// adapter's upstream head source.
    async fn on_head(&self, handler: Arc<dyn HeadEventHandler>) -> Result<()>;
}

/// The full capability set.
pub trait BeaconNodeClient:
    NodeProvider + StateProvider + DutiesProvider + ValidatorApi + Submitter + HeadEventsProvider
{
}

impl<T> BeaconNodeClient for T where
    T: NodeProvider + StateProvider + DutiesProvider + ValidatorApi + Submitter + HeadEventsProvider
{
}
