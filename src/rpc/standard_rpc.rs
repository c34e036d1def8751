use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::Span;

use super::{
    adapter_span, beacon_api,
    http_client::{ClientWithBaseUrl, Dialect},
    http_transport,
    sse::SseHeadSource,
};
use crate::{
    api::{
        cache::ChainConstants, events::HeadEventDistributor, ChainConstantsProvider,
        ChainHeadProvider, DutiesProvider, HeadEventHandler, HeadEventsProvider, NodeProvider,
        StateProvider, Submitter, ValidatorApi,
    },
    config::{Backend, Config},
    errors::Result,
    types::{
        Attestation, AttestationData, AttesterDuty, BeaconBlock, BeaconCommittee,
        BeaconCommitteeSubscription, ChainHead, CommitteeIndex, Epoch, Finality, Fork, Genesis,
        Gwei, ProposerDuty, Root, Signature, SignedAggregateAndProof, SignedBeaconBlock,
        SignedVoluntaryExit, Slot, StateId, SyncState, Validator, ValidatorIndex,
    },
    utils::start_slot_of_epoch,
};

/// Adapter for nodes serving the standard `/eth/v1` REST API.
#[derive(Clone)]
pub struct StandardRpc {
    http: ClientWithBaseUrl,
    constants: Arc<ChainConstants>,
    events: HeadEventDistributor,
}

impl StandardRpc {
    pub fn new(config: &Config, cancel: CancellationToken) -> Result<Self> {
        let span = adapter_span(Backend::Standard, &config.address);
        let http = http_transport(config, Dialect::Canonical, cancel.clone(), span.clone())?;
        Ok(Self {
            http,
            constants: Arc::new(ChainConstants::default()),
            events: HeadEventDistributor::new(cancel, span),
        })
    }

    pub fn span(&self) -> &Span {
        self.http.span()
    }
}

#[async_trait]
impl NodeProvider for StandardRpc {
    fn backend(&self) -> Backend {
        Backend::Standard
    }

    async fn node_version(&self) -> Result<String> {
        beacon_api::node_version(&self.http).await
    }

    async fn sync_state(&self) -> Result<SyncState> {
        beacon_api::sync_state(&self.http).await
    }
}

#[async_trait]
impl ChainConstantsProvider for StandardRpc {
    async fn genesis(&self) -> Result<Genesis> {
        self.constants
            .genesis(|| beacon_api::genesis(&self.http))
            .await
    }

    async fn slots_per_epoch(&self) -> Result<u64> {
        self.constants
            .slots_per_epoch(|| beacon_api::slots_per_epoch(&self.http))
            .await
    }

    async fn far_future_epoch(&self) -> Result<Epoch> {
        self.constants
            .far_future_epoch(|| beacon_api::far_future_epoch(&self.http))
            .await
    }

    async fn fork_schedule(&self) -> Result<Vec<Fork>> {
        self.constants
            .fork_schedule(|| beacon_api::fork_schedule(&self.http))
            .await
    }
}

#[async_trait]
impl ChainHeadProvider for StandardRpc {
    /// The head header plus the head state's finality checkpoints, converted to slots.
    async fn chain_head(&self) -> Result<ChainHead> {
        let head = beacon_api::header(&self.http, "head").await?;
        let finality = beacon_api::finality(&self.http, StateId::Head).await?;
        let slots_per_epoch = self.slots_per_epoch().await?;
        Ok(ChainHead {
            slot: head.header.message.slot,
            block_root: head.root,
            state_root: head.header.message.state_root,
            finalized_slot: start_slot_of_epoch(finality.finalized.epoch, slots_per_epoch),
            finalized_block_root: finality.finalized.root,
            justified_slot: start_slot_of_epoch(finality.current_justified.epoch, slots_per_epoch),
            justified_block_root: finality.current_justified.root,
        })
    }

    async fn slot_for_block_root(&self, root: Root) -> Result<Slot> {
        Ok(beacon_api::header(&self.http, &root.to_string())
            .await?
            .header
            .message
            .slot)
    }
}

#[async_trait]
impl StateProvider for StandardRpc {
    async fn state_root(&self, state_id: StateId) -> Result<Root> {
        beacon_api::state_root(&self.http, state_id).await
    }

    async fn fork(&self, state_id: StateId) -> Result<Fork> {
        beacon_api::fork(&self.http, state_id).await
    }

    async fn finality(&self, state_id: StateId) -> Result<Finality> {
        beacon_api::finality(&self.http, state_id).await
    }

    async fn beacon_committees(&self, state_id: StateId) -> Result<Vec<BeaconCommittee>> {
        beacon_api::beacon_committees(&self.http, state_id).await
    }

    async fn validators(
        &self,
        state_id: StateId,
        indices: &[ValidatorIndex],
    ) -> Result<HashMap<ValidatorIndex, Validator>> {
        beacon_api::validators(&self.http, state_id, indices).await
    }

    async fn validator_balances(
        &self,
        state_id: StateId,
        indices: &[ValidatorIndex],
    ) -> Result<HashMap<ValidatorIndex, Gwei>> {
        beacon_api::validator_balances(&self.http, state_id, indices).await
    }

    async fn signed_beacon_block_by_slot(&self, slot: Slot) -> Result<Option<SignedBeaconBlock>> {
        beacon_api::signed_beacon_block_by_slot(&self.http, slot).await
    }
}

#[async_trait]
impl DutiesProvider for StandardRpc {
    async fn attester_duties(
        &self,
        epoch: Epoch,
        indices: &[ValidatorIndex],
    ) -> Result<Vec<AttesterDuty>> {
        beacon_api::attester_duties(&self.http, epoch, indices).await
    }

    async fn proposer_duties(
        &self,
        epoch: Epoch,
        indices: &[ValidatorIndex],
    ) -> Result<Vec<ProposerDuty>> {
        beacon_api::proposer_duties(&self.http, epoch, indices).await
    }
}

#[async_trait]
impl ValidatorApi for StandardRpc {
    async fn attestation_data(
        &self,
        slot: Slot,
        committee_index: CommitteeIndex,
    ) -> Result<AttestationData> {
        beacon_api::attestation_data(&self.http, slot, committee_index).await
    }

    async fn aggregate_attestation(
        &self,
        slot: Slot,
        attestation_data_root: Root,
    ) -> Result<Attestation> {
        beacon_api::aggregate_attestation(&self.http, slot, attestation_data_root).await
    }

    async fn beacon_block_proposal(
        &self,
        slot: Slot,
        randao_reveal: Signature,
        graffiti: Root,
    ) -> Result<BeaconBlock> {
        beacon_api::beacon_block_proposal(&self.http, slot, randao_reveal, graffiti).await
    }
}

#[async_trait]
impl Submitter for StandardRpc {
    async fn submit_attestation(&self, attestation: &Attestation) -> Result<()> {
        beacon_api::submit_attestations(&self.http, std::slice::from_ref(attestation)).await
    }

    async fn submit_aggregate_attestations(
        &self,
        aggregates: &[SignedAggregateAndProof],
    ) -> Result<()> {
        beacon_api::submit_aggregate_attestations(&self.http, aggregates).await
    }

    async fn submit_beacon_block(&self, block: &SignedBeaconBlock) -> Result<()> {
        beacon_api::submit_beacon_block(&self.http, block).await
    }

    async fn submit_voluntary_exit(&self, exit: &SignedVoluntaryExit) -> Result<()> {
        beacon_api::submit_voluntary_exit(&self.http, exit).await
    }

    async fn submit_beacon_committee_subscriptions(
        &self,
        subscriptions: &[BeaconCommitteeSubscription],
    ) -> Result<()> {
        beacon_api::submit_beacon_committee_subscriptions(&self.http, subscriptions).await
    }
}

#[async_trait]
impl HeadEventsProvider for StandardRpc {
    async fn on_head(&self, handler: Arc<dyn HeadEventHandler>) -> Result<()> {
        let slots_per_epoch = self.slots_per_epoch().await?;
        self.events.register(handler, slots_per_epoch, || {
            SseHeadSource::connect(self.http.base_url())
        })
    }
}
