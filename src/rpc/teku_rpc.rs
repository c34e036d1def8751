use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, Span};

use super::{
    adapter_span, beacon_api,
    http_client::{ClientWithBaseUrl, Dialect},
    http_transport,
    rpc_types::{LegacyBlockResponse, TekuChainHead},
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
};

/// Adapter for Teku. Most of the surface is the standard API; the chain head, state roots and
/// blocks by slot come from Teku's legacy endpoints.
#[derive(Clone)]
pub struct TekuRpc {
    http: ClientWithBaseUrl,
    constants: Arc<ChainConstants>,
    events: HeadEventDistributor,
}

impl TekuRpc {
    pub fn new(config: &Config, cancel: CancellationToken) -> Result<Self> {
        let span = adapter_span(Backend::Teku, &config.address);
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

    async fn legacy_block(&self, query: &str) -> Result<Option<LegacyBlockResponse>> {
        self.http
            .get_optional(&format!("/beacon/block?{query}"))
            .await
    }
}

#[async_trait]
impl NodeProvider for TekuRpc {
    fn backend(&self) -> Backend {
        Backend::Teku
    }

    async fn node_version(&self) -> Result<String> {
        beacon_api::node_version(&self.http).await
    }

    async fn sync_state(&self) -> Result<SyncState> {
        beacon_api::sync_state(&self.http).await
    }
}

#[async_trait]
impl ChainConstantsProvider for TekuRpc {
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
impl ChainHeadProvider for TekuRpc {
    async fn chain_head(&self) -> Result<ChainHead> {
        let head: TekuChainHead = self.http.get("/beacon/chainhead").await?;
        let state_root = beacon_api::header(&self.http, &head.head_block_root.to_string())
            .await?
            .header
            .message
            .state_root;
        Ok(ChainHead {
            slot: head.head_slot,
            block_root: head.head_block_root,
            state_root,
            finalized_slot: head.finalized_slot,
            finalized_block_root: head.finalized_block_root,
            justified_slot: head.justified_slot,
            justified_block_root: head.justified_block_root,
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
impl StateProvider for TekuRpc {
    async fn state_root(&self, state_id: StateId) -> Result<Root> {
        let slot = self.slot_from_state_id(state_id).await?;
        debug!(%state_id, slot, "looking up state root by slot");
        self.http
            .get(&format!("/beacon/state_root?slot={slot}"))
            .await
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

    /// The legacy endpoint answers an empty slot with the latest earlier block.
    async fn signed_beacon_block_by_slot(&self, slot: Slot) -> Result<Option<SignedBeaconBlock>> {
        Ok(self
            .legacy_block(&format!("slot={slot}"))
            .await?
            .map(|response| response.beacon_block)
            .filter(|block| block.slot() >= slot))
    }
}

#[async_trait]
impl DutiesProvider for TekuRpc {
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
impl ValidatorApi for TekuRpc {
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
impl Submitter for TekuRpc {
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
impl HeadEventsProvider for TekuRpc {
    async fn on_head(&self, handler: Arc<dyn HeadEventHandler>) -> Result<()> {
        let slots_per_epoch = self.slots_per_epoch().await?;
        self.events.register(handler, slots_per_epoch, || {
            SseHeadSource::connect(self.http.base_url())
        })
    }
}
