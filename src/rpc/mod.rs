//! Backend adapters. Each one translates the canonical contract onto one node implementation's
//! wire protocol; [`BeaconClient`] picks one per connection.

pub mod beacon_api;
pub mod http_client;
pub mod lighthouse_rpc;
pub mod prysm_rpc;
pub mod rpc_types;
pub mod sse;
pub mod standard_rpc;
pub mod teku_rpc;

use std::{collections::HashMap, fmt, future::Future, sync::Arc};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, Instrument, Span};
use url::Url;

use self::{
    http_client::{ClientWithBaseUrl, Dialect},
    lighthouse_rpc::LighthouseRpc,
    prysm_rpc::PrysmRpc,
    standard_rpc::StandardRpc,
    teku_rpc::TekuRpc,
};
use crate::{
    api::{
        ChainConstantsProvider, ChainHeadProvider, DutiesProvider, HeadEventHandler,
        HeadEventsProvider, NodeProvider, StateProvider, Submitter, ValidatorApi,
    },
    config::{Backend, Config},
    errors::{ClientError, OperationContext, Result},
    types::{
        Attestation, AttestationData, AttesterDuty, BeaconBlock, BeaconCommittee,
        BeaconCommitteeSubscription, ChainHead, CommitteeIndex, Epoch, Finality, Fork, Genesis,
        Gwei, ProposerDuty, Root, Signature, SignedAggregateAndProof, SignedBeaconBlock,
        SignedVoluntaryExit, Slot, StateId, SyncState, Validator, ValidatorIndex,
    },
};

/// Runs `fut` unless `token` fires first.
pub async fn cancellable<F: Future>(token: &CancellationToken, fut: F) -> Result<F::Output> {
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(ClientError::Cancelled),
        output = fut => Ok(output),
    }
}

/// The span every call of one adapter instance is recorded under.
pub fn adapter_span(backend: Backend, address: &str) -> Span {
    info_span!("beacon_client", backend = backend.name(), address = %address)
}

pub(crate) fn http_transport(
    config: &Config,
    dialect: Dialect,
    cancel: CancellationToken,
    span: Span,
) -> Result<ClientWithBaseUrl> {
    ClientWithBaseUrl::new(
        Url::parse(&config.address)?,
        config.request_timeout(),
        dialect,
        cancel,
        span,
    )
}

/// A connected client for one node, whatever its implementation.
#[derive(Clone)]
pub enum BeaconClient {
    Standard(StandardRpc),
    Lighthouse(LighthouseRpc),
    Teku(TekuRpc),
    Prysm(PrysmRpc),
}

impl BeaconClient {
    /// Builds the adapter for `config.backend`, probing the node first when it is
    /// [`Backend::Auto`]. `cancel` governs every request and the head event task.
    pub async fn connect(config: &Config, cancel: CancellationToken) -> Result<Self> {
        let backend = match config.backend {
            Backend::Auto => detect_backend(config, &cancel)
                .await
                .operation("detect_backend")?,
            backend => backend,
        };
        info!(backend = backend.name(), address = %config.address, "connecting to beacon node");

        Ok(match backend {
            // detection never yields Auto
            Backend::Standard | Backend::Auto => Self::Standard(StandardRpc::new(config, cancel)?),
            Backend::Lighthouse => Self::Lighthouse(LighthouseRpc::new(config, cancel)?),
            Backend::Teku => Self::Teku(TekuRpc::new(config, cancel)?),
            Backend::Prysm => Self::Prysm(PrysmRpc::new(config, cancel)?),
        })
    }

    pub fn span(&self) -> &Span {
        match self {
            Self::Standard(client) => client.span(),
            Self::Lighthouse(client) => client.span(),
            Self::Teku(client) => client.span(),
            Self::Prysm(client) => client.span(),
        }
    }
}

impl fmt::Debug for BeaconClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeaconClient")
            .field("backend", &self.backend())
            .finish_non_exhaustive()
    }
}

/// Teku and other standard-API nodes answer `/eth/v1/node/version`; Lighthouse nodes predating
/// it only answer the legacy `/node/version`.
async fn detect_backend(config: &Config, cancel: &CancellationToken) -> Result<Backend> {
    let span = adapter_span(Backend::Auto, &config.address);
    let probe = http_transport(config, Dialect::Canonical, cancel.clone(), span.clone())?;
    let err = match beacon_api::node_version(&probe).await {
        Ok(version) => {
            debug!(%version, "node answered the standard version endpoint");
            return Ok(if version.to_lowercase().contains("teku") {
                Backend::Teku
            } else {
                Backend::Standard
            });
        }
        Err(err) if err.is_cancelled() => return Err(err),
        Err(err) => err,
    };

    let legacy = http_transport(config, Dialect::Loose, cancel.clone(), span)?;
    match legacy.get::<String>("/node/version").await {
        Ok(version) if version.contains("Lighthouse") => Ok(Backend::Lighthouse),
        Ok(version) => {
            debug!(%version, "unrecognized legacy node version");
            Err(err)
        }
        Err(_) => Err(err),
    }
}

/// Delegates to the active adapter, recording the call under its span.
macro_rules! dispatch {
    ($self:ident, $client:ident => $call:expr) => {
        match $self {
            BeaconClient::Standard($client) => $call.instrument($client.span().clone()).await,
            BeaconClient::Lighthouse($client) => $call.instrument($client.span().clone()).await,
            BeaconClient::Teku($client) => $call.instrument($client.span().clone()).await,
            BeaconClient::Prysm($client) => $call.instrument($client.span().clone()).await,
        }
    };
}

#[async_trait]
impl NodeProvider for BeaconClient {
    fn backend(&self) -> Backend {
        match self {
            Self::Standard(_) => Backend::Standard,
            Self::Lighthouse(_) => Backend::Lighthouse,
            Self::Teku(_) => Backend::Teku,
            Self::Prysm(_) => Backend::Prysm,
        }
    }

    async fn node_version(&self) -> Result<String> {
        dispatch!(self, client => client.node_version())
    }

    async fn sync_state(&self) -> Result<SyncState> {
        dispatch!(self, client => client.sync_state())
    }
}

#[async_trait]
impl ChainConstantsProvider for BeaconClient {
    async fn genesis(&self) -> Result<Genesis> {
        dispatch!(self, client => client.genesis())
    }

    async fn slots_per_epoch(&self) -> Result<u64> {
        dispatch!(self, client => client.slots_per_epoch())
    }

    async fn far_future_epoch(&self) -> Result<Epoch> {
        dispatch!(self, client => client.far_future_epoch())
    }

    async fn fork_schedule(&self) -> Result<Vec<Fork>> {
        dispatch!(self, client => client.fork_schedule())
    }
}

#[async_trait]
impl ChainHeadProvider for BeaconClient {
    async fn chain_head(&self) -> Result<ChainHead> {
        dispatch!(self, client => client.chain_head())
    }

    async fn slot_for_block_root(&self, root: Root) -> Result<Slot> {
        dispatch!(self, client => client.slot_for_block_root(root))
    }
}

#[async_trait]
impl StateProvider for BeaconClient {
    async fn slot_from_state_id(&self, state_id: StateId) -> Result<Slot> {
        dispatch!(self, client => client.slot_from_state_id(state_id))
    }

    async fn epoch_from_state_id(&self, state_id: StateId) -> Result<Epoch> {
        dispatch!(self, client => client.epoch_from_state_id(state_id))
    }

    async fn state_root(&self, state_id: StateId) -> Result<Root> {
        dispatch!(self, client => client.state_root(state_id))
    }

    async fn fork(&self, state_id: StateId) -> Result<Fork> {
        dispatch!(self, client => client.fork(state_id))
    }

    async fn finality(&self, state_id: StateId) -> Result<Finality> {
        dispatch!(self, client => client.finality(state_id))
    }

    async fn beacon_committees(&self, state_id: StateId) -> Result<Vec<BeaconCommittee>> {
        dispatch!(self, client => client.beacon_committees(state_id))
    }

    async fn validators(
        &self,
        state_id: StateId,
        indices: &[ValidatorIndex],
    ) -> Result<HashMap<ValidatorIndex, Validator>> {
        dispatch!(self, client => client.validators(state_id, indices))
    }

    async fn validator_balances(
        &self,
        state_id: StateId,
        indices: &[ValidatorIndex],
    ) -> Result<HashMap<ValidatorIndex, Gwei>> {
        dispatch!(self, client => client.validator_balances(state_id, indices))
    }

    async fn signed_beacon_block_by_slot(&self, slot: Slot) -> Result<Option<SignedBeaconBlock>> {
        dispatch!(self, client => client.signed_beacon_block_by_slot(slot))
    }
}

#[async_trait]
impl DutiesProvider for BeaconClient {
    async fn attester_duties(
        &self,
        epoch: Epoch,
        indices: &[ValidatorIndex],
    ) -> Result<Vec<AttesterDuty>> {
        dispatch!(self, client => client.attester_duties(epoch, indices))
    }

    async fn proposer_duties(
        &self,
        epoch: Epoch,
        indices: &[ValidatorIndex],
    ) -> Result<Vec<ProposerDuty>> {
        dispatch!(self, client => client.proposer_duties(epoch, indices))
    }
}

#[async_trait]
impl ValidatorApi for BeaconClient {
    async fn attestation_data(
        &self,
        slot: Slot,
        committee_index: CommitteeIndex,
    ) -> Result<AttestationData> {
        dispatch!(self, client => client.attestation_data(slot, committee_index))
    }

    async fn aggregate_attestation(
        &self,
        slot: Slot,
        attestation_data_root: Root,
    ) -> Result<Attestation> {
        dispatch!(self, client => client.aggregate_attestation(slot, attestation_data_root))
    }

    async fn beacon_block_proposal(
        &self,
        slot: Slot,
        randao_reveal: Signature,
        graffiti: Root,
    ) -> Result<BeaconBlock> {
        dispatch!(self, client => client.beacon_block_proposal(slot, randao_reveal, graffiti))
    }
}

#[async_trait]
impl Submitter for BeaconClient {
    async fn submit_attestation(&self, attestation: &Attestation) -> Result<()> {
        dispatch!(self, client => client.submit_attestation(attestation))
    }

    async fn submit_aggregate_attestations(
        &self,
        aggregates: &[SignedAggregateAndProof],
    ) -> Result<()> {
        dispatch!(self, client => client.submit_aggregate_attestations(aggregates))
    }

    async fn submit_beacon_block(&self, block: &SignedBeaconBlock) -> Result<()> {
        dispatch!(self, client => client.submit_beacon_block(block))
    }

    async fn submit_voluntary_exit(&self, exit: &SignedVoluntaryExit) -> Result<()> {
        dispatch!(self, client => client.submit_voluntary_exit(exit))
    }

    async fn submit_beacon_committee_subscriptions(
        &self,
        subscriptions: &[BeaconCommitteeSubscription],
    ) -> Result<()> {
        dispatch!(self, client => client.submit_beacon_committee_subscriptions(subscriptions))
    }
}

#[async_trait]
impl HeadEventsProvider for BeaconClient {
    async fn on_head(&self, handler: Arc<dyn HeadEventHandler>) -> Result<()> {
        dispatch!(self, client => client.on_head(handler))
    }
}
