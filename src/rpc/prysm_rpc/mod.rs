//! Adapter for Prysm's gRPC API (`ethereum.eth.v1alpha1`).

mod convert;
pub mod proto;

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;
use tonic::{
    client::Grpc,
    codec::{ProstCodec, Streaming},
    codegen::http::uri::PathAndQuery,
    transport::{Channel, Endpoint},
    Request,
};
use tracing::{debug, warn, Instrument, Span};

use self::proto::{BlockFilter, EpochFilter, MAX_PAGE_SIZE};
use super::{adapter_span, cancellable};
use crate::{
    api::{
        cache::ChainConstants,
        events::{HeadEventDistributor, HeadSource},
        ChainConstantsProvider, ChainHeadProvider, DutiesProvider, HeadEventHandler,
        HeadEventsProvider, NodeProvider, StateProvider, Submitter, ValidatorApi,
    },
    config::{Backend, Config},
    errors::{ClientError, Result},
    types::{
        chain::fork_at_epoch, Attestation, AttestationData, AttesterDuty, BeaconBlock,
        BeaconCommittee, BeaconCommitteeSubscription, ChainHead, Checkpoint, CommitteeIndex,
        Epoch, Finality, Fork, Genesis, Gwei, HeadUpdate, ProposerDuty, Root, Signature,
        SignedAggregateAndProof, SignedBeaconBlock, SignedVoluntaryExit, Slot, StateId, SyncState,
        Validator, ValidatorIndex, ValidatorStatus, FAR_FUTURE_EPOCH,
    },
};

const GET_VERSION: &str = "/ethereum.eth.v1alpha1.Node/GetVersion";
const GET_SYNC_STATUS: &str = "/ethereum.eth.v1alpha1.Node/GetSyncStatus";
const GET_GENESIS: &str = "/ethereum.eth.v1alpha1.Node/GetGenesis";
const GET_BEACON_CONFIG: &str = "/ethereum.eth.v1alpha1.BeaconChain/GetBeaconConfig";
const GET_CHAIN_HEAD: &str = "/ethereum.eth.v1alpha1.BeaconChain/GetChainHead";
const STREAM_CHAIN_HEAD: &str = "/ethereum.eth.v1alpha1.BeaconChain/StreamChainHead";
const LIST_BLOCKS: &str = "/ethereum.eth.v1alpha1.BeaconChain/ListBlocks";
const LIST_VALIDATORS: &str = "/ethereum.eth.v1alpha1.BeaconChain/ListValidators";
const LIST_VALIDATOR_BALANCES: &str = "/ethereum.eth.v1alpha1.BeaconChain/ListValidatorBalances";
const LIST_BEACON_COMMITTEES: &str = "/ethereum.eth.v1alpha1.BeaconChain/ListBeaconCommittees";
const GET_DUTIES: &str = "/ethereum.eth.v1alpha1.BeaconNodeValidator/GetDuties";
const GET_ATTESTATION_DATA: &str = "/ethereum.eth.v1alpha1.BeaconNodeValidator/GetAttestationData";
const PROPOSE_ATTESTATION: &str = "/ethereum.eth.v1alpha1.BeaconNodeValidator/ProposeAttestation";
const SUBMIT_AGGREGATE: &str =
    "/ethereum.eth.v1alpha1.BeaconNodeValidator/SubmitSignedAggregateSelectionProof";
const GET_BLOCK: &str = "/ethereum.eth.v1alpha1.BeaconNodeValidator/GetBlock";
const PROPOSE_BLOCK: &str = "/ethereum.eth.v1alpha1.BeaconNodeValidator/ProposeBlock";
const PROPOSE_EXIT: &str = "/ethereum.eth.v1alpha1.BeaconNodeValidator/ProposeExit";
const SUBSCRIBE_COMMITTEE_SUBNETS: &str =
    "/ethereum.eth.v1alpha1.BeaconNodeValidator/SubscribeCommitteeSubnets";

/// Pause before reopening the chain head stream after it failed.
const STREAM_RETRY_DELAY: Duration = Duration::from_secs(1);

fn not_found(message: String) -> ClientError {
    ClientError::BackendRejected {
        status: 404,
        message,
    }
}

#[derive(Clone)]
pub struct PrysmRpc {
    channel: Channel,
    constants: Arc<ChainConstants>,
    beacon_config: Arc<OnceCell<HashMap<String, String>>>,
    events: HeadEventDistributor,
    cancel: CancellationToken,
    span: Span,
}

impl PrysmRpc {
    /// The channel connects lazily; an unreachable node surfaces on the first call.
    pub fn new(config: &Config, cancel: CancellationToken) -> Result<Self> {
        let span = adapter_span(Backend::Prysm, &config.address);
        let channel = Endpoint::from_shared(config.address.clone())?
            .timeout(config.request_timeout())
            .connect_lazy();
        Ok(Self {
            channel,
            constants: Arc::new(ChainConstants::default()),
            beacon_config: Arc::new(OnceCell::new()),
            events: HeadEventDistributor::new(cancel.clone(), span.clone()),
            cancel,
            span,
        })
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    async fn unary<Req, Resp>(&self, path: &'static str, message: Req) -> Result<Resp>
    where
        Req: prost::Message + Send + Sync + 'static,
        Resp: prost::Message + Default + Send + Sync + 'static,
    {
        let mut grpc = Grpc::new(self.channel.clone());
        let call = async move {
            grpc.ready().await?;
            let response = grpc
                .unary(
                    Request::new(message),
                    PathAndQuery::from_static(path),
                    ProstCodec::default(),
                )
                .await?;
            Ok::<_, ClientError>(response.into_inner())
        };
        debug!(path, "grpc call");
        cancellable(&self.cancel, call.instrument(self.span.clone())).await?
    }

    async fn stream_chain_head(&self) -> Result<Streaming<proto::ChainHead>> {
        let mut grpc = Grpc::new(self.channel.clone());
        let call = async move {
            grpc.ready().await?;
            let response = grpc
                .server_streaming(
                    Request::new(proto::Empty {}),
                    PathAndQuery::from_static(STREAM_CHAIN_HEAD),
                    ProstCodec::default(),
                )
                .await?;
            Ok::<_, ClientError>(response.into_inner())
        };
        cancellable(&self.cancel, call.instrument(self.span.clone())).await?
    }

    async fn beacon_config(&self) -> Result<&HashMap<String, String>> {
        self.beacon_config
            .get_or_try_init(|| async {
                let config: proto::BeaconConfig =
                    self.unary(GET_BEACON_CONFIG, proto::Empty {}).await?;
                Ok::<_, ClientError>(config.config)
            })
            .await
    }

    async fn chain_head_message(&self) -> Result<proto::ChainHead> {
        self.unary(GET_CHAIN_HEAD, proto::Empty {}).await
    }

    async fn first_block(&self, filter: BlockFilter) -> Result<Option<proto::BeaconBlockContainer>> {
        let response: proto::ListBlocksResponse = self
            .unary(
                LIST_BLOCKS,
                proto::ListBlocksRequest {
                    query_filter: Some(filter),
                    page_size: 1,
                    page_token: String::new(),
                },
            )
            .await?;
        Ok(response.block_containers.into_iter().next())
    }

    async fn block_at(&self, filter: BlockFilter) -> Result<Option<proto::BeaconBlock>> {
        Ok(self
            .first_block(filter)
            .await?
            .and_then(|container| container.block)
            .and_then(|signed| signed.block))
    }

    async fn state_root_of_block(&self, block_root: Root) -> Result<Root> {
        let block = self
            .block_at(BlockFilter::Root(block_root.as_bytes().to_vec()))
            .await?
            .ok_or_else(|| not_found(format!("unknown block root {block_root}")))?;
        Ok(Root::try_from(block.state_root.as_slice())?)
    }

    async fn head_update(&self, head: &proto::ChainHead) -> Result<HeadUpdate> {
        let block_root = Root::try_from(head.head_block_root.as_slice())?;
        Ok(HeadUpdate {
            slot: head.head_slot,
            block_root,
            state_root: self.state_root_of_block(block_root).await?,
        })
    }

    async fn committees(&self, epoch: Epoch) -> Result<proto::BeaconCommittees> {
        self.unary(
            LIST_BEACON_COMMITTEES,
            proto::ListCommitteesRequest {
                query_filter: Some(EpochFilter::at(epoch)),
            },
        )
        .await
    }

    async fn list_validators(
        &self,
        epoch: Epoch,
        indices: &[ValidatorIndex],
    ) -> Result<Vec<proto::ValidatorContainer>> {
        let mut validators = vec![];
        let mut page_token = String::new();
        loop {
            let page: proto::Validators = self
                .unary(
                    LIST_VALIDATORS,
                    proto::ListValidatorsRequest {
                        query_filter: Some(EpochFilter::at(epoch)),
                        active: false,
                        page_size: MAX_PAGE_SIZE,
                        page_token,
                        public_keys: vec![],
                        indices: indices.to_vec(),
                    },
                )
                .await?;
            validators.extend(page.validator_list);
            if page.next_page_token.is_empty() {
                return Ok(validators);
            }
            page_token = page.next_page_token;
        }
    }

    async fn list_balances(
        &self,
        epoch: Epoch,
        indices: &[ValidatorIndex],
    ) -> Result<HashMap<ValidatorIndex, Gwei>> {
        let mut balances = HashMap::new();
        let mut page_token = String::new();
        loop {
            let page: proto::ValidatorBalances = self
                .unary(
                    LIST_VALIDATOR_BALANCES,
                    proto::ListValidatorBalancesRequest {
                        query_filter: Some(EpochFilter::at(epoch)),
                        public_keys: vec![],
                        indices: indices.to_vec(),
                        page_size: MAX_PAGE_SIZE,
                        page_token,
                    },
                )
                .await?;
            balances.extend(
                page.balances
                    .into_iter()
                    .map(|balance| (balance.index, balance.balance)),
            );
            if page.next_page_token.is_empty() {
                return Ok(balances);
            }
            page_token = page.next_page_token;
        }
    }

    /// Duties are keyed by public key here; indices are translated through the head state.
    async fn duties(&self, epoch: Epoch, indices: &[ValidatorIndex]) -> Result<Vec<proto::Duty>> {
        let head_epoch = self.epoch_from_state_id(StateId::Head).await?;
        let public_keys = self
            .list_validators(head_epoch, indices)
            .await?
            .into_iter()
            .filter_map(|container| container.validator)
            .map(|validator| validator.public_key)
            .collect();
        let response: proto::DutiesResponse = self
            .unary(GET_DUTIES, proto::DutiesRequest { epoch, public_keys })
            .await?;
        Ok(response.current_epoch_duties)
    }

    fn unsupported(operation: &'static str) -> ClientError {
        ClientError::Unsupported {
            backend: Backend::Prysm.name(),
            operation,
        }
    }
}

/// Chain head pushes from `StreamChainHead`, reopened after failures.
pub struct PrysmHeadSource {
    client: PrysmRpc,
    stream: Option<Streaming<proto::ChainHead>>,
    failed: bool,
}

impl PrysmHeadSource {
    pub fn new(client: PrysmRpc) -> Self {
        Self {
            client,
            stream: None,
            failed: false,
        }
    }
}

#[async_trait]
impl HeadSource for PrysmHeadSource {
    /// Never exhausted: a stream the server closes is reopened like a failed one.
    async fn next_head(&mut self) -> Result<Option<HeadUpdate>> {
        loop {
            if self.stream.is_none() {
                if self.failed {
                    tokio::time::sleep(STREAM_RETRY_DELAY).await;
                }
                self.failed = true;
                let stream = self.client.stream_chain_head().await?;
                self.stream = Some(stream);
                self.failed = false;
            }
            let Some(stream) = self.stream.as_mut() else {
                continue;
            };
            match stream.message().await {
                Ok(Some(head)) => return self.client.head_update(&head).await.map(Some),
                Ok(None) => {
                    debug!("chain head stream closed by the node");
                    self.stream = None;
                    self.failed = true;
                }
                Err(status) => {
                    warn!(%status, "chain head stream failed");
                    self.stream = None;
                    self.failed = true;
                    return Err(status.into());
                }
            }
        }
    }
}

#[async_trait]
impl NodeProvider for PrysmRpc {
    fn backend(&self) -> Backend {
        Backend::Prysm
    }

    async fn node_version(&self) -> Result<String> {
        let version: proto::Version = self.unary(GET_VERSION, proto::Empty {}).await?;
        Ok(version.version)
    }

    /// Prysm only reports a syncing flag; the distance is measured against the wall-clock slot.
    async fn sync_state(&self) -> Result<SyncState> {
        let status: proto::SyncStatus = self.unary(GET_SYNC_STATUS, proto::Empty {}).await?;
        let head = self.chain_head_message().await?;
        let genesis = self.genesis().await?;
        let seconds_per_slot = convert::config_u64(self.beacon_config().await?, "SecondsPerSlot")?
            .filter(|&seconds| seconds > 0);
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or_default();
        let current_slot = seconds_per_slot
            .map(|seconds| now.saturating_sub(genesis.genesis_time) / seconds)
            .unwrap_or(head.head_slot);
        Ok(SyncState {
            head_slot: head.head_slot,
            sync_distance: current_slot.saturating_sub(head.head_slot),
            is_syncing: status.syncing,
        })
    }
}

#[async_trait]
impl ChainConstantsProvider for PrysmRpc {
    async fn genesis(&self) -> Result<Genesis> {
        self.constants
            .genesis(|| async {
                let genesis: proto::Genesis = self.unary(GET_GENESIS, proto::Empty {}).await?;
                let seconds = genesis.genesis_time.map(|time| time.seconds).unwrap_or_default();
                let genesis_fork_version =
                    convert::config_version(self.beacon_config().await?, "GenesisForkVersion")?
                        .ok_or(ClientError::NoForkSchedule)?;
                Ok::<_, ClientError>(Genesis {
                    genesis_time: u64::try_from(seconds).map_err(|err| {
                        ClientError::decoding("prysm genesis time", err)
                    })?,
                    genesis_validators_root: Root::try_from(
                        genesis.genesis_validators_root.as_slice(),
                    )?,
                    genesis_fork_version,
                })
            })
            .await
    }

    async fn slots_per_epoch(&self) -> Result<u64> {
        self.constants
            .slots_per_epoch(|| async {
                convert::config_u64(self.beacon_config().await?, "SlotsPerEpoch")?.ok_or_else(
                    || ClientError::decoding("beacon config", "missing SlotsPerEpoch"),
                )
            })
            .await
    }

    async fn far_future_epoch(&self) -> Result<Epoch> {
        self.constants
            .far_future_epoch(|| async {
                let epoch = convert::config_u64(self.beacon_config().await?, "FarFutureEpoch")?;
                Ok::<_, ClientError>(epoch.unwrap_or(FAR_FUTURE_EPOCH))
            })
            .await
    }

    async fn fork_schedule(&self) -> Result<Vec<Fork>> {
        self.constants
            .fork_schedule(|| async {
                let far_future_epoch = self.far_future_epoch().await?;
                convert::fork_schedule(self.beacon_config().await?, far_future_epoch)
            })
            .await
    }
}

#[async_trait]
impl ChainHeadProvider for PrysmRpc {
    async fn chain_head(&self) -> Result<ChainHead> {
        let head = self.chain_head_message().await?;
        let block_root = Root::try_from(head.head_block_root.as_slice())?;
        let state_root = self.state_root_of_block(block_root).await?;
        convert::chain_head(&head, state_root)
    }

    async fn slot_for_block_root(&self, root: Root) -> Result<Slot> {
        self.block_at(BlockFilter::Root(root.as_bytes().to_vec()))
            .await?
            .map(|block| block.slot)
            .ok_or_else(|| not_found(format!("unknown block root {root}")))
    }
}

#[async_trait]
impl StateProvider for PrysmRpc {
    async fn state_root(&self, state_id: StateId) -> Result<Root> {
        let slot = self.slot_from_state_id(state_id).await?;
        let block = self
            .block_at(BlockFilter::Slot(slot))
            .await?
            .ok_or_else(|| not_found(format!("no block at slot {slot}")))?;
        Ok(Root::try_from(block.state_root.as_slice())?)
    }

    async fn fork(&self, state_id: StateId) -> Result<Fork> {
        let epoch = self.epoch_from_state_id(state_id).await?;
        let schedule = self.fork_schedule().await?;
        fork_at_epoch(&schedule, epoch)
            .copied()
            .ok_or(ClientError::NoForkSchedule)
    }

    /// Only the head's checkpoints are exposed over gRPC.
    async fn finality(&self, state_id: StateId) -> Result<Finality> {
        if state_id != StateId::Head {
            return Err(Self::unsupported("finality"));
        }
        let head = self.chain_head_message().await?;
        let checkpoint = |epoch, root: &[u8]| -> Result<Checkpoint> {
            Ok(Checkpoint {
                epoch,
                root: Root::try_from(root)?,
            })
        };
        Ok(Finality {
            previous_justified: checkpoint(
                head.previous_justified_epoch,
                &head.previous_justified_block_root,
            )?,
            current_justified: checkpoint(head.justified_epoch, &head.justified_block_root)?,
            finalized: checkpoint(head.finalized_epoch, &head.finalized_block_root)?,
        })
    }

    async fn beacon_committees(&self, state_id: StateId) -> Result<Vec<BeaconCommittee>> {
        let epoch = self.epoch_from_state_id(state_id).await?;
        Ok(convert::beacon_committees(&self.committees(epoch).await?))
    }

    /// Prysm reports no status; it is derived from the validator's epochs.
    async fn validators(
        &self,
        state_id: StateId,
        indices: &[ValidatorIndex],
    ) -> Result<HashMap<ValidatorIndex, Validator>> {
        let epoch = self.epoch_from_state_id(state_id).await?;
        let far_future_epoch = self.far_future_epoch().await?;
        let containers = self.list_validators(epoch, indices).await?;
        let balances = self.list_balances(epoch, indices).await?;

        let mut validators = HashMap::with_capacity(containers.len());
        for container in containers {
            let Some(validator) = container.validator else {
                continue;
            };
            let details = convert::validator_details(&validator)?;
            validators.insert(
                container.index,
                Validator {
                    index: container.index,
                    balance: balances.get(&container.index).copied().unwrap_or_default(),
                    status: ValidatorStatus::derive(&details, epoch, far_future_epoch),
                    validator: details,
                },
            );
        }
        Ok(validators)
    }

    async fn validator_balances(
        &self,
        state_id: StateId,
        indices: &[ValidatorIndex],
    ) -> Result<HashMap<ValidatorIndex, Gwei>> {
        let epoch = self.epoch_from_state_id(state_id).await?;
        self.list_balances(epoch, indices).await
    }

    async fn signed_beacon_block_by_slot(&self, slot: Slot) -> Result<Option<SignedBeaconBlock>> {
        let Some(signed) = self
            .first_block(BlockFilter::Slot(slot))
            .await?
            .and_then(|container| container.block)
        else {
            return Ok(None);
        };
        let block = SignedBeaconBlock::try_from(signed)?;
        Ok((block.slot() >= slot).then_some(block))
    }
}

#[async_trait]
impl DutiesProvider for PrysmRpc {
    async fn attester_duties(
        &self,
        epoch: Epoch,
        indices: &[ValidatorIndex],
    ) -> Result<Vec<AttesterDuty>> {
        let duties = self.duties(epoch, indices).await?;
        let committees_at_slot = convert::committees_per_slot(&self.committees(epoch).await?);
        let mut converted = Vec::with_capacity(duties.len());
        for duty in &duties {
            if let Some(duty) = convert::attester_duty(duty, &committees_at_slot)? {
                converted.push(duty);
            }
        }
        Ok(converted)
    }

    async fn proposer_duties(
        &self,
        epoch: Epoch,
        indices: &[ValidatorIndex],
    ) -> Result<Vec<ProposerDuty>> {
        let mut converted = vec![];
        for duty in self.duties(epoch, indices).await? {
            converted.extend(convert::proposer_duties(&duty)?);
        }
        Ok(converted)
    }
}

#[async_trait]
impl ValidatorApi for PrysmRpc {
    async fn attestation_data(
        &self,
        slot: Slot,
        committee_index: CommitteeIndex,
    ) -> Result<AttestationData> {
        let data: proto::AttestationData = self
            .unary(
                GET_ATTESTATION_DATA,
                proto::AttestationDataRequest {
                    slot,
                    committee_index,
                },
            )
            .await?;
        data.try_into()
    }

    async fn aggregate_attestation(
        &self,
        _slot: Slot,
        _attestation_data_root: Root,
    ) -> Result<Attestation> {
        Err(Self::unsupported("aggregate_attestation"))
    }

    async fn beacon_block_proposal(
        &self,
        slot: Slot,
        randao_reveal: Signature,
        graffiti: Root,
    ) -> Result<BeaconBlock> {
        let block: proto::BeaconBlock = self
            .unary(
                GET_BLOCK,
                proto::BlockRequest {
                    slot,
                    randao_reveal: randao_reveal.as_bytes().to_vec(),
                    graffiti: graffiti.as_bytes().to_vec(),
                },
            )
            .await?;
        block.try_into()
    }
}

#[async_trait]
impl Submitter for PrysmRpc {
    async fn submit_attestation(&self, attestation: &Attestation) -> Result<()> {
        let _: proto::AttestResponse = self
            .unary(PROPOSE_ATTESTATION, proto::Attestation::from(attestation))
            .await?;
        Ok(())
    }

    async fn submit_aggregate_attestations(
        &self,
        aggregates: &[SignedAggregateAndProof],
    ) -> Result<()> {
        for aggregate in aggregates {
            let _: proto::SignedAggregateSubmitResponse = self
                .unary(
                    SUBMIT_AGGREGATE,
                    proto::SignedAggregateSubmitRequest {
                        signed_aggregate_and_proof: Some(aggregate.into()),
                    },
                )
                .await?;
        }
        Ok(())
    }

    async fn submit_beacon_block(&self, block: &SignedBeaconBlock) -> Result<()> {
        let _: proto::ProposeResponse = self
            .unary(PROPOSE_BLOCK, proto::SignedBeaconBlock::from(block))
            .await?;
        Ok(())
    }

    async fn submit_voluntary_exit(&self, exit: &SignedVoluntaryExit) -> Result<()> {
        let _: proto::ProposeExitResponse = self
            .unary(PROPOSE_EXIT, proto::SignedVoluntaryExit::from(exit))
            .await?;
        Ok(())
    }

    async fn submit_beacon_committee_subscriptions(
        &self,
        subscriptions: &[BeaconCommitteeSubscription],
    ) -> Result<()> {
        let request = proto::CommitteeSubnetsSubscribeRequest {
            slots: subscriptions.iter().map(|s| s.slot).collect(),
            committee_ids: subscriptions.iter().map(|s| s.committee_index).collect(),
            is_aggregator: subscriptions.iter().map(|s| s.is_aggregator).collect(),
        };
        let _: proto::Empty = self.unary(SUBSCRIBE_COMMITTEE_SUBNETS, request).await?;
        Ok(())
    }
}

#[async_trait]
impl HeadEventsProvider for PrysmRpc {
    async fn on_head(&self, handler: Arc<dyn HeadEventHandler>) -> Result<()> {
        let slots_per_epoch = self.slots_per_epoch().await?;
        self.events.register(handler, slots_per_epoch, || {
            Ok(PrysmHeadSource::new(self.clone()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unsupported_operations_name_the_backend() {
        let client = PrysmRpc::new(
            &Config::new("http://127.0.0.1:4000", Backend::Prysm),
            CancellationToken::new(),
        )
        .unwrap();
        let err = client
            .aggregate_attestation(1, Root::zero())
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "aggregate_attestation is not supported by the prysm backend"
        );
        assert!(matches!(
            client.finality(StateId::Finalized).await,
            Err(ClientError::Unsupported { .. })
        ));
    }

    #[tokio::test]
    async fn cancelled_client_fails_fast() {
        let cancel = CancellationToken::new();
        let client = PrysmRpc::new(
            &Config::new("http://127.0.0.1:4000", Backend::Prysm),
            cancel.clone(),
        )
        .unwrap();
        cancel.cancel();
        assert!(client.node_version().await.unwrap_err().is_cancelled());
    }
}
