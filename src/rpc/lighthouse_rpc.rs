//! Adapter for Lighthouse's legacy HTTP API. Lighthouse writes integers unquoted, so the
//! transport runs in the loose dialect, and it expects slots where other backends take state
//! identifiers.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, Span};

use super::{
    adapter_span,
    beacon_api::spec_u64,
    http_client::{ClientWithBaseUrl, Dialect},
    http_transport,
    rpc_types::{
        LegacyBlockResponse, LighthouseCommittee, LighthouseDutiesRequest, LighthouseDuty,
        LighthouseStateResponse, LighthouseSubscription, LighthouseSyncing, LighthouseValidator,
    },
};
use crate::{
    api::{
        cache::ChainConstants,
        events::{HeadEventDistributor, PollingHeadSource},
        submission::submit_with_subnet_discovery,
        ChainConstantsProvider, ChainHeadProvider, DutiesProvider, HeadEventHandler,
        HeadEventsProvider, NodeProvider, StateProvider, Submitter, ValidatorApi,
    },
    config::{Backend, Config},
    errors::{ClientError, Result},
    types::{
        quoted, Attestation, AttestationData, AttesterDuty, BeaconBlock, BeaconCommittee,
        BeaconCommitteeSubscription, ChainHead, CommitteeIndex, Epoch, Finality, Fork, Genesis,
        Gwei, ProposerDuty, Root, Signature, SignedAggregateAndProof, SignedBeaconBlock,
        SignedVoluntaryExit, Slot, StateId, SyncState, Validator, ValidatorIndex,
        ValidatorStatus, Version, FAR_FUTURE_EPOCH,
    },
};

const SPEC_ENDPOINT: &str = "/spec";

#[derive(Clone)]
pub struct LighthouseRpc {
    http: ClientWithBaseUrl,
    constants: Arc<ChainConstants>,
    events: HeadEventDistributor,
    poll_interval: Duration,
}

impl LighthouseRpc {
    pub fn new(config: &Config, cancel: CancellationToken) -> Result<Self> {
        let span = adapter_span(Backend::Lighthouse, &config.address);
        let http = http_transport(config, Dialect::Loose, cancel.clone(), span.clone())?;
        Ok(Self {
            http,
            constants: Arc::new(ChainConstants::default()),
            events: HeadEventDistributor::new(cancel, span),
            poll_interval: config.head_poll_interval(),
        })
    }

    pub fn span(&self) -> &Span {
        self.http.span()
    }

    async fn spec(&self) -> Result<HashMap<String, Value>> {
        self.http.get(SPEC_ENDPOINT).await
    }

    async fn block(&self, query: &str) -> Result<Option<LegacyBlockResponse>> {
        self.http
            .get_optional(&format!("/beacon/block?{query}"))
            .await
    }

    async fn state(&self, state_id: StateId) -> Result<LighthouseStateResponse> {
        let slot = self.slot_from_state_id(state_id).await?;
        self.http.get(&format!("/beacon/state?slot={slot}")).await
    }

    async fn committees(&self, epoch: Epoch) -> Result<Vec<LighthouseCommittee>> {
        self.http
            .get(&format!("/beacon/committees?epoch={epoch}"))
            .await
    }

    /// Duties for `indices`; Lighthouse identifies validators by public key here, so the indices
    /// are first translated through the head state's validator set.
    async fn duties(&self, epoch: Epoch, indices: &[ValidatorIndex]) -> Result<Vec<LighthouseDuty>> {
        if indices.is_empty() {
            return self
                .http
                .get(&format!("/validator/duties/all?epoch={epoch}"))
                .await;
        }
        let validators = self.validators(StateId::Head, indices).await?;
        let pubkeys = indices
            .iter()
            .filter_map(|index| validators.get(index))
            .map(|validator| validator.validator.pubkey)
            .collect();
        self.http
            .post("/validator/duties", &LighthouseDutiesRequest { epoch, pubkeys })
            .await
    }
}

/// A `0x`-hex fork version constant from the spec map.
fn spec_version(spec: &HashMap<String, Value>, key: &str) -> Result<Version> {
    match spec.get(key) {
        Some(Value::String(text)) => Ok(text.parse()?),
        _ => Err(ClientError::decoding(
            format!("{SPEC_ENDPOINT}: {key}"),
            "missing fork version",
        )),
    }
}

fn committee_lengths(committees: &[LighthouseCommittee]) -> HashMap<(Slot, u64), u64> {
    committees
        .iter()
        .map(|committee| {
            (
                (committee.slot, committee.index),
                committee.committee.len() as u64,
            )
        })
        .collect()
}

/// Duties of inactive validators carry no attestation assignment and are skipped.
fn attester_duty(duty: &LighthouseDuty, lengths: &HashMap<(Slot, u64), u64>) -> Option<AttesterDuty> {
    let slot = duty.attestation_slot?;
    let committee_index = duty.attestation_committee_index?;
    Some(AttesterDuty {
        pubkey: duty.validator_pubkey,
        validator_index: duty.validator_index?,
        committee_index,
        committee_length: lengths
            .get(&(slot, committee_index))
            .copied()
            .unwrap_or_default(),
        committees_at_slot: duty.committee_count_at_slot.unwrap_or_default(),
        validator_committee_index: duty.attestation_committee_position?,
        slot,
    })
}

fn proposals(duty: &LighthouseDuty) -> Vec<ProposerDuty> {
    let Some(validator_index) = duty.validator_index else {
        return vec![];
    };
    duty.block_proposal_slots
        .iter()
        .map(|&slot| ProposerDuty {
            pubkey: duty.validator_pubkey,
            validator_index,
            slot,
        })
        .collect()
}

fn into_validator(
    entry: LighthouseValidator,
    epoch: Epoch,
    far_future_epoch: Epoch,
) -> Option<Validator> {
    let details = entry.validator?;
    Some(Validator {
        index: entry.validator_index?,
        balance: entry.balance.unwrap_or_default(),
        status: ValidatorStatus::derive(&details, epoch, far_future_epoch),
        validator: details,
    })
}

#[async_trait]
impl NodeProvider for LighthouseRpc {
    fn backend(&self) -> Backend {
        Backend::Lighthouse
    }

    async fn node_version(&self) -> Result<String> {
        self.http.get("/node/version").await
    }

    async fn sync_state(&self) -> Result<SyncState> {
        let syncing: LighthouseSyncing = self.http.get("/node/syncing").await?;
        let status = syncing.sync_status;
        Ok(SyncState {
            head_slot: status.current_slot,
            sync_distance: status.highest_slot.saturating_sub(status.current_slot),
            is_syncing: syncing.is_syncing,
        })
    }
}

#[async_trait]
impl ChainConstantsProvider for LighthouseRpc {
    async fn genesis(&self) -> Result<Genesis> {
        self.constants
            .genesis(|| async {
                let genesis_time: String = self.http.get("/beacon/genesis_time").await?;
                let genesis_validators_root: Root =
                    self.http.get("/beacon/genesis_validators_root").await?;
                let spec = self.spec().await?;
                Ok::<_, ClientError>(Genesis {
                    genesis_time: quoted::parse_u64(&genesis_time)?,
                    genesis_validators_root,
                    genesis_fork_version: spec_version(&spec, "genesis_fork_version")?,
                })
            })
            .await
    }

    async fn slots_per_epoch(&self) -> Result<u64> {
        self.constants
            .slots_per_epoch(|| async {
                spec_u64(&self.spec().await?, "slots_per_epoch")?.ok_or_else(|| {
                    ClientError::decoding(SPEC_ENDPOINT, "missing slots_per_epoch")
                })
            })
            .await
    }

    async fn far_future_epoch(&self) -> Result<Epoch> {
        self.constants
            .far_future_epoch(|| async {
                let far_future_epoch = spec_u64(&self.spec().await?, "far_future_epoch")?;
                Ok::<_, ClientError>(far_future_epoch.unwrap_or(FAR_FUTURE_EPOCH))
            })
            .await
    }

    /// Lighthouse only reports the fork it is currently on.
    async fn fork_schedule(&self) -> Result<Vec<Fork>> {
        self.constants
            .fork_schedule(|| async {
                let fork: Fork = self.http.get("/beacon/fork").await?;
                Ok::<_, ClientError>(vec![fork])
            })
            .await
    }
}

#[async_trait]
impl ChainHeadProvider for LighthouseRpc {
    async fn chain_head(&self) -> Result<ChainHead> {
        self.http.get("/beacon/head").await
    }

    async fn slot_for_block_root(&self, root: Root) -> Result<Slot> {
        match self.block(&format!("root={root}")).await? {
            Some(response) => Ok(response.beacon_block.slot()),
            None => Err(ClientError::BackendRejected {
                status: 404,
                message: format!("unknown block root {root}"),
            }),
        }
    }
}

#[async_trait]
impl StateProvider for LighthouseRpc {
    async fn state_root(&self, state_id: StateId) -> Result<Root> {
        let slot = self.slot_from_state_id(state_id).await?;
        self.http
            .get(&format!("/beacon/state_root?slot={slot}"))
            .await
    }

    async fn fork(&self, state_id: StateId) -> Result<Fork> {
        Ok(self.state(state_id).await?.beacon_state.fork)
    }

    async fn finality(&self, state_id: StateId) -> Result<Finality> {
        let state = self.state(state_id).await?.beacon_state;
        Ok(Finality {
            previous_justified: state.previous_justified_checkpoint,
            current_justified: state.current_justified_checkpoint,
            finalized: state.finalized_checkpoint,
        })
    }

    async fn beacon_committees(&self, state_id: StateId) -> Result<Vec<BeaconCommittee>> {
        let epoch = self.epoch_from_state_id(state_id).await?;
        Ok(self
            .committees(epoch)
            .await?
            .into_iter()
            .map(|committee| BeaconCommittee {
                index: committee.index,
                slot: committee.slot,
                validators: committee.committee,
            })
            .collect())
    }

    /// Lighthouse has no per-validator query and reports no status; the full set is fetched and
    /// filtered here, with status derived from the validator's epochs.
    async fn validators(
        &self,
        state_id: StateId,
        indices: &[ValidatorIndex],
    ) -> Result<HashMap<ValidatorIndex, Validator>> {
        // The validator set and the status epoch come from one resolved slot.
        let slot = self.slot_from_state_id(state_id).await?;
        let state_root = self.state_root(StateId::Slot(slot)).await?;
        let epoch = self.epoch_at_slot(slot).await?;
        let far_future_epoch = self.far_future_epoch().await?;
        let entries: Vec<LighthouseValidator> = self
            .http
            .get(&format!("/beacon/validators/all?state_root={state_root}"))
            .await?;
        debug!(
            total = entries.len(),
            requested = indices.len(),
            "filtering validator set"
        );

        let wanted: HashSet<_> = indices.iter().copied().collect();
        Ok(entries
            .into_iter()
            .filter_map(|entry| into_validator(entry, epoch, far_future_epoch))
            .filter(|validator| wanted.is_empty() || wanted.contains(&validator.index))
            .map(|validator| (validator.index, validator))
            .collect())
    }

    async fn validator_balances(
        &self,
        state_id: StateId,
        indices: &[ValidatorIndex],
    ) -> Result<HashMap<ValidatorIndex, Gwei>> {
        Ok(self
            .validators(state_id, indices)
            .await?
            .into_iter()
            .map(|(index, validator)| (index, validator.balance))
            .collect())
    }

    /// Lighthouse answers an empty slot with the latest earlier block.
    async fn signed_beacon_block_by_slot(&self, slot: Slot) -> Result<Option<SignedBeaconBlock>> {
        Ok(self
            .block(&format!("slot={slot}"))
            .await?
            .map(|response| response.beacon_block)
            .filter(|block| block.slot() >= slot))
    }
}

#[async_trait]
impl DutiesProvider for LighthouseRpc {
    async fn attester_duties(
        &self,
        epoch: Epoch,
        indices: &[ValidatorIndex],
    ) -> Result<Vec<AttesterDuty>> {
        let duties = self.duties(epoch, indices).await?;
        let lengths = committee_lengths(&self.committees(epoch).await?);
        Ok(duties
            .iter()
            .filter_map(|duty| attester_duty(duty, &lengths))
            .collect())
    }

    async fn proposer_duties(
        &self,
        epoch: Epoch,
        indices: &[ValidatorIndex],
    ) -> Result<Vec<ProposerDuty>> {
        Ok(self
            .duties(epoch, indices)
            .await?
            .iter()
            .flat_map(proposals)
            .collect())
    }
}

#[async_trait]
impl ValidatorApi for LighthouseRpc {
    async fn attestation_data(
        &self,
        slot: Slot,
        committee_index: CommitteeIndex,
    ) -> Result<AttestationData> {
        let unsigned: Attestation = self
            .http
            .get(&format!(
                "/validator/attestation?slot={slot}&committee_index={committee_index}"
            ))
            .await?;
        Ok(unsigned.data)
    }

    async fn aggregate_attestation(
        &self,
        slot: Slot,
        attestation_data_root: Root,
    ) -> Result<Attestation> {
        self.http
            .get(&format!(
                "/validator/aggregate_attestation?slot={slot}&attestation_data_root={attestation_data_root}"
            ))
            .await
    }

    async fn beacon_block_proposal(
        &self,
        slot: Slot,
        randao_reveal: Signature,
        graffiti: Root,
    ) -> Result<BeaconBlock> {
        self.http
            .get(&format!(
                "/validator/block?slot={slot}&randao_reveal={randao_reveal}&graffiti={graffiti}"
            ))
            .await
    }
}

#[async_trait]
impl Submitter for LighthouseRpc {
    /// Lighthouse takes `[attestation, subnet]` pairs and names the right subnet when it rejects
    /// a guess.
    async fn submit_attestation(&self, attestation: &Attestation) -> Result<()> {
        submit_with_subnet_discovery(|subnet| async move {
            self.http
                .post_empty("/validator/attestations", &[(attestation, subnet)])
                .await
        })
        .await
    }

    async fn submit_aggregate_attestations(
        &self,
        aggregates: &[SignedAggregateAndProof],
    ) -> Result<()> {
        self.http
            .post_empty("/validator/aggregate_and_proofs", aggregates)
            .await
    }

    async fn submit_beacon_block(&self, block: &SignedBeaconBlock) -> Result<()> {
        self.http.post_empty("/beacon/block", block).await
    }

    async fn submit_voluntary_exit(&self, exit: &SignedVoluntaryExit) -> Result<()> {
        self.http.post_empty("/beacon/voluntary_exit", exit).await
    }

    async fn submit_beacon_committee_subscriptions(
        &self,
        subscriptions: &[BeaconCommitteeSubscription],
    ) -> Result<()> {
        let subscriptions: Vec<_> = subscriptions
            .iter()
            .map(|subscription| LighthouseSubscription {
                validator_index: subscription.validator_index,
                attestation_committee_index: subscription.committee_index,
                slot: subscription.slot,
                committee_count_at_slot: subscription.committees_at_slot,
                is_aggregator: subscription.is_aggregator,
            })
            .collect();
        debug!(count = subscriptions.len(), "subscribing to beacon committees");
        self.http
            .post_empty("/validator/subscribe", &subscriptions)
            .await
    }
}

#[async_trait]
impl HeadEventsProvider for LighthouseRpc {
    /// Lighthouse has no event stream; head changes are found by polling.
    async fn on_head(&self, handler: Arc<dyn HeadEventHandler>) -> Result<()> {
        let slots_per_epoch = self.slots_per_epoch().await?;
        self.events.register(handler, slots_per_epoch, || {
            Ok(PollingHeadSource::new(self.clone(), self.poll_interval))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BlsPubKey;

    fn duty(index: Option<ValidatorIndex>, slot: Option<Slot>) -> LighthouseDuty {
        LighthouseDuty {
            validator_pubkey: BlsPubKey::new([7; 48]),
            validator_index: index,
            attestation_slot: slot,
            attestation_committee_index: slot.map(|_| 2),
            attestation_committee_position: slot.map(|_| 5),
            committee_count_at_slot: slot.map(|_| 4),
            block_proposal_slots: vec![65, 70],
        }
    }

    #[test]
    fn attester_duty_takes_committee_length() {
        let lengths = HashMap::from([((66, 2), 128)]);
        let converted = attester_duty(&duty(Some(9), Some(66)), &lengths).unwrap();
        assert_eq!(converted.validator_index, 9);
        assert_eq!(converted.slot, 66);
        assert_eq!(converted.committee_index, 2);
        assert_eq!(converted.committee_length, 128);
        assert_eq!(converted.committees_at_slot, 4);
        assert_eq!(converted.validator_committee_index, 5);
    }

    #[test]
    fn inactive_validators_have_no_attester_duty() {
        assert!(attester_duty(&duty(Some(9), None), &HashMap::new()).is_none());
        assert!(attester_duty(&duty(None, Some(66)), &HashMap::new()).is_none());
    }

    #[test]
    fn proposals_expand_slots() {
        let duties = proposals(&duty(Some(9), None));
        let slots: Vec<_> = duties.iter().map(|duty| duty.slot).collect();
        assert_eq!(slots, vec![65, 70]);
        assert!(duties.iter().all(|duty| duty.validator_index == 9));
        assert!(proposals(&duty(None, None)).is_empty());
    }
}
