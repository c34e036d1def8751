//! Endpoints of the standard beacon node API, shared by the backends that serve them.

use std::collections::{HashMap, HashSet};

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{
    http_client::ClientWithBaseUrl,
    rpc_types::{
        BalanceResponse, DataResponse, HeaderResponse, RootResponse, VersionResponse,
        VersionedDataResponse,
    },
};
use crate::{
    errors::{ClientError, Result},
    types::{
        quoted, Attestation, AttestationData, AttesterDuty, BeaconBlock, BeaconCommittee,
        BeaconCommitteeSubscription, CommitteeIndex, Epoch, Finality, Fork, Genesis, Gwei,
        ProposerDuty, Root, Signature, SignedAggregateAndProof, SignedBeaconBlock,
        SignedVoluntaryExit, Slot, StateId, SyncState, Validator, ValidatorIndex,
        FAR_FUTURE_EPOCH,
    },
    utils::join_indices,
};

async fn data<T: DeserializeOwned>(http: &ClientWithBaseUrl, endpoint: &str) -> Result<T> {
    Ok(http.get::<DataResponse<T>>(endpoint).await?.data)
}

pub async fn node_version(http: &ClientWithBaseUrl) -> Result<String> {
    Ok(data::<VersionResponse>(http, "/eth/v1/node/version")
        .await?
        .version)
}

pub async fn sync_state(http: &ClientWithBaseUrl) -> Result<SyncState> {
    data(http, "/eth/v1/node/syncing").await
}

pub async fn genesis(http: &ClientWithBaseUrl) -> Result<Genesis> {
    data(http, "/eth/v1/beacon/genesis").await
}

pub async fn spec(http: &ClientWithBaseUrl) -> Result<HashMap<String, Value>> {
    data(http, "/eth/v1/config/spec").await
}

/// Reads a decimal constant from the spec map, `None` when the node does not publish it.
pub fn spec_u64(spec: &HashMap<String, Value>, key: &str) -> Result<Option<u64>> {
    let path = format!("/eth/v1/config/spec: {key}");
    match spec.get(key) {
        None => Ok(None),
        Some(Value::String(text)) => quoted::parse_u64(text)
            .map(Some)
            .map_err(|err| ClientError::decoding(path, err)),
        Some(other) => Err(ClientError::decoding(
            path,
            format!("expected a quoted integer, got {other}"),
        )),
    }
}

pub async fn slots_per_epoch(http: &ClientWithBaseUrl) -> Result<u64> {
    let spec = spec(http).await?;
    spec_u64(&spec, "SLOTS_PER_EPOCH")?
        .ok_or_else(|| ClientError::decoding("/eth/v1/config/spec", "missing SLOTS_PER_EPOCH"))
}

pub async fn far_future_epoch(http: &ClientWithBaseUrl) -> Result<Epoch> {
    let spec = spec(http).await?;
    Ok(spec_u64(&spec, "FAR_FUTURE_EPOCH")?.unwrap_or(FAR_FUTURE_EPOCH))
}

pub async fn fork_schedule(http: &ClientWithBaseUrl) -> Result<Vec<Fork>> {
    data(http, "/eth/v1/config/fork_schedule").await
}

pub async fn header(http: &ClientWithBaseUrl, block_id: &str) -> Result<HeaderResponse> {
    data(http, &format!("/eth/v1/beacon/headers/{block_id}")).await
}

pub async fn state_root(http: &ClientWithBaseUrl, state_id: StateId) -> Result<Root> {
    Ok(
        data::<RootResponse>(http, &format!("/eth/v1/beacon/states/{state_id}/root"))
            .await?
            .root,
    )
}

pub async fn fork(http: &ClientWithBaseUrl, state_id: StateId) -> Result<Fork> {
    data(http, &format!("/eth/v1/beacon/states/{state_id}/fork")).await
}

pub async fn finality(http: &ClientWithBaseUrl, state_id: StateId) -> Result<Finality> {
    data(
        http,
        &format!("/eth/v1/beacon/states/{state_id}/finality_checkpoints"),
    )
    .await
}

pub async fn beacon_committees(
    http: &ClientWithBaseUrl,
    state_id: StateId,
) -> Result<Vec<BeaconCommittee>> {
    data(http, &format!("/eth/v1/beacon/states/{state_id}/committees")).await
}

fn with_id_filter(endpoint: String, indices: &[ValidatorIndex]) -> String {
    if indices.is_empty() {
        endpoint
    } else {
        format!("{endpoint}?id={}", join_indices(indices))
    }
}

pub async fn validators(
    http: &ClientWithBaseUrl,
    state_id: StateId,
    indices: &[ValidatorIndex],
) -> Result<HashMap<ValidatorIndex, Validator>> {
    let endpoint = with_id_filter(
        format!("/eth/v1/beacon/states/{state_id}/validators"),
        indices,
    );
    let validators: Vec<Validator> = data(http, &endpoint).await?;
    Ok(validators
        .into_iter()
        .map(|validator| (validator.index, validator))
        .collect())
}

pub async fn validator_balances(
    http: &ClientWithBaseUrl,
    state_id: StateId,
    indices: &[ValidatorIndex],
) -> Result<HashMap<ValidatorIndex, Gwei>> {
    let endpoint = with_id_filter(
        format!("/eth/v1/beacon/states/{state_id}/validator_balances"),
        indices,
    );
    let balances: Vec<BalanceResponse> = data(http, &endpoint).await?;
    Ok(balances
        .into_iter()
        .map(|balance| (balance.index, balance.balance))
        .collect())
}

/// `None` for a missing block, or for one from an earlier slot than requested.
pub async fn signed_beacon_block_by_slot(
    http: &ClientWithBaseUrl,
    slot: Slot,
) -> Result<Option<SignedBeaconBlock>> {
    let block = http
        .get_optional::<VersionedDataResponse<SignedBeaconBlock>>(&format!(
            "/eth/v2/beacon/blocks/{slot}"
        ))
        .await?
        .map(|response| response.data);
    Ok(block.filter(|block| block.slot() >= slot))
}

/// An empty `indices` slice asks for the duties of every validator at the head state.
pub async fn attester_duties(
    http: &ClientWithBaseUrl,
    epoch: Epoch,
    indices: &[ValidatorIndex],
) -> Result<Vec<AttesterDuty>> {
    let mut all;
    let indices = if indices.is_empty() {
        all = validators(http, StateId::Head, &[])
            .await?
            .into_keys()
            .collect::<Vec<_>>();
        all.sort_unstable();
        &all
    } else {
        indices
    };
    let body: Vec<String> = indices.iter().map(u64::to_string).collect();
    Ok(http
        .post::<_, DataResponse<Vec<AttesterDuty>>>(
            &format!("/eth/v1/validator/duties/attester/{epoch}"),
            &body,
        )
        .await?
        .data)
}

/// The endpoint always answers for every proposer of the epoch; filtering is client-side.
pub async fn proposer_duties(
    http: &ClientWithBaseUrl,
    epoch: Epoch,
    indices: &[ValidatorIndex],
) -> Result<Vec<ProposerDuty>> {
    let duties: Vec<ProposerDuty> =
        data(http, &format!("/eth/v1/validator/duties/proposer/{epoch}")).await?;
    if indices.is_empty() {
        return Ok(duties);
    }
    let wanted: HashSet<_> = indices.iter().copied().collect();
    Ok(duties
        .into_iter()
        .filter(|duty| wanted.contains(&duty.validator_index))
        .collect())
}

pub async fn attestation_data(
    http: &ClientWithBaseUrl,
    slot: Slot,
    committee_index: CommitteeIndex,
) -> Result<AttestationData> {
    data(
        http,
        &format!("/eth/v1/validator/attestation_data?slot={slot}&committee_index={committee_index}"),
    )
    .await
}

pub async fn aggregate_attestation(
    http: &ClientWithBaseUrl,
    slot: Slot,
    attestation_data_root: Root,
) -> Result<Attestation> {
    data(
        http,
        &format!(
            "/eth/v1/validator/aggregate_attestation?attestation_data_root={attestation_data_root}&slot={slot}"
        ),
    )
    .await
}

pub async fn beacon_block_proposal(
    http: &ClientWithBaseUrl,
    slot: Slot,
    randao_reveal: Signature,
    graffiti: Root,
) -> Result<BeaconBlock> {
    data(
        http,
        &format!("/eth/v1/validator/blocks/{slot}?randao_reveal={randao_reveal}&graffiti={graffiti}"),
    )
    .await
}

pub async fn submit_attestations(
    http: &ClientWithBaseUrl,
    attestations: &[Attestation],
) -> Result<()> {
    http.post_empty("/eth/v1/beacon/pool/attestations", attestations)
        .await
}

pub async fn submit_aggregate_attestations(
    http: &ClientWithBaseUrl,
    aggregates: &[SignedAggregateAndProof],
) -> Result<()> {
    http.post_empty("/eth/v1/validator/aggregate_and_proofs", aggregates)
        .await
}

pub async fn submit_beacon_block(http: &ClientWithBaseUrl, block: &SignedBeaconBlock) -> Result<()> {
    http.post_empty("/eth/v1/beacon/blocks", block).await
}

pub async fn submit_voluntary_exit(
    http: &ClientWithBaseUrl,
    exit: &SignedVoluntaryExit,
) -> Result<()> {
    http.post_empty("/eth/v1/beacon/pool/voluntary_exits", exit)
        .await
}

pub async fn submit_beacon_committee_subscriptions(
    http: &ClientWithBaseUrl,
    subscriptions: &[BeaconCommitteeSubscription],
) -> Result<()> {
    http.post_empty(
        "/eth/v1/validator/beacon_committee_subscriptions",
        subscriptions,
    )
    .await
}
