//! Wire envelopes of the HTTP backends.

use serde::{Deserialize, Serialize};

use crate::types::{
    quoted::{quoted_u64, quoted_u64_opt, quoted_u64_vec},
    BeaconBlockHeader, BlsPubKey, Checkpoint, Fork, Gwei, Root, Signature, SignedBeaconBlock,
    Slot, ValidatorDetails, ValidatorIndex,
};

/// The `{"data": ...}` envelope of the standard API.
#[derive(Debug, Clone, Deserialize)]
pub struct DataResponse<T> {
    pub data: T,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VersionedDataResponse<T> {
    #[serde(default)]
    pub version: Option<String>,
    pub data: T,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VersionResponse {
    pub version: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RootResponse {
    pub root: Root,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SignedHeader {
    pub message: BeaconBlockHeader,
    pub signature: Signature,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct HeaderResponse {
    pub root: Root,
    #[serde(default)]
    pub canonical: bool,
    pub header: SignedHeader,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct BalanceResponse {
    #[serde(with = "quoted_u64")]
    pub index: ValidatorIndex,
    #[serde(with = "quoted_u64")]
    pub balance: Gwei,
}

/// Legacy `/beacon/block` answer.
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyBlockResponse {
    pub root: Root,
    pub beacon_block: SignedBeaconBlock,
}

/// Teku's legacy `/beacon/chainhead`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TekuChainHead {
    #[serde(with = "quoted_u64")]
    pub head_slot: Slot,
    pub head_block_root: Root,
    #[serde(with = "quoted_u64")]
    pub finalized_slot: Slot,
    pub finalized_block_root: Root,
    #[serde(with = "quoted_u64")]
    pub justified_slot: Slot,
    pub justified_block_root: Root,
}

/// Lighthouse's `/beacon/validators/all` entry.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LighthouseValidator {
    pub pubkey: BlsPubKey,
    #[serde(default, with = "quoted_u64_opt")]
    pub validator_index: Option<ValidatorIndex>,
    #[serde(default, with = "quoted_u64_opt")]
    pub balance: Option<Gwei>,
    pub validator: Option<ValidatorDetails>,
}

/// Lighthouse's `/validator/duties` entry; one per validator, attestation fields unset when the
/// validator is inactive.
#[derive(Debug, Clone, Deserialize)]
pub struct LighthouseDuty {
    pub validator_pubkey: BlsPubKey,
    #[serde(default, with = "quoted_u64_opt")]
    pub validator_index: Option<ValidatorIndex>,
    #[serde(default, with = "quoted_u64_opt")]
    pub attestation_slot: Option<Slot>,
    #[serde(default, with = "quoted_u64_opt")]
    pub attestation_committee_index: Option<u64>,
    #[serde(default, with = "quoted_u64_opt")]
    pub attestation_committee_position: Option<u64>,
    #[serde(default, with = "quoted_u64_opt")]
    pub committee_count_at_slot: Option<u64>,
    #[serde(default, with = "quoted_u64_vec")]
    pub block_proposal_slots: Vec<Slot>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LighthouseCommittee {
    #[serde(with = "quoted_u64")]
    pub slot: Slot,
    #[serde(with = "quoted_u64")]
    pub index: u64,
    #[serde(with = "quoted_u64_vec")]
    pub committee: Vec<ValidatorIndex>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LighthouseSyncStatus {
    #[serde(with = "quoted_u64")]
    pub starting_slot: Slot,
    #[serde(with = "quoted_u64")]
    pub current_slot: Slot,
    #[serde(with = "quoted_u64")]
    pub highest_slot: Slot,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LighthouseSyncing {
    pub is_syncing: bool,
    pub sync_status: LighthouseSyncStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct LighthouseDutiesRequest {
    #[serde(with = "quoted_u64")]
    pub epoch: u64,
    pub pubkeys: Vec<BlsPubKey>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct LighthouseSubscription {
    #[serde(with = "quoted_u64")]
    pub validator_index: ValidatorIndex,
    #[serde(with = "quoted_u64")]
    pub attestation_committee_index: u64,
    #[serde(with = "quoted_u64")]
    pub slot: Slot,
    #[serde(with = "quoted_u64")]
    pub committee_count_at_slot: u64,
    pub is_aggregator: bool,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LighthouseState {
    pub fork: Fork,
    pub previous_justified_checkpoint: Checkpoint,
    pub current_justified_checkpoint: Checkpoint,
    pub finalized_checkpoint: Checkpoint,
}

/// Lighthouse's `/beacon/state` answer, reduced to the fields the client reads.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LighthouseStateResponse {
    pub root: Root,
    pub beacon_state: LighthouseState,
}
