//! Protobuf messages of the `ethereum.eth.v1alpha1` services, reduced to the fields the client
//! reads or writes.

use std::collections::HashMap;

/// Largest page Prysm serves for paginated list calls.
pub const MAX_PAGE_SIZE: i32 = 250;

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Empty {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Timestamp {
    #[prost(int64, tag = "1")]
    pub seconds: i64,
    #[prost(int32, tag = "2")]
    pub nanos: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Version {
    #[prost(string, tag = "1")]
    pub version: String,
    #[prost(string, tag = "2")]
    pub metadata: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SyncStatus {
    #[prost(bool, tag = "1")]
    pub syncing: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Genesis {
    #[prost(message, optional, tag = "1")]
    pub genesis_time: Option<Timestamp>,
    #[prost(bytes = "vec", tag = "2")]
    pub deposit_contract_address: Vec<u8>,
    #[prost(bytes = "vec", tag = "3")]
    pub genesis_validators_root: Vec<u8>,
}

/// Every chain constant, printed in Go's `%v` form.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BeaconConfig {
    #[prost(map = "string, string", tag = "1")]
    pub config: HashMap<String, String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ChainHead {
    #[prost(uint64, tag = "1")]
    pub head_slot: u64,
    #[prost(uint64, tag = "2")]
    pub head_epoch: u64,
    #[prost(bytes = "vec", tag = "3")]
    pub head_block_root: Vec<u8>,
    #[prost(uint64, tag = "4")]
    pub finalized_slot: u64,
    #[prost(uint64, tag = "5")]
    pub finalized_epoch: u64,
    #[prost(bytes = "vec", tag = "6")]
    pub finalized_block_root: Vec<u8>,
    #[prost(uint64, tag = "7")]
    pub justified_slot: u64,
    #[prost(uint64, tag = "8")]
    pub justified_epoch: u64,
    #[prost(bytes = "vec", tag = "9")]
    pub justified_block_root: Vec<u8>,
    #[prost(uint64, tag = "10")]
    pub previous_justified_slot: u64,
    #[prost(uint64, tag = "11")]
    pub previous_justified_epoch: u64,
    #[prost(bytes = "vec", tag = "12")]
    pub previous_justified_block_root: Vec<u8>,
}

/// Epoch selector shared by the list requests.
#[derive(Clone, PartialEq, ::prost::Oneof)]
pub enum EpochFilter {
    #[prost(uint64, tag = "1")]
    Epoch(u64),
    #[prost(bool, tag = "2")]
    Genesis(bool),
}

impl EpochFilter {
    pub fn at(epoch: u64) -> Self {
        if epoch == 0 {
            Self::Genesis(true)
        } else {
            Self::Epoch(epoch)
        }
    }
}

#[derive(Clone, PartialEq, ::prost::Oneof)]
pub enum BlockFilter {
    #[prost(bytes, tag = "1")]
    Root(Vec<u8>),
    #[prost(uint64, tag = "2")]
    Slot(u64),
    #[prost(uint64, tag = "3")]
    Epoch(u64),
    #[prost(bool, tag = "4")]
    Genesis(bool),
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListBlocksRequest {
    #[prost(oneof = "BlockFilter", tags = "1, 2, 3, 4")]
    pub query_filter: Option<BlockFilter>,
    #[prost(int32, tag = "5")]
    pub page_size: i32,
    #[prost(string, tag = "6")]
    pub page_token: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BeaconBlockContainer {
    #[prost(message, optional, tag = "1")]
    pub block: Option<SignedBeaconBlock>,
    #[prost(bytes = "vec", tag = "2")]
    pub block_root: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListBlocksResponse {
    #[prost(message, repeated, tag = "1")]
    pub block_containers: Vec<BeaconBlockContainer>,
    #[prost(string, tag = "2")]
    pub next_page_token: String,
    #[prost(int32, tag = "3")]
    pub total_size: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListValidatorsRequest {
    #[prost(oneof = "EpochFilter", tags = "1, 2")]
    pub query_filter: Option<EpochFilter>,
    #[prost(bool, tag = "3")]
    pub active: bool,
    #[prost(int32, tag = "4")]
    pub page_size: i32,
    #[prost(string, tag = "5")]
    pub page_token: String,
    #[prost(bytes = "vec", repeated, tag = "6")]
    pub public_keys: Vec<Vec<u8>>,
    #[prost(uint64, repeated, tag = "7")]
    pub indices: Vec<u64>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Validator {
    #[prost(bytes = "vec", tag = "1")]
    pub public_key: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub withdrawal_credentials: Vec<u8>,
    #[prost(uint64, tag = "3")]
    pub effective_balance: u64,
    #[prost(bool, tag = "4")]
    pub slashed: bool,
    #[prost(uint64, tag = "5")]
    pub activation_eligibility_epoch: u64,
    #[prost(uint64, tag = "6")]
    pub activation_epoch: u64,
    #[prost(uint64, tag = "7")]
    pub exit_epoch: u64,
    #[prost(uint64, tag = "8")]
    pub withdrawable_epoch: u64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ValidatorContainer {
    #[prost(uint64, tag = "1")]
    pub index: u64,
    #[prost(message, optional, tag = "2")]
    pub validator: Option<Validator>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Validators {
    #[prost(uint64, tag = "1")]
    pub epoch: u64,
    #[prost(message, repeated, tag = "2")]
    pub validator_list: Vec<ValidatorContainer>,
    #[prost(string, tag = "3")]
    pub next_page_token: String,
    #[prost(int32, tag = "4")]
    pub total_size: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListValidatorBalancesRequest {
    #[prost(oneof = "EpochFilter", tags = "1, 2")]
    pub query_filter: Option<EpochFilter>,
    #[prost(bytes = "vec", repeated, tag = "3")]
    pub public_keys: Vec<Vec<u8>>,
    #[prost(uint64, repeated, tag = "4")]
    pub indices: Vec<u64>,
    #[prost(int32, tag = "5")]
    pub page_size: i32,
    #[prost(string, tag = "6")]
    pub page_token: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Balance {
    #[prost(bytes = "vec", tag = "1")]
    pub public_key: Vec<u8>,
    #[prost(uint64, tag = "2")]
    pub index: u64,
    #[prost(uint64, tag = "3")]
    pub balance: u64,
    #[prost(string, tag = "4")]
    pub status: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ValidatorBalances {
    #[prost(uint64, tag = "1")]
    pub epoch: u64,
    #[prost(message, repeated, tag = "2")]
    pub balances: Vec<Balance>,
    #[prost(string, tag = "3")]
    pub next_page_token: String,
    #[prost(int32, tag = "4")]
    pub total_size: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListCommitteesRequest {
    #[prost(oneof = "EpochFilter", tags = "1, 2")]
    pub query_filter: Option<EpochFilter>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CommitteeItem {
    #[prost(uint64, repeated, tag = "1")]
    pub validator_indices: Vec<u64>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CommitteesList {
    #[prost(message, repeated, tag = "1")]
    pub committees: Vec<CommitteeItem>,
}

/// Committees keyed by slot, each list ordered by committee index.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BeaconCommittees {
    #[prost(uint64, tag = "1")]
    pub epoch: u64,
    #[prost(map = "uint64, message", tag = "2")]
    pub committees: HashMap<u64, CommitteesList>,
    #[prost(uint64, tag = "3")]
    pub active_validator_count: u64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DutiesRequest {
    #[prost(uint64, tag = "1")]
    pub epoch: u64,
    #[prost(bytes = "vec", repeated, tag = "2")]
    pub public_keys: Vec<Vec<u8>>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Duty {
    #[prost(uint64, repeated, tag = "1")]
    pub committee: Vec<u64>,
    #[prost(uint64, tag = "2")]
    pub committee_index: u64,
    #[prost(uint64, tag = "3")]
    pub attester_slot: u64,
    #[prost(uint64, repeated, tag = "4")]
    pub proposer_slots: Vec<u64>,
    #[prost(bytes = "vec", tag = "5")]
    pub public_key: Vec<u8>,
    #[prost(int32, tag = "6")]
    pub status: i32,
    #[prost(uint64, tag = "7")]
    pub validator_index: u64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DutiesResponse {
    #[prost(message, repeated, tag = "2")]
    pub current_epoch_duties: Vec<Duty>,
    #[prost(message, repeated, tag = "3")]
    pub next_epoch_duties: Vec<Duty>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AttestationDataRequest {
    #[prost(uint64, tag = "1")]
    pub slot: u64,
    #[prost(uint64, tag = "2")]
    pub committee_index: u64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Checkpoint {
    #[prost(uint64, tag = "1")]
    pub epoch: u64,
    #[prost(bytes = "vec", tag = "2")]
    pub root: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AttestationData {
    #[prost(uint64, tag = "1")]
    pub slot: u64,
    #[prost(uint64, tag = "2")]
    pub committee_index: u64,
    #[prost(bytes = "vec", tag = "3")]
    pub beacon_block_root: Vec<u8>,
    #[prost(message, optional, tag = "4")]
    pub source: Option<Checkpoint>,
    #[prost(message, optional, tag = "5")]
    pub target: Option<Checkpoint>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Attestation {
    #[prost(bytes = "vec", tag = "1")]
    pub aggregation_bits: Vec<u8>,
    #[prost(message, optional, tag = "2")]
    pub data: Option<AttestationData>,
    #[prost(bytes = "vec", tag = "3")]
    pub signature: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AttestResponse {
    #[prost(bytes = "vec", tag = "1")]
    pub attestation_data_root: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AggregateAttestationAndProof {
    #[prost(uint64, tag = "1")]
    pub aggregator_index: u64,
    #[prost(bytes = "vec", tag = "2")]
    pub selection_proof: Vec<u8>,
    #[prost(message, optional, tag = "3")]
    pub aggregate: Option<Attestation>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SignedAggregateAttestationAndProof {
    #[prost(message, optional, tag = "1")]
    pub message: Option<AggregateAttestationAndProof>,
    #[prost(bytes = "vec", tag = "2")]
    pub signature: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SignedAggregateSubmitRequest {
    #[prost(message, optional, tag = "1")]
    pub signed_aggregate_and_proof: Option<SignedAggregateAttestationAndProof>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SignedAggregateSubmitResponse {
    #[prost(bytes = "vec", tag = "1")]
    pub attestation_data_root: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BlockRequest {
    #[prost(uint64, tag = "1")]
    pub slot: u64,
    #[prost(bytes = "vec", tag = "2")]
    pub randao_reveal: Vec<u8>,
    #[prost(bytes = "vec", tag = "3")]
    pub graffiti: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProposeResponse {
    #[prost(bytes = "vec", tag = "1")]
    pub block_root: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProposeExitResponse {
    #[prost(bytes = "vec", tag = "1")]
    pub exit_root: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CommitteeSubnetsSubscribeRequest {
    #[prost(uint64, repeated, tag = "1")]
    pub slots: Vec<u64>,
    #[prost(uint64, repeated, tag = "2")]
    pub committee_ids: Vec<u64>,
    #[prost(bool, repeated, tag = "3")]
    pub is_aggregator: Vec<bool>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct VoluntaryExit {
    #[prost(uint64, tag = "1")]
    pub epoch: u64,
    #[prost(uint64, tag = "2")]
    pub validator_index: u64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SignedVoluntaryExit {
    #[prost(message, optional, tag = "1")]
    pub exit: Option<VoluntaryExit>,
    #[prost(bytes = "vec", tag = "2")]
    pub signature: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BeaconBlockHeader {
    #[prost(uint64, tag = "1")]
    pub slot: u64,
    #[prost(uint64, tag = "2")]
    pub proposer_index: u64,
    #[prost(bytes = "vec", tag = "3")]
    pub parent_root: Vec<u8>,
    #[prost(bytes = "vec", tag = "4")]
    pub state_root: Vec<u8>,
    #[prost(bytes = "vec", tag = "5")]
    pub body_root: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SignedBeaconBlockHeader {
    #[prost(message, optional, tag = "1")]
    pub header: Option<BeaconBlockHeader>,
    #[prost(bytes = "vec", tag = "2")]
    pub signature: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProposerSlashing {
    #[prost(message, optional, tag = "2")]
    pub header_1: Option<SignedBeaconBlockHeader>,
    #[prost(message, optional, tag = "3")]
    pub header_2: Option<SignedBeaconBlockHeader>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct IndexedAttestation {
    #[prost(uint64, repeated, tag = "1")]
    pub attesting_indices: Vec<u64>,
    #[prost(message, optional, tag = "2")]
    pub data: Option<AttestationData>,
    #[prost(bytes = "vec", tag = "3")]
    pub signature: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AttesterSlashing {
    #[prost(message, optional, tag = "1")]
    pub attestation_1: Option<IndexedAttestation>,
    #[prost(message, optional, tag = "2")]
    pub attestation_2: Option<IndexedAttestation>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DepositData {
    #[prost(bytes = "vec", tag = "1")]
    pub public_key: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub withdrawal_credentials: Vec<u8>,
    #[prost(uint64, tag = "3")]
    pub amount: u64,
    #[prost(bytes = "vec", tag = "4")]
    pub signature: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Deposit {
    #[prost(bytes = "vec", repeated, tag = "1")]
    pub proof: Vec<Vec<u8>>,
    #[prost(message, optional, tag = "2")]
    pub data: Option<DepositData>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Eth1Data {
    #[prost(bytes = "vec", tag = "1")]
    pub deposit_root: Vec<u8>,
    #[prost(uint64, tag = "2")]
    pub deposit_count: u64,
    #[prost(bytes = "vec", tag = "3")]
    pub block_hash: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BeaconBlockBody {
    #[prost(bytes = "vec", tag = "1")]
    pub randao_reveal: Vec<u8>,
    #[prost(message, optional, tag = "2")]
    pub eth1_data: Option<Eth1Data>,
    #[prost(bytes = "vec", tag = "3")]
    pub graffiti: Vec<u8>,
    #[prost(message, repeated, tag = "4")]
    pub proposer_slashings: Vec<ProposerSlashing>,
    #[prost(message, repeated, tag = "5")]
    pub attester_slashings: Vec<AttesterSlashing>,
    #[prost(message, repeated, tag = "6")]
    pub attestations: Vec<Attestation>,
    #[prost(message, repeated, tag = "7")]
    pub deposits: Vec<Deposit>,
    #[prost(message, repeated, tag = "8")]
    pub voluntary_exits: Vec<SignedVoluntaryExit>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BeaconBlock {
    #[prost(uint64, tag = "1")]
    pub slot: u64,
    #[prost(uint64, tag = "2")]
    pub proposer_index: u64,
    #[prost(bytes = "vec", tag = "3")]
    pub parent_root: Vec<u8>,
    #[prost(bytes = "vec", tag = "4")]
    pub state_root: Vec<u8>,
    #[prost(message, optional, tag = "5")]
    pub body: Option<BeaconBlockBody>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SignedBeaconBlock {
    #[prost(message, optional, tag = "1")]
    pub block: Option<BeaconBlock>,
    #[prost(bytes = "vec", tag = "2")]
    pub signature: Vec<u8>,
}
