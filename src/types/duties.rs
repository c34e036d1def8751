use serde::{Deserialize, Serialize};

use super::{
    fixed::BlsPubKey,
    primitives::{CommitteeIndex, Slot, ValidatorIndex},
    quoted::{quoted_u64, quoted_u64_vec},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttesterDuty {
    pub pubkey: BlsPubKey,
    #[serde(with = "quoted_u64")]
    pub validator_index: ValidatorIndex,
    #[serde(with = "quoted_u64")]
    pub committee_index: CommitteeIndex,
    #[serde(with = "quoted_u64")]
    pub committee_length: u64,
    #[serde(with = "quoted_u64")]
    pub committees_at_slot: u64,
    /// Position of the validator inside its committee.
    #[serde(with = "quoted_u64")]
    pub validator_committee_index: u64,
    #[serde(with = "quoted_u64")]
    pub slot: Slot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposerDuty {
    pub pubkey: BlsPubKey,
    #[serde(with = "quoted_u64")]
    pub validator_index: ValidatorIndex,
    #[serde(with = "quoted_u64")]
    pub slot: Slot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeaconCommittee {
    #[serde(with = "quoted_u64")]
    pub index: CommitteeIndex,
    #[serde(with = "quoted_u64")]
    pub slot: Slot,
    #[serde(with = "quoted_u64_vec")]
    pub validators: Vec<ValidatorIndex>,
}
