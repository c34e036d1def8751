use serde::{Deserialize, Serialize};

use super::{
    attestation::Checkpoint,
    fixed::{Root, Version},
    primitives::{Epoch, Slot},
    quoted::quoted_u64,
};

/// One entry of a node's fork schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fork {
    pub previous_version: Version,
    pub current_version: Version,
    #[serde(with = "quoted_u64")]
    pub epoch: Epoch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genesis {
    #[serde(with = "quoted_u64")]
    pub genesis_time: u64,
    pub genesis_validators_root: Root,
    pub genesis_fork_version: Version,
}

/// Point-in-time snapshot of the node's view of the chain tip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainHead {
    #[serde(with = "quoted_u64")]
    pub slot: Slot,
    pub block_root: Root,
    pub state_root: Root,
    #[serde(with = "quoted_u64")]
    pub finalized_slot: Slot,
    pub finalized_block_root: Root,
    #[serde(with = "quoted_u64")]
    pub justified_slot: Slot,
    pub justified_block_root: Root,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finality {
    pub previous_justified: Checkpoint,
    pub current_justified: Checkpoint,
    pub finalized: Checkpoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    #[serde(with = "quoted_u64")]
    pub head_slot: Slot,
    #[serde(with = "quoted_u64")]
    pub sync_distance: Slot,
    pub is_syncing: bool,
}

/// The entry of `schedule` applicable at `epoch`: the last one whose epoch is not after it, or
/// the first entry when `epoch` precedes the whole schedule.
pub fn fork_at_epoch(schedule: &[Fork], epoch: Epoch) -> Option<&Fork> {
    schedule
        .iter()
        .rev()
        .find(|fork| fork.epoch <= epoch)
        .or_else(|| schedule.first())
}

impl Fork {
    /// Version that signs messages for `epoch` under this fork.
    pub fn version_at(&self, epoch: Epoch) -> Version {
        if epoch < self.epoch {
            self.previous_version
        } else {
            self.current_version
        }
    }
}
