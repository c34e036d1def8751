use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use super::{
    fixed::{BlsPubKey, Root},
    primitives::{Epoch, Gwei, ValidatorIndex},
    quoted::quoted_u64,
};

/// Registry entry of a validator as stored in the beacon state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorDetails {
    pub pubkey: BlsPubKey,
    pub withdrawal_credentials: Root,
    #[serde(with = "quoted_u64")]
    pub effective_balance: Gwei,
    pub slashed: bool,
    #[serde(with = "quoted_u64")]
    pub activation_eligibility_epoch: Epoch,
    #[serde(with = "quoted_u64")]
    pub activation_epoch: Epoch,
    #[serde(with = "quoted_u64")]
    pub exit_epoch: Epoch,
    #[serde(with = "quoted_u64")]
    pub withdrawable_epoch: Epoch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    #[serde(with = "quoted_u64")]
    pub index: ValidatorIndex,
    #[serde(with = "quoted_u64")]
    pub balance: Gwei,
    pub status: ValidatorStatus,
    pub validator: ValidatorDetails,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ValidatorStatus {
    PendingInitialized,
    PendingQueued,
    ActiveOngoing,
    ActiveExiting,
    ActiveSlashed,
    ExitedUnslashed,
    ExitedSlashed,
    WithdrawalPossible,
}

impl ValidatorStatus {
    /// Status of `details` at `epoch`, for backends that only report registry epochs.
    pub fn derive(details: &ValidatorDetails, epoch: Epoch, far_future_epoch: Epoch) -> Self {
        if details.activation_epoch > epoch {
            if details.activation_eligibility_epoch == far_future_epoch {
                Self::PendingInitialized
            } else {
                Self::PendingQueued
            }
        } else if details.exit_epoch > epoch {
            if details.slashed {
                Self::ActiveSlashed
            } else if details.exit_epoch == far_future_epoch {
                Self::ActiveOngoing
            } else {
                Self::ActiveExiting
            }
        } else if details.withdrawable_epoch > epoch {
            if details.slashed {
                Self::ExitedSlashed
            } else {
                Self::ExitedUnslashed
            }
        } else {
            Self::WithdrawalPossible
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(
            self,
            Self::ActiveOngoing | Self::ActiveExiting | Self::ActiveSlashed
        )
    }
}
