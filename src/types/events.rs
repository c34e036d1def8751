use serde::{Deserialize, Serialize};

use super::{fixed::Root, primitives::Slot, quoted::quoted_u64};
use crate::utils::epoch_at_slot;

/// A head update as delivered to every registered handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadEvent {
    #[serde(with = "quoted_u64")]
    pub slot: Slot,
    #[serde(rename = "block")]
    pub block_root: Root,
    #[serde(rename = "state")]
    pub state_root: Root,
    pub epoch_transition: bool,
}

/// A raw head observation from an upstream source, before epoch bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadUpdate {
    pub slot: Slot,
    pub block_root: Root,
    pub state_root: Root,
}

impl HeadUpdate {
    pub fn into_event(self, previous_slot: Option<Slot>, slots_per_epoch: u64) -> HeadEvent {
        let epoch_transition = match previous_slot {
            Some(previous) => {
                epoch_at_slot(previous, slots_per_epoch) != epoch_at_slot(self.slot, slots_per_epoch)
            }
            None => false,
        };
        HeadEvent {
            slot: self.slot,
            block_root: self.block_root,
            state_root: self.state_root,
            epoch_transition,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(slot: Slot) -> HeadUpdate {
        HeadUpdate {
            slot,
            block_root: Root::new([1; 32]),
            state_root: Root::new([2; 32]),
        }
    }

    #[test]
    fn first_event_is_not_a_transition() {
        assert!(!update(64).into_event(None, 32).epoch_transition);
    }

    #[test]
    fn transition_when_epoch_changes() {
        assert!(!update(63).into_event(Some(62), 32).epoch_transition);
        assert!(update(64).into_event(Some(63), 32).epoch_transition);
        assert!(update(130).into_event(Some(63), 32).epoch_transition);
    }

    #[test]
    fn sse_payload_shape() {
        let json = r#"{
            "slot": "10",
            "block": "0x0101010101010101010101010101010101010101010101010101010101010101",
            "state": "0x0202020202020202020202020202020202020202020202020202020202020202",
            "epoch_transition": false
        }"#;
        let event: HeadEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.slot, 10);
        assert_eq!(event.state_root, Root::new([2; 32]));
    }
}
