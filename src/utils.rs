use crate::types::primitives::{Epoch, Slot};

/// `slot / slots_per_epoch`; a zero epoch length maps every slot to epoch 0.
pub fn epoch_at_slot(slot: Slot, slots_per_epoch: u64) -> Epoch {
    slot.checked_div(slots_per_epoch).unwrap_or_default()
}

pub fn start_slot_of_epoch(epoch: Epoch, slots_per_epoch: u64) -> Slot {
    epoch.saturating_mul(slots_per_epoch)
}

/// Renders indices as a comma separated query value.
pub fn join_indices(indices: &[u64]) -> String {
    indices
        .iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
