//! Resolution of state identifiers to concrete slots and epochs.

use tracing::trace;

use super::{ChainConstantsProvider, ChainHeadProvider};
use crate::{
    errors::{OperationContext, Result},
    types::{Epoch, Slot, StateId},
    utils::epoch_at_slot,
};

/// Head-relative identifiers fetch a fresh chain head on every call.
pub async fn resolve_slot<P>(provider: &P, state_id: StateId) -> Result<Slot>
where
    P: ChainHeadProvider + ?Sized,
{
    let slot = match state_id {
        StateId::Genesis => 0,
        StateId::Slot(slot) => slot,
        StateId::Head => provider.chain_head().await.operation("chain_head")?.slot,
        StateId::Justified => {
            provider
                .chain_head()
                .await
                .operation("chain_head")?
                .justified_slot
        }
        StateId::Finalized => {
            provider
                .chain_head()
                .await
                .operation("chain_head")?
                .finalized_slot
        }
        StateId::Root(root) => provider
            .slot_for_block_root(root)
            .await
            .operation("slot_for_block_root")?,
    };
    trace!(%state_id, slot, "resolved state identifier");
    Ok(slot)
}

pub async fn resolve_epoch<P>(provider: &P, state_id: StateId) -> Result<Epoch>
where
    P: ChainHeadProvider + ChainConstantsProvider + ?Sized,
{
    let slot = resolve_slot(provider, state_id).await?;
    let slots_per_epoch = provider
        .slots_per_epoch()
        .await
        .operation("slots_per_epoch")?;
    Ok(epoch_at_slot(slot, slots_per_epoch))
}

/// Parses `state_id` and resolves it; unparseable input fails with `InvalidIdentifier`.
pub async fn resolve_slot_str<P>(provider: &P, state_id: &str) -> Result<Slot>
where
    P: ChainHeadProvider + ?Sized,
{
    resolve_slot(provider, state_id.parse()?).await
}
