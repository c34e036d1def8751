use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use beacon_client::{
    api::{ChainConstantsProvider, HeadEventsProvider, NodeProvider},
    log::init_tracing_logger,
    types::{HeadEvent, DOMAIN_BEACON_ATTESTER},
    BeaconClient, Config,
};
use tokio_util::sync::CancellationToken;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing_logger();

    let config = match std::env::args().nth(1) {
        Some(path) => Config::from_file(&PathBuf::from(path))?,
        None => Config::from_env()?,
    };
    let cancel = CancellationToken::new();
    let client = BeaconClient::connect(&config, cancel.clone())
        .await
        .context("failed to connect to beacon node")?;

    let version = client.node_version().await?;
    let sync = client.sync_state().await?;
    info!(
        backend = %client.backend(),
        %version,
        head_slot = sync.head_slot,
        is_syncing = sync.is_syncing,
        "connected"
    );

    let genesis = client.genesis().await?;
    let epoch = client.epoch_at_slot(sync.head_slot).await?;
    let domain = client
        .signature_domain(DOMAIN_BEACON_ATTESTER.as_bytes(), epoch)
        .await?;
    info!(
        genesis_validators_root = %genesis.genesis_validators_root,
        epoch,
        %domain,
        "attester domain"
    );

    client
        .on_head(Arc::new(|event: HeadEvent| async move {
            info!(
                slot = event.slot,
                block_root = %event.block_root,
                epoch_transition = event.epoch_transition,
                "new head"
            );
            Ok::<_, anyhow::Error>(())
        }))
        .await?;

    tokio::signal::ctrl_c()
        .await
        .context("failed to pause until ctrl-c")?;
    info!("shutting down");
    cancel.cancel();
    Ok(())
}
