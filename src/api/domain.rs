//! Signing domains and signing roots.

use tree_hash::TreeHash;
use tree_hash_derive::TreeHash;

use super::ChainConstantsProvider;
use crate::{
    errors::{ClientError, OperationContext, Result},
    types::{
        chain::fork_at_epoch, AttestationData, Domain, DomainType, Epoch, Fork, Root, Version,
        DOMAIN_APPLICATION,
    },
};

#[derive(Debug, TreeHash)]
struct ForkData {
    current_version: Version,
    genesis_validators_root: Root,
}

#[derive(Debug, TreeHash)]
struct SigningData {
    object_root: Root,
    domain: Domain,
}

pub fn compute_fork_data_root(current_version: Version, genesis_validators_root: Root) -> Root {
    ForkData {
        current_version,
        genesis_validators_root,
    }
    .tree_hash_root()
    .into()
}

/// `domain_type || hash_tree_root(ForkData)[..28]`.
pub fn compute_domain(
    domain_type: &[u8],
    fork_version: &[u8],
    genesis_validators_root: Root,
) -> Result<Domain> {
    let domain_type =
        DomainType::try_from(domain_type).map_err(|_| ClientError::InvalidDomain(domain_type.len()))?;
    let fork_version = Version::try_from(fork_version)
        .map_err(|_| ClientError::ForkVersionInvalid(fork_version.len()))?;
    let fork_data_root = compute_fork_data_root(fork_version, genesis_validators_root);

    let mut domain = [0u8; Domain::LEN];
    domain[..DomainType::LEN].copy_from_slice(domain_type.as_bytes());
    domain[DomainType::LEN..].copy_from_slice(&fork_data_root.as_bytes()[..28]);
    Ok(Domain::new(domain))
}

/// Domain for `domain_type` at `epoch` under a fixed fork schedule and genesis validators root.
pub fn domain_at_epoch(
    schedule: &[Fork],
    genesis_validators_root: Root,
    domain_type: &[u8],
    epoch: Epoch,
) -> Result<Domain> {
    if domain_type.len() != DomainType::LEN {
        return Err(ClientError::InvalidDomain(domain_type.len()));
    }
    let fork = fork_at_epoch(schedule, epoch).ok_or(ClientError::NoForkSchedule)?;
    let fork_version = fork.version_at(epoch);
    let genesis_validators_root = if domain_type == DOMAIN_APPLICATION.as_bytes() {
        Root::zero()
    } else {
        genesis_validators_root
    };
    compute_domain(domain_type, fork_version.as_bytes(), genesis_validators_root)
}

pub async fn signature_domain<P>(provider: &P, domain_type: &[u8], epoch: Epoch) -> Result<Domain>
where
    P: ChainConstantsProvider + ?Sized,
{
    if domain_type.len() != DomainType::LEN {
        return Err(ClientError::InvalidDomain(domain_type.len()));
    }
    let schedule = provider.fork_schedule().await.operation("fork_schedule")?;
    if schedule.is_empty() {
        return Err(ClientError::NoForkSchedule);
    }
    let genesis = provider.genesis().await.operation("genesis")?;
    domain_at_epoch(
        &schedule,
        genesis.genesis_validators_root,
        domain_type,
        epoch,
    )
}

pub fn compute_signing_root(object_root: Root, domain: Domain) -> Root {
    SigningData {
        object_root,
        domain,
    }
    .tree_hash_root()
    .into()
}

pub fn attestation_data_root(data: &AttestationData) -> Root {
    data.tree_hash_root().into()
}
