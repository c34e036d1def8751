//! Conversions between the protobuf messages and the canonical model.

use std::collections::HashMap;

use super::proto;
use crate::{
    errors::{ClientError, Result},
    types::{
        bytes::hex_decode, quoted, AggregateAndProof, Attestation, AttestationData,
        AttesterDuty, AttesterSlashing, BeaconBlock, BeaconBlockBody, BeaconBlockHeader,
        BeaconCommittee, BlsPubKey, ChainHead, Checkpoint, Deposit, DepositData, Epoch, Eth1Data,
        Fork, IndexedAttestation, ProposerDuty, ProposerSlashing, Root, Signature,
        SignedAggregateAndProof, SignedBeaconBlock, SignedBeaconBlockHeader, SignedVoluntaryExit,
        Slot, ValidatorDetails, Version, VoluntaryExit,
    },
};

/// Forks after genesis, in activation order, by their beacon config key prefix.
const FORK_NAMES: [&str; 5] = ["Altair", "Bellatrix", "Capella", "Deneb", "Electra"];

fn required<T>(field: Option<T>, name: &str) -> Result<T> {
    field.ok_or_else(|| ClientError::decoding("prysm message", format!("missing {name}")))
}

pub fn config_u64(config: &HashMap<String, String>, key: &str) -> Result<Option<u64>> {
    config
        .get(key)
        .map(|value| {
            quoted::parse_u64(value)
                .map_err(|err| ClientError::decoding(format!("beacon config: {key}"), err))
        })
        .transpose()
}

/// Byte values come either as `0x`-hex or in Go's `[0 0 0 1]` slice form.
fn config_bytes(key: &str, value: &str) -> Result<Vec<u8>> {
    let value = value.trim();
    if value.starts_with("0x") {
        return Ok(hex_decode(value)?);
    }
    value
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split_whitespace()
        .map(|byte| {
            byte.parse::<u8>()
                .map_err(|err| ClientError::decoding(format!("beacon config: {key}"), err))
        })
        .collect()
}

pub fn config_version(config: &HashMap<String, String>, key: &str) -> Result<Option<Version>> {
    let Some(value) = config.get(key) else {
        return Ok(None);
    };
    let bytes = config_bytes(key, value)?;
    Version::try_from(bytes.as_slice())
        .map(Some)
        .map_err(|_| ClientError::ForkVersionInvalid(bytes.len()))
}

/// The fork schedule spelled out by the beacon config: genesis plus every later fork whose
/// epoch is scheduled.
pub fn fork_schedule(config: &HashMap<String, String>, far_future_epoch: Epoch) -> Result<Vec<Fork>> {
    let Some(genesis_version) = config_version(config, "GenesisForkVersion")? else {
        return Err(ClientError::NoForkSchedule);
    };
    let mut schedule = vec![Fork {
        previous_version: genesis_version,
        current_version: genesis_version,
        epoch: 0,
    }];
    for name in FORK_NAMES {
        let version = config_version(config, &format!("{name}ForkVersion"))?;
        let epoch = config_u64(config, &format!("{name}ForkEpoch"))?;
        let (Some(version), Some(epoch)) = (version, epoch) else {
            continue;
        };
        if epoch == far_future_epoch {
            continue;
        }
        let previous_version = schedule
            .last()
            .map_or(genesis_version, |fork| fork.current_version);
        schedule.push(Fork {
            previous_version,
            current_version: version,
            epoch,
        });
    }
    Ok(schedule)
}

/// Prysm's chain head carries no state root; the caller supplies it from the head block.
pub fn chain_head(head: &proto::ChainHead, state_root: Root) -> Result<ChainHead> {
    Ok(ChainHead {
        slot: head.head_slot,
        block_root: Root::try_from(head.head_block_root.as_slice())?,
        state_root,
        finalized_slot: head.finalized_slot,
        finalized_block_root: Root::try_from(head.finalized_block_root.as_slice())?,
        justified_slot: head.justified_slot,
        justified_block_root: Root::try_from(head.justified_block_root.as_slice())?,
    })
}

pub fn validator_details(validator: &proto::Validator) -> Result<ValidatorDetails> {
    Ok(ValidatorDetails {
        pubkey: BlsPubKey::try_from(validator.public_key.as_slice())?,
        withdrawal_credentials: Root::try_from(validator.withdrawal_credentials.as_slice())?,
        effective_balance: validator.effective_balance,
        slashed: validator.slashed,
        activation_eligibility_epoch: validator.activation_eligibility_epoch,
        activation_epoch: validator.activation_epoch,
        exit_epoch: validator.exit_epoch,
        withdrawable_epoch: validator.withdrawable_epoch,
    })
}

/// Committees ordered by slot, then by index within the slot.
pub fn beacon_committees(committees: &proto::BeaconCommittees) -> Vec<BeaconCommittee> {
    let mut slots: Vec<_> = committees.committees.iter().collect();
    slots.sort_by_key(|(slot, _)| **slot);
    slots
        .into_iter()
        .flat_map(|(&slot, list)| {
            list.committees
                .iter()
                .enumerate()
                .map(move |(index, committee)| BeaconCommittee {
                    index: index as u64,
                    slot,
                    validators: committee.validator_indices.clone(),
                })
        })
        .collect()
}

pub fn committees_per_slot(committees: &proto::BeaconCommittees) -> HashMap<Slot, u64> {
    committees
        .committees
        .iter()
        .map(|(&slot, list)| (slot, list.committees.len() as u64))
        .collect()
}

/// `None` for validators without an attestation assignment.
pub fn attester_duty(
    duty: &proto::Duty,
    committees_at_slot: &HashMap<Slot, u64>,
) -> Result<Option<AttesterDuty>> {
    let Some(position) = duty
        .committee
        .iter()
        .position(|&index| index == duty.validator_index)
    else {
        return Ok(None);
    };
    Ok(Some(AttesterDuty {
        pubkey: BlsPubKey::try_from(duty.public_key.as_slice())?,
        validator_index: duty.validator_index,
        committee_index: duty.committee_index,
        committee_length: duty.committee.len() as u64,
        committees_at_slot: committees_at_slot
            .get(&duty.attester_slot)
            .copied()
            .unwrap_or_default(),
        validator_committee_index: position as u64,
        slot: duty.attester_slot,
    }))
}

pub fn proposer_duties(duty: &proto::Duty) -> Result<Vec<ProposerDuty>> {
    let pubkey = BlsPubKey::try_from(duty.public_key.as_slice())?;
    Ok(duty
        .proposer_slots
        .iter()
        .map(|&slot| ProposerDuty {
            pubkey,
            validator_index: duty.validator_index,
            slot,
        })
        .collect())
}

impl From<&Checkpoint> for proto::Checkpoint {
    fn from(checkpoint: &Checkpoint) -> Self {
        Self {
            epoch: checkpoint.epoch,
            root: checkpoint.root.as_bytes().to_vec(),
        }
    }
}

impl TryFrom<proto::Checkpoint> for Checkpoint {
    type Error = ClientError;

    fn try_from(checkpoint: proto::Checkpoint) -> Result<Self> {
        Ok(Self {
            epoch: checkpoint.epoch,
            root: Root::try_from(checkpoint.root.as_slice())?,
        })
    }
}

impl From<&AttestationData> for proto::AttestationData {
    fn from(data: &AttestationData) -> Self {
        Self {
            slot: data.slot,
            committee_index: data.index,
            beacon_block_root: data.beacon_block_root.as_bytes().to_vec(),
            source: Some((&data.source).into()),
            target: Some((&data.target).into()),
        }
    }
}

impl TryFrom<proto::AttestationData> for AttestationData {
    type Error = ClientError;

    fn try_from(data: proto::AttestationData) -> Result<Self> {
        Ok(Self {
            slot: data.slot,
            index: data.committee_index,
            beacon_block_root: Root::try_from(data.beacon_block_root.as_slice())?,
            source: required(data.source, "source")?.try_into()?,
            target: required(data.target, "target")?.try_into()?,
        })
    }
}

impl From<&Attestation> for proto::Attestation {
    fn from(attestation: &Attestation) -> Self {
        Self {
            aggregation_bits: attestation.aggregation_bits.as_slice().to_vec(),
            data: Some((&attestation.data).into()),
            signature: attestation.signature.as_bytes().to_vec(),
        }
    }
}

impl TryFrom<proto::Attestation> for Attestation {
    type Error = ClientError;

    fn try_from(attestation: proto::Attestation) -> Result<Self> {
        Ok(Self {
            aggregation_bits: attestation.aggregation_bits.into(),
            data: required(attestation.data, "attestation data")?.try_into()?,
            signature: Signature::try_from(attestation.signature.as_slice())?,
        })
    }
}

impl From<&IndexedAttestation> for proto::IndexedAttestation {
    fn from(attestation: &IndexedAttestation) -> Self {
        Self {
            attesting_indices: attestation.attesting_indices.clone(),
            data: Some((&attestation.data).into()),
            signature: attestation.signature.as_bytes().to_vec(),
        }
    }
}

impl TryFrom<proto::IndexedAttestation> for IndexedAttestation {
    type Error = ClientError;

    fn try_from(attestation: proto::IndexedAttestation) -> Result<Self> {
        Ok(Self {
            attesting_indices: attestation.attesting_indices,
            data: required(attestation.data, "attestation data")?.try_into()?,
            signature: Signature::try_from(attestation.signature.as_slice())?,
        })
    }
}

impl From<&SignedAggregateAndProof> for proto::SignedAggregateAttestationAndProof {
    fn from(signed: &SignedAggregateAndProof) -> Self {
        let AggregateAndProof {
            aggregator_index,
            aggregate,
            selection_proof,
        } = &signed.message;
        Self {
            message: Some(proto::AggregateAttestationAndProof {
                aggregator_index: *aggregator_index,
                selection_proof: selection_proof.as_bytes().to_vec(),
                aggregate: Some(aggregate.into()),
            }),
            signature: signed.signature.as_bytes().to_vec(),
        }
    }
}

impl From<&SignedVoluntaryExit> for proto::SignedVoluntaryExit {
    fn from(exit: &SignedVoluntaryExit) -> Self {
        Self {
            exit: Some(proto::VoluntaryExit {
                epoch: exit.message.epoch,
                validator_index: exit.message.validator_index,
            }),
            signature: exit.signature.as_bytes().to_vec(),
        }
    }
}

impl TryFrom<proto::SignedVoluntaryExit> for SignedVoluntaryExit {
    type Error = ClientError;

    fn try_from(exit: proto::SignedVoluntaryExit) -> Result<Self> {
        let message = required(exit.exit, "voluntary exit")?;
        Ok(Self {
            message: VoluntaryExit {
                epoch: message.epoch,
                validator_index: message.validator_index,
            },
            signature: Signature::try_from(exit.signature.as_slice())?,
        })
    }
}

impl From<&SignedBeaconBlockHeader> for proto::SignedBeaconBlockHeader {
    fn from(signed: &SignedBeaconBlockHeader) -> Self {
        let header = &signed.message;
        Self {
            header: Some(proto::BeaconBlockHeader {
                slot: header.slot,
                proposer_index: header.proposer_index,
                parent_root: header.parent_root.as_bytes().to_vec(),
                state_root: header.state_root.as_bytes().to_vec(),
                body_root: header.body_root.as_bytes().to_vec(),
            }),
            signature: signed.signature.as_bytes().to_vec(),
        }
    }
}

impl TryFrom<proto::SignedBeaconBlockHeader> for SignedBeaconBlockHeader {
    type Error = ClientError;

    fn try_from(signed: proto::SignedBeaconBlockHeader) -> Result<Self> {
        let header = required(signed.header, "block header")?;
        Ok(Self {
            message: BeaconBlockHeader {
                slot: header.slot,
                proposer_index: header.proposer_index,
                parent_root: Root::try_from(header.parent_root.as_slice())?,
                state_root: Root::try_from(header.state_root.as_slice())?,
                body_root: Root::try_from(header.body_root.as_slice())?,
            },
            signature: Signature::try_from(signed.signature.as_slice())?,
        })
    }
}

impl From<&Deposit> for proto::Deposit {
    fn from(deposit: &Deposit) -> Self {
        Self {
            proof: deposit
                .proof
                .iter()
                .map(|node| node.as_bytes().to_vec())
                .collect(),
            data: Some(proto::DepositData {
                public_key: deposit.data.pubkey.as_bytes().to_vec(),
                withdrawal_credentials: deposit.data.withdrawal_credentials.as_bytes().to_vec(),
                amount: deposit.data.amount,
                signature: deposit.data.signature.as_bytes().to_vec(),
            }),
        }
    }
}

impl TryFrom<proto::Deposit> for Deposit {
    type Error = ClientError;

    fn try_from(deposit: proto::Deposit) -> Result<Self> {
        let data = required(deposit.data, "deposit data")?;
        Ok(Self {
            proof: deposit
                .proof
                .iter()
                .map(|node| Root::try_from(node.as_slice()))
                .collect::<std::result::Result<_, _>>()?,
            data: DepositData {
                pubkey: BlsPubKey::try_from(data.public_key.as_slice())?,
                withdrawal_credentials: Root::try_from(data.withdrawal_credentials.as_slice())?,
                amount: data.amount,
                signature: Signature::try_from(data.signature.as_slice())?,
            },
        })
    }
}

impl From<&BeaconBlock> for proto::BeaconBlock {
    fn from(block: &BeaconBlock) -> Self {
        let body = &block.body;
        Self {
            slot: block.slot,
            proposer_index: block.proposer_index,
            parent_root: block.parent_root.as_bytes().to_vec(),
            state_root: block.state_root.as_bytes().to_vec(),
            body: Some(proto::BeaconBlockBody {
                randao_reveal: body.randao_reveal.as_bytes().to_vec(),
                eth1_data: Some(proto::Eth1Data {
                    deposit_root: body.eth1_data.deposit_root.as_bytes().to_vec(),
                    deposit_count: body.eth1_data.deposit_count,
                    block_hash: body.eth1_data.block_hash.as_bytes().to_vec(),
                }),
                graffiti: body.graffiti.as_bytes().to_vec(),
                proposer_slashings: body
                    .proposer_slashings
                    .iter()
                    .map(|slashing| proto::ProposerSlashing {
                        header_1: Some((&slashing.signed_header_1).into()),
                        header_2: Some((&slashing.signed_header_2).into()),
                    })
                    .collect(),
                attester_slashings: body
                    .attester_slashings
                    .iter()
                    .map(|slashing| proto::AttesterSlashing {
                        attestation_1: Some((&slashing.attestation_1).into()),
                        attestation_2: Some((&slashing.attestation_2).into()),
                    })
                    .collect(),
                attestations: body.attestations.iter().map(Into::into).collect(),
                deposits: body.deposits.iter().map(Into::into).collect(),
                voluntary_exits: body.voluntary_exits.iter().map(Into::into).collect(),
            }),
        }
    }
}

fn try_collect<P, T>(items: Vec<P>) -> Result<Vec<T>>
where
    T: TryFrom<P, Error = ClientError>,
{
    items.into_iter().map(T::try_from).collect()
}

impl TryFrom<proto::BeaconBlock> for BeaconBlock {
    type Error = ClientError;

    fn try_from(block: proto::BeaconBlock) -> Result<Self> {
        let body = required(block.body, "block body")?;
        let eth1_data = required(body.eth1_data, "eth1 data")?;
        let proposer_slashings = body
            .proposer_slashings
            .into_iter()
            .map(|slashing| -> Result<ProposerSlashing> {
                Ok(ProposerSlashing {
                    signed_header_1: required(slashing.header_1, "header_1")?.try_into()?,
                    signed_header_2: required(slashing.header_2, "header_2")?.try_into()?,
                })
            })
            .collect::<Result<_>>()?;
        let attester_slashings = body
            .attester_slashings
            .into_iter()
            .map(|slashing| -> Result<AttesterSlashing> {
                Ok(AttesterSlashing {
                    attestation_1: required(slashing.attestation_1, "attestation_1")?
                        .try_into()?,
                    attestation_2: required(slashing.attestation_2, "attestation_2")?
                        .try_into()?,
                })
            })
            .collect::<Result<_>>()?;

        Ok(Self {
            slot: block.slot,
            proposer_index: block.proposer_index,
            parent_root: Root::try_from(block.parent_root.as_slice())?,
            state_root: Root::try_from(block.state_root.as_slice())?,
            body: BeaconBlockBody {
                randao_reveal: Signature::try_from(body.randao_reveal.as_slice())?,
                eth1_data: Eth1Data {
                    deposit_root: Root::try_from(eth1_data.deposit_root.as_slice())?,
                    deposit_count: eth1_data.deposit_count,
                    block_hash: Root::try_from(eth1_data.block_hash.as_slice())?,
                },
                graffiti: Root::try_from(body.graffiti.as_slice())?,
                proposer_slashings,
                attester_slashings,
                attestations: try_collect(body.attestations)?,
                deposits: try_collect(body.deposits)?,
                voluntary_exits: try_collect(body.voluntary_exits)?,
            },
        })
    }
}

impl From<&SignedBeaconBlock> for proto::SignedBeaconBlock {
    fn from(block: &SignedBeaconBlock) -> Self {
        Self {
            block: Some((&block.message).into()),
            signature: block.signature.as_bytes().to_vec(),
        }
    }
}

impl TryFrom<proto::SignedBeaconBlock> for SignedBeaconBlock {
    type Error = ClientError;

    fn try_from(block: proto::SignedBeaconBlock) -> Result<Self> {
        Ok(Self {
            message: required(block.block, "block")?.try_into()?,
            signature: Signature::try_from(block.signature.as_slice())?,
        })
    }
}
