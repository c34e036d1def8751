//! Canonical value types and the codec contract they follow on the wire.

pub mod attestation;
pub mod block;
pub mod bytes;
pub mod chain;
pub mod duties;
pub mod events;
pub mod fixed;
pub mod primitives;
pub mod quoted;
pub mod state_id;
pub mod validator;

pub use attestation::{
    AggregateAndProof, Attestation, AttestationData, BeaconCommitteeSubscription, Checkpoint,
    IndexedAttestation, SignedAggregateAndProof,
};
pub use block::{
    AttesterSlashing, BeaconBlock, BeaconBlockBody, BeaconBlockHeader, Deposit, DepositData,
    Eth1Data, ProposerSlashing, SignedBeaconBlock, SignedBeaconBlockHeader, SignedVoluntaryExit,
    VoluntaryExit,
};
pub use bytes::HexBytes;
pub use chain::{ChainHead, Finality, Fork, Genesis, SyncState};
pub use duties::{AttesterDuty, BeaconCommittee, ProposerDuty};
pub use events::{HeadEvent, HeadUpdate};
pub use fixed::{BlsPubKey, Domain, DomainType, Root, Signature, Version};
pub use primitives::*;
pub use state_id::StateId;
pub use validator::{Validator, ValidatorDetails, ValidatorStatus};
