use super::fixed::DomainType;

pub type Slot = u64;
pub type Epoch = u64;
pub type ValidatorIndex = u64;
pub type CommitteeIndex = u64;
pub type Gwei = u64;

/// Sentinel epoch for "never", used when a backend does not publish its own.
pub const FAR_FUTURE_EPOCH: Epoch = u64::MAX;

pub const DOMAIN_BEACON_PROPOSER: DomainType = DomainType::new([0x00, 0x00, 0x00, 0x00]);
pub const DOMAIN_BEACON_ATTESTER: DomainType = DomainType::new([0x01, 0x00, 0x00, 0x00]);
pub const DOMAIN_RANDAO: DomainType = DomainType::new([0x02, 0x00, 0x00, 0x00]);
pub const DOMAIN_DEPOSIT: DomainType = DomainType::new([0x03, 0x00, 0x00, 0x00]);
pub const DOMAIN_VOLUNTARY_EXIT: DomainType = DomainType::new([0x04, 0x00, 0x00, 0x00]);
pub const DOMAIN_SELECTION_PROOF: DomainType = DomainType::new([0x05, 0x00, 0x00, 0x00]);
pub const DOMAIN_AGGREGATE_AND_PROOF: DomainType = DomainType::new([0x06, 0x00, 0x00, 0x00]);
/// Signed without the genesis validators root.
pub const DOMAIN_APPLICATION: DomainType = DomainType::new([0x00, 0x00, 0x00, 0x01]);
