#![allow(dead_code)]

use beacon_client::{Backend, Config};
use httpmock::MockServer;
use serde_json::{json, Value};

pub fn hex(byte: u8, len: usize) -> String {
    format!("0x{}", format!("{byte:02x}").repeat(len))
}

pub fn root(byte: u8) -> String {
    hex(byte, 32)
}

pub fn signature(byte: u8) -> String {
    hex(byte, 96)
}

pub fn pubkey(byte: u8) -> String {
    hex(byte, 48)
}

pub fn config(server: &MockServer, backend: Backend) -> Config {
    let mut config = Config::new(server.base_url(), backend);
    config.request_timeout_secs = 5;
    config.head_poll_interval_ms = 10;
    config
}

/// A registry entry with every epoch quoted, as the standard API writes it.
pub fn validator_json(index: u64, byte: u8) -> Value {
    json!({
        "index": index.to_string(),
        "balance": "32000000000",
        "status": "active_ongoing",
        "validator": {
            "pubkey": pubkey(byte),
            "withdrawal_credentials": root(byte),
            "effective_balance": "32000000000",
            "slashed": false,
            "activation_eligibility_epoch": "0",
            "activation_epoch": "0",
            "exit_epoch": "18446744073709551615",
            "withdrawable_epoch": "18446744073709551615"
        }
    })
}

pub fn attestation_json() -> Value {
    json!({
        "aggregation_bits": "0x05",
        "data": {
            "slot": "10",
            "index": "1",
            "beacon_block_root": root(1),
            "source": { "epoch": "0", "root": root(2) },
            "target": { "epoch": "1", "root": root(3) }
        },
        "signature": signature(4)
    })
}
