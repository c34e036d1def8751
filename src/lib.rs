#![warn(clippy::uninlined_format_args)]
#![warn(clippy::unwrap_used)]

pub mod api;
pub mod config;
pub mod errors;
pub mod log;
pub mod quirks;
pub mod rpc;
pub mod types;
pub mod utils;

pub use crate::{
    api::BeaconNodeClient,
    config::{Backend, Config},
    errors::{ClientError, Result},
    rpc::BeaconClient,
};
