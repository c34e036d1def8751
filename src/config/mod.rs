mod client_config;
mod types;

pub use client_config::Config;
pub use types::Backend;
