//! Deployment configuration.
//!
//! All endpoints, contract addresses, and transaction constants are fixed by
//! the deployment stage at process start. The resulting [`Config`] is
//! immutable and passed by reference into the gateway constructors; nothing
//! reads ambient global state after startup.

use std::env;
use std::time::Duration;

use alloy::primitives::Address;

use crate::error::{Result, VerisealError};

/// Gas price for notarization transactions. The notary registry is a
/// permissioned, zero-fee contract.
pub const GAS_PRICE: u128 = 0;

/// Gas limit ceiling for notarization transactions.
pub const GAS_LIMIT: u64 = 20_000_000;

/// Maximum confirmation polling rounds before a submission is reported as
/// timed out.
pub const TX_VERIFICATION_ROUNDS: u64 = 30;

/// Fixed delay between confirmation polling rounds. Ledger block time is
/// roughly constant, so the wait is linear rather than exponential.
pub const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Deployment stage, selected once at process start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Production,
    Staging,
    Test,
}

impl Stage {
    /// Reads the stage from `VERISEAL_STAGE` (`production` when unset).
    pub fn from_env() -> Self {
        match env::var("VERISEAL_STAGE").as_deref() {
            Ok("staging") => Stage::Staging,
            Ok("test") => Stage::Test,
            _ => Stage::Production,
        }
    }
}

/// Immutable process-wide configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Ledger RPC endpoint.
    pub ledger_endpoint: String,
    /// Base URL of the registry backend.
    pub api_endpoint: String,
    /// Notary registry contract.
    pub notary_contract: Address,
    /// Organisation registry contract.
    pub org_contract: Address,
    pub gas_price: u128,
    pub gas_limit: u64,
    pub max_poll_rounds: u64,
    pub poll_interval: Duration,
}

impl Config {
    /// Builds the configuration for a deployment stage. The test stage
    /// sources endpoints and contracts from environment overrides so
    /// integration environments can point anywhere.
    pub fn for_stage(stage: Stage) -> Result<Self> {
        let (ledger_endpoint, api_endpoint, notary_contract, org_contract) = match stage {
            Stage::Production => (
                "https://ledger.veriseal.io".to_string(),
                "https://api.veriseal.io/foundation".to_string(),
                "0x7d3c49f1a1bb2c8e9f06d41a3a8c5be27f09d1c4".to_string(),
                "0x2b90ae81c6d5a04f7e83b15d9a247c0e5d13f88a".to_string(),
            ),
            Stage::Staging => (
                "https://ledger.staging.veriseal.io".to_string(),
                "https://api.staging.veriseal.io/foundation".to_string(),
                "0xe4f21a07c95d3b68d2c90b5fa4e8d7361cb20d95".to_string(),
                "0x9c57de02b1a84f6dd0b42c7e8f315a96e72c041b".to_string(),
            ),
            Stage::Test => (
                require_env("VERISEAL_TEST_NET")?,
                require_env("VERISEAL_TEST_API")?,
                require_env("VERISEAL_TEST_CONTRACT")?,
                require_env("VERISEAL_TEST_CONTRACT_ORG")?,
            ),
        };

        Ok(Config {
            ledger_endpoint,
            api_endpoint,
            notary_contract: parse_address(&notary_contract)?,
            org_contract: parse_address(&org_contract)?,
            gas_price: GAS_PRICE,
            gas_limit: GAS_LIMIT,
            max_poll_rounds: TX_VERIFICATION_ROUNDS,
            poll_interval: POLL_INTERVAL,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    env::var(key).map_err(|_| VerisealError::Config(format!("{key} is not set")))
}

fn parse_address(s: &str) -> Result<Address> {
    s.parse()
        .map_err(|_| VerisealError::Config(format!("invalid contract address: {s}")))
}
