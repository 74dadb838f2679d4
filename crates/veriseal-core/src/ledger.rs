//! Ledger gateway.
//!
//! The only component that talks to the distributed ledger: submits
//! notarization transactions to the notary registry contract, polls for
//! confirmation, and runs the read queries behind verification.

use std::sync::Arc;
use std::time::Duration;

use alloy::network::EthereumWallet;
use alloy::primitives::{keccak256, Address, B256, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use alloy::sol;
use async_trait::async_trait;
use tracing::debug;

use crate::config::Config;
use crate::error::{Result, VerisealError};
use crate::verification::{Status, Verification};

sol! {
    #[sol(rpc)]
    interface INotaryRegistry {
        function sign(bytes32 hash, uint256 status) external;

        function verify(bytes32 hash)
            external
            view
            returns (address signer, uint256 status, uint256 level, bytes32 metaHash, uint256 timestamp);

        function verifyAgainstPublicKey(bytes32 hash, address signer)
            external
            view
            returns (address recordSigner, uint256 status, uint256 level, bytes32 metaHash, uint256 timestamp);
    }

    #[sol(rpc)]
    interface IOrganisationRegistry {
        function membersOf(bytes32 org) external view returns (address[] memory members);
    }
}

/// Read and write access to the notarization registry.
///
/// Implementations are stateless besides connection pooling and safe to
/// share across concurrent sign and verify flows.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Submits `(hash, status)` signed by the given key. Returns the
    /// transaction identifier; confirmation is a separate concern.
    async fn submit_sign(
        &self,
        signer: PrivateKeySigner,
        hash: B256,
        status: Status,
    ) -> Result<B256>;

    /// Whether a submitted transaction is still pending. A query failure is
    /// an error, never conflated with "still pending".
    async fn tx_pending(&self, tx: B256) -> Result<bool>;

    /// Best available record for the hash across all signers.
    async fn verify(&self, hash: B256) -> Result<Verification>;

    /// Record for the hash written by one specific signer.
    async fn verify_against_key(&self, hash: B256, signer: Address) -> Result<Verification>;

    /// Member keys of an organisation.
    async fn org_members(&self, org: &str) -> Result<Vec<Address>>;
}

/// Outcome of bounded confirmation polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Confirmed,
    TimedOut,
}

/// Polls the ledger until the transaction leaves the pending state, for at
/// most `max_rounds` rounds with a fixed delay between rounds.
pub async fn wait_for_tx(
    ledger: &dyn Ledger,
    tx: B256,
    max_rounds: u64,
    interval: Duration,
) -> Result<PollOutcome> {
    for round in 0..max_rounds {
        if !ledger.tx_pending(tx).await? {
            debug!(%tx, round, "transaction confirmed");
            return Ok(PollOutcome::Confirmed);
        }
        debug!(%tx, round, "transaction still pending");
        tokio::time::sleep(interval).await;
    }
    Ok(PollOutcome::TimedOut)
}

/// Converts a hex fingerprint into the contract's 32-byte word,
/// left-padding short digests.
pub fn hash_to_bytes32(hash: &str) -> Result<B256> {
    let stripped = hash.strip_prefix("0x").unwrap_or(hash);
    let padded;
    let digits = if stripped.len() % 2 == 1 {
        padded = format!("0{stripped}");
        padded.as_str()
    } else {
        stripped
    };
    let bytes = hex::decode(digits)
        .map_err(|_| VerisealError::InvalidArtifact(format!("hash is not hex: {hash}")))?;
    if bytes.is_empty() || bytes.len() > 32 {
        return Err(VerisealError::InvalidArtifact(format!(
            "hash must be 1..=32 bytes, got {}",
            bytes.len()
        )));
    }
    let mut word = [0u8; 32];
    word[32 - bytes.len()..].copy_from_slice(&bytes);
    Ok(B256::from(word))
}

/// Ledger gateway backed by an EVM JSON-RPC endpoint.
pub struct EvmLedger {
    config: Arc<Config>,
}

impl EvmLedger {
    pub fn new(config: Arc<Config>) -> Self {
        EvmLedger { config }
    }

    fn endpoint(&self) -> Result<reqwest::Url> {
        self.config.ledger_endpoint.parse().map_err(|e| {
            VerisealError::LedgerUnavailable {
                endpoint: self.config.ledger_endpoint.clone(),
                reason: format!("invalid endpoint: {e}"),
            }
        })
    }

    fn unavailable(&self, reason: impl std::fmt::Display) -> VerisealError {
        VerisealError::LedgerUnavailable {
            endpoint: self.config.ledger_endpoint.clone(),
            reason: reason.to_string(),
        }
    }

    fn contract_error(&self, contract: Address, reason: impl std::fmt::Display) -> VerisealError {
        VerisealError::ContractResolution {
            contract: format!("{contract:#x}"),
            reason: reason.to_string(),
        }
    }
}

fn decode_record(
    signer: Address,
    status: U256,
    level: U256,
    meta_hash: B256,
    timestamp: U256,
) -> Verification {
    // A zero signer address is the contract's "no record" answer.
    if signer == Address::ZERO {
        return Verification::NotFound;
    }
    Verification::Found {
        signer,
        status: Status::from_code(status.saturating_to::<u64>()),
        level: level.saturating_to::<u64>() as i64,
        meta_hash,
        timestamp: timestamp.saturating_to::<u64>(),
    }
}

#[async_trait]
impl Ledger for EvmLedger {
    async fn submit_sign(
        &self,
        signer: PrivateKeySigner,
        hash: B256,
        status: Status,
    ) -> Result<B256> {
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .on_http(self.endpoint()?);
        let contract = INotaryRegistry::new(self.config.notary_contract, provider);

        let pending = contract
            .sign(hash, U256::from(status.code()))
            .gas(self.config.gas_limit)
            .gas_price(self.config.gas_price)
            .send()
            .await
            .map_err(|e| VerisealError::SignSubmissionFailed {
                hash: format!("{hash:#x}"),
                reason: e.to_string(),
            })?;

        let tx = *pending.tx_hash();
        debug!(%tx, %hash, "notarization submitted");
        Ok(tx)
    }

    async fn tx_pending(&self, tx: B256) -> Result<bool> {
        let provider = ProviderBuilder::new().on_http(self.endpoint()?);
        let found = provider
            .get_transaction_by_hash(tx)
            .await
            .map_err(|e| self.unavailable(e))?;
        // A transaction without a block is accepted but not yet mined; a
        // transaction the node does not know about at all is treated the
        // same way, since it may still be propagating.
        Ok(match found {
            Some(tx) => tx.block_number.is_none(),
            None => true,
        })
    }

    async fn verify(&self, hash: B256) -> Result<Verification> {
        let provider = ProviderBuilder::new().on_http(self.endpoint()?);
        let contract = INotaryRegistry::new(self.config.notary_contract, provider);
        let ret = contract
            .verify(hash)
            .call()
            .await
            .map_err(|e| self.contract_error(self.config.notary_contract, e))?;
        Ok(decode_record(
            ret.signer,
            ret.status,
            ret.level,
            ret.metaHash,
            ret.timestamp,
        ))
    }

    async fn verify_against_key(&self, hash: B256, signer: Address) -> Result<Verification> {
        let provider = ProviderBuilder::new().on_http(self.endpoint()?);
        let contract = INotaryRegistry::new(self.config.notary_contract, provider);
        let ret = contract
            .verifyAgainstPublicKey(hash, signer)
            .call()
            .await
            .map_err(|e| self.contract_error(self.config.notary_contract, e))?;
        Ok(decode_record(
            ret.recordSigner,
            ret.status,
            ret.level,
            ret.metaHash,
            ret.timestamp,
        ))
    }

    async fn org_members(&self, org: &str) -> Result<Vec<Address>> {
        let provider = ProviderBuilder::new().on_http(self.endpoint()?);
        let contract = IOrganisationRegistry::new(self.config.org_contract, provider);
        let ret = contract
            .membersOf(keccak256(org.as_bytes()))
            .call()
            .await
            .map_err(|e| self.contract_error(self.config.org_contract, e))?;
        Ok(ret.members)
    }
}
