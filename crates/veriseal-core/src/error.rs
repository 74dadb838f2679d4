//! Error types for the veriseal core library.

use thiserror::Error;

/// Errors produced by the notarization engine, the verification resolver,
/// and their gateways.
///
/// Precondition failures (`AuthRequired` through `WalletNotReady`) are safe
/// to retry after the caller fixes the condition. Fatal ledger failures are
/// not: a submission that may have partially landed must never be blindly
/// resubmitted, so `is_fatal` distinguishes the two classes.
#[derive(Debug, Error)]
pub enum VerisealError {
    #[error("authentication required: no valid session, run `veriseal login` first")]
    AuthRequired,

    #[error("invalid artifact: {0}")]
    InvalidArtifact(String),

    #[error("no signing key available for {0}")]
    KeyNotFound(String),

    #[error("no remaining sign operations for this publisher")]
    QuotaExhausted,

    #[error(
        "{artifact} cannot be notarized yet: your signer account is still being \
         synchronized with the ledger. This usually completes within a minute, \
         please try again shortly."
    )]
    WalletNotReady { artifact: String },

    #[error("cannot connect to ledger at {endpoint}: {reason}")]
    LedgerUnavailable { endpoint: String, reason: String },

    #[error("cannot resolve notary contract {contract}: {reason}")]
    ContractResolution { contract: String, reason: String },

    #[error("sign submission failed for {hash}: {reason}")]
    SignSubmissionFailed { hash: String, reason: String },

    #[error("ledger read failed while awaiting confirmation: {0}")]
    LedgerPermission(String),

    #[error(
        "transaction for {hash} still pending after {rounds} confirmation rounds; \
         the write may still land, resubmit manually once its fate is known"
    )]
    LedgerTimeout { hash: String, rounds: u64 },

    #[error("registry request failed: {message} (status {status})")]
    Registry { status: u16, message: String },

    #[error("registry unreachable: {0}")]
    RegistryUnavailable(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl VerisealError {
    /// True for infrastructure failures that must not be retried
    /// automatically because a ledger write may have partially landed.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            VerisealError::LedgerUnavailable { .. }
                | VerisealError::ContractResolution { .. }
                | VerisealError::SignSubmissionFailed { .. }
                | VerisealError::LedgerPermission(_)
                | VerisealError::LedgerTimeout { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, VerisealError>;
