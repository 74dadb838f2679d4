//! Trust assertions and ledger verification records.

use std::fmt;
use std::str::FromStr;

use alloy::primitives::{Address, B256};
use serde::{Deserialize, Serialize};

use crate::error::VerisealError;

/// Trust status attached to a notarized artifact.
///
/// The numeric codes are the ledger wire format and must not be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Trusted,
    Untrusted,
    Unknown,
    Unsupported,
}

impl Status {
    pub fn code(self) -> u64 {
        match self {
            Status::Trusted => 0,
            Status::Untrusted => 1,
            Status::Unknown => 2,
            Status::Unsupported => 3,
        }
    }

    /// Decodes a ledger status code. Codes outside the known range read as
    /// `Unknown` rather than failing: a newer contract revision must not
    /// break old verifiers.
    pub fn from_code(code: u64) -> Self {
        match code {
            0 => Status::Trusted,
            1 => Status::Untrusted,
            3 => Status::Unsupported,
            _ => Status::Unknown,
        }
    }

    pub fn is_trusted(self) -> bool {
        matches!(self, Status::Trusted)
    }

    /// User-facing label for a non-trusted status.
    pub fn label(self) -> &'static str {
        match self {
            Status::Trusted => "is trusted",
            Status::Unknown => "was not signed",
            Status::Untrusted => "is untrusted",
            Status::Unsupported => "is unsupported",
        }
    }
}

impl FromStr for Status {
    type Err = VerisealError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trusted" => Ok(Status::Trusted),
            "untrusted" => Ok(Status::Untrusted),
            "unsupported" => Ok(Status::Unsupported),
            other => Err(VerisealError::Config(format!(
                "unknown status '{other}', expected trusted, untrusted or unsupported"
            ))),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Trusted => "TRUSTED",
            Status::Untrusted => "UNTRUSTED",
            Status::Unknown => "UNKNOWN",
            Status::Unsupported => "UNSUPPORTED",
        };
        f.write_str(s)
    }
}

/// Who may see the off-chain metadata of a notarized artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Visibility {
    Public,
    Private,
}

impl FromStr for Visibility {
    type Err = VerisealError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "public" => Ok(Visibility::Public),
            "private" => Ok(Visibility::Private),
            other => Err(VerisealError::Config(format!(
                "unknown visibility '{other}', expected public or private"
            ))),
        }
    }
}

/// Outcome of a ledger lookup for one artifact fingerprint.
///
/// `NotFound` is the explicit "no record" sentinel: it carries no signer and
/// no metadata reference, so absent fields cannot be dereferenced by
/// accident.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Verification {
    NotFound,
    Found {
        signer: Address,
        status: Status,
        level: i64,
        meta_hash: B256,
        timestamp: u64,
    },
}

impl Verification {
    pub fn is_unknown(&self) -> bool {
        matches!(self, Verification::NotFound)
    }

    pub fn status(&self) -> Status {
        match self {
            Verification::NotFound => Status::Unknown,
            Verification::Found { status, .. } => *status,
        }
    }

    pub fn is_trusted(&self) -> bool {
        self.status().is_trusted()
    }

    pub fn signer(&self) -> Option<Address> {
        match self {
            Verification::NotFound => None,
            Verification::Found { signer, .. } => Some(*signer),
        }
    }

    /// Hex reference to the off-chain metadata record, present only when a
    /// record was found.
    pub fn meta_hash(&self) -> Option<String> {
        match self {
            Verification::NotFound => None,
            Verification::Found { meta_hash, .. } => Some(hex::encode(meta_hash)),
        }
    }

    pub fn level(&self) -> i64 {
        match self {
            Verification::NotFound => 0,
            Verification::Found { level, .. } => *level,
        }
    }
}
