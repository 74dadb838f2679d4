//! Off-chain artifact metadata, the registry-side record of a notarization.

use alloy::primitives::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::artifact::Artifact;
use crate::error::{Result, VerisealError};
use crate::verification::{Status, Verification, Visibility};

/// Descriptive record persisted to the registry once per successful sign and
/// read many times during verification. The idempotency key on the backend
/// is `(hash, publisher_key)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactMetadata {
    pub hash: String,
    /// Reference to this record used by ledger verification lookups.
    pub meta_hash: String,
    /// Lowercased ledger address of the publisher.
    pub publisher_key: String,
    pub name: String,
    pub size: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    pub visibility: Visibility,
    pub status: Status,
    pub level: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl ArtifactMetadata {
    /// Builds the registry record from the artifact and its confirmed
    /// ledger verification. Fails if the verification is the not-found
    /// sentinel, which carries no metadata reference.
    pub fn from_verification(
        artifact: &Artifact,
        publisher: Address,
        record: &Verification,
        visibility: Visibility,
    ) -> Result<Self> {
        let meta_hash = record.meta_hash().ok_or_else(|| {
            VerisealError::InvalidArtifact("no ledger record to persist metadata for".into())
        })?;
        Ok(ArtifactMetadata {
            hash: artifact.hash.clone(),
            meta_hash,
            publisher_key: format!("{publisher:#x}"),
            name: artifact.name.clone(),
            size: artifact.size,
            kind: artifact.kind.clone(),
            content_type: artifact.content_type.clone(),
            visibility,
            status: record.status(),
            level: record.level(),
            created_at: None,
        })
    }
}
