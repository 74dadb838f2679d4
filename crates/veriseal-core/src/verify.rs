//! Verification resolver.
//!
//! Given an artifact fingerprint and zero or more candidate signer keys,
//! deterministically picks the verification record that best represents
//! "is this artifact trusted":
//!
//! 1. organisation member keys, when an organisation was supplied;
//! 2. else explicit caller keys;
//! 3. else the authenticated caller's own keys;
//! 4. else, or when step 3 finds nothing, the best available record across
//!    all signers.
//!
//! "Not trusted" is a normal result, never an error; the resolver fails
//! only on infrastructure problems.

use std::sync::Arc;

use alloy::primitives::{Address, B256};
use serde::Serialize;
use tracing::warn;

use crate::artifact::Artifact;
use crate::error::{Result, VerisealError};
use crate::identity::Identity;
use crate::ledger::{hash_to_bytes32, Ledger};
use crate::metadata::ArtifactMetadata;
use crate::registry::Registry;
use crate::verification::Verification;

/// Resolved verification for one artifact: the winning ledger record plus
/// best-effort off-chain metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerifyReport {
    pub artifact: Artifact,
    pub record: Verification,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ArtifactMetadata>,
}

impl VerifyReport {
    pub fn is_trusted(&self) -> bool {
        self.record.is_trusted()
    }
}

pub struct Resolver {
    ledger: Arc<dyn Ledger>,
    registry: Arc<dyn Registry>,
}

impl Resolver {
    pub fn new(ledger: Arc<dyn Ledger>, registry: Arc<dyn Registry>) -> Self {
        Resolver { ledger, registry }
    }

    /// Resolves the verification record for an artifact.
    ///
    /// `keys` and `org` are mutually exclusive; callers reject the
    /// combination before getting here, and the resolver refuses it too
    /// rather than silently picking one source.
    pub async fn verify(
        &self,
        artifact: &Artifact,
        keys: &[Address],
        org: Option<&str>,
        identity: &Identity,
    ) -> Result<VerifyReport> {
        if org.is_some() && !keys.is_empty() {
            return Err(VerisealError::Config(
                "cannot use both an organisation and explicit keys".into(),
            ));
        }
        artifact.validate()?;
        let hash = hash_to_bytes32(&artifact.hash)?;

        let record = if let Some(org) = org {
            let members = self.ledger.org_members(org).await?;
            self.first_match(hash, &members).await?
        } else if !keys.is_empty() {
            self.first_match(hash, keys).await?
        } else {
            // The caller's own keys first, when authenticated; an artifact
            // unknown to the caller may still be trusted by someone else,
            // so an empty result falls back to the ledger-wide best record.
            let mut record = Verification::NotFound;
            if identity.is_authenticated() && !identity.keys.is_empty() {
                record = self.first_match(hash, &identity.keys).await?;
            }
            if record.is_unknown() {
                record = self.ledger.verify(hash).await?;
            }
            record
        };

        let metadata = self.load_metadata(artifact, &record).await;
        Ok(VerifyReport {
            artifact: artifact.clone(),
            record,
            metadata,
        })
    }

    /// First candidate, in list order, with a non-unknown record. Selection
    /// depends only on candidate order and record content, never on
    /// response latency.
    async fn first_match(&self, hash: B256, candidates: &[Address]) -> Result<Verification> {
        for key in candidates {
            let record = self.ledger.verify_against_key(hash, *key).await?;
            if !record.is_unknown() {
                return Ok(record);
            }
        }
        Ok(Verification::NotFound)
    }

    /// Metadata enrichment is best-effort: a fetch failure yields a report
    /// without metadata rather than failing the verification.
    async fn load_metadata(
        &self,
        artifact: &Artifact,
        record: &Verification,
    ) -> Option<ArtifactMetadata> {
        let meta_hash = record.meta_hash()?;
        match self.registry.load_artifact(&artifact.hash, &meta_hash).await {
            Ok(metadata) => Some(metadata),
            Err(e) => {
                warn!(hash = %artifact.hash, error = %e, "metadata lookup failed");
                None
            }
        }
    }
}
