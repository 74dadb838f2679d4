//! Artifact model and content fingerprinting.

use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Result, VerisealError};

/// A content-addressed object being notarized or checked.
///
/// The fingerprint is immutable; both engines validate it before any
/// network interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// Content digest, hex encoded.
    pub hash: String,
    /// Display name, usually the file name.
    pub name: String,
    /// Size in bytes. Negative sizes are rejected.
    pub size: i64,
    /// Artifact kind reported by the extractor (e.g. "file").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl Artifact {
    /// An artifact known only by its fingerprint.
    pub fn from_hash(hash: impl Into<String>) -> Self {
        let hash = hash.into();
        Artifact {
            name: hash.clone(),
            hash,
            size: 0,
            kind: None,
            content_type: None,
        }
    }

    /// Fingerprints a file with SHA-256.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            VerisealError::InvalidArtifact(format!("cannot read {}: {e}", path.display()))
        })?;
        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Artifact {
            hash: sha256_hex(&bytes),
            name,
            size: bytes.len() as i64,
            kind: Some("file".to_string()),
            content_type: None,
        })
    }

    /// Rejects artifacts that must never reach the network: empty
    /// fingerprints and negative sizes.
    pub fn validate(&self) -> Result<()> {
        if self.hash.is_empty() {
            return Err(VerisealError::InvalidArtifact("hash is missing".into()));
        }
        if self.size < 0 {
            return Err(VerisealError::InvalidArtifact(format!(
                "invalid size {}",
                self.size
            )));
        }
        Ok(())
    }
}

/// Computes the SHA-256 hash of the input bytes as a lowercase hex string.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
