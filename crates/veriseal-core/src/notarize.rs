//! Notarization engine.
//!
//! Orchestrates the sign path: an ordered precondition pipeline, the ledger
//! commit sequence with bounded confirmation polling, and post-commit
//! metadata persistence. The engine holds no mutable state of its own; all
//! durable effects live on the ledger and in the registry.

use std::sync::Arc;

use alloy::primitives::Address;
use tracing::{debug, info};

use crate::artifact::Artifact;
use crate::config::Config;
use crate::error::{Result, VerisealError};
use crate::identity::Identity;
use crate::keystore::{Keychain, KeyMaterial};
use crate::ledger::{hash_to_bytes32, wait_for_tx, Ledger, PollOutcome};
use crate::metadata::ArtifactMetadata;
use crate::registry::{spawn_track, Registry, TrackingEvent};
use crate::verification::{Status, Verification, Visibility};

pub struct Notarizer {
    config: Arc<Config>,
    ledger: Arc<dyn Ledger>,
    registry: Arc<dyn Registry>,
    identity: Identity,
    keychain: Keychain,
}

impl Notarizer {
    pub fn new(
        config: Arc<Config>,
        ledger: Arc<dyn Ledger>,
        registry: Arc<dyn Registry>,
        identity: Identity,
        keychain: Keychain,
    ) -> Self {
        Notarizer {
            config,
            ledger,
            registry,
            identity,
            keychain,
        }
    }

    /// Notarizes an artifact: writes `(hash, status)` to the ledger signed
    /// by `signer`, waits for confirmation, and persists the off-chain
    /// metadata. Returns the canonical verification record as re-read from
    /// the ledger.
    ///
    /// Once the ledger write is confirmed the notarization is permanent; a
    /// metadata persistence failure is surfaced but nothing is rolled back.
    pub async fn sign(
        &self,
        artifact: &Artifact,
        signer: Address,
        passphrase: &str,
        status: Status,
        visibility: Visibility,
    ) -> Result<Verification> {
        let (token, material) = self.preflight(artifact, signer).await?;
        self.commit(artifact, &token, material, passphrase, status, visibility)
            .await
    }

    /// Ordered precondition pipeline; the first failing check wins and each
    /// failure is a distinct error. Checks 1-4 are local so that invalid
    /// requests never touch the network.
    async fn preflight(
        &self,
        artifact: &Artifact,
        signer: Address,
    ) -> Result<(String, KeyMaterial)> {
        // 1. session
        let token = self
            .identity
            .token()
            .ok_or(VerisealError::AuthRequired)?
            .to_string();

        // 2-3. artifact fingerprint and size
        artifact.validate()?;

        // 4. key material present for the requested signer
        let material = self.keychain.open(signer)?;

        // 5. quota, fetched fresh: the count may have changed since any
        // previous call and is enforced here as a pre-flight gate only.
        let remaining = self.registry.remaining_sign_ops(&token).await?;
        if remaining < 1 {
            return Err(VerisealError::QuotaExhausted);
        }
        debug!(remaining, "sign quota");

        // 6. signer account synchronized with the ledger
        if !self.registry.wallet_synced(signer).await? {
            return Err(VerisealError::WalletNotReady {
                artifact: artifact.name.clone(),
            });
        }

        Ok((token, material))
    }

    async fn commit(
        &self,
        artifact: &Artifact,
        token: &str,
        material: KeyMaterial,
        passphrase: &str,
        status: Status,
        visibility: Visibility,
    ) -> Result<Verification> {
        let signer_key = self.keychain.decrypt(&material, passphrase)?;
        let signer = signer_key.address();
        let hash = hash_to_bytes32(&artifact.hash)?;

        let tx = self.ledger.submit_sign(signer_key, hash, status).await?;

        match wait_for_tx(
            self.ledger.as_ref(),
            tx,
            self.config.max_poll_rounds,
            self.config.poll_interval,
        )
        .await
        {
            Ok(PollOutcome::Confirmed) => {}
            Ok(PollOutcome::TimedOut) => {
                return Err(VerisealError::LedgerTimeout {
                    hash: artifact.hash.clone(),
                    rounds: self.config.max_poll_rounds,
                })
            }
            Err(e) => return Err(VerisealError::LedgerPermission(e.to_string())),
        }

        // Re-query for the signer's own key: the canonical record protects
        // against any mismatch between the locally assumed and actually
        // recorded signer.
        let record = self.ledger.verify_against_key(hash, signer).await?;
        if record.is_unknown() {
            return Err(VerisealError::SignSubmissionFailed {
                hash: artifact.hash.clone(),
                reason: "transaction confirmed but the ledger holds no record for the signer"
                    .into(),
            });
        }

        let metadata =
            ArtifactMetadata::from_verification(artifact, signer, &record, visibility)?;
        self.registry.create_artifact(token, &metadata).await?;

        info!(hash = %artifact.hash, signer = %signer, %status, "artifact notarized");

        spawn_track(
            self.registry.clone(),
            Some(token.to_string()),
            TrackingEvent::named("VERISEAL_SIGN"),
        );
        spawn_track(
            self.registry.clone(),
            Some(token.to_string()),
            TrackingEvent::sign(&artifact.hash, &artifact.name, status),
        );

        Ok(record)
    }
}
