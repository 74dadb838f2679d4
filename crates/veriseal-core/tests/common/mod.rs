//! Shared fakes and fixtures for engine integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::primitives::{keccak256, Address, B256};
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;

use veriseal_core::metadata::ArtifactMetadata;
use veriseal_core::registry::TrackingEvent;
use veriseal_core::{
    Artifact, Config, Identity, Keychain, Ledger, Notarizer, Registry, Resolver, Stage, Status,
    Verification, VerisealError,
};

pub const META_HASH_BYTE: u8 = 0x5a;

/// In-memory ledger with per-signer records, a configurable pending window,
/// and atomic call counters.
#[derive(Default)]
pub struct FakeLedger {
    /// Records per signer key; the fake serves one artifact fingerprint.
    pub records: Mutex<HashMap<Address, Verification>>,
    /// Record returned by the ledger-wide best-available query.
    pub global_best: Mutex<Option<Verification>>,
    /// How many pending-state queries report "still pending" before the
    /// transaction confirms.
    pub pending_rounds: AtomicU64,
    /// Fail the nth (0-based) pending-state query, simulating a read
    /// permission error mid-poll.
    pub fail_poll_at: Mutex<Option<u64>>,
    pub poll_queries: AtomicU64,
    pub calls: AtomicU64,
    pub submitted: Mutex<Vec<(B256, Status, Address)>>,
    pub orgs: Mutex<HashMap<String, Vec<Address>>>,
}

impl FakeLedger {
    pub fn new() -> Self {
        FakeLedger::default()
    }

    pub fn with_record(self, signer: Address, status: Status, level: i64) -> Self {
        self.records.lock().unwrap().insert(
            signer,
            Verification::Found {
                signer,
                status,
                level,
                meta_hash: B256::repeat_byte(META_HASH_BYTE),
                timestamp: 1_700_000_000,
            },
        );
        self
    }

    pub fn with_org(self, org: &str, members: Vec<Address>) -> Self {
        self.orgs.lock().unwrap().insert(org.to_string(), members);
        self
    }

    pub fn with_global_best(self, signer: Address, status: Status, level: i64) -> Self {
        *self.global_best.lock().unwrap() = Some(Verification::Found {
            signer,
            status,
            level,
            meta_hash: B256::repeat_byte(META_HASH_BYTE),
            timestamp: 1_700_000_000,
        });
        self
    }

    pub fn network_calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Ledger for FakeLedger {
    async fn submit_sign(
        &self,
        signer: PrivateKeySigner,
        hash: B256,
        status: Status,
    ) -> Result<B256, VerisealError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let address = signer.address();
        self.submitted.lock().unwrap().push((hash, status, address));
        // The ledger records the assertion as part of mining the write.
        self.records.lock().unwrap().insert(
            address,
            Verification::Found {
                signer: address,
                status,
                level: 0,
                meta_hash: B256::repeat_byte(META_HASH_BYTE),
                timestamp: 1_700_000_000,
            },
        );
        Ok(keccak256(hash))
    }

    async fn tx_pending(&self, _tx: B256) -> Result<bool, VerisealError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let n = self.poll_queries.fetch_add(1, Ordering::SeqCst);
        if let Some(k) = *self.fail_poll_at.lock().unwrap() {
            if n == k {
                return Err(VerisealError::LedgerUnavailable {
                    endpoint: "fake".into(),
                    reason: "read not permitted".into(),
                });
            }
        }
        Ok(n < self.pending_rounds.load(Ordering::SeqCst))
    }

    async fn verify(&self, _hash: B256) -> Result<Verification, VerisealError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .global_best
            .lock()
            .unwrap()
            .clone()
            .unwrap_or(Verification::NotFound))
    }

    async fn verify_against_key(
        &self,
        _hash: B256,
        signer: Address,
    ) -> Result<Verification, VerisealError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .records
            .lock()
            .unwrap()
            .get(&signer)
            .cloned()
            .unwrap_or(Verification::NotFound))
    }

    async fn org_members(&self, org: &str) -> Result<Vec<Address>, VerisealError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .orgs
            .lock()
            .unwrap()
            .get(org)
            .cloned()
            .unwrap_or_default())
    }
}

/// In-memory registry with a quota counter, wallet-sync switch, and stores
/// for persisted metadata and tracking events.
pub struct FakeRegistry {
    pub quota: AtomicU64,
    pub synced: AtomicBool,
    pub fail_create: AtomicBool,
    pub fail_metadata: AtomicBool,
    pub calls: AtomicU64,
    pub created: Mutex<Vec<ArtifactMetadata>>,
    pub metadata: Mutex<HashMap<String, ArtifactMetadata>>,
    pub tracked: Mutex<Vec<TrackingEvent>>,
}

impl Default for FakeRegistry {
    fn default() -> Self {
        FakeRegistry {
            quota: AtomicU64::new(10),
            synced: AtomicBool::new(true),
            fail_create: AtomicBool::new(false),
            fail_metadata: AtomicBool::new(false),
            calls: AtomicU64::new(0),
            created: Mutex::new(Vec::new()),
            metadata: Mutex::new(HashMap::new()),
            tracked: Mutex::new(Vec::new()),
        }
    }
}

impl FakeRegistry {
    pub fn new() -> Self {
        FakeRegistry::default()
    }

    pub fn with_quota(self, quota: u64) -> Self {
        self.quota.store(quota, Ordering::SeqCst);
        self
    }

    pub fn unsynced(self) -> Self {
        self.synced.store(false, Ordering::SeqCst);
        self
    }

    pub fn network_calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Registry for FakeRegistry {
    async fn authenticate(&self, _email: &str, _password: &str) -> Result<String, VerisealError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok("fake-token".into())
    }

    async fn check_token(&self, token: &str) -> Result<bool, VerisealError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(!token.is_empty())
    }

    async fn remaining_sign_ops(&self, _token: &str) -> Result<u64, VerisealError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.quota.load(Ordering::SeqCst))
    }

    async fn wallet_synced(&self, _address: Address) -> Result<bool, VerisealError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.synced.load(Ordering::SeqCst))
    }

    async fn create_artifact(
        &self,
        _token: &str,
        metadata: &ArtifactMetadata,
    ) -> Result<(), VerisealError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(VerisealError::Registry {
                status: 500,
                message: "metadata store unavailable".into(),
            });
        }
        self.created.lock().unwrap().push(metadata.clone());
        self.metadata
            .lock()
            .unwrap()
            .insert(metadata.hash.clone(), metadata.clone());
        Ok(())
    }

    async fn load_artifact(
        &self,
        hash: &str,
        _meta_hash: &str,
    ) -> Result<ArtifactMetadata, VerisealError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_metadata.load(Ordering::SeqCst) {
            return Err(VerisealError::RegistryUnavailable("connection reset".into()));
        }
        self.metadata
            .lock()
            .unwrap()
            .get(hash)
            .cloned()
            .ok_or(VerisealError::Registry {
                status: 404,
                message: "artifact not found".into(),
            })
    }

    async fn track(
        &self,
        _token: Option<&str>,
        event: &TrackingEvent,
    ) -> Result<(), VerisealError> {
        self.tracked.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// Configuration with polling shrunk to test speed.
pub fn test_config() -> Config {
    let mut config = Config::for_stage(Stage::Production).unwrap();
    config.max_poll_rounds = 5;
    config.poll_interval = Duration::from_millis(1);
    config
}

pub fn test_artifact() -> Artifact {
    Artifact {
        hash: "0xabc".into(),
        name: "release.tar.gz".into(),
        size: 10,
        kind: Some("file".into()),
        content_type: None,
    }
}

pub fn authenticated(keys: Vec<Address>) -> Identity {
    Identity::new(Some("dev@example.com".into()), Some("jwt".into()), keys)
}

/// Creates an encrypted keystore in `dir` and returns its signer address.
pub fn provision_key(dir: &std::path::Path, passphrase: &str) -> Address {
    let mut rng = rand::thread_rng();
    let (signer, _) =
        PrivateKeySigner::new_keystore(dir, &mut rng, passphrase, Some("pending.json")).unwrap();
    let address = signer.address();
    std::fs::rename(
        dir.join("pending.json"),
        dir.join(format!("{address:#x}.json")),
    )
    .unwrap();
    address
}

pub fn notarizer(
    ledger: Arc<FakeLedger>,
    registry: Arc<FakeRegistry>,
    identity: Identity,
    keychain_dir: &std::path::Path,
) -> Notarizer {
    Notarizer::new(
        Arc::new(test_config()),
        ledger,
        registry,
        identity,
        Keychain::new(keychain_dir),
    )
}

pub fn resolver(ledger: Arc<FakeLedger>, registry: Arc<FakeRegistry>) -> Resolver {
    Resolver::new(ledger, registry)
}
