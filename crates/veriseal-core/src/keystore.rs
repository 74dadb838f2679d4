//! Encrypted signing-key storage.
//!
//! Keys live as Web3 JSON keystore files in a directory, one per ledger
//! address, encrypted at rest with a passphrase. The file is located (and
//! its presence checked) separately from decryption so the engine can gate
//! on key availability before asking for network resources.

use std::path::{Path, PathBuf};

use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;

use crate::error::{Result, VerisealError};

/// Encrypted key material for one signer, located but not yet decrypted.
#[derive(Debug, Clone)]
pub struct KeyMaterial {
    pub address: Address,
    pub path: PathBuf,
}

/// A directory of encrypted keystore files, named `<address>.json` with the
/// address in lowercase hex.
#[derive(Debug, Clone)]
pub struct Keychain {
    dir: PathBuf,
}

impl Keychain {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Keychain { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Locates the encrypted key material for a signer address.
    pub fn open(&self, address: Address) -> Result<KeyMaterial> {
        let path = self.dir.join(format!("{address:#x}.json"));
        if !path.is_file() {
            return Err(VerisealError::KeyNotFound(format!("{address:#x}")));
        }
        Ok(KeyMaterial { address, path })
    }

    /// Lists the signer addresses present in the keychain, sorted, so the
    /// first entry is a stable default signer.
    pub fn addresses(&self) -> Vec<Address> {
        let Ok(entries) = std::fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        let mut addresses: Vec<Address> = entries
            .filter_map(|e| e.ok())
            .filter_map(|e| {
                let name = e.file_name();
                let name = name.to_str()?;
                name.strip_suffix(".json")?.parse().ok()
            })
            .collect();
        addresses.sort();
        addresses
    }

    /// Decrypts key material into a transaction signer.
    pub fn decrypt(&self, material: &KeyMaterial, passphrase: &str) -> Result<PrivateKeySigner> {
        let signer = PrivateKeySigner::decrypt_keystore(&material.path, passphrase)
            .map_err(|e| {
                VerisealError::KeyNotFound(format!(
                    "cannot decrypt keystore for {:#x}: {e}",
                    material.address
                ))
            })?;
        if signer.address() != material.address {
            return Err(VerisealError::KeyNotFound(format!(
                "keystore {} decrypts to {:#x}, not {:#x}",
                material.path.display(),
                signer.address(),
                material.address
            )));
        }
        Ok(signer)
    }
}
