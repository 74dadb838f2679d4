// Local credential store - session token and keystore directory under
// ~/.veriseal/

use std::path::PathBuf;

use anyhow::{Context, Result};
use veriseal_core::{Identity, Keychain};

/// Root of the local configuration directory (~/.veriseal).
pub fn config_dir() -> Result<PathBuf> {
    #[cfg(unix)]
    let home = std::env::var("HOME").context("HOME environment variable not set")?;

    #[cfg(windows)]
    let home = std::env::var("USERPROFILE").context("USERPROFILE environment variable not set")?;

    Ok(PathBuf::from(home).join(".veriseal"))
}

fn token_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("token"))
}

/// Directory of encrypted keystore files (~/.veriseal/keys).
pub fn keystore_dir() -> Result<PathBuf> {
    Ok(config_dir()?.join("keys"))
}

/// Persists the session token with owner-only permissions.
pub fn save_token(token: &str) -> Result<()> {
    let path = token_path()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::write(&path, token)?;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))?;
    }

    #[cfg(not(unix))]
    {
        std::fs::write(&path, token)?;
    }

    Ok(())
}

/// Loads the stored session token, if any.
pub fn load_token() -> Option<String> {
    let path = token_path().ok()?;
    let token = std::fs::read_to_string(path).ok()?;
    let token = token.trim().to_string();
    (!token.is_empty()).then_some(token)
}

/// Assembles the session identity from the stored token and the addresses
/// present in the local keychain.
pub fn load_identity() -> Result<(Identity, Keychain)> {
    let keychain = Keychain::new(keystore_dir()?);
    let identity = Identity::new(None, load_token(), keychain.addresses());
    Ok((identity, keychain))
}
