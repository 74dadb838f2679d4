//! veriseal core - notarization engine and verification resolver.
//!
//! A publisher attaches a cryptographically verifiable trust assertion to a
//! content-addressed artifact by writing `(hash, status)` to a permissioned
//! ledger; any party can later resolve whether an artifact carries a trusted
//! assertion from a particular signer, organisation, or the best available
//! signer. The ledger gateway and registry client are the only components
//! with network access; both engines are generic over them.

pub mod artifact;
pub mod config;
pub mod error;
pub mod identity;
pub mod keystore;
pub mod ledger;
pub mod metadata;
pub mod notarize;
pub mod registry;
pub mod verification;
pub mod verify;

pub use alloy::primitives::Address;
pub use artifact::Artifact;
pub use config::{Config, Stage};
pub use error::{Result, VerisealError};
pub use identity::Identity;
pub use keystore::Keychain;
pub use ledger::{EvmLedger, Ledger, PollOutcome};
pub use metadata::ArtifactMetadata;
pub use notarize::Notarizer;
pub use registry::{HttpRegistry, Registry, TrackingEvent};
pub use verification::{Status, Verification, Visibility};
pub use verify::{Resolver, VerifyReport};
