//! Registry client.
//!
//! Wraps the HTTP backend that stores off-chain artifact metadata, publisher
//! identity, and per-publisher signing quota. Also carries the
//! fire-and-forget tracking channel, whose failures are logged and swallowed.

use std::sync::Arc;

use alloy::primitives::Address;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::Config;
use crate::error::{Result, VerisealError};
use crate::metadata::ArtifactMetadata;
use crate::verification::Status;

/// Structured error body returned by the backend on non-200 responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistryErrorBody {
    #[serde(default)]
    pub status: u16,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub error: String,
}

#[derive(Debug, Deserialize)]
struct CountResponse {
    count: u64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
}

#[derive(Debug, Deserialize)]
struct WalletSyncResponse {
    synced: bool,
}

#[derive(Debug, Serialize)]
struct AuthRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// Analytics event, best-effort only.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingEvent {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
}

impl TrackingEvent {
    pub fn named(name: &str) -> Self {
        TrackingEvent {
            name: name.to_string(),
            hash: None,
            artifact_name: None,
            status: None,
        }
    }

    pub fn sign(hash: &str, artifact_name: &str, status: Status) -> Self {
        TrackingEvent {
            name: "VERISEAL_SIGN".to_string(),
            hash: Some(hash.to_string()),
            artifact_name: Some(artifact_name.to_string()),
            status: Some(status),
        }
    }

    pub fn verify(hash: &str, artifact_name: &str) -> Self {
        TrackingEvent {
            name: "VERISEAL_VERIFY".to_string(),
            hash: Some(hash.to_string()),
            artifact_name: Some(artifact_name.to_string()),
            status: None,
        }
    }
}

/// Backend operations consumed by the engines.
#[async_trait]
pub trait Registry: Send + Sync {
    /// Exchanges publisher credentials for a session token.
    async fn authenticate(&self, email: &str, password: &str) -> Result<String>;

    /// Whether the backend still accepts a session token.
    async fn check_token(&self, token: &str) -> Result<bool>;

    /// Remaining signing operations for the publisher. Never cached by
    /// callers; fetched fresh immediately before gating a sign attempt.
    async fn remaining_sign_ops(&self, token: &str) -> Result<u64>;

    /// Backend-reported readiness of a signer account to transact.
    async fn wallet_synced(&self, address: Address) -> Result<bool>;

    /// Persists artifact metadata. Idempotent on `(hash, publisherKey)`.
    async fn create_artifact(&self, token: &str, metadata: &ArtifactMetadata) -> Result<()>;

    /// Loads artifact metadata by fingerprint and metadata reference.
    async fn load_artifact(&self, hash: &str, meta_hash: &str) -> Result<ArtifactMetadata>;

    /// Delivers one analytics event. Callers treat failures as non-fatal.
    async fn track(&self, token: Option<&str>, event: &TrackingEvent) -> Result<()>;
}

/// Emits a tracking event on a detached task so its latency and failures
/// can never affect the calling flow.
pub fn spawn_track(registry: Arc<dyn Registry>, token: Option<String>, event: TrackingEvent) {
    tokio::spawn(async move {
        if let Err(e) = registry.track(token.as_deref(), &event).await {
            warn!(event = %event.name, error = %e, "tracking event dropped");
        }
    });
}

/// HTTP implementation of [`Registry`].
pub struct HttpRegistry {
    base: String,
    http: reqwest::Client,
}

impl HttpRegistry {
    pub fn new(config: &Config) -> Self {
        HttpRegistry {
            base: config.api_endpoint.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1{path}", self.base)
    }

    async fn fail(response: reqwest::Response) -> VerisealError {
        let status = response.status().as_u16();
        let body: RegistryErrorBody = response.json().await.unwrap_or_default();
        let message = if body.message.is_empty() {
            body.error
        } else {
            body.message
        };
        VerisealError::Registry { status, message }
    }

    fn transport(e: reqwest::Error) -> VerisealError {
        VerisealError::RegistryUnavailable(e.to_string())
    }
}

#[async_trait]
impl Registry for HttpRegistry {
    async fn authenticate(&self, email: &str, password: &str) -> Result<String> {
        let response = self
            .http
            .post(self.url("/publisher/auth"))
            .json(&AuthRequest { email, password })
            .send()
            .await
            .map_err(Self::transport)?;
        if !response.status().is_success() {
            return Err(Self::fail(response).await);
        }
        let token: TokenResponse = response.json().await.map_err(Self::transport)?;
        Ok(token.token)
    }

    async fn check_token(&self, token: &str) -> Result<bool> {
        let response = self
            .http
            .get(self.url("/publisher/auth/check"))
            .bearer_auth(token)
            .send()
            .await
            .map_err(Self::transport)?;
        Ok(response.status().is_success())
    }

    async fn remaining_sign_ops(&self, token: &str) -> Result<u64> {
        let response = self
            .http
            .get(self.url("/artifact/remaining-sign-operations"))
            .bearer_auth(token)
            .send()
            .await
            .map_err(Self::transport)?;
        if !response.status().is_success() {
            return Err(Self::fail(response).await);
        }
        let count: CountResponse = response.json().await.map_err(Self::transport)?;
        Ok(count.count)
    }

    async fn wallet_synced(&self, address: Address) -> Result<bool> {
        let response = self
            .http
            .get(self.url("/artifact"))
            .query(&[("wallet-address", format!("{address:#x}"))])
            .send()
            .await
            .map_err(Self::transport)?;
        if !response.status().is_success() {
            return Err(Self::fail(response).await);
        }
        let sync: WalletSyncResponse = response.json().await.map_err(Self::transport)?;
        Ok(sync.synced)
    }

    async fn create_artifact(&self, token: &str, metadata: &ArtifactMetadata) -> Result<()> {
        let response = self
            .http
            .post(self.url("/artifact"))
            .bearer_auth(token)
            .json(metadata)
            .send()
            .await
            .map_err(Self::transport)?;
        if !response.status().is_success() {
            return Err(Self::fail(response).await);
        }
        Ok(())
    }

    async fn load_artifact(&self, hash: &str, meta_hash: &str) -> Result<ArtifactMetadata> {
        let response = self
            .http
            .get(self.url(&format!("/artifact/{hash}")))
            .query(&[("metaHash", meta_hash)])
            .send()
            .await
            .map_err(Self::transport)?;
        if !response.status().is_success() {
            return Err(Self::fail(response).await);
        }
        response.json().await.map_err(Self::transport)
    }

    async fn track(&self, token: Option<&str>, event: &TrackingEvent) -> Result<()> {
        let mut request = self.http.post(self.url("/tracking-event/publisher"));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        let response = request.json(event).send().await.map_err(Self::transport)?;
        if !response.status().is_success() {
            return Err(Self::fail(response).await);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_body_decodes_backend_shape() {
        let body: RegistryErrorBody = serde_json::from_str(
            r#"{
                "status": 402,
                "message": "no remaining sign operations",
                "path": "/v1/artifact",
                "timestamp": "2026-02-01T10:00:00Z",
                "error": "Payment Required"
            }"#,
        )
        .unwrap();
        assert_eq!(body.status, 402);
        assert_eq!(body.message, "no remaining sign operations");
    }

    #[test]
    fn error_body_tolerates_missing_fields() {
        let body: RegistryErrorBody = serde_json::from_str("{}").unwrap();
        assert_eq!(body.status, 0);
        assert!(body.message.is_empty());
    }

    #[test]
    fn tracking_event_serializes_camel_case() {
        let event = TrackingEvent::sign("0xabc", "release.bin", Status::Trusted);
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"name\":\"VERISEAL_SIGN\""));
        assert!(json.contains("\"artifactName\":\"release.bin\""));
        assert!(json.contains("\"TRUSTED\""));
    }

    #[test]
    fn verify_event_omits_status() {
        let json = serde_json::to_string(&TrackingEvent::verify("0xabc", "a")).unwrap();
        assert!(!json.contains("status"));
    }

    #[test]
    fn urls_are_rooted_at_v1() {
        let config = Config::for_stage(crate::config::Stage::Production).unwrap();
        let registry = HttpRegistry::new(&config);
        assert_eq!(
            registry.url("/artifact/remaining-sign-operations"),
            "https://api.veriseal.io/foundation/v1/artifact/remaining-sign-operations"
        );
    }
}
