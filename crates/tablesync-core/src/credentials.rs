//! Credential provider interface.
//!
//! Fetching and rotating short-lived credentials belongs to the deployment, not
//! to reconciliation. The engine only needs a way to obtain credentials when a
//! catalog client is constructed.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::{CatalogError, Result};

/// Short-lived access credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionCredentials {
    /// Access key identifier.
    pub access_key_id: String,
    /// Secret access key.
    pub secret_access_key: String,
    /// Session token, when the credentials are temporary.
    pub session_token: Option<String>,
    /// Expiry instant, when known.
    pub expires_at: Option<DateTime<Utc>>,
}

impl SessionCredentials {
    /// Returns true when the credentials have an expiry that has passed.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

impl fmt::Debug for SessionCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[REDACTED]")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Supplies credentials on demand.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Returns credentials valid for at least the next request.
    async fn credentials(&self) -> Result<SessionCredentials>;
}

/// Provider that always returns the same credentials.
#[derive(Debug, Clone)]
pub struct StaticCredentialProvider {
    credentials: SessionCredentials,
}

impl StaticCredentialProvider {
    /// Wraps fixed credentials.
    #[must_use]
    pub fn new(credentials: SessionCredentials) -> Self {
        Self { credentials }
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentialProvider {
    async fn credentials(&self) -> Result<SessionCredentials> {
        if self.credentials.is_expired(Utc::now()) {
            return Err(CatalogError::AccessDenied {
                message: "static credentials have expired".to_string(),
            });
        }
        Ok(self.credentials.clone())
    }
}

/// Provider that reads `TABLESYNC_ACCESS_KEY_ID`, `TABLESYNC_SECRET_ACCESS_KEY`
/// and the optional `TABLESYNC_SESSION_TOKEN` on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentialProvider;

#[async_trait]
impl CredentialProvider for EnvCredentialProvider {
    async fn credentials(&self) -> Result<SessionCredentials> {
        let read = |name: &str| {
            std::env::var(name)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let access_key_id = read("TABLESYNC_ACCESS_KEY_ID").ok_or_else(|| {
            CatalogError::AccessDenied {
                message: "TABLESYNC_ACCESS_KEY_ID is not set".to_string(),
            }
        })?;
        let secret_access_key = read("TABLESYNC_SECRET_ACCESS_KEY").ok_or_else(|| {
            CatalogError::AccessDenied {
                message: "TABLESYNC_SECRET_ACCESS_KEY is not set".to_string(),
            }
        })?;
        Ok(SessionCredentials {
            access_key_id,
            secret_access_key,
            session_token: read("TABLESYNC_SESSION_TOKEN"),
            expires_at: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn credentials(expires_at: Option<DateTime<Utc>>) -> SessionCredentials {
        SessionCredentials {
            access_key_id: "AKIA123".into(),
            secret_access_key: "very-secret".into(),
            session_token: Some("token".into()),
            expires_at,
        }
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let rendered = format!("{:?}", credentials(None));
        assert!(rendered.contains("AKIA123"));
        assert!(!rendered.contains("very-secret"));
        assert!(!rendered.contains("\"token\""));
    }

    #[tokio::test]
    async fn test_static_provider_refuses_expired_credentials() {
        let expired = StaticCredentialProvider::new(credentials(Some(
            Utc::now() - Duration::minutes(5),
        )));
        assert!(expired.credentials().await.is_err());

        let fresh = StaticCredentialProvider::new(credentials(Some(
            Utc::now() + Duration::minutes(5),
        )));
        assert_eq!(
            fresh.credentials().await.expect("fresh").access_key_id,
            "AKIA123"
        );
    }
}
