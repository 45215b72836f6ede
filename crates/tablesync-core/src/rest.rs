//! REST adapter for the catalog client capability.
//!
//! The adapter speaks a small JSON contract:
//!
//! | Call | Route |
//! |---|---|
//! | get database | `GET /v1/databases/{database}` |
//! | create database | `POST /v1/databases` |
//! | get table | `GET /v1/databases/{database}/tables/{table}` |
//! | create table | `POST /v1/databases/{database}/tables` |
//! | update table | `PUT /v1/databases/{database}/tables/{table}` |
//!
//! Transient transport failures (connect errors, timeouts, 429 and 5xx
//! responses) are retried up to a fixed ceiling. Every other failure is
//! returned on the first attempt.
//!
//! A retried create may find that an earlier attempt already committed: the
//! catalog applied the write but the response never arrived. A conflict on a
//! retried create therefore counts as success.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use metrics::counter;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;

use crate::catalog::{
    CatalogClient, CreateDatabaseRequest, CreateTableRequest, GetDatabaseRequest, GetTableRequest,
    UpdateTableRequest,
};
use crate::credentials::CredentialProvider;
use crate::error::{CatalogError, Result};
use crate::model::{DatabaseRecord, TableMetadataRecord};

/// Catalog retry counter.
pub const CATALOG_RETRY_TOTAL: &str = "tablesync_catalog_retry_total";

/// Hard upper bound on attempts per request, whatever the configuration says.
pub const MAX_ATTEMPTS_CEILING: u32 = 10;

/// Configuration for [`RestCatalogClient`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestCatalogConfig {
    /// Catalog service base URL.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Attempts per request, including the first one.
    pub max_attempts: u32,
    /// Linear backoff step between attempts, in milliseconds.
    pub retry_backoff_ms: u64,
}

impl Default for RestCatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8181".to_string(),
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            max_attempts: 3,
            retry_backoff_ms: 200,
        }
    }
}

/// Error raised for unusable configuration values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid configuration: {0}")]
pub struct ConfigError(pub String);

impl RestCatalogConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is empty or unparsable, or if
    /// `max_attempts` is zero.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError("catalog base URL must not be empty".to_string()));
        }
        Url::parse(&self.base_url)
            .map_err(|e| ConfigError(format!("catalog base URL {}: {e}", self.base_url)))?;
        if self.max_attempts == 0 {
            return Err(ConfigError("max_attempts must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Attempts per request after applying [`MAX_ATTEMPTS_CEILING`].
    #[must_use]
    pub fn effective_max_attempts(&self) -> u32 {
        self.max_attempts.clamp(1, MAX_ATTEMPTS_CEILING)
    }
}

/// Catalog client backed by the JSON REST contract.
pub struct RestCatalogClient {
    http: Client,
    base_url: Url,
    token: Option<String>,
    config: RestCatalogConfig,
}

impl fmt::Debug for RestCatalogClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestCatalogClient")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("config", &self.config)
            .finish()
    }
}

impl RestCatalogClient {
    /// Creates a client with an optional bearer token.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be constructed.
    pub fn new(config: RestCatalogConfig, token: Option<String>) -> Result<Self> {
        config.validate().map_err(|e| CatalogError::Internal {
            message: e.to_string(),
        })?;
        let base_url = Url::parse(&config.base_url).map_err(|e| CatalogError::Internal {
            message: format!("invalid catalog base URL {}: {e}", config.base_url),
        })?;
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| CatalogError::Internal {
                message: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            base_url,
            token,
            config,
        })
    }

    /// Creates a client whose bearer token is the session token of freshly
    /// fetched credentials. Build a new client when credentials rotate.
    ///
    /// # Errors
    ///
    /// Returns an error if credentials cannot be obtained or the client cannot
    /// be constructed.
    pub async fn from_provider(
        config: RestCatalogConfig,
        provider: &dyn CredentialProvider,
    ) -> Result<Self> {
        let credentials = provider.credentials().await?;
        Self::new(config, credentials.session_token.clone())
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|()| CatalogError::Internal {
                message: format!("catalog base URL cannot hold a path: {}", self.base_url),
            })?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<F>(
        &self,
        operation: &'static str,
        target: &Target<'_>,
        build: F,
    ) -> Result<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        self.send_counted(operation, target, build).await.0
    }

    /// Sends a create. A conflict after a retry means an earlier attempt
    /// committed, so it is reported as success.
    async fn send_create<F>(
        &self,
        operation: &'static str,
        target: &Target<'_>,
        build: F,
    ) -> Result<()>
    where
        F: Fn() -> RequestBuilder,
    {
        match self.send_counted(operation, target, build).await {
            (Ok(_), _) => Ok(()),
            (Err(err), attempts) if attempts > 1 && err.is_already_exists() => {
                tracing::warn!(
                    operation,
                    attempts,
                    entity = target.entity,
                    name = target.name,
                    "Create conflicted on retry; an earlier attempt committed"
                );
                Ok(())
            }
            (Err(err), _) => Err(err),
        }
    }

    /// Sends with retries and reports how many attempts were made.
    async fn send_counted<F>(
        &self,
        operation: &'static str,
        target: &Target<'_>,
        build: F,
    ) -> (Result<Response>, u32)
    where
        F: Fn() -> RequestBuilder,
    {
        let max_attempts = self.config.effective_max_attempts();
        let mut attempt = 1;
        loop {
            let result = match self.authorize(build()).send().await {
                Ok(response) => check_status(response, target).await,
                Err(err) => Err(map_transport_error(&err)),
            };
            match result {
                Err(err) if err.is_retryable() && attempt < max_attempts => {
                    tracing::warn!(
                        operation,
                        attempt,
                        max_attempts,
                        error = %err,
                        "Retrying catalog request after transient failure"
                    );
                    counter!(CATALOG_RETRY_TOTAL, "operation" => operation).increment(1);
                    tokio::time::sleep(Duration::from_millis(self.config.retry_backoff_ms) * attempt)
                        .await;
                    attempt += 1;
                }
                other => return (other, attempt),
            }
        }
    }
}

/// What a request addresses, used to build not-found / already-exists errors.
struct Target<'a> {
    entity: &'static str,
    name: &'a str,
}

async fn check_status(response: Response, target: &Target<'_>) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = format!("catalog returned {status}: {body}");
    Err(match status {
        StatusCode::NOT_FOUND => CatalogError::NotFound {
            entity: target.entity,
            name: target.name.to_string(),
        },
        StatusCode::CONFLICT => CatalogError::AlreadyExists {
            entity: target.entity,
            name: target.name.to_string(),
        },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => CatalogError::AccessDenied { message },
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            CatalogError::Rejected { message }
        }
        StatusCode::TOO_MANY_REQUESTS => CatalogError::transient(message),
        s if s.is_server_error() => CatalogError::transient(message),
        _ => CatalogError::Transport {
            message,
            retryable: false,
        },
    })
}

fn map_transport_error(err: &reqwest::Error) -> CatalogError {
    if err.is_decode() {
        return CatalogError::Serialization {
            message: err.to_string(),
        };
    }
    CatalogError::Transport {
        message: err.to_string(),
        retryable: err.is_timeout() || err.is_connect() || err.is_request(),
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| map_transport_error(&e))?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[async_trait]
impl CatalogClient for RestCatalogClient {
    async fn get_database(&self, request: &GetDatabaseRequest) -> Result<DatabaseRecord> {
        let url = self.url(&["v1", "databases", &request.name])?;
        let target = Target {
            entity: "database",
            name: &request.name,
        };
        let response = self
            .send("get_database", &target, || self.http.get(url.clone()))
            .await?;
        decode(response).await
    }

    async fn create_database(&self, request: &CreateDatabaseRequest) -> Result<()> {
        let url = self.url(&["v1", "databases"])?;
        let target = Target {
            entity: "database",
            name: &request.name,
        };
        self.send_create("create_database", &target, || {
            self.http.post(url.clone()).json(request)
        })
        .await
    }

    async fn get_table(&self, request: &GetTableRequest) -> Result<TableMetadataRecord> {
        let url = self.url(&["v1", "databases", &request.database, "tables", &request.name])?;
        let qualified = format!("{}.{}", request.database, request.name);
        let target = Target {
            entity: "table",
            name: &qualified,
        };
        let response = self
            .send("get_table", &target, || self.http.get(url.clone()))
            .await?;
        decode(response).await
    }

    async fn create_table(&self, request: &CreateTableRequest) -> Result<()> {
        let url = self.url(&["v1", "databases", &request.database, "tables"])?;
        let qualified = format!("{}.{}", request.database, request.table.name);
        let target = Target {
            entity: "table",
            name: &qualified,
        };
        self.send_create("create_table", &target, || {
            self.http.post(url.clone()).json(&request.table)
        })
        .await
    }

    async fn update_table(&self, request: &UpdateTableRequest) -> Result<()> {
        let url = self.url(&[
            "v1",
            "databases",
            &request.database,
            "tables",
            &request.table.name,
        ])?;
        let qualified = format!("{}.{}", request.database, request.table.name);
        let target = Target {
            entity: "table",
            name: &qualified,
        };
        self.send("update_table", &target, || {
            self.http.put(url.clone()).json(&request.table)
        })
        .await?;
        Ok(())
    }
}
