//! Reconciler construction from CLI configuration.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tablesync_core::{EnvCredentialProvider, RestCatalogClient};
use tablesync_reconcile::{
    ChangeLogAcknowledger, NoopAcknowledger, ReconcileRequest, Reconciler, RestStatementExecutor,
    StatementAcknowledger,
};

use crate::Config;

/// Builds a reconciler backed by the REST catalog.
///
/// One reconciler is built per process; credentials are read once.
///
/// # Errors
///
/// Returns an error if credentials cannot be read or a client cannot be built.
pub async fn build_reconciler(config: &Config) -> Result<Reconciler> {
    let catalog = if config.env_credentials {
        RestCatalogClient::from_provider(config.catalog.clone(), &EnvCredentialProvider)
            .await
            .context("Failed to build catalog client from environment credentials")?
    } else {
        RestCatalogClient::new(config.catalog.clone(), config.catalog_token.clone())
            .context("Failed to build catalog client")?
    };

    let acknowledger: Arc<dyn ChangeLogAcknowledger> = match &config.statement_url {
        Some(url) => {
            let executor = RestStatementExecutor::new(
                url,
                config.statement_token.clone(),
                Duration::from_secs(config.catalog.request_timeout_secs),
            )
            .context("Failed to build statement executor")?;
            Arc::new(StatementAcknowledger::new(executor))
        }
        None => Arc::new(NoopAcknowledger),
    };

    Ok(Reconciler::new(Arc::new(catalog))
        .with_acknowledger(acknowledger)
        .with_config(config.reconcile.clone()))
}

/// Warns about change logs that will not be cleared because no statement
/// endpoint is configured. Returns how many requests are affected.
pub fn warn_unacknowledged(config: &Config, requests: &[ReconcileRequest]) -> usize {
    if config.statement_url.is_some() {
        return 0;
    }
    let mut ignored = 0;
    for request in requests {
        if let Some(handle) = &request.change_log {
            tracing::warn!(
                table = %request.ident,
                handle = %handle,
                "Change log will not be cleared: no statement endpoint configured"
            );
            ignored += 1;
        }
    }
    ignored
}

#[cfg(test)]
mod tests {
    use super::*;

    fn requests() -> Vec<ReconcileRequest> {
        vec![
            ReconcileRequest::new("sales", "orders", "(id int)", "s3://b/o/metadata/v1.json")
                .with_change_log("raw.orders_stream"),
            ReconcileRequest::new("sales", "refunds", "(id int)", "s3://b/r/metadata/v1.json"),
        ]
    }

    #[test]
    fn test_change_log_without_statement_endpoint_is_flagged() {
        assert_eq!(warn_unacknowledged(&Config::default(), &requests()), 1);
    }

    #[test]
    fn test_change_log_with_statement_endpoint_is_not_flagged() {
        let config = Config {
            statement_url: Some("http://warehouse.local/api/statements".into()),
            ..Config::default()
        };
        assert_eq!(warn_unacknowledged(&config, &requests()), 0);
    }
}
