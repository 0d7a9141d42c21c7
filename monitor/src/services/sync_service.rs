use crate::config::SyncConfig;
use crate::constants::http;
use crate::errors::FunctionError;
use anyhow::Result;
use reqwest::Client;
use serde::Deserialize;
use tracing::info;

/// Reply of the sync function: how many new posts were pulled in from the
/// external source and how many rows were already known.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncOutcome {
    #[serde(default)]
    pub imported: u32,
    #[serde(default)]
    pub skipped: u32,
}

/// Thin client for the serverless source-sync function. The import logic
/// lives behind the endpoint; this side only triggers it and passes the
/// JSON reply through.
pub struct SyncService {
    function_url: String,
    api_key: Option<String>,
    client: Client,
}

impl SyncService {
    pub fn new(config: &SyncConfig) -> Self {
        let client = Client::builder()
            .timeout(http::REQUEST_TIMEOUT)
            .connect_timeout(http::CONNECT_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client for SyncService");

        Self {
            function_url: config.function_url.clone(),
            api_key: config.api_key.clone(),
            client,
        }
    }

    /// Ask the sync function to pull new posts from the external source.
    pub async fn run_sync(&self) -> Result<SyncOutcome> {
        if self.function_url.is_empty() {
            return Err(FunctionError::RequestFailed {
                endpoint: "sync".to_string(),
                reason: "no function URL configured".to_string(),
            }
            .into());
        }

        info!("Requesting source sync");

        let mut request = self.client.post(&self.function_url);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| FunctionError::RequestFailed {
            endpoint: self.function_url.clone(),
            reason: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FunctionError::BadStatus {
                endpoint: self.function_url.clone(),
                status: status.as_u16(),
            }
            .into());
        }

        let outcome: SyncOutcome =
            response
                .json()
                .await
                .map_err(|e| FunctionError::InvalidResponse {
                    endpoint: self.function_url.clone(),
                    reason: e.to_string(),
                })?;

        info!(
            "Source sync finished: {} imported, {} skipped",
            outcome.imported, outcome.skipped
        );

        Ok(outcome)
    }
}
