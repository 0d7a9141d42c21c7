use crate::config::AnalysisConfig;
use crate::constants::http;
use crate::errors::FunctionError;
use anyhow::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Serialize)]
struct AnalysisRequest {
    batch_size: u32,
}

/// Reply of the analysis function: how many posts were scored in this batch
/// and how many are still waiting.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisOutcome {
    #[serde(default)]
    pub analyzed: u32,
    #[serde(default)]
    pub failed: u32,
    #[serde(default)]
    pub remaining: Option<u32>,
}

/// Thin client for the serverless analysis function. The function owns the
/// LLM prompts and scoring; this side only requests a batch and passes the
/// JSON reply through.
pub struct AnalysisService {
    function_url: String,
    api_key: Option<String>,
    client: Client,
}

impl AnalysisService {
    pub fn new(config: &AnalysisConfig) -> Self {
        let client = Client::builder()
            .timeout(http::REQUEST_TIMEOUT)
            .connect_timeout(http::CONNECT_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client for AnalysisService");

        Self {
            function_url: config.function_url.clone(),
            api_key: config.api_key.clone(),
            client,
        }
    }

    /// Ask the analysis function to score the next batch of unscored posts.
    pub async fn run_batch(&self, batch_size: u32) -> Result<AnalysisOutcome> {
        if self.function_url.is_empty() {
            return Err(FunctionError::RequestFailed {
                endpoint: "analysis".to_string(),
                reason: "no function URL configured".to_string(),
            }
            .into());
        }

        info!("Requesting analysis batch of {} posts", batch_size);

        let mut request = self
            .client
            .post(&self.function_url)
            .json(&AnalysisRequest { batch_size });
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

        let outcome: AnalysisOutcome =
            response
                .json()
                .await
                .map_err(|e| FunctionError::InvalidResponse {
                    endpoint: self.function_url.clone(),
                    reason: e.to_string(),
                })?;

        info!(
            "Analysis batch finished: {} analyzed, {} failed, {} remaining",
            outcome.analyzed,
            outcome.failed,
            outcome
                .remaining
                .map(|r| r.to_string())
                .unwrap_or_else(|| "unknown".to_string())
        );

        Ok(outcome)
    }
}
