use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;

use macrolog_core::Error;
use macrolog_core::estimator::FoodEstimator;
use macrolog_core::models::NutrientEstimate;
use macrolog_core::openai::{ChatCompletionRequest, ChatCompletionResponse, response_to_estimate};

/// Chat-completions client for any OpenAI-compatible endpoint.
pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl OpenAiClient {
    pub fn new(api_key: String, model: String, base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(format!("macrolog/{}", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            api_key,
            model,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
        })
    }

    async fn request(&self, description: &str) -> macrolog_core::Result<NutrientEstimate> {
        let body = ChatCompletionRequest::for_description(&self.model, description);
        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::estimation(format!("Failed to reach OpenAI API: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::estimation(format!(
                "OpenAI API returned status {}",
                status.as_u16()
            )));
        }

        let data: ChatCompletionResponse = resp
            .json()
            .await
            .map_err(|e| Error::estimation(format!("Failed to parse OpenAI response: {e}")))?;
        response_to_estimate(data)
    }
}

#[async_trait]
impl FoodEstimator for OpenAiClient {
    async fn estimate(&self, description: &str) -> macrolog_core::Result<NutrientEstimate> {
        let result = self.request(description).await;
        if let Err(ref e) = result {
            tracing::warn!(error = %e, "food estimate failed");
        }
        result
    }
}
