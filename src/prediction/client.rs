//! HTTP implementation of the prediction client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};

use super::{PredictionClient, PredictionResult};
use crate::error::PredictionError;
use crate::survey::state::CollectedAnswers;

/// Prediction endpoint configuration.
#[derive(Debug, Clone)]
pub struct PredictionConfig {
    pub endpoint: String,
    /// Sent as a bearer token when present.
    pub api_key: Option<SecretString>,
    pub timeout: Duration,
}

/// POSTs the answer mapping as JSON to the configured endpoint.
pub struct HttpPredictionClient {
    client: Client,
    config: PredictionConfig,
}

impl HttpPredictionClient {
    pub fn new(config: PredictionConfig) -> Result<Self, PredictionError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PredictionError::Unreachable {
                reason: format!("Failed to build reqwest client: {e}"),
            })?;
        Ok(Self { client, config })
    }

    /// Add Authorization header if an API key is configured.
    fn add_auth_header(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_key {
            Some(key) => request.bearer_auth(key.expose_secret()),
            None => request,
        }
    }
}

#[async_trait]
impl PredictionClient for HttpPredictionClient {
    async fn predict(&self, answers: &CollectedAnswers) -> Result<PredictionResult, PredictionError> {
        tracing::debug!(
            endpoint = %self.config.endpoint,
            features = answers.len(),
            "Submitting answers for prediction"
        );

        let request = self.client.post(&self.config.endpoint).json(answers);
        let request = self.add_auth_header(request);

        let response = request.send().await.map_err(|e| {
            tracing::error!("Prediction request failed: {}", e);
            PredictionError::Unreachable {
                reason: e.to_string(),
            }
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            tracing::error!("Failed to read prediction response body: {}", e);
            PredictionError::Unreachable {
                reason: format!("Failed to read response: {e}"),
            }
        })?;

        if !status.is_success() {
            tracing::error!(status = status.as_u16(), "Prediction endpoint returned an error");
            return Err(PredictionError::HttpStatus {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let value: serde_json::Value =
            serde_json::from_str(&body).map_err(|e| PredictionError::InvalidResponse {
                reason: format!(
                    "JSON parse error: {}. Raw: {}",
                    e,
                    body.chars().take(200).collect::<String>()
                ),
            })?;

        let result = PredictionResult::from_json(&value);
        tracing::info!(
            depression = ?result.depression_probability,
            anxiety = ?result.anxiety_probability,
            "Prediction received"
        );
        Ok(result)
    }
}
