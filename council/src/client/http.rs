//! HTTP implementation of [`CouncilBackend`].

use std::time::Instant;

use async_trait::async_trait;
use tracing::debug;

use super::{extract_summary, ClassifyRequest, ClassifyResponse, CouncilBackend, SummaryRequest};
use crate::config::CouncilConfig;
use crate::error::{CouncilError, CouncilResult};

/// Debate service reached over HTTP/JSON.
pub struct HttpBackend {
    client: reqwest::Client,
    classify_url: String,
    summary_url: String,
}

impl HttpBackend {
    /// Build a backend from configuration.
    pub fn from_config(config: &CouncilConfig) -> CouncilResult<Self> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| CouncilError::config(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            classify_url: config.classify_url(),
            summary_url: config.summary_url(),
        })
    }

    async fn post_json<B: serde::Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
    ) -> CouncilResult<reqwest::Response> {
        let response = self.client.post(url).json(body).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(CouncilError::HttpStatus { status, body });
        }
        Ok(response)
    }
}

#[async_trait]
impl CouncilBackend for HttpBackend {
    async fn classify(&self, query: &str, history: &str) -> CouncilResult<ClassifyResponse> {
        let start = Instant::now();
        let request = ClassifyRequest {
            query: query.to_string(),
            history: history.to_string(),
        };

        let response = self.post_json(&self.classify_url, &request).await?;
        let text = response.text().await?;
        let parsed: ClassifyResponse =
            serde_json::from_str(&text).map_err(|e| CouncilError::ParseError(e.to_string()))?;

        debug!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            bytes = text.len(),
            "classify call returned"
        );
        Ok(parsed)
    }

    async fn summarize(&self, query: &str, resp: &str) -> CouncilResult<String> {
        let request = SummaryRequest {
            query: query.to_string(),
            resp: resp.to_string(),
        };

        let response = self.post_json(&self.summary_url, &request).await?;
        let payload: serde_json::Value = response.json().await?;

        extract_summary(&payload)
            .ok_or_else(|| CouncilError::ParseError("summary payload has no text field".to_string()))
    }
}
