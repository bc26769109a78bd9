//! Azure custom question answering client.
//!
//! Talks to the query-knowledgebases REST operation of an Azure Language
//! resource. Every failure, transport or service, is reported as a
//! request error carrying the most specific message available, so the
//! interactive session can surface it and keep running.

use super::{KnowledgeAnswer, QuestionAnswerer};
use crate::config::Settings;
use crate::error::{Result, SvarError};
use crate::http::{create_client_with_timeout, SUBSCRIPTION_KEY_HEADER};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

/// REST API version for the query-knowledgebases operation.
const API_VERSION: &str = "2021-10-01";

/// Client for the Azure custom question answering REST API.
pub struct AzureQnaClient {
    client: reqwest::Client,
    endpoint: String,
    key: String,
    project_name: String,
    deployment_name: String,
    top: Option<u32>,
    confidence_threshold: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    question: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    top: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    confidence_score_threshold: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    answers: Vec<KnowledgeAnswer>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    code: Option<String>,
    message: String,
}

impl AzureQnaClient {
    /// Create a client for the project named in the settings.
    pub fn new(settings: &Settings) -> Self {
        Self {
            client: create_client_with_timeout(Duration::from_secs(settings.qna.timeout_secs)),
            endpoint: settings.azure.endpoint.trim_end_matches('/').to_string(),
            key: settings.azure.key.clone(),
            project_name: settings.azure.project_name.clone(),
            deployment_name: settings.azure.deployment_name.clone(),
            top: settings.qna.top,
            confidence_threshold: settings.qna.confidence_threshold,
        }
    }
}

#[async_trait]
impl QuestionAnswerer for AzureQnaClient {
    #[instrument(skip(self, question))]
    async fn get_answers(&self, question: &str) -> Result<Vec<KnowledgeAnswer>> {
        debug!("Querying project '{}'", self.project_name);

        let body = QueryRequest {
            question,
            top: self.top,
            confidence_score_threshold: self.confidence_threshold,
        };

        let response = self
            .client
            .post(format!("{}/language/:query-knowledgebases", self.endpoint))
            .query(&[
                ("projectName", self.project_name.as_str()),
                ("deploymentName", self.deployment_name.as_str()),
                ("api-version", API_VERSION),
            ])
            .header(SUBSCRIPTION_KEY_HEADER, &self.key)
            .json(&body)
            .send()
            .await
            .map_err(|e| SvarError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            // Prefer the service's own error message when the body carries one
            if let Ok(api_error) = serde_json::from_str::<ApiError>(&error_body) {
                let code = api_error.error.code.unwrap_or_default();
                debug!("Service error {} ({})", code, status);
                return Err(SvarError::Request(api_error.error.message));
            }
            return Err(SvarError::Request(format!("HTTP {}: {}", status, error_body)));
        }

        let parsed: QueryResponse = response
            .json()
            .await
            .map_err(|e| SvarError::Request(format!("Invalid response: {}", e)))?;

        debug!("Received {} answer(s)", parsed.answers.len());
        for answer in &parsed.answers {
            debug!(score = answer.confidence_score, source = ?answer.source, "Answer candidate");
        }

        Ok(parsed.answers)
    }
}
