//! Question answering against a hosted knowledge base.

mod azure;

pub use azure::AzureQnaClient;

use crate::error::Result;
use async_trait::async_trait;
use serde::Deserialize;

/// A single ranked answer returned by the knowledge base.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeAnswer {
    /// Natural-language answer text.
    pub answer: String,
    /// Service-assigned confidence in [0, 1]; diagnostic only, never shown.
    #[serde(default)]
    pub confidence_score: f64,
    /// Knowledge-base source document this answer came from.
    #[serde(default)]
    pub source: Option<String>,
}

/// Trait for question answering services.
#[async_trait]
pub trait QuestionAnswerer: Send + Sync {
    /// Submit a question and return the answers in service ranking order.
    async fn get_answers(&self, question: &str) -> Result<Vec<KnowledgeAnswer>>;
}
