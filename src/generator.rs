use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use crate::config::GeneratorConfig;

/// Context carried from a completed/planned segment to its successor to
/// preserve narrative continuity
///
/// Only the key concepts, index, and processed duration are filled at this
/// layer; the transcript/question/summary fields are always empty here and
/// populated by the generator itself on subsequent calls.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HandoffContext {
    pub key_concepts: Vec<String>,
    pub segment_index: Option<u32>,
    pub total_processed_duration: f64,
    pub last_transcript_segments: Vec<Value>,
    pub last_questions: Vec<Value>,
    pub segment_summary: String,
}

/// Request body for the segment-generation service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub course_id: Uuid,
    pub segment_id: Uuid,
    pub segment_index: u32,
    pub youtube_url: String,
    pub start_time: f64,
    pub end_time: f64,
    pub session_id: Option<String>,
    pub previous_segment_context: HandoffContext,
    pub total_segments: usize,
    pub max_questions: u32,
}

/// Segment-generation collaborator
///
/// Fire-and-dispatch: `generate` returns the service's synchronous
/// acknowledgment that the job was accepted, never the finished work. The
/// generator sets the segment's own completion status through the store.
#[async_trait]
pub trait SegmentGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<Value>;
    async fn is_available(&self) -> bool;
}

/// HTTP implementation of the segment generator
pub struct HttpSegmentGenerator {
    config: GeneratorConfig,
    client: reqwest::Client,
}

impl HttpSegmentGenerator {
    pub fn new(config: GeneratorConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self { config, client })
    }
}

#[async_trait]
impl SegmentGenerator for HttpSegmentGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<Value> {
        debug!(
            "Dispatching segment {} of course {} to generator",
            request.segment_index, request.course_id
        );

        let mut builder = self.client.post(&self.config.endpoint).json(request);
        if let Some(key) = &self.config.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", key));
        }

        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Segment generator error {}: {}", status, text));
        }

        // The acknowledgment body is forwarded verbatim to the caller
        let ack = response.json().await?;
        Ok(ack)
    }

    async fn is_available(&self) -> bool {
        let health_endpoint = self.config.endpoint.replace("/generate-segment", "/health");

        match self.client.get(&health_endpoint).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}
