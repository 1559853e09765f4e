use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use super::{CourseStore, QuestionStore, SegmentStore, TranscriptStore};
use crate::config::StoreConfig;
use crate::course::Course;
use crate::segment::Segment;

/// HTTP client for the hosted course/segment store
pub struct RestStore {
    config: StoreConfig,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct MarkFailedRequest<'a> {
    segment_ids: &'a [Uuid],
    error_message: &'a str,
}

#[derive(Debug, Serialize)]
struct ClaimRequest<'a> {
    worker_id: &'a str,
    claimed_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct ClaimResponse {
    claimed: bool,
}

#[derive(Debug, Serialize)]
struct DescriptionPatch<'a> {
    description: &'a str,
}

#[derive(Debug, Deserialize)]
struct QuestionCountResponse {
    count: u64,
}

#[derive(Debug, Deserialize)]
struct TranscriptResponse {
    video_summary: Option<String>,
}

impl RestStore {
    pub fn new(config: StoreConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.authorize(self.client.get(self.url(path)))
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.authorize(self.client.post(self.url(path)))
    }

    fn patch(&self, path: &str) -> reqwest::RequestBuilder {
        self.authorize(self.client.patch(self.url(path)))
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_key {
            Some(key) => builder.header("Authorization", format!("Bearer {}", key)),
            None => builder,
        }
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Store API error {}: {}", status, text));
        }
        Ok(response)
    }
}

#[async_trait]
impl CourseStore for RestStore {
    async fn get_course(&self, course_id: Uuid) -> Result<Option<Course>> {
        let response = self.get(&format!("courses/{}", course_id)).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let course = Self::check(response).await?.json().await?;
        Ok(Some(course))
    }

    async fn update_description(&self, course_id: Uuid, description: &str) -> Result<()> {
        debug!("Updating description for course {}", course_id);

        let response = self
            .patch(&format!("courses/{}", course_id))
            .json(&DescriptionPatch { description })
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }
}

#[async_trait]
impl SegmentStore for RestStore {
    async fn list_segments(&self, course_id: Uuid) -> Result<Vec<Segment>> {
        let response = self
            .get(&format!("courses/{}/segments", course_id))
            .send()
            .await?;

        let mut segments: Vec<Segment> = Self::check(response).await?.json().await?;
        // The store orders by segment_index; enforce it anyway since the
        // selector's adjacency checks depend on it.
        segments.sort_by_key(|s| s.segment_index);
        Ok(segments)
    }

    async fn mark_failed(&self, segment_ids: &[Uuid], error_message: &str) -> Result<()> {
        debug!("Marking {} segments failed", segment_ids.len());

        let response = self
            .post("segments/mark-failed")
            .json(&MarkFailedRequest {
                segment_ids,
                error_message,
            })
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }

    async fn claim_segment(
        &self,
        segment_id: Uuid,
        worker_id: &str,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let response = self
            .post(&format!("segments/{}/claim", segment_id))
            .json(&ClaimRequest {
                worker_id,
                claimed_at: now,
            })
            .send()
            .await?;

        let claim: ClaimResponse = Self::check(response).await?.json().await?;
        Ok(claim.claimed)
    }
}

#[async_trait]
impl QuestionStore for RestStore {
    async fn count_questions(&self, course_id: Uuid) -> Result<u64> {
        let response = self
            .get(&format!("courses/{}/questions/count", course_id))
            .send()
            .await?;

        let counted: QuestionCountResponse = Self::check(response).await?.json().await?;
        Ok(counted.count)
    }
}

#[async_trait]
impl TranscriptStore for RestStore {
    async fn latest_video_summary(&self, course_id: Uuid) -> Result<Option<String>> {
        let response = self
            .get(&format!("courses/{}/transcripts/latest", course_id))
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let transcript: TranscriptResponse = Self::check(response).await?.json().await?;
        Ok(transcript.video_summary)
    }
}
