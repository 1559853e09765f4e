//! Collaborator store interfaces
//!
//! The course/segment rows live in a hosted relational store that this
//! service talks to over HTTP. Every tick re-fetches the segment list; no
//! caching, since each invocation is idempotent and staleness is tolerated.

pub mod memory;
pub mod rest;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::course::Course;
use crate::segment::Segment;

/// Course rows
#[async_trait]
pub trait CourseStore: Send + Sync {
    async fn get_course(&self, course_id: Uuid) -> Result<Option<Course>>;

    async fn update_description(&self, course_id: Uuid, description: &str) -> Result<()>;
}

/// Segment rows
#[async_trait]
pub trait SegmentStore: Send + Sync {
    /// All segments for a course, ordered by `segment_index` ascending.
    async fn list_segments(&self, course_id: Uuid) -> Result<Vec<Segment>>;

    /// Batched column-patch: `status := failed`, set the error message,
    /// clear `worker_id` and `processing_started_at`. Only segments whose
    /// current status permits the transition are touched.
    async fn mark_failed(&self, segment_ids: &[Uuid], error_message: &str) -> Result<()>;

    /// Conditional claim: move the segment to `processing` with the given
    /// worker id and start timestamp, only if its current status is
    /// `pending` or `failed`. Returns whether a row was affected; false
    /// means another invocation already claimed it.
    async fn claim_segment(
        &self,
        segment_id: Uuid,
        worker_id: &str,
        now: DateTime<Utc>,
    ) -> Result<bool>;
}

/// Generated-question rows; counted for reporting only
#[async_trait]
pub trait QuestionStore: Send + Sync {
    async fn count_questions(&self, course_id: Uuid) -> Result<u64>;
}

/// Transcript rows; the latest row's video summary backfills the
/// course description
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    async fn latest_video_summary(&self, course_id: Uuid) -> Result<Option<String>>;
}

/// The full collaborator surface the orchestrator needs, as one object.
pub trait DataStore: CourseStore + SegmentStore + QuestionStore + TranscriptStore {}

impl<T: CourseStore + SegmentStore + QuestionStore + TranscriptStore> DataStore for T {}
